//! This module and its submodules describe narrow floating point *formats*: how many bits a
//! format has, how they split into sign, exponent and mantissa, what the exponent bias is, and
//! what policies apply when a value must be rounded, overflows, or is NaN.
//!
//! A format is pure data, a [`FormatDescriptor`], built and validated once (usually at compile
//! time) and then freely copied. The [`RoundingEngine`](FormatDescriptor::round_and_encode) maps
//! an `f64` to a bit pattern of the format, and [decoding](FormatDescriptor::decode) maps any bit
//! pattern back to an `f64`. Both are exact: every value of a valid format is an `f64`, so no
//! information is lost in the wide representation.
//!
//! Some notation used in the comments:
//!
//!   - **m**: number of mantissa (fraction) bits.
//!   - **emin**: `1 - bias`, the exponent of the smallest normal value.
//!   - **magnitude**: the bit pattern with the sign bit cleared. Magnitudes are ordered the same
//!     as the absolute values they encode, which the rounding engine relies on.
//!   - **quantum**: the distance between consecutive values at a given exponent, `2^(E - m)`.

use crate::underlying::Sealed;

/// Whether a format has a sign bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signedness {
  Signed,
  /// No sign bit; negative values are handled according to [`UnsignedBehavior`].
  Unsigned,
}

/// How a value that falls between two representable values is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
  /// Nearest, ties to the value with an even mantissa.
  RoundToNearestEven,
  /// Truncate the magnitude.
  RoundTowardsZero,
  /// Any discarded fraction increments the magnitude.
  RoundAwayFromZero,
  /// Increment the magnitude with probability equal to the discarded fraction of a quantum.
  StochasticRounding,
  /// Nearest, ties to the value with an odd mantissa.
  RoundToNearestOdd,
  /// Toward negative infinity.
  RoundDown,
  /// Toward positive infinity.
  RoundUp,
  /// Nearest, ties away from zero.
  RoundTiesToAway,
}

/// What happens to a value whose magnitude exceeds the largest finite value of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfBehavior {
  /// Encode infinity, if the format has an infinity pattern of the right sign. Otherwise behaves
  /// like [`InfBehavior::Saturating`].
  NonTrappingInf,
  /// Clamp to the largest finite value of the same sign.
  Saturating,
  /// Fail with [`Error::Overflow`](crate::Error::Overflow).
  Trapping,
}

/// Whether NaN is representable, and what consuming one does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NanBehavior {
  QuietNaN,
  /// No NaN pattern. Encoding NaN fails with
  /// [`Error::NanNotRepresentable`](crate::Error::NanNotRepresentable).
  NoNaN,
  /// NaN is representable; producing one raises [`INVALID`](ExceptionFlags::INVALID) and consuming
  /// one in arithmetic fails with [`Error::SignalingNan`](crate::Error::SignalingNan).
  SignalingNaN,
}

/// What an unsigned format does with negative values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsignedBehavior {
  NegativeToZero,
  NegativeToNaN,
}

/// A narrow format, bound to a type. Implemented by zero-sized marker types, each carrying a
/// validated [`FormatDescriptor`] and the machine integer that stores its bit patterns.
///
/// Use [`narrow_format!`](crate::narrow_format) to declare one, or pick one of the
/// [presets](crate::presets).
pub trait Format: Send + Sync + 'static {
  /// `u8` or `u16`.
  type Bits: crate::Bits;

  /// The format itself.
  const DESCRIPTOR: FormatDescriptor;
}

/// Immutable description of a narrow floating point format. Build one with
/// [`FormatDescriptor::builder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatDescriptor {
  width: u32,
  exponent_bits: u32,
  mantissa_bits: u32,
  bias: i32,
  signedness: Signedness,
  rounding_mode: RoundingMode,
  stochastic_bits: u32,
  inf_behavior: InfBehavior,
  nan_behavior: NanBehavior,
  unsigned_behavior: UnsignedBehavior,
  inf_checker: SpecialPatterns,
  nan_checker: SpecialPatterns,
  // Derived on validation.
  max_pos_mag: u16,
  max_neg_mag: u16,
}

/// Ways in which a [`FormatDescriptor`] can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum FormatError {
  #[error("width {width} is outside 1..=16")]
  WidthOutOfRange { width: u32 },
  #[error("sign, exponent and mantissa need {required} bits but the width is {width}")]
  BitBudgetExceeded { width: u32, required: u32 },
  #[error("exponents 2^{min_exp} to 2^{max_exp} do not fit the f64 normal range")]
  ExponentRangeUnsupported { min_exp: i32, max_exp: i32 },
  #[error("the format has no positive finite value")]
  EmptyRange,
  #[error("special pattern {pattern:#x} does not fit in the format")]
  PatternOutOfRange { pattern: u16 },
  #[error("pattern {pattern:#x} is both infinity and NaN")]
  OverlappingPatterns { pattern: u16 },
  #[error("special pattern {pattern:#x} lies inside the finite range")]
  InteriorSpecialPattern { pattern: u16 },
  #[error("NaN behavior requires a NaN pattern")]
  MissingNanPattern,
  #[error("NaN patterns given for a format without NaN")]
  UnexpectedNanPattern,
  #[error("infinity patterns given for a format that never encodes infinity")]
  UnexpectedInfPattern,
  #[error("{bits} stochastic rounding bits is more than 32")]
  StochasticBitsOutOfRange { bits: u32 },
}

/// Construction and validation.
mod builder;
pub use builder::FormatBuilder;

/// Accessors and derived quantities (masks, exponent range, extreme values).
mod basics;

/// Inf/NaN pattern checkers.
mod checker;
pub use checker::{SpecialValueChecker, SinglePattern, DoublePattern, SpecialPatterns};

/// Bit pattern to `f64`.
mod decode;

/// `f64` to bit pattern: the rounding engine.
mod encode;

/// Random source and exception flags for rounding.
mod context;
pub use context::{
  RoundingContext, ExceptionFlags,
  with_thread_context, set_seed, exception_flags, clear_exception_flags,
};

/// Named formats.
pub mod presets;

/// Exact rational oracle, for tests only.
#[cfg(test)]
pub(crate) mod rational;

/// Compile time check that a backing type is wide enough for a format.
pub(crate) const fn check_storage<F: Format>() -> u32 {
  assert!(
    F::DESCRIPTOR.used_bits() <= <F::Bits as Sealed>::BITS,
    "The backing integer type is narrower than the format",
  );
  F::DESCRIPTOR.width()
}
