//! Error types shared by the format engine, the containers and the kernels.

use thiserror::Error;

pub use crate::format::FormatError;

/// Everything that can go wrong in this crate.
///
/// Ordinary rounding and saturation are *not* errors: they are the defined outcome of a format's
/// policy. What is reported here are domain errors (values a format refuses to represent), shape
/// errors (detected before any computation takes place) and configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  /// A value exceeded the largest finite magnitude of a format whose overflow policy is
  /// [`Trapping`](crate::InfBehavior::Trapping).
  #[error("value {value} overflows the target format")]
  Overflow { value: f64 },

  /// A NaN was produced or encoded under a format with no NaN encoding.
  #[error("NaN is not representable in the target format")]
  NanNotRepresentable,

  /// A NaN of a signaling format was consumed by an arithmetic operation.
  #[error("signaling NaN consumed by an arithmetic operation")]
  SignalingNan,

  /// Operands of an operation have incompatible shapes.
  #[error("{op}: incompatible shapes {lhs:?} and {rhs:?}")]
  ShapeMismatch {
    op: &'static str,
    lhs: (usize, usize),
    rhs: (usize, usize),
  },

  /// Element `(row, col)` does not exist in a `rows × cols` container.
  #[error("index ({row}, {col}) out of range for a {rows}x{cols} container")]
  IndexOutOfRange {
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
  },

  /// A flat buffer or vector has the wrong number of elements.
  #[error("expected {expected} elements, found {found}")]
  LengthMismatch { expected: usize, found: usize },

  /// A scale factor was zero, negative, or not finite.
  #[error("invalid scale factor {value} at index {index}")]
  InvalidScale { index: usize, value: f64 },

  /// A format descriptor failed validation.
  #[error(transparent)]
  InvalidFormat(#[from] FormatError),
}

/// Shorthand for results carrying this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
