use super::*;

/// `Some(bits)`, or a compile time panic with `msg` when the constant is used.
const fn expect_bits(bits: Option<u16>, msg: &'static str) -> u16 {
  match bits {
    Some(bits) => bits,
    None => panic!("{}", msg),
  }
}

impl<F: Format> NarrowFloat<F> {
  /// Zero (`+0`), the additive identity element.
  pub const ZERO: Self = Self::from_u16(0);

  /// One (`1`), the multiplicative identity element. Using it with a format that cannot
  /// represent 1 is a compile error.
  pub const ONE: Self = Self::from_u16(expect_bits(
    F::DESCRIPTOR.power_of_two_bits(0),
    "The format cannot represent 1",
  ));

  /// Largest finite value.
  pub const MAX: Self = Self::from_u16(F::DESCRIPTOR.max_finite_bits(false));

  /// Most negative finite value; equal to [`Self::ZERO`] for unsigned formats.
  ///
  /// Not to be confused with the smallest absolute value, i.e. [`Self::MIN_POSITIVE`]!
  pub const MIN: Self = Self::from_u16(F::DESCRIPTOR.max_finite_bits(true));

  /// Smallest positive *normal* value, `2^(1 - bias)`.
  pub const MIN_POSITIVE: Self = Self::from_u16(expect_bits(
    F::DESCRIPTOR.power_of_two_bits(F::DESCRIPTOR.min_exp()),
    "The format has no normal values",
  ));

  /// Smallest positive value, with the lowest mantissa bit set and everything else clear.
  pub const MIN_POSITIVE_SUBNORMAL: Self = Self::from_u16(1);

  /// Difference between 1 and the next larger representable number, `2^-m`.
  pub const EPSILON: Self = Self::from_u16(expect_bits(
    F::DESCRIPTOR.power_of_two_bits(-(F::DESCRIPTOR.mantissa_bits() as i32)),
    "The format cannot represent its epsilon",
  ));

  /// Positive infinity, if the format has one.
  pub const INFINITY: Option<Self> = match F::DESCRIPTOR.inf_patterns().with_sign(false, F::DESCRIPTOR.sign_mask()) {
    Some(bits) => Some(Self::from_u16(bits)),
    None => None,
  };

  /// Negative infinity, if the format has one.
  pub const NEG_INFINITY: Option<Self> =
    if !F::DESCRIPTOR.is_signed() {
      None
    } else {
      match F::DESCRIPTOR.inf_patterns().with_sign(true, F::DESCRIPTOR.sign_mask()) {
        Some(bits) => Some(Self::from_u16(bits)),
        None => None,
      }
    };

  /// The canonical NaN, if the format has one.
  pub const NAN: Option<Self> = match F::DESCRIPTOR.nan_patterns().canonical() {
    Some(bits) => Some(Self::from_u16(bits)),
    None => None,
  };

  /// Whether NaN of this format signals when consumed by arithmetic.
  pub(crate) const SIGNALING: bool = matches!(F::DESCRIPTOR.nan_behavior(), NanBehavior::SignalingNaN);
}
