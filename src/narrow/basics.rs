use super::*;
use crate::format::check_storage;
use core::num::FpCategory;

impl<F: Format> NarrowFloat<F> {
  /// The logical width of this type in bits.
  ///
  /// Note: this is the width of the format, not necessarily of the underlying storage type.
  pub const WIDTH: u32 = check_storage::<F>();

  /// The format of this type.
  pub const DESCRIPTOR: FormatDescriptor = F::DESCRIPTOR;

  /// Build from a `u16` pattern, in `const` context. Bits above the format are cleared.
  #[inline]
  pub(crate) const fn from_u16(bits: u16) -> Self {
    let _ = Self::WIDTH;
    Self(const_of_u16(bits & F::DESCRIPTOR.used_mask()), PhantomData)
  }

  #[inline]
  pub(crate) const fn to_u16(self) -> u16 {
    const_as_u16(self.0)
  }

  /// Construct a number from its raw bit pattern. Bits above those used by the format (sign,
  /// exponent and mantissa), if any, are ignored.
  ///
  /// ```
  /// # use narrowfloat::*;
  /// assert_eq!(f4e2m1::from_bits(0xf2).to_bits(), 0x02);
  /// assert_eq!(f4e2m1::from_bits(0x02).to_f64(), 1.0);
  /// ```
  #[inline]
  pub fn from_bits(bits: F::Bits) -> Self {
    Self::from_u16(bits.as_u16())
  }

  /// The raw bit pattern.
  #[inline]
  pub const fn to_bits(self) -> F::Bits {
    self.0
  }

  /// The exact value, as an `f64`.
  #[inline]
  pub fn to_f64(self) -> f64 {
    F::DESCRIPTOR.decode(self.to_u16())
  }

  /// Round `value` into this format, using `ctx` for stochastic rounding and exception flags.
  ///
  /// # Errors
  ///
  /// [`Error::Overflow`] if the format is [`Trapping`](crate::InfBehavior::Trapping) and `value`
  /// rounds beyond its largest finite magnitude; [`Error::NanNotRepresentable`] if `value` is NaN
  /// and the format has no NaN.
  #[inline]
  pub fn from_f64_in(value: f64, ctx: &mut RoundingContext) -> Result<Self> {
    F::DESCRIPTOR.round_and_encode(value, ctx).map(Self::from_u16)
  }

  /// As [`from_f64_in`](Self::from_f64_in), with this thread's default context.
  #[inline]
  pub fn try_from_f64(value: f64) -> Result<Self> {
    crate::with_thread_context(|ctx| Self::from_f64_in(value, ctx))
  }

  /// Whether this is a NaN pattern.
  #[inline]
  pub fn is_nan(self) -> bool {
    F::DESCRIPTOR.nan_patterns().matches(self.to_u16())
  }

  /// Whether this is an infinity pattern.
  #[inline]
  pub fn is_infinite(self) -> bool {
    F::DESCRIPTOR.inf_patterns().matches(self.to_u16())
  }

  /// Neither infinite nor NaN.
  #[inline]
  pub fn is_finite(self) -> bool {
    !self.is_nan() && !self.is_infinite()
  }

  /// Positive or negative zero.
  #[inline]
  pub fn is_zero(self) -> bool {
    self.classify() == FpCategory::Zero
  }

  #[inline]
  pub fn is_subnormal(self) -> bool {
    self.classify() == FpCategory::Subnormal
  }

  #[inline]
  pub fn is_normal(self) -> bool {
    self.classify() == FpCategory::Normal
  }

  /// Whether the sign bit is set. Always false for unsigned formats. Note that some NaN patterns
  /// have the sign bit set.
  #[inline]
  pub fn is_sign_negative(self) -> bool {
    F::DESCRIPTOR.is_negative_pattern(self.to_u16())
  }

  #[inline]
  pub fn is_sign_positive(self) -> bool {
    !self.is_sign_negative()
  }

  /// Classify, as [`f64::classify`].
  #[inline]
  pub fn classify(self) -> FpCategory {
    F::DESCRIPTOR.classify(self.to_u16())
  }

  /// Whether `self` and `other` are unordered, i.e. either is NaN. This is the only comparison
  /// that is true for NaN.
  #[inline]
  pub fn is_unordered(self, other: Self) -> bool {
    self.is_nan() || other.is_nan()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::presets::*;

  type F8 = NarrowFloat<E4M3Fn>;

  #[test]
  fn width() {
    assert_eq!(F8::WIDTH, 8);
    assert_eq!(NarrowFloat::<Float6E3M2>::WIDTH, 6);
    assert_eq!(NarrowFloat::<Float4E2M1>::WIDTH, 4);
  }

  #[test]
  fn from_bits_masks() {
    let x = NarrowFloat::<Float6E2M3>::from_bits(0b1100_0001);
    assert_eq!(x.to_bits(), 0b0000_0001);
  }

  #[test]
  fn scenario() {
    let mut ctx = RoundingContext::seeded(0);
    assert_eq!(F8::from_f64_in(448.0, &mut ctx).unwrap().to_f64(), 448.0);
    assert_eq!(F8::from_f64_in(500.0, &mut ctx).unwrap().to_f64(), 448.0);
    assert_eq!(F8::from_f64_in(-500.0, &mut ctx).unwrap().to_f64(), -448.0);
    let nan = F8::from_f64_in(f64::NAN, &mut ctx).unwrap();
    assert!(nan.is_nan());
    assert!(nan.to_f64().is_nan());
  }

  #[test]
  fn classification() {
    let x = F8::from_bits(0x01);
    assert!(x.is_subnormal() && x.is_finite() && !x.is_zero());
    let z = F8::from_bits(0x80);
    assert!(z.is_zero() && z.is_sign_negative());
    let n = F8::from_bits(0x7f);
    assert!(n.is_nan() && !n.is_finite());
    assert!(n.is_unordered(z));
    assert!(!z.is_unordered(x));

    type I = NarrowFloat<Float8Ieee<3>>;
    assert!(I::from_bits(0x7f).is_infinite());
    assert!(I::from_bits(0xff).is_sign_negative());
    assert!(I::from_bits(0x80).is_nan());
  }

  #[test]
  fn unsigned_has_no_sign() {
    let x = NarrowFloat::<E4M3Fnuz>::from_bits(0x80);
    assert!(x.is_sign_positive());
    assert_eq!(x.to_f64(), 512.0);
  }
}
