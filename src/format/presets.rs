//! Commonly used narrow formats: the 8-bit formats of the OCP and P3109 proposals, and the 6- and
//! 4-bit microscaling element formats.
//!
//! Each comes as a [`FormatDescriptor`] constant (or a `const fn` for families parametrised by
//! precision) and as a zero-sized marker type implementing [`Format`], for use with
//! [`NarrowFloat`](crate::NarrowFloat).

use super::*;

/// 8-bit, 4 exponent bits, 3 mantissa bits, bias 7. No infinity: overflow saturates at ±448. NaN
/// is `0x7f` and `0xff`.
pub const FLOAT8_E4M3FN: FormatDescriptor = FormatDescriptor::builder(8, 4, 3, 7)
  .inf(InfBehavior::Saturating, SpecialPatterns::None)
  .nan(NanBehavior::QuietNaN, SpecialPatterns::double(0x7f, 0xff))
  .validated();

/// 8-bit unsigned, 5 exponent bits, 3 mantissa bits, bias 7. NaN is `0xff`.
pub const FLOAT8_E4M3FNUZ: FormatDescriptor = FormatDescriptor::builder(8, 5, 3, 7)
  .signedness(Signedness::Unsigned)
  .inf(InfBehavior::Saturating, SpecialPatterns::None)
  .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0xff))
  .validated();

/// As [`FLOAT8_E4M3FNUZ`], with bias 11.
pub const FLOAT8_E4M3B11FNUZ: FormatDescriptor = FormatDescriptor::builder(8, 5, 3, 11)
  .signedness(Signedness::Unsigned)
  .inf(InfBehavior::Saturating, SpecialPatterns::None)
  .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0xff))
  .validated();

/// 8-bit, 5 exponent bits, 2 mantissa bits, bias 15. No infinity: overflow saturates at ±98304.
/// NaN is `0x7f` and `0xff`.
pub const FLOAT8_E5M2: FormatDescriptor = FormatDescriptor::builder(8, 5, 2, 15)
  .inf(InfBehavior::Saturating, SpecialPatterns::None)
  .nan(NanBehavior::QuietNaN, SpecialPatterns::double(0x7f, 0xff))
  .validated();

/// 8-bit unsigned, 6 exponent bits, 2 mantissa bits, bias 15. NaN is `0xff`.
pub const FLOAT8_E5M2FNUZ: FormatDescriptor = FormatDescriptor::builder(8, 6, 2, 15)
  .signedness(Signedness::Unsigned)
  .inf(InfBehavior::Saturating, SpecialPatterns::None)
  .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0xff))
  .validated();

/// The 8-bit P3109 format of precision `p` (`1 <= p <= 7`): `8 - p` exponent bits, `p - 1`
/// mantissa bits, bias `2^(7 - p)`. Infinities are `0x7f` and `0xff`; the single NaN is `0x80`,
/// where negative zero would be.
///
/// The bias is the one of the P3109 interim report. It is not `2^(8 - p) - 1`, the all-ones
/// value of the exponent field, which would put `1.0` near the top of the range.
pub const fn float8_ieee_p(p: u32) -> FormatDescriptor {
  assert!(1 <= p && p <= 7, "Precision of an 8-bit P3109 format must be within 1..=7");
  let e = 8 - p;
  FormatDescriptor::builder(8, e, p - 1, 1 << (e - 1))
    .inf(InfBehavior::NonTrappingInf, SpecialPatterns::double(0x7f, 0xff))
    .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0x80))
    .validated()
}

/// 6-bit, 3 exponent bits, 2 mantissa bits, bias 3. No infinity or NaN.
pub const FLOAT6_E3M2: FormatDescriptor = float6_p(3);

/// 6-bit, 2 exponent bits, 3 mantissa bits, bias 1. No infinity or NaN.
pub const FLOAT6_E2M3: FormatDescriptor = FormatDescriptor::builder(6, 2, 3, 1).validated();

/// The 6-bit format of precision `p` (`1 <= p <= 5`): `6 - p` exponent bits, `p - 1` mantissa
/// bits, bias `2^(5 - p) - 1`. No infinity or NaN.
pub const fn float6_p(p: u32) -> FormatDescriptor {
  assert!(1 <= p && p <= 5, "Precision of a 6-bit format must be within 1..=5");
  let e = 6 - p;
  FormatDescriptor::builder(6, e, p - 1, (1 << (e - 1)) - 1).validated()
}

/// 4-bit, 2 exponent bits, 1 mantissa bit, bias 1. Values are 0, 0.5, 1, 1.5, 2, 3, 4, 6 and
/// their negatives. No infinity or NaN.
pub const FLOAT4_E2M1: FormatDescriptor = float4_p(2);

/// The 4-bit format of precision `p` (`1 <= p <= 3`): `4 - p` exponent bits, `p - 1` mantissa
/// bits, bias `2^(3 - p) - 1`. No infinity or NaN.
pub const fn float4_p(p: u32) -> FormatDescriptor {
  assert!(1 <= p && p <= 3, "Precision of a 4-bit format must be within 1..=3");
  let e = 4 - p;
  FormatDescriptor::builder(4, e, p - 1, (1 << (e - 1)) - 1).validated()
}

/// Declare a zero-sized marker type implementing [`Format`](crate::Format).
///
/// ```
/// # use narrowfloat::*;
/// narrow_format! {
///   /// 8 bits, 3 exponent bits, ties away from zero.
///   pub E3M4: u8 = FormatDescriptor::builder(8, 3, 4, 3)
///     .rounding(RoundingMode::RoundTiesToAway)
///     .validated()
/// }
/// type F = NarrowFloat<E3M4>;
/// assert_eq!(F::MAX.to_f64(), 31.0);
/// ```
#[macro_export]
macro_rules! narrow_format {
  ($(#[$attr:meta])* $vis:vis $name:ident: $bits:ty = $descriptor:expr $(,)?) => {
    $(#[$attr])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    $vis struct $name;

    impl $crate::Format for $name {
      type Bits = $bits;
      const DESCRIPTOR: $crate::FormatDescriptor = $descriptor;
    }
  };
}

narrow_format! {
  /// Marker for [`FLOAT8_E4M3FN`].
  pub E4M3Fn: u8 = FLOAT8_E4M3FN
}

narrow_format! {
  /// Marker for [`FLOAT8_E4M3FNUZ`].
  pub E4M3Fnuz: u8 = FLOAT8_E4M3FNUZ
}

narrow_format! {
  /// Marker for [`FLOAT8_E4M3B11FNUZ`].
  pub E4M3B11Fnuz: u8 = FLOAT8_E4M3B11FNUZ
}

narrow_format! {
  /// Marker for [`FLOAT8_E5M2`].
  pub E5M2: u8 = FLOAT8_E5M2
}

narrow_format! {
  /// Marker for [`FLOAT8_E5M2FNUZ`].
  pub E5M2Fnuz: u8 = FLOAT8_E5M2FNUZ
}

narrow_format! {
  /// Marker for [`FLOAT6_E3M2`].
  pub Float6E3M2: u8 = FLOAT6_E3M2
}

narrow_format! {
  /// Marker for [`FLOAT6_E2M3`].
  pub Float6E2M3: u8 = FLOAT6_E2M3
}

narrow_format! {
  /// Marker for [`FLOAT4_E2M1`].
  pub Float4E2M1: u8 = FLOAT4_E2M1
}

/// Marker for [`float8_ieee_p(P)`](float8_ieee_p).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Float8Ieee<const P: u32>;

impl<const P: u32> Format for Float8Ieee<P> {
  type Bits = u8;
  const DESCRIPTOR: FormatDescriptor = float8_ieee_p(P);
}

/// Marker for [`float6_p(P)`](float6_p).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Float6P<const P: u32>;

impl<const P: u32> Format for Float6P<P> {
  type Bits = u8;
  const DESCRIPTOR: FormatDescriptor = float6_p(P);
}

/// Marker for [`float4_p(P)`](float4_p).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Float4P<const P: u32>;

impl<const P: u32> Format for Float4P<P> {
  type Bits = u8;
  const DESCRIPTOR: FormatDescriptor = float4_p(P);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn families_agree() {
    assert_eq!(float6_p(3), FLOAT6_E3M2);
    assert_eq!(float4_p(2), FLOAT4_E2M1);
    assert_eq!(Float8Ieee::<4>::DESCRIPTOR, float8_ieee_p(4));
  }

  #[test]
  fn ieee_p() {
    for p in 1 ..= 7 {
      let d = float8_ieee_p(p);
      assert_eq!(d.exponent_bits() + d.mantissa_bits(), 7);
      assert_eq!(d.max_finite_bits(false), 0x7e);
      assert_eq!(d.max_finite_bits(true), 0xfe);
    }
    assert_eq!(float8_ieee_p(3).bias(), 16);
    assert_eq!(float8_ieee_p(3).max_finite(), 49152.0);
    assert_eq!(float8_ieee_p(4).max_finite(), 224.0);
  }

  #[test]
  fn sub_byte() {
    assert_eq!(FLOAT6_E3M2.max_finite(), 28.0);
    assert_eq!(FLOAT6_E2M3.max_finite(), 7.5);
    assert_eq!(FLOAT6_E2M3.min_positive_subnormal(), 0.125);
    assert_eq!(FLOAT4_E2M1.max_finite(), 6.0);
    assert_eq!(FLOAT4_E2M1.min_positive_subnormal(), 0.5);
    assert_eq!(float4_p(1).max_finite(), 16.0);
  }

  #[test]
  fn unsigned() {
    assert_eq!(FLOAT8_E4M3B11FNUZ.max_finite(), 14.0 * 2f64.powi(17));
    assert_eq!(FLOAT8_E5M2FNUZ.max_finite(), 6.0 * 2f64.powi(46));
    assert_eq!(FLOAT8_E5M2FNUZ.min_positive_subnormal(), 2f64.powi(-16));
  }
}
