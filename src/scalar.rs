//! The element types kernels work with: native floats (`f64`, `f32`, `half::f16`) and every
//! [`NarrowFloat`]. Kernels decode elements to `f64`, accumulate in some [`Scalar`] type, and
//! round into the output element type, all through this trait.

use crate::format::{Format, RoundingContext};
use crate::{NarrowFloat, Result};

/// A number type that can be decoded to `f64` exactly, and rounded from `f64`.
pub trait Scalar: Copy + PartialEq + PartialOrd + core::fmt::Debug + Send + Sync + 'static {
  const ZERO: Self;

  /// `1`. For a [`NarrowFloat`] format that cannot represent it, using this is a compile error.
  const ONE: Self;

  /// Exact conversion to `f64`.
  fn to_f64(self) -> f64;

  /// Round `value` into `Self`.
  ///
  /// # Errors
  ///
  /// Only narrow formats fail, with their domain errors; see [`NarrowFloat::from_f64_in`].
  fn from_f64_in(value: f64, ctx: &mut RoundingContext) -> Result<Self>;

  /// As [`from_f64_in`](Self::from_f64_in), with this thread's default context.
  fn from_f64(value: f64) -> Result<Self> {
    crate::with_thread_context(|ctx| Self::from_f64_in(value, ctx))
  }

  /// One step of a dot product in this type: `round(self + a * b)`. The product of two decoded
  /// elements is formed in `f64`, where it is exact for operands of up to 26 bits of precision
  /// (every narrow format, `half::f16` and `f32`). The sum is rounded once into `Self`.
  #[inline]
  fn accumulate(self, a: f64, b: f64, ctx: &mut RoundingContext) -> Result<Self> {
    Self::from_f64_in(add_round_to_odd(self.to_f64(), a * b), ctx)
  }
}

/// `x + y` rounded to odd: truncated to `f64`, with the last mantissa bit set if anything was
/// lost. Rounding this once more into a format with at most 51 bits of precision gives the
/// same result, under any rounding mode, as rounding the exact sum.
pub(crate) fn add_round_to_odd(x: f64, y: f64) -> f64 {
  let s = x + y;
  if !s.is_finite() {
    return s
  }
  // Error of the rounded sum, exactly (two-sum).
  let y_part = s - x;
  let err = (x - (s - y_part)) + (y - y_part);
  if err == 0.0 || s.to_bits() & 1 == 1 {
    return s
  }
  // `s` is the nearest even neighbour of the exact sum; step to the odd one on the side of `err`.
  let away = (err > 0.0) == (s > 0.0);
  f64::from_bits(if away { s.to_bits() + 1 } else { s.to_bits() - 1 })
}

impl Scalar for f64 {
  const ZERO: Self = 0.0;
  const ONE: Self = 1.0;

  #[inline]
  fn to_f64(self) -> f64 { self }

  #[inline]
  fn from_f64_in(value: f64, _: &mut RoundingContext) -> Result<Self> { Ok(value) }

  #[inline]
  fn accumulate(self, a: f64, b: f64, _: &mut RoundingContext) -> Result<Self> {
    Ok(a.mul_add(b, self))
  }
}

impl Scalar for f32 {
  const ZERO: Self = 0.0;
  const ONE: Self = 1.0;

  #[inline]
  fn to_f64(self) -> f64 { self as f64 }

  #[inline]
  fn from_f64_in(value: f64, _: &mut RoundingContext) -> Result<Self> { Ok(value as f32) }
}

impl Scalar for half::f16 {
  const ZERO: Self = half::f16::ZERO;
  const ONE: Self = half::f16::ONE;

  #[inline]
  fn to_f64(self) -> f64 { half::f16::to_f64(self) }

  #[inline]
  fn from_f64_in(value: f64, _: &mut RoundingContext) -> Result<Self> { Ok(half::f16::from_f64(value)) }
}

impl<F: Format> Scalar for NarrowFloat<F> {
  const ZERO: Self = NarrowFloat::<F>::ZERO;
  const ONE: Self = NarrowFloat::<F>::ONE;

  #[inline]
  fn to_f64(self) -> f64 { NarrowFloat::to_f64(self) }

  #[inline]
  fn from_f64_in(value: f64, ctx: &mut RoundingContext) -> Result<Self> {
    NarrowFloat::from_f64_in(value, ctx)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::presets::*;

  fn dot<T: Scalar>(a: &[f64], b: &[f64], ctx: &mut RoundingContext) -> Result<T> {
    a.iter().zip(b).try_fold(T::ZERO, |acc, (&x, &y)| acc.accumulate(x, y, ctx))
  }

  #[test]
  fn accumulators_differ() {
    let mut ctx = RoundingContext::seeded(0);
    // 1 + 2^-12 * 1: lost in f16 (11 bits of precision), kept in f32.
    let a = [1.0, 2f64.powi(-12)];
    let b = [1.0, 1.0];
    assert_eq!(dot::<f64>(&a, &b, &mut ctx).unwrap(), 1.0 + 2f64.powi(-12));
    assert_eq!(dot::<f32>(&a, &b, &mut ctx).unwrap().to_f64(), 1.0 + 2f64.powi(-12));
    assert_eq!(dot::<half::f16>(&a, &b, &mut ctx).unwrap().to_f64(), 1.0);
    assert_eq!(dot::<NarrowFloat<E4M3Fn>>(&a, &b, &mut ctx).unwrap().to_f64(), 1.0);
  }

  #[test]
  fn single_rounding() {
    let mut ctx = RoundingContext::seeded(0);
    // The exact sums lie just above a tie of the target type, but round to the tie in f64.
    let sum = 1f32.accumulate(1.0 + 2f64.powi(-36), 2f64.powi(-24), &mut ctx).unwrap();
    assert_eq!(sum, 1.0 + f32::EPSILON);
    let sum = half::f16::ONE.accumulate(1.0 + 2f64.powi(-49), 2f64.powi(-11), &mut ctx).unwrap();
    assert_eq!(sum, half::f16::ONE + half::f16::EPSILON);

    // Directed rounding must see a tiny positive remainder.
    crate::narrow_format! {
      Upward: u8 = FLOAT8_E4M3FN.with_rounding(crate::RoundingMode::RoundUp)
    }
    let sum = NarrowFloat::<Upward>::ONE.accumulate(2f64.powi(-30), 2f64.powi(-30), &mut ctx).unwrap();
    assert_eq!(sum.to_f64(), 1.125);
  }

  #[test]
  fn round_to_odd() {
    assert_eq!(add_round_to_odd(1.0, 2.0), 3.0);
    assert_eq!(add_round_to_odd(1.0, 2f64.powi(-60)), f64::from_bits(1f64.to_bits() + 1));
    assert_eq!(add_round_to_odd(1.0, -2f64.powi(-60)), f64::from_bits(1f64.to_bits() - 1));
    assert_eq!(add_round_to_odd(-1.0, -2f64.powi(-60)), f64::from_bits((-1f64).to_bits() + 1));
    assert_eq!(add_round_to_odd(f64::MAX, f64::MAX), f64::INFINITY);
    assert_eq!(add_round_to_odd(0.5, -0.5), 0.0);
  }

  #[test]
  fn narrow_errors() {
    type N = NarrowFloat<Float4E2M1>;
    assert!(<N as Scalar>::from_f64(f64::NAN).is_err());
    assert_eq!(<N as Scalar>::from_f64(5.0).unwrap().to_f64(), 4.0);
    assert_eq!(<N as Scalar>::ONE.to_f64(), 1.0);
  }

  #[test]
  fn natives_round() {
    let mut ctx = RoundingContext::seeded(0);
    assert_eq!(f32::from_f64_in(0.1, &mut ctx).unwrap(), 0.1_f32);
    assert_eq!(half::f16::from_f64_in(1e6, &mut ctx).unwrap(), half::f16::INFINITY);
  }
}
