use super::*;
use core::ops::{Add, AddAssign, Sub, SubAssign, Mul, MulAssign, Div, DivAssign, Neg};

impl<F: Format> NarrowFloat<F> {
  /// Decode both operands, apply `op` natively, and round the result.
  #[inline]
  fn binary_in(self, rhs: Self, ctx: &mut RoundingContext, op: impl FnOnce(f64, f64) -> f64) -> Result<Self> {
    let (a, b) = (self.to_f64(), rhs.to_f64());
    let any_nan = a.is_nan() || b.is_nan();
    if any_nan && Self::SIGNALING {
      ctx.raise(ExceptionFlags::INVALID);
      return Err(Error::SignalingNan)
    }
    let result = op(a, b);
    if result.is_nan() && !any_nan {
      // inf - inf, 0 * inf, 0 / 0, inf / inf
      ctx.raise(ExceptionFlags::INVALID);
    }
    Self::from_f64_in(result, ctx)
  }

  /// `self + rhs`, rounded using `ctx`.
  ///
  /// # Errors
  ///
  /// [`Error::SignalingNan`] if an operand is NaN in a [`SignalingNaN`](NanBehavior::SignalingNaN)
  /// format; otherwise the errors of [`from_f64_in`](Self::from_f64_in) for the exact result.
  #[inline]
  pub fn add_in(self, rhs: Self, ctx: &mut RoundingContext) -> Result<Self> {
    self.binary_in(rhs, ctx, |a, b| a + b)
  }

  /// `self - rhs`, rounded using `ctx`. Errors as [`add_in`](Self::add_in).
  #[inline]
  pub fn sub_in(self, rhs: Self, ctx: &mut RoundingContext) -> Result<Self> {
    self.binary_in(rhs, ctx, |a, b| a - b)
  }

  /// `self * rhs`, rounded using `ctx`. Errors as [`add_in`](Self::add_in).
  #[inline]
  pub fn mul_in(self, rhs: Self, ctx: &mut RoundingContext) -> Result<Self> {
    self.binary_in(rhs, ctx, |a, b| a * b)
  }

  /// `self / rhs`, rounded using `ctx`. Dividing a finite nonzero number by zero raises
  /// [`DIVISION_BY_ZERO`](ExceptionFlags::DIVISION_BY_ZERO) and produces an infinity, which then
  /// follows the overflow policy of the format. Errors as [`add_in`](Self::add_in).
  #[inline]
  pub fn div_in(self, rhs: Self, ctx: &mut RoundingContext) -> Result<Self> {
    if rhs.is_zero() && self.is_finite() && !self.is_zero() {
      ctx.raise(ExceptionFlags::DIVISION_BY_ZERO);
    }
    self.binary_in(rhs, ctx, |a, b| a / b)
  }

  /// `-self`, using `ctx`. In a signed format this is usually just a flip of the sign bit, but
  /// not always: the negation may not be representable (an asymmetric range, or the pattern of
  /// `-0` reserved for NaN), in which case it is rounded like any other value. In an unsigned
  /// format, negating a positive number follows the format's
  /// [`UnsignedBehavior`](crate::UnsignedBehavior). NaN is returned unchanged.
  ///
  /// # Errors
  ///
  /// Those of [`from_f64_in`](Self::from_f64_in), for `-self`.
  pub fn neg_in(self, ctx: &mut RoundingContext) -> Result<Self> {
    if self.is_nan() {
      return Ok(self)
    }
    let value = self.to_f64();
    if F::DESCRIPTOR.is_signed() {
      let flipped = Self::from_u16(self.to_u16() ^ F::DESCRIPTOR.sign_mask());
      if !flipped.is_nan() && flipped.to_f64() == -value {
        return Ok(flipped)
      }
    }
    Self::from_f64_in(-value, ctx)
  }

  /// As [`add_in`](Self::add_in), with this thread's default context.
  #[inline]
  pub fn checked_add(self, rhs: Self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.add_in(rhs, ctx))
  }

  /// As [`sub_in`](Self::sub_in), with this thread's default context.
  #[inline]
  pub fn checked_sub(self, rhs: Self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.sub_in(rhs, ctx))
  }

  /// As [`mul_in`](Self::mul_in), with this thread's default context.
  #[inline]
  pub fn checked_mul(self, rhs: Self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.mul_in(rhs, ctx))
  }

  /// As [`div_in`](Self::div_in), with this thread's default context.
  #[inline]
  pub fn checked_div(self, rhs: Self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.div_in(rhs, ctx))
  }

  /// As [`neg_in`](Self::neg_in), with this thread's default context.
  #[inline]
  pub fn checked_neg(self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.neg_in(ctx))
  }
}

/// Unwrap the result of an operator, which cannot return a `Result`.
#[inline]
#[track_caller]
fn domain<T>(result: Result<T>) -> T {
  match result {
    Ok(x) => x,
    Err(e) => panic!("{e}"),
  }
}

/// Helper macro for implementing operators for all combinations of value and reference.
///
/// The operators panic on a domain error (overflow of a trapping format, NaN in a format without
/// NaN, or a signaling NaN operand); use the `checked_*` or `*_in` methods to handle those.
macro_rules! mk_ops {
  ($trait:ident, $trait_assign:ident, $name:ident, $name_assign:ident, $checked:ident) => {
    impl<F: Format>
    $trait<NarrowFloat<F>> for NarrowFloat<F> {
      type Output = NarrowFloat<F>;

      #[inline]
      #[track_caller]
      fn $name(self, rhs: Self) -> Self::Output { domain(self.$checked(rhs)) }
    }

    impl<F: Format>
    $trait<&NarrowFloat<F>> for NarrowFloat<F> {
      type Output = NarrowFloat<F>;

      #[inline]
      #[track_caller]
      fn $name(self, rhs: &Self) -> Self::Output { domain(self.$checked(*rhs)) }
    }

    impl<F: Format>
    $trait<NarrowFloat<F>> for &NarrowFloat<F> {
      type Output = NarrowFloat<F>;

      #[inline]
      #[track_caller]
      fn $name(self, rhs: NarrowFloat<F>) -> Self::Output { domain((*self).$checked(rhs)) }
    }

    impl<F: Format>
    $trait<&NarrowFloat<F>> for &NarrowFloat<F> {
      type Output = NarrowFloat<F>;

      #[inline]
      #[track_caller]
      fn $name(self, rhs: &NarrowFloat<F>) -> Self::Output { domain((*self).$checked(*rhs)) }
    }

    impl<F: Format>
    $trait_assign<NarrowFloat<F>> for NarrowFloat<F> {
      #[inline]
      #[track_caller]
      fn $name_assign(&mut self, rhs: NarrowFloat<F>) { *self = domain(self.$checked(rhs)) }
    }

    impl<F: Format>
    $trait_assign<&NarrowFloat<F>> for NarrowFloat<F> {
      #[inline]
      #[track_caller]
      fn $name_assign(&mut self, rhs: &NarrowFloat<F>) { *self = domain(self.$checked(*rhs)) }
    }
  }
}

mk_ops!{Add, AddAssign, add, add_assign, checked_add}
mk_ops!{Sub, SubAssign, sub, sub_assign, checked_sub}
mk_ops!{Mul, MulAssign, mul, mul_assign, checked_mul}
mk_ops!{Div, DivAssign, div, div_assign, checked_div}

impl<F: Format>
Neg for NarrowFloat<F> {
  type Output = NarrowFloat<F>;

  #[inline]
  #[track_caller]
  fn neg(self) -> Self::Output { domain(self.checked_neg()) }
}

impl<F: Format>
Neg for &NarrowFloat<F> {
  type Output = NarrowFloat<F>;

  #[inline]
  #[track_caller]
  fn neg(self) -> Self::Output { domain((*self).checked_neg()) }
}
