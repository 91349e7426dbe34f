use super::*;

impl<F: Format> NarrowFloat<F> {
  /// Decode, apply `op` natively, round. Shared by the elementary functions below.
  #[inline]
  fn unary_in(self, ctx: &mut RoundingContext, op: impl FnOnce(f64) -> f64) -> Result<Self> {
    let a = self.to_f64();
    if a.is_nan() && Self::SIGNALING {
      ctx.raise(ExceptionFlags::INVALID);
      return Err(Error::SignalingNan)
    }
    let result = op(a);
    if result.is_nan() && !a.is_nan() {
      ctx.raise(ExceptionFlags::INVALID);
    }
    Self::from_f64_in(result, ctx)
  }

  /// The absolute value. Never rounds: `-x` is representable whenever `x` is negative, except
  /// in formats with an asymmetric range, where the magnitude saturates like any other value.
  pub fn abs(self) -> Self {
    if self.is_sign_negative() && !self.is_nan() {
      let flipped = Self::from_u16(self.to_u16() ^ F::DESCRIPTOR.sign_mask());
      if flipped.to_f64() == -self.to_f64() {
        return flipped
      }
      return if self.is_infinite() { Self::INFINITY.unwrap_or(Self::MAX) } else { Self::MAX }
    }
    self
  }

  /// The square root, rounded using `ctx`. The root of a negative number is NaN (raising
  /// [`INVALID`](ExceptionFlags::INVALID)), which fails if the format has no NaN.
  ///
  /// ```
  /// # use narrowfloat::*;
  /// let mut ctx = RoundingContext::seeded(0);
  /// let x = f8e4m3fn::try_from_f64(2.0).unwrap();
  /// assert_eq!(x.sqrt_in(&mut ctx).unwrap().to_f64(), 1.375);
  /// ```
  pub fn sqrt_in(self, ctx: &mut RoundingContext) -> Result<Self> {
    self.unary_in(ctx, f64::sqrt)
  }

  /// As [`sqrt_in`](Self::sqrt_in), with this thread's default context.
  pub fn sqrt(self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.sqrt_in(ctx))
  }

  /// Largest integer `<= self`, rounded back into the format (integers beyond the precision of
  /// the format are not representable).
  pub fn floor_in(self, ctx: &mut RoundingContext) -> Result<Self> {
    self.unary_in(ctx, f64::floor)
  }

  pub fn floor(self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.floor_in(ctx))
  }

  /// Smallest integer `>= self`, rounded back into the format.
  pub fn ceil_in(self, ctx: &mut RoundingContext) -> Result<Self> {
    self.unary_in(ctx, f64::ceil)
  }

  pub fn ceil(self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.ceil_in(ctx))
  }

  /// Base 2 logarithm. `log2(0)` is `-inf` (raising
  /// [`DIVISION_BY_ZERO`](ExceptionFlags::DIVISION_BY_ZERO)), then subject to the overflow policy.
  pub fn log2_in(self, ctx: &mut RoundingContext) -> Result<Self> {
    if self.is_zero() {
      ctx.raise(ExceptionFlags::DIVISION_BY_ZERO);
    }
    self.unary_in(ctx, f64::log2)
  }

  pub fn log2(self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.log2_in(ctx))
  }

  /// `self^n`, computed natively and rounded once.
  pub fn powi_in(self, n: i32, ctx: &mut RoundingContext) -> Result<Self> {
    self.unary_in(ctx, |a| a.powi(n))
  }

  pub fn powi(self, n: i32) -> Result<Self> {
    crate::with_thread_context(|ctx| self.powi_in(n, ctx))
  }

  /// The smaller of two numbers. If one of them is NaN, the other is returned.
  pub fn min(self, other: Self) -> Self {
    if self.is_nan() || other < self { other } else { self }
  }

  /// The larger of two numbers. If one of them is NaN, the other is returned.
  pub fn max(self, other: Self) -> Self {
    if self.is_nan() || other > self { other } else { self }
  }
}
