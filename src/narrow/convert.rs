use super::*;

/// Used to do value-to-value conversions that may *round* the input, according to the rounding
/// mode and overflow and NaN policies of the target format. It is the reciprocal of
/// [`RoundInto`].
///
/// The interface mirrors [`TryFrom`], but rounding is not a failure: only the domain errors of
/// the target format are (overflow of a [`Trapping`](crate::InfBehavior::Trapping) format, or a
/// NaN for a format without one). Prefer implementing [`RoundFrom`] and bounding generic code on
/// [`RoundInto`], as with [`From`] and [`Into`].
///
/// Conversions that round use this thread's default [`RoundingContext`]; to supply one, use
/// [`NarrowFloat::from_f64_in`] or [`NarrowFloat::convert_in`].
///
/// # Examples
///
/// ```
/// # use narrowfloat::*;
/// assert_eq!(f8e4m3fn::round_from(1.3_f32).unwrap().to_f64(), 1.25);
/// assert_eq!(f8e4m3fn::round_from(1e9_f64).unwrap(), f8e4m3fn::MAX);
///
/// let x: f8e5m2 = half::f16::from_f32(3.0).round_into().unwrap();
/// assert_eq!(x.to_f64(), 3.0);
/// ```
pub trait RoundFrom<T>: Sized {
  /// Converts to this type from the input type, rounding if needed.
  ///
  /// # Errors
  ///
  /// The domain errors of the target format; see [`NarrowFloat::from_f64_in`].
  fn round_from(value: T) -> Result<Self>;
}

/// The reciprocal of [`RoundFrom`]. Implemented for every `T` such that `U: RoundFrom<T>`.
pub trait RoundInto<T> {
  /// Converts this type into the (usually inferred) output type, rounding if needed.
  ///
  /// # Errors
  ///
  /// The domain errors of the target format; see [`NarrowFloat::from_f64_in`].
  fn round_into(self) -> Result<T>;
}

impl<T, U: RoundFrom<T>> RoundInto<U> for T {
  #[inline]
  fn round_into(self) -> Result<U> {
    U::round_from(self)
  }
}

impl<F: Format>
RoundFrom<f64> for NarrowFloat<F> {
  #[inline]
  fn round_from(value: f64) -> Result<Self> {
    Self::try_from_f64(value)
  }
}

impl<F: Format>
RoundFrom<f32> for NarrowFloat<F> {
  #[inline]
  fn round_from(value: f32) -> Result<Self> {
    Self::try_from_f64(value as f64)
  }
}

impl<F: Format>
RoundFrom<half::f16> for NarrowFloat<F> {
  #[inline]
  fn round_from(value: half::f16) -> Result<Self> {
    Self::try_from_f64(value.to_f64())
  }
}

impl<F: Format, G: Format>
RoundFrom<NarrowFloat<G>> for NarrowFloat<F> {
  #[inline]
  fn round_from(value: NarrowFloat<G>) -> Result<Self> {
    value.convert()
  }
}

/// Every value of every format is an `f64`, so this is exact.
impl<F: Format>
From<NarrowFloat<F>> for f64 {
  #[inline]
  fn from(value: NarrowFloat<F>) -> Self {
    value.to_f64()
  }
}

impl<F: Format> NarrowFloat<F> {
  /// Round into another format `G`, using `ctx`.
  ///
  /// # Errors
  ///
  /// The domain errors of `G`; see [`NarrowFloat::from_f64_in`].
  #[inline]
  pub fn convert_in<G: Format>(self, ctx: &mut RoundingContext) -> Result<NarrowFloat<G>> {
    NarrowFloat::<G>::from_f64_in(self.to_f64(), ctx)
  }

  /// Round into another format `G`, with this thread's default context.
  ///
  /// ```
  /// # use narrowfloat::*;
  /// let wide = f8e5m2::try_from_f64(1024.0).unwrap();
  /// let narrow: f8e4m3fn = wide.convert().unwrap();
  /// assert_eq!(narrow, f8e4m3fn::MAX);
  /// ```
  ///
  /// # Errors
  ///
  /// The domain errors of `G`; see [`NarrowFloat::from_f64_in`].
  #[inline]
  pub fn convert<G: Format>(self) -> Result<NarrowFloat<G>> {
    crate::with_thread_context(|ctx| self.convert_in(ctx))
  }
}
