use super::*;
use super::basics::scale2;
use crate::{Error, Result};

/// Where the discarded part of a magnitude lies, relative to half a quantum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tail {
  Exact,
  BelowHalf,
  Half,
  AboveHalf,
}

/// A positive finite `f64` cut at the quantum of a format: `value = (n + fraction) * 2^(E - m)`,
/// where `E = max(floor(log2(value)), emin)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Quantized {
  /// `E - emin`.
  pub steps: u64,
  /// Integer number of quanta.
  pub n: u64,
  pub tail: Tail,
  /// The discarded part in units of the quantum, in `[0, 1)`. Only needed by stochastic rounding.
  pub fraction: f64,
}

impl Quantized {
  /// The magnitude pattern `n` encodes at exponent `E`. When `E > emin`, `n` carries the hidden bit
  /// at position `m`, so the exponent field comes out as `E - emin + 1` with no special casing;
  /// and an increment that carries out of the mantissa bumps the exponent by itself.
  #[inline]
  pub fn magnitude(&self, m: u32, increment: bool) -> u64 {
    (self.steps << m) + self.n + increment as u64
  }
}

impl FormatDescriptor {
  /// Split a positive, finite, nonzero `a` at the quantum of this format.
  pub(crate) fn quantize(&self, a: f64) -> Quantized {
    debug_assert!(a.is_finite() && a > 0.0);
    let m = self.mantissa_bits as i32;
    let emin = self.min_exp();

    // a = sig * 2^e2, exactly.
    let raw = a.to_bits();
    let biased = (raw >> 52) as i32;
    let frac = raw & ((1 << 52) - 1);
    let (sig, e2) = if biased == 0 { (frac, -1074) } else { (frac | 1 << 52, biased - 1075) };
    let e = e2 + (63 - sig.leading_zeros() as i32);

    let exp = e.max(emin);
    let steps = (exp - emin) as u64;
    // Quantum is 2^(exp - m); shift `sig` so that its units are quanta.
    let shift = (exp - m) - e2;
    if shift <= 0 {
      return Quantized { steps, n: sig << (-shift), tail: Tail::Exact, fraction: 0.0 }
    }
    if shift >= 64 {
      // sig < 2^53, so less than half a quantum.
      let fraction = scale2(sig as f64, -shift);
      return Quantized { steps, n: 0, tail: Tail::BelowHalf, fraction }
    }
    let n = sig >> shift;
    let rem = sig & ((1 << shift) - 1);
    let half = 1u64 << (shift - 1);
    let tail =
      if rem == 0 { Tail::Exact }
      else if rem < half { Tail::BelowHalf }
      else if rem == half { Tail::Half }
      else { Tail::AboveHalf };
    let fraction = scale2(rem as f64, -shift);
    Quantized { steps, n, tail, fraction }
  }

  /// Whether the magnitude `q.n` should be incremented, according to the rounding mode.
  pub(crate) fn round_up(&self, q: &Quantized, negative: bool, ctx: &mut RoundingContext) -> bool {
    let odd = q.n & 1 == 1;
    match (self.rounding_mode, q.tail) {
      (_, Tail::Exact) => false,
      (RoundingMode::RoundToNearestEven, Tail::Half) => odd,
      (RoundingMode::RoundToNearestOdd, Tail::Half) => !odd,
      (RoundingMode::RoundTiesToAway, Tail::Half) => true,
      (
        RoundingMode::RoundToNearestEven | RoundingMode::RoundToNearestOdd | RoundingMode::RoundTiesToAway,
        tail,
      ) => tail == Tail::AboveHalf,
      (RoundingMode::RoundTowardsZero, _) => false,
      (RoundingMode::RoundAwayFromZero, _) => true,
      (RoundingMode::RoundUp, _) => !negative,
      (RoundingMode::RoundDown, _) => negative,
      (RoundingMode::StochasticRounding, _) => ctx.stochastic_round_up(q.fraction, self.stochastic_bits),
    }
  }

  /// Whether the rounding mode never increases the magnitude of a value with this sign.
  const fn rounds_toward_zero(&self, negative: bool) -> bool {
    match self.rounding_mode {
      RoundingMode::RoundTowardsZero => true,
      RoundingMode::RoundDown => !negative,
      RoundingMode::RoundUp => negative,
      _ => false,
    }
  }

  /// Attach a sign to a finite magnitude. A negative zero whose pattern is reserved (e.g. for NaN)
  /// becomes positive zero.
  #[inline]
  fn compose(&self, negative: bool, mag: u16) -> u16 {
    if !negative || !self.is_signed() {
      return mag
    }
    let bits = self.sign_mask() | mag;
    if mag == 0 && (self.nan_checker.matches(bits) || self.inf_checker.matches(bits)) { 0 } else { bits }
  }

  /// The pattern for NaN, or the error if this format has none.
  pub(crate) fn encode_nan(&self, ctx: &mut RoundingContext) -> Result<u16> {
    let nan = self.nan_checker.canonical().ok_or(Error::NanNotRepresentable)?;
    match self.nan_behavior {
      NanBehavior::NoNaN => Err(Error::NanNotRepresentable),
      NanBehavior::QuietNaN => Ok(nan),
      NanBehavior::SignalingNaN => {
        ctx.raise(ExceptionFlags::INVALID);
        Ok(nan)
      }
    }
  }

  /// A magnitude beyond the largest finite one. `rounded` is false when `value` is an infinity,
  /// which is exact and so not subject to the rounding direction.
  fn encode_overflow(&self, value: f64, negative: bool, rounded: bool, ctx: &mut RoundingContext) -> Result<u16> {
    let saturated = self.max_finite_bits(negative);
    let result = match self.inf_behavior {
      InfBehavior::Trapping => {
        ctx.raise(ExceptionFlags::OVERFLOW | ExceptionFlags::INEXACT);
        return Err(Error::Overflow { value })
      }
      InfBehavior::Saturating => saturated,
      InfBehavior::NonTrappingInf if rounded && self.rounds_toward_zero(negative) => saturated,
      InfBehavior::NonTrappingInf => {
        match self.inf_checker.with_sign(negative, self.sign_mask()) {
          Some(inf) => {
            if rounded { ctx.raise(ExceptionFlags::OVERFLOW | ExceptionFlags::INEXACT) }
            return Ok(inf)
          }
          None => saturated,
        }
      }
    };
    ctx.raise(if rounded { ExceptionFlags::OVERFLOW | ExceptionFlags::INEXACT } else { ExceptionFlags::INEXACT });
    Ok(result)
  }

  /// The rounding engine: the bit pattern of the value of this format nearest to `value`, under
  /// this format's rounding mode, overflow policy and NaN policy. Exception flags and the random
  /// source for stochastic rounding live in `ctx`.
  ///
  /// ```
  /// # use narrowfloat::{*, presets::FLOAT8_E4M3FN};
  /// let mut ctx = RoundingContext::seeded(0);
  /// assert_eq!(FLOAT8_E4M3FN.round_and_encode(448.0, &mut ctx), Ok(0x7e));
  /// assert_eq!(FLOAT8_E4M3FN.round_and_encode(500.0, &mut ctx), Ok(0x7e));
  /// assert_eq!(FLOAT8_E4M3FN.round_and_encode(-1.0, &mut ctx), Ok(0xb8));
  /// assert_eq!(FLOAT8_E4M3FN.round_and_encode(f64::NAN, &mut ctx), Ok(0x7f));
  /// ```
  ///
  /// # Errors
  ///
  /// [`Error::Overflow`] when the rounded magnitude exceeds the largest finite one and the format
  /// is [`Trapping`](InfBehavior::Trapping); [`Error::NanNotRepresentable`] for NaN (or a
  /// negative value of a [`NegativeToNaN`](UnsignedBehavior::NegativeToNaN) unsigned format)
  /// when the format has no NaN.
  pub fn round_and_encode(&self, value: f64, ctx: &mut RoundingContext) -> Result<u16> {
    if value.is_nan() {
      return self.encode_nan(ctx)
    }
    let negative = value.is_sign_negative();
    if negative && !self.is_signed() {
      if value == 0.0 {
        return Ok(0)
      }
      return match self.unsigned_behavior {
        UnsignedBehavior::NegativeToZero => {
          ctx.raise(ExceptionFlags::UNDERFLOW | ExceptionFlags::INEXACT);
          Ok(0)
        }
        UnsignedBehavior::NegativeToNaN => self.encode_nan(ctx),
      }
    }
    if value.is_infinite() {
      return self.encode_overflow(value, negative, false, ctx)
    }
    if value == 0.0 {
      return Ok(self.compose(negative, 0))
    }

    let q = self.quantize(value.abs());
    let increment = self.round_up(&q, negative, ctx);
    let mag = q.magnitude(self.mantissa_bits, increment);

    // Stochastic candidates past the largest finite value fall to the overflow policy as well.
    if mag > self.max_mag(negative) as u64 {
      return self.encode_overflow(value, negative, true, ctx)
    }
    if q.tail != Tail::Exact {
      ctx.raise(ExceptionFlags::INEXACT);
      if mag >> self.mantissa_bits == 0 {
        ctx.raise(ExceptionFlags::UNDERFLOW);
      }
    }
    Ok(self.compose(negative, mag as u16))
  }
}
