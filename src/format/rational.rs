use super::*;

use malachite::rational::Rational;
use malachite::base::num::arithmetic::traits::{Abs, PowerOf2};
use proptest::prelude::*;

/// Convert a finite pattern of `d` into a [Rational]; `None` for infinity and NaN.
///
/// This is a **super-explicit** rendition of decoding, field by field, since this is what the
/// optimised [`FormatDescriptor::decode`] is checked against.
pub fn to_rational(d: &FormatDescriptor, bits: u16) -> Option<Rational> {
  let bits = bits & d.used_mask();
  if d.nan_patterns().matches(bits) || d.inf_patterns().matches(bits) {
    return None
  }
  let bits = bits as u32;
  let m = d.mantissa_bits();
  let e = d.exponent_bits();

  let negative = d.is_signed() && (bits >> (e + m)) & 1 == 1;
  let exponent_field = (bits >> m) & ((1 << e) - 1);
  let fraction = bits & ((1 << m) - 1);

  // Subnormals: no hidden bit, and the exponent of the smallest normal.
  let (significand, exponent) =
    if exponent_field == 0 { (fraction, 1 - d.bias()) }
    else { (fraction + (1 << m), exponent_field as i32 - d.bias()) };

  let abs = Rational::from(significand) * Rational::power_of_2(exponent as i64 - m as i64);
  Some(if negative { -abs } else { abs })
}

/// All finite values of a format, sorted, for nearest-value searches.
pub struct Candidates {
  values: Vec<(Rational, u16)>,
  /// Value of each pattern, indexed by the pattern.
  by_bits: Vec<Option<Rational>>,
}

impl Candidates {
  pub fn new(d: &FormatDescriptor) -> Self {
    let by_bits: Vec<Option<Rational>> = (0 ..= d.used_mask()).map(|bits| to_rational(d, bits)).collect();
    let mut values: Vec<(Rational, u16)> = by_bits.iter()
      .zip(0 ..= d.used_mask())
      .filter_map(|(r, bits)| r.clone().map(|r| (r, bits)))
      .collect();
    values.sort_by(|a, b| a.0.cmp(&b.0));
    Self { values, by_bits }
  }

  /// Largest candidate `<= x` and smallest candidate `>= x`.
  fn neighbours(&self, x: &Rational) -> (&(Rational, u16), &(Rational, u16)) {
    let below = self.values.partition_point(|(r, _)| r <= x);
    let above = self.values.partition_point(|(r, _)| r < x);
    let lower = below.checked_sub(1).map(|i| &self.values[i]).expect("x below the range");
    let upper = self.values.get(above).expect("x above the range");
    (lower, upper)
  }

  /// Check that `got` is the correct rounding of `value` (which must lie within the finite range)
  /// under `mode`. For stochastic rounding, either neighbour is correct.
  pub fn is_correct_rounded(&self, value: f64, got: u16, mode: RoundingMode) -> bool {
    let Ok(x) = Rational::try_from(value) else { return false };
    let Some(Some(got)) = self.by_bits.get(got as usize) else {
      return false
    };
    let (lower, upper) = self.neighbours(&x);
    let zero = Rational::from(0);
    let expected = match mode {
      RoundingMode::RoundTowardsZero => if x >= zero { lower } else { upper },
      RoundingMode::RoundAwayFromZero => if x >= zero { upper } else { lower },
      RoundingMode::RoundUp => upper,
      RoundingMode::RoundDown => lower,
      RoundingMode::StochasticRounding => return *got == lower.0 || *got == upper.0,
      RoundingMode::RoundToNearestEven | RoundingMode::RoundToNearestOdd | RoundingMode::RoundTiesToAway => {
        let below = &x - &lower.0;
        let above = &upper.0 - &x;
        if below < above {
          lower
        } else if above < below {
          upper
        } else {
          match mode {
            RoundingMode::RoundToNearestEven => if lower.1 & 1 == 0 { lower } else { upper },
            RoundingMode::RoundToNearestOdd => if lower.1 & 1 == 1 { lower } else { upper },
            _ => if (&lower.0).abs() > (&upper.0).abs() { lower } else { upper },
          }
        }
      }
    };
    *got == expected.0
  }
}

/// A [proptest Strategy](proptest::strategy::Strategy) yielding `f64`s within the finite range
/// of `d`: uniform, log-uniform, and exact midpoints between neighbouring values (ties).
pub fn cases_in_range(d: &FormatDescriptor) -> impl Strategy<Value = f64> {
  let d = *d;
  let signed = d.is_signed();
  let hi = d.max_finite();
  let lo = d.min_finite();
  let neg_hi = if signed { -lo } else { 0.0 };
  let min_exp = (d.min_exp() - d.mantissa_bits() as i32 - 2) as f64;
  let max_exp = d.max_exp() as f64 + 1.0;
  let top = if signed { d.max_mag(false).min(d.max_mag(true)) } else { d.max_mag(false) };
  let sign = move |negative: bool, v: f64| if negative && signed { -v.min(neg_hi) } else { v.min(hi) };
  prop_oneof![
    lo ..= hi,
    (any::<bool>(), min_exp .. max_exp).prop_map(move |(negative, e)| sign(negative, e.exp2())),
    (any::<bool>(), 0 .. top).prop_map(move |(negative, mag)| {
      sign(negative, (d.decode(mag) + d.decode(mag + 1)) / 2.0)
    }),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::presets::*;

  #[test]
  fn e4m3fn() {
    let d = FLOAT8_E4M3FN;
    assert_eq!(to_rational(&d, 0x38), Some(Rational::from(1)));
    assert_eq!(to_rational(&d, 0x7e), Some(Rational::from(448)));
    assert_eq!(to_rational(&d, 0xfe), Some(Rational::from(-448)));
    assert_eq!(to_rational(&d, 0x01), Some(Rational::from_signeds(1, 512)));
    assert_eq!(to_rational(&d, 0x09), Some(Rational::from_signeds(9, 512)));
    assert_eq!(to_rational(&d, 0x7f), None);
  }

  #[test]
  fn e2m1() {
    let d = FLOAT4_E2M1;
    let values: Vec<Rational> = (0 .. 8).filter_map(|b| to_rational(&d, b)).collect();
    let expected: Vec<Rational> = [(0, 1), (1, 2), (1, 1), (3, 2), (2, 1), (3, 1), (4, 1), (6, 1)]
      .into_iter()
      .map(|(n, d)| Rational::from_signeds(n, d))
      .collect();
    assert_eq!(values, expected);
  }

  /// The optimised decoder agrees with the explicit one on every pattern of every preset.
  #[test]
  fn decode_agrees() {
    for d in [FLOAT8_E4M3FN, FLOAT8_E4M3FNUZ, FLOAT8_E4M3B11FNUZ, FLOAT8_E5M2, FLOAT8_E5M2FNUZ,
              float8_ieee_p(3), float8_ieee_p(5), FLOAT6_E3M2, FLOAT6_E2M3, FLOAT4_E2M1] {
      for bits in 0 ..= d.used_mask() {
        let fast = d.decode(bits);
        match to_rational(&d, bits) {
          Some(r) => assert_eq!(Rational::try_from(fast).ok(), Some(r), "{d:?} {bits:#x}"),
          None => assert!(fast.is_nan() || fast.is_infinite()),
        }
      }
    }
  }

  #[test]
  fn oracle_ties() {
    let d = FLOAT8_E4M3FN;
    let c = Candidates::new(&d);
    assert!(c.is_correct_rounded(1.0625, 0x38, RoundingMode::RoundToNearestEven));
    assert!(!c.is_correct_rounded(1.0625, 0x39, RoundingMode::RoundToNearestEven));
    assert!(c.is_correct_rounded(1.0625, 0x39, RoundingMode::RoundToNearestOdd));
    assert!(c.is_correct_rounded(-1.0625, 0xb9, RoundingMode::RoundTiesToAway));
  }
}
