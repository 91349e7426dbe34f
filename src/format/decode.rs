use super::*;
use super::basics::pow2;
use core::num::FpCategory;

impl FormatDescriptor {
  /// Decode a bit pattern into the `f64` it represents. Bits above
  /// [`used_bits`](Self::used_bits) are ignored.
  ///
  /// Decoding is total: every pattern is zero, subnormal, normal, infinite (if the infinity
  /// checker matches it) or NaN (if the NaN checker matches it). The result is exact.
  ///
  /// ```
  /// # use narrowfloat::presets::FLOAT8_E4M3FN;
  /// assert_eq!(FLOAT8_E4M3FN.decode(0x7e), 448.0);
  /// assert_eq!(FLOAT8_E4M3FN.decode(0x81), -0.001953125);
  /// assert!(FLOAT8_E4M3FN.decode(0xff).is_nan());
  /// ```
  pub fn decode(&self, bits: u16) -> f64 {
    let bits = bits & self.used_mask();
    if self.nan_checker.matches(bits) {
      return f64::NAN
    }
    let negative = self.is_negative_pattern(bits);
    if self.inf_checker.matches(bits) {
      return if negative { f64::NEG_INFINITY } else { f64::INFINITY }
    }
    let value = self.magnitude_value(bits & self.mag_mask());
    if negative { -value } else { value }
  }

  /// The value of a finite magnitude (a pattern without its sign bit).
  #[inline]
  pub(crate) fn magnitude_value(&self, mag: u16) -> f64 {
    let m = self.mantissa_bits;
    let field = (mag >> m) as i32;
    let frac = mag & self.mant_mask();
    // Subnormals share the exponent of the smallest normal, minus the hidden bit.
    let (significand, exp) =
      if field == 0 { (frac as u32, self.min_exp()) }
      else { ((frac as u32) | (1 << m), field - self.bias) };
    significand as f64 * pow2(exp - m as i32)
  }

  /// Classify a bit pattern, like [`f64::classify`].
  pub fn classify(&self, bits: u16) -> FpCategory {
    let bits = bits & self.used_mask();
    if self.nan_checker.matches(bits) {
      FpCategory::Nan
    } else if self.inf_checker.matches(bits) {
      FpCategory::Infinite
    } else {
      let mag = bits & self.mag_mask();
      if mag == 0 {
        FpCategory::Zero
      } else if mag >> self.mantissa_bits == 0 {
        FpCategory::Subnormal
      } else {
        FpCategory::Normal
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::presets::*;

  #[test]
  fn e4m3fn() {
    let d = FLOAT8_E4M3FN;
    assert_eq!(d.decode(0x00), 0.0);
    assert!(d.decode(0x80).is_sign_negative());
    assert_eq!(d.decode(0x80), 0.0);
    assert_eq!(d.decode(0x01), 2f64.powi(-9));
    assert_eq!(d.decode(0x08), 2f64.powi(-6));
    assert_eq!(d.decode(0x38), 1.0);
    assert_eq!(d.decode(0xb8), -1.0);
    assert_eq!(d.decode(0x7e), 448.0);
    assert!(d.decode(0x7f).is_nan());
    assert!(d.decode(0xff).is_nan());
  }

  #[test]
  fn ieee_p3() {
    let d = float8_ieee_p(3);
    assert_eq!(d.decode(0x7f), f64::INFINITY);
    assert_eq!(d.decode(0xff), f64::NEG_INFINITY);
    assert!(d.decode(0x80).is_nan());
    assert_eq!(d.classify(0x80), FpCategory::Nan);
    assert_eq!(d.classify(0x7f), FpCategory::Infinite);
  }

  #[test]
  fn ignores_high_bits() {
    let d = FLOAT4_E2M1;
    assert_eq!(d.decode(0xf2), d.decode(0x02));
    assert_eq!(d.decode(0x02), 1.0);
    assert_eq!(d.decode(0x07), 6.0);
    assert_eq!(d.decode(0x0f), -6.0);
  }

  #[test]
  fn classify() {
    let d = FLOAT8_E5M2;
    assert_eq!(d.classify(0x00), FpCategory::Zero);
    assert_eq!(d.classify(0x80), FpCategory::Zero);
    assert_eq!(d.classify(0x03), FpCategory::Subnormal);
    assert_eq!(d.classify(0x04), FpCategory::Normal);
    assert_eq!(d.classify(0xff), FpCategory::Nan);
  }

  /// Every pattern decodes to something, and finite magnitudes are strictly increasing.
  #[test]
  fn total_and_monotonic() {
    for d in [FLOAT8_E4M3FN, FLOAT8_E4M3FNUZ, FLOAT8_E4M3B11FNUZ, FLOAT8_E5M2, FLOAT8_E5M2FNUZ,
              float8_ieee_p(4), FLOAT6_E3M2, FLOAT6_E2M3, FLOAT4_E2M1] {
      let mut prev = -1.0;
      for mag in 0 ..= d.max_mag(false) {
        let v = d.decode(mag);
        assert!(v > prev, "{d:?} {mag:#x}");
        prev = v;
      }
      for bits in 0 ..= d.used_mask() {
        let _ = d.decode(bits);
      }
    }
  }
}
