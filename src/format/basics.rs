use super::*;

impl FormatDescriptor {
  /// Logical width in bits, including any unused padding bits above the fields.
  pub const fn width(&self) -> u32 { self.width }

  pub const fn exponent_bits(&self) -> u32 { self.exponent_bits }

  pub const fn mantissa_bits(&self) -> u32 { self.mantissa_bits }

  pub const fn bias(&self) -> i32 { self.bias }

  pub const fn signedness(&self) -> Signedness { self.signedness }

  pub const fn rounding_mode(&self) -> RoundingMode { self.rounding_mode }

  pub const fn stochastic_bits(&self) -> u32 { self.stochastic_bits }

  pub const fn inf_behavior(&self) -> InfBehavior { self.inf_behavior }

  pub const fn nan_behavior(&self) -> NanBehavior { self.nan_behavior }

  pub const fn unsigned_behavior(&self) -> UnsignedBehavior { self.unsigned_behavior }

  /// The predicate that recognises infinity patterns.
  pub fn inf_checker(&self) -> &dyn SpecialValueChecker { &self.inf_checker }

  /// The predicate that recognises NaN patterns.
  pub fn nan_checker(&self) -> &dyn SpecialValueChecker { &self.nan_checker }

  pub const fn inf_patterns(&self) -> SpecialPatterns { self.inf_checker }

  pub const fn nan_patterns(&self) -> SpecialPatterns { self.nan_checker }

  pub const fn is_signed(&self) -> bool {
    matches!(self.signedness, Signedness::Signed)
  }

  /// Number of bits actually carrying information: sign (if any), exponent and mantissa.
  pub const fn used_bits(&self) -> u32 {
    self.is_signed() as u32 + self.exponent_bits + self.mantissa_bits
  }

  pub(crate) const fn used_mask(&self) -> u16 {
    ((1u32 << self.used_bits()) - 1) as u16
  }

  pub(crate) const fn mag_mask(&self) -> u16 {
    ((1u32 << (self.exponent_bits + self.mantissa_bits)) - 1) as u16
  }

  pub(crate) const fn mant_mask(&self) -> u16 {
    ((1u32 << self.mantissa_bits) - 1) as u16
  }

  pub(crate) const fn sign_mask(&self) -> u16 {
    if self.is_signed() { 1 << (self.exponent_bits + self.mantissa_bits) } else { 0 }
  }

  /// Whether the sign bit of `bits` is set (always false for unsigned formats).
  #[inline]
  pub(crate) const fn is_negative_pattern(&self, bits: u16) -> bool {
    bits & self.sign_mask() != 0
  }

  /// Largest finite magnitude (pattern without sign) for values of the given sign.
  #[inline]
  pub(crate) const fn max_mag(&self, negative: bool) -> u16 {
    if negative { self.max_neg_mag } else { self.max_pos_mag }
  }

  /// The bit pattern of the largest finite value of the given sign. For unsigned formats the
  /// "largest negative" value is zero.
  pub const fn max_finite_bits(&self, negative: bool) -> u16 {
    if !negative {
      self.max_pos_mag
    } else if self.is_signed() {
      self.sign_mask() | self.max_neg_mag
    } else {
      0
    }
  }

  /// Exponent of the smallest normal value, `1 - bias`.
  pub const fn min_exp(&self) -> i32 {
    1 - self.bias
  }

  /// Exponent of the largest finite value.
  pub const fn max_exp(&self) -> i32 {
    let field = (self.max_pos_mag >> self.mantissa_bits) as i32;
    if field == 0 { self.min_exp() } else { field - self.bias }
  }

  /// Largest finite value.
  pub fn max_finite(&self) -> f64 {
    self.magnitude_value(self.max_pos_mag)
  }

  /// Most negative finite value (zero for unsigned formats).
  pub fn min_finite(&self) -> f64 {
    if self.is_signed() { -self.magnitude_value(self.max_neg_mag) } else { 0.0 }
  }

  /// Smallest positive normal value, `2^min_exp`.
  pub fn min_positive_normal(&self) -> f64 {
    pow2(self.min_exp())
  }

  /// Smallest positive value, `2^(min_exp - m)`.
  pub fn min_positive_subnormal(&self) -> f64 {
    pow2(self.min_exp() - self.mantissa_bits as i32)
  }

  /// Distance from 1 to the next larger value of the format (assuming it has both).
  pub fn epsilon(&self) -> f64 {
    pow2(-(self.mantissa_bits as i32))
  }

  /// The pattern of `+2^exp`, if that value is representable.
  pub const fn power_of_two_bits(&self, exp: i32) -> Option<u16> {
    let m = self.mantissa_bits as i32;
    let emin = self.min_exp();
    let mag = if exp >= emin {
      let field = exp + self.bias;
      if field >= 1 << self.exponent_bits { return None }
      if self.exponent_bits == 0 { return None }
      (field as u32) << m
    } else {
      let shift = m - (emin - exp);
      if shift < 0 { return None }
      1u32 << shift
    };
    if mag > self.max_pos_mag as u32 { None } else { Some(mag as u16) }
  }
}

/// Exactly `2^k`, for `k` in the normal range of `f64`.
#[inline]
pub(crate) fn pow2(k: i32) -> f64 {
  debug_assert!((-1022..=1023).contains(&k));
  f64::from_bits(((k + 1023) as u64) << 52)
}

/// `x * 2^k` for any `k`, without intermediate overflow or underflow of the scale factor.
#[inline]
pub(crate) fn scale2(x: f64, k: i32) -> f64 {
  let mut x = x;
  let mut k = k;
  while k > 1023 { x *= pow2(1023); k -= 1023 }
  while k < -1022 { x *= pow2(-1022); k += 1022 }
  x * pow2(k)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::presets;

  #[test]
  fn e4m3fn() {
    let d = presets::FLOAT8_E4M3FN;
    assert_eq!(d.used_bits(), 8);
    assert_eq!(d.max_finite(), 448.0);
    assert_eq!(d.min_finite(), -448.0);
    assert_eq!(d.min_positive_normal(), 2f64.powi(-6));
    assert_eq!(d.min_positive_subnormal(), 2f64.powi(-9));
    assert_eq!(d.epsilon(), 0.125);
    assert_eq!(d.max_exp(), 8);
  }

  #[test]
  fn e5m2() {
    let d = presets::FLOAT8_E5M2;
    assert_eq!(d.max_finite(), 98304.0);
    assert_eq!(d.min_positive_subnormal(), 2f64.powi(-16));
  }

  #[test]
  fn unsigned() {
    let d = presets::FLOAT8_E4M3FNUZ;
    assert_eq!(d.used_bits(), 8);
    assert_eq!(d.min_finite(), 0.0);
    assert_eq!(d.max_finite_bits(true), 0);
    assert_eq!(d.exponent_bits(), 5);
    assert_eq!(d.max_finite(), 14.0 * 2f64.powi(21));
  }

  #[test]
  fn powers_of_two() {
    let d = presets::FLOAT8_E4M3FN;
    assert_eq!(d.power_of_two_bits(0), Some(0x38));
    assert_eq!(d.power_of_two_bits(-9), Some(0x01));
    assert_eq!(d.power_of_two_bits(-10), None);
    assert_eq!(d.power_of_two_bits(8), Some(0x78));
    assert_eq!(d.power_of_two_bits(9), None);
  }

  #[test]
  fn scale() {
    assert_eq!(scale2(1.0, -1074), f64::from_bits(1));
    assert_eq!(scale2(3.0, 4), 48.0);
    assert_eq!(scale2(1.0, -3000), 0.0);
  }
}
