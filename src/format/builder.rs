use super::*;

/// A [`FormatDescriptor`] under construction. Every method is `const`, so formats can be built
/// and validated at compile time:
///
/// ```
/// # use narrowfloat::*;
/// const E3M4: FormatDescriptor = FormatDescriptor::builder(8, 3, 4, 3)
///   .rounding(RoundingMode::RoundTiesToAway)
///   .validated();
/// assert_eq!(E3M4.max_finite(), 31.0);
/// ```
///
/// Invalid formats are rejected by [`build`](Self::build), or fail to compile when built with
/// [`validated`](Self::validated) in a `const`:
///
/// ```compile_fail
/// # use narrowfloat::*;
/// const BAD: FormatDescriptor = FormatDescriptor::builder(8, 5, 3, 15).validated();
/// let _ = BAD;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatBuilder(FormatDescriptor);

impl FormatDescriptor {
  /// Start describing a signed format of `width` bits with the given field widths and exponent
  /// bias. Defaults: [`RoundToNearestEven`](RoundingMode::RoundToNearestEven),
  /// [`Saturating`](InfBehavior::Saturating), [`NoNaN`](NanBehavior::NoNaN), no special patterns.
  pub const fn builder(width: u32, exponent_bits: u32, mantissa_bits: u32, bias: i32) -> FormatBuilder {
    FormatBuilder(FormatDescriptor {
      width,
      exponent_bits,
      mantissa_bits,
      bias,
      signedness: Signedness::Signed,
      rounding_mode: RoundingMode::RoundToNearestEven,
      stochastic_bits: 0,
      inf_behavior: InfBehavior::Saturating,
      nan_behavior: NanBehavior::NoNaN,
      unsigned_behavior: UnsignedBehavior::NegativeToZero,
      inf_checker: SpecialPatterns::None,
      nan_checker: SpecialPatterns::None,
      max_pos_mag: 0,
      max_neg_mag: 0,
    })
  }

  /// Reopen a descriptor for modification.
  pub const fn to_builder(self) -> FormatBuilder {
    FormatBuilder(self)
  }

  /// The same format with another rounding mode. Rounding does not affect validity.
  pub const fn with_rounding(mut self, mode: RoundingMode) -> Self {
    self.rounding_mode = mode;
    self
  }

  /// The same format with another treatment of negative values (only meaningful if unsigned).
  pub const fn with_unsigned_behavior(mut self, behavior: UnsignedBehavior) -> Self {
    self.unsigned_behavior = behavior;
    self
  }
}

impl FormatBuilder {
  pub const fn signedness(mut self, signedness: Signedness) -> Self {
    self.0.signedness = signedness;
    self
  }

  pub const fn rounding(mut self, mode: RoundingMode) -> Self {
    self.0.rounding_mode = mode;
    self
  }

  /// Number of random bits drawn per stochastic rounding. With `n` bits, a discarded fraction
  /// below `2^-n` of a quantum never rounds up. `0` (the default) draws a full `f64`.
  pub const fn stochastic_bits(mut self, bits: u32) -> Self {
    self.0.stochastic_bits = bits;
    self
  }

  pub const fn inf(mut self, behavior: InfBehavior, patterns: SpecialPatterns) -> Self {
    self.0.inf_behavior = behavior;
    self.0.inf_checker = patterns;
    self
  }

  pub const fn nan(mut self, behavior: NanBehavior, patterns: SpecialPatterns) -> Self {
    self.0.nan_behavior = behavior;
    self.0.nan_checker = patterns;
    self
  }

  pub const fn unsigned_behavior(mut self, behavior: UnsignedBehavior) -> Self {
    self.0.unsigned_behavior = behavior;
    self
  }

  /// Validate and finish the descriptor.
  pub const fn build(self) -> Result<FormatDescriptor, FormatError> {
    let mut d = self.0;

    if d.width == 0 || d.width > 16 {
      return Err(FormatError::WidthOutOfRange { width: d.width })
    }
    let sign_bits = match d.signedness { Signedness::Signed => 1, Signedness::Unsigned => 0 };
    let required = sign_bits + d.exponent_bits + d.mantissa_bits;
    if required > d.width {
      return Err(FormatError::BitBudgetExceeded { width: d.width, required })
    }
    if d.stochastic_bits > 32 {
      return Err(FormatError::StochasticBitsOutOfRange { bits: d.stochastic_bits })
    }

    match (d.nan_behavior, d.nan_checker) {
      (NanBehavior::NoNaN, SpecialPatterns::None) => (),
      (NanBehavior::NoNaN, _) => return Err(FormatError::UnexpectedNanPattern),
      (_, SpecialPatterns::None) => return Err(FormatError::MissingNanPattern),
      _ => (),
    }
    if !matches!(d.inf_behavior, InfBehavior::NonTrappingInf)
    && !matches!(d.inf_checker, SpecialPatterns::None) {
      return Err(FormatError::UnexpectedInfPattern)
    }

    let used_mask = ((1u32 << required) - 1) as u16;
    let mag_mask = ((1u32 << (d.exponent_bits + d.mantissa_bits)) - 1) as u16;
    let sign_mask = if sign_bits == 1 { 1u16 << (d.exponent_bits + d.mantissa_bits) } else { 0 };

    // All special patterns, Inf first then NaN.
    let (inf, n_inf) = d.inf_checker.patterns();
    let (nan, n_nan) = d.nan_checker.patterns();
    let specials = [inf[0], inf[1], nan[0], nan[1]];
    let is_used = [n_inf > 0, n_inf > 1, n_nan > 0, n_nan > 1];

    let mut i = 0;
    while i < 4 {
      if is_used[i] && specials[i] & !used_mask != 0 {
        return Err(FormatError::PatternOutOfRange { pattern: specials[i] })
      }
      i += 1;
    }
    let mut i = 0;
    while i < 2 {
      if is_used[i] && d.nan_checker.matches(specials[i]) {
        return Err(FormatError::OverlappingPatterns { pattern: specials[i] })
      }
      i += 1;
    }

    // For each sign, the finite magnitudes must be exactly those below the lowest special one:
    // the rounding engine assumes magnitudes `0..=max` are all finite and contiguous. The only
    // exception is a special pattern with magnitude zero and the sign bit set (negative zero).
    let mut sign = 0;
    while sign < 1 + sign_bits {
      let negative = sign == 1;
      let mut lowest = mag_mask as u32 + 1;
      let mut count = 0;
      let mut i = 0;
      while i < 4 {
        let p = specials[i];
        if is_used[i] && (p & sign_mask != 0) == negative {
          let mag = (p & mag_mask) as u32;
          if mag == 0 && !negative {
            return Err(FormatError::InteriorSpecialPattern { pattern: p })
          }
          if mag != 0 {
            if mag < lowest { lowest = mag }
            // Duplicates (e.g. the same pattern listed twice) count once.
            let mut dup = false;
            let mut j = 0;
            while j < i {
              if is_used[j] && specials[j] == p { dup = true }
              j += 1;
            }
            if !dup { count += 1 }
          }
        }
        i += 1;
      }
      if count > 0 && lowest + count != mag_mask as u32 + 1 {
        // Some finite magnitude lies above a special one.
        let pattern = lowest as u16 | if negative { sign_mask } else { 0 };
        return Err(FormatError::InteriorSpecialPattern { pattern })
      }
      let max = (lowest - 1) as u16;
      if negative { d.max_neg_mag = max } else { d.max_pos_mag = max }
      sign += 1;
    }
    if d.max_pos_mag == 0 {
      return Err(FormatError::EmptyRange)
    }

    // Every value, from the smallest subnormal to the largest finite, must be an f64 normal.
    let min_exp = 1 - d.bias - d.mantissa_bits as i32;
    let top = if d.max_pos_mag > d.max_neg_mag { d.max_pos_mag } else { d.max_neg_mag };
    let top_field = (top >> d.mantissa_bits) as i32;
    let max_exp = if top_field == 0 { 1 - d.bias } else { top_field - d.bias };
    if min_exp < -1022 || max_exp > 1023 {
      return Err(FormatError::ExponentRangeUnsupported { min_exp, max_exp })
    }

    Ok(d)
  }

  /// As [`build`](Self::build), but panics on an invalid format. Meant for `const` items, where
  /// the panic becomes a compile error.
  pub const fn validated(self) -> FormatDescriptor {
    match self.build() {
      Ok(d) => d,
      Err(FormatError::WidthOutOfRange { .. }) => panic!("Format width must be within 1..=16"),
      Err(FormatError::BitBudgetExceeded { .. }) =>
        panic!("Sign, exponent and mantissa bits do not fit in the format width"),
      Err(FormatError::ExponentRangeUnsupported { .. }) =>
        panic!("The exponent range of the format does not fit the f64 normal range"),
      Err(FormatError::EmptyRange) => panic!("The format has no positive finite value"),
      Err(FormatError::PatternOutOfRange { .. }) => panic!("A special pattern does not fit in the format"),
      Err(FormatError::OverlappingPatterns { .. }) => panic!("A pattern is both infinity and NaN"),
      Err(FormatError::InteriorSpecialPattern { .. }) =>
        panic!("A special pattern lies inside the finite range"),
      Err(FormatError::MissingNanPattern) => panic!("The NaN behavior requires a NaN pattern"),
      Err(FormatError::UnexpectedNanPattern) => panic!("NaN patterns given for a format without NaN"),
      Err(FormatError::UnexpectedInfPattern) =>
        panic!("Infinity patterns are only used with InfBehavior::NonTrappingInf"),
      Err(FormatError::StochasticBitsOutOfRange { .. }) =>
        panic!("At most 32 stochastic rounding bits are supported"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn e4m3() {
    let d = FormatDescriptor::builder(8, 4, 3, 7)
      .nan(NanBehavior::QuietNaN, SpecialPatterns::double(0x7f, 0xff))
      .build()
      .unwrap();
    assert_eq!(d.max_pos_mag, 0x7e);
    assert_eq!(d.max_neg_mag, 0x7e);
  }

  #[test]
  fn negative_zero_nan() {
    let d = FormatDescriptor::builder(8, 4, 3, 8)
      .inf(InfBehavior::NonTrappingInf, SpecialPatterns::double(0x7f, 0xff))
      .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0x80))
      .build()
      .unwrap();
    assert_eq!(d.max_pos_mag, 0x7e);
    assert_eq!(d.max_neg_mag, 0x7e);
  }

  #[test]
  fn asymmetric() {
    let d = FormatDescriptor::builder(8, 4, 3, 7)
      .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0x7f))
      .build()
      .unwrap();
    assert_eq!(d.max_pos_mag, 0x7e);
    assert_eq!(d.max_neg_mag, 0x7f);
  }

  #[test]
  fn unsigned() {
    let d = FormatDescriptor::builder(8, 5, 3, 11)
      .signedness(Signedness::Unsigned)
      .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0xff))
      .build()
      .unwrap();
    assert_eq!(d.max_pos_mag, 0xfe);
  }

  #[test]
  fn bit_budget() {
    assert_eq!(
      FormatDescriptor::builder(8, 5, 3, 15).build(),
      Err(FormatError::BitBudgetExceeded { width: 8, required: 9 }),
    );
    assert_eq!(
      FormatDescriptor::builder(17, 5, 3, 15).build(),
      Err(FormatError::WidthOutOfRange { width: 17 }),
    );
  }

  #[test]
  fn patterns() {
    assert_eq!(
      FormatDescriptor::builder(8, 4, 3, 7)
        .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0x100))
        .build(),
      Err(FormatError::PatternOutOfRange { pattern: 0x100 }),
    );
    assert_eq!(
      FormatDescriptor::builder(8, 4, 3, 7)
        .inf(InfBehavior::NonTrappingInf, SpecialPatterns::double(0x7f, 0xff))
        .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0xff))
        .build(),
      Err(FormatError::OverlappingPatterns { pattern: 0xff }),
    );
    assert_eq!(
      FormatDescriptor::builder(8, 4, 3, 7)
        .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0x40))
        .build(),
      Err(FormatError::InteriorSpecialPattern { pattern: 0x40 }),
    );
    assert_eq!(
      FormatDescriptor::builder(8, 4, 3, 7)
        .nan(NanBehavior::QuietNaN, SpecialPatterns::single(0x00))
        .build(),
      Err(FormatError::InteriorSpecialPattern { pattern: 0x00 }),
    );
  }

  #[test]
  fn behaviors() {
    assert_eq!(
      FormatDescriptor::builder(8, 4, 3, 7).nan(NanBehavior::QuietNaN, SpecialPatterns::None).build(),
      Err(FormatError::MissingNanPattern),
    );
    assert_eq!(
      FormatDescriptor::builder(8, 4, 3, 7).nan(NanBehavior::NoNaN, SpecialPatterns::single(0x7f)).build(),
      Err(FormatError::UnexpectedNanPattern),
    );
    assert_eq!(
      FormatDescriptor::builder(8, 4, 3, 7).inf(InfBehavior::Trapping, SpecialPatterns::single(0x7f)).build(),
      Err(FormatError::UnexpectedInfPattern),
    );
    assert_eq!(
      FormatDescriptor::builder(8, 4, 3, 7).stochastic_bits(40).build(),
      Err(FormatError::StochasticBitsOutOfRange { bits: 40 }),
    );
  }

  #[test]
  fn exponent_range() {
    assert!(matches!(
      FormatDescriptor::builder(16, 15, 0, 100).build(),
      Err(FormatError::ExponentRangeUnsupported { .. }),
    ));
    assert!(FormatDescriptor::builder(16, 10, 5, 511).build().is_ok());
  }
}
