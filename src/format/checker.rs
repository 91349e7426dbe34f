/// A predicate over raw bit patterns, answering whether a pattern is reserved for a special value
/// (infinity or NaN, depending on which checker it is).
pub trait SpecialValueChecker {
  fn is_special(&self, bits: u16) -> bool;
}

/// Exactly one pattern is special.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinglePattern(pub u16);

/// Two patterns are special, typically `+x` and `-x` (e.g. `+Inf`/`-Inf`), or two NaN encodings.
/// The first one is canonical: it is what the encoder produces when it has no sign preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoublePattern(pub u16, pub u16);

impl SpecialValueChecker for SinglePattern {
  #[inline]
  fn is_special(&self, bits: u16) -> bool {
    bits == self.0
  }
}

impl SpecialValueChecker for DoublePattern {
  #[inline]
  fn is_special(&self, bits: u16) -> bool {
    bits == self.0 || bits == self.1
  }
}

/// The closed set of checkers a [`FormatDescriptor`](super::FormatDescriptor) can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialPatterns {
  /// No pattern is special.
  None,
  Single(SinglePattern),
  Double(DoublePattern),
}

impl SpecialPatterns {
  pub const fn single(pattern: u16) -> Self {
    Self::Single(SinglePattern(pattern))
  }

  pub const fn double(first: u16, second: u16) -> Self {
    Self::Double(DoublePattern(first, second))
  }

  /// `const` version of [`SpecialValueChecker::is_special`].
  #[inline]
  pub const fn matches(&self, bits: u16) -> bool {
    match *self {
      Self::None => false,
      Self::Single(SinglePattern(p)) => bits == p,
      Self::Double(DoublePattern(p, q)) => bits == p || bits == q,
    }
  }

  /// The patterns, as an array and how many of its entries are used.
  pub const fn patterns(&self) -> ([u16; 2], usize) {
    match *self {
      Self::None => ([0, 0], 0),
      Self::Single(SinglePattern(p)) => ([p, 0], 1),
      Self::Double(DoublePattern(p, q)) => ([p, q], 2),
    }
  }

  /// The first pattern, if any.
  pub const fn canonical(&self) -> Option<u16> {
    match *self {
      Self::None => None,
      Self::Single(SinglePattern(p)) | Self::Double(DoublePattern(p, _)) => Some(p),
    }
  }

  /// The first pattern whose sign bit (selected by `sign_mask`) agrees with `negative`. For an
  /// unsigned format (`sign_mask == 0`) every pattern counts as positive.
  pub const fn with_sign(&self, negative: bool, sign_mask: u16) -> Option<u16> {
    let (patterns, len) = self.patterns();
    let mut i = 0;
    while i < len {
      let p = patterns[i];
      if (p & sign_mask != 0) == negative {
        return Some(p)
      }
      i += 1;
    }
    if sign_mask == 0 && len > 0 { Some(patterns[0]) } else { None }
  }
}

impl SpecialValueChecker for SpecialPatterns {
  #[inline]
  fn is_special(&self, bits: u16) -> bool {
    self.matches(bits)
  }
}
