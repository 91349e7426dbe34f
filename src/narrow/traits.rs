use super::*;

// The `Format` trait has no bounds of its own (the marker types do, but the compiler cannot know
// that), so `derive` would ask for `F: Clone`, `F: PartialEq`, etc. We implement explicitly.
//
// Equality and ordering are those of the decoded values, as for IEEE floats. In particular there
// is no `Eq`, `Ord` or `Hash`: NaN is not equal to itself, and +0 and -0 are equal while having
// different bit patterns.

impl<F: Format>
Clone for NarrowFloat<F> {
  #[inline]
  fn clone(&self) -> Self {
    *self
  }
}

impl<F: Format>
Copy for NarrowFloat<F> {}

impl<F: Format>
PartialEq for NarrowFloat<F> {
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    self.to_f64() == other.to_f64()
  }
}

impl<F: Format>
PartialOrd for NarrowFloat<F> {
  #[inline]
  fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
    self.to_f64().partial_cmp(&other.to_f64())
  }
}

impl<F: Format>
Default for NarrowFloat<F> {
  #[inline]
  fn default() -> Self {
    Self::ZERO
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::presets::*;

  type F = NarrowFloat<E4M3Fn>;

  #[test]
  fn ieee_comparison() {
    let nan = F::NAN.unwrap();
    assert!(nan != nan);
    assert!(!(nan < F::ONE) && !(nan > F::ONE) && !(nan == F::ONE));
    assert_eq!(F::from_bits(0x00), F::from_bits(0x80));
    assert!(F::MIN < F::ZERO && F::ZERO < F::MIN_POSITIVE_SUBNORMAL);
    assert!(F::MAX > F::ONE);
  }

  #[test]
  fn ordering_follows_values() {
    let values: Vec<F> = (0 ..= 0xff).map(F::from_bits).filter(|x| !x.is_nan()).collect();
    for a in &values {
      for b in &values {
        assert_eq!(a.partial_cmp(b), a.to_f64().partial_cmp(&b.to_f64()));
      }
    }
  }

  #[test]
  fn default() {
    assert_eq!(F::default().to_bits(), 0);
  }
}
