use super::*;

use core::fmt::{Debug, Display, LowerExp};

impl<F: Format>
Debug for NarrowFloat<F> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let bits = self.to_u16();
    f.debug_tuple("NarrowFloat")
      .field(&format_args!("0b{bits:0w$b}", w=F::DESCRIPTOR.used_bits() as usize))
      .field(&format_args!("{}", self.to_f64()))
      .finish()
  }
}

/// Formats the decoded value, as the `f64` it is equal to.
impl<F: Format>
Display for NarrowFloat<F> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    Display::fmt(&self.to_f64(), f)
  }
}

impl<F: Format>
LowerExp for NarrowFloat<F> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    LowerExp::fmt(&self.to_f64(), f)
  }
}
