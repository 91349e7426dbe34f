use super::*;

/// One line of the [`const_of_u16`] function.
macro_rules! const_of_u16_line {
  ($x:ident, $t:ty) => {
    if const { B::BITS == <$t>::BITS } {
      let t = $x as $t;
      // SAFETY: `B` is sealed to `u8` and `u16`, so if the widths agree `$t` is `B` and the
      // transmute_copy is a no-op.
      return unsafe { ::core::mem::transmute_copy::<$t, B>(&t) }
    }
  }
}

/// One line of the [`const_as_u16`] function.
macro_rules! const_as_u16_line {
  ($x:ident, $t:ty) => {
    if const { B::BITS == <$t>::BITS } {
      // SAFETY: as above, `B` is `$t`.
      let t = unsafe { ::core::mem::transmute_copy::<B, $t>(&$x) };
      return t as u16
    }
  }
}

/// A `const` version of [`Sealed::of_u16`], for building constants of a generic [`Bits`] type.
///
/// ```ignore
/// # use narrowfloat::underlying::const_of_u16;
/// assert_eq!(const_of_u16::<u8>(0x1ff), 0xff_u8);
/// ```
pub const fn const_of_u16<B: Bits>(x: u16) -> B {
  const_of_u16_line!(x, u8);
  const_of_u16_line!(x, u16);
  unreachable!() // cannot be const { unreachable!() }
}

/// A `const` version of [`Sealed::as_u16`].
pub const fn const_as_u16<B: Bits>(x: B) -> u16 {
  const_as_u16_line!(x, u8);
  const_as_u16_line!(x, u16);
  unreachable!()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn narrow() {
    const VALUE: u8 = const_of_u16(0x1ab);
    assert_eq!(VALUE, 0xab);
  }

  #[test]
  fn same_width() {
    const VALUE: u16 = const_of_u16(0xdead);
    assert_eq!(VALUE, 0xdead);
  }

  #[test]
  fn widen() {
    const VALUE: u16 = const_as_u16(0xf1_u8);
    assert_eq!(VALUE, 0x00f1);
    const WIDE: u16 = const_as_u16(0x1337_u16);
    assert_eq!(WIDE, 0x1337);
  }
}
