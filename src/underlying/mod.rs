//! The machine integer types that back a [`NarrowFloat`](crate::NarrowFloat). These are hidden
//! from the end-user, which only sees the sealed [`Bits`] trait, implemented for `u8` and `u16`.
//!
//! All format logic works on `u16` bit patterns; the backing type only decides how much memory
//! each element takes up. An 8-bit format stored in a `u8` makes a `Matrix` of it half the size.

/// The trait for the underlying machine integer types that can hold the bit pattern of a narrow
/// float (only satisfied by `u8` and `u16`).
///
/// This is a *sealed* type.
pub trait Bits: Sealed {}

/// Actual operations implemented here.
pub trait Sealed:
  core::fmt::Debug + core::fmt::Binary +
  Copy + Clone +
  Eq + Ord +
  core::hash::Hash + Default +
  Send + Sync + 'static
{
  const BITS: u32;

  /// Widen to the `u16` working representation.
  fn as_u16(self) -> u16;

  /// Narrow from the `u16` working representation, dropping bits above [`Self::BITS`].
  fn of_u16(x: u16) -> Self;
}

impl Sealed for u8 {
  const BITS: u32 = u8::BITS;

  #[inline]
  fn as_u16(self) -> u16 { self as u16 }

  #[inline]
  fn of_u16(x: u16) -> Self { x as u8 }
}

impl Bits for u8 {}

impl Sealed for u16 {
  const BITS: u32 = u16::BITS;

  #[inline]
  fn as_u16(self) -> u16 { self }

  #[inline]
  fn of_u16(x: u16) -> Self { x }
}

impl Bits for u16 {}

mod const_as;
pub use const_as::{const_of_u16, const_as_u16};
