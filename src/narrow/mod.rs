//! This module and its submodules contain [`NarrowFloat`], a number stored as the bit pattern of
//! a narrow format and computed with as an `f64`.
//!
//! The semantics of every operation is *decode, compute, round*: operands are decoded exactly to
//! `f64`, the operation is carried out natively, and the result goes through the rounding engine
//! of the format ([`FormatDescriptor::round_and_encode`]). This is not an emulation of narrow
//! hardware arithmetic, where intermediate results might be rounded differently.
//!
//! Every operation that rounds comes in two flavours: one taking an explicit
//! [`RoundingContext`] (named `*_in`), and one using this thread's default context (see
//! [`with_thread_context`](crate::with_thread_context)).

use core::marker::PhantomData;

use crate::format::{Format, FormatDescriptor, RoundingContext, ExceptionFlags, NanBehavior};
use crate::underlying::{Sealed, const_of_u16, const_as_u16};
use crate::{Error, Result};

/// A narrow floating point number in format `F`, stored in `F::Bits` (a `u8` or a `u16`).
///
/// Examples:
///
/// ```
/// # use narrowfloat::*;
/// type Foo = NarrowFloat<presets::E4M3Fn>;  // OCP 8-bit, 4 exponent bits
/// type Bar = NarrowFloat<presets::Float8Ieee<3>>;  // P3109 8-bit, precision 3
///
/// let x = Foo::try_from_f64(1.3).unwrap();
/// assert_eq!(x.to_f64(), 1.25);
/// assert_eq!(Bar::INFINITY.unwrap().to_f64(), f64::INFINITY);
/// ```
///
/// Equality and ordering compare decoded values, as for IEEE floats: `+0 == -0`, and NaN is
/// unordered with everything, itself included. Compare [`to_bits`](Self::to_bits) for identity.
pub struct NarrowFloat<F: Format>(F::Bits, PhantomData<F>);

/// Basics
mod basics;

/// Constants (zero, one, max, min_positive, etc)
mod consts;

/// Manual impls of standard traits, with bounds on `F` rather than on `F::Bits`.
mod traits;

/// Debug and Display.
mod fmt;

/// Conversions to and from native floats, and between formats.
pub(crate) mod convert;

/// Arithmetic operators.
mod ops;

/// Elementary functions (sqrt, floor, log2, etc).
mod math;
