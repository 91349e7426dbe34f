//! This crate provides a software implementation of *narrow* floating point formats (8, 6 and 4
//! bits wide, or anything up to 16) and of matrix multiplication kernels over them, for studying
//! how low precision arithmetic behaves in machine learning and HPC workloads.
//!
//! # Introduction
//!
//! Hardware and standards now define a zoo of tiny float formats: the OCP 8-bit formats (E4M3 and
//! E5M2), their "fnuz" variants without negative zero, the IEEE P3109 proposals, and the 6 and
//! 4-bit formats of the OCP Microscaling specification. They differ not only in how many exponent
//! and mantissa bits they have, but in whether they have infinities, how NaN is encoded, and what
//! happens on overflow.
//!
//! Here a format is a value, a [`FormatDescriptor`], that fixes all of that: bit widths, bias,
//! [rounding mode](RoundingMode) (including stochastic rounding), [overflow](InfBehavior) and
//! [NaN](NanBehavior) policies, and which bit patterns are special. Any descriptor can be bound to
//! a type with [`narrow_format!`], and a [`NarrowFloat<F>`] is then a number in that format.
//!
//! # Usage
//!
//! ```
//! # use narrowfloat::*;
//! // Use one of the presets, or define your own.
//! narrow_format! {
//!   pub E3M4: u8 = FormatDescriptor::builder(8, 3, 4, 3).validated()
//! }
//! type MyFloat = NarrowFloat<E3M4>;
//!
//! // Values are rounded into the format, according to its policies.
//! let a = f8e4m3fn::try_from_f64(448.0).unwrap();
//! let b = f8e4m3fn::try_from_f64(500.0).unwrap();  // Saturates
//! assert_eq!(a, b);
//! assert_eq!(MyFloat::try_from_f64(1.03).unwrap().to_f64(), 1.0);
//!
//! // Arithmetic decodes, computes in f64, and rounds back.
//! let c = f8e5m2::ONE + f8e5m2::try_from_f64(0.1).unwrap();
//! assert_eq!(c.to_f64(), 1.0);
//! ```
//!
//! Matrices of any element type (narrow or native) are multiplied by the kernels in [`gemm`],
//! which differ in how partial sums are grouped and accumulated:
//!
//! ```
//! # use narrowfloat::*;
//! # use narrowfloat::gemm::*;
//! let a = Matrix::<f8e4m3fn>::identity(2);
//! let b = Matrix::from_fn(2, 2, |i, j| f8e4m3fn::try_from_f64((2 * i + j + 1) as f64).unwrap());
//! let mut c = Matrix::<f8e4m3fn>::zeros(2, 2);
//! strassen_multiply(&a, &b, &mut c, &GemmParams::new().with_accumulator::<f32>()).unwrap();
//! assert_eq!(c, b);
//! ```
//!
//! # Randomness and flags
//!
//! Stochastic rounding draws from a [`RoundingContext`], which also collects IEEE-style
//! [exception flags](ExceptionFlags). Every rounding operation has an `*_in` form taking a context
//! explicitly, and a plain form using a thread-local one (see [`set_seed`] and
//! [`exception_flags`]). Results are reproducible given a seed, also under the `parallel`
//! feature.
//!
//! This crate includes benchmarks; run them with `cargo bench -F bench`.

/// Format descriptors, the rounding engine, and rounding contexts.
mod format;

/// Storage integers.
mod underlying;

/// The number type.
mod narrow;

/// Errors.
mod error;

/// The element trait shared by narrow and native floats.
mod scalar;

/// Matrices and vectors.
mod matrix;

/// SIMD extension detection.
mod arch;

pub mod gemm;

pub use format::{
  Format, FormatDescriptor, FormatBuilder, FormatError,
  Signedness, RoundingMode, InfBehavior, NanBehavior, UnsignedBehavior,
  SpecialValueChecker, SinglePattern, DoublePattern, SpecialPatterns,
  RoundingContext, ExceptionFlags,
  with_thread_context, set_seed, exception_flags, clear_exception_flags,
};
pub use format::presets;
pub use narrow::NarrowFloat;
pub use narrow::convert::{RoundFrom, RoundInto};
pub use underlying::Bits;
pub use error::{Error, Result};
pub use scalar::Scalar;
pub use matrix::{Matrix, MatrixView, Lane, Vector, Layout, MxLayout, PrintConfig, print_matrix};
pub use arch::ArchExtension;

/// OCP 8-bit float, 4 exponent bits, no infinities, a single NaN magnitude.
#[allow(non_camel_case_types)]
pub type f8e4m3fn = NarrowFloat<presets::E4M3Fn>;

/// 8-bit float, 4 exponent bits, no infinities, no negative zero.
#[allow(non_camel_case_types)]
pub type f8e4m3fnuz = NarrowFloat<presets::E4M3Fnuz>;

/// As [`f8e4m3fnuz`], with exponent bias 11.
#[allow(non_camel_case_types)]
pub type f8e4m3b11fnuz = NarrowFloat<presets::E4M3B11Fnuz>;

/// OCP 8-bit float, 5 exponent bits, IEEE-like.
#[allow(non_camel_case_types)]
pub type f8e5m2 = NarrowFloat<presets::E5M2>;

/// 8-bit float, 5 exponent bits, no infinities, no negative zero.
#[allow(non_camel_case_types)]
pub type f8e5m2fnuz = NarrowFloat<presets::E5M2Fnuz>;

/// OCP MX 6-bit float, 3 exponent bits.
#[allow(non_camel_case_types)]
pub type f6e3m2 = NarrowFloat<presets::Float6E3M2>;

/// OCP MX 6-bit float, 2 exponent bits.
#[allow(non_camel_case_types)]
pub type f6e2m3 = NarrowFloat<presets::Float6E2M3>;

/// OCP MX 4-bit float, 2 exponent bits.
#[allow(non_camel_case_types)]
pub type f4e2m1 = NarrowFloat<presets::Float4E2M1>;

/// Re-export some internals for benchmarking purposes, only on `feature = "bench"`.
#[cfg(feature = "bench")]
pub mod bench;

#[cfg(test)]
const PROPTEST_CASES: u32 = if cfg!(debug_assertions) {0x400} else {0x4000};
