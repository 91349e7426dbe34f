//! Matrix multiplication kernels over narrow (and native) element types.
//!
//! Every kernel computes `C = alpha * (A * B) + beta * C` for `A: m × k`, `B: k × n` and
//! `C: m × n`, with elements of any [`Scalar`] type. They differ in how the products are
//! organised, and so in how rounding error accumulates:
//!
//!   - [`simple_gemm`]: the reference triple loop.
//!   - [`block_gemm`]: output tiles, with the shared dimension cut in blocks whose partial sums
//!     are accumulated separately.
//!   - [`multi_block_gemm`]: two level (macro and micro tile) blocking over packed panels.
//!   - [`multistage_gemm`]: a running sum rounded to the output type at every block, plus a
//!     correction term collecting what those roundings lost.
//!   - [`strassen_multiply`] and [`squeezing_strassen`]: Strassen's seven-product recursion.
//!   - [`squeezing_matmul`] and [`sparse_squeezing_matmul`]: operands split into a part that is
//!     representable in a narrow format and a residual.
//!   - [`scaled_matmul`]: operands scaled per row / column into a narrow format's range.
//!   - [`fbfmatmul`] and [`fbfmatmul_fp16`]: operands in two different narrow formats.
//!   - [`diff_matmul`]: the elementwise difference between two kernels.
//!
//! How partial sums are accumulated is set by [`GemmParams<Acc>`]: every step of a dot product is
//! rounded into `Acc`. The result is rounded once into the element type of `C`.
//!
//! Elements are decoded to `f64` once, up front. Shapes are checked before anything is computed,
//! and `C` is only overwritten after the whole computation has succeeded: on error it is left
//! untouched. When `beta` is zero the old contents of `C` are ignored, even if NaN.
//!
//! Each kernel comes in two forms, like the arithmetic of [`NarrowFloat`](crate::NarrowFloat):
//! `*_in` takes an explicit [`RoundingContext`], the other uses this thread's default one.
//!
//! ```
//! # use narrowfloat::*;
//! # use narrowfloat::gemm::*;
//! let a = Matrix::<f8e4m3fn>::identity(2);
//! let b = Matrix::from_fn(2, 2, |i, j| f8e4m3fn::try_from_f64((2 * i + j + 1) as f64).unwrap());
//! let mut c = Matrix::<f8e4m3fn>::zeros(2, 2);
//! block_gemm(&a, &b, &mut c, &GemmParams::new()).unwrap();
//! assert_eq!(c, b);
//! ```

use core::ops::Range;

use crate::matrix::{Matrix, MxLayout};
use crate::scalar::Scalar;
use crate::{Error, Result, RoundingContext};

/// Tiling and accumulator configuration.
mod params;

/// Tile enumeration and the (optionally parallel) tile runner.
mod tiles;

/// The reference kernel.
mod simple;

/// Single level blocking.
mod block;

/// Two level blocking over packed panels.
mod multi_block;

/// Blocking with a compensated running sum.
mod multistage;

/// Strassen recursion, plain and squeezing.
mod strassen;

/// Split operands into narrow part and residual.
mod squeeze;

/// Per-row and per-column scaling.
mod scaled;

/// Mixed-format operands with a fixed accumulator.
mod fbf;

/// Kernel selection and comparison.
mod diff;

pub use params::{GemmParams, Tiling};
pub use simple::{simple_gemm, simple_gemm_in};
pub use block::{block_gemm, block_gemm_in};
pub use multi_block::{multi_block_gemm, multi_block_gemm_in};
pub use multistage::{multistage_gemm, multistage_gemm_in};
pub use strassen::{strassen_multiply, strassen_multiply_in, squeezing_strassen, squeezing_strassen_in};
pub use squeeze::{
  squeezing_matmul,
  squeezing_matmul_in,
  sparse_squeezing_matmul,
  sparse_squeezing_matmul_in,
  SqueezeStats,
};
pub use scaled::{scaled_matmul, scaled_matmul_in, row_scales, col_scales};
pub use fbf::{fbfmatmul, fbfmatmul_in, fbfmatmul_fp16, fbfmatmul_fp16_in};
pub use diff::{Kernel, diff_matmul, diff_matmul_in};

/// The operands of a product, decoded to `f64` in row major order.
#[derive(Debug, Clone)]
pub(crate) struct Problem {
  pub m: usize,
  pub k: usize,
  pub n: usize,
  pub a: Vec<f64>,
  pub b: Vec<f64>,
  /// Tile order, taken from `A`.
  pub order: MxLayout,
}

impl Problem {
  /// Check that `a * b` can be stored in `c`, and decode the operands.
  pub fn new<TA: Scalar, TB: Scalar, TC>(
    op: &'static str,
    a: &Matrix<TA>,
    b: &Matrix<TB>,
    c: &Matrix<TC>,
  ) -> Result<Self> {
    if a.cols() != b.rows() {
      return Err(Error::ShapeMismatch { op, lhs: a.shape(), rhs: b.shape() })
    }
    if c.shape() != (a.rows(), b.cols()) {
      return Err(Error::ShapeMismatch { op, lhs: (a.rows(), b.cols()), rhs: c.shape() })
    }
    Ok(Self {
      m: a.rows(),
      k: a.cols(),
      n: b.cols(),
      a: a.to_row_major_f64(),
      b: b.to_row_major_f64(),
      order: a.partition(),
    })
  }

  /// The same shape and order, with other operand values.
  pub fn with_operands(&self, a: Vec<f64>, b: Vec<f64>) -> Self {
    Self { a, b, ..*self }
  }

  #[inline]
  pub fn a(&self, i: usize, l: usize) -> f64 {
    self.a[i * self.k + l]
  }

  #[inline]
  pub fn b(&self, l: usize, j: usize) -> f64 {
    self.b[l * self.n + j]
  }

  /// `sum(a[i, l] * b[l, j] for l in ks)`, accumulated in `Acc`.
  #[inline]
  pub fn dot<Acc: Scalar>(&self, i: usize, j: usize, ks: Range<usize>, ctx: &mut RoundingContext) -> Result<Acc> {
    let mut acc = Acc::ZERO;
    for l in ks {
      acc = acc.accumulate(self.a(i, l), self.b(l, j), ctx)?;
    }
    Ok(acc)
  }

  /// The blocks of the shared dimension, `step` long (the last one may be shorter).
  pub fn k_blocks(&self, step: usize) -> impl Iterator<Item = Range<usize>> + use<> {
    let (k, step) = (self.k, step.max(1));
    (0 .. k).step_by(step).map(move |l| l .. (l + step).min(k))
  }

  fn describe(&self) -> String {
    format!("{}x{} * {}x{}", self.m, self.k, self.k, self.n)
  }
}

/// Overwrite `c` with `alpha * product + beta * c`, rounded into `TC`. `product` is row major.
/// If any element fails to round, `c` is unchanged.
pub(crate) fn commit<TC: Scalar>(
  c: &mut Matrix<TC>,
  product: &[f64],
  alpha: f64,
  beta: f64,
  ctx: &mut RoundingContext,
) -> Result<()> {
  let (m, n) = c.shape();
  debug_assert_eq!(product.len(), m * n);
  let updated = Matrix::try_from_fn_with_layout(m, n, c.layout(), |i, j| {
    let p = alpha * product[i * n + j];
    let value = if beta == 0.0 { p } else { p + beta * c[(i, j)].to_f64() };
    TC::from_f64_in(value, ctx)
  })?;
  *c = updated.with_partition(c.partition());
  Ok(())
}

#[cfg(test)]
pub(crate) mod test {
  //! Operands shared by the kernel tests.

  use super::*;
  use proptest::prelude::*;

  /// A matrix of small integers (and halves), exactly representable in every 8-bit preset.
  pub fn small_ints<T: Scalar>(rows: usize, cols: usize, seed: usize) -> Matrix<T> {
    Matrix::from_fn(rows, cols, |i, j| {
      let v = ((i * 7 + j * 3 + seed) % 9) as f64 - 4.0;
      T::from_f64(v / 2.0).unwrap_or(T::ZERO)
    })
  }

  /// Pseudo-random `f64` values in `[-2, 2)`.
  pub fn noise(rows: usize, cols: usize, seed: u64) -> Matrix<f64> {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Matrix::from_fn(rows, cols, |_, _| rng.gen_range(-2.0 .. 2.0))
  }

  /// Shapes `(m, k, n)` up to `max` in each dimension, including empty ones.
  pub fn shapes(max: usize) -> impl Strategy<Value = (usize, usize, usize)> {
    (0 ..= max, 0 ..= max, 0 ..= max)
  }

  /// Assert two matrices agree to within `epsilon` relative (or absolute, near zero).
  pub fn assert_close(a: &Matrix<f64>, b: &Matrix<f64>, epsilon: f64) {
    assert_eq!(a.shape(), b.shape());
    for i in 0 .. a.rows() {
      for j in 0 .. a.cols() {
        approx::assert_relative_eq!(a[(i, j)], b[(i, j)], epsilon = epsilon, max_relative = epsilon);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::test::*;
  use crate::presets::*;
  use crate::NarrowFloat;

  type F8 = NarrowFloat<E4M3Fn>;

  #[test]
  fn shape_errors() {
    let a = Matrix::<f64>::zeros(2, 3);
    let b = Matrix::<f64>::zeros(4, 2);
    let mut c = Matrix::<f64>::zeros(2, 2);
    assert_eq!(
      Problem::new("gemm", &a, &b, &c).unwrap_err(),
      Error::ShapeMismatch { op: "gemm", lhs: (2, 3), rhs: (4, 2) },
    );
    let b = Matrix::<f64>::zeros(3, 5);
    assert_eq!(
      simple_gemm(&a, &b, &mut c, &GemmParams::new()),
      Err(Error::ShapeMismatch { op: "simple_gemm", lhs: (2, 5), rhs: (2, 2) }),
    );
  }

  #[test]
  fn commit_is_all_or_nothing() {
    let mut ctx = RoundingContext::seeded(0);
    let mut c = Matrix::<NarrowFloat<Float4E2M1>>::zeros(1, 2);
    let before = c.clone();
    assert_eq!(commit(&mut c, &[1.0, f64::NAN], 1.0, 0.0, &mut ctx), Err(Error::NanNotRepresentable));
    assert_eq!(c, before);
    commit(&mut c, &[1.0, 3.0], 2.0, 0.0, &mut ctx).unwrap();
    assert_eq!(c.as_slice().iter().map(|x| x.to_f64()).collect::<Vec<_>>(), [2.0, 6.0]);
  }

  #[test]
  fn beta_zero_ignores_nan() {
    let mut ctx = RoundingContext::seeded(0);
    let mut c = Matrix::filled(2, 1, f64::NAN).with_partition(MxLayout::ByRow);
    commit(&mut c, &[1.0, 2.0], 1.0, 0.0, &mut ctx).unwrap();
    assert_eq!(c.as_slice(), [1.0, 2.0]);
    assert_eq!(c.partition(), MxLayout::ByRow);
    commit(&mut c, &[1.0, 2.0], 1.0, 0.5, &mut ctx).unwrap();
    assert_eq!(c.as_slice(), [1.5, 3.0]);
  }

  #[test]
  fn identity_scenario() {
    let i = Matrix::<F8>::identity(2);
    let b: Matrix<F8> = small_ints(2, 2, 1);
    let params = GemmParams::new();
    for kernel in Kernel::ALL {
      let mut c = Matrix::<F8>::zeros(2, 2);
      kernel.run(&i, &b, &mut c, &params).unwrap();
      assert_eq!(c, b, "{kernel}");
    }
    let b = Matrix::from_fn(2, 2, |i, j| F8::try_from_f64([[1.0, 2.0], [3.0, 4.0]][i][j]).unwrap());
    let mut c = Matrix::<F8>::zeros(2, 2);
    squeezing_matmul::<E4M3Fn, _, _, _, _>(&i, &b, &mut c, &params).unwrap();
    assert_eq!(c, b);
  }

  #[test]
  fn decoded_operands() {
    let a = Matrix::from_fn_with_layout(2, 3, crate::Layout::ColMajor, |i, j| (i * 3 + j) as f64);
    let b = Matrix::<f64>::zeros(3, 1);
    let c = Matrix::<f64>::zeros(2, 1);
    let p = Problem::new("t", &a, &b, &c).unwrap();
    assert_eq!(p.a, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(p.a(1, 2), 5.0);
    assert_eq!(p.k_blocks(2).collect::<Vec<_>>(), [0 .. 2, 2 .. 3]);
  }
}
