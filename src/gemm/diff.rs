use core::fmt;

use super::*;

use super::params::GemmParams;

/// A kernel that takes no narrow format parameter, for dispatch at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
  /// [`simple_gemm`].
  Simple,
  /// [`block_gemm`].
  Block,
  /// [`multi_block_gemm`].
  MultiBlock,
  /// [`multistage_gemm`].
  Multistage,
  /// [`strassen_multiply`].
  Strassen,
}

impl Kernel {
  /// Every kernel, in the order above.
  pub const ALL: [Kernel; 5] = [Self::Simple, Self::Block, Self::MultiBlock, Self::Multistage, Self::Strassen];

  /// Run this kernel on `c = alpha * (a * b) + beta * c`.
  ///
  /// # Errors
  ///
  /// Those of the selected kernel.
  pub fn run_in<TA, TB, TC, Acc>(
    self,
    a: &Matrix<TA>,
    b: &Matrix<TB>,
    c: &mut Matrix<TC>,
    params: &GemmParams<Acc>,
    ctx: &mut RoundingContext,
  ) -> Result<()>
  where
    TA: Scalar,
    TB: Scalar,
    TC: Scalar,
    Acc: Scalar,
  {
    match self {
      Self::Simple => simple_gemm_in(a, b, c, params, ctx),
      Self::Block => block_gemm_in(a, b, c, params, ctx),
      Self::MultiBlock => multi_block_gemm_in(a, b, c, params, ctx),
      Self::Multistage => multistage_gemm_in(a, b, c, params, ctx),
      Self::Strassen => strassen_multiply_in(a, b, c, params, ctx),
    }
  }

  /// As [`Kernel::run_in`], with this thread's default context.
  pub fn run<TA, TB, TC, Acc>(
    self,
    a: &Matrix<TA>,
    b: &Matrix<TB>,
    c: &mut Matrix<TC>,
    params: &GemmParams<Acc>,
  ) -> Result<()>
  where
    TA: Scalar,
    TB: Scalar,
    TC: Scalar,
    Acc: Scalar,
  {
    crate::with_thread_context(|ctx| self.run_in(a, b, c, params, ctx))
  }
}

impl fmt::Display for Kernel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Simple => "simple",
      Self::Block => "block",
      Self::MultiBlock => "multi-block",
      Self::Multistage => "multistage",
      Self::Strassen => "strassen",
    })
  }
}

/// The difference between two kernels, or two output types.
///
/// Computes `A * B` with `first`, writing into an `m × n` matrix of `T1`, and with `second` into
/// one of `T2` (both scaled by `params.alpha`; `params.beta` has no effect, since both start at
/// zero). Returns the first result minus the second, elementwise, in `f64`.
///
/// ```
/// # use narrowfloat::*;
/// # use narrowfloat::gemm::*;
/// let a = Matrix::filled(1, 4, 1.0);
/// let b = Matrix::from_vec(4, 1, Layout::ColMajor, vec![16.0, 1.0, 1.0, 1.0]).unwrap();
/// // Rounding to E4M3 at the end or on every step.
/// let d = diff_matmul::<_, _, f8e4m3fn, f8e4m3fn, _>(
///   Kernel::Simple, Kernel::Simple, &a, &b, &GemmParams::new(),
/// ).unwrap();
/// assert_eq!(d[(0, 0)], 0.0);
/// let d = diff_matmul::<_, _, f64, f8e4m3fn, _>(
///   Kernel::Simple, Kernel::Simple, &a, &b, &GemmParams::new(),
/// ).unwrap();
/// assert_eq!(d[(0, 0)], 19.0 - 20.0);
/// ```
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if `a` and `b` do not agree; otherwise those of either kernel.
pub fn diff_matmul_in<TA, TB, T1, T2, Acc>(
  first: Kernel,
  second: Kernel,
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  params: &GemmParams<Acc>,
  ctx: &mut RoundingContext,
) -> Result<Matrix<f64>>
where
  TA: Scalar,
  TB: Scalar,
  T1: Scalar,
  T2: Scalar,
  Acc: Scalar,
{
  if a.cols() != b.rows() {
    return Err(Error::ShapeMismatch { op: "diff_matmul", lhs: a.shape(), rhs: b.shape() })
  }
  let (m, n) = (a.rows(), b.cols());
  log::debug!("diff_matmul: {m}x{}x{n}, {first} against {second}", a.cols());
  let mut c1 = Matrix::<T1>::zeros(m, n);
  let mut c2 = Matrix::<T2>::zeros(m, n);
  first.run_in(a, b, &mut c1, params, ctx)?;
  second.run_in(a, b, &mut c2, params, ctx)?;
  c1.convert_in::<f64>(ctx)?.sub_in(&c2.convert_in(ctx)?, ctx)
}

/// As [`diff_matmul_in`], with this thread's default context.
pub fn diff_matmul<TA, TB, T1, T2, Acc>(
  first: Kernel,
  second: Kernel,
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  params: &GemmParams<Acc>,
) -> Result<Matrix<f64>>
where
  TA: Scalar,
  TB: Scalar,
  T1: Scalar,
  T2: Scalar,
  Acc: Scalar,
{
  crate::with_thread_context(|ctx| diff_matmul_in::<_, _, T1, T2, _>(first, second, a, b, params, ctx))
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::super::test::*;
  use super::super::params::Tiling;
  use crate::presets::*;
  use crate::NarrowFloat;

  #[test]
  fn display() {
    let names = Kernel::ALL.map(|k| k.to_string());
    assert_eq!(names, ["simple", "block", "multi-block", "multistage", "strassen"]);
  }

  #[test]
  fn kernels_agree_in_f64() {
    let a = noise(7, 9, 5);
    let b = noise(9, 6, 6);
    let params = GemmParams::new()
      .with_tiling(Tiling { m: 3, n: 2, k: 4, mr: 2, nr: 2 })
      .with_strassen_cutoff(2);
    for first in Kernel::ALL {
      for second in Kernel::ALL {
        let d = diff_matmul::<_, _, f64, f64, _>(first, second, &a, &b, &params).unwrap();
        assert_eq!(d.shape(), (7, 6));
        assert!(d.as_slice().iter().all(|x| x.abs() < 1e-12), "{first} vs {second}");
      }
    }
  }

  #[test]
  fn output_types() {
    let a: Matrix<f64> = small_ints(3, 4, 0);
    let b: Matrix<f64> = small_ints(4, 2, 1);
    // Same kernel, so the difference is the final rounding into E5M2.
    let d = diff_matmul::<_, _, f64, NarrowFloat<E5M2>, _>(Kernel::Block, Kernel::Block, &a, &b, &GemmParams::new())
      .unwrap();
    let mut wide = Matrix::<f64>::zeros(3, 2);
    simple_gemm(&a, &b, &mut wide, &GemmParams::new()).unwrap();
    let narrow = wide.convert::<NarrowFloat<E5M2>>().unwrap().convert::<f64>().unwrap();
    assert_eq!(d, wide.sub(&narrow).unwrap());
  }

  #[test]
  fn shape_checked() {
    let a = Matrix::<f64>::zeros(2, 3);
    assert_eq!(
      diff_matmul::<_, _, f64, f64, _>(Kernel::Simple, Kernel::Block, &a, &a, &GemmParams::new()),
      Err(Error::ShapeMismatch { op: "diff_matmul", lhs: (2, 3), rhs: (2, 3) }),
    );
  }
}
