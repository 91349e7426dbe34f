use super::*;

use super::params::GemmParams;

/// The reference kernel: a triple loop, each dot product accumulated in `Acc` in order of the
/// shared index. Ignores the tiling.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the shapes do not agree; domain errors of `Acc` or `TC`. On error,
/// `c` is unchanged.
pub fn simple_gemm_in<TA, TB, TC, Acc>(
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
  let p = Problem::new("simple_gemm", a, b, c)?;
  log::debug!("simple_gemm: {}, accumulator {}", p.describe(), params.accumulator_name());
  let mut product = Vec::with_capacity(p.m * p.n);
  for i in 0 .. p.m {
    for j in 0 .. p.n {
      product.push(p.dot::<Acc>(i, j, 0 .. p.k, ctx)?.to_f64());
    }
  }
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`simple_gemm_in`], with this thread's default context.
pub fn simple_gemm<TA, TB, TC, Acc>(
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
  crate::with_thread_context(|ctx| simple_gemm_in(a, b, c, params, ctx))
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::super::test::*;
  use crate::presets::*;
  use crate::NarrowFloat;

  #[test]
  fn known_product() {
    let a = Matrix::from_vec(2, 3, crate::Layout::RowMajor, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let b = Matrix::from_vec(3, 2, crate::Layout::ColMajor, vec![7.0, 9.0, 11.0, 8.0, 10.0, 12.0]).unwrap();
    let mut c = Matrix::filled(2, 2, 1.0);
    simple_gemm(&a, &b, &mut c, &GemmParams::new().with_alpha(0.5).with_beta(2.0)).unwrap();
    // A * B = [[58, 64], [139, 154]]
    assert_eq!(c, Matrix::from_vec(2, 2, crate::Layout::RowMajor, vec![31.0, 34.0, 71.5, 79.0]).unwrap());
  }

  #[test]
  fn narrow_accumulator() {
    // 2048 + 1 is a tie in f16, rounding back to 2048 at every step.
    let a = Matrix::filled(1, 4, 1.0);
    let b = Matrix::from_vec(4, 1, crate::Layout::ColMajor, vec![2048.0, 1.0, 1.0, 1.0]).unwrap();
    let mut c = Matrix::<f64>::zeros(1, 1);
    let params = GemmParams::new();
    simple_gemm(&a, &b, &mut c, &params).unwrap();
    assert_eq!(c[(0, 0)], 2051.0);
    let mut ctx = RoundingContext::seeded(0);
    simple_gemm_in(&a, &b, &mut c, &params.with_accumulator::<half::f16>(), &mut ctx).unwrap();
    assert_eq!(c[(0, 0)], 2048.0);

    // The same stall in a narrow accumulator, where it raises INEXACT.
    let b = Matrix::from_vec(4, 1, crate::Layout::ColMajor, vec![4.0, 1.0, 1.0, 1.0]).unwrap();
    let acc = params.with_accumulator::<NarrowFloat<Float4E2M1>>();
    simple_gemm_in(&a, &b, &mut c, &acc, &mut ctx).unwrap();
    assert_eq!(c[(0, 0)], 4.0);
    assert!(ctx.flags().contains(crate::ExceptionFlags::INEXACT));
  }

  #[test]
  fn empty_shapes() {
    let params = GemmParams::new().with_beta(3.0);
    // k = 0: the product is zero, so C becomes beta * C.
    let mut c = Matrix::filled(2, 2, 1.0);
    simple_gemm(&Matrix::<f64>::zeros(2, 0), &Matrix::<f64>::zeros(0, 2), &mut c, &params).unwrap();
    assert_eq!(c, Matrix::filled(2, 2, 3.0));
    let mut c = Matrix::<f64>::zeros(0, 2);
    simple_gemm(&Matrix::<f64>::zeros(0, 3), &noise(3, 2, 0), &mut c, &params).unwrap();
    assert_eq!(c.shape(), (0, 2));
  }
}
