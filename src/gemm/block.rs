use super::*;

use super::params::{GemmParams, Tiling};
use super::tiles::{run_tiles, scatter, tiles};

/// `A * B` by output tiles of `tiling.m × tiling.n`, in the order of `p.order`. Within a tile,
/// the shared dimension is cut in blocks of `tiling.k`; each block's partial dot product is
/// accumulated in `Acc`, and the partials are summed in `f64`. Row major result.
pub(crate) fn block_product<Acc: Scalar>(p: &Problem, tiling: Tiling, ctx: &mut RoundingContext) -> Result<Vec<f64>> {
  let tiling = tiling.sanitized();
  let parts = run_tiles(tiles(p.m, p.n, tiling.m, tiling.n, p.order), ctx, |t, ctx| {
    let mut out = Vec::with_capacity(t.rows * t.cols);
    for i in t.row .. t.row + t.rows {
      for j in t.col .. t.col + t.cols {
        let mut sum = 0.0;
        for ks in p.k_blocks(tiling.k) {
          sum += p.dot::<Acc>(i, j, ks, ctx)?.to_f64();
        }
        out.push(sum);
      }
    }
    Ok(out)
  })?;
  Ok(scatter(p.m, p.n, &parts))
}

/// Single level blocking: see [`block_product`]. Tiles are walked in the order given by
/// `a.partition()`.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the shapes do not agree; domain errors of `Acc` or `TC`. On error,
/// `c` is unchanged.
pub fn block_gemm_in<TA, TB, TC, Acc>(
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
  let p = Problem::new("block_gemm", a, b, c)?;
  log::debug!(
    "block_gemm: {}, tiling {:?}, order {:?}, accumulator {}",
    p.describe(), params.tiling, p.order, params.accumulator_name(),
  );
  let product = block_product::<Acc>(&p, params.tiling, ctx)?;
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`block_gemm_in`], with this thread's default context.
pub fn block_gemm<TA, TB, TC, Acc>(
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
  crate::with_thread_context(|ctx| block_gemm_in(a, b, c, params, ctx))
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::super::test::*;
  use crate::presets::*;
  use crate::NarrowFloat;
  use proptest::prelude::*;

  fn small_tiling() -> Tiling {
    Tiling { m: 3, n: 2, k: 4, mr: 2, nr: 2 }
  }

  #[test]
  fn partials_are_accumulated_separately() {
    // With k-blocks of 1, every partial is a single (exact) product, so an E2M1 accumulator
    // loses nothing that f64 summation of the partials would not.
    let a = Matrix::filled(1, 4, 1.0);
    let b = Matrix::from_vec(4, 1, crate::Layout::ColMajor, vec![4.0, 1.0, 1.0, 1.0]).unwrap();
    let params = GemmParams::new()
      .with_tiling(Tiling { k: 1, ..small_tiling() })
      .with_accumulator::<NarrowFloat<Float4E2M1>>();
    let mut c = Matrix::<f64>::zeros(1, 1);
    block_gemm(&a, &b, &mut c, &params).unwrap();
    assert_eq!(c[(0, 0)], 7.0);
    // With one block, it stalls like the reference kernel.
    block_gemm(&a, &b, &mut c, &params.with_tiling(small_tiling())).unwrap();
    assert_eq!(c[(0, 0)], 4.0);
  }

  #[test]
  fn narrow_output() {
    type F = NarrowFloat<E4M3Fn>;
    let a: Matrix<F> = small_ints(5, 7, 0);
    let b: Matrix<F> = small_ints(7, 3, 1);
    let mut expected = Matrix::<F>::zeros(5, 3);
    simple_gemm(&a, &b, &mut expected, &GemmParams::new()).unwrap();
    for order in [MxLayout::ByRow, MxLayout::ByColumn, MxLayout::ByBlock] {
      let mut c = Matrix::<F>::zeros(5, 3);
      let a = a.clone().with_partition(order);
      block_gemm(&a, &b, &mut c, &GemmParams::new().with_tiling(small_tiling())).unwrap();
      // All partial sums are small integers, so every summation order is exact.
      assert_eq!(c, expected);
    }
  }

  #[test]
  fn error_leaves_output() {
    type N = NarrowFloat<Float4E2M1>;
    let a = Matrix::filled(2, 2, f64::NAN);
    let mut c = Matrix::<N>::identity(2);
    assert_eq!(block_gemm(&a, &a, &mut c, &GemmParams::new()), Err(Error::NanNotRepresentable));
    assert_eq!(c, Matrix::identity(2));
  }

  proptest!{
    #![proptest_config(ProptestConfig::with_cases(crate::PROPTEST_CASES))]

    #[test]
    fn agrees_with_simple((m, k, n) in shapes(9), seed in any::<u64>()) {
      let a = noise(m, k, seed);
      let b = noise(k, n, seed ^ 1);
      let mut c0 = noise(m, n, seed ^ 2);
      let mut c1 = c0.clone();
      let params = GemmParams::new().with_alpha(1.5).with_beta(-0.5).with_tiling(small_tiling());
      simple_gemm(&a, &b, &mut c0, &params).unwrap();
      block_gemm(&a, &b, &mut c1, &params).unwrap();
      assert_close(&c0, &c1, 1e-12);
    }
  }
}
