use super::*;

use super::params::GemmParams;
use super::tiles::{run_tiles, scatter, tiles};

/// Blocked product with a compensated running sum.
///
/// For every output element, the partial dot product of each block of `tiling.k` shared
/// indices is accumulated in `Acc`. A coarse running sum of the partials is kept in `TC`, the
/// output type, and rounded at every stage; the error of each of those roundings is collected
/// in a correction term accumulated in `Acc`. The result is `coarse + correction`.
///
/// This models hardware that can only keep running sums in a narrow type: the correction
/// recovers most of what the narrow running sum drops.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the shapes do not agree; domain errors of `Acc` or `TC`. On error,
/// `c` is unchanged.
pub fn multistage_gemm_in<TA, TB, TC, Acc>(
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
  let p = Problem::new("multistage_gemm", a, b, c)?;
  let tiling = params.tiling.sanitized();
  log::debug!(
    "multistage_gemm: {}, {} stages, accumulator {}",
    p.describe(), p.k.div_ceil(tiling.k), params.accumulator_name(),
  );
  let parts = run_tiles(tiles(p.m, p.n, tiling.m, tiling.n, p.order), ctx, |t, ctx| {
    let mut out = Vec::with_capacity(t.rows * t.cols);
    for i in t.row .. t.row + t.rows {
      for j in t.col .. t.col + t.cols {
        let mut coarse = TC::ZERO;
        let mut correction = Acc::ZERO;
        for ks in p.k_blocks(tiling.k) {
          let partial = p.dot::<Acc>(i, j, ks, ctx)?.to_f64();
          let exact = coarse.to_f64() + partial;
          coarse = TC::from_f64_in(exact, ctx)?;
          correction = correction.accumulate(exact - coarse.to_f64(), 1.0, ctx)?;
        }
        out.push(coarse.to_f64() + correction.to_f64());
      }
    }
    Ok(out)
  })?;
  let product = scatter(p.m, p.n, &parts);
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`multistage_gemm_in`], with this thread's default context.
pub fn multistage_gemm<TA, TB, TC, Acc>(
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
  crate::with_thread_context(|ctx| multistage_gemm_in(a, b, c, params, ctx))
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::super::test::*;
  use super::super::params::Tiling;
  use crate::presets::*;
  use crate::NarrowFloat;

  type F = NarrowFloat<E4M3Fn>;

  fn stages(k: usize) -> GemmParams {
    GemmParams::new().with_tiling(Tiling { k, ..Tiling::default() })
  }

  #[test]
  fn correction_recovers_stalled_sum() {
    // In E4M3, 16 + 1 is a tie that rounds back to 16.
    let a = Matrix::<F>::filled(1, 8, F::ONE);
    let b = Matrix::from_vec(8, 1, crate::Layout::ColMajor, vec![16.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0])
      .unwrap()
      .convert::<F>()
      .unwrap();
    let mut c = Matrix::<F>::zeros(1, 1);
    multistage_gemm(&a, &b, &mut c, &stages(1)).unwrap();
    // Exact sum is 23, which rounds to 24 in E4M3.
    assert_eq!(c[(0, 0)].to_f64(), 24.0);

    // Without the correction, a running sum in F stops at 16: emulate it with an F accumulator
    // in the reference kernel.
    simple_gemm(&a, &b, &mut c, &GemmParams::new().with_accumulator::<F>()).unwrap();
    assert_eq!(c[(0, 0)].to_f64(), 16.0);
  }

  #[test]
  fn wide_output_is_plain_blocking() {
    let a = noise(6, 9, 3);
    let b = noise(9, 4, 4);
    let mut c0 = Matrix::<f64>::zeros(6, 4);
    let mut c1 = c0.clone();
    multistage_gemm(&a, &b, &mut c0, &stages(2)).unwrap();
    block_gemm(&a, &b, &mut c1, &stages(2)).unwrap();
    assert_close(&c0, &c1, 1e-12);
  }

  #[test]
  fn shape_checked() {
    let mut c = Matrix::<F>::zeros(1, 1);
    assert!(matches!(
      multistage_gemm(&Matrix::<F>::zeros(1, 2), &Matrix::<F>::zeros(3, 1), &mut c, &GemmParams::new()),
      Err(Error::ShapeMismatch { op: "multistage_gemm", .. }),
    ));
  }
}
