//! Two level blocking, after the BLIS scheme.
//!
//! The output is cut in macro tiles of `tiling.m × tiling.n`. For each macro tile, the shared
//! dimension is walked in blocks of `tiling.k`; for each block the slice of `A` is packed into
//! panels of `mr` rows and the slice of `B` into panels of `nr` columns, zero padded at the
//! edges, so the micro kernel reads both operands contiguously. The micro kernel updates an
//! `mr × nr` block of the macro tile's accumulators, which stay in `Acc` across all the blocks
//! of the shared dimension.

use super::*;

use super::params::{GemmParams, Tiling};
use super::tiles::{Tile, run_tiles, scatter, tiles};

/// Pack rows `rows` and shared indices `ks` of `A` into panels of `mr` rows: panel after panel,
/// and within a panel index after index, `mr` values per index.
fn pack_a(p: &Problem, rows: Range<usize>, ks: Range<usize>, mr: usize, buf: &mut Vec<f64>) {
  buf.clear();
  for r0 in rows.clone().step_by(mr) {
    for l in ks.clone() {
      for i in r0 .. r0 + mr {
        buf.push(if i < rows.end { p.a(i, l) } else { 0.0 });
      }
    }
  }
}

/// Pack shared indices `ks` and columns `cols` of `B` into panels of `nr` columns.
fn pack_b(p: &Problem, ks: Range<usize>, cols: Range<usize>, nr: usize, buf: &mut Vec<f64>) {
  buf.clear();
  for c0 in cols.clone().step_by(nr) {
    for l in ks.clone() {
      for j in c0 .. c0 + nr {
        buf.push(if j < cols.end { p.b(l, j) } else { 0.0 });
      }
    }
  }
}

/// Update the accumulators of one macro tile with one block of the shared dimension.
fn macro_kernel<Acc: Scalar>(
  t: &Tile,
  kc: usize,
  tiling: &Tiling,
  packed_a: &[f64],
  packed_b: &[f64],
  acc: &mut [Acc],
  ctx: &mut RoundingContext,
) -> Result<()> {
  let (mr, nr) = (tiling.mr, tiling.nr);
  for (jp, b_panel) in packed_b.chunks(kc * nr).enumerate() {
    let j0 = jp * nr;
    let nr_valid = nr.min(t.cols - j0);
    for (ip, a_panel) in packed_a.chunks(kc * mr).enumerate() {
      let i0 = ip * mr;
      let mr_valid = mr.min(t.rows - i0);
      // Micro kernel: an mr × nr block, padding rows and columns skipped.
      for l in 0 .. kc {
        let a_col = &a_panel[l * mr .. l * mr + mr_valid];
        let b_row = &b_panel[l * nr .. l * nr + nr_valid];
        for (r, &x) in a_col.iter().enumerate() {
          let row = &mut acc[(i0 + r) * t.cols + j0 ..][.. nr_valid];
          for (slot, &y) in row.iter_mut().zip(b_row) {
            *slot = slot.accumulate(x, y, ctx)?;
          }
        }
      }
    }
  }
  Ok(())
}

pub(crate) fn multi_block_product<Acc: Scalar>(p: &Problem, tiling: Tiling, ctx: &mut RoundingContext) -> Result<Vec<f64>> {
  let tiling = tiling.sanitized();
  let parts = run_tiles(tiles(p.m, p.n, tiling.m, tiling.n, p.order), ctx, |t, ctx| {
    let mut acc = vec![Acc::ZERO; t.rows * t.cols];
    let (mut packed_a, mut packed_b) = (Vec::new(), Vec::new());
    for ks in p.k_blocks(tiling.k) {
      let kc = ks.len();
      pack_b(p, ks.clone(), t.col .. t.col + t.cols, tiling.nr, &mut packed_b);
      pack_a(p, t.row .. t.row + t.rows, ks, tiling.mr, &mut packed_a);
      macro_kernel(t, kc, &tiling, &packed_a, &packed_b, &mut acc, ctx)?;
    }
    Ok(acc.into_iter().map(Acc::to_f64).collect())
  })?;
  Ok(scatter(p.m, p.n, &parts))
}

/// Two level blocking over packed panels; see the [module docs](self). Each dot product is
/// accumulated in `Acc` in order of the shared index, as in [`simple_gemm`], so with a
/// deterministic accumulator the two kernels agree exactly.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the shapes do not agree; domain errors of `Acc` or `TC`. On error,
/// `c` is unchanged.
pub fn multi_block_gemm_in<TA, TB, TC, Acc>(
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
  let p = Problem::new("multi_block_gemm", a, b, c)?;
  log::debug!(
    "multi_block_gemm: {}, tiling {:?}, accumulator {}",
    p.describe(), params.tiling, params.accumulator_name(),
  );
  let product = multi_block_product::<Acc>(&p, params.tiling, ctx)?;
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`multi_block_gemm_in`], with this thread's default context.
pub fn multi_block_gemm<TA, TB, TC, Acc>(
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
  crate::with_thread_context(|ctx| multi_block_gemm_in(a, b, c, params, ctx))
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::super::test::*;
  use proptest::prelude::*;

  #[test]
  fn packing() {
    let a = Matrix::from_fn(3, 2, |i, j| (10 * i + j) as f64);
    let b = Matrix::from_fn(2, 3, |i, j| (10 * i + j) as f64);
    let c = Matrix::<f64>::zeros(3, 3);
    let p = Problem::new("t", &a, &b, &c).unwrap();
    let mut buf = Vec::new();
    pack_a(&p, 0 .. 3, 0 .. 2, 2, &mut buf);
    assert_eq!(buf, [0.0, 10.0, 1.0, 11.0, 20.0, 0.0, 21.0, 0.0]);
    pack_b(&p, 1 .. 2, 1 .. 3, 4, &mut buf);
    assert_eq!(buf, [11.0, 12.0, 0.0, 0.0]);
  }

  #[test]
  fn half_accumulator_matches_simple() {
    let a = noise(13, 17, 1).convert::<half::f16>().unwrap();
    let b = noise(17, 6, 2).convert::<half::f16>().unwrap();
    let params = GemmParams::new()
      .with_tiling(Tiling { m: 5, n: 4, k: 3, mr: 2, nr: 3 })
      .with_accumulator::<half::f16>();
    let mut c0 = Matrix::<f64>::zeros(13, 6);
    let mut c1 = c0.clone();
    simple_gemm(&a, &b, &mut c0, &params).unwrap();
    multi_block_gemm(&a, &b, &mut c1, &params).unwrap();
    assert_eq!(c0, c1);
  }

  proptest!{
    #![proptest_config(ProptestConfig::with_cases(crate::PROPTEST_CASES))]

    #[test]
    fn agrees_with_simple((m, k, n) in shapes(11), mr in 1usize .. 5, nr in 1usize .. 5, seed in any::<u64>()) {
      let a = noise(m, k, seed);
      let b = noise(k, n, seed ^ 1);
      let params = GemmParams::new().with_tiling(Tiling { m: 4, n: 5, k: 3, mr, nr });
      let mut c0 = Matrix::<f64>::zeros(m, n);
      let mut c1 = c0.clone();
      simple_gemm(&a, &b, &mut c0, &params).unwrap();
      multi_block_gemm(&a, &b, &mut c1, &params).unwrap();
      prop_assert_eq!(c0, c1);
    }
  }
}
