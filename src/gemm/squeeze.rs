//! Squeezed products: every operand `x` is split into `hi = round_F(x)`, the part representable
//! in a narrow format `F`, and the residual `lo = x - hi`. The product is then
//! `hi_a * hi_b + lo_a * hi_b + hi_a * lo_b`, dropping only the (second order) `lo_a * lo_b`.

use super::*;

use super::block::block_product;
use super::params::GemmParams;
use super::tiles::{run_tiles, scatter, tiles};
use crate::format::Format;
use crate::NarrowFloat;

/// Split `x` into the values nearest in `F` and the residuals.
pub(crate) fn split<F: Format>(x: &[f64], ctx: &mut RoundingContext) -> Result<(Vec<f64>, Vec<f64>)> {
  let mut hi = Vec::with_capacity(x.len());
  let mut lo = Vec::with_capacity(x.len());
  for &v in x {
    let h = NarrowFloat::<F>::from_f64_in(v, ctx)?.to_f64();
    hi.push(h);
    lo.push(v - h);
  }
  Ok((hi, lo))
}

/// Squeezed product; see the [module docs](self). Each of the three partial products is a
/// [`block_gemm`] style product accumulating in `Acc`; they are summed in `f64`.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the shapes do not agree; domain errors of `F` (for instance a NaN
/// operand when `F` has no NaN), `Acc` or `TC`. On error, `c` is unchanged.
pub fn squeezing_matmul_in<F, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  c: &mut Matrix<TC>,
  params: &GemmParams<Acc>,
  ctx: &mut RoundingContext,
) -> Result<()>
where
  F: Format,
  TA: Scalar,
  TB: Scalar,
  TC: Scalar,
  Acc: Scalar,
{
  let p = Problem::new("squeezing_matmul", a, b, c)?;
  log::debug!(
    "squeezing_matmul: {}, split format {}, accumulator {}",
    p.describe(), core::any::type_name::<F>(), params.accumulator_name(),
  );
  let (hi_a, lo_a) = split::<F>(&p.a, ctx)?;
  let (hi_b, lo_b) = split::<F>(&p.b, ctx)?;
  let hh = block_product::<Acc>(&p.with_operands(hi_a.clone(), hi_b.clone()), params.tiling, ctx)?;
  let lh = block_product::<Acc>(&p.with_operands(lo_a, hi_b), params.tiling, ctx)?;
  let hl = block_product::<Acc>(&p.with_operands(hi_a, lo_b), params.tiling, ctx)?;
  let product: Vec<f64> = hh.iter().zip(&lh).zip(&hl).map(|((x, y), z)| x + y + z).collect();
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`squeezing_matmul_in`], with this thread's default context.
pub fn squeezing_matmul<F, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  c: &mut Matrix<TC>,
  params: &GemmParams<Acc>,
) -> Result<()>
where
  F: Format,
  TA: Scalar,
  TB: Scalar,
  TC: Scalar,
  Acc: Scalar,
{
  crate::with_thread_context(|ctx| squeezing_matmul_in::<F, _, _, _, _>(a, b, c, params, ctx))
}

/// How many residual blocks [`sparse_squeezing_matmul`] computed and skipped. There are two
/// residual blocks (one per operand) for every output tile and block of the shared dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SqueezeStats {
  pub computed: usize,
  pub skipped: usize,
}

impl SqueezeStats {
  pub fn total(&self) -> usize {
    self.computed + self.skipped
  }
}

impl core::ops::AddAssign for SqueezeStats {
  fn add_assign(&mut self, rhs: Self) {
    self.computed += rhs.computed;
    self.skipped += rhs.skipped;
  }
}

/// Squeezed product that skips negligible residuals.
///
/// The output is tiled as in [`block_gemm`]. For each tile and each block of `tiling.k` shared
/// indices, the residual block of `A` (rows of the tile) and of `B` (columns of the tile) is
/// skipped when the sum of its magnitudes is below `params.residual_threshold`. With a threshold
/// of `+inf` every residual is skipped, and the result is exactly that of [`block_gemm`] on the
/// operands rounded into `F`.
///
/// ```
/// # use narrowfloat::*;
/// # use narrowfloat::gemm::*;
/// let a = Matrix::from_fn(4, 4, |i, j| 1.0 + (i + j) as f64 / 100.0);
/// let mut c = Matrix::<f64>::zeros(4, 4);
/// let params = GemmParams::new().with_residual_threshold(f64::INFINITY);
/// let stats = sparse_squeezing_matmul::<presets::E4M3Fn, _, _, _, _>(&a, &a, &mut c, &params).unwrap();
/// assert_eq!(stats.computed, 0);
/// ```
///
/// # Errors
///
/// As [`squeezing_matmul_in`].
pub fn sparse_squeezing_matmul_in<F, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  c: &mut Matrix<TC>,
  params: &GemmParams<Acc>,
  ctx: &mut RoundingContext,
) -> Result<SqueezeStats>
where
  F: Format,
  TA: Scalar,
  TB: Scalar,
  TC: Scalar,
  Acc: Scalar,
{
  let p = Problem::new("sparse_squeezing_matmul", a, b, c)?;
  let tiling = params.tiling.sanitized();
  let threshold = params.residual_threshold;
  let (hi_a, lo_a) = split::<F>(&p.a, ctx)?;
  let (hi_b, lo_b) = split::<F>(&p.b, ctx)?;
  let hh = p.with_operands(hi_a.clone(), hi_b.clone());
  let lh = p.with_operands(lo_a, hi_b);
  let hl = p.with_operands(hi_a, lo_b);

  // A NaN mass is never below the threshold.
  let kept = |mass: f64| mass.partial_cmp(&threshold) != Some(core::cmp::Ordering::Less);

  let parts = run_tiles(tiles(p.m, p.n, tiling.m, tiling.n, p.order), ctx, |t, ctx| {
    let blocks: Vec<Range<usize>> = p.k_blocks(tiling.k).collect();
    let mut stats = SqueezeStats::default();
    // Which residual blocks to compute, for A and for B, per block of the shared dimension.
    let mut keep = Vec::with_capacity(blocks.len());
    for ks in &blocks {
      let mass_a: f64 = (t.row .. t.row + t.rows)
        .flat_map(|i| ks.clone().map(move |l| (i, l)))
        .map(|(i, l)| lh.a(i, l).abs())
        .sum();
      let mass_b: f64 = ks.clone()
        .flat_map(|l| (t.col .. t.col + t.cols).map(move |j| (l, j)))
        .map(|(l, j)| hl.b(l, j).abs())
        .sum();
      let flags = (kept(mass_a), kept(mass_b));
      for kept in [flags.0, flags.1] {
        if kept { stats.computed += 1 } else { stats.skipped += 1 }
      }
      keep.push(flags);
    }

    let mut out = Vec::with_capacity(t.rows * t.cols);
    for i in t.row .. t.row + t.rows {
      for j in t.col .. t.col + t.cols {
        let mut sum = 0.0;
        for (ks, &(keep_a, keep_b)) in blocks.iter().zip(&keep) {
          sum += hh.dot::<Acc>(i, j, ks.clone(), ctx)?.to_f64();
          if keep_a {
            sum += lh.dot::<Acc>(i, j, ks.clone(), ctx)?.to_f64();
          }
          if keep_b {
            sum += hl.dot::<Acc>(i, j, ks.clone(), ctx)?.to_f64();
          }
        }
        out.push(sum);
      }
    }
    Ok((out, stats))
  })?;

  let mut stats = SqueezeStats::default();
  let parts: Vec<_> = parts.into_iter().map(|(t, (buf, s))| {
    stats += s;
    (t, buf)
  }).collect();
  log::debug!(
    "sparse_squeezing_matmul: {}, threshold {threshold}, residual blocks computed {} skipped {}",
    p.describe(), stats.computed, stats.skipped,
  );
  let product = scatter(p.m, p.n, &parts);
  commit(c, &product, params.alpha, params.beta, ctx)?;
  Ok(stats)
}

/// As [`sparse_squeezing_matmul_in`], with this thread's default context.
pub fn sparse_squeezing_matmul<F, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  c: &mut Matrix<TC>,
  params: &GemmParams<Acc>,
) -> Result<SqueezeStats>
where
  F: Format,
  TA: Scalar,
  TB: Scalar,
  TC: Scalar,
  Acc: Scalar,
{
  crate::with_thread_context(|ctx| sparse_squeezing_matmul_in::<F, _, _, _, _>(a, b, c, params, ctx))
}
