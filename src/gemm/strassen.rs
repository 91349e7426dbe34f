//! Strassen's algorithm: seven half-size products instead of eight.
//!
//! Operands are zero padded to a square of side `cutoff * 2^L`, the smallest such side that
//! holds all of `m`, `k` and `n`. The recursion halves the side until it reaches the cutoff,
//! where products are computed by the [`block_gemm`] kernel. Every sum formed along the way
//! (of operand quadrants before a product, and of products after) is rounded through `Acc`.
//! The padding is cut off before the result is committed. Problems that already fit in the
//! cutoff are handed to the base kernel unpadded.

use super::*;

use super::block::block_product;
use super::params::{GemmParams, Tiling};
use super::squeeze::split;
use crate::format::Format;

/// What differs between the plain and the squeezing recursion: the form operands take, how
/// they are combined, and the products at the leaves.
trait Scheme {
  type Operand;

  /// Lift a (padded, row major, square) matrix.
  fn operand(&self, x: Vec<f64>, ctx: &mut RoundingContext) -> Result<Self::Operand>;

  /// Quadrant `(qi, qj)` of a `side × side` operand.
  fn quadrant(&self, x: &Self::Operand, side: usize, qi: usize, qj: usize) -> Self::Operand;

  /// `x + sign * y`.
  fn combine(&self, x: &Self::Operand, y: &Self::Operand, sign: f64, ctx: &mut RoundingContext) -> Result<Self::Operand>;

  /// The `m × n` product of an `m × k` and a `k × n` operand.
  fn leaf(&self, a: &Self::Operand, b: &Self::Operand, m: usize, k: usize, n: usize, ctx: &mut RoundingContext) -> Result<Vec<f64>>;
}

fn quadrant(x: &[f64], side: usize, qi: usize, qj: usize) -> Vec<f64> {
  let h = side / 2;
  let mut out = Vec::with_capacity(h * h);
  for i in qi * h .. (qi + 1) * h {
    out.extend_from_slice(&x[i * side + qj * h ..][.. h]);
  }
  out
}

/// `x + sign * y`, each sum rounded through `Acc`.
fn sum_in<Acc: Scalar>(x: &[f64], y: &[f64], sign: f64, ctx: &mut RoundingContext) -> Result<Vec<f64>> {
  x.iter().zip(y).map(|(&x, &y)| Ok(Acc::from_f64_in(x + sign * y, ctx)?.to_f64())).collect()
}

fn leaf_product<Acc: Scalar>(a: Vec<f64>, b: Vec<f64>, m: usize, k: usize, n: usize, tiling: Tiling, ctx: &mut RoundingContext) -> Result<Vec<f64>> {
  let p = Problem { m, k, n, a, b, order: MxLayout::ByRow };
  block_product::<Acc>(&p, tiling, ctx)
}

struct Plain<Acc> {
  tiling: Tiling,
  accumulator: core::marker::PhantomData<Acc>,
}

impl<Acc: Scalar> Scheme for Plain<Acc> {
  type Operand = Vec<f64>;

  fn operand(&self, x: Vec<f64>, _: &mut RoundingContext) -> Result<Vec<f64>> {
    Ok(x)
  }

  fn quadrant(&self, x: &Vec<f64>, side: usize, qi: usize, qj: usize) -> Vec<f64> {
    quadrant(x, side, qi, qj)
  }

  fn combine(&self, x: &Vec<f64>, y: &Vec<f64>, sign: f64, ctx: &mut RoundingContext) -> Result<Vec<f64>> {
    sum_in::<Acc>(x, y, sign, ctx)
  }

  fn leaf(&self, a: &Vec<f64>, b: &Vec<f64>, m: usize, k: usize, n: usize, ctx: &mut RoundingContext) -> Result<Vec<f64>> {
    leaf_product::<Acc>(a.clone(), b.clone(), m, k, n, self.tiling, ctx)
  }
}

/// An operand held as a part representable in `F` and a residual in `Acc`.
struct Split {
  hi: Vec<f64>,
  lo: Vec<f64>,
}

struct Squeezing<F, Acc> {
  tiling: Tiling,
  types: core::marker::PhantomData<(F, Acc)>,
}

impl<F: Format, Acc: Scalar> Squeezing<F, Acc> {
  fn split(&self, x: &[f64], ctx: &mut RoundingContext) -> Result<Split> {
    let (hi, lo) = split::<F>(x, ctx)?;
    let lo = lo.into_iter().map(|v| Ok(Acc::from_f64_in(v, ctx)?.to_f64())).collect::<Result<_>>()?;
    Ok(Split { hi, lo })
  }
}

impl<F: Format, Acc: Scalar> Scheme for Squeezing<F, Acc> {
  type Operand = Split;

  fn operand(&self, x: Vec<f64>, ctx: &mut RoundingContext) -> Result<Split> {
    self.split(&x, ctx)
  }

  fn quadrant(&self, x: &Split, side: usize, qi: usize, qj: usize) -> Split {
    Split { hi: quadrant(&x.hi, side, qi, qj), lo: quadrant(&x.lo, side, qi, qj) }
  }

  /// The combined value is re-split, so `hi` stays representable in `F`.
  fn combine(&self, x: &Split, y: &Split, sign: f64, ctx: &mut RoundingContext) -> Result<Split> {
    let value: Vec<f64> = (0 .. x.hi.len())
      .map(|k| (x.hi[k] + sign * y.hi[k]) + (x.lo[k] + sign * y.lo[k]))
      .collect();
    self.split(&value, ctx)
  }

  /// The squeezed product `hi * hi + lo * hi + hi * lo`.
  fn leaf(&self, a: &Split, b: &Split, m: usize, k: usize, n: usize, ctx: &mut RoundingContext) -> Result<Vec<f64>> {
    let hh = leaf_product::<Acc>(a.hi.clone(), b.hi.clone(), m, k, n, self.tiling, ctx)?;
    let lh = leaf_product::<Acc>(a.lo.clone(), b.hi.clone(), m, k, n, self.tiling, ctx)?;
    let hl = leaf_product::<Acc>(a.hi.clone(), b.lo.clone(), m, k, n, self.tiling, ctx)?;
    Ok(hh.iter().zip(&lh).zip(&hl).map(|((x, y), z)| x + y + z).collect())
  }
}

/// The product of two `side × side` operands.
fn recurse<S: Scheme, Acc: Scalar>(
  scheme: &S,
  a: &S::Operand,
  b: &S::Operand,
  side: usize,
  cutoff: usize,
  ctx: &mut RoundingContext,
) -> Result<Vec<f64>> {
  if side <= cutoff {
    return scheme.leaf(a, b, side, side, side, ctx)
  }
  let h = side / 2;
  let [a11, a12, a21, a22] = [(0, 0), (0, 1), (1, 0), (1, 1)].map(|(i, j)| scheme.quadrant(a, side, i, j));
  let [b11, b12, b21, b22] = [(0, 0), (0, 1), (1, 0), (1, 1)].map(|(i, j)| scheme.quadrant(b, side, i, j));

  let product = |x: &S::Operand, y: &S::Operand, ctx: &mut RoundingContext| recurse::<S, Acc>(scheme, x, y, h, cutoff, ctx);
  let m1 = { let x = scheme.combine(&a11, &a22, 1.0, ctx)?; let y = scheme.combine(&b11, &b22, 1.0, ctx)?; product(&x, &y, ctx)? };
  let m2 = { let x = scheme.combine(&a21, &a22, 1.0, ctx)?; product(&x, &b11, ctx)? };
  let m3 = { let y = scheme.combine(&b12, &b22, -1.0, ctx)?; product(&a11, &y, ctx)? };
  let m4 = { let y = scheme.combine(&b21, &b11, -1.0, ctx)?; product(&a22, &y, ctx)? };
  let m5 = { let x = scheme.combine(&a11, &a12, 1.0, ctx)?; product(&x, &b22, ctx)? };
  let m6 = { let x = scheme.combine(&a21, &a11, -1.0, ctx)?; let y = scheme.combine(&b11, &b12, 1.0, ctx)?; product(&x, &y, ctx)? };
  let m7 = { let x = scheme.combine(&a12, &a22, -1.0, ctx)?; let y = scheme.combine(&b21, &b22, 1.0, ctx)?; product(&x, &y, ctx)? };

  let c11 = sum_in::<Acc>(&sum_in::<Acc>(&sum_in::<Acc>(&m1, &m4, 1.0, ctx)?, &m5, -1.0, ctx)?, &m7, 1.0, ctx)?;
  let c12 = sum_in::<Acc>(&m3, &m5, 1.0, ctx)?;
  let c21 = sum_in::<Acc>(&m2, &m4, 1.0, ctx)?;
  let c22 = sum_in::<Acc>(&sum_in::<Acc>(&sum_in::<Acc>(&m1, &m2, -1.0, ctx)?, &m3, 1.0, ctx)?, &m6, 1.0, ctx)?;

  let mut out = vec![0.0; side * side];
  for (q, (qi, qj)) in [&c11, &c12, &c21, &c22].into_iter().zip([(0, 0), (0, 1), (1, 0), (1, 1)]) {
    for i in 0 .. h {
      out[(qi * h + i) * side + qj * h ..][.. h].copy_from_slice(&q[i * h ..][.. h]);
    }
  }
  Ok(out)
}

/// Copy a row major `rows × cols` matrix into the top left corner of a zero `side × side` one.
fn pad(x: &[f64], rows: usize, cols: usize, side: usize) -> Vec<f64> {
  let mut out = vec![0.0; side * side];
  for i in 0 .. rows {
    out[i * side ..][.. cols].copy_from_slice(&x[i * cols ..][.. cols]);
  }
  out
}

fn strassen_product<S: Scheme, Acc: Scalar>(
  scheme: &S,
  p: &Problem,
  cutoff: usize,
  ctx: &mut RoundingContext,
) -> Result<Vec<f64>> {
  let cutoff = cutoff.max(1);
  let size = p.m.max(p.k).max(p.n);
  if p.m == 0 || p.n == 0 || p.k == 0 {
    return Ok(vec![0.0; p.m * p.n])
  }
  if size <= cutoff {
    let a = scheme.operand(p.a.clone(), ctx)?;
    let b = scheme.operand(p.b.clone(), ctx)?;
    return scheme.leaf(&a, &b, p.m, p.k, p.n, ctx)
  }
  let mut side = cutoff;
  let mut levels = 0;
  while side < size {
    side *= 2;
    levels += 1;
  }
  log::debug!("strassen: padding {}x{}x{} to {side} ({levels} levels above cutoff {cutoff})", p.m, p.k, p.n);
  let a = scheme.operand(pad(&p.a, p.m, p.k, side), ctx)?;
  let b = scheme.operand(pad(&p.b, p.k, p.n, side), ctx)?;
  let full = recurse::<S, Acc>(scheme, &a, &b, side, cutoff, ctx)?;
  let mut out = Vec::with_capacity(p.m * p.n);
  for i in 0 .. p.m {
    out.extend_from_slice(&full[i * side ..][.. p.n]);
  }
  Ok(out)
}

/// Strassen's algorithm; see the [module docs](self). The recursion stops at
/// `params.strassen_cutoff`, below which [`block_gemm`] (with `params.tiling`) takes over.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the shapes do not agree; domain errors of `Acc` or `TC`. On error,
/// `c` is unchanged.
pub fn strassen_multiply_in<TA, TB, TC, Acc>(
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
  let p = Problem::new("strassen_multiply", a, b, c)?;
  log::debug!(
    "strassen_multiply: {}, cutoff {}, accumulator {}",
    p.describe(), params.strassen_cutoff, params.accumulator_name(),
  );
  let scheme = Plain::<Acc> { tiling: params.tiling, accumulator: core::marker::PhantomData };
  let product = strassen_product::<_, Acc>(&scheme, &p, params.strassen_cutoff, ctx)?;
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`strassen_multiply_in`], with this thread's default context.
pub fn strassen_multiply<TA, TB, TC, Acc>(
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
  crate::with_thread_context(|ctx| strassen_multiply_in(a, b, c, params, ctx))
}

/// Strassen's algorithm over squeezed operands. Every operand, and every sum of operand
/// quadrants, is held as a part representable in `F` plus a residual rounded into `Acc`; the
/// products at the leaves are [squeezed products](super::squeezing_matmul).
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the shapes do not agree; domain errors of `F`, `Acc` or `TC`. On
/// error, `c` is unchanged.
pub fn squeezing_strassen_in<F, TA, TB, TC, Acc>(
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
  let p = Problem::new("squeezing_strassen", a, b, c)?;
  log::debug!(
    "squeezing_strassen: {}, cutoff {}, split format {}, accumulator {}",
    p.describe(), params.strassen_cutoff, core::any::type_name::<F>(), params.accumulator_name(),
  );
  let scheme = Squeezing::<F, Acc> { tiling: params.tiling, types: core::marker::PhantomData };
  let product = strassen_product::<_, Acc>(&scheme, &p, params.strassen_cutoff, ctx)?;
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`squeezing_strassen_in`], with this thread's default context.
pub fn squeezing_strassen<F, TA, TB, TC, Acc>(
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
  crate::with_thread_context(|ctx| squeezing_strassen_in::<F, _, _, _, _>(a, b, c, params, ctx))
}
