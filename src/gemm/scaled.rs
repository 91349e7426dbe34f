use super::*;

use super::block::block_product;
use super::params::GemmParams;
use crate::format::Format;
use crate::matrix::Vector;
use crate::NarrowFloat;

/// A power of two `s` such that `max_abs / s` is at most `max` (and as close to it as powers of
/// two allow). `1` for an all-zero (or all non-finite) lane.
fn scale_for(max_abs: f64, max: f64) -> f64 {
  if max_abs == 0.0 || !max_abs.is_finite() {
    return 1.0
  }
  let e = (max_abs / max).log2().ceil().clamp(-1022.0, 1023.0) as i32;
  2f64.powi(e)
}

fn lane_scale<F: Format>(lanes: impl Iterator<Item = f64>) -> f64 {
  let max_abs = lanes.filter(|x| x.is_finite()).fold(0.0, |m: f64, x| m.max(x.abs()));
  scale_for(max_abs, NarrowFloat::<F>::MAX.to_f64())
}

/// Power-of-two scales, one per row of `a`, that bring each row into the range of `F`: the
/// largest finite magnitude of a row, divided by its scale, is at most `F::MAX`.
///
/// ```
/// # use narrowfloat::*;
/// # use narrowfloat::gemm::row_scales;
/// let a = Matrix::from_vec(2, 2, Layout::RowMajor, vec![1000.0, -3.0, 0.5, 0.0]).unwrap();
/// let s = row_scales::<presets::E4M3Fn, _>(&a);
/// assert_eq!(s.as_slice(), [4.0, 0.001953125]);
/// ```
pub fn row_scales<F: Format, T: Scalar>(a: &Matrix<T>) -> Vector<f64> {
  (0 .. a.rows()).map(|i| lane_scale::<F>(a.row(i).map(|x| x.to_f64()))).collect()
}

/// Power-of-two scales, one per column of `b`; see [`row_scales`].
pub fn col_scales<F: Format, T: Scalar>(b: &Matrix<T>) -> Vector<f64> {
  (0 .. b.cols()).map(|j| lane_scale::<F>(b.col(j).map(|x| x.to_f64()))).collect()
}

fn check_scales(scales: &Vector<f64>, expected: usize) -> Result<()> {
  if scales.len() != expected {
    return Err(Error::LengthMismatch { expected, found: scales.len() })
  }
  match scales.iter().enumerate().find(|(_, s)| !(s.is_finite() && **s > 0.0)) {
    Some((index, &value)) => Err(Error::InvalidScale { index, value }),
    None => Ok(()),
  }
}

/// Scaled product in a narrow format `F`.
///
/// Row `i` of `A` is divided by `a_scales[i]` and column `j` of `B` by `b_scales[j]`; the
/// results are rounded into `F` and multiplied as by [`block_gemm`], and element `(i, j)` of
/// the product is multiplied back by `a_scales[i] * b_scales[j]`. With scales from
/// [`row_scales`] and [`col_scales`], operands use the whole range of `F` without overflowing.
/// Dividing by a power of two is exact unless the quotient falls among the `f64` subnormals,
/// far below the range of any narrow format, where it is rounded.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the shapes do not agree; [`Error::LengthMismatch`] if there is not
/// one scale per row of `A` and per column of `B`; [`Error::InvalidScale`] for a scale that is
/// zero, negative, or not finite; domain errors of `F`, `Acc` or `TC`. On error, `c` is
/// unchanged.
pub fn scaled_matmul_in<F, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  a_scales: &Vector<f64>,
  b_scales: &Vector<f64>,
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
  let p = Problem::new("scaled_matmul", a, b, c)?;
  check_scales(a_scales, p.m)?;
  check_scales(b_scales, p.n)?;
  log::debug!(
    "scaled_matmul: {}, format {}, accumulator {}",
    p.describe(), core::any::type_name::<F>(), params.accumulator_name(),
  );

  let round = |x: f64, ctx: &mut RoundingContext| -> Result<f64> {
    Ok(NarrowFloat::<F>::from_f64_in(x, ctx)?.to_f64())
  };
  let mut a_scaled = Vec::with_capacity(p.a.len());
  for i in 0 .. p.m {
    for l in 0 .. p.k {
      a_scaled.push(round(p.a(i, l) / a_scales[i], ctx)?);
    }
  }
  let mut b_scaled = Vec::with_capacity(p.b.len());
  for l in 0 .. p.k {
    for j in 0 .. p.n {
      b_scaled.push(round(p.b(l, j) / b_scales[j], ctx)?);
    }
  }

  let mut product = block_product::<Acc>(&p.with_operands(a_scaled, b_scaled), params.tiling, ctx)?;
  for i in 0 .. p.m {
    for j in 0 .. p.n {
      product[i * p.n + j] *= a_scales[i] * b_scales[j];
    }
  }
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`scaled_matmul_in`], with this thread's default context.
pub fn scaled_matmul<F, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  a_scales: &Vector<f64>,
  b_scales: &Vector<f64>,
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
  crate::with_thread_context(|ctx| scaled_matmul_in::<F, _, _, _, _>(a, b, a_scales, b_scales, c, params, ctx))
}
