use super::*;

use super::block::block_product;
use super::params::GemmParams;
use crate::format::Format;
use crate::NarrowFloat;

/// Round `x` into `F`, back to `f64`.
fn quantize<F: Format>(x: &[f64], ctx: &mut RoundingContext) -> Result<Vec<f64>> {
  x.iter().map(|&v| Ok(NarrowFloat::<F>::from_f64_in(v, ctx)?.to_f64())).collect()
}

fn mixed_product<FA: Format, FB: Format, Acc: Scalar>(
  op: &'static str,
  p: &Problem,
  params: &GemmParams<Acc>,
  ctx: &mut RoundingContext,
) -> Result<Vec<f64>> {
  log::debug!(
    "{op}: {}, formats {} and {}, accumulator {}",
    p.describe(), core::any::type_name::<FA>(), core::any::type_name::<FB>(), params.accumulator_name(),
  );
  let a = quantize::<FA>(&p.a, ctx)?;
  let b = quantize::<FB>(&p.b, ctx)?;
  block_product::<Acc>(&p.with_operands(a, b), params.tiling, ctx)
}

/// Product of operands in two different narrow formats, as mixed-precision hardware computes
/// it: `A` is rounded into `FA`, `B` into `FB`, and the products are accumulated in `f32`
/// (whatever the accumulator of `params`), blocked as by [`block_gemm`].
///
/// ```
/// # use narrowfloat::*;
/// # use narrowfloat::gemm::*;
/// let a = Matrix::filled(1, 1, 300.0);
/// let b = Matrix::filled(1, 1, 300.0);
/// let mut c = Matrix::<f64>::zeros(1, 1);
/// fbfmatmul::<presets::E4M3Fn, presets::E5M2, _, _, _, _>(&a, &b, &mut c, &GemmParams::new()).unwrap();
/// assert_eq!(c[(0, 0)], 288.0 * 320.0);
/// ```
///
/// # Errors
///
/// [`Error::ShapeMismatch`] if the shapes do not agree; domain errors of `FA`, `FB` or `TC`. On
/// error, `c` is unchanged.
pub fn fbfmatmul_in<FA, FB, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  c: &mut Matrix<TC>,
  params: &GemmParams<Acc>,
  ctx: &mut RoundingContext,
) -> Result<()>
where
  FA: Format,
  FB: Format,
  TA: Scalar,
  TB: Scalar,
  TC: Scalar,
  Acc: Scalar,
{
  let p = Problem::new("fbfmatmul", a, b, c)?;
  let product = mixed_product::<FA, FB, f32>("fbfmatmul", &p, &params.with_accumulator(), ctx)?;
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`fbfmatmul_in`], with this thread's default context.
pub fn fbfmatmul<FA, FB, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  c: &mut Matrix<TC>,
  params: &GemmParams<Acc>,
) -> Result<()>
where
  FA: Format,
  FB: Format,
  TA: Scalar,
  TB: Scalar,
  TC: Scalar,
  Acc: Scalar,
{
  crate::with_thread_context(|ctx| fbfmatmul_in::<FA, FB, _, _, _, _>(a, b, c, params, ctx))
}

/// As [`fbfmatmul_in`], accumulating in `half::f16`.
///
/// # Errors
///
/// As [`fbfmatmul_in`].
pub fn fbfmatmul_fp16_in<FA, FB, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  c: &mut Matrix<TC>,
  params: &GemmParams<Acc>,
  ctx: &mut RoundingContext,
) -> Result<()>
where
  FA: Format,
  FB: Format,
  TA: Scalar,
  TB: Scalar,
  TC: Scalar,
  Acc: Scalar,
{
  let p = Problem::new("fbfmatmul_fp16", a, b, c)?;
  let product = mixed_product::<FA, FB, half::f16>("fbfmatmul_fp16", &p, &params.with_accumulator(), ctx)?;
  commit(c, &product, params.alpha, params.beta, ctx)
}

/// As [`fbfmatmul_fp16_in`], with this thread's default context.
pub fn fbfmatmul_fp16<FA, FB, TA, TB, TC, Acc>(
  a: &Matrix<TA>,
  b: &Matrix<TB>,
  c: &mut Matrix<TC>,
  params: &GemmParams<Acc>,
) -> Result<()>
where
  FA: Format,
  FB: Format,
  TA: Scalar,
  TB: Scalar,
  TC: Scalar,
  Acc: Scalar,
{
  crate::with_thread_context(|ctx| fbfmatmul_fp16_in::<FA, FB, _, _, _, _>(a, b, c, params, ctx))
}
