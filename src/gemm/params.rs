use core::marker::PhantomData;

use crate::scalar::Scalar;

/// Blocking parameters.
///
/// `m`, `n` and `k` are the macro tile sizes (rows of `A` and `C`, columns of `B` and `C`, and
/// the shared dimension); `mr` and `nr` are the micro tile sizes used by
/// [`multi_block_gemm`](super::multi_block_gemm) inside a macro tile. Zero sizes are treated as 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tiling {
  pub m: usize,
  pub n: usize,
  pub k: usize,
  pub mr: usize,
  pub nr: usize,
}

impl Default for Tiling {
  fn default() -> Self {
    Self { m: 256, n: 512, k: 128, mr: 4, nr: 4 }
  }
}

impl Tiling {
  /// Square tiles such that one tile of each of `A`, `B` and `C` (decoded to `f64`) fit together
  /// in `bytes` of cache. The side is a multiple of the 4×4 micro tile, and at least 4.
  ///
  /// ```
  /// # use narrowfloat::gemm::Tiling;
  /// let t = Tiling::from_cache_size(32 * 1024);
  /// assert_eq!((t.m, t.n, t.k), (36, 36, 36));
  /// assert_eq!(Tiling::from_cache_size(0).m, 4);
  /// ```
  pub fn from_cache_size(bytes: usize) -> Self {
    const ELEMENT: usize = core::mem::size_of::<f64>();
    let side = ((bytes / (3 * ELEMENT)) as f64).sqrt() as usize;
    let side = (side / 4 * 4).max(4);
    Self { m: side, n: side, k: side, mr: 4, nr: 4 }
  }

  /// The same tiling with every size at least 1.
  pub(crate) fn sanitized(self) -> Self {
    Self {
      m: self.m.max(1),
      n: self.n.max(1),
      k: self.k.max(1),
      mr: self.mr.max(1),
      nr: self.nr.max(1),
    }
  }
}

/// Parameters of a GEMM call `C = alpha * (A * B) + beta * C`.
///
/// `Acc` is the type partial dot products are accumulated in: each step of a dot product is
/// rounded into it. The default, `f64`, makes every kernel as accurate as it can be; a narrow
/// accumulator models hardware that accumulates in low precision.
///
/// ```
/// # use narrowfloat::*;
/// # use narrowfloat::gemm::*;
/// let params = GemmParams::new()
///   .with_beta(1.0)
///   .with_tiling(Tiling { m: 32, n: 32, k: 16, mr: 4, nr: 4 })
///   .with_accumulator::<half::f16>();
/// assert_eq!(params.beta, 1.0);
/// ```
#[derive(Debug)]
pub struct GemmParams<Acc: Scalar = f64> {
  pub alpha: f64,
  pub beta: f64,
  pub tiling: Tiling,
  /// Strassen recursion stops at matrices of this size or below.
  pub strassen_cutoff: usize,
  /// Residual blocks whose total magnitude is below this are skipped by
  /// [`sparse_squeezing_matmul`](super::sparse_squeezing_matmul).
  pub residual_threshold: f64,
  accumulator: PhantomData<Acc>,
}

impl<Acc: Scalar> Clone for GemmParams<Acc> {
  fn clone(&self) -> Self { *self }
}

impl<Acc: Scalar> Copy for GemmParams<Acc> {}

impl<Acc: Scalar> Default for GemmParams<Acc> {
  fn default() -> Self {
    Self {
      alpha: 1.0,
      beta: 0.0,
      tiling: Tiling::default(),
      strassen_cutoff: 64,
      residual_threshold: 0.0,
      accumulator: PhantomData,
    }
  }
}

impl GemmParams<f64> {
  /// The defaults, accumulating in `f64`: `alpha = 1`, `beta = 0`, the default [`Tiling`], a
  /// Strassen cutoff of 64 and a zero residual threshold.
  pub fn new() -> Self {
    Self::default()
  }
}

impl<Acc: Scalar> GemmParams<Acc> {
  pub fn with_alpha(self, alpha: f64) -> Self {
    Self { alpha, ..self }
  }

  pub fn with_beta(self, beta: f64) -> Self {
    Self { beta, ..self }
  }

  pub fn with_tiling(self, tiling: Tiling) -> Self {
    Self { tiling, ..self }
  }

  pub fn with_strassen_cutoff(self, strassen_cutoff: usize) -> Self {
    Self { strassen_cutoff, ..self }
  }

  pub fn with_residual_threshold(self, residual_threshold: f64) -> Self {
    Self { residual_threshold, ..self }
  }

  /// The same parameters, accumulating in `B`.
  pub fn with_accumulator<B: Scalar>(self) -> GemmParams<B> {
    GemmParams {
      alpha: self.alpha,
      beta: self.beta,
      tiling: self.tiling,
      strassen_cutoff: self.strassen_cutoff,
      residual_threshold: self.residual_threshold,
      accumulator: PhantomData,
    }
  }

  pub(crate) fn accumulator_name(&self) -> &'static str {
    core::any::type_name::<Acc>()
  }
}
