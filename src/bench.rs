//! Re-export some internals for benchmarking purposes; available with feature = "bench".

use crate::format::FormatDescriptor;
use crate::gemm::{GemmParams, Tiling};
use crate::presets::{E4M3Fn, E5M2};
use crate::{Matrix, NarrowFloat, RoundingContext};

impl FormatDescriptor {
  /// The first step of [`round_and_encode`](Self::round_and_encode): the exponent step and the
  /// integer number of quanta of a positive finite `value`.
  pub fn bench_quantize(&self, value: f64) -> (u64, u64) {
    let q = self.quantize(value);
    (q.steps, q.n)
  }
}

/// Square operands of side `n` filled with a fixed, non-trivial pattern of values in `[-2, 2)`.
pub fn bench_operands(n: usize) -> (Matrix<f64>, Matrix<f64>) {
  let value = |i: usize, j: usize| ((i * 31 + j * 17) % 64) as f64 / 16.0 - 2.0;
  (Matrix::from_fn(n, n, value), Matrix::from_fn(n, n, |i, j| value(j, i)))
}

/// Parameters with a tiling small enough that a bench-sized problem has several tiles.
pub fn bench_params(n: usize) -> GemmParams {
  let side = (n / 4).max(4);
  GemmParams::new()
    .with_tiling(Tiling { m: side, n: side, k: side, mr: 4, nr: 4 })
    .with_strassen_cutoff(side)
}

// Export these for inspection with `cargo asm`.

#[unsafe(no_mangle)]
pub fn decode_e4m3(bits: u8) -> f64 {
  NarrowFloat::<E4M3Fn>::from_bits(bits).to_f64()
}

#[unsafe(no_mangle)]
pub fn encode_e5m2(value: f64, ctx: &mut RoundingContext) -> u8 {
  NarrowFloat::<E5M2>::from_f64_in(value, ctx).map_or(0xff, |x| x.to_bits())
}
