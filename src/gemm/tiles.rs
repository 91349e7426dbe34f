//! Splitting the output into tiles and running a kernel over each of them.
//!
//! Every tile gets its own [`RoundingContext`], forked from the caller's in tile order before any
//! tile runs, and its own output buffer. Results are therefore the same whether tiles run one
//! after another or (with feature `parallel`) on the rayon pool. Nothing is written to the
//! caller's output until every tile has succeeded.

use crate::matrix::MxLayout;
use crate::{Result, RoundingContext};

/// A rectangle of the output, `rows × cols` at `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tile {
  pub row: usize,
  pub col: usize,
  pub rows: usize,
  pub cols: usize,
}

/// Side of the square groups of tiles walked by [`MxLayout::ByBlock`].
const GROUP: usize = 2;

/// The tiles covering an `m × n` output with tiles of `tm × tn`, in the order `order` asks for.
pub(crate) fn tiles(m: usize, n: usize, tm: usize, tn: usize, order: MxLayout) -> Vec<Tile> {
  let (tm, tn) = (tm.max(1), tn.max(1));
  let (bm, bn) = (m.div_ceil(tm), n.div_ceil(tn));
  let tile = |bi: usize, bj: usize| Tile {
    row: bi * tm,
    col: bj * tn,
    rows: tm.min(m - bi * tm),
    cols: tn.min(n - bj * tn),
  };
  let mut out = Vec::with_capacity(bm * bn);
  match order {
    MxLayout::ByRow => {
      for bi in 0 .. bm { for bj in 0 .. bn { out.push(tile(bi, bj)) } }
    },
    MxLayout::ByColumn => {
      for bj in 0 .. bn { for bi in 0 .. bm { out.push(tile(bi, bj)) } }
    },
    MxLayout::ByBlock => {
      for gi in (0 .. bm).step_by(GROUP) {
        for gj in (0 .. bn).step_by(GROUP) {
          for bi in gi .. (gi + GROUP).min(bm) {
            for bj in gj .. (gj + GROUP).min(bn) {
              out.push(tile(bi, bj))
            }
          }
        }
      }
    },
  }
  out
}

/// Run `kernel` on every tile of `tiles`, each with a private context forked from `ctx`. On
/// success the flags of every tile are folded back into `ctx`; on failure the error of a failing
/// tile is returned (the first one in tile order, unless running in parallel).
pub(crate) fn run_tiles<R, K>(tiles: Vec<Tile>, ctx: &mut RoundingContext, kernel: K) -> Result<Vec<(Tile, R)>>
where
  R: Send,
  K: Fn(&Tile, &mut RoundingContext) -> Result<R> + Sync + Send,
{
  let tasks: Vec<(Tile, RoundingContext)> = tiles.into_iter().map(|t| (t, ctx.fork())).collect();
  let run = |(tile, mut child): (Tile, RoundingContext)| -> Result<(Tile, R, RoundingContext)> {
    let r = kernel(&tile, &mut child)?;
    Ok((tile, r, child))
  };

  #[cfg(feature = "parallel")]
  let done: Result<Vec<_>> = {
    use rayon::prelude::*;
    tasks.into_par_iter().map(run).collect()
  };
  #[cfg(not(feature = "parallel"))]
  let done: Result<Vec<_>> = tasks.into_iter().map(run).collect();

  let done = done?;
  Ok(done.into_iter().map(|(tile, r, child)| {
    ctx.absorb(&child);
    (tile, r)
  }).collect())
}

/// Assemble row-major tile buffers into one row-major `m × n` buffer.
pub(crate) fn scatter(m: usize, n: usize, parts: &[(Tile, Vec<f64>)]) -> Vec<f64> {
  let mut out = vec![0.0; m * n];
  for (t, buf) in parts {
    for i in 0 .. t.rows {
      let dst = (t.row + i) * n + t.col;
      out[dst .. dst + t.cols].copy_from_slice(&buf[i * t.cols .. (i + 1) * t.cols]);
    }
  }
  out
}
