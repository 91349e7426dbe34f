//! Dense matrices and vectors over any element type.
//!
//! A [`Matrix`] owns its `rows * cols` elements in a single buffer. Its physical [`Layout`] fixes
//! how `(row, col)` maps into that buffer; its [`MxLayout`] partition is only a hint, consulted by
//! the [GEMM kernels](crate::gemm) to order their tiles. Two matrices compare equal when they
//! have the same shape and the same logical elements, whatever their layouts.
//!
//! ```
//! # use narrowfloat::*;
//! let a = Matrix::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
//! assert_eq!(a[(1, 2)], 5.0);
//! assert_eq!(a.row(1).copied().collect::<Vec<_>>(), [3.0, 4.0, 5.0]);
//!
//! let b = a.to_layout(Layout::RowMajor);
//! assert_eq!(a, b);
//! ```

use crate::scalar::Scalar;
use crate::{Error, Result};

/// Borrowed rectangular windows and the lane iterators.
mod view;

/// Owned 1-D vectors.
mod vector;

/// Rendering to text.
mod print;

pub use view::{Lane, MatrixView};
pub use vector::Vector;
pub use print::{PrintConfig, print_matrix};

/// The storage order of a [`Matrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
  /// Element `(i, j)` lives at `i + j * rows`.
  #[default]
  ColMajor,
  /// Element `(i, j)` lives at `i * cols + j`.
  RowMajor,
}

/// The traversal order kernels use when walking a matrix tile by tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MxLayout {
  /// Column of tiles after column of tiles.
  #[default]
  ByColumn,
  /// Row of tiles after row of tiles.
  ByRow,
  /// Square groups of tiles, each finished before the next.
  ByBlock,
}

/// A dense `rows × cols` matrix.
#[derive(Clone, Debug)]
pub struct Matrix<T> {
  rows: usize,
  cols: usize,
  layout: Layout,
  partition: MxLayout,
  data: Vec<T>,
}

impl<T> Matrix<T> {
  /// Build a matrix in the default (column major) layout, element `(i, j)` being `f(i, j)`.
  pub fn from_fn(rows: usize, cols: usize, f: impl FnMut(usize, usize) -> T) -> Self {
    Self::from_fn_with_layout(rows, cols, Layout::default(), f)
  }

  pub fn from_fn_with_layout(
    rows: usize,
    cols: usize,
    layout: Layout,
    mut f: impl FnMut(usize, usize) -> T,
  ) -> Self {
    let data = match layout {
      Layout::ColMajor => (0 .. cols).flat_map(|j| (0 .. rows).map(move |i| (i, j))).map(|(i, j)| f(i, j)).collect(),
      Layout::RowMajor => (0 .. rows).flat_map(|i| (0 .. cols).map(move |j| (i, j))).map(|(i, j)| f(i, j)).collect(),
    };
    Self { rows, cols, layout, partition: MxLayout::default(), data }
  }

  /// As [`from_fn_with_layout`](Self::from_fn_with_layout), stopping at the first error of `f`.
  pub fn try_from_fn_with_layout<E>(
    rows: usize,
    cols: usize,
    layout: Layout,
    mut f: impl FnMut(usize, usize) -> core::result::Result<T, E>,
  ) -> core::result::Result<Self, E> {
    let (outer, inner) = match layout {
      Layout::ColMajor => (cols, rows),
      Layout::RowMajor => (rows, cols),
    };
    let mut data = Vec::with_capacity(rows * cols);
    for o in 0 .. outer {
      for i in 0 .. inner {
        data.push(match layout {
          Layout::ColMajor => f(i, o)?,
          Layout::RowMajor => f(o, i)?,
        })
      }
    }
    Ok(Self { rows, cols, layout, partition: MxLayout::default(), data })
  }

  /// Adopt a flat buffer, laid out according to `layout`.
  ///
  /// # Errors
  ///
  /// [`Error::LengthMismatch`] if `data` does not hold exactly `rows * cols` elements.
  pub fn from_vec(rows: usize, cols: usize, layout: Layout, data: Vec<T>) -> Result<Self> {
    let expected = rows * cols;
    if data.len() != expected {
      return Err(Error::LengthMismatch { expected, found: data.len() })
    }
    Ok(Self { rows, cols, layout, partition: MxLayout::default(), data })
  }

  /// `(rows, cols)`.
  pub fn shape(&self) -> (usize, usize) {
    (self.rows, self.cols)
  }

  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  pub fn layout(&self) -> Layout {
    self.layout
  }

  pub fn partition(&self) -> MxLayout {
    self.partition
  }

  /// Set the traversal hint.
  pub fn with_partition(mut self, partition: MxLayout) -> Self {
    self.partition = partition;
    self
  }

  pub fn set_partition(&mut self, partition: MxLayout) {
    self.partition = partition;
  }

  /// The underlying buffer, in storage order.
  pub fn as_slice(&self) -> &[T] {
    &self.data
  }

  pub fn into_vec(self) -> Vec<T> {
    self.data
  }

  /// Position of `(i, j)` in the buffer. Does not check bounds.
  #[inline]
  pub(crate) fn offset(&self, i: usize, j: usize) -> usize {
    match self.layout {
      Layout::ColMajor => i + j * self.rows,
      Layout::RowMajor => i * self.cols + j,
    }
  }

  /// Buffer distance between `(i, j)` and `(i + 1, j)`, and between `(i, j)` and `(i, j + 1)`.
  #[inline]
  pub(crate) fn strides(&self) -> (usize, usize) {
    match self.layout {
      Layout::ColMajor => (1, self.rows),
      Layout::RowMajor => (self.cols, 1),
    }
  }

  #[inline]
  fn check(&self, row: usize, col: usize) -> Result<usize> {
    if row < self.rows && col < self.cols {
      Ok(self.offset(row, col))
    } else {
      Err(Error::IndexOutOfRange { row, col, rows: self.rows, cols: self.cols })
    }
  }

  /// # Errors
  ///
  /// [`Error::IndexOutOfRange`] outside the matrix.
  pub fn get(&self, row: usize, col: usize) -> Result<&T> {
    let k = self.check(row, col)?;
    Ok(&self.data[k])
  }

  /// # Errors
  ///
  /// [`Error::IndexOutOfRange`] outside the matrix.
  pub fn get_mut(&mut self, row: usize, col: usize) -> Result<&mut T> {
    let k = self.check(row, col)?;
    Ok(&mut self.data[k])
  }

  /// # Errors
  ///
  /// [`Error::IndexOutOfRange`] outside the matrix; the matrix is unchanged.
  pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
    *self.get_mut(row, col)? = value;
    Ok(())
  }

  /// The `rows × cols` window whose top left corner is `(row, col)`.
  ///
  /// # Errors
  ///
  /// [`Error::IndexOutOfRange`] if the window does not fit, reporting its far corner.
  pub fn view(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<MatrixView<'_, T>> {
    MatrixView::new(self, row, col, rows, cols)
  }

  /// The whole matrix as a view.
  pub fn as_view(&self) -> MatrixView<'_, T> {
    MatrixView::full(self)
  }

  /// The elements of row `i`, left to right.
  ///
  /// # Panics
  ///
  /// If `i >= rows`.
  pub fn row(&self, i: usize) -> Lane<'_, T> {
    self.as_view().row(i)
  }

  /// The elements of column `j`, top to bottom.
  ///
  /// # Panics
  ///
  /// If `j >= cols`.
  pub fn col(&self, j: usize) -> Lane<'_, T> {
    self.as_view().col(j)
  }

  /// Apply `f` to every element. Keeps layout and partition.
  pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Matrix<U> {
    Matrix {
      rows: self.rows,
      cols: self.cols,
      layout: self.layout,
      partition: self.partition,
      data: self.data.iter().map(&mut f).collect(),
    }
  }

  /// Apply a fallible `f` to every element, stopping at the first error.
  pub fn try_map<U, E>(&self, f: impl FnMut(&T) -> core::result::Result<U, E>) -> core::result::Result<Matrix<U>, E> {
    Ok(Matrix {
      rows: self.rows,
      cols: self.cols,
      layout: self.layout,
      partition: self.partition,
      data: self.data.iter().map(f).collect::<core::result::Result<_, _>>()?,
    })
  }
}

impl<T: Clone> Matrix<T> {
  /// A matrix with every element equal to `value`.
  pub fn filled(rows: usize, cols: usize, value: T) -> Self {
    Self { rows, cols, layout: Layout::default(), partition: MxLayout::default(), data: vec![value; rows * cols] }
  }

  /// The same matrix, stored in `layout`.
  pub fn to_layout(&self, layout: Layout) -> Self {
    Self::from_fn_with_layout(self.rows, self.cols, layout, |i, j| self[(i, j)].clone())
      .with_partition(self.partition)
  }

  /// The transpose (keeps the layout).
  pub fn transpose(&self) -> Self {
    Self::from_fn_with_layout(self.cols, self.rows, self.layout, |i, j| self[(j, i)].clone())
      .with_partition(self.partition)
  }
}

impl<T: Scalar> Matrix<T> {
  pub fn zeros(rows: usize, cols: usize) -> Self {
    Self::filled(rows, cols, T::ZERO)
  }

  /// The `n × n` identity.
  pub fn identity(n: usize) -> Self {
    Self::from_fn(n, n, |i, j| if i == j { T::ONE } else { T::ZERO })
  }

  /// Round every element into `U`, using `ctx`.
  ///
  /// # Errors
  ///
  /// The first domain error of `U`.
  pub fn convert_in<U: Scalar>(&self, ctx: &mut crate::RoundingContext) -> Result<Matrix<U>> {
    self.try_map(|x| U::from_f64_in(x.to_f64(), ctx))
  }

  /// As [`convert_in`](Self::convert_in), with this thread's default context.
  pub fn convert<U: Scalar>(&self) -> Result<Matrix<U>> {
    crate::with_thread_context(|ctx| self.convert_in(ctx))
  }

  /// The elements decoded to `f64`, in row major order. Kernels work on this form.
  pub(crate) fn to_row_major_f64(&self) -> Vec<f64> {
    let mut out = Vec::with_capacity(self.data.len());
    for i in 0 .. self.rows {
      out.extend(self.row(i).map(|x| x.to_f64()))
    }
    out
  }

  fn elementwise(
    &self,
    other: &Self,
    op: &'static str,
    ctx: &mut crate::RoundingContext,
    f: impl Fn(f64, f64) -> f64,
  ) -> Result<Self> {
    if self.shape() != other.shape() {
      return Err(Error::ShapeMismatch { op, lhs: self.shape(), rhs: other.shape() })
    }
    let data = (0 .. self.data.len())
      .map(|k| {
        let (i, j) = match self.layout {
          Layout::ColMajor => (k % self.rows.max(1), k / self.rows.max(1)),
          Layout::RowMajor => (k / self.cols.max(1), k % self.cols.max(1)),
        };
        T::from_f64_in(f(self.data[k].to_f64(), other[(i, j)].to_f64()), ctx)
      })
      .collect::<Result<_>>()?;
    Ok(Self { data, ..*self })
  }

  /// Elementwise sum, rounded into `T`. The result has the layout of `self`.
  ///
  /// # Errors
  ///
  /// [`Error::ShapeMismatch`] on different shapes; domain errors of `T`.
  pub fn add_in(&self, other: &Self, ctx: &mut crate::RoundingContext) -> Result<Self> {
    self.elementwise(other, "add", ctx, |a, b| a + b)
  }

  pub fn add(&self, other: &Self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.add_in(other, ctx))
  }

  /// Elementwise difference, rounded into `T`.
  ///
  /// # Errors
  ///
  /// [`Error::ShapeMismatch`] on different shapes; domain errors of `T`.
  pub fn sub_in(&self, other: &Self, ctx: &mut crate::RoundingContext) -> Result<Self> {
    self.elementwise(other, "sub", ctx, |a, b| a - b)
  }

  pub fn sub(&self, other: &Self) -> Result<Self> {
    crate::with_thread_context(|ctx| self.sub_in(other, ctx))
  }

  /// Whether any element is NaN.
  pub fn has_nan(&self) -> bool {
    self.data.iter().any(|x| x.to_f64().is_nan())
  }

  /// Whether any element is infinite.
  pub fn has_inf(&self) -> bool {
    self.data.iter().any(|x| x.to_f64().is_infinite())
  }
}

impl<T: PartialEq> PartialEq for Matrix<T> {
  fn eq(&self, other: &Self) -> bool {
    if self.shape() != other.shape() {
      return false
    }
    if self.layout == other.layout {
      return self.data == other.data
    }
    (0 .. self.rows).all(|i| self.row(i).eq(other.row(i)))
  }
}

impl<T>
core::ops::Index<(usize, usize)> for Matrix<T> {
  type Output = T;

  /// # Panics
  ///
  /// Outside the matrix.
  #[inline]
  fn index(&self, (row, col): (usize, usize)) -> &T {
    match self.check(row, col) {
      Ok(k) => &self.data[k],
      Err(e) => panic!("{e}"),
    }
  }
}

impl<T>
core::ops::IndexMut<(usize, usize)> for Matrix<T> {
  #[inline]
  fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
    match self.check(row, col) {
      Ok(k) => &mut self.data[k],
      Err(e) => panic!("{e}"),
    }
  }
}
