use super::*;

/// A borrowed rectangular window into a [`Matrix`]. Indices are relative to the window.
#[derive(Debug)]
pub struct MatrixView<'a, T> {
  parent: &'a Matrix<T>,
  row: usize,
  col: usize,
  rows: usize,
  cols: usize,
}

impl<T> Clone for MatrixView<'_, T> {
  fn clone(&self) -> Self { *self }
}

impl<T> Copy for MatrixView<'_, T> {}

/// Check that a `shape` window at `start` lies within `bounds`. Reports the last index the
/// window would need, saturating where it does not exist.
fn fits(start: (usize, usize), shape: (usize, usize), bounds: (usize, usize)) -> Result<()> {
  let end_row = start.0.checked_add(shape.0).filter(|&e| e <= bounds.0);
  let end_col = start.1.checked_add(shape.1).filter(|&e| e <= bounds.1);
  match (end_row, end_col) {
    (Some(_), Some(_)) => Ok(()),
    _ => Err(Error::IndexOutOfRange {
      row: start.0.saturating_add(shape.0).saturating_sub(1),
      col: start.1.saturating_add(shape.1).saturating_sub(1),
      rows: bounds.0,
      cols: bounds.1,
    }),
  }
}

impl<'a, T> MatrixView<'a, T> {
  pub(super) fn new(parent: &'a Matrix<T>, row: usize, col: usize, rows: usize, cols: usize) -> Result<Self> {
    fits((row, col), (rows, cols), (parent.rows, parent.cols))?;
    Ok(Self { parent, row, col, rows, cols })
  }

  pub(super) fn full(parent: &'a Matrix<T>) -> Self {
    Self { parent, row: 0, col: 0, rows: parent.rows, cols: parent.cols }
  }

  pub fn shape(&self) -> (usize, usize) {
    (self.rows, self.cols)
  }

  /// # Errors
  ///
  /// [`Error::IndexOutOfRange`] outside the window (even if inside the parent).
  pub fn get(&self, row: usize, col: usize) -> Result<&'a T> {
    if row < self.rows && col < self.cols {
      Ok(&self.parent.data[self.parent.offset(self.row + row, self.col + col)])
    } else {
      Err(Error::IndexOutOfRange { row, col, rows: self.rows, cols: self.cols })
    }
  }

  /// A window of this window.
  ///
  /// # Errors
  ///
  /// [`Error::IndexOutOfRange`] if it does not fit.
  pub fn view(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Self> {
    fits((row, col), (rows, cols), (self.rows, self.cols))?;
    Ok(Self { parent: self.parent, row: self.row + row, col: self.col + col, rows, cols })
  }

  /// # Panics
  ///
  /// If `i` is outside the window.
  pub fn row(&self, i: usize) -> Lane<'a, T> {
    assert!(i < self.rows, "row {i} out of range for {} rows", self.rows);
    let (_, step) = self.parent.strides();
    Lane { data: &self.parent.data, next: self.parent.offset(self.row + i, self.col), step, remaining: self.cols }
  }

  /// # Panics
  ///
  /// If `j` is outside the window.
  pub fn col(&self, j: usize) -> Lane<'a, T> {
    assert!(j < self.cols, "column {j} out of range for {} columns", self.cols);
    let (step, _) = self.parent.strides();
    Lane { data: &self.parent.data, next: self.parent.offset(self.row, self.col + j), step, remaining: self.rows }
  }

  /// Copy the window into a new matrix with the parent's layout.
  pub fn to_matrix(&self) -> Matrix<T> where T: Clone {
    Matrix::from_fn_with_layout(self.rows, self.cols, self.parent.layout, |i, j| {
      self.parent.data[self.parent.offset(self.row + i, self.col + j)].clone()
    })
  }
}

/// The elements of one row or column, in order. Cloning restarts from the clone point.
#[derive(Debug)]
pub struct Lane<'a, T> {
  data: &'a [T],
  next: usize,
  step: usize,
  remaining: usize,
}

impl<T> Clone for Lane<'_, T> {
  fn clone(&self) -> Self {
    Self { data: self.data, next: self.next, step: self.step, remaining: self.remaining }
  }
}

impl<'a, T> Iterator for Lane<'a, T> {
  type Item = &'a T;

  #[inline]
  fn next(&mut self) -> Option<&'a T> {
    if self.remaining == 0 {
      return None
    }
    let item = &self.data[self.next];
    self.remaining -= 1;
    if self.remaining > 0 {
      self.next += self.step;
    }
    Some(item)
  }

  #[inline]
  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl<T> ExactSizeIterator for Lane<'_, T> {}

impl<T> core::iter::FusedIterator for Lane<'_, T> {}
