use super::*;

/// How [`print_matrix`] renders elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintConfig {
  /// Digits after the decimal point.
  pub precision: usize,
  /// Minimum field width of each element, right aligned.
  pub width: usize,
}

impl Default for PrintConfig {
  fn default() -> Self {
    Self { precision: 4, width: 10 }
  }
}

/// Render `matrix` one row per line, elements separated by a space.
///
/// ```
/// # use narrowfloat::*;
/// let m = Matrix::from_fn(2, 2, |i, j| (i + 2 * j) as f64 / 2.0);
/// let text = print_matrix(&m, &PrintConfig { precision: 1, width: 4 });
/// assert_eq!(text, " 0.0  1.0\n 0.5  1.5\n");
/// ```
pub fn print_matrix<T: Scalar>(matrix: &Matrix<T>, config: &PrintConfig) -> String {
  use core::fmt::Write;
  let PrintConfig { precision, width } = *config;
  let mut out = String::new();
  for i in 0 .. matrix.rows() {
    for (j, x) in matrix.row(i).enumerate() {
      if j > 0 {
        out.push(' ');
      }
      // Writing to a String cannot fail.
      let _ = write!(out, "{:>width$.precision$}", x.to_f64());
    }
    out.push('\n');
  }
  out
}

impl<T: Scalar>
core::fmt::Display for Matrix<T> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str(&print_matrix(self, &PrintConfig::default()))
  }
}
