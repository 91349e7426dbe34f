use super::*;

/// An owned 1-D sequence of elements. The kernels take scale factors in this form.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Vector<T> {
  data: Vec<T>,
}

impl<T> Vector<T> {
  pub fn from_fn(len: usize, f: impl FnMut(usize) -> T) -> Self {
    Self { data: (0 .. len).map(f).collect() }
  }

  pub fn len(&self) -> usize {
    self.data.len()
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// # Errors
  ///
  /// [`Error::IndexOutOfRange`] past the end (reported as row `i` of a column vector).
  pub fn get(&self, i: usize) -> Result<&T> {
    self.data.get(i).ok_or(Error::IndexOutOfRange { row: i, col: 0, rows: self.data.len(), cols: 1 })
  }

  /// # Errors
  ///
  /// [`Error::IndexOutOfRange`] past the end.
  pub fn set(&mut self, i: usize, value: T) -> Result<()> {
    let rows = self.data.len();
    let slot = self.data.get_mut(i).ok_or(Error::IndexOutOfRange { row: i, col: 0, rows, cols: 1 })?;
    *slot = value;
    Ok(())
  }

  pub fn iter(&self) -> core::slice::Iter<'_, T> {
    self.data.iter()
  }

  pub fn as_slice(&self) -> &[T] {
    &self.data
  }

  pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Vector<U> {
    Vector { data: self.data.iter().map(f).collect() }
  }
}

impl<T: Clone> Vector<T> {
  pub fn filled(len: usize, value: T) -> Self {
    Self { data: vec![value; len] }
  }
}

impl<T: Scalar> Vector<T> {
  /// Round every element into `U`.
  ///
  /// # Errors
  ///
  /// The first domain error of `U`.
  pub fn convert<U: Scalar>(&self) -> Result<Vector<U>> {
    crate::with_thread_context(|ctx| {
      self.data.iter().map(|x| U::from_f64_in(x.to_f64(), ctx)).collect::<Result<_>>().map(|data| Vector { data })
    })
  }
}

impl<T> From<Vec<T>> for Vector<T> {
  fn from(data: Vec<T>) -> Self {
    Self { data }
  }
}

impl<T> FromIterator<T> for Vector<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    Self { data: iter.into_iter().collect() }
  }
}

impl<T> core::ops::Index<usize> for Vector<T> {
  type Output = T;

  #[inline]
  fn index(&self, i: usize) -> &T {
    &self.data[i]
  }
}

impl<T> core::ops::IndexMut<usize> for Vector<T> {
  #[inline]
  fn index_mut(&mut self, i: usize) -> &mut T {
    &mut self.data[i]
  }
}

impl<'a, T> IntoIterator for &'a Vector<T> {
  type Item = &'a T;
  type IntoIter = core::slice::Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.data.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::presets::*;
  use crate::NarrowFloat;

  #[test]
  fn access() {
    let mut v: Vector<f64> = (0 .. 4).map(f64::from).collect();
    assert_eq!(v.len(), 4);
    assert_eq!(v.get(3), Ok(&3.0));
    assert_eq!(v.get(4), Err(Error::IndexOutOfRange { row: 4, col: 0, rows: 4, cols: 1 }));
    v.set(0, 9.0).unwrap();
    v[1] = 8.0;
    assert_eq!(v.as_slice(), [9.0, 8.0, 2.0, 3.0]);
    assert!(v.set(7, 0.0).is_err());
  }

  #[test]
  fn convert() {
    let v = Vector::from(vec![0.3, 1e4]);
    let n = v.convert::<NarrowFloat<E5M2>>().unwrap();
    assert_eq!(n[0].to_f64(), 0.3125);
    assert_eq!(n[1].to_f64(), 10240.0);
    assert_eq!(Vector::<f32>::filled(2, 1.0).map(|x| x * 2.0), Vector::from(vec![2.0, 2.0]));
  }
}
