//! Dense row-major tensors used to move batches of keys and embeddings.

use crate::error::{KnowledgeBankError, KnowledgeBankResult};

/// A dense tensor stored in row-major order.
///
/// Key batches are usually rank 1 (`[N]`) or rank 2 (`[R, C]`); embedding
/// batches carry one extra trailing axis of the embedding dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> Default for Tensor<T> {
    fn default() -> Self {
        Self {
            shape: vec![0],
            data: Vec::new(),
        }
    }
}

impl<T> Tensor<T> {
    /// Builds a tensor, checking that `data` fills `shape` exactly.
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> KnowledgeBankResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(KnowledgeBankError::invalid_argument(format!(
                "Tensor shape {:?} needs {} elements, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn vector(data: Vec<T>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn matrix(rows: usize, cols: usize, data: Vec<T>) -> KnowledgeBankResult<Self> {
        Self::new(vec![rows, cols], data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length of the trailing axis, 0 for a rank-0 tensor.
    pub fn inner_dim(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }

    /// Number of elements across every axis but the last.
    pub fn outer_len(&self) -> usize {
        match self.shape.split_last() {
            Some((_, outer)) => outer.iter().product(),
            None => 0,
        }
    }

    /// Iterates over trailing-axis rows. Empty when the trailing axis is 0.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        let dim = self.inner_dim();
        let rows = if dim == 0 { 0 } else { self.outer_len() };
        (0..rows).map(move |i| &self.data[i * dim..(i + 1) * dim])
    }

    /// Row-major offset of `index`, or `None` when out of range.
    pub fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (i, dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        Some(offset)
    }

    pub fn get(&self, index: &[usize]) -> Option<&T> {
        self.offset(index).map(|o| &self.data[o])
    }
}

impl<T: Clone + Default> Tensor<T> {
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![T::default(); len],
        }
    }
}

impl Tensor<f32> {
    /// Slice at `index` along all axes but the trailing one.
    pub fn row(&self, index: &[usize]) -> Option<&[f32]> {
        let (_, outer_shape) = self.shape.split_last()?;
        if index.len() != outer_shape.len() {
            return None;
        }
        let mut row = 0;
        for (i, dim) in index.iter().zip(outer_shape) {
            if i >= dim {
                return None;
            }
            row = row * dim + i;
        }
        let dim = self.inner_dim();
        Some(&self.data[row * dim..(row + 1) * dim])
    }
}

impl From<Vec<&str>> for Tensor<String> {
    fn from(keys: Vec<&str>) -> Self {
        Tensor::vector(keys.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_element_count() {
        assert!(Tensor::new(vec![2, 3], vec![0.0f32; 6]).is_ok());
        let err = Tensor::new(vec![2, 3], vec![0.0f32; 5]).unwrap_err();
        assert!(matches!(err, KnowledgeBankError::InvalidArgument(_)));
    }

    #[test]
    fn test_default_is_empty() {
        let t: Tensor<String> = Tensor::default();
        assert!(t.is_empty());
        assert_eq!(t.shape(), &[0]);
    }

    #[test]
    fn test_outer_and_inner() {
        let t = Tensor::new(vec![2, 3, 4], vec![0.0f32; 24]).unwrap();
        assert_eq!(t.outer_len(), 6);
        assert_eq!(t.inner_dim(), 4);
        assert_eq!(t.rows().count(), 6);

        let v = Tensor::vector(vec![1.0f32, 2.0]);
        assert_eq!(v.outer_len(), 1);
        assert_eq!(v.inner_dim(), 2);
    }

    #[test]
    fn test_row_major_indexing() {
        let t = Tensor::matrix(2, 3, vec!["a", "b", "c", "d", "e", "f"]).unwrap();
        assert_eq!(t.get(&[0, 2]), Some(&"c"));
        assert_eq!(t.get(&[1, 0]), Some(&"d"));
        assert_eq!(t.get(&[2, 0]), None);
        assert_eq!(t.get(&[0]), None);
    }

    #[test]
    fn test_row_slices() {
        let data: Vec<f32> = (0..12).map(|x| x as f32).collect();
        let t = Tensor::new(vec![2, 2, 3], data).unwrap();
        assert_eq!(t.row(&[0, 0]).unwrap(), &[0.0, 1.0, 2.0]);
        assert_eq!(t.row(&[1, 1]).unwrap(), &[9.0, 10.0, 11.0]);
        assert!(t.row(&[2, 0]).is_none());
    }

    #[test]
    fn test_zero_width_rows() {
        let t = Tensor::new(vec![3, 0], Vec::<f32>::new()).unwrap();
        assert_eq!(t.rows().count(), 0);
    }

    #[test]
    fn test_from_str_vec() {
        let t: Tensor<String> = vec!["a", ""].into();
        assert_eq!(t.shape(), &[2]);
        assert_eq!(t.data()[1], "");
    }
}
