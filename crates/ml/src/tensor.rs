/// A dense row-major tensor of `f32` values.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl Tensor {
    /// Creates a tensor from a flat vector and a shape.
    ///
    /// Panics if the shape does not describe exactly `data.len()` elements.
    pub fn from_vec(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { data, shape }
    }

    /// Creates a zero-filled tensor of the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            data: vec![0.0; len],
            shape,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of rows of a `[n, d]` batch tensor.
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Number of columns of a `[n, d]` batch tensor.
    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    /// Borrow row `i` of a `[n, d]` batch tensor.
    pub fn row(&self, i: usize) -> &[f32] {
        let d = self.cols();
        &self.data[i * d..(i + 1) * d]
    }
}
