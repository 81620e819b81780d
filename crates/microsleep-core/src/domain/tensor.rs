//! Engine-agnostic tensor values exchanged with the inference port.

/// Side length of the square classifier image input.
pub const IMAGE_SIZE: usize = 128;

/// Channels of the classifier image input (RGB).
pub const IMAGE_CHANNELS: usize = 3;

/// A dense row-major `f32` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl FloatTensor {
    /// Creates a tensor, checking that `data` fills `shape` exactly.
    ///
    /// # Errors
    ///
    /// Returns an error if the element count does not match the shape.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> anyhow::Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            anyhow::bail!(
                "tensor shape {shape:?} needs {expected} elements, got {}",
                data.len()
            );
        }
        Ok(Self { shape, data })
    }

    /// Creates a `(1, 1)` tensor holding a single value.
    #[must_use]
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: vec![1, 1],
            data: vec![value],
        }
    }

    /// Tensor dimensions.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat element buffer.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consumes the tensor, returning shape and data.
    #[must_use]
    pub fn into_parts(self) -> (Vec<usize>, Vec<f32>) {
        (self.shape, self.data)
    }
}

/// Normalized classifier image of shape `(1, 128, 128, 3)`, RGB, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor(FloatTensor);

impl ImageTensor {
    /// Shape of every image tensor.
    pub const SHAPE: [usize; 4] = [1, IMAGE_SIZE, IMAGE_SIZE, IMAGE_CHANNELS];

    /// Wraps pixel data laid out as `(1, 128, 128, 3)`.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` has the wrong length.
    pub fn from_rgb(data: Vec<f32>) -> anyhow::Result<Self> {
        FloatTensor::new(Self::SHAPE.to_vec(), data).map(Self)
    }

    /// Borrows the underlying tensor.
    #[must_use]
    pub const fn as_tensor(&self) -> &FloatTensor {
        &self.0
    }

    /// Unwraps the underlying tensor.
    #[must_use]
    pub fn into_tensor(self) -> FloatTensor {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(FloatTensor::new(vec![2, 3], vec![0.0; 6]).is_ok());
        assert!(FloatTensor::new(vec![2, 3], vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_scalar_shape() {
        let t = FloatTensor::scalar(1.5);
        assert_eq!(t.shape(), &[1, 1]);
        assert_eq!(t.data(), &[1.5]);
    }

    #[test]
    fn test_image_tensor_shape() {
        let t = ImageTensor::from_rgb(vec![0.0; IMAGE_SIZE * IMAGE_SIZE * IMAGE_CHANNELS]);
        assert!(t.is_ok_and(|t| t.as_tensor().shape() == [1, 128, 128, 3]));
        assert!(ImageTensor::from_rgb(vec![0.0; 10]).is_err());
    }
}
