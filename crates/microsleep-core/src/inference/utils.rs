//! Shared inference utilities.

use image::RgbImage;

use crate::domain::FloatTensor;

/// Sigmoid activation function.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Memory layout of a rank-4 image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `(batch, height, width, channels)`
    Nhwc,
    /// `(batch, channels, height, width)`
    Nchw,
}

impl TensorLayout {
    /// Infers the layout from a declared input shape.
    ///
    /// A known size of 3 on axis 1 means channels-first; anything else is
    /// treated as channels-last.
    #[must_use]
    pub fn from_declared(shape: &[Option<usize>]) -> Self {
        match shape.get(1) {
            Some(Some(3)) if shape.len() == 4 => Self::Nchw,
            _ => Self::Nhwc,
        }
    }

    /// Packs an RGB image into a batch-of-one tensor, mapping each channel
    /// value through `scale`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor cannot be assembled.
    pub fn pack(self, rgb: &RgbImage, scale: impl Fn(u8) -> f32) -> anyhow::Result<FloatTensor> {
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let plane = width * height;
        let mut data = vec![0.0_f32; plane * 3];

        for (i, pixel) in rgb.pixels().enumerate() {
            for c in 0..3 {
                let value = scale(pixel[c]);
                match self {
                    Self::Nhwc => data[i * 3 + c] = value,
                    Self::Nchw => data[c * plane + i] = value,
                }
            }
        }

        let shape = match self {
            Self::Nhwc => vec![1, height, width, 3],
            Self::Nchw => vec![1, 3, height, width],
        };
        FloatTensor::new(shape, data)
    }
}
