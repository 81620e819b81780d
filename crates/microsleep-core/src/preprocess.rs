//! Image preprocessing for the classifier's image input.

// Allow common image code patterns
#![allow(clippy::cast_possible_truncation)]

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

use crate::domain::{ImageTensor, PredictError, IMAGE_SIZE};

/// A decoded request image in both forms the pipeline needs.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Resized, normalized classifier input.
    pub tensor: ImageTensor,
    /// Decoded image at original resolution, used for landmark detection.
    pub original: DynamicImage,
}

/// Decodes `bytes` and builds the `(1, 128, 128, 3)` classifier tensor.
///
/// The container format is sniffed from the bytes. Pixels are converted to
/// RGB, resized with bilinear filtering and divided by 255.
///
/// # Errors
///
/// Returns [`PredictError::InvalidImage`] if the bytes cannot be decoded.
pub fn preprocess_image(bytes: &[u8]) -> Result<PreparedImage, PredictError> {
    let original =
        image::load_from_memory(bytes).map_err(|e| PredictError::InvalidImage(e.to_string()))?;

    if original.width() == 0 || original.height() == 0 {
        return Err(PredictError::InvalidImage("image has no pixels".to_string()));
    }

    debug!(
        width = original.width(),
        height = original.height(),
        "Decoded request image"
    );

    let tensor = image_tensor(&original)?;
    Ok(PreparedImage { tensor, original })
}

/// Builds the normalized classifier tensor from a decoded image.
///
/// # Errors
///
/// Returns [`PredictError::Internal`] if the tensor cannot be assembled.
pub fn image_tensor(image: &DynamicImage) -> Result<ImageTensor, PredictError> {
    let resized = image
        .resize_exact(IMAGE_SIZE as u32, IMAGE_SIZE as u32, FilterType::Triangle)
        .to_rgb8();

    let data: Vec<f32> = resized
        .pixels()
        .flat_map(|p| p.0.map(|c| f32::from(c) / 255.0))
        .collect();

    ImageTensor::from_rgb(data).map_err(|e| PredictError::Internal(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_tensor_shape_and_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(300, 200, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 255])
        }));
        let prepared = preprocess_image(&encode(&img, ImageFormat::Png)).unwrap();

        let tensor = prepared.tensor.as_tensor();
        assert_eq!(tensor.shape(), &[1, 128, 128, 3]);
        assert!(tensor.data().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(prepared.original.width(), 300);
        assert_eq!(prepared.original.height(), 200);
    }

    #[test]
    fn test_channel_order_is_rgb() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([255, 0, 51])));
        let prepared = preprocess_image(&encode(&img, ImageFormat::Png)).unwrap();

        let data = prepared.tensor.as_tensor().data();
        assert!((data[0] - 1.0).abs() < 1e-6);
        assert!(data[1].abs() < 1e-6);
        assert!((data[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_grayscale_expands_to_three_channels() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(128, 128, image::Luma([128])));
        let prepared = preprocess_image(&encode(&img, ImageFormat::Png)).unwrap();
        let data = prepared.tensor.as_tensor().data();
        assert_eq!(data.len(), 128 * 128 * 3);
        assert!(data.iter().all(|v| (v - 128.0 / 255.0).abs() < 1e-6));
    }

    #[test]
    fn test_jpeg_decodes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 48, Rgb([10, 20, 30])));
        let prepared = preprocess_image(&encode(&img, ImageFormat::Jpeg)).unwrap();
        assert_eq!(prepared.original.height(), 48);
    }

    #[test]
    fn test_garbage_is_invalid_image() {
        let err = preprocess_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PredictError::InvalidImage(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_truncated_png_is_invalid_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([1, 2, 3])));
        let bytes = encode(&img, ImageFormat::Png);
        let err = preprocess_image(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, PredictError::InvalidImage(_)));
    }

    #[test]
    fn test_empty_buffer_is_invalid_image() {
        assert!(matches!(
            preprocess_image(&[]),
            Err(PredictError::InvalidImage(_))
        ));
    }
}
