//! Synthetic images and landmark sets.

// Allow common test-fixture patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use microsleep_core::domain::{LandmarkSet, Point, FACE_MESH_LANDMARK_COUNT, LEFT_EYE, RIGHT_EYE};
use microsleep_core::ImageInput;

/// Builder for encoded synthetic test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Encodes an image in the given format.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails, which does not happen for in-memory buffers.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .expect("in-memory encoding should succeed");
        bytes
    }

    /// PNG of a uniform gray image.
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([value]));
        Self::encode(&DynamicImage::ImageLuma8(img), ImageFormat::Png)
    }

    /// PNG of a uniform RGB image.
    #[must_use]
    pub fn rgb_uniform(width: u32, height: u32, r: u8, g: u8, b: u8) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([r, g, b]));
        Self::encode(&DynamicImage::ImageRgb8(img), ImageFormat::Png)
    }

    /// JPEG checkerboard with 8px cells.
    #[must_use]
    pub fn checkerboard_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            if ((x / 8) + (y / 8)) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        Self::encode(&DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
    }

    /// Bytes that no image decoder accepts.
    #[must_use]
    pub fn corrupt() -> Vec<u8> {
        b"definitely not an image".to_vec()
    }

    /// A PNG cut off after its header.
    #[must_use]
    pub fn truncated_png() -> Vec<u8> {
        let mut bytes = Self::uniform_gray(16, 16, 128);
        bytes.truncate(24);
        bytes
    }

    /// Wraps bytes as a batch input.
    #[must_use]
    pub fn input(path: &str, bytes: Vec<u8>) -> ImageInput {
        ImageInput {
            path: path.to_string(),
            bytes,
        }
    }
}

/// Builder for face-mesh landmark sets with controlled eye geometry.
pub struct LandmarkBuilder;

impl LandmarkBuilder {
    /// Eye width in pixels.
    const EYE_WIDTH: f32 = 20.0;

    /// A full 468-point set where both eyes have the given aspect ratio.
    #[must_use]
    pub fn with_ear(ear: f32) -> LandmarkSet {
        let mut points = vec![Point::new(0.0, 0.0); FACE_MESH_LANDMARK_COUNT];
        let half_gap = ear * Self::EYE_WIDTH / 2.0;

        for (eye, x0) in [(LEFT_EYE, 120.0), (RIGHT_EYE, 60.0)] {
            let [p1, p2, p3, p4, p5, p6] = *eye.indices();
            let y = 100.0;
            points[p1] = Point::new(x0, y);
            points[p2] = Point::new(x0 + 6.0, y - half_gap);
            points[p3] = Point::new(x0 + 14.0, y - half_gap);
            points[p4] = Point::new(x0 + Self::EYE_WIDTH, y);
            points[p5] = Point::new(x0 + 14.0, y + half_gap);
            points[p6] = Point::new(x0 + 6.0, y + half_gap);
        }

        LandmarkSet::new(points)
    }

    /// Typical open eyes (EAR 0.3).
    #[must_use]
    pub fn open_eyes() -> LandmarkSet {
        Self::with_ear(0.3)
    }

    /// Nearly closed eyes (EAR 0.05).
    #[must_use]
    pub fn closed_eyes() -> LandmarkSet {
        Self::with_ear(0.05)
    }

    /// A set too short to contain the eye indices.
    #[must_use]
    pub fn truncated(len: usize) -> LandmarkSet {
        LandmarkSet::new(vec![Point::new(1.0, 1.0); len])
    }

    /// A full set where every point coincides, so no EAR exists.
    #[must_use]
    pub fn collapsed() -> LandmarkSet {
        LandmarkSet::new(vec![Point::new(5.0, 5.0); FACE_MESH_LANDMARK_COUNT])
    }
}
