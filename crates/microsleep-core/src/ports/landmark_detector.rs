//! Face landmark capability port.

use image::DynamicImage;

use crate::domain::LandmarkSet;

/// Detects facial landmarks on a full-resolution image.
pub trait LandmarkDetector: Send + Sync {
    /// Returns landmarks of the most prominent face in pixel coordinates,
    /// or `None` if no face was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying model fails to run.
    fn detect_landmarks(&self, image: &DynamicImage) -> anyhow::Result<Option<LandmarkSet>>;
}
