//! Eye aspect ratio (EAR) from face landmarks.
//!
//! For six ordered eye points `p0..p5`:
//!
//! ```text
//! EAR = (|p1 - p5| + |p2 - p4|) / (2 * |p0 - p3|)
//! ```
//!
//! Open eyes sit around 0.25-0.35; closed eyes approach zero.

use crate::domain::{EyeLandmarkIndices, FeatureError, LandmarkSet, Point};

/// Selects one eye's six points from a landmark set.
///
/// # Errors
///
/// Returns [`FeatureError::LandmarkOutOfRange`] if the set is too short.
pub fn eye_points(
    landmarks: &LandmarkSet,
    eye: &EyeLandmarkIndices,
) -> Result<[Point; 6], FeatureError> {
    let mut points = [Point::new(0.0, 0.0); 6];
    for (slot, &index) in points.iter_mut().zip(eye.indices()) {
        *slot = landmarks
            .get(index)
            .ok_or(FeatureError::LandmarkOutOfRange {
                index,
                len: landmarks.len(),
            })?;
    }
    Ok(points)
}

/// Computes the aspect ratio of a single eye.
///
/// # Errors
///
/// Returns [`FeatureError::DegenerateEye`] when the corner distance is zero
/// or the ratio is not finite.
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> Result<f32, FeatureError> {
    let a = eye[1].distance(eye[5]);
    let b = eye[2].distance(eye[4]);
    let c = eye[0].distance(eye[3]);

    if c <= 0.0 || !c.is_finite() {
        return Err(FeatureError::DegenerateEye);
    }

    let ear = (a + b) / (2.0 * c);
    if ear.is_finite() {
        Ok(ear)
    } else {
        Err(FeatureError::DegenerateEye)
    }
}

/// Mean EAR of the left and right eye.
///
/// # Errors
///
/// Propagates index and degeneracy errors from either eye.
pub fn average_eye_aspect_ratio(
    landmarks: &LandmarkSet,
    left: &EyeLandmarkIndices,
    right: &EyeLandmarkIndices,
) -> Result<f32, FeatureError> {
    let left_ear = eye_aspect_ratio(&eye_points(landmarks, left)?)?;
    let right_ear = eye_aspect_ratio(&eye_points(landmarks, right)?)?;
    Ok((left_ear + right_ear) / 2.0)
}
