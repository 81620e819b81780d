//! Standardization of the raw EAR with persisted statistics.

use crate::domain::{FeatureError, ScalerParameters};

/// Standardizes `raw` as `(raw - mean) / std`.
///
/// # Errors
///
/// Returns [`FeatureError::InvalidScaler`] for a zero or non-finite deviation.
pub fn normalize(raw: f32, params: &ScalerParameters) -> Result<f32, FeatureError> {
    params.validate()?;
    Ok((raw - params.mean) / params.std)
}

/// Inverse of [`normalize`].
#[must_use]
pub fn denormalize(scaled: f32, params: &ScalerParameters) -> f32 {
    scaled.mul_add(params.std, params.mean)
}
