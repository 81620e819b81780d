//! Persisted standardization statistics for the EAR feature.

use serde::{Deserialize, Serialize};

use super::FeatureError;

/// Mean and standard deviation of the training-set EAR distribution.
///
/// Loaded once at startup and shared read-only for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParameters {
    /// Feature mean.
    pub mean: f32,
    /// Feature standard deviation.
    pub std: f32,
}

impl ScalerParameters {
    /// Creates scaler parameters without validation.
    #[must_use]
    pub const fn new(mean: f32, std: f32) -> Self {
        Self { mean, std }
    }

    /// Checks that the parameters can standardize a value.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::InvalidScaler`] if either value is not finite
    /// or the standard deviation is zero.
    pub fn validate(&self) -> Result<(), FeatureError> {
        if !self.mean.is_finite() || !self.std.is_finite() {
            return Err(FeatureError::InvalidScaler(format!(
                "non-finite parameters (mean={}, std={})",
                self.mean, self.std
            )));
        }
        if self.std == 0.0 {
            return Err(FeatureError::InvalidScaler(
                "standard deviation is zero".to_string(),
            ));
        }
        Ok(())
    }
}
