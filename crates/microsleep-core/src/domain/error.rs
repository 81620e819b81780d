//! Failure taxonomy for the classification pipeline.

use thiserror::Error;

/// Failures while deriving the EAR feature.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// The detector returned fewer landmarks than the eye indices require.
    #[error("landmark index {index} out of range for {len} landmarks")]
    LandmarkOutOfRange {
        /// Requested index.
        index: usize,
        /// Landmarks available.
        len: usize,
    },
    /// Eye corners coincide, so the aspect ratio is undefined.
    #[error("degenerate eye: corner-to-corner distance is zero")]
    DegenerateEye,
    /// Scaler statistics cannot standardize a value.
    #[error("invalid scaler parameters: {0}")]
    InvalidScaler(String),
}

/// Request-level failure, mapped one-to-one onto a client-visible status.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// Classifier, detector or scaler failed to load at startup.
    #[error("model or scaler not loaded: {0}")]
    NotReady(String),
    /// Input bytes are not a decodable image.
    #[error("cannot decode image: {0}")]
    InvalidImage(String),
    /// Image decoded, but no usable face landmarks were found.
    #[error("no face detected or EAR could not be computed")]
    NoFaceDetected,
    /// Unexpected numeric or engine failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PredictError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotReady(_) => "not_ready",
            Self::InvalidImage(_) => "invalid_image",
            Self::NoFaceDetected => "no_face_detected",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP-style status code.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidImage(_) | Self::NoFaceDetected => 400,
            Self::NotReady(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<FeatureError> for PredictError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::LandmarkOutOfRange { .. } | FeatureError::DegenerateEye => {
                Self::NoFaceDetected
            }
            FeatureError::InvalidScaler(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PredictError::InvalidImage("x".into()).status_code(), 400);
        assert_eq!(PredictError::NoFaceDetected.status_code(), 400);
        assert_eq!(PredictError::NotReady("x".into()).status_code(), 500);
        assert_eq!(PredictError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_degenerate_eye_reads_as_no_face() {
        let err: PredictError = FeatureError::DegenerateEye.into();
        assert_eq!(err, PredictError::NoFaceDetected);

        let err: PredictError = FeatureError::LandmarkOutOfRange { index: 400, len: 10 }.into();
        assert_eq!(err.kind(), "no_face_detected");
    }

    #[test]
    fn test_bad_scaler_is_internal() {
        let err: PredictError = FeatureError::InvalidScaler("zero".into()).into();
        assert_eq!(err.kind(), "internal");
        assert_eq!(err.status_code(), 500);
    }
}
