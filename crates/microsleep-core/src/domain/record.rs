//! Batch prediction record types.

use serde::{Deserialize, Serialize};

use super::{PredictError, PredictionResult};

/// Outcome of classifying one image from a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Path of the classified image.
    pub path: String,
    /// Timestamp of classification (ISO 8601).
    pub timestamp: String,
    /// Success or failure payload, flattened into the record.
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

/// Per-image outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordOutcome {
    /// Classification succeeded.
    Prediction(PredictionResult),
    /// Classification failed.
    Failure(FailureDetails),
}

/// Serializable view of a [`PredictError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetails {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable kind.
    pub kind: String,
    /// HTTP-style status code.
    pub status: u16,
}

impl From<&PredictError> for FailureDetails {
    fn from(err: &PredictError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
            status: err.status_code(),
        }
    }
}

impl PredictionRecord {
    /// Builds a record from a pipeline result.
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        timestamp: impl Into<String>,
        result: &Result<PredictionResult, PredictError>,
    ) -> Self {
        let outcome = match result {
            Ok(prediction) => RecordOutcome::Prediction(*prediction),
            Err(err) => RecordOutcome::Failure(err.into()),
        };
        Self {
            path: path.into(),
            timestamp: timestamp.into(),
            outcome,
        }
    }
}
