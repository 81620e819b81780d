//! Classification output types.

use serde::{Deserialize, Serialize};

/// Scores strictly above this value are labeled [`Label::Microsleep`].
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Binary drowsiness label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    /// Eyes open, driver alert.
    Normal,
    /// Drowsy or closed-eye state.
    Microsleep,
}

impl Label {
    /// Maps a classifier score to a label. The threshold is exclusive.
    #[must_use]
    pub fn from_score(score: f32) -> Self {
        if score > DECISION_THRESHOLD {
            Self::Microsleep
        } else {
            Self::Normal
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Microsleep => "MICROSLEEP",
        }
    }
}

/// Result of classifying one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Raw classifier output, nominally in `[0, 1]`.
    #[serde(rename = "prediction")]
    pub raw_score: f32,
    /// Decision derived from `raw_score`.
    pub label: Label,
    /// Unscaled eye aspect ratio averaged over both eyes.
    pub ear_value: f32,
}

impl PredictionResult {
    /// Packages a score and EAR into a result.
    #[must_use]
    pub fn from_score(raw_score: f32, ear_value: f32) -> Self {
        Self {
            raw_score,
            label: Label::from_score(raw_score),
            ear_value,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_exclusive() {
        assert_eq!(Label::from_score(0.5), Label::Normal);
        assert_eq!(Label::from_score(0.500_001), Label::Microsleep);
        assert_eq!(Label::from_score(0.0), Label::Normal);
        assert_eq!(Label::from_score(1.0), Label::Microsleep);
    }

    #[test]
    fn test_label_wire_names() {
        assert_eq!(serde_json::to_string(&Label::Normal).unwrap(), "\"NORMAL\"");
        assert_eq!(
            serde_json::to_string(&Label::Microsleep).unwrap(),
            "\"MICROSLEEP\""
        );
        assert_eq!(Label::Microsleep.as_str(), "MICROSLEEP");
    }

    #[test]
    fn test_result_json_fields() {
        let result = PredictionResult::from_score(0.75, 0.21);
        let json: serde_json::Value = serde_json::to_value(result).unwrap();
        assert_eq!(json["label"], "MICROSLEEP");
        assert!((json["prediction"].as_f64().unwrap() - 0.75).abs() < 1e-6);
        assert!((json["ear_value"].as_f64().unwrap() - 0.21).abs() < 1e-6);
    }
}
