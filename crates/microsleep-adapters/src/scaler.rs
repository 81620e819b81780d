//! Scaler parameter file loading.
//!
//! The file is the JSON dump of a fitted single-feature standard scaler:
//!
//! ```json
//! {"mean": [0.27], "std": [0.06]}
//! ```
//!
//! `scale` is accepted in place of `std`, and bare numbers in place of
//! one-element arrays.

use std::path::Path;

use anyhow::{Context, Result};
use microsleep_core::ScalerParameters;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ScalerFile {
    mean: Statistic,
    #[serde(alias = "scale")]
    std: Statistic,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Statistic {
    Scalar(f32),
    PerFeature(Vec<f32>),
}

impl Statistic {
    /// The first feature's value; the EAR is the only scaled feature.
    fn first(self, field: &str) -> Result<f32> {
        match self {
            Self::Scalar(value) => Ok(value),
            Self::PerFeature(values) => {
                if values.len() > 1 {
                    warn!(
                        field,
                        count = values.len(),
                        "Scaler has more than one feature, using the first"
                    );
                }
                values
                    .first()
                    .copied()
                    .with_context(|| format!("scaler '{field}' is empty"))
            }
        }
    }
}

/// Parses scaler parameters from JSON text.
///
/// # Errors
///
/// Returns an error if the JSON is malformed, a field is missing or empty,
/// or the parameters cannot standardize values.
pub fn parse_scaler(json: &str) -> Result<ScalerParameters> {
    let file: ScalerFile = serde_json::from_str(json).context("Invalid scaler JSON")?;
    let params = ScalerParameters::new(file.mean.first("mean")?, file.std.first("std")?);
    params.validate()?;
    Ok(params)
}

/// Loads and validates scaler parameters from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails [`parse_scaler`].
pub fn load_scaler(path: impl AsRef<Path>) -> Result<ScalerParameters> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scaler file: {}", path.display()))?;
    let params =
        parse_scaler(&json).with_context(|| format!("Invalid scaler file: {}", path.display()))?;

    debug!(mean = params.mean, std = params.std, "Loaded scaler");
    Ok(params)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arrays() {
        let params = parse_scaler(r#"{"mean": [0.27], "std": [0.06]}"#).unwrap();
        assert!((params.mean - 0.27).abs() < 1e-6);
        assert!((params.std - 0.06).abs() < 1e-6);
    }

    #[test]
    fn test_parse_scale_alias_and_scalars() {
        let params = parse_scaler(r#"{"mean": 0.3, "scale": 0.05}"#).unwrap();
        assert!((params.mean - 0.3).abs() < 1e-6);
        assert!((params.std - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_parse_uses_first_feature() {
        let params = parse_scaler(r#"{"mean": [0.2, 9.0], "std": [0.1, 9.0]}"#).unwrap();
        assert!((params.mean - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_zero_std_rejected() {
        let err = parse_scaler(r#"{"mean": [0.27], "std": [0.0]}"#).unwrap_err();
        assert!(err.to_string().contains("scaler"));
    }

    #[test]
    fn test_missing_and_empty_fields_rejected() {
        assert!(parse_scaler(r#"{"mean": [0.27]}"#).is_err());
        assert!(parse_scaler(r#"{"mean": [], "std": [0.1]}"#).is_err());
        assert!(parse_scaler("not json").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_scaler("/nonexistent/ear_scaler_params.json").unwrap_err();
        assert!(format!("{err:#}").contains("ear_scaler_params.json"));
    }
}
