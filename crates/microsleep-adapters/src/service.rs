//! Startup loading of the prediction service from a model store.

use anyhow::Result;
use microsleep_core::inference::{FaceMeshConfig, FaceMeshDetector, OnnxClassifier};
use microsleep_core::{MicrosleepPredictor, MicrosleepService};
use tracing::info;

use crate::models::{ModelStore, CLASSIFIER, FACE_DETECTOR, FACE_LANDMARKS, SCALER};
use crate::scaler::load_scaler;

/// Loads every artifact and assembles a predictor.
///
/// # Errors
///
/// Returns an error if any artifact is missing or fails to load, or if the
/// classifier's declared inputs are malformed.
pub fn load_predictor(store: &ModelStore, detector: FaceMeshConfig) -> Result<MicrosleepPredictor> {
    info!("Loading models from {}", store.dir().display());

    let scaler = load_scaler(store.require(SCALER)?)?;
    let classifier = OnnxClassifier::load(store.require(CLASSIFIER)?)?;
    let landmarks = FaceMeshDetector::load(
        store.require(FACE_DETECTOR)?,
        store.require(FACE_LANDMARKS)?,
        detector,
    )?;

    let predictor = MicrosleepPredictor::new(Box::new(classifier), Box::new(landmarks), scaler)?;
    info!("Models loaded");
    Ok(predictor)
}

/// Loads the service, degrading to not-ready instead of failing.
#[must_use]
pub fn load_service(store: &ModelStore, detector: FaceMeshConfig) -> MicrosleepService {
    MicrosleepService::from_load(load_predictor(store, detector).map_err(|e| format!("{e:#}")))
}
