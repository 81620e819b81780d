//! End-to-end classification of one image.

use std::fmt;

use tracing::{debug, info, info_span, warn};

use crate::binding::{resolve_input_binding, validate_descriptors, InputBinding};
use crate::domain::{
    ClassifierInputDescriptor, FloatTensor, PredictError, PredictionResult, ScalerParameters, LEFT_EYE, RIGHT_EYE,
};
use crate::features::{average_eye_aspect_ratio, normalize};
use crate::ports::{InferenceEngine, LandmarkDetector};
use crate::preprocess::preprocess_image;

/// A fully loaded classifier, landmark detector and scaler.
///
/// Immutable after construction; safe to share across request workers.
pub struct MicrosleepPredictor {
    engine: Box<dyn InferenceEngine>,
    detector: Box<dyn LandmarkDetector>,
    scaler: ScalerParameters,
    binding: InputBinding,
}

impl fmt::Debug for MicrosleepPredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrosleepPredictor")
            .field("scaler", &self.scaler)
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl MicrosleepPredictor {
    /// Assembles a predictor, validating the scaler and the classifier's
    /// declared inputs and resolving the input binding once.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::Internal`] if the scaler cannot standardize
    /// values or the classifier inputs are malformed.
    pub fn new(
        engine: Box<dyn InferenceEngine>,
        detector: Box<dyn LandmarkDetector>,
        scaler: ScalerParameters,
    ) -> Result<Self, PredictError> {
        scaler.validate()?;

        let descriptors = engine.input_descriptors();
        validate_descriptors(descriptors)?;
        let binding = resolve_input_binding(descriptors);
        check_binding_shapes(descriptors, binding)?;
        info!(
            image_slot = binding.image_slot,
            ear_slot = binding.ear_slot,
            method = ?binding.method,
            "Resolved classifier input binding"
        );

        Ok(Self {
            engine,
            detector,
            scaler,
            binding,
        })
    }

    /// The binding decided at construction.
    #[must_use]
    pub const fn binding(&self) -> InputBinding {
        self.binding
    }

    /// The scaler applied to raw EAR values.
    #[must_use]
    pub const fn scaler(&self) -> ScalerParameters {
        self.scaler
    }

    /// Classifies one encoded image.
    ///
    /// # Errors
    ///
    /// - [`PredictError::InvalidImage`] if the bytes do not decode
    /// - [`PredictError::NoFaceDetected`] if no landmarks or no valid EAR
    /// - [`PredictError::Internal`] on scaling, shape or engine failures
    pub fn predict(&self, bytes: &[u8]) -> Result<PredictionResult, PredictError> {
        let _span = info_span!("predict", bytes = bytes.len()).entered();

        let prepared = preprocess_image(bytes)?;

        let landmarks = self
            .detector
            .detect_landmarks(&prepared.original)
            .map_err(|e| PredictError::Internal(format!("landmark detection failed: {e:#}")))?
            .ok_or(PredictError::NoFaceDetected)?;
        debug!(landmarks = landmarks.len(), "Landmarks detected");

        let ear = average_eye_aspect_ratio(&landmarks, &LEFT_EYE, &RIGHT_EYE).map_err(|e| {
            debug!(error = %e, "EAR computation failed");
            PredictError::from(e)
        })?;
        let scaled = normalize(ear, &self.scaler)?;
        debug!(ear, scaled, "Computed EAR feature");

        let inputs = self.bind_inputs(prepared.tensor.into_tensor(), FloatTensor::scalar(scaled))?;
        let outputs = self
            .engine
            .run(&inputs)
            .map_err(|e| PredictError::Internal(format!("classifier failed: {e:#}")))?;

        let score = outputs
            .first()
            .and_then(|t| t.data().first())
            .copied()
            .ok_or_else(|| PredictError::Internal("classifier returned no output".to_string()))?;
        if !score.is_finite() {
            return Err(PredictError::Internal(format!(
                "classifier returned non-finite score {score}"
            )));
        }

        let result = PredictionResult::from_score(score, ear);
        debug!(score, label = result.label.as_str(), "Classification complete");
        Ok(result)
    }

    /// Places the tensors into slot order and checks each against its
    /// declared shape and type.
    fn bind_inputs(
        &self,
        image: FloatTensor,
        ear: FloatTensor,
    ) -> Result<Vec<FloatTensor>, PredictError> {
        let mut slots: [Option<FloatTensor>; 2] = [None, None];
        slots[self.binding.image_slot] = Some(image);
        slots[self.binding.ear_slot] = Some(ear);

        let descriptors = self.engine.input_descriptors();
        slots
            .into_iter()
            .enumerate()
            .map(|(slot, tensor)| {
                let tensor = tensor
                    .ok_or_else(|| PredictError::Internal(format!("input slot {slot} unbound")))?;
                let descriptor = descriptors
                    .iter()
                    .find(|d| d.index == slot)
                    .ok_or_else(|| {
                        PredictError::Internal(format!("no descriptor for input slot {slot}"))
                    })?;
                descriptor
                    .check_compatible(&tensor)
                    .map_err(PredictError::Internal)?;
                Ok(tensor)
            })
            .collect()
    }
}

/// Rejects a binding whose image slot is not rank 4 or whose EAR slot is
/// not rank 2.
fn check_binding_shapes(
    descriptors: &[ClassifierInputDescriptor],
    binding: InputBinding,
) -> Result<(), PredictError> {
    let slot = |index: usize| descriptors.iter().find(|d| d.index == index);
    let image_ok = slot(binding.image_slot).is_some_and(ClassifierInputDescriptor::is_image_shaped);
    let ear_ok = slot(binding.ear_slot).is_some_and(ClassifierInputDescriptor::is_scalar_shaped);
    if image_ok && ear_ok {
        return Ok(());
    }
    Err(PredictError::Internal(format!(
        "binding {:?} puts image in slot {} and EAR in slot {}, which contradicts the declared shapes",
        binding.method, binding.image_slot, binding.ear_slot
    )))
}

/// Readiness of the prediction service.
///
/// Model loading happens once at startup. A failure leaves the service
/// running but answering every request with [`PredictError::NotReady`].
#[derive(Debug)]
pub enum MicrosleepService {
    /// All models loaded.
    Ready(MicrosleepPredictor),
    /// Loading failed for the given reason.
    NotReady(String),
}

impl MicrosleepService {
    /// Builds a service from the outcome of loading, logging any failure.
    pub fn from_load<E: fmt::Display>(loaded: Result<MicrosleepPredictor, E>) -> Self {
        match loaded {
            Ok(predictor) => Self::Ready(predictor),
            Err(e) => {
                let reason = e.to_string();
                warn!(%reason, "Prediction service not ready");
                Self::NotReady(reason)
            }
        }
    }

    /// Returns true if requests can be served.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Why the service is not ready, if it isn't.
    #[must_use]
    pub fn not_ready_reason(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::NotReady(reason) => Some(reason),
        }
    }

    /// Classifies one encoded image.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::NotReady`] if loading failed, otherwise the
    /// predictor's error.
    pub fn predict(&self, bytes: &[u8]) -> Result<PredictionResult, PredictError> {
        match self {
            Self::Ready(predictor) => predictor.predict(bytes),
            Self::NotReady(reason) => Err(PredictError::NotReady(reason.clone())),
        }
    }
}
