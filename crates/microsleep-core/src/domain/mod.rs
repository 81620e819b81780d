//! Core domain types for microsleep classification.

mod descriptor;
mod error;
mod landmarks;
mod prediction;
mod record;
mod scaler;
mod tensor;

pub use descriptor::{ClassifierInputDescriptor, ElementType};
pub use error::{FeatureError, PredictError};
pub use landmarks::{
    EyeLandmarkIndices, LandmarkSet, Point, FACE_MESH_LANDMARK_COUNT, LEFT_EYE, RIGHT_EYE,
};
pub use prediction::{Label, PredictionResult, DECISION_THRESHOLD};
pub use record::{FailureDetails, PredictionRecord, RecordOutcome};
pub use scaler::ScalerParameters;
pub use tensor::{FloatTensor, ImageTensor, IMAGE_CHANNELS, IMAGE_SIZE};
