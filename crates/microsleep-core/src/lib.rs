//! Microsleep Core - Domain logic and classification pipeline
//!
//! This crate contains the core domain types, the EAR feature computation,
//! classifier input binding, ONNX inference, and the end-to-end predictor.

pub mod batch;
pub mod binding;
pub mod domain;
pub mod features;
pub mod inference;
pub mod pipeline;
pub mod ports;
pub mod preprocess;

pub use batch::{predict_batch, BatchSummary};
pub use binding::{resolve_input_binding, BindingMethod, InputBinding};
pub use domain::{
    ClassifierInputDescriptor, FloatTensor, Label, LandmarkSet, PredictError, PredictionRecord,
    PredictionResult, ScalerParameters,
};
pub use pipeline::{MicrosleepPredictor, MicrosleepService};
pub use ports::{
    ImageInput, ImageSource, InferenceEngine, LandmarkDetector, ProgressEvent, ProgressSink,
    ResultOutput,
};
