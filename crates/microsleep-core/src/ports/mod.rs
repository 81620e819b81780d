//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod image_source;
mod inference_engine;
mod landmark_detector;
mod progress;
mod result_output;

pub use image_source::{ImageInput, ImageSource};
pub use inference_engine::InferenceEngine;
pub use landmark_detector::LandmarkDetector;
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::ResultOutput;
