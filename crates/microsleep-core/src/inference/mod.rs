//! ONNX inference backed by `candle-onnx`.
//!
//! Provides graph loading and evaluation for:
//! - the microsleep classifier (image + EAR inputs)
//! - `BlazeFace` short-range face detection
//! - `MediaPipe` face mesh landmarks

mod classifier;
mod face_detector;
mod face_mesh;
mod onnx;
mod utils;

#[cfg(test)]
mod test_graphs;

pub use classifier::OnnxClassifier;
pub use face_detector::{BlazeFaceDetector, FaceBox};
pub use face_mesh::{FaceMeshConfig, FaceMeshDetector};
pub use onnx::OnnxGraph;
pub use utils::{sigmoid, TensorLayout};
