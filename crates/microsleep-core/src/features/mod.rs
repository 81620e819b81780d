//! Feature extraction and standardization.

mod ear;
mod normalize;

pub use ear::{average_eye_aspect_ratio, eye_aspect_ratio, eye_points};
pub use normalize::{denormalize, normalize};
