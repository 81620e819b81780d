//! Test support utilities for microsleep.
//!
//! Provides fakes for the inference and landmark ports, synthetic image and
//! landmark builders, and mocks for batch input and output.
//!
//! # Example
//!
//! ```
//! use microsleep_test_support::{
//!     fake_predictor, FakeInferenceEngine, FakeLandmarkDetector, LandmarkBuilder,
//!     SyntheticImageBuilder,
//! };
//!
//! let predictor = fake_predictor(
//!     FakeInferenceEngine::image_first(0.9),
//!     FakeLandmarkDetector::found(LandmarkBuilder::closed_eyes()),
//! );
//! let result = predictor.predict(&SyntheticImageBuilder::uniform_gray(64, 64, 200));
//! assert!(result.is_ok());
//! ```

mod builders;
mod mocks;

pub use builders::{LandmarkBuilder, SyntheticImageBuilder};
pub use mocks::{
    fake_predictor, FakeInferenceEngine, FakeLandmarkDetector, MockImageSource,
    MockProgressSink, MockResultOutput, FAKE_SCALER,
};
