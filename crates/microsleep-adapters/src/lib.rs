//! Microsleep Adapters - External adapters for microsleep.
//!
//! This crate provides adapters for:
//! - Filesystem image source
//! - Scaler parameter files
//! - Model store (location, listing, downloading)
//! - Service loading from the model store

pub mod fs;
pub mod models;
pub mod scaler;
pub mod service;

pub use fs::FsImageSource;
pub use models::{default_models_dir, FetchEvent, ModelInfo, ModelStore, MODELS};
pub use scaler::{load_scaler, parse_scaler};
pub use service::{load_predictor, load_service};
