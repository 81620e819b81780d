//! Classifier capability port.

use crate::domain::{ClassifierInputDescriptor, FloatTensor};

/// A loaded classifier graph that can be invoked synchronously.
///
/// Implementations are shared across request workers and must tolerate
/// concurrent `run` calls, serializing internally if the engine cannot.
pub trait InferenceEngine: Send + Sync {
    /// Declared input slots, fixed for the lifetime of the loaded graph.
    fn input_descriptors(&self) -> &[ClassifierInputDescriptor];

    /// Runs the graph with `inputs[i]` bound to slot `i`.
    ///
    /// Returns output tensors in declared output order.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or execution fails.
    fn run(&self, inputs: &[FloatTensor]) -> anyhow::Result<Vec<FloatTensor>>;
}
