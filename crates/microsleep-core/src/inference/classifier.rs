//! Microsleep classifier graph.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use super::OnnxGraph;
use crate::domain::{ClassifierInputDescriptor, FloatTensor};
use crate::ports::InferenceEngine;

/// The two-input drowsiness classifier loaded from an ONNX file.
pub struct OnnxClassifier {
    graph: OnnxGraph,
}

impl OnnxClassifier {
    /// Loads the classifier and logs its declared inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let graph = OnnxGraph::load(path)?;
        for input in graph.inputs() {
            info!(
                index = input.index,
                name = %input.name,
                shape = ?input.shape,
                dtype = %input.element_type,
                "classifier input"
            );
        }
        Ok(Self { graph })
    }

    /// Wraps an already-loaded graph.
    #[must_use]
    pub const fn from_graph(graph: OnnxGraph) -> Self {
        Self { graph }
    }
}

impl InferenceEngine for OnnxClassifier {
    fn input_descriptors(&self) -> &[ClassifierInputDescriptor] {
        self.graph.inputs()
    }

    fn run(&self, inputs: &[FloatTensor]) -> Result<Vec<FloatTensor>> {
        self.graph.run(inputs)
    }
}
