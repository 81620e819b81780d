//! Progress reporting port for batch prediction.

use crate::domain::PredictionRecord;

/// Events emitted during a batch run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Classification started for an image.
    Started {
        /// Path to the image.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Total images in batch, if known.
        total: Option<usize>,
    },
    /// A record was produced, successful or not.
    Completed {
        /// The written record.
        record: PredictionRecord,
    },
    /// An image could not be read and produced no record.
    Skipped {
        /// Path or position of the image.
        path: String,
        /// Reason for skipping.
        reason: String,
    },
    /// All images have been visited.
    Finished {
        /// Records written.
        processed: usize,
        /// Images skipped.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
