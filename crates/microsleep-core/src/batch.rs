//! Batch classification over an image source.

use tracing::{debug, info, warn};

use crate::domain::{Label, PredictionRecord, RecordOutcome};
use crate::pipeline::MicrosleepService;
use crate::ports::{ImageSource, ProgressEvent, ProgressSink, ResultOutput};

/// Counts from a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Records written.
    pub processed: usize,
    /// Images that could not be read.
    pub skipped: usize,
    /// Records labeled MICROSLEEP.
    pub microsleep: usize,
    /// Records carrying an error.
    pub failed: usize,
}

impl BatchSummary {
    /// Returns true if any image was skipped or failed.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.skipped > 0 || self.failed > 0
    }
}

/// Classifies every image from `source`, writing one record per readable
/// image and flushing `output` at the end.
///
/// `timestamp` is called once per record.
///
/// # Errors
///
/// Returns an error only if writing or flushing output fails; per-image
/// failures are recorded, not propagated.
pub fn predict_batch(
    source: &dyn ImageSource,
    service: &MicrosleepService,
    output: &dyn ResultOutput,
    progress: &dyn ProgressSink,
    timestamp: &dyn Fn() -> String,
) -> anyhow::Result<BatchSummary> {
    let total = source.count_hint();
    let mut summary = BatchSummary::default();
    info!("Classifying {} images", total.map_or_else(|| "?".to_string(), |t| t.to_string()));

    for (index, item) in source.images().enumerate() {
        let input = match item {
            Ok(input) => input,
            Err(e) => {
                warn!("Skipping image {index}: {e:#}");
                progress.on_event(ProgressEvent::Skipped {
                    path: format!("image {index}"),
                    reason: format!("{e:#}"),
                });
                summary.skipped += 1;
                continue;
            }
        };

        progress.on_event(ProgressEvent::Started {
            path: input.path.clone(),
            index,
            total,
        });

        let result = service.predict(&input.bytes);
        if let Err(e) = &result {
            debug!(path = %input.path, kind = e.kind(), "Prediction failed: {e}");
        }
        let record = PredictionRecord::new(input.path, timestamp(), &result);

        match &record.outcome {
            RecordOutcome::Prediction(p) if p.label == Label::Microsleep => summary.microsleep += 1,
            RecordOutcome::Prediction(_) => {}
            RecordOutcome::Failure(_) => summary.failed += 1,
        }

        output.write(&record)?;
        summary.processed += 1;
        progress.on_event(ProgressEvent::Completed { record });
    }

    output.flush()?;
    progress.on_event(ProgressEvent::Finished {
        processed: summary.processed,
        skipped: summary.skipped,
    });

    Ok(summary)
}
