//! Fake and mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use image::DynamicImage;
use microsleep_core::domain::{
    ClassifierInputDescriptor, ElementType, FloatTensor, LandmarkSet, PredictionRecord,
    ScalerParameters,
};
use microsleep_core::ports::{
    ImageInput, ImageSource, InferenceEngine, LandmarkDetector, ProgressEvent, ProgressSink,
    ResultOutput,
};
use microsleep_core::MicrosleepPredictor;

/// Scaler used by [`fake_predictor`].
pub const FAKE_SCALER: ScalerParameters = ScalerParameters::new(0.25, 0.05);

/// Declared shape of a batched 128x128 RGB input.
fn image_shape() -> Vec<Option<usize>> {
    vec![None, Some(128), Some(128), Some(3)]
}

/// Declared shape of a batched scalar input.
fn scalar_shape() -> Vec<Option<usize>> {
    vec![None, Some(1)]
}

/// Fake classifier engine.
///
/// Declares two inputs and returns a fixed score, recording every call.
pub struct FakeInferenceEngine {
    descriptors: Vec<ClassifierInputDescriptor>,
    outputs: Result<Vec<FloatTensor>, String>,
    calls: Arc<Mutex<Vec<Vec<FloatTensor>>>>,
}

impl FakeInferenceEngine {
    /// Image input at slot 0 named `img_input`, EAR at slot 1 named `ear_input`.
    #[must_use]
    pub fn image_first(score: f32) -> Self {
        Self::with_names(["img_input", "ear_input"], true, score)
    }

    /// EAR input at slot 0, as some graph conversions emit it.
    #[must_use]
    pub fn ear_first(score: f32) -> Self {
        Self::with_names(
            ["serving_default_ear_input:0", "serving_default_img_input:0"],
            false,
            score,
        )
    }

    /// Custom slot names; `image_first` decides which slot is rank 4.
    #[must_use]
    pub fn with_names(names: [&str; 2], image_first: bool, score: f32) -> Self {
        let (first_shape, second_shape) = if image_first {
            (image_shape(), scalar_shape())
        } else {
            (scalar_shape(), image_shape())
        };
        Self::with_descriptors(
            vec![
                ClassifierInputDescriptor::new(0, names[0], first_shape, ElementType::F32),
                ClassifierInputDescriptor::new(1, names[1], second_shape, ElementType::F32),
            ],
            score,
        )
    }

    /// Arbitrary declared inputs.
    #[must_use]
    pub fn with_descriptors(descriptors: Vec<ClassifierInputDescriptor>, score: f32) -> Self {
        Self {
            descriptors,
            outputs: Ok(vec![FloatTensor::scalar(score)]),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replaces the outputs returned from every run.
    #[must_use]
    pub fn returning(mut self, outputs: Vec<FloatTensor>) -> Self {
        self.outputs = Ok(outputs);
        self
    }

    /// Makes every run fail with `message`.
    #[must_use]
    pub fn failing(mut self, message: &str) -> Self {
        self.outputs = Err(message.to_string());
        self
    }

    /// Shared handle to recorded calls, usable after the engine is boxed.
    #[must_use]
    pub fn calls(&self) -> Arc<Mutex<Vec<Vec<FloatTensor>>>> {
        Arc::clone(&self.calls)
    }
}

impl InferenceEngine for FakeInferenceEngine {
    fn input_descriptors(&self) -> &[ClassifierInputDescriptor] {
        &self.descriptors
    }

    fn run(&self, inputs: &[FloatTensor]) -> anyhow::Result<Vec<FloatTensor>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(inputs.to_vec());
        self.outputs.clone().map_err(anyhow::Error::msg)
    }
}

enum Detection {
    Always(Option<LandmarkSet>),
    WhenBright(LandmarkSet),
    Fail(String),
}

/// Fake landmark detector.
pub struct FakeLandmarkDetector {
    detection: Detection,
}

impl FakeLandmarkDetector {
    /// Always reports `landmarks`.
    #[must_use]
    pub const fn found(landmarks: LandmarkSet) -> Self {
        Self {
            detection: Detection::Always(Some(landmarks)),
        }
    }

    /// Never finds a face.
    #[must_use]
    pub const fn no_face() -> Self {
        Self {
            detection: Detection::Always(None),
        }
    }

    /// Reports `landmarks` only for images whose mean luma exceeds 127,
    /// standing in for "a face is visible".
    #[must_use]
    pub const fn when_bright(landmarks: LandmarkSet) -> Self {
        Self {
            detection: Detection::WhenBright(landmarks),
        }
    }

    /// Fails every call.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            detection: Detection::Fail(message.to_string()),
        }
    }
}

impl LandmarkDetector for FakeLandmarkDetector {
    fn detect_landmarks(&self, image: &DynamicImage) -> anyhow::Result<Option<LandmarkSet>> {
        match &self.detection {
            Detection::Always(landmarks) => Ok(landmarks.clone()),
            Detection::WhenBright(landmarks) => {
                let luma = image.to_luma8();
                let total: u64 = luma.pixels().map(|p| u64::from(p[0])).sum();
                let count = u64::from(luma.width()) * u64::from(luma.height());
                Ok((count > 0 && total / count > 127).then(|| landmarks.clone()))
            }
            Detection::Fail(message) => Err(anyhow::anyhow!("{message}")),
        }
    }
}

/// Builds a predictor over fakes with [`FAKE_SCALER`].
///
/// # Panics
///
/// Panics if the engine's declared inputs are malformed.
#[must_use]
#[allow(clippy::expect_used)]
pub fn fake_predictor(
    engine: FakeInferenceEngine,
    detector: FakeLandmarkDetector,
) -> MicrosleepPredictor {
    MicrosleepPredictor::new(Box::new(engine), Box::new(detector), FAKE_SCALER)
        .expect("fake engine declares valid inputs")
}

/// Mock implementation of `ImageSource` for testing.
///
/// Yields pre-built inputs and tracks iteration for assertions.
pub struct MockImageSource {
    images: Vec<ImageInput>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockImageSource {
    /// Creates a new mock source with the given inputs.
    #[must_use]
    pub fn new(images: Vec<ImageInput>) -> Self {
        Self {
            images,
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSource for MockImageSource {
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<ImageInput>> + Send + '_> {
        if let Ok(mut c) = self.iteration_count.lock() {
            *c += 1;
        }
        Box::new(self.images.iter().cloned().map(Ok))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.images.len())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures records for later assertions.
pub struct MockResultOutput {
    records: Arc<Mutex<Vec<PredictionRecord>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured records.
    #[must_use]
    pub fn records(&self) -> Vec<PredictionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, record: &PredictionRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Ok(mut c) = self.flush_count.lock() {
            *c += 1;
        }
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Started` events.
    #[must_use]
    pub fn started_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Started { .. }))
            .count()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { processed, skipped } => Some((*processed, *skipped)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
