//! `BlazeFace` short-range face detection over an ONNX export.
//!
//! Decoding follows the reference anchor scheme: a 16x16 grid with two
//! anchors per cell and an 8x8 grid with six, for 896 anchors total. Each
//! anchor regresses 16 values (box centre and size, then six keypoints)
//! in units of input pixels.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use std::path::Path;

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use tracing::debug;

use super::{sigmoid, OnnxGraph, TensorLayout};
use crate::domain::FloatTensor;

/// Input image size for `BlazeFace`.
pub const INPUT_SIZE: usize = 128;

/// Number of anchor boxes (detections).
const NUM_ANCHORS: usize = 896;

/// Values regressed per anchor.
const BOX_VALUES: usize = 16;

/// Non-maximum suppression IOU threshold.
const NMS_THRESHOLD: f32 = 0.3;

/// A detected face box.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBox {
    /// Bounding box `[x_min, y_min, x_max, y_max]` in normalized `[0,1]` coordinates.
    pub bbox: [f32; 4],
    /// Detection confidence score.
    pub score: f32,
}

impl FaceBox {
    /// Box area in normalized units.
    #[must_use]
    pub fn area(&self) -> f32 {
        (self.bbox[2] - self.bbox[0]) * (self.bbox[3] - self.bbox[1])
    }
}

/// Face detector wrapping a `BlazeFace` ONNX graph.
pub struct BlazeFaceDetector {
    graph: OnnxGraph,
    layout: TensorLayout,
    anchors: Vec<[f32; 2]>,
    min_confidence: f32,
}

impl BlazeFaceDetector {
    /// Loads the detector graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be read or does not take
    /// exactly one image input.
    pub fn load(path: impl AsRef<Path>, min_confidence: f32) -> Result<Self> {
        let graph = OnnxGraph::load(path)?;
        Self::from_graph(graph, min_confidence)
    }

    /// Wraps an already-loaded graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph does not take exactly one image input.
    pub fn from_graph(graph: OnnxGraph, min_confidence: f32) -> Result<Self> {
        let [input] = graph.inputs() else {
            bail!(
                "face detector must have one input, found {}",
                graph.inputs().len()
            );
        };
        let layout = TensorLayout::from_declared(&input.shape);
        debug!(?layout, input = %input.name, "face detector loaded");

        Ok(Self {
            graph,
            layout,
            anchors: generate_anchors(),
            min_confidence,
        })
    }

    /// Preprocesses an image for `BlazeFace` input.
    ///
    /// Returns a `128x128` batch-of-one tensor normalized to `[-1, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if tensor creation fails.
    pub fn preprocess(&self, image: &DynamicImage) -> Result<FloatTensor> {
        let resized = image.resize_exact(
            INPUT_SIZE as u32,
            INPUT_SIZE as u32,
            image::imageops::FilterType::Triangle,
        );
        self.layout
            .pack(&resized.to_rgb8(), |v| (f32::from(v) / 127.5) - 1.0)
    }

    /// Detects faces, most confident first.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the outputs are not
    /// recognizable as scores and regressors.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceBox>> {
        let input = self.preprocess(image)?;
        let outputs = self.graph.run(&[input])?;

        let scores = outputs
            .iter()
            .find(|t| t.shape().last() == Some(&1) && t.data().len() == NUM_ANCHORS)
            .context("face detector produced no score output")?;
        let boxes = outputs
            .iter()
            .find(|t| t.shape().last() == Some(&BOX_VALUES) && t.data().len() == NUM_ANCHORS * BOX_VALUES)
            .context("face detector produced no box regressor output")?;

        let detections =
            decode_detections(scores.data(), boxes.data(), &self.anchors, self.min_confidence);
        let detections = nms(detections);
        debug!(faces = detections.len(), "face detection complete");
        Ok(detections)
    }
}

/// Generates anchor centres for the two feature map scales.
fn generate_anchors() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for (grid, per_cell) in [(16_u8, 2), (8_u8, 6)] {
        for y in 0..grid {
            for x in 0..grid {
                let cx = (f32::from(x) + 0.5) / f32::from(grid);
                let cy = (f32::from(y) + 0.5) / f32::from(grid);
                for _ in 0..per_cell {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

/// Decodes raw network output into face boxes above `min_confidence`.
fn decode_detections(
    scores: &[f32],
    boxes: &[f32],
    anchors: &[[f32; 2]],
    min_confidence: f32,
) -> Vec<FaceBox> {
    let input_size = INPUT_SIZE as f32;

    anchors
        .iter()
        .zip(scores)
        .zip(boxes.chunks_exact(BOX_VALUES))
        .filter_map(|((anchor, &logit), raw)| {
            let score = sigmoid(logit.clamp(-100.0, 100.0));
            if score < min_confidence {
                return None;
            }

            // Center format -> corner format
            let cx = anchor[0] + raw[0] / input_size;
            let cy = anchor[1] + raw[1] / input_size;
            let w = raw[2] / input_size;
            let h = raw[3] / input_size;

            Some(FaceBox {
                bbox: [
                    (cx - w / 2.0).clamp(0.0, 1.0),
                    (cy - h / 2.0).clamp(0.0, 1.0),
                    (cx + w / 2.0).clamp(0.0, 1.0),
                    (cy + h / 2.0).clamp(0.0, 1.0),
                ],
                score,
            })
        })
        .collect()
}

/// Non-maximum suppression to remove overlapping detections.
fn nms(mut detections: Vec<FaceBox>) -> Vec<FaceBox> {
    // Sort by score descending (NaN scores treated as equal)
    detections.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceBox> = Vec::new();
    for det in detections {
        if keep.iter().all(|k| iou(&k.bbox, &det.bbox) < NMS_THRESHOLD) {
            keep.push(det);
        }
    }
    keep
}

/// Intersection over Union for two bounding boxes.
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);

    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}
