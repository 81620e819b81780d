//! Two-stage face landmark detection.
//!
//! `BlazeFace` finds the most confident face, a square region around it is
//! cropped from the full-resolution image, and the face mesh model regresses
//! 468 landmarks inside that crop. Landmarks are reported in pixel
//! coordinates of the original image.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use std::path::Path;

use anyhow::{bail, Context, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{sigmoid, BlazeFaceDetector, FaceBox, OnnxGraph, TensorLayout};
use crate::domain::{LandmarkSet, FACE_MESH_LANDMARK_COUNT};
use crate::ports::LandmarkDetector;

/// Input image size for the face mesh model.
pub const MESH_INPUT_SIZE: u32 = 192;

/// The crop side is this multiple of the larger face box side.
const CROP_SCALE: f32 = 1.5;

/// Detector thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceMeshConfig {
    /// Minimum `BlazeFace` score for a face to be considered.
    pub min_face_confidence: f32,
    /// Minimum face-presence probability reported by the mesh model.
    pub min_presence: f32,
}

impl Default for FaceMeshConfig {
    fn default() -> Self {
        Self {
            min_face_confidence: 0.75,
            min_presence: 0.5,
        }
    }
}

/// Pixel rectangle cropped from the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CropRegion {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Landmark detector combining `BlazeFace` with the face mesh model.
pub struct FaceMeshDetector {
    face_detector: BlazeFaceDetector,
    mesh: OnnxGraph,
    layout: TensorLayout,
    min_presence: f32,
    gate_presence: bool,
}

impl FaceMeshDetector {
    /// Loads both stages.
    ///
    /// # Errors
    ///
    /// Returns an error if either model cannot be loaded.
    pub fn load(
        face_detector_path: impl AsRef<Path>,
        mesh_path: impl AsRef<Path>,
        config: FaceMeshConfig,
    ) -> Result<Self> {
        let face_detector =
            BlazeFaceDetector::load(face_detector_path, config.min_face_confidence)?;
        let mesh = OnnxGraph::load(mesh_path)?;
        Self::from_parts(face_detector, mesh, config.min_presence)
    }

    /// Combines an already-loaded face detector and mesh graph.
    ///
    /// A mesh graph declaring a single output has no presence score; crops
    /// are then accepted without gating, which is logged once here.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh graph does not take exactly one input
    /// or declares no outputs.
    pub fn from_parts(
        face_detector: BlazeFaceDetector,
        mesh: OnnxGraph,
        min_presence: f32,
    ) -> Result<Self> {
        let [input] = mesh.inputs() else {
            bail!(
                "face mesh model must have one input, found {}",
                mesh.inputs().len()
            );
        };
        let layout = TensorLayout::from_declared(&input.shape);

        let gate_presence = match mesh.output_names().len() {
            0 => bail!("face mesh model declares no outputs"),
            1 => {
                warn!("face mesh model declares no presence output, presence gating disabled");
                false
            }
            _ => true,
        };

        Ok(Self {
            face_detector,
            mesh,
            layout,
            min_presence,
            gate_presence,
        })
    }

    /// Runs the mesh model on one crop.
    ///
    /// Returns landmarks normalized to the full image, or `None` if the
    /// model reports no face in the crop.
    fn mesh_landmarks(
        &self,
        image: &DynamicImage,
        region: CropRegion,
    ) -> Result<Option<Vec<[f32; 2]>>> {
        let crop = image
            .crop_imm(region.x, region.y, region.width, region.height)
            .resize_exact(
                MESH_INPUT_SIZE,
                MESH_INPUT_SIZE,
                image::imageops::FilterType::Triangle,
            );
        let input = self.layout.pack(&crop.to_rgb8(), |v| f32::from(v) / 255.0)?;
        let outputs = self.mesh.run(&[input])?;

        let coords = outputs
            .iter()
            .find(|t| t.data().len() >= FACE_MESH_LANDMARK_COUNT * 3 && t.data().len() % 3 == 0)
            .context("face mesh model produced no landmark output")?;

        if self.gate_presence {
            let presence = outputs
                .iter()
                .find_map(|t| match t.data() {
                    [logit] => Some(*logit),
                    _ => None,
                })
                .context("face mesh model produced no presence output")?;
            let probability = sigmoid(presence);
            if probability < self.min_presence {
                debug!(probability, "face mesh rejected crop");
                return Ok(None);
            }
        }

        let (width, height) = (image.width() as f32, image.height() as f32);
        let scale_x = region.width as f32 / MESH_INPUT_SIZE as f32;
        let scale_y = region.height as f32 / MESH_INPUT_SIZE as f32;

        let landmarks = coords
            .data()
            .chunks_exact(3)
            .take(FACE_MESH_LANDMARK_COUNT)
            .map(|p| {
                [
                    (region.x as f32 + p[0] * scale_x) / width,
                    (region.y as f32 + p[1] * scale_y) / height,
                ]
            })
            .collect();

        Ok(Some(landmarks))
    }
}

impl LandmarkDetector for FaceMeshDetector {
    fn detect_landmarks(&self, image: &DynamicImage) -> Result<Option<LandmarkSet>> {
        let faces = self.face_detector.detect(image)?;
        let Some(face) = faces.first() else {
            return Ok(None);
        };

        let Some(region) = crop_region(face, image.width(), image.height()) else {
            debug!(bbox = ?face.bbox, "face box too small to crop");
            return Ok(None);
        };

        let Some(normalized) = self.mesh_landmarks(image, region)? else {
            return Ok(None);
        };

        Ok(Some(LandmarkSet::from_normalized(
            &normalized,
            image.width(),
            image.height(),
        )))
    }
}

/// Square crop around a face box, scaled up and clamped to the image.
fn crop_region(face: &FaceBox, width: u32, height: u32) -> Option<CropRegion> {
    let (w, h) = (width as f32, height as f32);
    let [x0, y0, x1, y1] = face.bbox;

    let cx = (x0 + x1) / 2.0 * w;
    let cy = (y0 + y1) / 2.0 * h;
    let side = ((x1 - x0) * w).max((y1 - y0) * h) * CROP_SCALE;

    let left = (cx - side / 2.0).max(0.0);
    let top = (cy - side / 2.0).max(0.0);
    let right = (cx + side / 2.0).min(w);
    let bottom = (cy + side / 2.0).min(h);

    if right - left < 1.0 || bottom - top < 1.0 {
        return None;
    }

    let x = left as u32;
    let y = top as u32;
    Some(CropRegion {
        x,
        y,
        width: (right as u32).saturating_sub(x).max(1),
        height: (bottom as u32).saturating_sub(y).max(1),
    })
}
