//! Facial landmark types.
//!
//! Landmark indices follow the 468-point face mesh convention. The detector
//! reports coordinates normalized to `[0, 1]`; [`LandmarkSet::from_normalized`]
//! projects them to pixel space before any geometry is computed.

// Pixel projection truncates on purpose.
#![allow(clippy::cast_precision_loss)]

/// Number of points in a face mesh landmark set (without iris refinement).
pub const FACE_MESH_LANDMARK_COUNT: usize = 468;

/// Left eye in canonical order: outer corner, upper lid 1, upper lid 2,
/// inner corner, lower lid 2, lower lid 1.
pub const LEFT_EYE: EyeLandmarkIndices = EyeLandmarkIndices([362, 385, 387, 263, 373, 380]);

/// Right eye, same canonical order as [`LEFT_EYE`].
pub const RIGHT_EYE: EyeLandmarkIndices = EyeLandmarkIndices([33, 160, 158, 133, 153, 144]);

/// A 2D landmark position in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Six landmark indices selecting one eye from a [`LandmarkSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeLandmarkIndices(pub [usize; 6]);

impl EyeLandmarkIndices {
    /// Returns the indices in canonical order.
    #[must_use]
    pub const fn indices(&self) -> &[usize; 6] {
        &self.0
    }

    /// Largest index referenced by this eye.
    #[must_use]
    pub fn max_index(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

/// Ordered landmark points produced once per image by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point>,
}

impl LandmarkSet {
    /// Wraps points that are already in pixel coordinates.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Projects normalized `[x, y]` coordinates onto a `width` x `height`
    /// pixel grid. Coordinates are truncated toward zero.
    #[must_use]
    pub fn from_normalized(normalized: &[[f32; 2]], width: u32, height: u32) -> Self {
        let w = width as f32;
        let h = height as f32;
        let points = normalized
            .iter()
            .map(|[x, y]| Point::new((x * w).trunc(), (y * h).trunc()))
            .collect();
        Self { points }
    }

    /// Returns the point at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// Number of landmarks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the set has no landmarks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in detector order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}
