//! Canonical metadata model.
//!
//! Everything here is a read-only projection of one file's sections. The
//! types are built once by the assembler and never mutated afterwards.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Description used when the file records no experiment description.
pub const UNKNOWN_DESCRIPTION: &str = "unknown";

/// Assembled metadata for one ND2 file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Image height in pixels
    pub height: Option<u64>,

    /// Image width in pixels
    pub width: Option<u64>,

    /// Acquisition start
    pub date: Option<NaiveDateTime>,

    /// Field-of-view indices, `0..count`
    pub fields_of_view: Vec<usize>,

    /// Frame (time point) indices, `0..count`
    pub frames: Vec<usize>,

    /// Z-level indices, `0..count`
    pub z_levels: Vec<usize>,

    /// Raw image count per channel. May include gap images.
    pub total_images_per_channel: Option<u64>,

    /// Valid channel labels in stored order
    pub channels: Vec<String>,

    /// Microns per pixel
    pub pixel_microns: Option<f64>,

    /// Length of `frames`
    pub num_frames: usize,

    /// Regions of interest, if the file defines any
    pub rois: Option<Vec<Roi>>,

    pub experiment: Experiment,
}

// =============================================================================
// ROIs
// =============================================================================

/// ROI outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiShape {
    Rectangle,
    Circle,
    Unknown,
}

impl RoiShape {
    pub fn from_code(code: u64) -> Self {
        match code {
            3 => RoiShape::Rectangle,
            9 => RoiShape::Circle,
            _ => RoiShape::Unknown,
        }
    }
}

/// What an ROI is used for during acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiType {
    Stimulation,
    Reference,
    Background,
    Unknown,
}

impl RoiType {
    pub fn from_code(code: u64) -> Self {
        match code {
            4 => RoiType::Stimulation,
            3 => RoiType::Reference,
            2 => RoiType::Background,
            _ => RoiType::Unknown,
        }
    }
}

/// A point or extent in physical units (microns).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A time-animated region of interest.
///
/// `timepoints`, `positions` and `sizes` always have the same length: they
/// can only grow together through [`Roi::push_keyframe`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roi {
    shape: RoiShape,
    #[serde(rename = "type")]
    roi_type: RoiType,
    timepoints: Vec<f64>,
    positions: Vec<Point3>,
    sizes: Vec<Point3>,
}

impl Roi {
    pub fn new(shape: RoiShape, roi_type: RoiType) -> Self {
        Self {
            shape,
            roi_type,
            timepoints: Vec::new(),
            positions: Vec::new(),
            sizes: Vec::new(),
        }
    }

    /// Append one keyframe.
    pub fn push_keyframe(&mut self, time_ms: f64, position: Point3, size: Point3) {
        self.timepoints.push(time_ms);
        self.positions.push(position);
        self.sizes.push(size);
    }

    pub fn shape(&self) -> RoiShape {
        self.shape
    }

    pub fn roi_type(&self) -> RoiType {
        self.roi_type
    }

    /// Keyframe times in milliseconds
    pub fn timepoints(&self) -> &[f64] {
        &self.timepoints
    }

    /// Keyframe centers in microns
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Keyframe extents in microns
    pub fn sizes(&self) -> &[Point3] {
        &self.sizes
    }

    /// Number of keyframes.
    pub fn len(&self) -> usize {
        self.timepoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timepoints.is_empty()
    }
}

// =============================================================================
// Experiment
// =============================================================================

/// The acquisition experiment: description and loop timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experiment {
    pub description: String,
    pub loops: Vec<ExperimentLoop>,
}

impl Default for Experiment {
    fn default() -> Self {
        Self {
            description: UNKNOWN_DESCRIPTION.to_string(),
            loops: Vec::new(),
        }
    }
}

/// One timed phase of the acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExperimentLoop {
    /// Offset from the start of the experiment (ms), the sum of all earlier durations
    pub start: f64,

    /// Duration (ms)
    pub duration: f64,

    /// Whether this is a stimulation loop
    pub stimulation: bool,

    /// Average time between samples (ms)
    pub sampling_interval: f64,
}
