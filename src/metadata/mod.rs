//! Canonical metadata extraction.
//!
//! Sections flow one way through this module:
//!
//! ```text
//! SectionCache -> {dimensions, channels, roi, experiment} -> RawMetadata -> Metadata
//! ```
//!
//! Each parser works on already-decoded variant trees and treats a missing
//! or oddly shaped node as absent data rather than an error.

pub mod assembler;
pub mod channels;
pub mod dimensions;
pub mod experiment;
pub mod model;
pub mod roi;
pub mod sections;

pub use assembler::RawMetadata;
pub use channels::parse_channels;
pub use dimensions::{dimension_text, parse_dimension, Axis};
pub use experiment::{parse_experiment, parse_loops};
pub use model::{
    Experiment, ExperimentLoop, Metadata, Point3, Roi, RoiShape, RoiType, UNKNOWN_DESCRIPTION,
};
pub use roi::{parse_roi, parse_rois, ImageGeometry};
pub use sections::{SectionCache, SectionData};
