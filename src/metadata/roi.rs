//! Region-of-interest geometry.
//!
//! ROIs are stored in the `RoiMetadata_v1` tree as `m_vectGlobal_<i>`
//! records. Each record holds a shape and interpretation code plus a list of
//! animation keyframes (`m_vectAnimParams_<j>`) giving the ROI's center and
//! box size at a point in time.
//!
//! Keyframe X/Y values are normalized to the image: centers run from -1 to 1
//! across the image, sizes are fractions of it. Z values are already
//! physical. Converting to microns therefore needs the image size and the
//! pixel calibration, which is why ROIs are parsed after the base metadata.

use tracing::{debug, warn};

use super::model::{Point3, Roi, RoiShape, RoiType};
use crate::format::{Field, Variant};

/// Physical image extent in microns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageGeometry {
    pub width: f64,
    pub height: f64,
}

impl ImageGeometry {
    /// Physical extent from pixel dimensions and microns per pixel.
    pub fn from_pixels(width: u64, height: u64, pixel_microns: f64) -> Self {
        Self {
            width: width as f64 * pixel_microns,
            height: height as f64 * pixel_microns,
        }
    }

    /// Center of a keyframe in microns.
    pub fn position(&self, center_x: f64, center_y: f64, center_z: f64) -> Point3 {
        Point3::new(
            0.5 * self.width * (1.0 + center_x),
            0.5 * self.height * (1.0 + center_y),
            center_z,
        )
    }

    /// Box size of a keyframe in microns.
    pub fn size(&self, size_x: f64, size_y: f64, size_z: f64) -> Point3 {
        Point3::new(
            size_x * 0.25 * self.width,
            size_y * 0.25 * self.height,
            size_z,
        )
    }
}

/// Parse every ROI of the ROI metadata section.
///
/// Returns `None` when the section is absent, declares no ROIs, or the image
/// geometry is unknown. A record that cannot be read is skipped, and
/// parsing stops at the first missing record.
pub fn parse_rois(section: Option<&Variant>, geometry: Option<ImageGeometry>) -> Option<Vec<Roi>> {
    let raw = section?.field(Field::RoiMetadata)?;

    let count = raw.u64_field(Field::GlobalRoiCount).unwrap_or(0) as usize;
    if count == 0 {
        debug!("ROI metadata declares no ROIs");
        return None;
    }

    let Some(geometry) = geometry else {
        warn!(
            count,
            "File has ROIs but image size or calibration is missing, skipping ROIs"
        );
        return None;
    };

    let mut rois = Vec::new();
    for index in 0..count {
        // The declared count can exceed the stored records in damaged files
        let Some(record) = raw.indexed(Field::GlobalRoi, index) else {
            warn!(index, count, "ROI record missing, ignoring the rest");
            break;
        };
        match parse_roi(record, &geometry) {
            Some(roi) => rois.push(roi),
            None => warn!(index, "Malformed ROI record, skipping"),
        }
    }

    Some(rois)
}

/// Parse one `m_vectGlobal_<i>` record.
pub fn parse_roi(record: &Variant, geometry: &ImageGeometry) -> Option<Roi> {
    let info = record.field(Field::RoiInfo)?;
    let shape = info
        .u64_field(Field::ShapeType)
        .map_or(RoiShape::Unknown, RoiShape::from_code);
    let roi_type = info
        .u64_field(Field::InterpretationType)
        .map_or(RoiType::Unknown, RoiType::from_code);

    let keyframes = record.u64_field(Field::AnimationCount)? as usize;

    let mut roi = Roi::new(shape, roi_type);
    for index in 0..keyframes {
        let anim = record.indexed(Field::Animation, index)?;
        let (time_ms, position, size) = parse_keyframe(anim, geometry)?;
        roi.push_keyframe(time_ms, position, size);
    }

    Some(roi)
}

/// Parse one `m_vectAnimParams_<j>` keyframe into time, position and size.
fn parse_keyframe(anim: &Variant, geometry: &ImageGeometry) -> Option<(f64, Point3, Point3)> {
    let time_ms = anim.f64_field(Field::TimeMs)?;

    let position = geometry.position(
        anim.f64_field(Field::CenterX)?,
        anim.f64_field(Field::CenterY)?,
        anim.f64_field(Field::CenterZ)?,
    );

    let shape = anim.field(Field::BoxShape)?;
    let size = geometry.size(
        shape.f64_field(Field::SizeX)?,
        shape.f64_field(Field::SizeY)?,
        shape.f64_field(Field::SizeZ)?,
    );

    Some((time_ms, position, size))
}
