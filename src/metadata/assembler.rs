//! Metadata assembly.
//!
//! [`RawMetadata`] owns the section cache of one open file and turns its
//! sections into the canonical [`Metadata`]. The assembled value is computed
//! on first request and cached, so later calls neither re-run the parsers nor
//! touch the section cache again.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::channels::parse_channels;
use super::dimensions::{dimension_text, parse_dimension, Axis};
use super::experiment::parse_experiment;
use super::model::{Experiment, Metadata};
use super::roi::{parse_rois, ImageGeometry};
use super::sections::{SectionCache, SectionData};
use crate::format::{parse_date, Field, LabelMap, ScaledSeries, Section, Variant, XmlNode};
use crate::io::RangeReader;

/// Raw section access plus the cached canonical metadata of one file.
pub struct RawMetadata<R> {
    sections: SectionCache<R>,
    parsed: OnceCell<Metadata>,
}

impl<R: RangeReader> RawMetadata<R> {
    pub fn new(reader: R, labels: LabelMap) -> Self {
        Self {
            sections: SectionCache::new(reader, labels),
            parsed: OnceCell::new(),
        }
    }

    /// The canonical metadata, assembled on first call.
    ///
    /// Concurrent first calls share one assembly. Sections that are missing
    /// or damaged leave their fields empty instead of failing.
    pub async fn parsed_metadata(&self) -> &Metadata {
        self.parsed.get_or_init(|| self.assemble()).await
    }

    /// The underlying section cache.
    pub fn sections(&self) -> &SectionCache<R> {
        &self.sections
    }

    /// Number of section payloads decoded so far.
    pub fn decode_count(&self) -> usize {
        self.sections.decode_count()
    }

    async fn assemble(&self) -> Metadata {
        let attributes = self
            .image_attributes()
            .await
            .and_then(|s| s.field(Field::ImageAttributes));
        let text_info = self
            .image_text_info()
            .await
            .and_then(|s| s.field(Field::ImageTextInfo));
        let image_metadata = self.image_metadata().await;

        let dimensions = text_info.and_then(dimension_text);
        let frames = parse_dimension(dimensions, Axis::Frame);

        // Base fields first: ROI geometry depends on them
        let mut metadata = Metadata {
            height: attributes.and_then(|a| a.u64_field(Field::Height)),
            width: attributes.and_then(|a| a.u64_field(Field::Width)),
            date: text_info.and_then(parse_date),
            fields_of_view: parse_dimension(dimensions, Axis::FieldOfView),
            num_frames: frames.len(),
            frames,
            z_levels: parse_dimension(dimensions, Axis::ZLevel),
            total_images_per_channel: attributes.and_then(|a| a.u64_field(Field::SequenceCount)),
            channels: parse_channels(self.image_metadata_sequence().await, image_metadata),
            pixel_microns: self.pixel_microns().await,
            rois: None,
            experiment: Experiment::default(),
        };

        metadata.rois = parse_rois(self.roi_metadata().await, image_geometry(&metadata));
        metadata.experiment = parse_experiment(image_metadata);

        info!(
            file = %self.sections.reader().identifier(),
            width = ?metadata.width,
            height = ?metadata.height,
            channels = metadata.channels.len(),
            frames = metadata.num_frames,
            rois = metadata.rois.as_ref().map_or(0, Vec::len),
            "Assembled metadata"
        );

        metadata
    }

    async fn pixel_microns(&self) -> Option<f64> {
        let value = self
            .image_calibration()
            .await?
            .field(Field::Calibration)?
            .f64_field(Field::CalibrationValue);
        if value.is_none() {
            debug!("Calibration section has no pixel size");
        }
        value
    }

    // -------------------------------------------------------------------------
    // Raw sections
    // -------------------------------------------------------------------------

    /// Any section, decoded according to its kind.
    pub async fn section(&self, section: Section) -> Option<&SectionData> {
        self.sections.fetch(section).await
    }

    pub async fn image_attributes(&self) -> Option<&Variant> {
        self.sections.variant(Section::ImageAttributes).await
    }

    pub async fn image_text_info(&self) -> Option<&Variant> {
        self.sections.variant(Section::ImageTextInfo).await
    }

    pub async fn image_metadata(&self) -> Option<&Variant> {
        self.sections.variant(Section::ImageMetadata).await
    }

    pub async fn image_metadata_sequence(&self) -> Option<&Variant> {
        self.sections.variant(Section::ImageMetadataSequence).await
    }

    pub async fn image_calibration(&self) -> Option<&Variant> {
        self.sections.variant(Section::ImageCalibration).await
    }

    pub async fn roi_metadata(&self) -> Option<&Variant> {
        self.sections.variant(Section::RoiMetadata).await
    }

    /// Stage X position per image.
    pub async fn x_data(&self) -> Option<&[f64]> {
        self.sections.f64_array(Section::XData).await.map(|v| &v[..])
    }

    /// Stage Y position per image.
    pub async fn y_data(&self) -> Option<&[f64]> {
        self.sections.f64_array(Section::YData).await.map(|v| &v[..])
    }

    /// Stage Z position per image.
    pub async fn z_data(&self) -> Option<&[f64]> {
        self.sections.f64_array(Section::ZData).await.map(|v| &v[..])
    }

    /// Perfect Focus System state per image.
    pub async fn pfs_status(&self) -> Option<&[i32]> {
        self.sections.i32_array(Section::PfsStatus).await.map(|v| &v[..])
    }

    pub async fn pfs_offset(&self) -> Option<&[i32]> {
        self.sections.i32_array(Section::PfsOffset).await.map(|v| &v[..])
    }

    pub async fn camera_exposure_time(&self) -> Option<&[f64]> {
        self.sections
            .f64_array(Section::CameraExposureTime)
            .await
            .map(|v| &v[..])
    }

    /// Camera temperature per image in degrees Celsius.
    pub async fn camera_temperature(&self) -> Option<ScaledSeries> {
        self.sections
            .f64_array(Section::CameraTemperature)
            .await
            .map(|raw| ScaledSeries::camera_temperature(Arc::clone(raw)))
    }

    /// Acquisition timestamp per image in seconds.
    pub async fn acquisition_times(&self) -> Option<ScaledSeries> {
        self.sections
            .f64_array(Section::AcquisitionTimes)
            .await
            .map(|raw| ScaledSeries::acquisition_times(Arc::clone(raw)))
    }

    pub async fn lut_data(&self) -> Option<&XmlNode> {
        self.sections.xml(Section::LutData).await
    }

    pub async fn grabber_settings(&self) -> Option<&XmlNode> {
        self.sections.xml(Section::GrabberSettings).await
    }

    pub async fn custom_data(&self) -> Option<&XmlNode> {
        self.sections.xml(Section::CustomData).await
    }

    pub async fn app_info(&self) -> Option<&XmlNode> {
        self.sections.xml(Section::AppInfo).await
    }
}

/// Physical image extent, if size and calibration are all known.
fn image_geometry(metadata: &Metadata) -> Option<ImageGeometry> {
    match (metadata.width, metadata.height, metadata.pixel_microns) {
        (Some(width), Some(height), Some(pixel_microns)) => {
            Some(ImageGeometry::from_pixels(width, height, pixel_microns))
        }
        _ => None,
    }
}
