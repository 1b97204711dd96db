//! Section names and the label map that locates them.
//!
//! The last 8 bytes of an ND2 file hold the offset of the label-map chunk.
//! Its data is a flat byte string of `Name!` labels, each immediately
//! followed by the little-endian `u64` offset (and `u64` length) of the chunk
//! holding that section:
//!
//! ```text
//! ImageAttributesLV! <u64 offset> <u64 length> ImageTextInfoLV! <u64> <u64> ...
//! ```
//!
//! Which labels are present depends on the file version and on what the
//! acquisition recorded; any of them may be missing.

use std::collections::{BTreeMap, HashMap};

use crate::error::Nd2Error;
use crate::io::{read_u64_le, RangeReader};

use super::chunk::read_chunk;

/// Label prefix of the per-frame image data chunks
const IMAGE_DATA_PREFIX: &[u8] = b"ImageDataSeq|";

/// How a section's chunk data is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Tagged binary variant tree
    Variant,
    /// Raw little-endian f64 array
    Float64Array,
    /// Raw little-endian i32 array
    Int32Array,
    /// XML document
    Xml,
}

/// Named metadata sections of an ND2 file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    ImageAttributes,
    ImageTextInfo,
    ImageMetadata,
    ImageMetadataSequence,
    ImageCalibration,
    RoiMetadata,
    XData,
    YData,
    ZData,
    PfsStatus,
    PfsOffset,
    CameraExposureTime,
    CameraTemperature,
    AcquisitionTimes,
    LutData,
    GrabberSettings,
    CustomData,
    AppInfo,
}

impl Section {
    /// Every known section, in label-map listing order.
    pub const ALL: [Section; 18] = [
        Section::ImageAttributes,
        Section::ImageTextInfo,
        Section::ImageMetadata,
        Section::ImageMetadataSequence,
        Section::ImageCalibration,
        Section::RoiMetadata,
        Section::XData,
        Section::YData,
        Section::ZData,
        Section::PfsStatus,
        Section::PfsOffset,
        Section::CameraExposureTime,
        Section::CameraTemperature,
        Section::AcquisitionTimes,
        Section::LutData,
        Section::GrabberSettings,
        Section::CustomData,
        Section::AppInfo,
    ];

    /// The literal label of this section in the label map.
    pub const fn label(self) -> &'static str {
        match self {
            Section::ImageAttributes => "ImageAttributesLV!",
            Section::ImageTextInfo => "ImageTextInfoLV!",
            Section::ImageMetadata => "ImageMetadataLV!",
            Section::ImageMetadataSequence => "ImageMetadataSeqLV|0!",
            Section::ImageCalibration => "ImageCalibrationLV|0!",
            Section::RoiMetadata => "CustomData|RoiMetadata_v1!",
            Section::XData => "CustomData|X!",
            Section::YData => "CustomData|Y!",
            Section::ZData => "CustomData|Z!",
            Section::PfsStatus => "CustomData|PFS_STATUS!",
            Section::PfsOffset => "CustomData|PFS_OFFSET!",
            Section::CameraExposureTime => "CustomData|Camera_ExposureTime1!",
            Section::CameraTemperature => "CustomData|CameraTemp1!",
            Section::AcquisitionTimes => "CustomData|AcqTimesCache!",
            Section::LutData => "CustomDataVar|LUTDataV1_0!",
            Section::GrabberSettings => "CustomDataVar|GrabberCameraSettingsV1_0!",
            Section::CustomData => "CustomDataVar|CustomDataV2_0!",
            Section::AppInfo => "CustomDataVar|AppInfo_V1_0!",
        }
    }

    /// Human-readable name, used in logs and CLI output.
    pub const fn name(self) -> &'static str {
        match self {
            Section::ImageAttributes => "image attributes",
            Section::ImageTextInfo => "image text info",
            Section::ImageMetadata => "image metadata",
            Section::ImageMetadataSequence => "image metadata sequence",
            Section::ImageCalibration => "image calibration",
            Section::RoiMetadata => "ROI metadata",
            Section::XData => "x data",
            Section::YData => "y data",
            Section::ZData => "z data",
            Section::PfsStatus => "PFS status",
            Section::PfsOffset => "PFS offset",
            Section::CameraExposureTime => "camera exposure time",
            Section::CameraTemperature => "camera temperature",
            Section::AcquisitionTimes => "acquisition times",
            Section::LutData => "LUT data",
            Section::GrabberSettings => "grabber settings",
            Section::CustomData => "custom data",
            Section::AppInfo => "app info",
        }
    }

    /// How this section's data is decoded.
    pub const fn kind(self) -> SectionKind {
        match self {
            Section::ImageAttributes
            | Section::ImageTextInfo
            | Section::ImageMetadata
            | Section::ImageMetadataSequence
            | Section::ImageCalibration
            | Section::RoiMetadata => SectionKind::Variant,
            Section::XData
            | Section::YData
            | Section::ZData
            | Section::CameraExposureTime
            | Section::CameraTemperature
            | Section::AcquisitionTimes => SectionKind::Float64Array,
            Section::PfsStatus | Section::PfsOffset => SectionKind::Int32Array,
            Section::LutData
            | Section::GrabberSettings
            | Section::CustomData
            | Section::AppInfo => SectionKind::Xml,
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved chunk offsets for every section present in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    sections: HashMap<Section, u64>,
    image_chunks: Vec<u64>,
}

impl LabelMap {
    /// Parse raw label-map chunk data.
    ///
    /// A label that is missing, truncated, or points at offset 0 (the
    /// signature chunk) is treated as absent.
    pub fn parse(data: &[u8]) -> Self {
        let sections = Section::ALL
            .iter()
            .filter_map(|&section| {
                let offset = offset_after(data, section.label().as_bytes())?;
                (offset != 0).then_some((section, offset))
            })
            .collect();

        Self {
            sections,
            image_chunks: parse_image_chunks(data),
        }
    }

    /// Locate the label map via the file trailer and parse it.
    pub async fn read<R: RangeReader>(reader: &R) -> Result<Self, Nd2Error> {
        let size = reader.size();
        if size < 8 {
            return Err(Nd2Error::FileTooSmall {
                required: 8,
                actual: size,
            });
        }

        let trailer = reader.read_exact_at(size - 8, 8).await?;
        let offset = read_u64_le(&trailer);
        if offset >= size - 8 {
            return Err(Nd2Error::InvalidLabelMapOffset(offset));
        }

        let data = read_chunk(reader, offset).await?;
        Ok(Self::parse(&data))
    }

    /// Chunk offset of a section, if the file has it.
    pub fn get(&self, section: Section) -> Option<u64> {
        self.sections.get(&section).copied()
    }

    /// Whether the file has a section.
    pub fn contains(&self, section: Section) -> bool {
        self.sections.contains_key(&section)
    }

    /// Present sections and their offsets, in [`Section::ALL`] order.
    pub fn sections(&self) -> impl Iterator<Item = (Section, u64)> + '_ {
        Section::ALL
            .iter()
            .filter_map(|&s| self.get(s).map(|offset| (s, offset)))
    }

    /// Number of image data chunks listed in the label map.
    pub fn image_chunk_count(&self) -> usize {
        self.image_chunks.len()
    }

    /// Chunk offset of the image data chunk with the given sequence index.
    pub fn image_chunk_offset(&self, index: usize) -> Option<u64> {
        self.image_chunks.get(index).copied()
    }
}

/// Find `label` in `data` and read the u64 that follows it.
fn offset_after(data: &[u8], label: &[u8]) -> Option<u64> {
    let start = find(data, label)? + label.len();
    let bytes = data.get(start..start + 8)?;
    Some(read_u64_le(bytes))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Collect `ImageDataSeq|<n>!` offsets ordered by sequence index.
fn parse_image_chunks(data: &[u8]) -> Vec<u64> {
    let mut chunks = BTreeMap::new();
    let mut cursor = 0;

    while let Some(pos) = find(&data[cursor..], IMAGE_DATA_PREFIX) {
        let start = cursor + pos + IMAGE_DATA_PREFIX.len();
        cursor = start;

        let digits = data[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        let bang = start + digits;
        if digits == 0 || data.get(bang) != Some(&b'!') {
            continue;
        }

        let index = std::str::from_utf8(&data[start..bang])
            .ok()
            .and_then(|s| s.parse::<u32>().ok());
        let offset = data.get(bang + 1..bang + 9).map(read_u64_le);
        if let (Some(index), Some(offset)) = (index, offset) {
            chunks.insert(index, offset);
        }
        cursor = bang + 1;
    }

    chunks.into_values().collect()
}
