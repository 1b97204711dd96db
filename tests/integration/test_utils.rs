//! Test utilities for integration tests.
//!
//! This module provides a request-tracking mock reader and helpers that build
//! synthetic ND2 files in memory: chunk framing, a variant-tree encoder, the
//! label map and the file trailer.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use nd2_metadata::error::IoError;
use nd2_metadata::io::RangeReader;
use nd2_metadata::Section;

// =============================================================================
// Mock Range Reader with Request Tracking
// =============================================================================

/// A mock range reader that tracks all read requests.
pub struct TrackingMockReader {
    data: Bytes,
    identifier: String,
    request_count: Arc<AtomicUsize>,
    requests: Arc<RwLock<Vec<(u64, usize)>>>,
}

impl TrackingMockReader {
    pub fn new(data: Vec<u8>, identifier: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(data),
            identifier: identifier.into(),
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub async fn get_requests(&self) -> Vec<(u64, usize)> {
        self.requests.read().await.clone()
    }
}

impl Clone for TrackingMockReader {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            identifier: self.identifier.clone(),
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
        }
    }
}

#[async_trait]
impl RangeReader for TrackingMockReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.write().await.push((offset, len));

        let start = offset as usize;
        let end = start + len;
        if end > self.data.len() {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.data.len() as u64,
            });
        }
        Ok(self.data.slice(start..end))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// Variant Tree Encoder
// =============================================================================

/// A value to encode into a variant tree.
#[derive(Debug, Clone)]
pub enum Node {
    U8(u8),
    I32(i32),
    U32(u32),
    U64(u64),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Nested level; keys may repeat
    Level(Vec<(String, Node)>),
}

pub fn level(entries: Vec<(&str, Node)>) -> Node {
    Node::Level(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

pub fn text(value: &str) -> Node {
    Node::Str(value.to_string())
}

fn encode_name(key: &str) -> Vec<u8> {
    let units: Vec<u16> = key.encode_utf16().chain(std::iter::once(0)).collect();
    let mut out = vec![units.len() as u8];
    out.extend(units.iter().flat_map(|u| u.to_le_bytes()));
    out
}

fn utf16z(value: &str) -> Vec<u8> {
    value
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(|u| u.to_le_bytes())
        .collect()
}

/// Encode one keyed item.
pub fn encode_item(key: &str, node: &Node) -> Vec<u8> {
    let (code, value) = match node {
        Node::U8(v) => (1u8, vec![*v]),
        Node::I32(v) => (2, v.to_le_bytes().to_vec()),
        Node::U32(v) => (3, v.to_le_bytes().to_vec()),
        Node::U64(v) => (5, v.to_le_bytes().to_vec()),
        Node::F64(v) => (6, v.to_le_bytes().to_vec()),
        Node::Str(s) => (8, utf16z(s)),
        Node::Bytes(b) => {
            let mut value = (b.len() as u64).to_le_bytes().to_vec();
            value.extend_from_slice(b);
            (9, value)
        }
        Node::Level(entries) => return encode_level(key, entries),
    };

    let mut out = vec![code];
    out.extend(encode_name(key));
    out.extend(value);
    out
}

fn encode_level(key: &str, entries: &[(String, Node)]) -> Vec<u8> {
    let body: Vec<u8> = entries
        .iter()
        .flat_map(|(k, v)| encode_item(k, v))
        .collect();

    let mut out = vec![11u8];
    out.extend(encode_name(key));
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    // Length runs from the item start to the end of the nested items
    let length = (out.len() + 8 + body.len()) as u64;
    out.extend_from_slice(&length.to_le_bytes());
    out.extend(body);
    out.extend(std::iter::repeat(0u8).take(entries.len() * 8));
    out
}

/// Encode a section payload: a single top-level item.
pub fn section_payload(key: &str, node: Node) -> Vec<u8> {
    encode_item(key, &node)
}

pub fn f64_payload(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i32_payload(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

// =============================================================================
// Synthetic ND2 Files
// =============================================================================

const SIGNATURE_NAME: &str = "ND2 FILE SIGNATURE CHUNK NAME01!";
const LABEL_MAP_NAME: &str = "ND2 CHUNK MAP SIGNATURE 0000001!";

/// Frame one chunk: header, name, data.
pub fn chunk(name: &str, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + name.len() + data.len());
    out.extend_from_slice(&0x0ABE_CEDAu32.to_le_bytes());
    out.extend_from_slice(&(name.len() as u32).to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(data);
    out
}

/// Builder for an in-memory ND2 file.
pub struct Nd2FileBuilder {
    version: String,
    sections: Vec<(String, Vec<u8>)>,
    image_chunks: usize,
}

impl Nd2FileBuilder {
    pub fn new() -> Self {
        Self {
            version: "Ver3.0".to_string(),
            sections: Vec::new(),
            image_chunks: 0,
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn section(self, section: Section, payload: Vec<u8>) -> Self {
        self.raw_section(section.label(), payload)
    }

    pub fn raw_section(mut self, label: &str, payload: Vec<u8>) -> Self {
        self.sections.push((label.to_string(), payload));
        self
    }

    pub fn image_chunks(mut self, count: usize) -> Self {
        self.image_chunks = count;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut data = chunk(SIGNATURE_NAME, self.version.as_bytes());
        let mut labels = Vec::new();

        let images = (0..self.image_chunks).map(|i| (format!("ImageDataSeq|{}!", i), vec![0u8; 16]));
        for (label, payload) in self.sections.into_iter().chain(images) {
            let offset = data.len() as u64;
            data.extend(chunk(&label, &payload));
            labels.extend_from_slice(label.as_bytes());
            labels.extend_from_slice(&offset.to_le_bytes());
            labels.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        }

        let map_offset = data.len() as u64;
        data.extend(chunk(LABEL_MAP_NAME, &labels));
        data.extend_from_slice(&map_offset.to_le_bytes());
        data
    }
}

impl Default for Nd2FileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Section Fixtures
// =============================================================================

pub fn image_attributes(width: u32, height: u32, sequence_count: u32) -> Vec<u8> {
    section_payload(
        "SLxImageAttributes",
        level(vec![
            ("uiWidth", Node::U32(width)),
            ("uiHeight", Node::U32(height)),
            ("uiSequenceCount", Node::U32(sequence_count)),
        ]),
    )
}

pub fn image_text_info(values: &[&str]) -> Vec<u8> {
    let entries = values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("TextInfoItem_{}", i), text(v)))
        .collect();
    section_payload("SLxImageTextInfo", Node::Level(entries))
}

pub fn image_calibration(microns: f64) -> Vec<u8> {
    section_payload(
        "SLxCalibration",
        level(vec![("dCalibration", Node::F64(microns))]),
    )
}

/// Metadata sequence with one picture plane per label, keyed `a0`, `a1`, ...
pub fn image_metadata_sequence(channels: &[&str]) -> Vec<u8> {
    let planes = channels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            (
                format!("a{}", i),
                level(vec![("sDescription", text(label))]),
            )
        })
        .collect();

    section_payload(
        "SLxPictureMetadata",
        level(vec![(
            "sPicturePlanes",
            level(vec![("sPlaneNew", Node::Level(planes))]),
        )]),
    )
}

/// One experiment loop record: duration (ms), loop type code, average period (ms).
pub fn loop_record(duration: f64, loop_type: u32, period: f64) -> Node {
    level(vec![
        ("dDuration", Node::F64(duration)),
        ("uiLoopType", Node::U32(loop_type)),
        ("dAvgPeriodDiff", Node::F64(period)),
    ])
}

/// Image metadata with an experiment description, loops, and an optional
/// channel validity bitmap.
pub fn image_metadata(description: &str, loops: Vec<Node>, validity: Option<Vec<u8>>) -> Vec<u8> {
    let period_count = loops.len() as u32;
    let records: Vec<(&str, Node)> = loops.into_iter().map(|l| ("", l)).collect();

    let mut experiment = vec![
        ("wsApplicationDesc", text(description)),
        (
            "uLoopPars",
            level(vec![
                ("uiPeriodCount", Node::U32(period_count)),
                ("pPeriod", level(records)),
            ]),
        ),
    ];

    if let Some(flags) = validity {
        // Repeated "" keys decode as a list, so [0] selects the first entry
        let inner = level(vec![(
            "ppNextLevelEx",
            level(vec![
                ("", level(vec![("pItemValid", Node::Bytes(flags))])),
                ("", level(vec![])),
            ]),
        )]);
        experiment.push((
            "ppNextLevelEx",
            level(vec![("", inner), ("", level(vec![]))]),
        ));
    }

    section_payload("SLxExperiment", level(experiment))
}

/// One ROI keyframe: time (ms), normalized center, normalized size.
pub fn roi_keyframe(time: f64, center: [f64; 3], size: [f64; 3]) -> Node {
    level(vec![
        ("m_dTimeMs", Node::F64(time)),
        ("m_dCenterX", Node::F64(center[0])),
        ("m_dCenterY", Node::F64(center[1])),
        ("m_dCenterZ", Node::F64(center[2])),
        (
            "m_sBoxShape",
            level(vec![
                ("m_dSizeX", Node::F64(size[0])),
                ("m_dSizeY", Node::F64(size[1])),
                ("m_dSizeZ", Node::F64(size[2])),
            ]),
        ),
    ])
}

/// One ROI record with shape and interpretation codes.
pub fn roi_record(shape: u32, interpretation: u32, keyframes: Vec<Node>) -> Node {
    let mut entries = vec![
        (
            "m_sInfo".to_string(),
            level(vec![
                ("m_uiShapeType", Node::U32(shape)),
                ("m_uiInterpType", Node::U32(interpretation)),
            ]),
        ),
        (
            "m_vectAnimParams_Size".to_string(),
            Node::U32(keyframes.len() as u32),
        ),
    ];
    for (i, keyframe) in keyframes.into_iter().enumerate() {
        entries.push((format!("m_vectAnimParams_{}", i), keyframe));
    }
    Node::Level(entries)
}

pub fn roi_metadata(records: Vec<Node>) -> Vec<u8> {
    let mut entries = vec![(
        "m_vectGlobal_Size".to_string(),
        Node::U32(records.len() as u32),
    )];
    for (i, record) in records.into_iter().enumerate() {
        entries.push((format!("m_vectGlobal_{}", i), record));
    }
    section_payload("RoiMetadata_v1", Node::Level(entries))
}

/// A complete FRAP-style acquisition: 512x512 at 0.65 µm/px, three channels
/// (one deleted), 3 fields x 5 frames x 2 Z levels, one ROI and two loops.
pub fn full_file() -> Vec<u8> {
    Nd2FileBuilder::new()
        .section(Section::ImageAttributes, image_attributes(512, 512, 30))
        .section(
            Section::ImageTextInfo,
            image_text_info(&[
                "Andor Zyla VSC-01234",
                "02/13/2016  23:43:37",
                "Metadata:\r\nDimensions: XY(3) x T(5) x Z(2)\r\nCamera Name: Zyla",
            ]),
        )
        .section(Section::ImageCalibration, image_calibration(0.65))
        .section(
            Section::ImageMetadataSequence,
            image_metadata_sequence(&["DAPI", "deleted", "GFP"]),
        )
        .section(
            Section::ImageMetadata,
            image_metadata(
                "FRAP",
                vec![
                    loop_record(1000.0, 1, 100.0),
                    loop_record(2000.0, 6, 50.0),
                    loop_record(1500.0, 1, 100.0),
                ],
                Some(vec![1, 0, 1]),
            ),
        )
        .section(
            Section::RoiMetadata,
            roi_metadata(vec![roi_record(
                3,
                4,
                vec![roi_keyframe(0.0, [0.0, 0.0, 5.0], [1.0, 1.0, 2.0])],
            )]),
        )
        .section(Section::CameraTemperature, f64_payload(&[0.25, 0.2534]))
        .section(Section::AcquisitionTimes, f64_payload(&[0.0, 1500.0, 3000.0]))
        .section(Section::PfsStatus, i32_payload(&[1, 1, 0]))
        .section(
            Section::AppInfo,
            b"<?xml version=\"1.0\"?><AppInfo><Name>NIS-Elements</Name></AppInfo>".to_vec(),
        )
        .image_chunks(4)
        .build()
}
