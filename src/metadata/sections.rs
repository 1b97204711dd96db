//! Per-file section cache.
//!
//! Every named section is read and decoded at most once per open file. The
//! cache has one slot per [`Section`], each a `OnceCell`, so concurrent first
//! requests for the same section share a single read and decode.
//!
//! Fetching never fails. A section that is missing from the label map, whose
//! chunk cannot be read, or whose payload does not decode is reported as
//! absent (and logged), so one damaged section cannot take the rest of the
//! metadata down with it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::format::{
    decode_f64_array, decode_i32_array, decode_variant, decode_xml, read_chunk, LabelMap, Section,
    SectionKind, Variant, XmlNode,
};
use crate::io::RangeReader;

/// A decoded section payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionData {
    Variant(Variant),
    Float64(Arc<[f64]>),
    Int32(Arc<[i32]>),
    Xml(XmlNode),
}

impl SectionData {
    /// Decode raw chunk data the way `kind` prescribes.
    pub fn decode(kind: SectionKind, data: &[u8]) -> Result<Self, DecodeError> {
        Ok(match kind {
            SectionKind::Variant => SectionData::Variant(decode_variant(data, 1)?),
            SectionKind::Float64Array => SectionData::Float64(decode_f64_array(data)?.into()),
            SectionKind::Int32Array => SectionData::Int32(decode_i32_array(data)?.into()),
            SectionKind::Xml => SectionData::Xml(decode_xml(data)?),
        })
    }

    pub fn as_variant(&self) -> Option<&Variant> {
        match self {
            SectionData::Variant(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64_array(&self) -> Option<&Arc<[f64]>> {
        match self {
            SectionData::Float64(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_i32_array(&self) -> Option<&Arc<[i32]>> {
        match self {
            SectionData::Int32(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlNode> {
        match self {
            SectionData::Xml(node) => Some(node),
            _ => None,
        }
    }
}

/// Lazily fetched, decoded sections of one file.
pub struct SectionCache<R> {
    reader: R,
    labels: LabelMap,
    slots: HashMap<Section, OnceCell<Option<SectionData>>>,
    decodes: AtomicUsize,
}

impl<R: RangeReader> SectionCache<R> {
    pub fn new(reader: R, labels: LabelMap) -> Self {
        let slots = Section::ALL
            .iter()
            .map(|&section| (section, OnceCell::new()))
            .collect();

        Self {
            reader,
            labels,
            slots,
            decodes: AtomicUsize::new(0),
        }
    }

    /// Fetch a section, decoding it on first request.
    pub async fn fetch(&self, section: Section) -> Option<&SectionData> {
        let slot = self.slots.get(&section)?;
        slot.get_or_init(|| self.load(section)).await.as_ref()
    }

    /// Fetch a variant-tree section.
    pub async fn variant(&self, section: Section) -> Option<&Variant> {
        self.fetch(section).await?.as_variant()
    }

    /// Fetch an f64 array section.
    pub async fn f64_array(&self, section: Section) -> Option<&Arc<[f64]>> {
        self.fetch(section).await?.as_f64_array()
    }

    /// Fetch an i32 array section.
    pub async fn i32_array(&self, section: Section) -> Option<&Arc<[i32]>> {
        self.fetch(section).await?.as_i32_array()
    }

    /// Fetch an XML section.
    pub async fn xml(&self, section: Section) -> Option<&XmlNode> {
        self.fetch(section).await?.as_xml()
    }

    /// Number of section payloads decoded so far.
    pub fn decode_count(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    async fn load(&self, section: Section) -> Option<SectionData> {
        let Some(offset) = self.labels.get(section) else {
            debug!(section = %section, "Section not present in file");
            return None;
        };

        let data = match read_chunk(&self.reader, offset).await {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    section = %section,
                    offset,
                    file = %self.reader.identifier(),
                    error = %e,
                    "Failed to read section chunk"
                );
                return None;
            }
        };

        if data.is_empty() {
            debug!(section = %section, "Section chunk is empty");
            return None;
        }

        self.decodes.fetch_add(1, Ordering::SeqCst);
        match SectionData::decode(section.kind(), &data) {
            Ok(decoded) => {
                debug!(section = %section, bytes = data.len(), "Decoded section");
                Some(decoded)
            }
            Err(e) => {
                warn!(
                    section = %section,
                    file = %self.reader.identifier(),
                    error = %e,
                    "Failed to decode section"
                );
                None
            }
        }
    }
}
