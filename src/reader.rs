//! ND2 file handle.
//!
//! [`Nd2Reader`] validates the file container once on open (signature chunk,
//! version, label map) and then hands out metadata lazily. Opening is the
//! only step that can fail: after that, section problems only ever show up
//! as missing values.

use tracing::{debug, info};

use crate::error::Nd2Error;
use crate::format::{read_version, LabelMap, Section};
use crate::io::RangeReader;
use crate::metadata::{Metadata, RawMetadata};

/// An open ND2 file.
pub struct Nd2Reader<R> {
    version: (u32, u32),
    image_count: usize,
    identifier: String,
    raw: RawMetadata<R>,
}

impl<R: RangeReader> Nd2Reader<R> {
    /// Open an ND2 file.
    ///
    /// Reads the version from the signature chunk and the label map from the
    /// file trailer. No metadata section is read yet.
    pub async fn open(reader: R) -> Result<Self, Nd2Error> {
        let identifier = reader.identifier().to_string();

        let version = read_version(&reader).await?;
        debug!(file = %identifier, major = version.0, minor = version.1, "Read ND2 version");

        let labels = LabelMap::read(&reader).await?;
        let image_count = labels.image_chunk_count();

        info!(
            file = %identifier,
            version = %format!("{}.{}", version.0, version.1),
            sections = labels.sections().count(),
            images = image_count,
            "Opened ND2 file"
        );

        Ok(Self {
            version,
            image_count,
            identifier,
            raw: RawMetadata::new(reader, labels),
        })
    }

    /// File format version as `(major, minor)`.
    pub fn version(&self) -> (u32, u32) {
        self.version
    }

    /// Resolved section offsets.
    pub fn label_map(&self) -> &LabelMap {
        self.raw.sections().labels()
    }

    /// Sections present in the file, with their chunk offsets.
    pub fn sections(&self) -> impl Iterator<Item = (Section, u64)> + '_ {
        self.label_map().sections()
    }

    /// Number of image data chunks.
    pub fn image_count(&self) -> usize {
        self.image_count
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Canonical metadata, assembled on first call and cached.
    pub async fn metadata(&self) -> &Metadata {
        self.raw.parsed_metadata().await
    }

    /// Raw section access.
    pub fn raw(&self) -> &RawMetadata<R> {
        &self.raw
    }
}
