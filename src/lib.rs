//! # nd2-metadata
//!
//! Metadata extraction for Nikon ND2 microscopy files, read through byte-range
//! requests from local disk or S3-compatible object storage.
//!
//! Only the signature chunk, the label map and the metadata chunks a caller
//! asks for are read. Image planes are never touched, so inspecting a
//! multi-gigabyte acquisition stored in S3 costs a handful of range requests.
//!
//! ## Architecture
//!
//! - [`io`] - range readers for local files and S3, plus a block cache
//! - [`mod@format`] - ND2 container framing and section payload decoders
//! - [`metadata`] - section cache, field parsers and the canonical model
//! - [`reader`] - the [`Nd2Reader`] file handle
//! - [`config`] - CLI configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use nd2_metadata::{FileRangeReader, Nd2Reader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = FileRangeReader::open("acquisition.nd2").await?;
//!     let reader = Nd2Reader::open(source).await?;
//!
//!     let metadata = reader.metadata().await;
//!     println!("{} channels, {} frames", metadata.channels.len(), metadata.num_frames);
//!
//!     if let Some(times) = reader.raw().acquisition_times().await {
//!         for seconds in &times {
//!             println!("{seconds:.3}s");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod metadata;
pub mod reader;

// Re-export commonly used types
pub use config::{Cli, Command, InspectConfig, OutputFormat, SectionsConfig, SourceConfig};
pub use error::{DecodeError, IoError, Nd2Error};
pub use format::{
    decode_variant, decode_xml, parse_date, parse_date_str, parse_version, Field, LabelMap,
    ScaledSeries, Section, SectionKind, Step, Variant, XmlNode,
};
pub use io::{
    create_s3_client, BlockCache, FileRangeReader, RangeReader, S3RangeReader, DEFAULT_BLOCK_SIZE,
    DEFAULT_CACHE_CAPACITY,
};
pub use metadata::{
    Experiment, ExperimentLoop, Metadata, Point3, RawMetadata, Roi, RoiShape, RoiType,
    SectionCache, SectionData,
};
pub use reader::Nd2Reader;
