//! Decoders for the ND2 container and its section payloads.
//!
//! - [`chunk`]: chunk framing and file version
//! - [`labels`]: section names and the label map that locates them
//! - [`variant`]: tagged binary variant trees
//! - [`fields`]: named labels and path lookup inside variant trees
//! - [`arrays`]: raw numeric array sections
//! - [`xml`]: XML sections
//! - [`date`]: acquisition date strings

pub mod arrays;
pub mod chunk;
pub mod date;
pub mod fields;
pub mod labels;
pub mod variant;
pub mod xml;

pub use arrays::{decode_f64_array, decode_i32_array, ScaledSeries};
pub use chunk::{
    is_nd2_header, parse_version, read_chunk, read_version, ChunkHeader, CHUNK_HEADER_SIZE,
    CHUNK_MAGIC,
};
pub use date::{parse_date, parse_date_str};
pub use fields::{Field, Step};
pub use labels::{LabelMap, Section, SectionKind};
pub use variant::{decode_variant, Variant};
pub use xml::{decode_xml, XmlNode};
