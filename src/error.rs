use thiserror::Error;

/// I/O errors that can occur when reading byte ranges from local or remote storage
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object or file not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local filesystem error
    #[error("File error: {0}")]
    File(String),
}

/// Errors in the ND2 container structure itself.
///
/// These are only raised while opening a file. Once a file is open, problems
/// inside individual metadata sections surface as absent values instead.
#[derive(Debug, Clone, Error)]
pub enum Nd2Error {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Chunk header does not start with the ND2 chunk magic
    #[error("Invalid chunk magic at offset {offset}: expected 0x0ABECEDA, got 0x{found:08X}")]
    InvalidChunkMagic { offset: u64, found: u32 },

    /// File is too small to contain the required structure
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// No `Ver<major>.<minor>` signature in the file header
    #[error("Missing version signature in file header")]
    MissingVersion,

    /// Version older than the label-map layout this crate understands
    #[error("Unsupported ND2 version {major}.{minor} (only 3.x and later are supported)")]
    UnsupportedVersion { major: u32, minor: u32 },

    /// Label map offset points outside the file
    #[error("Invalid label map offset: {0}")]
    InvalidLabelMapOffset(u64),
}

/// Errors produced while decoding a section payload.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// Input ended in the middle of an item
    #[error("Unexpected end of data at byte {position} (needed {needed} more)")]
    Truncated { position: usize, needed: usize },

    /// Variant item carries a type code we cannot decode
    #[error("Unknown variant item type {code} for key {key:?}")]
    UnknownItemType { code: u8, key: String },

    /// Nested level header declares a length shorter than its own header
    #[error("Invalid level length {length} for key {key:?}")]
    InvalidLevelLength { key: String, length: u64 },

    /// Numeric array byte length is not a multiple of the element size
    #[error("Array of {len} bytes is not a multiple of element size {element_size}")]
    MisalignedArray { len: usize, element_size: usize },

    /// XML section could not be parsed
    #[error("XML error: {0}")]
    Xml(String),

    /// XML section has no root element
    #[error("XML section has no root element")]
    EmptyXml,
}
