//! ND2 chunk framing and file version detection.
//!
//! # Chunk Structure
//!
//! ```text
//! Bytes 0-3:   Magic (0x0ABECEDA, little-endian)
//! Bytes 4-7:   Name length in bytes
//! Bytes 8-15:  Data length in bytes
//! Bytes 16-..: Name, then data
//! ```
//!
//! The first chunk of every file is the signature chunk, whose name and data
//! read `ND2 FILE SIGNATURE CHUNK NAME01!Ver3.0`.

use bytes::Bytes;

use crate::error::Nd2Error;
use crate::io::{read_u32_le, read_u64_le, RangeReader};

/// Magic number at the start of every chunk
pub const CHUNK_MAGIC: u32 = 0x0ABE_CEDA;

/// Size of a chunk header in bytes
pub const CHUNK_HEADER_SIZE: usize = 16;

/// How many leading bytes are searched for the version signature
const VERSION_PROBE_BYTES: u64 = 112;

/// Oldest major version whose label map layout is understood
const MIN_MAJOR_VERSION: u32 = 3;

/// Parsed chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Length of the chunk name that precedes the data
    pub name_length: u32,

    /// Length of the chunk data
    pub data_length: u64,
}

impl ChunkHeader {
    /// Parse a chunk header located at `offset`.
    ///
    /// `offset` is only used for error reporting.
    pub fn parse(bytes: &[u8], offset: u64) -> Result<Self, Nd2Error> {
        if bytes.len() < CHUNK_HEADER_SIZE {
            return Err(Nd2Error::FileTooSmall {
                required: CHUNK_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        let magic = read_u32_le(&bytes[0..4]);
        if magic != CHUNK_MAGIC {
            return Err(Nd2Error::InvalidChunkMagic {
                offset,
                found: magic,
            });
        }

        Ok(Self {
            name_length: read_u32_le(&bytes[4..8]),
            data_length: read_u64_le(&bytes[8..16]),
        })
    }

    /// Absolute offset of the chunk data, given the chunk's own offset.
    #[inline]
    pub fn data_offset(&self, chunk_offset: u64) -> u64 {
        chunk_offset.saturating_add(CHUNK_HEADER_SIZE as u64 + self.name_length as u64)
    }
}

/// Read the data of the chunk starting at `offset`.
pub async fn read_chunk<R: RangeReader>(reader: &R, offset: u64) -> Result<Bytes, Nd2Error> {
    let header_bytes = reader.read_exact_at(offset, CHUNK_HEADER_SIZE).await?;
    let header = ChunkHeader::parse(&header_bytes, offset)?;

    let data = reader
        .read_exact_at(header.data_offset(offset), header.data_length as usize)
        .await?;
    Ok(data)
}

/// Quick check whether bytes start with an ND2 chunk.
pub fn is_nd2_header(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && read_u32_le(&bytes[0..4]) == CHUNK_MAGIC
}

/// Extract `(major, minor)` from a `Ver<major>.<minor>` signature.
pub fn parse_version(data: &[u8]) -> Option<(u32, u32)> {
    let start = data.windows(3).position(|w| w == b"Ver")? + 3;
    let rest = &data[start..];

    let (major, rest) = take_number(rest)?;
    let rest = rest.strip_prefix(b".")?;
    let (minor, _) = take_number(rest)?;
    Some((major, minor))
}

fn take_number(data: &[u8]) -> Option<(u32, &[u8])> {
    let digits = data.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let value = std::str::from_utf8(&data[..digits]).ok()?.parse().ok()?;
    Some((value, &data[digits..]))
}

/// Read and validate the file version from the signature chunk.
pub async fn read_version<R: RangeReader>(reader: &R) -> Result<(u32, u32), Nd2Error> {
    let size = reader.size();
    if size < CHUNK_HEADER_SIZE as u64 {
        return Err(Nd2Error::FileTooSmall {
            required: CHUNK_HEADER_SIZE as u64,
            actual: size,
        });
    }

    let probe = reader
        .read_exact_at(0, size.min(VERSION_PROBE_BYTES) as usize)
        .await?;
    ChunkHeader::parse(&probe, 0)?;

    let (major, minor) = parse_version(&probe).ok_or(Nd2Error::MissingVersion)?;
    if major < MIN_MAJOR_VERSION {
        return Err(Nd2Error::UnsupportedVersion { major, minor });
    }

    Ok((major, minor))
}
