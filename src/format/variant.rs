//! Tagged binary variant trees.
//!
//! Most ND2 metadata sections (`...LV!` labels) are serialized as a sequence
//! of tagged items:
//!
//! ```text
//! u8   type code
//! u8   name length in UTF-16 code units, including the terminator
//! ...  name, UTF-16LE, NUL-terminated
//! ...  value, layout depends on the type code
//! ```
//!
//! | code | value                                                          |
//! |------|----------------------------------------------------------------|
//! | 1    | u8 (used for booleans)                                         |
//! | 2    | i32                                                            |
//! | 3    | u32                                                            |
//! | 4    | i64                                                            |
//! | 5    | u64                                                            |
//! | 6    | f64                                                            |
//! | 7    | u64 pointer                                                    |
//! | 8    | UTF-16LE string, NUL-terminated                                |
//! | 9    | u64 length, then that many bytes                               |
//! | 11   | nested level: u32 item count, u64 length, items, offset table  |
//!
//! A level's length is measured from the start of its own item (type code
//! included) to the end of its nested items. The table of `count` u64
//! offsets that follows is skipped.
//!
//! Keys can repeat within one level. The second occurrence turns the entry
//! into a [`Variant::List`] holding every value in file order.

use crate::error::DecodeError;
use crate::io::{read_f64_le, read_i32_le, read_u32_le, read_u64_le};

/// A decoded node of a variant tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    U8(u8),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
    Pointer(u64),
    String(String),
    Bytes(Vec<u8>),
    /// Keyed entries in file order
    Map(Vec<(String, Variant)>),
    /// Values of a key that appeared more than once
    List(Vec<Variant>),
}

impl Variant {
    /// Look up a key in a map node.
    pub fn get(&self, key: &str) -> Option<&Variant> {
        self.entries()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Index into a list node.
    pub fn at(&self, index: usize) -> Option<&Variant> {
        self.as_list()?.get(index)
    }

    pub fn entries(&self) -> Option<&[(String, Variant)]> {
        match self {
            Variant::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Variant]> {
        match self {
            Variant::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Variant::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Any numeric node as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Variant::U8(v) => Some(v as f64),
            Variant::I32(v) => Some(v as f64),
            Variant::U32(v) => Some(v as f64),
            Variant::I64(v) => Some(v as f64),
            Variant::U64(v) => Some(v as f64),
            Variant::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Any non-negative integer node as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Variant::U8(v) => Some(v as u64),
            Variant::U32(v) => Some(v as u64),
            Variant::U64(v) => Some(v),
            Variant::I32(v) => u64::try_from(v).ok(),
            Variant::I64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Truthiness of a scalar node (non-zero numbers are true).
    pub fn as_bool(&self) -> Option<bool> {
        self.as_f64().map(|v| v != 0.0)
    }

    /// Short name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Variant::U8(_) => "u8",
            Variant::I32(_) => "i32",
            Variant::U32(_) => "u32",
            Variant::I64(_) => "i64",
            Variant::U64(_) => "u64",
            Variant::F64(_) => "f64",
            Variant::Pointer(_) => "pointer",
            Variant::String(_) => "string",
            Variant::Bytes(_) => "bytes",
            Variant::Map(_) => "map",
            Variant::List(_) => "list",
        }
    }
}

// =============================================================================
// Decoder
// =============================================================================

const TYPE_U8: u8 = 1;
const TYPE_I32: u8 = 2;
const TYPE_U32: u8 = 3;
const TYPE_I64: u8 = 4;
const TYPE_U64: u8 = 5;
const TYPE_F64: u8 = 6;
const TYPE_POINTER: u8 = 7;
const TYPE_STRING: u8 = 8;
const TYPE_BYTES: u8 = 9;
const TYPE_LEVEL: u8 = 11;

/// Decode up to `count` top-level items into a map node.
///
/// Decoding stops early, without error, if the input ends on an item
/// boundary. Section payloads are decoded with `count = 1`.
pub fn decode_variant(data: &[u8], count: usize) -> Result<Variant, DecodeError> {
    let mut cursor = Cursor::new(data);
    decode_items(&mut cursor, count).map(Variant::Map)
}

fn decode_items(
    cursor: &mut Cursor<'_>,
    count: usize,
) -> Result<Vec<(String, Variant)>, DecodeError> {
    let mut entries: Vec<(String, Variant)> = Vec::new();

    for _ in 0..count {
        if cursor.remaining() == 0 {
            break;
        }
        let (key, value) = decode_item(cursor)?;
        insert(&mut entries, key, value);
    }

    Ok(entries)
}

fn insert(entries: &mut Vec<(String, Variant)>, key: String, value: Variant) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some((_, Variant::List(items))) => items.push(value),
        Some((_, existing)) => {
            let first = std::mem::replace(existing, Variant::List(Vec::new()));
            *existing = Variant::List(vec![first, value]);
        }
        None => entries.push((key, value)),
    }
}

fn decode_item(cursor: &mut Cursor<'_>) -> Result<(String, Variant), DecodeError> {
    let item_start = cursor.pos;
    let header = cursor.take(2)?;
    let (code, name_units) = (header[0], header[1] as usize);

    let name_bytes = cursor.take(name_units * 2)?;
    let key = utf16_trimmed(name_bytes);

    let value = match code {
        TYPE_U8 => Variant::U8(cursor.take(1)?[0]),
        TYPE_I32 => Variant::I32(read_i32_le(cursor.take(4)?)),
        TYPE_U32 => Variant::U32(read_u32_le(cursor.take(4)?)),
        TYPE_I64 => Variant::I64(read_u64_le(cursor.take(8)?) as i64),
        TYPE_U64 => Variant::U64(read_u64_le(cursor.take(8)?)),
        TYPE_F64 => Variant::F64(read_f64_le(cursor.take(8)?)),
        TYPE_POINTER => Variant::Pointer(read_u64_le(cursor.take(8)?)),
        TYPE_STRING => Variant::String(cursor.take_utf16_string()?),
        TYPE_BYTES => {
            let len = read_u64_le(cursor.take(8)?) as usize;
            Variant::Bytes(cursor.take(len)?.to_vec())
        }
        TYPE_LEVEL => {
            let count = read_u32_le(cursor.take(4)?) as usize;
            let length = read_u64_le(cursor.take(8)?);

            let consumed = (cursor.pos - item_start) as u64;
            if length < consumed {
                return Err(DecodeError::InvalidLevelLength { key, length });
            }
            let body = cursor.take((length - consumed) as usize)?;
            let entries = decode_items(&mut Cursor::new(body), count)?;

            cursor.skip(count * 8);
            Variant::Map(entries)
        }
        other => {
            return Err(DecodeError::UnknownItemType { code: other, key });
        }
    };

    Ok((key, value))
}

/// Decode UTF-16LE and drop the NUL terminator (and anything after it).
fn utf16_trimmed(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::Truncated {
                position: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Skip up to `len` bytes, stopping at the end of input.
    fn skip(&mut self, len: usize) {
        self.pos += len.min(self.remaining());
    }

    fn take_utf16_string(&mut self) -> Result<String, DecodeError> {
        let start = self.pos;
        loop {
            let unit = self.take(2)?;
            if unit == [0, 0] {
                break;
            }
        }
        Ok(utf16_trimmed(&self.data[start..self.pos]))
    }
}
