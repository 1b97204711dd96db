//! Acquisition extents from the human-readable dimension line.
//!
//! The structured counters for fields of view, frames and Z levels are
//! unreliable across file versions (missing, or stored with a different
//! type). The text-info section always carries a line like
//!
//! ```text
//! Dimensions: XY(3) x T(5) x Z(2)
//! ```
//!
//! so the extents are read from that instead.

use crate::format::Variant;

const DIMENSIONS_TOKEN: &str = "Dimensions:";
const ENTRY_SEPARATOR: &str = "\r\n";

/// Acquisition axis whose extent is read from the dimension line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    FieldOfView,
    Frame,
    ZLevel,
}

impl Axis {
    /// Markers that open this axis' count, e.g. `XY(`.
    fn markers(self) -> &'static [&'static str] {
        match self {
            Axis::FieldOfView => &["XY("],
            Axis::Frame => &["T(", "T'("],
            Axis::ZLevel => &["Z("],
        }
    }
}

/// Find the `Dimensions:` entry among the text-info values.
///
/// `text_info` is the `SLxImageTextInfo` map. Values are multi-line
/// strings; the entry is the line that itself starts with the token.
pub fn dimension_text(text_info: &Variant) -> Option<&str> {
    text_info
        .entries()?
        .iter()
        .filter_map(|(_, value)| value.as_str())
        .filter(|line| line.contains(DIMENSIONS_TOKEN))
        .find_map(|line| {
            line.split(ENTRY_SEPARATOR)
                .find(|entry| entry.starts_with(DIMENSIONS_TOKEN))
        })
}

/// Index sequence `0..count` for an axis.
///
/// Falls back to `[0]` (a single implicit position) when there is no
/// dimension line or the axis does not appear in it.
pub fn parse_dimension(text: Option<&str>, axis: Axis) -> Vec<usize> {
    match text.and_then(|t| axis_count(t, axis)) {
        Some(count) => (0..count).collect(),
        None => vec![0],
    }
}

/// Leftmost `<marker><digits>)` occurrence for the axis.
fn axis_count(text: &str, axis: Axis) -> Option<usize> {
    (0..text.len())
        .filter(|&i| text.is_char_boundary(i))
        .find_map(|i| {
            let rest = &text[i..];
            axis.markers()
                .iter()
                .find_map(|&marker| rest.strip_prefix(marker).and_then(closed_number))
        })
}

/// Parse `<digits>)` at the start of `text`.
fn closed_number(text: &str) -> Option<usize> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || text.as_bytes().get(digits) != Some(&b')') {
        return None;
    }
    text[..digits].parse().ok()
}
