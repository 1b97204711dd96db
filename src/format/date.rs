//! Acquisition date parsing.
//!
//! The text-info section does not label which entry holds the date, and
//! files switch between 12- and 24-hour clocks, so every string value is
//! tried against both layouts.

use chrono::NaiveDateTime;

use super::variant::Variant;

const FORMAT_24H: &str = "%m/%d/%Y %H:%M:%S";
const FORMAT_12H: &str = "%m/%d/%Y %I:%M:%S %p";

/// Parse one date string in either supported layout.
///
/// Runs of whitespace are collapsed first, since files commonly put two
/// spaces between the date and the time.
pub fn parse_date_str(text: &str) -> Option<NaiveDateTime> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    NaiveDateTime::parse_from_str(&normalized, FORMAT_24H)
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, FORMAT_12H))
        .ok()
}

/// Return the first string value of a text-info map that parses as a date.
pub fn parse_date(text_info: &Variant) -> Option<NaiveDateTime> {
    text_info
        .entries()?
        .iter()
        .filter_map(|(_, value)| value.as_str())
        .find_map(parse_date_str)
}
