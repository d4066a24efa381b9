//! Display formatting for cell values and label measurement.
//!
//! Every piece of text the grid hands to a render surface goes through
//! [`display_value`], and substring filters match against that same text.

use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat};

use crate::types::{CellValue, Timestamp};

/// Average glyph advance used when no real text metrics are available.
pub const DEFAULT_CHAR_WIDTH: u32 = 7;

/// Format a cell value for display.
///
/// Numbers use the shortest round-trip form (`4`, `4.5`, `-0.25`), dates are
/// RFC 3339 in UTC with millisecond precision, and empty cells are blank.
pub fn display_value(value: &CellValue) -> Cow<'_, str> {
    match value {
        CellValue::Number(n) => Cow::Owned(format_number(*n)),
        CellValue::Text(s) => Cow::Borrowed(s.as_str()),
        CellValue::Date(ts) => Cow::Owned(format_date(*ts)),
        CellValue::Empty => Cow::Borrowed(""),
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // Avoid "-0"
        return "0".to_string();
    }
    n.to_string()
}

/// Format a timestamp as `2024-01-31T12:00:00.000Z`.
///
/// Out-of-range instants fall back to the raw millisecond count.
pub fn format_date(ts: Timestamp) -> String {
    DateTime::from_timestamp_millis(ts.millis).map_or_else(
        || ts.millis.to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}

/// Estimate the rendered width of a label at a fixed glyph advance.
pub fn estimate_text_width(text: &str, char_width: u32) -> u32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    chars.saturating_mul(char_width)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_numbers_have_no_fraction() {
        assert_eq!(display_value(&CellValue::Number(4.0)), "4");
        assert_eq!(display_value(&CellValue::Number(1996.0)), "1996");
    }

    #[test]
    fn test_fractional_and_negative_numbers() {
        assert_eq!(display_value(&CellValue::Number(4.5)), "4.5");
        assert_eq!(display_value(&CellValue::Number(-0.25)), "-0.25");
        assert_eq!(display_value(&CellValue::Number(-0.0)), "0");
    }

    #[test]
    fn test_non_finite_numbers() {
        assert_eq!(display_value(&CellValue::Number(f64::NAN)), "NaN");
        assert_eq!(display_value(&CellValue::Number(f64::INFINITY)), "Infinity");
        assert_eq!(display_value(&CellValue::Number(f64::NEG_INFINITY)), "-Infinity");
    }

    #[test]
    fn test_date_is_rfc3339_utc() {
        let value = CellValue::Date(Timestamp::from_millis(86_400_000));
        assert_eq!(display_value(&value), "1970-01-02T00:00:00.000Z");
    }

    #[test]
    fn test_empty_and_text() {
        assert_eq!(display_value(&CellValue::Empty), "");
        assert_eq!(display_value(&CellValue::from("abc")), "abc");
    }

    #[test]
    fn test_estimate_text_width_counts_chars_not_bytes() {
        assert_eq!(estimate_text_width("abc", 7), 21);
        assert_eq!(estimate_text_width("héllo", 10), 50);
        assert_eq!(estimate_text_width("", 10), 0);
    }
}
