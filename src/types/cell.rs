use serde::{Deserialize, Serialize};

/// A point in time, stored as milliseconds since the Unix epoch.
///
/// Serialized as `{"date": <millis>}` so that JSON rows can carry dates
/// alongside plain numbers and strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    #[serde(rename = "date")]
    pub millis: i64,
}

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }
}

/// One raw cell value as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Date(Timestamp),
    /// Missing value (JSON `null`, or a column added after the row arrived)
    #[default]
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Timestamp> for CellValue {
    fn from(t: Timestamp) -> Self {
        Self::Date(t)
    }
}
