//! Sort keys and the row comparator.
//!
//! Keys are extracted once per row before sorting. Descending text keys are
//! case-folded up front and compared in reverse, so the comparator never
//! allocates.

use std::cmp::Ordering;

use crate::types::CellValue;

/// A cell value reduced to what the comparator needs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SortKey {
    Empty,
    Number(f64),
    Date(i64),
    Text(String),
}

impl SortKey {
    pub(crate) fn from_value(value: &CellValue, descending: bool) -> Self {
        match value {
            CellValue::Empty => Self::Empty,
            CellValue::Number(n) => Self::Number(*n),
            CellValue::Date(ts) => Self::Date(ts.millis),
            CellValue::Text(s) if descending => Self::Text(s.to_lowercase()),
            CellValue::Text(s) => Self::Text(s.clone()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Number(_) => 1,
            Self::Date(_) => 2,
            Self::Text(_) => 3,
        }
    }

    fn ascending_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Compare two keys under a sort direction.
    ///
    /// Mixed kinds order as empty < number < date < text when ascending.
    pub(crate) fn directed_cmp(&self, other: &Self, descending: bool) -> Ordering {
        let ord = self.ascending_cmp(other);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn key(v: impl Into<CellValue>, desc: bool) -> SortKey {
        SortKey::from_value(&v.into(), desc)
    }

    #[test]
    fn test_numbers_compare_numerically() {
        assert_eq!(
            key(9.0, false).directed_cmp(&key(10.0, false), false),
            Ordering::Less
        );
        assert_eq!(
            key(9.0, true).directed_cmp(&key(10.0, true), true),
            Ordering::Greater
        );
    }

    #[test]
    fn test_dates_compare_by_instant() {
        let early = key(Timestamp::from_millis(1), false);
        let late = key(Timestamp::from_millis(2), false);
        assert_eq!(early.directed_cmp(&late, false), Ordering::Less);
    }

    #[test]
    fn test_ascending_text_is_raw_lexicographic() {
        // Uppercase sorts before lowercase byte-wise
        assert_eq!(
            key("Zed", false).directed_cmp(&key("apple", false), false),
            Ordering::Less
        );
    }

    #[test]
    fn test_descending_text_is_case_folded_reverse() {
        assert_eq!(
            key("Zed", true).directed_cmp(&key("apple", true), true),
            Ordering::Less
        );
        assert_eq!(
            key("ÉCOLE", true).directed_cmp(&key("école", true), true),
            Ordering::Equal
        );
    }

    #[test]
    fn test_mixed_kinds_rank() {
        assert_eq!(
            SortKey::Empty.directed_cmp(&key(1.0, false), false),
            Ordering::Less
        );
        assert_eq!(
            key("a", false).directed_cmp(&key(1.0, false), false),
            Ordering::Greater
        );
    }
}
