use serde::{Deserialize, Serialize};

/// Active substring filter.
///
/// `column` is a source column index, so the filter follows its column
/// through moves.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    pub column: usize,
    pub text: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Whether a filter call changed row visibility state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Same spec as the active one; nothing was recomputed
    Unchanged,
    Changed,
}

/// Sort direction for an explicit sort request.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn is_descending(self) -> bool {
        matches!(self, Self::Descending)
    }

    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}
