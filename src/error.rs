//! Structured error types for atable.
//!
//! Invalid arguments are reported before any state is touched, so an `Err`
//! always leaves the grid exactly as it was.

/// All errors that can occur while configuring or driving a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Construction-time configuration problem. Fatal: no grid is built.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A column with this name already exists.
    #[error("Duplicate column name: {0}")]
    DuplicateName(String),

    /// No column with this name exists.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Column labels must be non-empty.
    #[error("Invalid column label for {0}: label must not be empty")]
    InvalidLabel(String),

    /// A column position that has no column.
    #[error("Invalid column index: {index} (table has {len} columns)")]
    IndexOutOfRange { index: usize, len: usize },

    /// A visible-row index past the end of the filtered dataset.
    #[error("Invalid row index: {index} ({len} visible rows)")]
    RowOutOfRange { index: usize, len: usize },

    /// A table keeps at least one column.
    #[error("Cannot remove the last column: {0}")]
    LastColumn(String),

    /// Column moves are disabled for this table.
    #[error("Columns are not movable: cannot move {0}")]
    NotMovable(String),

    /// The column was configured as not sortable.
    #[error("Column is not sortable: {0}")]
    NotSortable(String),

    /// The column was configured as not resizable.
    #[error("Column is not resizable: {0}")]
    NotResizable(String),

    /// The data source delivered something that is not a list of rows.
    #[error("Malformed row data: {0}")]
    InvalidData(String),

    /// The render surface rejected an operation.
    #[error("Render surface error: {0}")]
    Surface(String),

    /// Configuration JSON could not be parsed.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for GridError {
    fn from(v: wasm_bindgen::JsValue) -> Self {
        Self::Surface(v.as_string().unwrap_or_else(|| format!("{v:?}")))
    }
}
