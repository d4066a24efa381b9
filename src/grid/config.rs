//! Grid configuration.
//!
//! Field names are camelCase so the object handed to the JS constructor
//! deserializes directly.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::columns::{ColumnDefaults, LABEL_PADDING, MIN_COLUMN_WIDTH};
use crate::error::{GridError, Result};
use crate::layout::{BUFFER_ROWS, RESIZE_HANDLE_PIXELS};
use crate::types::{ColumnSpec, SortDirection};

fn default_buffer_rows() -> usize {
    BUFFER_ROWS
}

fn default_true() -> bool {
    true
}

fn default_min_column_width() -> u32 {
    MIN_COLUMN_WIDTH
}

fn default_label_padding() -> u32 {
    LABEL_PADDING
}

fn default_resize_handle() -> u32 {
    RESIZE_HANDLE_PIXELS
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    pub columns: Vec<ColumnSpec>,
    /// Viewport height in pixels
    pub height: u32,
    /// Initial sort column, by name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_column: Option<String>,
    #[serde(default)]
    pub sort_descending: bool,
    /// Rows in a window anchored at the top of the data, buffer included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_to_render: Option<usize>,
    #[serde(default = "default_buffer_rows")]
    pub buffer_rows: usize,
    #[serde(default = "default_true")]
    pub resizable_columns: bool,
    #[serde(default = "default_true")]
    pub sortable_columns: bool,
    #[serde(default = "default_true")]
    pub movable_columns: bool,
    #[serde(default = "default_min_column_width")]
    pub min_column_width: u32,
    #[serde(default = "default_label_padding")]
    pub label_padding: u32,
    /// Width of the header resize hit zone
    #[serde(default = "default_resize_handle")]
    pub resize_handle: u32,
}

impl GridConfig {
    /// Config with every optional field at its default.
    pub fn new(columns: Vec<ColumnSpec>, height: u32) -> Self {
        Self {
            columns,
            height,
            sort_column: None,
            sort_descending: false,
            rows_to_render: None,
            buffer_rows: BUFFER_ROWS,
            resizable_columns: true,
            sortable_columns: true,
            movable_columns: true,
            min_column_width: MIN_COLUMN_WIDTH,
            label_padding: LABEL_PADDING,
            resize_handle: RESIZE_HANDLE_PIXELS,
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_column = Some(column.into());
        self.sort_descending = direction.is_descending();
        self
    }

    #[must_use]
    pub fn with_rows_to_render(mut self, rows: usize) -> Self {
        self.rows_to_render = Some(rows);
        self
    }

    #[must_use]
    pub fn with_buffer_rows(mut self, rows: usize) -> Self {
        self.buffer_rows = rows;
        self
    }

    #[must_use]
    pub fn with_movable_columns(mut self, movable: bool) -> Self {
        self.movable_columns = movable;
        self
    }

    pub fn sort_direction(&self) -> SortDirection {
        SortDirection::from_descending(self.sort_descending)
    }

    /// Defaults applied to columns that leave a field unset.
    pub fn column_defaults(&self) -> ColumnDefaults {
        ColumnDefaults {
            min_width: self.min_column_width,
            label_padding: self.label_padding,
            resizable: self.resizable_columns,
            sortable: self.sortable_columns,
        }
    }

    /// Reject configurations no grid can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(GridError::Config("columns array missing or empty".into()));
        }
        if self.height == 0 {
            return Err(GridError::Config("height must be positive".into()));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.is_empty() {
                return Err(GridError::Config("column name must not be empty".into()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(GridError::Config(format!(
                    "duplicate column name: {}",
                    column.name
                )));
            }
        }
        if let Some(sort) = &self.sort_column {
            if !seen.contains(sort.as_str()) {
                return Err(GridError::Config(format!("unknown sort column: {sort}")));
            }
        }
        if let Some(rows) = self.rows_to_render {
            if rows < self.buffer_rows {
                return Err(GridError::Config(format!(
                    "rowsToRender ({rows}) is smaller than bufferRows ({})",
                    self.buffer_rows
                )));
            }
        }
        Ok(())
    }
}
