//! Render surface trait for pluggable output targets.
//!
//! The grid only needs a handful of primitives from whatever draws rows:
//! insert or remove a materialized row at either end of the window, rewrite
//! one cell, size the spacers and columns, and report row height and scroll
//! offset. Everything else about presentation belongs to the surface.
//!
//! Column slots count visible columns only, left to right. Row slots count
//! materialized rows from the top of the window.

use crate::error::Result;
use crate::format::{estimate_text_width, DEFAULT_CHAR_WIDTH};
use crate::layout::Spacers;
use crate::types::SortDirection;

/// Measures label text for default column widths.
pub trait TextMetrics {
    fn text_width(&self, text: &str) -> u32;
}

/// Fixed advance per character, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWidthMetrics(pub u32);

impl Default for FixedWidthMetrics {
    fn default() -> Self {
        Self(DEFAULT_CHAR_WIDTH)
    }
}

impl TextMetrics for FixedWidthMetrics {
    fn text_width(&self, text: &str) -> u32 {
        estimate_text_width(text, self.0)
    }
}

/// Which end of the materialized window a row is inserted at or removed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAnchor {
    /// Directly below the top spacer
    Top,
    /// Directly above the bottom spacer
    Bottom,
}

/// One visible header cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    pub name: String,
    pub label: String,
    pub width: u32,
    /// Set on the column the rows are sorted by
    pub sort: Option<SortDirection>,
}

/// Output target for a grid.
pub trait RenderSurface: TextMetrics {
    /// Replace the header row and column widths.
    fn render_header(&mut self, cells: &[HeaderCell]) -> Result<()>;

    /// Materialize the visible row `row` at one end of the window.
    fn insert_row(&mut self, anchor: RowAnchor, row: usize, cells: &[&str]) -> Result<()>;

    /// Remove the materialized row at one end of the window.
    fn remove_row(&mut self, anchor: RowAnchor) -> Result<()>;

    /// Remove every materialized row, keeping the spacers.
    fn clear_rows(&mut self) -> Result<()>;

    /// Rewrite the text of one materialized cell.
    fn set_cell_text(&mut self, slot: usize, column: usize, text: &str) -> Result<()>;

    fn set_spacers(&mut self, spacers: Spacers) -> Result<()>;

    /// Resize one column's header and body cells.
    fn set_column_width(&mut self, column: usize, width: u32) -> Result<()>;

    /// Pixel height of one materialized row, once any exist.
    fn measure_row_height(&self) -> Option<u32>;

    /// Current vertical scroll offset in pixels.
    fn scroll_top(&self) -> u32;

    fn set_scroll_top(&mut self, scroll_top: u32) -> Result<()>;

    /// Number of materialized data rows, spacers excluded.
    fn materialized_len(&self) -> usize;
}
