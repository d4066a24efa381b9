//! Headless render surface.
//!
//! Keeps materialized rows in a deque and counts every operation applied to
//! it, so tests and benchmarks can assert both on what is rendered and on how
//! much work it took to get there.

use std::collections::VecDeque;

use super::{HeaderCell, RenderSurface, RowAnchor, TextMetrics};
use crate::error::{GridError, Result};
use crate::format::{estimate_text_width, DEFAULT_CHAR_WIDTH};
use crate::layout::Spacers;

/// One materialized row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRow {
    /// Visible-row index the row was materialized from
    pub row: usize,
    pub cells: Vec<String>,
}

/// Operation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceOps {
    pub header_renders: usize,
    pub rows_inserted: usize,
    pub rows_removed: usize,
    pub clears: usize,
    pub cell_writes: usize,
    pub spacer_updates: usize,
    pub width_updates: usize,
}

impl SurfaceOps {
    pub fn total(&self) -> usize {
        self.header_renders
            + self.rows_inserted
            + self.rows_removed
            + self.clears
            + self.cell_writes
            + self.spacer_updates
            + self.width_updates
    }
}

#[derive(Debug, Clone)]
pub struct MemorySurface {
    row_height: u32,
    char_width: u32,
    header: Vec<HeaderCell>,
    rows: VecDeque<MemoryRow>,
    spacers: Spacers,
    scroll_top: u32,
    ops: SurfaceOps,
}

impl MemorySurface {
    /// Surface whose rows are all `row_height` pixels tall.
    pub fn new(row_height: u32) -> Self {
        Self {
            row_height,
            char_width: DEFAULT_CHAR_WIDTH,
            header: Vec::new(),
            rows: VecDeque::new(),
            spacers: Spacers::default(),
            scroll_top: 0,
            ops: SurfaceOps::default(),
        }
    }

    #[must_use]
    pub fn with_char_width(mut self, char_width: u32) -> Self {
        self.char_width = char_width;
        self
    }

    pub fn header(&self) -> &[HeaderCell] {
        &self.header
    }

    pub fn rows(&self) -> impl Iterator<Item = &MemoryRow> {
        self.rows.iter()
    }

    pub fn row(&self, slot: usize) -> Option<&MemoryRow> {
        self.rows.get(slot)
    }

    /// Visible-row indices of the materialized rows, top to bottom.
    pub fn row_indices(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.row).collect()
    }

    /// Cell text of every materialized row, top to bottom.
    pub fn texts(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|r| r.cells.clone()).collect()
    }

    pub fn spacers(&self) -> Spacers {
        self.spacers
    }

    /// Spacer heights plus the height of the materialized rows.
    pub fn scroll_height(&self) -> u64 {
        let rows = u64::try_from(self.rows.len()).unwrap_or(u64::MAX);
        self.spacers.top + self.spacers.bottom + rows * u64::from(self.row_height)
    }

    pub fn ops(&self) -> SurfaceOps {
        self.ops
    }

    /// Return the counters and reset them to zero.
    pub fn take_ops(&mut self) -> SurfaceOps {
        std::mem::take(&mut self.ops)
    }

    fn row_mut(&mut self, slot: usize) -> Result<&mut MemoryRow> {
        let len = self.rows.len();
        self.rows
            .get_mut(slot)
            .ok_or_else(|| GridError::Surface(format!("no materialized row {slot} of {len}")))
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new(20)
    }
}

impl TextMetrics for MemorySurface {
    fn text_width(&self, text: &str) -> u32 {
        estimate_text_width(text, self.char_width)
    }
}

impl RenderSurface for MemorySurface {
    fn render_header(&mut self, cells: &[HeaderCell]) -> Result<()> {
        self.header = cells.to_vec();
        self.ops.header_renders += 1;
        Ok(())
    }

    fn insert_row(&mut self, anchor: RowAnchor, row: usize, cells: &[&str]) -> Result<()> {
        let row = MemoryRow {
            row,
            cells: cells.iter().map(|c| (*c).to_string()).collect(),
        };
        match anchor {
            RowAnchor::Top => self.rows.push_front(row),
            RowAnchor::Bottom => self.rows.push_back(row),
        }
        self.ops.rows_inserted += 1;
        Ok(())
    }

    fn remove_row(&mut self, anchor: RowAnchor) -> Result<()> {
        let removed = match anchor {
            RowAnchor::Top => self.rows.pop_front(),
            RowAnchor::Bottom => self.rows.pop_back(),
        };
        if removed.is_none() {
            return Err(GridError::Surface("no materialized row to remove".into()));
        }
        self.ops.rows_removed += 1;
        Ok(())
    }

    fn clear_rows(&mut self) -> Result<()> {
        self.rows.clear();
        self.ops.clears += 1;
        Ok(())
    }

    fn set_cell_text(&mut self, slot: usize, column: usize, text: &str) -> Result<()> {
        let row = self.row_mut(slot)?;
        let len = row.cells.len();
        let cell = row
            .cells
            .get_mut(column)
            .ok_or_else(|| GridError::Surface(format!("no cell {column} of {len}")))?;
        text.clone_into(cell);
        self.ops.cell_writes += 1;
        Ok(())
    }

    fn set_spacers(&mut self, spacers: Spacers) -> Result<()> {
        self.spacers = spacers;
        self.ops.spacer_updates += 1;
        Ok(())
    }

    fn set_column_width(&mut self, column: usize, width: u32) -> Result<()> {
        let len = self.header.len();
        let cell = self
            .header
            .get_mut(column)
            .ok_or_else(|| GridError::Surface(format!("no column {column} of {len}")))?;
        cell.width = width;
        self.ops.width_updates += 1;
        Ok(())
    }

    fn measure_row_height(&self) -> Option<u32> {
        (!self.rows.is_empty() && self.row_height > 0).then_some(self.row_height)
    }

    fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, scroll_top: u32) -> Result<()> {
        self.scroll_top = scroll_top;
        Ok(())
    }

    fn materialized_len(&self) -> usize {
        self.rows.len()
    }
}
