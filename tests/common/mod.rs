//! Common test fixtures and assertion helpers.
//!
//! Datasets are numeric: the cell at (row, col) holds `row * cols + col`, so
//! any rendered cell text identifies exactly which row and column it came from.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use atable::grid::{DataSource, FetchTicket, GridConfig, GridController};
use atable::render::{MemorySurface, RenderSurface};
use atable::{CellValue, ColumnSpec};

pub const ROW_HEIGHT: u32 = 20;
pub const HEIGHT: u32 = 300;

// ============================================================================
// Data source
// ============================================================================

/// Records every request; tests deliver rows by hand.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    pub requests: Rc<RefCell<Vec<FetchTicket>>>,
}

impl ScriptedSource {
    pub fn count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last(&self) -> Option<FetchTicket> {
        self.requests.borrow().last().copied()
    }
}

impl DataSource for ScriptedSource {
    fn request(&mut self, ticket: FetchTicket) {
        self.requests.borrow_mut().push(ticket);
    }
}

pub type TestGrid = GridController<MemorySurface, ScriptedSource>;

// ============================================================================
// Builders
// ============================================================================

/// Columns named `c0`, `c1`, ...
pub fn columns(n: usize) -> Vec<ColumnSpec> {
    (0..n).map(|i| ColumnSpec::new(format!("c{i}"))).collect()
}

pub fn number(n: usize) -> CellValue {
    CellValue::Number(f64::from(u32::try_from(n).unwrap()))
}

/// `rows` rows of `cols` cells, cell (r, c) = `r * cols + c`.
pub fn numeric_rows(rows: usize, cols: usize) -> Vec<Vec<CellValue>> {
    (0..rows)
        .map(|r| (0..cols).map(|c| number(r * cols + c)).collect())
        .collect()
}

pub fn config(cols: usize) -> GridConfig {
    GridConfig::new(columns(cols), HEIGHT)
}

/// A grid that has rendered once and requested data.
pub fn grid(config: GridConfig) -> TestGrid {
    let mut grid =
        GridController::new(config, MemorySurface::new(ROW_HEIGHT), ScriptedSource::default())
            .unwrap();
    grid.render().unwrap();
    grid
}

/// A grid with `rows` delivered for its first request.
pub fn loaded_grid(config: GridConfig, rows: Vec<Vec<CellValue>>) -> TestGrid {
    let mut grid = grid(config);
    let ticket = grid.source().last().unwrap();
    grid.receive(ticket, rows, false).unwrap();
    grid
}

// ============================================================================
// Expectations
// ============================================================================

/// Closed-form window at `scroll_top` over `count` rows.
pub fn expected_window(
    scroll_top: u32,
    count: usize,
    capacity: usize,
    buffer: usize,
) -> Range<usize> {
    let first_visible = usize::try_from(scroll_top / ROW_HEIGHT).unwrap();
    let last = first_visible + capacity + buffer;
    if last > count {
        count.saturating_sub(capacity + buffer)..count
    } else {
        first_visible.saturating_sub(buffer)..last
    }
}

/// Text of rendered column `slot` for every materialized row.
pub fn rendered_column(grid: &TestGrid, slot: usize) -> Vec<String> {
    grid.surface()
        .rows()
        .map(|r| r.cells[slot].clone())
        .collect()
}

/// Rendered column `slot` parsed as numbers.
pub fn rendered_numbers(grid: &TestGrid, slot: usize) -> Vec<f64> {
    rendered_column(grid, slot)
        .iter()
        .map(|t| t.parse().unwrap())
        .collect()
}

/// Materialized rows match the engine window, stay within bounds, and the
/// spacers make up the full scroll height.
pub fn assert_window_invariants(grid: &TestGrid) {
    let window = grid.window();
    let count = grid.visible_count();
    let surface = grid.surface();
    assert!(window.first <= window.last);
    assert!(window.last <= count);
    assert_eq!(surface.materialized_len(), window.len());
    assert!(surface.materialized_len() <= grid.engine().max_window_len());
    assert_eq!(
        surface.row_indices(),
        window.range().collect::<Vec<_>>(),
        "materialized rows differ from window"
    );
    if grid.engine().is_measured() {
        let row_height = u64::from(ROW_HEIGHT);
        assert_eq!(
            surface.scroll_height(),
            u64::try_from(count).unwrap() * row_height
        );
    }
}

/// `visible_count` equals the number of rows flagged visible.
pub fn assert_visible_count(grid: &TestGrid) {
    let flagged = grid.rows().records().iter().filter(|r| r.visible).count();
    assert_eq!(grid.visible_count(), flagged);
}
