//! atable - virtualized data grid for the web
//!
//! Renders only the rows scrolled into view, plus a small buffer, while
//! keeping the scrollbar sized for the whole dataset:
//! - Incremental row windowing with bounded materialization
//! - Stable multi-type sorting, substring filtering
//! - Column reorder, resize, show/hide, rename, add/remove
//! - Headless surface for tests, HTML table surface for the browser
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { ATable } from 'atable';
//! await init();
//! const table = new ATable(parent, { columns: [{ name: "id" }], height: 400 }, fetchRows);
//! table.render();
//! ```
//!
//! # Usage (Rust)
//!
//! ```
//! use atable::grid::{GridConfig, GridController};
//! use atable::render::{MemorySurface, RenderSurface};
//! use atable::{CellValue, ColumnSpec, FetchTicket};
//!
//! let config = GridConfig::new(vec![ColumnSpec::new("n")], 200);
//! let mut grid = GridController::new(config, MemorySurface::new(20), |_: FetchTicket| {})?;
//! grid.render()?;
//! let ticket = grid.current_ticket();
//! grid.receive(ticket, (0..1000).map(|i| vec![CellValue::from(i)]).collect(), false)?;
//! assert_eq!(grid.surface().materialized_len(), 15);
//! # Ok::<(), atable::GridError>(())
//! ```

pub mod columns;
pub mod error;
pub mod format;
pub mod grid;
pub mod layout;
pub mod render;
pub mod rows;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use error::{GridError, Result};
pub use grid::{FetchTicket, GridConfig, GridController};
pub use types::*;

#[cfg(target_arch = "wasm32")]
pub use viewer::ATable;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
