//! Render surfaces.
//!
//! This module provides:
//! - The `RenderSurface` and `TextMetrics` traits the grid draws through
//! - `MemorySurface`, a headless surface that records every operation
//! - `DomSurface`, an HTML table surface (wasm32 only)

pub mod memory;
pub mod surface;

#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use memory::{MemoryRow, MemorySurface, SurfaceOps};
pub use surface::{FixedWidthMetrics, HeaderCell, RenderSurface, RowAnchor, TextMetrics};

#[cfg(target_arch = "wasm32")]
pub use dom::DomSurface;
