//! Layout engine for the row window and header geometry.
//!
//! This module handles:
//! - Deciding which rows are materialized at a scroll offset
//! - Diffing successive windows into add/remove operations
//! - Spacer sizing so the scrollable height covers every visible row
//! - Hit testing header x offsets for resize handles

mod header;
mod viewport;

pub use header::{HeaderHit, HeaderLayout, RESIZE_HANDLE_PIXELS};
pub use viewport::{
    RowWindow, ScrollDirection, Spacers, WindowEngine, WindowShift, WindowUpdate, BUFFER_ROWS,
    DEFAULT_ROW_HEIGHT,
};
