//! Data types for the grid: cell values, columns, rows, and filters.

mod cell;
mod column;
mod filter;
mod row;

pub use cell::*;
pub use column::*;
pub use filter::*;
pub use row::*;
