//! Header hit-testing.
//!
//! Maps an x offset within the header row to the column under it, or to the
//! resize handle straddling a column boundary. Offsets are relative to the
//! left edge of the first visible column, including horizontal scroll.

use crate::types::ColumnModel;

/// Width of the resize hit zone at a column's right edge, in pixels.
pub const RESIZE_HANDLE_PIXELS: u32 = 7;

/// What lies under a header x offset. Columns are identified by display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderHit {
    /// Resize handle of this column
    Resize(usize),
    /// Body of this column
    Column(usize),
    /// Past the last column
    None,
}

/// Precomputed horizontal extents of the visible header cells.
#[derive(Debug, Clone, Default)]
pub struct HeaderLayout {
    /// Display order of each visible column, left to right
    orders: Vec<usize>,
    /// Cumulative left edges, plus a final right edge
    edges: Vec<u64>,
    handle: u32,
}

impl HeaderLayout {
    /// Build from columns in display order, skipping hidden ones.
    pub fn new<'a>(columns: impl IntoIterator<Item = &'a ColumnModel>, handle: u32) -> Self {
        let mut orders = Vec::new();
        let mut edges = vec![0u64];
        let mut x = 0u64;
        for column in columns.into_iter().filter(|c| c.visible) {
            orders.push(column.order);
            x = x.saturating_add(u64::from(column.width));
            edges.push(x);
        }
        Self {
            orders,
            edges,
            handle,
        }
    }

    pub fn total_width(&self) -> u64 {
        self.edges.last().copied().unwrap_or(0)
    }

    /// Left edge of the visible column with this display order.
    pub fn left_of(&self, order: usize) -> Option<u64> {
        let slot = self.orders.iter().position(|&o| o == order)?;
        self.edges.get(slot).copied()
    }

    /// Classify a header x offset.
    ///
    /// Within `handle + 1` pixels of a column's left edge the hit belongs to the
    /// previous column's handle; the first column has no left handle.
    pub fn hit(&self, x: u64) -> HeaderHit {
        if self.orders.is_empty() || x >= self.total_width() {
            return HeaderHit::None;
        }
        let slot = match self.edges.binary_search(&x) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let (Some(&order), Some(&left), Some(&right)) = (
            self.orders.get(slot),
            self.edges.get(slot),
            self.edges.get(slot + 1),
        ) else {
            return HeaderHit::None;
        };
        let handle = u64::from(self.handle);
        if slot > 0 && x - left <= handle + 1 {
            return self
                .orders
                .get(slot - 1)
                .map_or(HeaderHit::None, |&prev| HeaderHit::Resize(prev));
        }
        if right - x <= handle {
            return HeaderHit::Resize(order);
        }
        HeaderHit::Column(order)
    }
}
