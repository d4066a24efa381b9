//! Batched row insertion.

use super::RowSet;
use crate::types::{CellValue, RowRecord};

/// Result of appending a batch of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Appended {
    /// Rows added to the dataset
    pub rows: usize,
    /// Added rows that pass the active filter
    pub visible: usize,
    /// The active sort moved existing rows, so visible indices changed
    pub reordered: bool,
}

/// Guard for inserting many rows with a single sort at the end.
///
/// Each pushed row is filtered immediately. Sorting and the visible-row
/// index are brought up to date when the guard is finished or dropped.
pub struct BulkInsert<'a> {
    set: &'a mut RowSet,
    start: usize,
    committed: Option<Appended>,
}

impl<'a> BulkInsert<'a> {
    pub(super) fn new(set: &'a mut RowSet) -> Self {
        let start = set.rows.len();
        Self {
            set,
            start,
            committed: None,
        }
    }

    /// Add one row. Cells past the table's column count are dropped.
    pub fn push(&mut self, mut cells: Vec<CellValue>) {
        cells.truncate(self.set.num_columns());
        let mut row = RowRecord::new(cells);
        row.visible = self.set.passes_filter(&row);
        self.set.rows.push(row);
    }

    /// Number of rows pushed so far.
    pub fn len(&self) -> usize {
        self.set.rows.len().saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the deferred sort and return what changed.
    pub fn finish(mut self) -> Appended {
        self.commit()
    }

    fn commit(&mut self) -> Appended {
        if let Some(done) = self.committed {
            return done;
        }
        let rows = self.len();
        let visible = self
            .set
            .rows
            .iter()
            .skip(self.start)
            .filter(|r| r.visible)
            .count();
        let reordered = rows > 0 && self.set.sort_rows_if_needed();
        if reordered {
            self.set.rebuild_visible();
        } else {
            let start = self.start;
            let added = self
                .set
                .rows
                .iter()
                .enumerate()
                .skip(start)
                .filter(|(_, r)| r.visible)
                .map(|(i, _)| i);
            self.set.visible.extend(added);
        }
        let done = Appended {
            rows,
            visible,
            reordered,
        };
        self.committed = Some(done);
        done
    }
}

impl Extend<Vec<CellValue>> for BulkInsert<'_> {
    fn extend<T: IntoIterator<Item = Vec<CellValue>>>(&mut self, iter: T) {
        for cells in iter {
            self.push(cells);
        }
    }
}

impl Drop for BulkInsert<'_> {
    fn drop(&mut self) {
        self.commit();
    }
}
