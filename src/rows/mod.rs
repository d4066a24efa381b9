//! Row storage with sorting, filtering, and column remapping.
//!
//! Rows keep their cells in source column order. `column_order` maps each
//! rendered column position to a source column, and `visible` lists the
//! dataset indices of rows passing the active filter, in display order.
//! `visible` is only ever extended with freshly filtered rows or rebuilt
//! from the row flags, so its length is the visible row count.

mod bulk;
mod sort;

use std::fmt;

pub use bulk::{Appended, BulkInsert};
use sort::SortKey;

use crate::error::{GridError, Result};
use crate::format::display_value;
use crate::types::{CellValue, FilterOutcome, FilterSpec, RowRecord, SortDirection};

/// Maps a raw cell to the value the comparator sees.
pub type SortKeyFn = Box<dyn Fn(&CellValue) -> CellValue>;

/// Row-level operations. Column arguments are rendered column positions.
pub trait RowStore {
    /// Sort on a column. `None` toggles direction when re-sorting the same column.
    fn sort(&mut self, column: usize, direction: Option<SortDirection>) -> Result<()>;
    /// Substring filter on a column.
    fn filter(&mut self, column: usize, text: &str, case_sensitive: bool)
        -> Result<FilterOutcome>;
    /// Append rows, filtering and sorting them in.
    fn add(&mut self, rows: Vec<Vec<CellValue>>) -> Appended;
    /// Replace the whole dataset. Returns the visible row count.
    fn reset(&mut self, rows: Vec<Vec<CellValue>>) -> usize;
    /// Overwrite one cell of a visible row. Does not re-filter or re-sort.
    fn set_value(&mut self, row: usize, column: usize, value: CellValue) -> Result<()>;
}

/// Compiled filter: the spec plus its folded needle.
#[derive(Debug, Clone)]
struct ActiveFilter {
    spec: FilterSpec,
    needle: String,
}

impl ActiveFilter {
    fn new(spec: FilterSpec) -> Self {
        let needle = if spec.case_sensitive {
            spec.text.clone()
        } else {
            spec.text.to_lowercase()
        };
        Self { spec, needle }
    }

    fn matches(&self, row: &RowRecord) -> bool {
        let text = display_value(row.cell(self.spec.column));
        if self.spec.case_sensitive {
            text.contains(self.needle.as_str())
        } else {
            text.to_lowercase().contains(self.needle.as_str())
        }
    }
}

#[derive(Default)]
pub struct RowSet {
    rows: Vec<RowRecord>,
    column_order: Vec<usize>,
    sort_column: Option<usize>,
    sort_descending: bool,
    filter: Option<ActiveFilter>,
    visible: Vec<usize>,
    sort_key: Option<SortKeyFn>,
}

impl fmt::Debug for RowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSet")
            .field("rows", &self.rows.len())
            .field("visible", &self.visible.len())
            .field("column_order", &self.column_order)
            .field("sort_column", &self.sort_column)
            .field("sort_descending", &self.sort_descending)
            .field("filter", &self.filter.as_ref().map(|f| &f.spec))
            .finish_non_exhaustive()
    }
}

impl RowSet {
    /// Empty row set over `num_columns` columns in source order.
    pub fn new(num_columns: usize) -> Self {
        Self {
            column_order: (0..num_columns).collect(),
            ..Self::default()
        }
    }

    /// Empty row set with an initial sort column (rendered position).
    pub fn with_sort(
        num_columns: usize,
        sort_column: Option<usize>,
        direction: SortDirection,
    ) -> Result<Self> {
        let mut set = Self::new(num_columns);
        if let Some(col) = sort_column {
            set.check_column(col)?;
        }
        set.sort_column = sort_column;
        set.sort_descending = direction.is_descending();
        Ok(set)
    }

    /// Route sort values through `key` (for example a display formatter).
    pub fn set_sort_key(&mut self, key: Option<SortKeyFn>) {
        self.sort_key = key;
    }

    /// Total rows, filtered or not.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows passing the active filter.
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn num_columns(&self) -> usize {
        self.column_order.len()
    }

    /// Rendered position → source column index.
    pub fn column_order(&self) -> &[usize] {
        &self.column_order
    }

    pub fn source_column(&self, rendered: usize) -> Option<usize> {
        self.column_order.get(rendered).copied()
    }

    /// Rendered position of a source column.
    pub fn rendered_column(&self, source: usize) -> Option<usize> {
        self.column_order.iter().position(|&c| c == source)
    }

    pub fn sort_column(&self) -> Option<usize> {
        self.sort_column
    }

    pub fn sort_descending(&self) -> bool {
        self.sort_descending
    }

    pub fn filter_spec(&self) -> Option<&FilterSpec> {
        self.filter.as_ref().map(|f| &f.spec)
    }

    /// All rows in dataset order, including filtered-out ones.
    pub fn records(&self) -> &[RowRecord] {
        &self.rows
    }

    /// Record behind a visible row index.
    pub fn visible_record(&self, row: usize) -> Option<&RowRecord> {
        self.visible.get(row).and_then(|&i| self.rows.get(i))
    }

    /// Value at (visible row, rendered column).
    pub fn value(&self, row: usize, column: usize) -> Option<&CellValue> {
        let source = self.source_column(column)?;
        self.visible_record(row).map(|r| r.cell(source))
    }

    /// Cells of a visible row in rendered column order.
    pub fn row_values(&self, row: usize) -> Option<Vec<&CellValue>> {
        let record = self.visible_record(row)?;
        Some(self.column_order.iter().map(|&c| record.cell(c)).collect())
    }

    /// Select a sort column with click-to-toggle semantics.
    ///
    /// Re-selecting the current column flips the direction; selecting a new
    /// column keeps the direction. Rows are not re-sorted.
    pub fn set_sort_column(&mut self, column: usize) -> Result<()> {
        self.check_column(column)?;
        if self.sort_column == Some(column) {
            self.sort_descending = !self.sort_descending;
        } else {
            self.sort_column = Some(column);
        }
        Ok(())
    }

    /// Re-apply the active sort, e.g. after cell edits.
    pub fn resort(&mut self) {
        if self.sort_rows_if_needed() {
            self.rebuild_visible();
        }
    }

    /// Drop the active filter. Every row becomes visible.
    pub fn clear_filter(&mut self) -> FilterOutcome {
        if self.filter.take().is_none() {
            return FilterOutcome::Unchanged;
        }
        self.refilter();
        FilterOutcome::Changed
    }

    /// Reorder `column_order` after a column move between rendered positions.
    ///
    /// Columns between `src` and `dest` shift one place toward `src`, and the
    /// sort column follows the same shift so it keeps naming the same data.
    pub fn move_column(&mut self, src: usize, dest: usize) -> Result<()> {
        self.check_column(src)?;
        self.check_column(dest)?;
        if src == dest {
            return Ok(());
        }
        if let Some(sort) = self.sort_column {
            self.sort_column = Some(if sort == src {
                dest
            } else if src < dest && sort > src && sort <= dest {
                sort - 1
            } else if dest < src && sort >= dest && sort < src {
                sort + 1
            } else {
                sort
            });
        }
        let moved = self.column_order.remove(src);
        self.column_order.insert(dest, moved);
        Ok(())
    }

    /// Open a new, empty column at a rendered position.
    ///
    /// The column gets the next source index; existing rows read it as empty.
    pub fn insert_column(&mut self, position: usize) -> Result<()> {
        let len = self.column_order.len();
        if position > len {
            return Err(GridError::IndexOutOfRange {
                index: position,
                len,
            });
        }
        self.column_order.insert(position, len);
        if let Some(sort) = self.sort_column.as_mut() {
            if *sort >= position {
                *sort += 1;
            }
        }
        Ok(())
    }

    /// Remove the column at a rendered position and drop its cells.
    ///
    /// Source indices above the removed one are renumbered so `column_order`
    /// stays a permutation. A sort or filter on the removed column is cleared.
    pub fn remove_column(&mut self, position: usize) -> Result<()> {
        let source = self.check_column(position)?;
        self.column_order.remove(position);
        for c in &mut self.column_order {
            if *c > source {
                *c -= 1;
            }
        }
        for row in &mut self.rows {
            if source < row.cells.len() {
                row.cells.remove(source);
            }
        }
        self.sort_column = match self.sort_column {
            Some(sort) if sort == position => None,
            Some(sort) if sort > position => Some(sort - 1),
            other => other,
        };
        match self.filter.as_ref().map(|f| f.spec.column) {
            Some(col) if col == source => {
                self.filter = None;
                self.refilter();
            }
            Some(col) if col > source => {
                if let Some(active) = self.filter.as_mut() {
                    active.spec.column -= 1;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Start a batch insert; see [`BulkInsert`].
    pub fn bulk_insert(&mut self) -> BulkInsert<'_> {
        BulkInsert::new(self)
    }

    fn check_column(&self, column: usize) -> Result<usize> {
        self.source_column(column)
            .ok_or(GridError::IndexOutOfRange {
                index: column,
                len: self.column_order.len(),
            })
    }

    fn passes_filter(&self, row: &RowRecord) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(row))
    }

    fn refilter(&mut self) {
        let filter = self.filter.take();
        for row in &mut self.rows {
            row.visible = filter.as_ref().map_or(true, |f| f.matches(row));
        }
        self.filter = filter;
        self.rebuild_visible();
    }

    fn rebuild_visible(&mut self) {
        self.visible = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.visible)
            .map(|(i, _)| i)
            .collect();
    }

    fn sort_key_of(&self, row: &RowRecord, source: usize) -> SortKey {
        let cell = row.cell(source);
        match &self.sort_key {
            Some(key) => SortKey::from_value(&key(cell), self.sort_descending),
            None => SortKey::from_value(cell, self.sort_descending),
        }
    }

    /// Stable-sort rows on the active sort column unless already in order.
    ///
    /// Returns whether any row moved.
    fn sort_rows_if_needed(&mut self) -> bool {
        let Some(source) = self.sort_column.and_then(|c| self.source_column(c)) else {
            return false;
        };
        let descending = self.sort_descending;
        let keys: Vec<SortKey> = self
            .rows
            .iter()
            .map(|r| self.sort_key_of(r, source))
            .collect();
        let sorted = keys
            .windows(2)
            .all(|w| match w {
                [a, b] => a.directed_cmp(b, descending).is_le(),
                _ => true,
            });
        if sorted {
            return false;
        }
        let mut keyed: Vec<(SortKey, RowRecord)> =
            keys.into_iter().zip(self.rows.drain(..)).collect();
        keyed.sort_by(|(a, _), (b, _)| a.directed_cmp(b, descending));
        self.rows = keyed.into_iter().map(|(_, r)| r).collect();
        true
    }
}

impl RowStore for RowSet {
    fn sort(&mut self, column: usize, direction: Option<SortDirection>) -> Result<()> {
        self.set_sort_column(column)?;
        if let Some(direction) = direction {
            self.sort_descending = direction.is_descending();
        }
        self.resort();
        Ok(())
    }

    fn filter(
        &mut self,
        column: usize,
        text: &str,
        case_sensitive: bool,
    ) -> Result<FilterOutcome> {
        let source = self.check_column(column)?;
        let spec = FilterSpec {
            column: source,
            text: text.to_string(),
            case_sensitive,
        };
        if self.filter_spec() == Some(&spec) {
            return Ok(FilterOutcome::Unchanged);
        }
        self.filter = Some(ActiveFilter::new(spec));
        self.refilter();
        Ok(FilterOutcome::Changed)
    }

    fn add(&mut self, rows: Vec<Vec<CellValue>>) -> Appended {
        let mut batch = self.bulk_insert();
        batch.extend(rows);
        batch.finish()
    }

    fn reset(&mut self, rows: Vec<Vec<CellValue>>) -> usize {
        self.rows.clear();
        self.visible.clear();
        self.add(rows);
        self.visible.len()
    }

    fn set_value(&mut self, row: usize, column: usize, value: CellValue) -> Result<()> {
        let source = self.check_column(column)?;
        let len = self.visible.len();
        let record = self
            .visible
            .get(row)
            .and_then(|&i| self.rows.get_mut(i))
            .ok_or(GridError::RowOutOfRange { index: row, len })?;
        if record.cells.len() <= source {
            record.cells.resize(source + 1, CellValue::Empty);
        }
        if let Some(cell) = record.cells.get_mut(source) {
            *cell = value;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn numbers(rows: &[&[f64]]) -> Vec<Vec<CellValue>> {
        rows.iter()
            .map(|r| r.iter().map(|&n| CellValue::Number(n)).collect())
            .collect()
    }

    fn visible_flags(set: &RowSet) -> usize {
        set.records().iter().filter(|r| r.visible).count()
    }

    #[test]
    fn test_move_rotates_rendered_row() {
        let mut set = RowSet::new(4);
        set.reset(numbers(&[&[0.0, 1.0, 2.0, 3.0]]));
        set.move_column(0, 3).unwrap();
        let row: Vec<CellValue> = set.row_values(0).unwrap().into_iter().cloned().collect();
        assert_eq!(row, numbers(&[&[1.0, 2.0, 3.0, 0.0]])[0]);
        assert_eq!(set.column_order(), [1, 2, 3, 0]);
    }

    #[test]
    fn test_move_translates_sort_column() {
        let mut set = RowSet::with_sort(4, Some(2), SortDirection::Ascending).unwrap();
        set.move_column(0, 3).unwrap();
        assert_eq!(set.sort_column(), Some(1));
        set.move_column(1, 3).unwrap();
        assert_eq!(set.sort_column(), Some(3));
        set.move_column(0, 3).unwrap();
        assert_eq!(set.sort_column(), Some(2));
        set.move_column(3, 0).unwrap();
        assert_eq!(set.sort_column(), Some(3));
    }

    #[test]
    fn test_toggle_keeps_direction_for_new_column() {
        let mut set = RowSet::new(3);
        set.set_sort_column(1).unwrap();
        assert!(!set.sort_descending());
        set.set_sort_column(1).unwrap();
        assert!(set.sort_descending());
        set.set_sort_column(2).unwrap();
        assert!(set.sort_descending());
        assert_eq!(set.sort_column(), Some(2));
    }

    #[test]
    fn test_invalid_sort_column_leaves_state() {
        let mut set = RowSet::new(2);
        set.reset(numbers(&[&[2.0, 0.0], &[1.0, 0.0]]));
        assert!(set.sort(5, None).is_err());
        assert_eq!(set.sort_column(), None);
        assert_eq!(set.value(0, 0), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn test_filter_counts_and_noop() {
        let mut set = RowSet::new(1);
        set.reset(vec![
            vec!["Apple".into()],
            vec!["banana".into()],
            vec!["pineapple".into()],
        ]);
        assert_eq!(set.filter(0, "APPLE", false).unwrap(), FilterOutcome::Changed);
        assert_eq!(set.visible_count(), 2);
        assert_eq!(visible_flags(&set), 2);
        assert_eq!(set.filter(0, "APPLE", false).unwrap(), FilterOutcome::Unchanged);
        assert_eq!(set.filter(0, "APPLE", true).unwrap(), FilterOutcome::Changed);
        assert_eq!(set.visible_count(), 0);
        assert_eq!(set.clear_filter(), FilterOutcome::Changed);
        assert_eq!(set.visible_count(), 3);
    }

    #[test]
    fn test_add_filters_incoming_rows() {
        let mut set = RowSet::new(1);
        set.filter(0, "x", false).unwrap();
        let appended = set.add(vec![vec!["x1".into()], vec!["y".into()], vec!["X2".into()]]);
        assert_eq!(appended.rows, 3);
        assert_eq!(appended.visible, 2);
        assert!(!appended.reordered);
        assert_eq!(set.visible_count(), 2);
        assert_eq!(set.value(1, 0), Some(&CellValue::from("X2")));
    }

    #[test]
    fn test_bulk_insert_defers_sort() {
        let mut set = RowSet::with_sort(1, Some(0), SortDirection::Ascending).unwrap();
        set.reset(numbers(&[&[1.0], &[5.0]]));
        let appended = {
            let mut batch = set.bulk_insert();
            batch.push(vec![CellValue::Number(3.0)]);
            batch.push(vec![CellValue::Number(0.0)]);
            assert_eq!(batch.len(), 2);
            batch.finish()
        };
        assert!(appended.reordered);
        let col: Vec<_> = (0..4).map(|r| set.value(r, 0).cloned().unwrap()).collect();
        assert_eq!(col, numbers(&[&[0.0], &[1.0], &[3.0], &[5.0]]).concat());
    }

    #[test]
    fn test_append_in_order_is_not_reordered() {
        let mut set = RowSet::with_sort(1, Some(0), SortDirection::Ascending).unwrap();
        set.reset(numbers(&[&[1.0], &[2.0]]));
        let appended = set.add(numbers(&[&[3.0], &[4.0]]));
        assert!(!appended.reordered);
        assert_eq!(set.visible_count(), 4);
    }

    #[test]
    fn test_set_value_writes_through_column_order() {
        let mut set = RowSet::new(3);
        set.reset(numbers(&[&[0.0, 1.0, 2.0]]));
        set.move_column(2, 0).unwrap();
        set.set_value(0, 0, CellValue::from("edited")).unwrap();
        assert_eq!(set.records()[0].cells[2], CellValue::from("edited"));
        assert!(matches!(
            set.set_value(1, 0, CellValue::Empty),
            Err(GridError::RowOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_insert_and_remove_column_keep_permutation() {
        let mut set = RowSet::with_sort(3, Some(2), SortDirection::Ascending).unwrap();
        set.reset(numbers(&[&[0.0, 1.0, 2.0]]));
        set.insert_column(1).unwrap();
        assert_eq!(set.column_order(), [0, 3, 1, 2]);
        assert_eq!(set.sort_column(), Some(3));
        assert_eq!(set.value(0, 1), Some(&CellValue::Empty));

        set.remove_column(2).unwrap();
        assert_eq!(set.column_order(), [0, 2, 1]);
        assert_eq!(set.sort_column(), Some(2));
        assert_eq!(set.value(0, 2), Some(&CellValue::Number(2.0)));

        let mut sorted = set.column_order().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, [0, 1, 2]);
    }

    #[test]
    fn test_extra_cells_do_not_leak_into_new_column() {
        let mut set = RowSet::new(2);
        set.reset(vec![vec![1.0.into(), 2.0.into(), "extra".into()]]);
        assert_eq!(set.records()[0].cells.len(), 2);
        set.insert_column(2).unwrap();
        assert_eq!(set.value(0, 2), Some(&CellValue::Empty));
        assert_eq!(set.value(0, 1), Some(&CellValue::Number(2.0)));
    }

    #[test]
    fn test_removing_filtered_column_clears_filter() {
        let mut set = RowSet::new(2);
        set.reset(vec![
            vec!["a".into(), "x".into()],
            vec!["b".into(), "y".into()],
        ]);
        set.filter(0, "a", false).unwrap();
        assert_eq!(set.visible_count(), 1);
        set.remove_column(0).unwrap();
        assert!(set.filter_spec().is_none());
        assert_eq!(set.visible_count(), 2);
    }

    #[test]
    fn test_sort_key_function_is_applied() {
        let mut set = RowSet::new(1);
        set.set_sort_key(Some(Box::new(|v: &CellValue| match v {
            CellValue::Text(s) => CellValue::Number(s.len() as f64),
            other => other.clone(),
        })));
        set.reset(vec![vec!["ccc".into()], vec!["a".into()], vec!["bb".into()]]);
        set.sort(0, Some(SortDirection::Ascending)).unwrap();
        assert_eq!(set.value(0, 0), Some(&CellValue::from("a")));
        assert_eq!(set.value(2, 0), Some(&CellValue::from("ccc")));
    }
}
