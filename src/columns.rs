//! Ordered column collection.
//!
//! Columns are stored in display order, so a column's `order` always equals
//! its position in the backing vector. Every structural change re-packs the
//! orders and rebuilds the name index from scratch.

use std::collections::HashMap;

use crate::error::{GridError, Result};
use crate::render::TextMetrics;
use crate::types::{ColumnModel, ColumnSpec};

/// Smallest width any column may be resized to, in pixels.
pub const MIN_COLUMN_WIDTH: u32 = 20;

/// Padding added to a measured label when a column has no explicit width.
pub const LABEL_PADDING: u32 = 20;

/// Structural column operations.
pub trait ColumnStore {
    /// Append a column at the next order value. Returns its order.
    fn add(&mut self, spec: ColumnSpec, metrics: &dyn TextMetrics) -> Result<usize>;
    /// Remove a column by name, closing the gap in `order`.
    fn remove(&mut self, name: &str) -> Result<ColumnModel>;
    /// Change a column's label.
    fn rename(&mut self, name: &str, label: &str) -> Result<()>;
    /// Move the column at order `src` to order `dest`, shifting those in between.
    fn move_column(&mut self, src: usize, dest: usize) -> Result<()>;
    /// Set a column's width, clamped to the minimum. Returns the applied width.
    fn resize(&mut self, name: &str, width: u32) -> Result<u32>;
}

/// Values applied to columns whose spec leaves a field unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDefaults {
    pub min_width: u32,
    pub label_padding: u32,
    pub resizable: bool,
    pub sortable: bool,
}

impl Default for ColumnDefaults {
    fn default() -> Self {
        Self {
            min_width: MIN_COLUMN_WIDTH,
            label_padding: LABEL_PADDING,
            resizable: true,
            sortable: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<ColumnModel>,
    by_name: HashMap<String, usize>,
    defaults: ColumnDefaults,
}

impl ColumnSet {
    pub fn new(defaults: ColumnDefaults) -> Self {
        Self {
            columns: Vec::new(),
            by_name: HashMap::new(),
            defaults,
        }
    }

    /// Build a set from configured specs, failing on the first duplicate.
    pub fn from_specs(
        specs: &[ColumnSpec],
        defaults: ColumnDefaults,
        metrics: &dyn TextMetrics,
    ) -> Result<Self> {
        let mut set = Self::new(defaults);
        for spec in specs {
            set.add(spec.clone(), metrics)?;
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn defaults(&self) -> &ColumnDefaults {
        &self.defaults
    }

    /// Columns in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnModel> {
        self.columns.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnModel> {
        self.position(name).and_then(|order| self.columns.get(order))
    }

    /// Column at a display position.
    pub fn at(&self, order: usize) -> Option<&ColumnModel> {
        self.columns.get(order)
    }

    /// Display position of a column.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Display position of a column, or `UnknownColumn`.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))
    }

    /// Insert a column at a display position (`len()` appends).
    ///
    /// Columns at or after `position` shift one place right.
    pub fn insert(
        &mut self,
        spec: ColumnSpec,
        position: usize,
        metrics: &dyn TextMetrics,
    ) -> Result<usize> {
        if self.by_name.contains_key(&spec.name) {
            return Err(GridError::DuplicateName(spec.name));
        }
        if position > self.columns.len() {
            return Err(GridError::IndexOutOfRange {
                index: position,
                len: self.columns.len(),
            });
        }
        let column = self.resolve(spec, position, metrics)?;
        self.columns.insert(position, column);
        self.reindex();
        Ok(position)
    }

    /// Show or hide a column. Hidden columns keep their order slot.
    pub fn set_visible(&mut self, name: &str, visible: bool) -> Result<bool> {
        let order = self.require(name)?;
        let column = self
            .columns
            .get_mut(order)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))?;
        let changed = column.visible != visible;
        column.visible = visible;
        Ok(changed)
    }

    /// Sum of the widths of visible columns.
    pub fn total_width(&self) -> u64 {
        self.columns
            .iter()
            .filter(|c| c.visible)
            .map(|c| u64::from(c.width))
            .sum()
    }

    fn resolve(
        &self,
        spec: ColumnSpec,
        order: usize,
        metrics: &dyn TextMetrics,
    ) -> Result<ColumnModel> {
        let label = spec.label.unwrap_or_else(|| spec.name.clone());
        if label.is_empty() {
            return Err(GridError::InvalidLabel(spec.name));
        }
        let width = spec.width.unwrap_or_else(|| {
            metrics
                .text_width(&label)
                .saturating_add(self.defaults.label_padding)
        });
        Ok(ColumnModel {
            name: spec.name,
            label,
            order,
            width: width.max(self.defaults.min_width),
            visible: spec.visible.unwrap_or(true),
            sortable: spec.sortable.unwrap_or(self.defaults.sortable),
            resizable: spec.resizable.unwrap_or(self.defaults.resizable),
        })
    }

    fn reindex(&mut self) {
        self.by_name.clear();
        for (order, column) in self.columns.iter_mut().enumerate() {
            column.order = order;
            self.by_name.insert(column.name.clone(), order);
        }
    }

    fn column_mut(&mut self, name: &str) -> Result<&mut ColumnModel> {
        let order = self.require(name)?;
        self.columns
            .get_mut(order)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))
    }
}

impl ColumnStore for ColumnSet {
    fn add(&mut self, spec: ColumnSpec, metrics: &dyn TextMetrics) -> Result<usize> {
        let position = self.columns.len();
        self.insert(spec, position, metrics)
    }

    fn remove(&mut self, name: &str) -> Result<ColumnModel> {
        let order = self.require(name)?;
        if order >= self.columns.len() {
            return Err(GridError::UnknownColumn(name.to_string()));
        }
        if self.columns.len() == 1 {
            return Err(GridError::LastColumn(name.to_string()));
        }
        let removed = self.columns.remove(order);
        self.reindex();
        Ok(removed)
    }

    fn rename(&mut self, name: &str, label: &str) -> Result<()> {
        if label.is_empty() {
            return Err(GridError::InvalidLabel(name.to_string()));
        }
        self.column_mut(name)?.label = label.to_string();
        Ok(())
    }

    fn move_column(&mut self, src: usize, dest: usize) -> Result<()> {
        let len = self.columns.len();
        for index in [src, dest] {
            if index >= len {
                return Err(GridError::IndexOutOfRange { index, len });
            }
        }
        if src == dest {
            return Ok(());
        }
        let column = self.columns.remove(src);
        self.columns.insert(dest, column);
        self.reindex();
        Ok(())
    }

    fn resize(&mut self, name: &str, width: u32) -> Result<u32> {
        let min_width = self.defaults.min_width;
        let column = self.column_mut(name)?;
        column.width = width.max(min_width);
        Ok(column.width)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::render::FixedWidthMetrics;

    fn set_of(names: &[&str]) -> ColumnSet {
        let specs: Vec<ColumnSpec> = names.iter().map(|n| ColumnSpec::new(*n)).collect();
        ColumnSet::from_specs(&specs, ColumnDefaults::default(), &FixedWidthMetrics(7)).unwrap()
    }

    fn names(set: &ColumnSet) -> Vec<&str> {
        set.iter().map(|c| c.name.as_str()).collect()
    }

    fn assert_dense(set: &ColumnSet) {
        for (i, c) in set.iter().enumerate() {
            assert_eq!(c.order, i);
            assert_eq!(set.position(&c.name), Some(i));
        }
    }

    #[test]
    fn test_default_width_is_label_plus_padding() {
        let set = set_of(&["abcd"]);
        assert_eq!(set.at(0).unwrap().width, 4 * 7 + LABEL_PADDING);
    }

    #[test]
    fn test_duplicate_name_rejected_without_mutation() {
        let mut set = set_of(&["a", "b"]);
        let err = set.add(ColumnSpec::new("a"), &FixedWidthMetrics(7));
        assert!(matches!(err, Err(GridError::DuplicateName(n)) if n == "a"));
        assert_eq!(names(&set), ["a", "b"]);
    }

    #[test]
    fn test_remove_repacks_order() {
        let mut set = set_of(&["a", "b", "c", "d"]);
        let removed = set.remove("b").unwrap();
        assert_eq!(removed.name, "b");
        assert_eq!(names(&set), ["a", "c", "d"]);
        assert_dense(&set);
        assert!(matches!(set.remove("b"), Err(GridError::UnknownColumn(_))));
    }

    #[test]
    fn test_move_forward_and_back() {
        let mut set = set_of(&["a", "b", "c", "d"]);
        set.move_column(0, 3).unwrap();
        assert_eq!(names(&set), ["b", "c", "d", "a"]);
        set.move_column(3, 1).unwrap();
        assert_eq!(names(&set), ["b", "a", "c", "d"]);
        assert_dense(&set);
    }

    #[test]
    fn test_move_out_of_range_leaves_state() {
        let mut set = set_of(&["a", "b"]);
        let err = set.move_column(0, 2);
        assert!(matches!(
            err,
            Err(GridError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(names(&set), ["a", "b"]);
    }

    #[test]
    fn test_rename_rejects_empty_label() {
        let mut set = set_of(&["a"]);
        assert!(matches!(set.rename("a", ""), Err(GridError::InvalidLabel(_))));
        set.rename("a", "Alpha").unwrap();
        let col = set.get("a").unwrap();
        assert_eq!(col.label, "Alpha");
        assert_eq!(col.order, 0);
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut set = set_of(&["a"]);
        assert_eq!(set.resize("a", 3).unwrap(), MIN_COLUMN_WIDTH);
        assert_eq!(set.resize("a", 150).unwrap(), 150);
    }

    #[test]
    fn test_insert_in_middle() {
        let mut set = set_of(&["a", "c"]);
        set.insert(ColumnSpec::new("b"), 1, &FixedWidthMetrics(7))
            .unwrap();
        assert_eq!(names(&set), ["a", "b", "c"]);
        assert_dense(&set);
    }
}
