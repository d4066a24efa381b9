//! Grid controller.
//!
//! Owns the column and row state, the window engine, a render surface and a
//! data source. Every public operation validates its arguments, mutates the
//! stores, records how much of the rendered output it invalidated, and runs a
//! render pass:
//! - nothing dirty: the pass is a no-op
//! - data dirty (append, cell edit): kept rows are refreshed in place and an
//!   under-filled window grows
//! - structure dirty (sort, filter, column changes, reset): the header is
//!   redrawn and the window is rematerialized at the current scroll offset
//!
//! Scroll events bypass the dirty state and go straight to the engine's
//! incremental diff.

mod config;
mod source;

use std::borrow::Cow;

pub use config::GridConfig;
use source::FetchState;
pub use source::{DataSource, Delivery, FetchTicket};

use crate::columns::{ColumnSet, ColumnStore};
use crate::error::{GridError, Result};
use crate::format::display_value;
use crate::layout::{
    HeaderHit, HeaderLayout, RowWindow, WindowEngine, WindowUpdate, DEFAULT_ROW_HEIGHT,
};
use crate::render::{HeaderCell, RenderSurface, RowAnchor};
use crate::rows::{RowSet, RowStore, SortKeyFn};
use crate::types::{CellValue, ColumnModel, ColumnSpec, FilterOutcome, SortDirection};

/// How much rendered output is out of date. Later variants subsume earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Dirty {
    Clean,
    Data,
    Structure,
}

type RenderCallback = Box<dyn FnOnce()>;

/// Display text of a visible row, one entry per visible column.
fn row_texts<'a>(columns: &ColumnSet, rows: &'a RowSet, row: usize) -> Vec<Cow<'a, str>> {
    columns
        .iter()
        .filter(|c| c.visible)
        .map(|c| rows.value(row, c.order).map_or(Cow::Borrowed(""), display_value))
        .collect()
}

pub struct GridController<S, D> {
    config: GridConfig,
    columns: ColumnSet,
    rows: RowSet,
    engine: WindowEngine,
    header: HeaderLayout,
    surface: S,
    source: D,
    dirty: Dirty,
    header_dirty: bool,
    /// Columns whose width changed since the last pass
    resized: Vec<String>,
    fetch: FetchState,
    epoch: u64,
    on_render: Option<RenderCallback>,
}

impl<S: RenderSurface, D: DataSource> GridController<S, D> {
    /// Build a grid. Nothing is rendered or requested until the first
    /// [`render`](Self::render).
    pub fn new(config: GridConfig, surface: S, source: D) -> Result<Self> {
        config.validate()?;
        let columns = ColumnSet::from_specs(&config.columns, config.column_defaults(), &surface)?;
        let sort = config
            .sort_column
            .as_deref()
            .map(|name| columns.require(name))
            .transpose()?;
        let rows = RowSet::with_sort(columns.len(), sort, config.sort_direction())?;
        let engine = WindowEngine::new(config.height, config.buffer_rows, config.rows_to_render);
        let header = HeaderLayout::new(columns.iter(), config.resize_handle);
        Ok(Self {
            config,
            columns,
            rows,
            engine,
            header,
            surface,
            source,
            dirty: Dirty::Structure,
            header_dirty: true,
            resized: Vec::new(),
            fetch: FetchState::NotRequested,
            epoch: 0,
            on_render: None,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn rows(&self) -> &RowSet {
        &self.rows
    }

    pub fn engine(&self) -> &WindowEngine {
        &self.engine
    }

    pub fn window(&self) -> RowWindow {
        self.engine.window()
    }

    pub fn header_layout(&self) -> &HeaderLayout {
        &self.header
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut D {
        &mut self.source
    }

    pub fn visible_count(&self) -> usize {
        self.rows.visible_count()
    }

    /// Ticket a delivery must carry to be applied.
    pub fn current_ticket(&self) -> FetchTicket {
        FetchTicket::new(self.epoch)
    }

    /// Whether a request for the current epoch is outstanding.
    pub fn is_fetching(&self) -> bool {
        matches!(self.fetch, FetchState::Pending(_))
    }

    pub fn is_loaded(&self) -> bool {
        self.fetch == FetchState::Loaded
    }

    /// Bring the surface up to date.
    ///
    /// The first call requests data; later calls never re-request until
    /// [`reload`](Self::reload).
    pub fn render(&mut self) -> Result<()> {
        self.request_if_needed();
        let structural = self.dirty == Dirty::Structure;
        match self.dirty {
            Dirty::Clean => {}
            Dirty::Data => {
                let update = self.engine.data_changed(self.rows.visible_count());
                self.apply(&update)?;
            }
            Dirty::Structure => self.render_structure()?,
        }
        if !structural {
            if self.header_dirty {
                self.render_header()?;
            }
            self.flush_widths()?;
        }
        self.dirty = Dirty::Clean;
        self.header_dirty = false;
        if structural {
            if let Some(callback) = self.on_render.take() {
                callback();
            }
        }
        Ok(())
    }

    /// Fully re-render, then run `callback` once.
    pub fn render_with(&mut self, callback: impl FnOnce() + 'static) -> Result<()> {
        self.on_render = Some(Box::new(callback));
        self.mark(Dirty::Structure);
        self.render()
    }

    /// Follow the surface's scroll offset.
    pub fn on_scroll(&mut self) -> Result<()> {
        if self.dirty != Dirty::Clean {
            self.render()?;
        }
        let update = self
            .engine
            .scroll_to(self.surface.scroll_top(), self.rows.visible_count());
        self.apply(&update)
    }

    /// Scroll the surface to `scroll_top` and follow it.
    pub fn scroll_to(&mut self, scroll_top: u32) -> Result<()> {
        self.surface.set_scroll_top(scroll_top)?;
        self.on_scroll()
    }

    /// Delivery callback for the data source.
    ///
    /// `append = false` replaces the dataset. Deliveries for an earlier epoch
    /// are dropped.
    pub fn receive(
        &mut self,
        ticket: FetchTicket,
        rows: Vec<Vec<CellValue>>,
        append: bool,
    ) -> Result<Delivery> {
        if ticket.epoch != self.epoch {
            tracing::warn!(
                epoch = ticket.epoch,
                current = self.epoch,
                rows = rows.len(),
                "discarding stale delivery"
            );
            return Ok(Delivery::Stale);
        }
        tracing::debug!(epoch = ticket.epoch, rows = rows.len(), append, "data delivered");
        if append {
            self.append_rows(rows);
        } else {
            self.replace_rows(rows);
        }
        self.fetch = FetchState::Loaded;
        self.render()?;
        Ok(Delivery::Applied(self.rows.visible_count()))
    }

    /// Replace the dataset directly. Outstanding requests become stale.
    pub fn reset(&mut self, rows: Vec<Vec<CellValue>>) -> Result<usize> {
        self.epoch += 1;
        self.fetch = FetchState::Loaded;
        self.replace_rows(rows);
        self.render()?;
        Ok(self.rows.visible_count())
    }

    /// Append rows directly.
    pub fn append(&mut self, rows: Vec<Vec<CellValue>>) -> Result<usize> {
        self.fetch = FetchState::Loaded;
        self.append_rows(rows);
        self.render()?;
        Ok(self.rows.visible_count())
    }

    /// Start a new epoch and request data again.
    ///
    /// Current rows stay on screen until the new delivery replaces them.
    pub fn reload(&mut self) -> FetchTicket {
        self.epoch += 1;
        self.fetch = FetchState::NotRequested;
        self.request_if_needed();
        self.current_ticket()
    }

    /// Sort on a column. `None` toggles direction when re-sorting the same column.
    pub fn sort(&mut self, name: &str, direction: Option<SortDirection>) -> Result<()> {
        let order = self.columns.require(name)?;
        if !self.column_at(order)?.sortable {
            return Err(GridError::NotSortable(name.to_string()));
        }
        self.rows.sort(order, direction)?;
        self.mark(Dirty::Structure);
        self.render()
    }

    /// Route sort values through `key`, re-sorting if a sort is active.
    pub fn set_sort_key(&mut self, key: Option<SortKeyFn>) -> Result<()> {
        self.rows.set_sort_key(key);
        if self.rows.sort_column().is_some() {
            self.rows.resort();
            self.mark(Dirty::Structure);
        }
        self.render()
    }

    /// Column name and direction of the active sort.
    pub fn sort_indicator(&self) -> Option<(&str, SortDirection)> {
        let order = self.rows.sort_column()?;
        let column = self.columns.at(order)?;
        Some((
            column.name.as_str(),
            SortDirection::from_descending(self.rows.sort_descending()),
        ))
    }

    /// Show only rows whose `name` cell contains `text`.
    pub fn filter(&mut self, name: &str, text: &str, case_sensitive: bool) -> Result<FilterOutcome> {
        let order = self.columns.require(name)?;
        let outcome = self.rows.filter(order, text, case_sensitive)?;
        if outcome == FilterOutcome::Changed {
            self.mark(Dirty::Structure);
        }
        self.render()?;
        Ok(outcome)
    }

    pub fn clear_filter(&mut self) -> Result<FilterOutcome> {
        let outcome = self.rows.clear_filter();
        if outcome == FilterOutcome::Changed {
            self.mark(Dirty::Structure);
        }
        self.render()?;
        Ok(outcome)
    }

    /// Move a column to display position `dest`.
    pub fn move_column(&mut self, name: &str, dest: usize) -> Result<()> {
        let src = self.columns.require(name)?;
        self.move_order(src, dest)
    }

    /// Header drag-and-drop: move the column at `src` to `dest`, if moves are enabled.
    pub fn drop_column(&mut self, src: usize, dest: usize) -> Result<()> {
        let column = self.column_at(src)?;
        if !self.config.movable_columns {
            return Err(GridError::NotMovable(column.name.clone()));
        }
        self.move_order(src, dest)
    }

    /// Set a column's width. Returns the width after clamping.
    pub fn resize_column(&mut self, name: &str, width: u32) -> Result<u32> {
        let column = self
            .columns
            .get(name)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))?;
        if !column.resizable {
            return Err(GridError::NotResizable(name.to_string()));
        }
        let applied = self.columns.resize(name, width)?;
        self.resized.push(name.to_string());
        self.render()?;
        Ok(applied)
    }

    pub fn show_column(&mut self, name: &str) -> Result<()> {
        self.set_column_visible(name, true)
    }

    pub fn hide_column(&mut self, name: &str) -> Result<()> {
        self.set_column_visible(name, false)
    }

    pub fn rename_column(&mut self, name: &str, label: &str) -> Result<()> {
        self.columns.rename(name, label)?;
        self.header_dirty = true;
        self.render()
    }

    /// Add a column at display position `position`, or after the last one.
    ///
    /// Existing rows read the new column as empty. Returns its position.
    pub fn add_column(&mut self, spec: ColumnSpec, position: Option<usize>) -> Result<usize> {
        let position = position.unwrap_or(self.columns.len());
        let order = self.columns.insert(spec, position, &self.surface)?;
        self.rows.insert_column(order)?;
        self.mark(Dirty::Structure);
        self.render()?;
        Ok(order)
    }

    /// Remove a column and its cells.
    pub fn remove_column(&mut self, name: &str) -> Result<ColumnModel> {
        let order = self.columns.require(name)?;
        let removed = self.columns.remove(name)?;
        self.rows.remove_column(order)?;
        self.mark(Dirty::Structure);
        self.render()?;
        Ok(removed)
    }

    /// Overwrite one cell of a visible row. Sort and filter are not re-applied.
    pub fn set_value(&mut self, row: usize, name: &str, value: CellValue) -> Result<()> {
        let order = self.columns.require(name)?;
        self.rows.set_value(row, order, value)?;
        self.mark(Dirty::Data);
        self.render()
    }

    /// Handle a click at header x offset `x`.
    ///
    /// A click on a sortable column's body sorts by it with toggle
    /// semantics. Resize-handle clicks are returned for the caller to drag.
    pub fn click_header(&mut self, x: u64) -> Result<HeaderHit> {
        let hit = self.header.hit(x);
        if let HeaderHit::Column(order) = hit {
            let sortable = self
                .columns
                .at(order)
                .filter(|c| c.sortable)
                .map(|c| c.name.clone());
            if let Some(name) = sortable {
                self.sort(&name, None)?;
            }
        }
        Ok(hit)
    }

    /// Cells of a visible row in display order, hidden columns included.
    pub fn row_values(&self, row: usize) -> Result<Vec<&CellValue>> {
        self.rows.row_values(row).ok_or(GridError::RowOutOfRange {
            index: row,
            len: self.rows.visible_count(),
        })
    }

    pub fn value(&self, row: usize, name: &str) -> Result<&CellValue> {
        let order = self.columns.require(name)?;
        self.rows.value(row, order).ok_or(GridError::RowOutOfRange {
            index: row,
            len: self.rows.visible_count(),
        })
    }

    fn mark(&mut self, level: Dirty) {
        self.dirty = self.dirty.max(level);
    }

    fn column_at(&self, order: usize) -> Result<&ColumnModel> {
        self.columns.at(order).ok_or(GridError::IndexOutOfRange {
            index: order,
            len: self.columns.len(),
        })
    }

    fn request_if_needed(&mut self) {
        if self.fetch != FetchState::NotRequested {
            return;
        }
        let ticket = self.current_ticket();
        self.fetch = FetchState::Pending(ticket);
        tracing::debug!(epoch = ticket.epoch, "requesting data");
        self.source.request(ticket);
    }

    fn replace_rows(&mut self, rows: Vec<Vec<CellValue>>) {
        let visible = self.rows.reset(rows);
        tracing::debug!(rows = self.rows.len(), visible, "dataset replaced");
        self.mark(Dirty::Structure);
    }

    fn append_rows(&mut self, rows: Vec<Vec<CellValue>>) {
        let appended = self.rows.add(rows);
        tracing::debug!(
            rows = appended.rows,
            visible = appended.visible,
            reordered = appended.reordered,
            "rows appended"
        );
        if appended.rows == 0 {
            return;
        }
        if appended.reordered || !self.engine.is_measured() {
            self.mark(Dirty::Structure);
        } else {
            self.mark(Dirty::Data);
        }
    }

    fn move_order(&mut self, src: usize, dest: usize) -> Result<()> {
        let len = self.columns.len();
        for index in [src, dest] {
            if index >= len {
                return Err(GridError::IndexOutOfRange { index, len });
            }
        }
        if src == dest {
            return Ok(());
        }
        self.columns.move_column(src, dest)?;
        self.rows.move_column(src, dest)?;
        self.mark(Dirty::Structure);
        self.render()
    }

    fn set_column_visible(&mut self, name: &str, visible: bool) -> Result<()> {
        if self.columns.set_visible(name, visible)? {
            self.mark(Dirty::Structure);
        }
        self.render()
    }

    fn render_header(&mut self) -> Result<()> {
        let sort = self.sort_indicator().map(|(name, dir)| (name.to_string(), dir));
        let cells: Vec<HeaderCell> = self
            .columns
            .iter()
            .filter(|c| c.visible)
            .map(|c| HeaderCell {
                name: c.name.clone(),
                label: c.label.clone(),
                width: c.width,
                sort: sort
                    .as_ref()
                    .filter(|(name, _)| *name == c.name)
                    .map(|(_, dir)| *dir),
            })
            .collect();
        self.surface.render_header(&cells)?;
        self.header = HeaderLayout::new(self.columns.iter(), self.config.resize_handle);
        self.resized.clear();
        Ok(())
    }

    fn flush_widths(&mut self) -> Result<()> {
        if self.resized.is_empty() {
            return Ok(());
        }
        for name in std::mem::take(&mut self.resized) {
            let Some(column) = self.columns.get(&name).filter(|c| c.visible) else {
                continue;
            };
            let slot = self
                .columns
                .iter()
                .take(column.order)
                .filter(|c| c.visible)
                .count();
            self.surface.set_column_width(slot, column.width)?;
        }
        self.header = HeaderLayout::new(self.columns.iter(), self.config.resize_handle);
        Ok(())
    }

    fn render_structure(&mut self) -> Result<()> {
        self.render_header()?;
        let count = self.rows.visible_count();
        if !self.engine.is_measured() && count > 0 {
            self.measure_row_height()?;
        }
        let scroll_top = self.surface.scroll_top();
        let update = self.engine.rebuild(scroll_top, count);
        tracing::debug!(
            scroll_top,
            visible = count,
            window = ?self.engine.window().range(),
            "structural render"
        );
        if update.is_unchanged() {
            // Nothing measured yet, so nothing was ever materialized
            return self.surface.set_spacers(self.engine.spacers(count));
        }
        self.apply(&update)
    }

    /// Materialize row 0 once to learn the row height.
    fn measure_row_height(&mut self) -> Result<()> {
        self.insert_row(RowAnchor::Bottom, 0)?;
        let measured = self.surface.measure_row_height();
        self.surface.remove_row(RowAnchor::Bottom)?;
        let row_height = measured.unwrap_or_else(|| {
            tracing::warn!(
                fallback = DEFAULT_ROW_HEIGHT,
                "surface reported no row height"
            );
            DEFAULT_ROW_HEIGHT
        });
        self.engine.set_row_height(row_height);
        tracing::debug!(
            row_height,
            capacity = self.engine.capacity(),
            "row height measured"
        );
        Ok(())
    }

    fn insert_row(&mut self, anchor: RowAnchor, row: usize) -> Result<()> {
        let texts = row_texts(&self.columns, &self.rows, row);
        let cells: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
        self.surface.insert_row(anchor, row, &cells)
    }

    fn refresh_row(&mut self, slot: usize, row: usize) -> Result<()> {
        let texts = row_texts(&self.columns, &self.rows, row);
        for (column, text) in texts.iter().enumerate() {
            self.surface.set_cell_text(slot, column, text)?;
        }
        Ok(())
    }

    fn apply(&mut self, update: &WindowUpdate) -> Result<()> {
        match update {
            WindowUpdate::Unchanged => return Ok(()),
            WindowUpdate::Rebuild(range) => {
                self.surface.clear_rows()?;
                for row in range.clone() {
                    self.insert_row(RowAnchor::Bottom, row)?;
                }
            }
            WindowUpdate::Shift(shift) => {
                for _ in 0..shift.remove_front {
                    self.surface.remove_row(RowAnchor::Top)?;
                }
                for _ in 0..shift.remove_back {
                    self.surface.remove_row(RowAnchor::Bottom)?;
                }
                if let Some(kept) = &shift.refresh {
                    for (slot, row) in kept.clone().enumerate() {
                        self.refresh_row(slot, row)?;
                    }
                }
                for row in shift.prepend.clone().rev() {
                    self.insert_row(RowAnchor::Top, row)?;
                }
                for row in shift.append.clone() {
                    self.insert_row(RowAnchor::Bottom, row)?;
                }
            }
        }
        let spacers = self.engine.spacers(self.rows.visible_count());
        self.surface.set_spacers(spacers)
    }
}
