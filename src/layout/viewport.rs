//! Row window state management for scrolling.
//!
//! The window is the contiguous range of visible-row indices that are
//! materialized on the render surface. It covers the rows inside the
//! viewport plus `buffer_rows` on each side, so its length never exceeds
//! `capacity + 2 * buffer_rows` no matter how large the dataset is.
//!
//! Every transition returns a [`WindowUpdate`] describing how to turn the
//! previously materialized rows into the new window. Applying a
//! [`WindowShift`] to the old rows yields exactly the rows (and order) that
//! materializing the new window from scratch would.

use std::ops::Range;

use tracing::trace;

/// Default rows materialized beyond each end of the viewport.
pub const BUFFER_ROWS: usize = 5;

/// Row height assumed when a surface cannot measure one.
pub const DEFAULT_ROW_HEIGHT: u32 = 20;

/// Current and previous materialized ranges, as visible-row indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowWindow {
    pub first: usize,
    /// Exclusive
    pub last: usize,
    pub prev_first: usize,
    pub prev_last: usize,
}

impl RowWindow {
    pub fn range(&self) -> Range<usize> {
        self.first..self.last
    }

    pub fn prev_range(&self) -> Range<usize> {
        self.prev_first..self.prev_last
    }

    pub fn len(&self) -> usize {
        self.last.saturating_sub(self.first)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Heights of the two spacer rows around the materialized window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spacers {
    /// Height standing in for rows above the window
    pub top: u64,
    /// Height standing in for rows below the window
    pub bottom: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    /// Same offset as the previous transition
    Still,
}

impl ScrollDirection {
    fn between(prev: u32, next: u32) -> Self {
        match next.cmp(&prev) {
            std::cmp::Ordering::Less => Self::Up,
            std::cmp::Ordering::Greater => Self::Down,
            std::cmp::Ordering::Equal => Self::Still,
        }
    }
}

/// Incremental change from the old window to the new one.
///
/// Apply in field order: drop `remove_front` rows from the top and
/// `remove_back` from the bottom, re-read the kept rows if `refresh` is set,
/// then insert `prepend` above and `append` below.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowShift {
    pub remove_front: usize,
    pub remove_back: usize,
    /// Kept rows whose contents must be re-read
    pub refresh: Option<Range<usize>>,
    pub prepend: Range<usize>,
    pub append: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowUpdate {
    /// Nothing to do
    Unchanged,
    /// Drop every materialized row and materialize this range
    Rebuild(Range<usize>),
    Shift(WindowShift),
}

impl WindowUpdate {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Decides which rows are materialized as the viewport scrolls.
#[derive(Debug, Clone)]
pub struct WindowEngine {
    viewport_height: u32,
    buffer_rows: usize,
    rows_to_render: Option<usize>,
    row_height: Option<u32>,
    capacity: usize,
    window: RowWindow,
    /// Offset the current window was computed for
    scroll_top: u32,
}

impl WindowEngine {
    /// Create an engine for a viewport of `viewport_height` pixels.
    ///
    /// `rows_to_render` overrides the viewport-derived row capacity so that
    /// a window anchored at the top of the data holds exactly that many rows.
    pub fn new(viewport_height: u32, buffer_rows: usize, rows_to_render: Option<usize>) -> Self {
        Self {
            viewport_height,
            buffer_rows,
            rows_to_render,
            row_height: None,
            capacity: 0,
            window: RowWindow::default(),
            scroll_top: 0,
        }
    }

    /// Record the measured pixel height of one row.
    pub fn set_row_height(&mut self, row_height: u32) {
        let row_height = row_height.max(1);
        self.row_height = Some(row_height);
        let from_viewport =
            usize::try_from(self.viewport_height / row_height).unwrap_or(usize::MAX);
        self.capacity = self
            .rows_to_render
            .map_or(from_viewport, |n| n.saturating_sub(self.buffer_rows))
            .max(1);
        trace!(row_height, capacity = self.capacity, "row height measured");
    }

    pub fn row_height(&self) -> Option<u32> {
        self.row_height
    }

    pub fn is_measured(&self) -> bool {
        self.row_height.is_some()
    }

    /// Rows that fit in the viewport.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn buffer_rows(&self) -> usize {
        self.buffer_rows
    }

    /// Upper bound on materialized rows.
    pub fn max_window_len(&self) -> usize {
        self.capacity + 2 * self.buffer_rows
    }

    pub fn window(&self) -> RowWindow {
        self.window
    }

    /// Scroll offset of the last transition.
    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    /// Window that should be materialized at `scroll_top` over `count` visible rows.
    pub fn target(&self, scroll_top: u32, count: usize) -> Range<usize> {
        let Some(row_height) = self.row_height else {
            return 0..0;
        };
        let first_visible = usize::try_from(scroll_top / row_height).unwrap_or(usize::MAX);
        let mut first = first_visible.saturating_sub(self.buffer_rows);
        let mut last = first_visible
            .saturating_add(self.capacity)
            .saturating_add(self.buffer_rows);
        if last > count {
            last = count;
            first = last.saturating_sub(self.capacity + self.buffer_rows);
        }
        first..last
    }

    /// Spacer heights that keep the scrollable height at `count` rows.
    pub fn spacers(&self, count: usize) -> Spacers {
        let row_height = u64::from(self.row_height.unwrap_or(0));
        let first = u64::try_from(self.window.first).unwrap_or(u64::MAX);
        let below = u64::try_from(count.saturating_sub(self.window.last)).unwrap_or(u64::MAX);
        Spacers {
            top: first.saturating_mul(row_height),
            bottom: below.saturating_mul(row_height),
        }
    }

    /// Transition for a scroll event.
    pub fn scroll_to(&mut self, scroll_top: u32, count: usize) -> WindowUpdate {
        if !self.is_measured() {
            return WindowUpdate::Unchanged;
        }
        let direction = ScrollDirection::between(self.scroll_top, scroll_top);
        let target = self.target(scroll_top, count);
        let update = self.transition(target, false);
        self.scroll_top = scroll_top;
        trace!(
            scroll_top,
            ?direction,
            first = self.window.first,
            last = self.window.last,
            ?update,
            "window scrolled"
        );
        update
    }

    /// Transition after rows were appended or edited at an unchanged offset.
    ///
    /// Kept rows are refreshed in place; an under-filled window grows to take
    /// in newly available rows.
    pub fn data_changed(&mut self, count: usize) -> WindowUpdate {
        if !self.is_measured() {
            return WindowUpdate::Unchanged;
        }
        let target = self.target(self.scroll_top, count);
        let update = self.transition(target, true);
        trace!(
            first = self.window.first,
            last = self.window.last,
            ?update,
            "window refreshed"
        );
        update
    }

    /// Transition after row identity changed (sort, filter, reset, column move).
    ///
    /// Always rematerializes the window at `scroll_top`, clamped to the data.
    pub fn rebuild(&mut self, scroll_top: u32, count: usize) -> WindowUpdate {
        if !self.is_measured() {
            return WindowUpdate::Unchanged;
        }
        let target = self.target(scroll_top, count);
        self.advance(target.clone());
        self.scroll_top = scroll_top;
        trace!(
            scroll_top,
            first = self.window.first,
            last = self.window.last,
            "window rebuilt"
        );
        WindowUpdate::Rebuild(target)
    }

    fn advance(&mut self, next: Range<usize>) {
        self.window = RowWindow {
            first: next.start,
            last: next.end,
            prev_first: self.window.first,
            prev_last: self.window.last,
        };
    }

    fn transition(&mut self, next: Range<usize>, refresh: bool) -> WindowUpdate {
        let old = self.window.range();
        self.advance(next.clone());
        diff(old, next, refresh)
    }
}

/// Diff two windows.
///
/// Overlapping windows shift incrementally; disjoint ones (a jump) or an
/// empty side rematerialize from scratch.
fn diff(old: Range<usize>, next: Range<usize>, refresh: bool) -> WindowUpdate {
    if old == next {
        return if refresh && !next.is_empty() {
            WindowUpdate::Shift(WindowShift {
                refresh: Some(next),
                ..WindowShift::default()
            })
        } else {
            WindowUpdate::Unchanged
        };
    }
    if old.is_empty() || next.is_empty() || next.end <= old.start || next.start >= old.end {
        return WindowUpdate::Rebuild(next);
    }
    let kept = old.start.max(next.start)..old.end.min(next.end);
    WindowUpdate::Shift(WindowShift {
        remove_front: next.start.saturating_sub(old.start),
        remove_back: old.end.saturating_sub(next.end),
        refresh: refresh.then_some(kept),
        prepend: next.start..old.start.max(next.start),
        append: old.end.min(next.end)..next.end,
    })
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

    fn engine(height: u32, row_height: u32) -> WindowEngine {
        let mut e = WindowEngine::new(height, BUFFER_ROWS, None);
        e.set_row_height(row_height);
        e
    }

    /// Apply an update to a list of materialized row indices.
    fn apply(rows: &mut Vec<usize>, update: &WindowUpdate) {
        match update {
            WindowUpdate::Unchanged => {}
            WindowUpdate::Rebuild(range) => *rows = range.clone().collect(),
            WindowUpdate::Shift(shift) => {
                rows.drain(..shift.remove_front);
                rows.truncate(rows.len() - shift.remove_back);
                let mut next: Vec<usize> = shift.prepend.clone().collect();
                next.append(rows);
                next.extend(shift.append.clone());
                *rows = next;
            }
        }
    }

    #[test]
    fn test_unmeasured_engine_materializes_nothing() {
        let mut e = WindowEngine::new(300, BUFFER_ROWS, None);
        assert_eq!(e.scroll_to(100, 500), WindowUpdate::Unchanged);
        assert_eq!(e.target(0, 500), 0..0);
    }

    #[test]
    fn test_initial_window_at_top() {
        let mut e = engine(300, 20);
        assert_eq!(e.capacity(), 15);
        assert_eq!(e.rebuild(0, 500), WindowUpdate::Rebuild(0..20));
    }

    #[test]
    fn test_rows_to_render_override() {
        let mut e = WindowEngine::new(300, BUFFER_ROWS, Some(100));
        e.set_row_height(20);
        assert_eq!(e.rebuild(0, 500), WindowUpdate::Rebuild(0..100));
        let mut rows: Vec<usize> = (0..100).collect();
        let update = e.scroll_to(1000, 500);
        apply(&mut rows, &update);
        assert_eq!(rows.first(), Some(&45));
        assert_eq!(e.window().range(), 45..150);
        assert!(rows.len() <= e.max_window_len());
    }

    #[test]
    fn test_scroll_down_shifts() {
        let mut e = engine(300, 20);
        e.rebuild(0, 500);
        let update = e.scroll_to(200, 500);
        // first visible 10 → window 5..30
        assert_eq!(
            update,
            WindowUpdate::Shift(WindowShift {
                remove_front: 5,
                remove_back: 0,
                refresh: None,
                prepend: 5..5,
                append: 20..30,
            })
        );
        assert_eq!(e.window().prev_range(), 0..20);
    }

    #[test]
    fn test_scroll_up_prepends() {
        let mut e = engine(300, 20);
        e.rebuild(2000, 500);
        assert_eq!(e.window().range(), 95..120);
        let WindowUpdate::Shift(shift) = e.scroll_to(1900, 500) else {
            panic!("expected shift");
        };
        assert_eq!(shift.prepend, 90..95);
        assert_eq!(shift.remove_back, 5);
        assert_eq!(shift.remove_front, 0);
    }

    #[test]
    fn test_jump_rebuilds() {
        let mut e = engine(300, 20);
        e.rebuild(0, 500);
        assert_eq!(e.scroll_to(5000, 500), WindowUpdate::Rebuild(245..270));
        assert_eq!(e.scroll_to(0, 500), WindowUpdate::Rebuild(0..20));
    }

    #[test]
    fn test_tail_clamp() {
        let e = engine(300, 20);
        // 490 visible rows past the end → clamp to the last capacity + buffer rows
        assert_eq!(e.target(20 * 490, 500), 480..500);
        assert_eq!(e.target(u32::MAX, 500), 480..500);
        assert_eq!(e.target(0, 7), 0..7);
        assert_eq!(e.target(400, 0), 0..0);
    }

    #[test]
    fn test_spacers_cover_unmaterialized_rows() {
        let mut e = engine(300, 20);
        e.rebuild(1000, 500);
        let range = e.window().range();
        let spacers = e.spacers(500);
        let rows = |n: usize| 20 * u64::try_from(n).unwrap();
        assert_eq!(spacers.top, rows(range.start));
        assert_eq!(spacers.bottom, rows(500 - range.end));
        assert_eq!(spacers.top + spacers.bottom + rows(range.len()), 500 * 20);
    }

    #[test]
    fn test_data_change_grows_underfilled_window() {
        let mut e = engine(300, 20);
        assert_eq!(e.rebuild(0, 8), WindowUpdate::Rebuild(0..8));
        let update = e.data_changed(100);
        assert_eq!(
            update,
            WindowUpdate::Shift(WindowShift {
                remove_front: 0,
                remove_back: 0,
                refresh: Some(0..8),
                prepend: 0..0,
                append: 8..20,
            })
        );
    }

    #[test]
    fn test_data_change_refreshes_full_window_in_place() {
        let mut e = engine(300, 20);
        e.rebuild(0, 100);
        let update = e.data_changed(200);
        assert_eq!(
            update,
            WindowUpdate::Shift(WindowShift {
                refresh: Some(0..20),
                ..WindowShift::default()
            })
        );
    }

    #[test]
    fn test_same_offset_scroll_is_unchanged() {
        let mut e = engine(300, 20);
        e.rebuild(400, 500);
        assert_eq!(e.scroll_to(400, 500), WindowUpdate::Unchanged);
        assert_eq!(e.scroll_to(401, 500), WindowUpdate::Unchanged);
    }

    #[test]
    fn test_diff_matches_fresh_materialization() {
        let mut e = engine(300, 20);
        let count = 500;
        let mut rows = Vec::new();
        apply(&mut rows, &e.rebuild(0, count));
        for offset in [4, 1000, 900, 100, 0, 2040, 10_000, 5000, 5020, 4980] {
            let update = e.scroll_to(offset, count);
            apply(&mut rows, &update);
            let expected: Vec<usize> = e.target(offset, count).collect();
            assert_eq!(rows, expected, "offset {offset}");
            assert!(rows.len() <= e.max_window_len());
        }
    }
}
