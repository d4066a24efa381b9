//! Grid controller tests
//!
//! Drives a controller over the in-memory surface and checks what ends up
//! materialized: fetch lifecycle, render idempotence, appends, sorting,
//! filtering, and every column operation.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::cell::Cell;
use std::rc::Rc;

use atable::format::display_value;
use atable::grid::{Delivery, FetchTicket, GridConfig, GridController};
use atable::layout::HeaderHit;
use atable::render::{MemorySurface, RenderSurface};
use atable::{CellValue, ColumnSpec, FilterOutcome, GridError, SortDirection};
use common::*;
use test_case::test_case;

fn header_names(grid: &TestGrid) -> Vec<String> {
    grid.surface()
        .header()
        .iter()
        .map(|h| h.name.clone())
        .collect()
}

/// Every materialized row shows the display text of its visible row.
fn assert_rows_match_data(grid: &TestGrid) {
    let visible: Vec<usize> = grid
        .columns()
        .iter()
        .filter(|c| c.visible)
        .map(|c| c.order)
        .collect();
    for row in grid.surface().rows() {
        let values = grid.row_values(row.row).unwrap();
        let expected: Vec<String> = visible
            .iter()
            .map(|&order| display_value(values[order]).into_owned())
            .collect();
        assert_eq!(row.cells, expected, "row {}", row.row);
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test_case(GridConfig::new(Vec::new(), 300) ; "no columns")]
#[test_case(GridConfig::new(columns(2), 0) ; "zero height")]
#[test_case(config(2).with_sort("missing", SortDirection::Ascending) ; "unknown sort column")]
#[test_case(config(2).with_rows_to_render(3) ; "rows to render below buffer")]
#[test_case(GridConfig::new(vec![ColumnSpec::new("a"), ColumnSpec::new("a")], 300) ; "duplicate name")]
fn test_invalid_config_builds_nothing(config: GridConfig) {
    let built = GridController::new(config, MemorySurface::new(20), ScriptedSource::default());
    assert!(matches!(built, Err(GridError::Config(_))));
}

#[test]
fn test_nothing_happens_before_first_render() {
    let source = ScriptedSource::default();
    let g = GridController::new(config(2), MemorySurface::new(20), source.clone()).unwrap();
    assert_eq!(source.count(), 0);
    assert_eq!(g.surface().ops().total(), 0);
}

// ============================================================================
// Fetch lifecycle
// ============================================================================

#[test]
fn test_fetch_requested_exactly_once() {
    let mut g = grid(config(2));
    assert_eq!(g.source().count(), 1);
    assert!(g.is_fetching());
    g.render().unwrap();
    g.render().unwrap();
    assert_eq!(g.source().count(), 1);

    let ticket = g.source().last().unwrap();
    g.receive(ticket, numeric_rows(10, 2), false).unwrap();
    assert!(g.is_loaded());
    g.render().unwrap();
    assert_eq!(g.source().count(), 1);
}

#[test]
fn test_closure_data_source() {
    let asked = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&asked);
    let mut g = GridController::new(
        config(1),
        MemorySurface::new(20),
        move |_: FetchTicket| counter.set(counter.get() + 1),
    )
    .unwrap();
    g.render().unwrap();
    g.render().unwrap();
    assert_eq!(asked.get(), 1);
}

#[test]
fn test_reload_requests_again_and_drops_stale_delivery() {
    let mut g = loaded_grid(config(2), numeric_rows(10, 2));
    let old = g.source().last().unwrap();
    let fresh = g.reload();
    assert_eq!(g.source().count(), 2);
    assert_eq!(g.source().last(), Some(fresh));
    assert_ne!(old, fresh);
    // Old rows stay up until the new delivery
    assert_eq!(g.visible_count(), 10);

    let late = g.receive(old, numeric_rows(50, 2), false).unwrap();
    assert_eq!(late, Delivery::Stale);
    assert_eq!(g.visible_count(), 10);

    let applied = g.receive(fresh, numeric_rows(30, 2), false).unwrap();
    assert_eq!(applied, Delivery::Applied(30));
    assert_window_invariants(&g);
}

#[test]
fn test_reset_makes_pending_request_stale() {
    let mut g = grid(config(2));
    let pending = g.source().last().unwrap();
    assert_eq!(g.reset(numeric_rows(5, 2)).unwrap(), 5);
    let late = g.receive(pending, numeric_rows(100, 2), false).unwrap();
    assert_eq!(late, Delivery::Stale);
    assert_eq!(g.visible_count(), 5);
    assert_rows_match_data(&g);
}

// ============================================================================
// Render pass
// ============================================================================

#[test]
fn test_render_is_idempotent() {
    let mut g = loaded_grid(config(3), numeric_rows(200, 3));
    g.surface_mut().take_ops();
    g.render().unwrap();
    g.render().unwrap();
    g.scroll_to(0).unwrap();
    assert_eq!(g.surface().ops().total(), 0);
}

#[test]
fn test_render_with_runs_callback_once() {
    let mut g = loaded_grid(config(2), numeric_rows(50, 2));
    let calls = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&calls);
    g.render_with(move || seen.set(seen.get() + 1)).unwrap();
    assert_eq!(calls.get(), 1);
    g.render().unwrap();
    g.sort("c0", None).unwrap();
    assert_eq!(calls.get(), 1);
    assert_window_invariants(&g);
}

#[test]
fn test_header_shows_labels_and_sort_indicator() {
    let config = GridConfig::new(
        vec![ColumnSpec::new("id").label("ID"), ColumnSpec::new("name")],
        HEIGHT,
    )
    .with_sort("name", SortDirection::Descending);
    let g = grid(config);
    let header = g.surface().header();
    assert_eq!(header[0].label, "ID");
    assert_eq!(header[0].sort, None);
    assert_eq!(header[1].sort, Some(SortDirection::Descending));
    assert_eq!(g.sort_indicator(), Some(("name", SortDirection::Descending)));
}

// ============================================================================
// Appends
// ============================================================================

#[test]
fn test_append_grows_underfilled_window() {
    let mut all = numeric_rows(108, 3);
    let rest = all.split_off(8);
    let mut g = loaded_grid(config(3), all);
    assert_eq!(g.window().range(), 0..8);
    g.surface_mut().take_ops();

    assert_eq!(g.append(rest).unwrap(), 108);
    assert_eq!(g.window().range(), 0..20);
    let ops = g.surface().ops();
    assert_eq!(ops.clears, 0);
    assert_eq!(ops.rows_inserted, 12);
    assert_eq!(ops.cell_writes, 8 * 3);
    assert_window_invariants(&g);
    assert_rows_match_data(&g);
}

#[test]
fn test_append_delivery_with_current_ticket() {
    let mut g = loaded_grid(config(2), numeric_rows(30, 2));
    let ticket = g.current_ticket();
    let delivered = g.receive(ticket, numeric_rows(5, 2), true).unwrap();
    assert_eq!(delivered, Delivery::Applied(35));
    assert_window_invariants(&g);
}

#[test]
fn test_append_that_reorders_rematerializes() {
    let mut all = numeric_rows(100, 1);
    let high = all.split_off(50);
    let mut g = loaded_grid(config(1).with_sort("c0", SortDirection::Ascending), high);
    assert_eq!(rendered_numbers(&g, 0)[0], 50.0);
    g.surface_mut().take_ops();

    g.append(all).unwrap();
    assert_eq!(g.surface().ops().clears, 1);
    assert_eq!(rendered_numbers(&g, 0)[..3], [0.0, 1.0, 2.0]);
    assert_window_invariants(&g);
}

#[test]
fn test_append_before_first_delivery_measures() {
    let mut g = grid(config(2));
    assert!(!g.engine().is_measured());
    g.append(numeric_rows(40, 2)).unwrap();
    assert!(g.engine().is_measured());
    assert_eq!(g.window().range(), 0..20);
    assert_window_invariants(&g);
}

// ============================================================================
// Sorting
// ============================================================================

#[test]
fn test_sort_rematerializes_at_current_offset() {
    let mut g = loaded_grid(config(2), numeric_rows(1000, 2));
    g.scroll_to(2000).unwrap();
    g.sort("c0", Some(SortDirection::Descending)).unwrap();
    assert_eq!(g.window().first, 95);
    assert_eq!(rendered_numbers(&g, 0)[0], f64::from((999 - 95) * 2));
    assert_eq!(g.sort_indicator(), Some(("c0", SortDirection::Descending)));
    assert_window_invariants(&g);
    assert_rows_match_data(&g);
}

#[test]
fn test_click_header_sorts_then_toggles() {
    // Each header is 2 chars * 7px + 20px padding = 34px wide
    let mut g = loaded_grid(config(4), numeric_rows(100, 4));
    assert_eq!(g.click_header(10).unwrap(), HeaderHit::Column(0));
    assert_eq!(g.sort_indicator(), Some(("c0", SortDirection::Ascending)));
    assert_eq!(rendered_numbers(&g, 0)[0], 0.0);

    g.click_header(10).unwrap();
    assert_eq!(g.sort_indicator(), Some(("c0", SortDirection::Descending)));
    assert_eq!(rendered_numbers(&g, 0)[0], 396.0);

    assert_eq!(g.click_header(50).unwrap(), HeaderHit::Column(1));
    assert_eq!(g.sort_indicator(), Some(("c1", SortDirection::Descending)));
}

#[test_case(33, HeaderHit::Resize(0) ; "right edge")]
#[test_case(36, HeaderHit::Resize(0) ; "left edge of next column")]
#[test_case(200, HeaderHit::None ; "past the last column")]
fn test_click_on_handle_does_not_sort(x: u64, expected: HeaderHit) {
    let mut g = loaded_grid(config(4), numeric_rows(10, 4));
    g.surface_mut().take_ops();
    assert_eq!(g.click_header(x).unwrap(), expected);
    assert_eq!(g.sort_indicator(), None);
    assert_eq!(g.surface().ops().total(), 0);
}

#[test]
fn test_unsortable_column() {
    let config = GridConfig::new(
        vec![ColumnSpec::new("a").sortable(false), ColumnSpec::new("b")],
        HEIGHT,
    );
    let mut g = loaded_grid(config, numeric_rows(10, 2));
    assert!(matches!(g.sort("a", None), Err(GridError::NotSortable(n)) if n == "a"));
    assert_eq!(g.click_header(5).unwrap(), HeaderHit::Column(0));
    assert_eq!(g.sort_indicator(), None);
}

#[test]
fn test_sort_key_function_reorders() {
    let mut g = loaded_grid(config(1), numeric_rows(10, 1));
    g.sort("c0", Some(SortDirection::Ascending)).unwrap();
    // Odd numbers first
    g.set_sort_key(Some(Box::new(|v: &CellValue| match v {
        CellValue::Number(n) => CellValue::Number(if n % 2.0 == 0.0 { 1.0 } else { 0.0 }),
        other => other.clone(),
    })))
    .unwrap();
    assert_eq!(rendered_numbers(&g, 0)[..5], [1.0, 3.0, 5.0, 7.0, 9.0]);
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_filter_shows_matching_rows() {
    let mut g = loaded_grid(config(2), numeric_rows(100, 2));
    let expected = (0..100usize)
        .filter(|r| (r * 2 + 1).to_string().contains('1'))
        .count();
    assert_eq!(g.filter("c1", "1", false).unwrap(), FilterOutcome::Changed);
    assert_eq!(g.visible_count(), expected);
    assert!(rendered_column(&g, 1).iter().all(|t| t.contains('1')));
    assert_window_invariants(&g);
    assert_visible_count(&g);

    g.surface_mut().take_ops();
    assert_eq!(g.filter("c1", "1", false).unwrap(), FilterOutcome::Unchanged);
    assert_eq!(g.surface().ops().total(), 0);

    assert_eq!(g.clear_filter().unwrap(), FilterOutcome::Changed);
    assert_eq!(g.visible_count(), 100);
    assert_window_invariants(&g);
}

#[test]
fn test_filter_matching_nothing() {
    let mut g = loaded_grid(config(2), numeric_rows(100, 2));
    g.scroll_to(800).unwrap();
    g.filter("c0", "zzz", false).unwrap();
    assert_eq!(g.visible_count(), 0);
    assert_eq!(g.surface().materialized_len(), 0);
    assert_eq!(g.surface().spacers().top, 0);
    assert_eq!(g.surface().spacers().bottom, 0);
    g.scroll_to(0).unwrap();
    assert_eq!(g.surface().materialized_len(), 0);
}

#[test]
fn test_filter_follows_moved_column() {
    let mut g = loaded_grid(config(2), numeric_rows(100, 2));
    g.filter("c1", "3", false).unwrap();
    let count = g.visible_count();
    g.move_column("c1", 0).unwrap();
    assert_eq!(g.rows().filter_spec().unwrap().column, 1);
    assert_eq!(g.visible_count(), count);
    assert!(rendered_column(&g, 0).iter().all(|t| t.contains('3')));
}

#[test]
fn test_filter_after_scroll_clamps_window() {
    let mut g = loaded_grid(config(2), numeric_rows(1000, 2));
    g.scroll_to(19_000).unwrap();
    g.filter("c0", "4", false).unwrap();
    assert_window_invariants(&g);
    assert!(g.window().last <= g.visible_count());
    assert_rows_match_data(&g);
}

// ============================================================================
// Column operations
// ============================================================================

#[test]
fn test_move_column_rotates_rendered_cells() {
    let mut g = loaded_grid(config(4), numeric_rows(1, 4));
    g.move_column("c0", 3).unwrap();
    assert_eq!(g.surface().texts()[0], ["1", "2", "3", "0"]);
    assert_eq!(header_names(&g), ["c1", "c2", "c3", "c0"]);
    let values: Vec<CellValue> = g.row_values(0).unwrap().into_iter().cloned().collect();
    assert_eq!(values, vec![number(1), number(2), number(3), number(0)]);
}

#[test]
fn test_move_keeps_sort_on_same_column() {
    let mut g = loaded_grid(
        config(4).with_sort("c2", SortDirection::Descending),
        numeric_rows(20, 4),
    );
    g.move_column("c0", 3).unwrap();
    assert_eq!(g.rows().sort_column(), Some(1));
    assert_eq!(g.sort_indicator(), Some(("c2", SortDirection::Descending)));
    assert_eq!(rendered_numbers(&g, 1)[0], 78.0);
}

#[test]
fn test_drop_column_respects_movable_flag() {
    let mut g = loaded_grid(config(3).with_movable_columns(false), numeric_rows(5, 3));
    g.surface_mut().take_ops();
    assert!(matches!(g.drop_column(0, 2), Err(GridError::NotMovable(n)) if n == "c0"));
    assert_eq!(header_names(&g), ["c0", "c1", "c2"]);
    assert_eq!(g.surface().ops().total(), 0);

    let mut g = loaded_grid(config(3), numeric_rows(5, 3));
    g.drop_column(0, 2).unwrap();
    assert_eq!(header_names(&g), ["c1", "c2", "c0"]);
}

#[test]
fn test_resize_column_clamps_and_updates_width_only() {
    let mut g = loaded_grid(config(4), numeric_rows(50, 4));
    g.surface_mut().take_ops();
    assert_eq!(g.resize_column("c0", 5).unwrap(), 20);
    let ops = g.surface().ops();
    assert_eq!(ops.width_updates, 1);
    assert_eq!(ops.rows_inserted + ops.clears + ops.header_renders, 0);
    assert_eq!(g.surface().header()[0].width, 20);
    assert_eq!(g.header_layout().total_width(), 20 + 3 * 34);

    assert_eq!(g.resize_column("c1", 140).unwrap(), 140);
    assert_eq!(g.header_layout().left_of(2), Some(160));
}

#[test]
fn test_default_widths_follow_surface_metrics() {
    let mut g = GridController::new(
        GridConfig::new(vec![ColumnSpec::new("a"), ColumnSpec::new("name").width(5)], HEIGHT),
        MemorySurface::new(ROW_HEIGHT).with_char_width(10),
        ScriptedSource::default(),
    )
    .unwrap();
    g.render().unwrap();
    let widths: Vec<u32> = g.surface().header().iter().map(|h| h.width).collect();
    // Label width plus padding; explicit widths still respect the minimum
    assert_eq!(widths, [10 + 20, 20]);
}

#[test]
fn test_resize_rejects_fixed_column() {
    let config = GridConfig::new(
        vec![ColumnSpec::new("a").resizable(false).width(90), ColumnSpec::new("b")],
        HEIGHT,
    );
    let mut g = loaded_grid(config, numeric_rows(5, 2));
    assert!(matches!(
        g.resize_column("a", 200),
        Err(GridError::NotResizable(n)) if n == "a"
    ));
    assert_eq!(g.columns().get("a").unwrap().width, 90);
}

#[test]
fn test_hide_and_show_column() {
    let mut g = loaded_grid(config(4), numeric_rows(30, 4));
    g.hide_column("c1").unwrap();
    assert_eq!(header_names(&g), ["c0", "c2", "c3"]);
    assert_eq!(g.surface().texts()[0], ["0", "2", "3"]);
    assert_eq!(g.click_header(50).unwrap(), HeaderHit::Column(2));
    assert_rows_match_data(&g);

    g.surface_mut().take_ops();
    g.hide_column("c1").unwrap();
    assert_eq!(g.surface().ops().total(), 0);

    g.show_column("c1").unwrap();
    assert_eq!(g.surface().texts()[0], ["0", "1", "2", "3"]);
}

#[test]
fn test_rename_redraws_header_only() {
    let mut g = loaded_grid(config(2), numeric_rows(30, 2));
    g.surface_mut().take_ops();
    g.rename_column("c0", "First").unwrap();
    let ops = g.surface().ops();
    assert_eq!(ops.header_renders, 1);
    assert_eq!(ops.rows_inserted + ops.rows_removed + ops.clears, 0);
    assert_eq!(g.surface().header()[0].label, "First");
    assert!(matches!(
        g.rename_column("c0", ""),
        Err(GridError::InvalidLabel(_))
    ));
}

#[test]
fn test_add_column_reads_empty_then_accepts_values() {
    let mut g = loaded_grid(config(3), numeric_rows(30, 3));
    assert_eq!(g.add_column(ColumnSpec::new("extra"), Some(1)).unwrap(), 1);
    assert_eq!(g.surface().texts()[0], ["0", "", "1", "2"]);

    g.set_value(0, "extra", "hi".into()).unwrap();
    assert_eq!(g.surface().texts()[0], ["0", "hi", "1", "2"]);
    assert_eq!(g.value(0, "extra").unwrap(), &CellValue::from("hi"));

    assert!(matches!(
        g.add_column(ColumnSpec::new("c0"), None),
        Err(GridError::DuplicateName(_))
    ));
    assert_eq!(g.add_column(ColumnSpec::new("last"), None).unwrap(), 4);
}

#[test]
fn test_remove_column_drops_cells() {
    let mut g = loaded_grid(config(3).with_sort("c1", SortDirection::Descending), numeric_rows(30, 3));
    let removed = g.remove_column("c1").unwrap();
    assert_eq!(removed.name, "c1");
    assert_eq!(g.sort_indicator(), None);
    assert_eq!(header_names(&g), ["c0", "c2"]);
    assert_rows_match_data(&g);
    assert!(matches!(g.value(0, "c1"), Err(GridError::UnknownColumn(_))));
}

#[test]
fn test_last_column_cannot_be_removed() {
    let mut g = loaded_grid(config(2), numeric_rows(30, 2));
    g.remove_column("c0").unwrap();
    let before = g.surface().texts();
    assert!(matches!(
        g.remove_column("c1"),
        Err(GridError::LastColumn(name)) if name == "c1"
    ));
    assert_eq!(header_names(&g), ["c1"]);
    assert_eq!(g.surface().texts(), before);
    assert_eq!(g.value(0, "c1").unwrap(), &CellValue::Number(1.0));
}

#[test]
fn test_wide_rows_leave_added_column_empty() {
    let mut g = grid(config(2));
    let rows = (0..30)
        .map(|r| vec![number(r), number(r + 10), CellValue::from("extra")])
        .collect();
    g.receive(g.current_ticket(), rows, false).unwrap();
    g.add_column(ColumnSpec::new("new"), None).unwrap();
    assert_eq!(g.value(0, "new").unwrap(), &CellValue::Empty);
    assert_eq!(g.surface().texts()[0], ["0", "10", ""]);
}

// ============================================================================
// Cell edits and errors
// ============================================================================

#[test]
fn test_set_value_does_not_resort() {
    let mut g = loaded_grid(
        config(2).with_sort("c0", SortDirection::Ascending),
        numeric_rows(50, 2),
    );
    g.surface_mut().take_ops();
    g.set_value(0, "c0", CellValue::Number(1e9)).unwrap();
    assert_eq!(g.surface().texts()[0][0], "1000000000");
    assert_eq!(g.surface().ops().clears, 0);
    assert!(matches!(
        g.set_value(500, "c0", CellValue::Empty),
        Err(GridError::RowOutOfRange { index: 500, len: 50 })
    ));
}

#[test]
fn test_errors_leave_grid_untouched() {
    let mut g = loaded_grid(config(3), numeric_rows(40, 3));
    g.surface_mut().take_ops();
    assert!(matches!(g.sort("nope", None), Err(GridError::UnknownColumn(_))));
    assert!(matches!(
        g.move_column("c0", 10),
        Err(GridError::IndexOutOfRange { index: 10, len: 3 })
    ));
    assert!(g.filter("nope", "x", false).is_err());
    assert!(g.hide_column("nope").is_err());
    assert_eq!(g.surface().ops().total(), 0);
    assert_eq!(header_names(&g), ["c0", "c1", "c2"]);
    assert_eq!(g.sort_indicator(), None);
}

// ============================================================================
// Invariants under random operations
// ============================================================================

#[test]
fn test_random_operations_keep_window_consistent() {
    let cols = 3;
    let mut g = loaded_grid(config(cols), numeric_rows(500, cols));
    let mut rng = fastrand::Rng::with_seed(2024);
    let names = ["c0", "c1", "c2"];
    for step in 0..300 {
        match rng.u8(0..7) {
            0 | 1 => {
                let max = u32::try_from(g.visible_count()).unwrap() * ROW_HEIGHT + 400;
                g.scroll_to(rng.u32(0..max)).unwrap();
            }
            2 => {
                let needle = rng.u8(0..10).to_string();
                g.filter(names[rng.usize(0..cols)], &needle, false).unwrap();
            }
            3 => {
                g.clear_filter().unwrap();
            }
            4 => {
                g.sort(names[rng.usize(0..cols)], None).unwrap();
            }
            5 => {
                g.move_column(names[rng.usize(0..cols)], rng.usize(0..cols))
                    .unwrap();
            }
            _ => {
                g.append(numeric_rows(rng.usize(0..30), cols)).unwrap();
            }
        }
        assert_window_invariants(&g);
        assert_visible_count(&g);
        assert_rows_match_data(&g);
        assert!(
            g.surface().materialized_len() <= g.engine().max_window_len(),
            "step {step}"
        );
    }
}
