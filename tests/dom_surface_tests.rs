//! DOM surface tests, run in a headless browser with `wasm-pack test`.

#![cfg(target_arch = "wasm32")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use atable::grid::{FetchTicket, GridConfig, GridController};
use atable::render::{DomSurface, HeaderCell, RenderSurface, RowAnchor};
use atable::{CellValue, ColumnSpec};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

fn parent() -> Element {
    let document = web_sys::window().unwrap().document().unwrap();
    let div = document.create_element("div").unwrap();
    document.body().unwrap().append_child(&div).unwrap();
    div
}

/// Text of every `<tbody>` row between the spacers.
fn body_texts(surface: &DomSurface) -> Vec<String> {
    let body = surface.scroll_element().query_selector("tbody").unwrap().unwrap();
    let rows = body.children();
    (1..rows.length().saturating_sub(1))
        .map(|i| rows.item(i).unwrap().text_content().unwrap_or_default())
        .collect()
}

fn header(names: &[&str]) -> Vec<HeaderCell> {
    names
        .iter()
        .map(|n| HeaderCell {
            name: (*n).to_string(),
            label: n.to_uppercase(),
            width: 60,
            sort: None,
        })
        .collect()
}

#[wasm_bindgen_test]
fn test_anchored_rows_stay_between_spacers() {
    let mut surface = DomSurface::new(&parent(), 200).unwrap();
    surface.render_header(&header(&["a", "b"])).unwrap();
    surface.insert_row(RowAnchor::Bottom, 1, &["1", "x"]).unwrap();
    surface.insert_row(RowAnchor::Bottom, 2, &["2", "y"]).unwrap();
    surface.insert_row(RowAnchor::Top, 0, &["0", "w"]).unwrap();
    assert_eq!(surface.materialized_len(), 3);
    assert_eq!(body_texts(&surface), ["0w", "1x", "2y"]);

    surface.remove_row(RowAnchor::Top).unwrap();
    surface.remove_row(RowAnchor::Bottom).unwrap();
    assert_eq!(body_texts(&surface), ["1x"]);

    surface.set_cell_text(0, 1, "z").unwrap();
    assert_eq!(body_texts(&surface), ["1z"]);

    surface.clear_rows().unwrap();
    assert_eq!(surface.materialized_len(), 0);
    assert!(body_texts(&surface).is_empty());
    surface.detach();
}

#[wasm_bindgen_test]
fn test_header_labels_and_row_height() {
    let mut surface = DomSurface::new(&parent(), 200).unwrap();
    surface.render_header(&header(&["id", "name"])).unwrap();
    assert_eq!(
        surface.header_element().text_content().unwrap_or_default(),
        "IDNAME"
    );
    assert_eq!(surface.measure_row_height(), None);
    surface.insert_row(RowAnchor::Bottom, 0, &["1", "one"]).unwrap();
    assert!(surface.measure_row_height().unwrap() > 0);
    surface.detach();
}

fn table_width(surface: &DomSurface) -> String {
    let table = surface.header_element().closest("table").unwrap().unwrap();
    let table: HtmlElement = table.dyn_into().unwrap();
    table.style().get_property_value("width").unwrap()
}

#[wasm_bindgen_test]
fn test_repeated_resize_keeps_table_width_exact() {
    let mut surface = DomSurface::new(&parent(), 200).unwrap();
    surface.render_header(&header(&["a", "b"])).unwrap();
    assert_eq!(table_width(&surface), "120px");
    for _ in 0..5 {
        surface.set_column_width(0, 100).unwrap();
    }
    assert_eq!(table_width(&surface), "160px");
    surface.set_column_width(1, 40).unwrap();
    assert_eq!(table_width(&surface), "140px");
    assert!(surface.set_column_width(2, 40).is_err());
    surface.detach();
}

#[wasm_bindgen_test]
fn test_grid_materializes_bounded_window() {
    let config = GridConfig::new(vec![ColumnSpec::new("n")], 200);
    let surface = DomSurface::new(&parent(), 200).unwrap();
    let mut grid = GridController::new(config, surface, |_: FetchTicket| {}).unwrap();
    grid.render().unwrap();
    let rows = (0..1000).map(|i| vec![CellValue::from(i)]).collect();
    grid.receive(grid.current_ticket(), rows, false).unwrap();
    let window = grid.window();
    assert_eq!(grid.surface().materialized_len(), window.len());
    assert!(window.len() <= grid.engine().max_window_len());
    assert_eq!(body_texts(grid.surface())[0], "0");
    grid.surface().detach();
}
