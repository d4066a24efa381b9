//! DOM render surface (wasm32 only).
//!
//! Builds a fixed-height scroll container holding one `<table>`:
//! - a sticky `<thead>` row with one `<th>` per visible column
//! - a `<tbody>` whose first and last rows are spacers sized to stand in for
//!   the rows outside the window, so the native scrollbar spans the full data
//!
//! Data rows always live between the two spacers, which makes `Top`/`Bottom`
//! anchored inserts a single `insert_before` each.

use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlCollection, HtmlDivElement, HtmlElement, HtmlTableElement,
    HtmlTableRowElement, HtmlTableSectionElement,
};

use super::{HeaderCell, RenderSurface, RowAnchor, TextMetrics};
use crate::error::{GridError, Result};
use crate::layout::Spacers;
use crate::types::SortDirection;

pub struct DomSurface {
    document: Document,
    container: HtmlDivElement,
    table: HtmlTableElement,
    header_row: HtmlTableRowElement,
    body: HtmlTableSectionElement,
    top_spacer: HtmlTableRowElement,
    bottom_spacer: HtmlTableRowElement,
    /// Hidden span used to measure label text
    probe: HtmlElement,
    rows: usize,
    /// Header widths as last rendered, in display order
    widths: Vec<u32>,
}

fn create<T: JsCast>(document: &Document, tag: &str) -> Result<T> {
    document
        .create_element(tag)?
        .dyn_into::<T>()
        .map_err(|_| GridError::Surface(format!("<{tag}> has an unexpected type")))
}

fn html_item(collection: &HtmlCollection, index: usize) -> Result<HtmlElement> {
    u32::try_from(index)
        .ok()
        .and_then(|i| collection.item(i))
        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        .ok_or_else(|| GridError::Surface(format!("no element at index {index}")))
}

fn px(value: impl std::fmt::Display) -> String {
    format!("{value}px")
}

impl DomSurface {
    /// Create the table inside `parent` with a viewport of `height` pixels.
    pub fn new(parent: &Element, height: u32) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| GridError::Surface("no document".into()))?;

        let container: HtmlDivElement = create(&document, "div")?;
        container.set_class_name("atable");
        let style = container.style();
        style.set_property("height", &px(height))?;
        style.set_property("overflow", "auto")?;
        style.set_property("position", "relative")?;

        let table: HtmlTableElement = create(&document, "table")?;
        table.style().set_property("table-layout", "fixed")?;
        table.style().set_property("border-collapse", "collapse")?;

        let head: HtmlTableSectionElement = create(&document, "thead")?;
        let header_row: HtmlTableRowElement = create(&document, "tr")?;
        head.append_child(&header_row)?;

        let body: HtmlTableSectionElement = create(&document, "tbody")?;
        let top_spacer: HtmlTableRowElement = create(&document, "tr")?;
        let bottom_spacer: HtmlTableRowElement = create(&document, "tr")?;
        for spacer in [&top_spacer, &bottom_spacer] {
            spacer.set_class_name("atable-spacer");
            spacer.style().set_property("height", "0px")?;
            body.append_child(spacer)?;
        }

        let probe: HtmlElement = create(&document, "span")?;
        probe.style().set_property("visibility", "hidden")?;
        probe.style().set_property("position", "absolute")?;
        probe.style().set_property("white-space", "nowrap")?;

        table.append_child(&head)?;
        table.append_child(&body)?;
        container.append_child(&table)?;
        container.append_child(&probe)?;
        parent.append_child(&container)?;

        Ok(Self {
            document,
            container,
            table,
            header_row,
            body,
            top_spacer,
            bottom_spacer,
            probe,
            rows: 0,
            widths: Vec::new(),
        })
    }

    /// Element that receives scroll events.
    pub fn scroll_element(&self) -> &HtmlDivElement {
        &self.container
    }

    /// Element that receives header clicks.
    pub fn header_element(&self) -> &HtmlTableRowElement {
        &self.header_row
    }

    /// Remove the table from the page.
    pub fn detach(&self) {
        self.container.remove();
    }

    fn data_row(&self, slot: usize) -> Result<HtmlElement> {
        // Row 0 of the body is the top spacer
        html_item(&self.body.rows(), slot + 1)
    }

    fn set_table_width(&self) -> Result<()> {
        let total: u64 = self.widths.iter().map(|w| u64::from(*w)).sum();
        self.table.style().set_property("width", &px(total))?;
        Ok(())
    }

    fn set_spacer_span(&self) -> Result<()> {
        let span = u32::try_from(self.widths.len().max(1)).unwrap_or(u32::MAX);
        for spacer in [&self.top_spacer, &self.bottom_spacer] {
            spacer.set_inner_html("");
            let cell: web_sys::HtmlTableCellElement = create(&self.document, "td")?;
            cell.set_col_span(span);
            spacer.append_child(&cell)?;
        }
        Ok(())
    }
}

impl TextMetrics for DomSurface {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn text_width(&self, text: &str) -> u32 {
        self.probe.set_text_content(Some(text));
        let width = self.probe.get_bounding_client_rect().width();
        width.ceil().max(0.0) as u32
    }
}

impl RenderSurface for DomSurface {
    fn render_header(&mut self, cells: &[HeaderCell]) -> Result<()> {
        self.header_row.set_inner_html("");
        for cell in cells {
            let th: HtmlElement = create(&self.document, "th")?;
            th.set_text_content(Some(&cell.label));
            th.set_attribute("data-column", &cell.name)?;
            let style = th.style();
            style.set_property("width", &px(cell.width))?;
            style.set_property("position", "sticky")?;
            style.set_property("top", "0")?;
            let class = match cell.sort {
                Some(SortDirection::Ascending) => "atable-sort-asc",
                Some(SortDirection::Descending) => "atable-sort-desc",
                None => "",
            };
            th.set_class_name(class);
            self.header_row.append_child(&th)?;
        }
        self.widths = cells.iter().map(|c| c.width).collect();
        self.set_table_width()?;
        self.set_spacer_span()
    }

    fn insert_row(&mut self, anchor: RowAnchor, row: usize, cells: &[&str]) -> Result<()> {
        let tr: HtmlTableRowElement = create(&self.document, "tr")?;
        tr.set_attribute("data-row", &row.to_string())?;
        for text in cells {
            let td: HtmlElement = create(&self.document, "td")?;
            td.set_text_content(Some(text));
            tr.append_child(&td)?;
        }
        let before = match anchor {
            RowAnchor::Top => self.top_spacer.next_sibling(),
            RowAnchor::Bottom => Some(self.bottom_spacer.clone().into()),
        };
        self.body.insert_before(&tr, before.as_ref())?;
        self.rows += 1;
        Ok(())
    }

    fn remove_row(&mut self, anchor: RowAnchor) -> Result<()> {
        if self.rows == 0 {
            return Err(GridError::Surface("no materialized row to remove".into()));
        }
        let target = match anchor {
            RowAnchor::Top => self.top_spacer.next_element_sibling(),
            RowAnchor::Bottom => self.bottom_spacer.previous_element_sibling(),
        };
        if let Some(row) = target {
            row.remove();
            self.rows -= 1;
        }
        Ok(())
    }

    fn clear_rows(&mut self) -> Result<()> {
        let bottom: &web_sys::Node = &self.bottom_spacer;
        while let Some(row) = self.top_spacer.next_element_sibling() {
            if row.is_same_node(Some(bottom)) {
                break;
            }
            row.remove();
        }
        self.rows = 0;
        Ok(())
    }

    fn set_cell_text(&mut self, slot: usize, column: usize, text: &str) -> Result<()> {
        let row = self
            .data_row(slot)?
            .dyn_into::<HtmlTableRowElement>()
            .map_err(|_| GridError::Surface(format!("row {slot} is not a table row")))?;
        html_item(&row.cells(), column)?.set_text_content(Some(text));
        Ok(())
    }

    fn set_spacers(&mut self, spacers: Spacers) -> Result<()> {
        self.top_spacer
            .style()
            .set_property("height", &px(spacers.top))?;
        self.bottom_spacer
            .style()
            .set_property("height", &px(spacers.bottom))?;
        Ok(())
    }

    fn set_column_width(&mut self, column: usize, width: u32) -> Result<()> {
        let th = html_item(&self.header_row.cells(), column)?;
        let len = self.widths.len();
        let slot = self
            .widths
            .get_mut(column)
            .ok_or(GridError::IndexOutOfRange { index: column, len })?;
        *slot = width;
        th.style().set_property("width", &px(width))?;
        self.set_table_width()
    }

    fn measure_row_height(&self) -> Option<u32> {
        if self.rows == 0 {
            return None;
        }
        let height = self
            .top_spacer
            .next_element_sibling()?
            .dyn_into::<HtmlElement>()
            .ok()?
            .offset_height();
        u32::try_from(height).ok().filter(|h| *h > 0)
    }

    fn scroll_top(&self) -> u32 {
        u32::try_from(self.container.scroll_top()).unwrap_or(0)
    }

    fn set_scroll_top(&mut self, scroll_top: u32) -> Result<()> {
        self.container
            .set_scroll_top(i32::try_from(scroll_top).unwrap_or(i32::MAX));
        Ok(())
    }

    fn materialized_len(&self) -> usize {
        self.rows
    }
}
