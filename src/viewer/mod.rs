//! `ATable` - the WASM-exported grid.
//!
//! Wires a [`DomSurface`] and a JS fetch function to a [`GridController`]:
//! - scroll events on the container drive the row window
//! - header clicks sort, header drags on a resize handle resize
//! - every controller operation is exposed as a JS method
//!
//! Event handlers are registered when the table is created and removed by
//! `destroy()`.

mod convert;
mod source;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, MouseEvent};

use crate::error::GridError;
use crate::grid::{GridConfig, GridController};
use crate::layout::HeaderHit;
use crate::render::DomSurface;
use crate::types::{ColumnSpec, FilterOutcome, SortDirection};
use convert::{cell_from_js, rows_from_js, sort_indicator_to_js};
use source::JsDataSource;

pub(crate) type Grid = GridController<DomSurface, JsDataSource>;

/// An in-progress header resize drag.
#[derive(Debug, Clone)]
struct ResizeDrag {
    column: String,
    start_x: i32,
    start_width: u32,
}

/// Pointer state shared by the header handlers.
#[derive(Debug, Default)]
struct PointerState {
    drag: Option<ResizeDrag>,
    /// Swallow the click that ends a drag
    suppress_click: bool,
}

type Listener = (web_sys::EventTarget, &'static str, Closure<dyn FnMut(Event)>);

#[wasm_bindgen]
pub struct ATable {
    state: Rc<RefCell<Grid>>,
    listeners: Vec<Listener>,
}

/// Header x offset of a mouse event, including horizontal scroll.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn header_x(grid: &Grid, event: &MouseEvent) -> u64 {
    let surface = grid.surface();
    let rect = surface.header_element().get_bounding_client_rect();
    let x = f64::from(event.client_x()) - rect.left();
    x.max(0.0) as u64
}

fn log_error(action: &str, result: Result<(), GridError>) {
    if let Err(e) = result {
        tracing::warn!(action, error = %e, "grid event failed");
    }
}

fn listen(
    target: &web_sys::EventTarget,
    event: &'static str,
    handler: impl FnMut(Event) + 'static,
) -> Result<Listener, JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    Ok((target.clone(), event, closure))
}

impl ATable {
    fn register_listeners(&mut self) -> Result<(), JsValue> {
        let pointer = Rc::new(RefCell::new(PointerState::default()));
        let (scroll_target, header_target): (web_sys::EventTarget, web_sys::EventTarget) = {
            let grid = self.state.borrow();
            (
                grid.surface().scroll_element().clone().into(),
                grid.surface().header_element().clone().into(),
            )
        };
        let document: web_sys::EventTarget = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?
            .into();

        // Scroll
        {
            let state = Rc::clone(&self.state);
            self.listeners.push(listen(&scroll_target, "scroll", move |_| {
                log_error("scroll", state.borrow_mut().on_scroll());
            })?);
        }

        // Mouse down on a resize handle starts a drag
        {
            let state = Rc::clone(&self.state);
            let pointer = Rc::clone(&pointer);
            self.listeners
                .push(listen(&header_target, "mousedown", move |event: Event| {
                    let Some(event) = event.dyn_ref::<MouseEvent>() else {
                        return;
                    };
                    let grid = state.borrow();
                    let HeaderHit::Resize(order) = grid.header_layout().hit(header_x(&grid, event))
                    else {
                        return;
                    };
                    if let Some(column) = grid.columns().at(order).filter(|c| c.resizable) {
                        event.prevent_default();
                        pointer.borrow_mut().drag = Some(ResizeDrag {
                            column: column.name.clone(),
                            start_x: event.client_x(),
                            start_width: column.width,
                        });
                    }
                })?);
        }

        // Mouse move resizes while dragging
        {
            let state = Rc::clone(&self.state);
            let pointer = Rc::clone(&pointer);
            self.listeners
                .push(listen(&document, "mousemove", move |event: Event| {
                    let Some(event) = event.dyn_ref::<MouseEvent>() else {
                        return;
                    };
                    let Some(drag) = pointer.borrow().drag.clone() else {
                        return;
                    };
                    let delta = i64::from(event.client_x()) - i64::from(drag.start_x);
                    let width = (i64::from(drag.start_width) + delta).max(0);
                    let width = u32::try_from(width).unwrap_or(u32::MAX);
                    let result = state.borrow_mut().resize_column(&drag.column, width);
                    log_error("resize", result.map(|_| ()));
                })?);
        }

        // Mouse up ends a drag
        {
            let pointer = Rc::clone(&pointer);
            self.listeners
                .push(listen(&document, "mouseup", move |_| {
                    let mut p = pointer.borrow_mut();
                    if p.drag.take().is_some() {
                        p.suppress_click = true;
                    }
                })?);
        }

        // Click sorts
        {
            let state = Rc::clone(&self.state);
            self.listeners
                .push(listen(&header_target, "click", move |event: Event| {
                    if std::mem::take(&mut pointer.borrow_mut().suppress_click) {
                        return;
                    }
                    let Some(event) = event.dyn_ref::<MouseEvent>() else {
                        return;
                    };
                    let mut grid = state.borrow_mut();
                    let x = header_x(&grid, event);
                    log_error("header click", grid.click_header(x).map(|_| ()));
                })?);
        }
        Ok(())
    }
}

#[wasm_bindgen]
impl ATable {
    /// Create a table inside `parent`.
    ///
    /// `options` is a grid config object (`columns`, `height`, ...) and
    /// `fetch_data` a function returning rows or a Promise of rows.
    #[wasm_bindgen(constructor)]
    pub fn new(parent: Element, options: JsValue, fetch_data: JsValue) -> Result<ATable, JsValue> {
        console_error_panic_hook::set_once();

        let config: GridConfig = serde_wasm_bindgen::from_value(options)
            .map_err(|e| GridError::Config(e.to_string()))?;
        config.validate()?;
        let fetch = fetch_data.dyn_into::<Function>().map_err(|_| {
            GridError::Config("missing fetchData function".into())
        })?;

        let surface = DomSurface::new(&parent, config.height)?;
        let grid = GridController::new(config, surface, JsDataSource::new(fetch))?;
        let state = Rc::new(RefCell::new(grid));
        state.borrow_mut().source_mut().grid = Rc::downgrade(&state);

        let mut table = ATable {
            state,
            listeners: Vec::new(),
        };
        table.register_listeners()?;
        Ok(table)
    }

    /// Render pending changes; the first call requests data.
    ///
    /// With a callback, fully re-render and call it afterwards.
    pub fn render(&self, callback: Option<Function>) -> Result<(), JsValue> {
        let mut grid = self.state.borrow_mut();
        match callback {
            Some(callback) => grid.render_with(move || {
                // Run after the current borrow is released
                spawn_local(async move {
                    let _ = callback.call0(&JsValue::NULL);
                });
            })?,
            None => grid.render()?,
        }
        Ok(())
    }

    /// Sort by a column; omit `descending` to toggle.
    pub fn sort(&self, column: &str, descending: Option<bool>) -> Result<(), JsValue> {
        let direction = descending.map(SortDirection::from_descending);
        Ok(self.state.borrow_mut().sort(column, direction)?)
    }

    /// Returns `{ column, descending }` or `null`.
    #[wasm_bindgen(js_name = "sortIndicator")]
    pub fn sort_indicator(&self) -> Result<JsValue, JsValue> {
        Ok(sort_indicator_to_js(self.state.borrow().sort_indicator())?)
    }

    /// Returns whether row visibility changed.
    pub fn filter(
        &self,
        column: &str,
        text: &str,
        case_sensitive: Option<bool>,
    ) -> Result<bool, JsValue> {
        let outcome = self.state.borrow_mut().filter(
            column,
            text,
            case_sensitive.unwrap_or(false),
        )?;
        Ok(outcome == FilterOutcome::Changed)
    }

    #[wasm_bindgen(js_name = "clearFilter")]
    pub fn clear_filter(&self) -> Result<bool, JsValue> {
        let outcome = self.state.borrow_mut().clear_filter()?;
        Ok(outcome == FilterOutcome::Changed)
    }

    #[wasm_bindgen(js_name = "moveColumn")]
    pub fn move_column(&self, column: &str, dest: usize) -> Result<(), JsValue> {
        Ok(self.state.borrow_mut().move_column(column, dest)?)
    }

    /// Drop handler for header drag-and-drop.
    #[wasm_bindgen(js_name = "dropColumn")]
    pub fn drop_column(&self, src: usize, dest: usize) -> Result<(), JsValue> {
        Ok(self.state.borrow_mut().drop_column(src, dest)?)
    }

    /// Returns the applied width.
    #[wasm_bindgen(js_name = "resizeColumn")]
    pub fn resize_column(&self, column: &str, width: u32) -> Result<u32, JsValue> {
        Ok(self.state.borrow_mut().resize_column(column, width)?)
    }

    #[wasm_bindgen(js_name = "showColumn")]
    pub fn show_column(&self, column: &str) -> Result<(), JsValue> {
        Ok(self.state.borrow_mut().show_column(column)?)
    }

    #[wasm_bindgen(js_name = "hideColumn")]
    pub fn hide_column(&self, column: &str) -> Result<(), JsValue> {
        Ok(self.state.borrow_mut().hide_column(column)?)
    }

    #[wasm_bindgen(js_name = "renameColumn")]
    pub fn rename_column(&self, column: &str, label: &str) -> Result<(), JsValue> {
        Ok(self.state.borrow_mut().rename_column(column, label)?)
    }

    /// Add a column from a spec object, before `position` or at the end.
    #[wasm_bindgen(js_name = "addColumn")]
    pub fn add_column(&self, spec: JsValue, position: Option<usize>) -> Result<usize, JsValue> {
        let spec: ColumnSpec = serde_wasm_bindgen::from_value(spec)
            .map_err(|e| GridError::Config(e.to_string()))?;
        Ok(self.state.borrow_mut().add_column(spec, position)?)
    }

    #[wasm_bindgen(js_name = "removeColumn")]
    pub fn remove_column(&self, column: &str) -> Result<(), JsValue> {
        self.state.borrow_mut().remove_column(column)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = "setValue")]
    pub fn set_value(&self, row: usize, column: &str, value: JsValue) -> Result<(), JsValue> {
        Ok(self
            .state
            .borrow_mut()
            .set_value(row, column, cell_from_js(&value))?)
    }

    /// Cells of a visible row in display order.
    #[wasm_bindgen(js_name = "rowValues")]
    pub fn row_values(&self, row: usize) -> Result<JsValue, JsValue> {
        let grid = self.state.borrow();
        let values = grid.row_values(row)?;
        serde_wasm_bindgen::to_value(&values)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
    }

    /// Replace every row.
    #[wasm_bindgen(js_name = "setRows")]
    pub fn set_rows(&self, rows: JsValue) -> Result<usize, JsValue> {
        let rows = rows_from_js(&rows)?;
        Ok(self.state.borrow_mut().reset(rows)?)
    }

    #[wasm_bindgen(js_name = "appendRows")]
    pub fn append_rows(&self, rows: JsValue) -> Result<usize, JsValue> {
        let rows = rows_from_js(&rows)?;
        Ok(self.state.borrow_mut().append(rows)?)
    }

    /// Fetch data again; responses to earlier requests are ignored.
    pub fn reload(&self) {
        self.state.borrow_mut().reload();
    }

    #[wasm_bindgen(js_name = "visibleCount")]
    pub fn visible_count(&self) -> usize {
        self.state.borrow().visible_count()
    }

    #[wasm_bindgen(js_name = "scrollTo")]
    pub fn scroll_to(&self, scroll_top: u32) -> Result<(), JsValue> {
        Ok(self.state.borrow_mut().scroll_to(scroll_top)?)
    }

    /// Remove listeners and the table element.
    pub fn destroy(&mut self) {
        for (target, event, closure) in self.listeners.drain(..) {
            let _ = target
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
        self.state.borrow().surface().detach();
    }
}
