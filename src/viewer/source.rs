//! JS fetch function as a data source.
//!
//! The function is called with no arguments and may return rows directly or
//! a Promise of them. Either way the result is delivered on a later
//! microtask, after the controller borrow that issued the request is released.

use std::cell::RefCell;
use std::rc::Weak;

use js_sys::{Function, Promise};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};

use super::convert::delivery_from_js;
use super::Grid;
use crate::grid::{DataSource, FetchTicket};

pub struct JsDataSource {
    fetch: Function,
    /// Set once the grid is placed in its shared cell
    pub(crate) grid: Weak<RefCell<Grid>>,
}

impl JsDataSource {
    pub fn new(fetch: Function) -> Self {
        Self {
            fetch,
            grid: Weak::new(),
        }
    }
}

async fn fetch_rows(fetch: Function) -> Result<JsValue, JsValue> {
    let result = fetch.call0(&JsValue::NULL)?;
    match result.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(value) => Ok(value),
    }
}

impl DataSource for JsDataSource {
    fn request(&mut self, ticket: FetchTicket) {
        let fetch = self.fetch.clone();
        let grid = Weak::clone(&self.grid);
        spawn_local(async move {
            let value = match fetch_rows(fetch).await {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(epoch = ticket.epoch, error = ?e, "fetchData failed");
                    return;
                }
            };
            let Some(grid) = grid.upgrade() else {
                return;
            };
            let delivered = delivery_from_js(&value)
                .and_then(|(rows, append)| grid.borrow_mut().receive(ticket, rows, append));
            if let Err(e) = delivered {
                tracing::warn!(epoch = ticket.epoch, error = %e, "delivery failed");
            }
        });
    }
}
