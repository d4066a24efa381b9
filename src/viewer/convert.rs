//! Conversions between JS values and grid types.

use js_sys::{Array, Date, Reflect};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};

use crate::error::{GridError, Result};
use crate::types::{CellValue, SortDirection, Timestamp};

/// Convert one JS cell value.
///
/// `Date` objects become timestamps, numbers and strings map directly,
/// `null`/`undefined` are empty and anything else is stringified.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn cell_from_js(value: &JsValue) -> CellValue {
    if value.is_null() || value.is_undefined() {
        return CellValue::Empty;
    }
    if let Some(date) = value.dyn_ref::<Date>() {
        let millis = date.get_time();
        if millis.is_nan() {
            return CellValue::Empty;
        }
        return CellValue::Date(Timestamp::from_millis(millis as i64));
    }
    if let Some(n) = value.as_f64() {
        return CellValue::Number(n);
    }
    if let Some(s) = value.as_string() {
        return CellValue::Text(s);
    }
    if let Some(b) = value.as_bool() {
        return CellValue::Text(b.to_string());
    }
    let text = js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_default();
    CellValue::Text(text)
}

/// Convert an array of row arrays.
pub(crate) fn rows_from_js(value: &JsValue) -> Result<Vec<Vec<CellValue>>> {
    let rows = value
        .dyn_ref::<Array>()
        .ok_or_else(|| GridError::InvalidData("expected an array of rows".into()))?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            row.dyn_ref::<Array>()
                .map(|cells| cells.iter().map(|c| cell_from_js(&c)).collect())
                .ok_or_else(|| GridError::InvalidData(format!("row {i} is not an array")))
        })
        .collect()
}

/// A fetch result: either a bare rows array (replace) or `{ rows, append }`.
pub(crate) fn delivery_from_js(value: &JsValue) -> Result<(Vec<Vec<CellValue>>, bool)> {
    if Array::is_array(value) {
        return Ok((rows_from_js(value)?, false));
    }
    let rows = Reflect::get(value, &JsValue::from_str("rows"))?;
    let append = Reflect::get(value, &JsValue::from_str("append"))?
        .as_bool()
        .unwrap_or(false);
    Ok((rows_from_js(&rows)?, append))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SortIndicator<'a> {
    column: &'a str,
    descending: bool,
}

pub(crate) fn sort_indicator_to_js(indicator: Option<(&str, SortDirection)>) -> Result<JsValue> {
    let Some((column, direction)) = indicator else {
        return Ok(JsValue::NULL);
    };
    let value = SortIndicator {
        column,
        descending: direction.is_descending(),
    };
    serde_wasm_bindgen::to_value(&value).map_err(|e| GridError::InvalidData(e.to_string()))
}
