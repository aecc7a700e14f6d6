//! JS configuration objects to export requests.

use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, NaiveDateTime};
use exportkit_xlsx::{
    BoxError, CellStyleFn, EnumRecordValue, SpecCellStyle, SpecExportRequest, SpecRowRecord,
};
use js_sys::{Date, Function, Reflect};
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::{JsCast, JsValue};

use crate::browser::derive_js_error_text;

/// Convert a value to a plain JS value (objects, not `Map`s).
pub(crate) fn convert_to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, String> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|err| err.to_string())
}

fn derive_box_error(msg: String) -> BoxError {
    msg.into()
}

fn get_property(target: &JsValue, key: &str) -> Result<JsValue, String> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(|err| derive_js_error_text(&err))
}

fn get_index(target: &JsValue, idx: usize) -> Result<JsValue, String> {
    Reflect::get_u32(target, idx as u32).map_err(|err| derive_js_error_text(&err))
}

/// Record value of a JS `Date`, read as UTC. An invalid date becomes its
/// `toString()` text.
pub fn derive_record_value_from_js_date(date: &Date) -> EnumRecordValue {
    let n_millis = date.get_time();
    if n_millis.is_finite() {
        if let Some(dt) = DateTime::from_timestamp_millis(n_millis as i64) {
            return EnumRecordValue::Date(dt.naive_utc());
        }
    }
    EnumRecordValue::String(String::from(date.to_string()))
}

fn convert_datetime_to_js_date(dt: &NaiveDateTime) -> JsValue {
    Date::new(&JsValue::from_f64(dt.and_utc().timestamp_millis() as f64)).into()
}

/// Replace values that came from JS `Date` objects inside `dict_values`.
///
/// serde sees a `Date` as an object without entries, so it arrives as an
/// empty map; the JS source at the same path tells them apart.
fn patch_js_dates(
    js_source: &JsValue,
    dict_values: &mut BTreeMap<String, EnumRecordValue>,
) -> Result<(), String> {
    for (key, value) in dict_values.iter_mut() {
        if matches!(value, EnumRecordValue::List(_) | EnumRecordValue::Map(_)) {
            patch_js_dates_in_value(&get_property(js_source, key)?, value)?;
        }
    }
    Ok(())
}

fn patch_js_dates_in_value(js_source: &JsValue, value: &mut EnumRecordValue) -> Result<(), String> {
    if let Some(date) = js_source.dyn_ref::<Date>() {
        *value = derive_record_value_from_js_date(date);
        return Ok(());
    }
    match value {
        EnumRecordValue::Map(dict_values) => patch_js_dates(js_source, dict_values),
        EnumRecordValue::List(l_values) => {
            for (idx, item) in l_values.iter_mut().enumerate() {
                if matches!(item, EnumRecordValue::List(_) | EnumRecordValue::Map(_)) {
                    patch_js_dates_in_value(&get_index(js_source, idx)?, item)?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Wrap a JS `style(value, record)` function as a cell style callback.
///
/// `undefined`/`null` results mean "no change".
pub fn derive_cell_style_fn(func: Function) -> CellStyleFn {
    Rc::new(
        move |value: Option<&EnumRecordValue>,
              record: &SpecRowRecord|
              -> Result<SpecCellStyle, BoxError> {
            let js_value = match value {
                Some(EnumRecordValue::Date(dt)) => convert_datetime_to_js_date(dt),
                Some(val) => convert_to_js_value(val).map_err(derive_box_error)?,
                None => JsValue::UNDEFINED,
            };
            let js_record = convert_to_js_value(record).map_err(derive_box_error)?;

            let js_style = func
                .call2(&JsValue::NULL, &js_value, &js_record)
                .map_err(|err| derive_box_error(derive_js_error_text(&err)))?;
            if js_style.is_undefined() || js_style.is_null() {
                return Ok(SpecCellStyle::default());
            }
            serde_wasm_bindgen::from_value(js_style)
                .map_err(|err| derive_box_error(err.to_string()))
        },
    )
}

/// Parse a JS export configuration.
///
/// Plain data goes through serde; `sheets[i].columns[j].style` functions and
/// `Date` values in `sheets[i].data` are picked up separately.
pub fn parse_export_request(config: &JsValue) -> Result<SpecExportRequest, String> {
    let mut request: SpecExportRequest =
        serde_wasm_bindgen::from_value(config.clone()).map_err(|err| err.to_string())?;

    let js_sheets = get_property(config, "sheets")?;
    for (idx_sheet, sheet) in request.sheets.iter_mut().enumerate() {
        let js_sheet = get_index(&js_sheets, idx_sheet)?;
        if let Some(l_rows) = sheet.rows.as_mut() {
            let js_rows = get_property(&js_sheet, "data")?;
            for (idx_row, record) in l_rows.iter_mut().enumerate() {
                patch_js_dates(&get_index(&js_rows, idx_row)?, record)?;
            }
        }

        let js_columns = get_property(&js_sheet, "columns")?;
        for (idx_col, column) in sheet.columns.iter_mut().enumerate() {
            let js_style = get_property(&get_index(&js_columns, idx_col)?, "style")?;
            if let Some(func) = js_style.dyn_ref::<Function>() {
                column.cell_style_fn = Some(derive_cell_style_fn(func.clone()));
            }
        }
    }

    Ok(request)
}
