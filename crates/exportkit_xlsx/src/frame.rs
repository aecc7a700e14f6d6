//! Polars `DataFrame` as a sheet source.

use std::collections::BTreeSet;
use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::error::ExportError;
use crate::spec::{EnumRecordValue, SpecColumn, SpecRowRecord, SpecSheet};

/// Read a DataFrame from Polars IPC bytes.
pub fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, ExportError> {
    Ok(IpcReader::new(Cursor::new(v_ipc_df)).finish()?)
}

/// Record keys for the frame's columns, in order.
///
/// Dots become `_` so the path lookup treats each key as a single segment.
/// A key already taken gets a `__N` suffix (`a.b` and `a_b` give `a_b` and
/// `a_b__2`).
pub fn derive_keys_from_dataframe(df: &DataFrame) -> Vec<String> {
    let mut set_keys = BTreeSet::new();
    df.get_column_names_str()
        .into_iter()
        .map(|name| {
            let c_key = name.replace('.', "_");
            if set_keys.insert(c_key.clone()) {
                return c_key;
            }
            let mut n_idx = 2usize;
            loop {
                let candidate = format!("{c_key}__{n_idx}");
                if set_keys.insert(candidate.clone()) {
                    return candidate;
                }
                n_idx += 1;
            }
        })
        .collect()
}

/// One column per frame column: label is the column name, key comes from
/// [`derive_keys_from_dataframe`].
pub fn derive_columns_from_dataframe(df: &DataFrame) -> Vec<SpecColumn> {
    df.get_column_names_str()
        .into_iter()
        .zip(derive_keys_from_dataframe(df))
        .map(|(name, key)| SpecColumn::new(name, key))
        .collect()
}

/// One record per frame row, keyed like [`derive_columns_from_dataframe`].
pub fn derive_rows_from_dataframe(df: &DataFrame) -> Result<Vec<SpecRowRecord>, ExportError> {
    let l_keys = derive_keys_from_dataframe(df);
    let l_cols = df.get_columns();

    let mut l_rows = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut record = SpecRowRecord::new();
        for (key, col) in l_keys.iter().zip(l_cols) {
            let value = col.get(n_idx_row)?;
            record.insert(key.clone(), derive_record_value_from_any_value(value));
        }
        l_rows.push(record);
    }
    Ok(l_rows)
}

/// Sheet named `sheet_name` holding every column and row of `df`.
pub fn derive_sheet_from_dataframe(
    df: &DataFrame,
    sheet_name: &str,
) -> Result<SpecSheet, ExportError> {
    Ok(SpecSheet::new(
        sheet_name,
        derive_columns_from_dataframe(df),
        derive_rows_from_dataframe(df)?,
    ))
}

fn derive_record_value_from_any_value(value: AnyValue<'_>) -> EnumRecordValue {
    match value {
        AnyValue::Null => EnumRecordValue::Null,
        AnyValue::Boolean(val) => EnumRecordValue::Bool(val),
        AnyValue::String(val) => EnumRecordValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumRecordValue::String(val.to_string()),
        AnyValue::UInt8(val) => EnumRecordValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumRecordValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumRecordValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int8(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int16(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int32(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int64(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Int128(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Float32(val) => EnumRecordValue::Number(val as f64),
        AnyValue::Float64(val) => EnumRecordValue::Number(val),
        _ => EnumRecordValue::String(value.to_string()),
    }
}
