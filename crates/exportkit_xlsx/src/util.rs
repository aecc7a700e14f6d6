//! Stateless helper utilities used by the sheet builder and the xlsx writer.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};

use crate::conf::{C_SHEET_NAME_DEFAULT, N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::{EnumRecordValue, SpecRowRecord};

////////////////////////////////////////////////////////////////////////////////
// #region RecordLookup

/// Resolve a dotted path (`address.city`) inside a row record.
///
/// Returns `None` as soon as a segment is missing or the current value cannot
/// be stepped into. Numeric segments index into lists.
pub fn derive_value_at_path<'a>(
    record: &'a SpecRowRecord,
    path: &str,
) -> Option<&'a EnumRecordValue> {
    let mut l_segments = path.split('.');
    let mut value = record.get(l_segments.next()?)?;

    for c_segment in l_segments {
        value = match value {
            EnumRecordValue::Map(dict_values) => dict_values.get(c_segment)?,
            EnumRecordValue::List(l_values) => l_values.get(c_segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(value)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Return the text written for `NaN`/`Inf`; `None` for finite values.
pub fn convert_nan_inf_to_str(x: f64) -> Option<&'static str> {
    if x.is_nan() {
        return Some("NaN");
    }
    if x.is_infinite() {
        return Some(if x.is_sign_positive() {
            "Infinity"
        } else {
            "-Infinity"
        });
    }
    None
}

/// Stringify a value the way it is measured for column width.
///
/// Nested lists/maps render as JSON text, which is also what gets written.
pub fn derive_display_text(value: &EnumRecordValue) -> String {
    match value {
        EnumRecordValue::Null => String::new(),
        EnumRecordValue::Bool(val) => val.to_string(),
        EnumRecordValue::Number(n) => match convert_nan_inf_to_str(*n) {
            Some(txt) => txt.to_string(),
            None => derive_number_text(*n),
        },
        EnumRecordValue::String(s) => s.clone(),
        EnumRecordValue::Date(dt) => dt.to_string(),
        EnumRecordValue::List(_) | EnumRecordValue::Map(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
    }
}

/// Shortest text of a finite number, JS style: exponent form (`1e+21`,
/// `1.5e-7`) outside `[1e-6, 1e21)`, plain digits inside, `0` for `-0`.
pub fn derive_number_text(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&n.abs()) {
        return n.to_string();
    }
    let c_exp = format!("{n:e}");
    if c_exp.contains("e-") {
        c_exp
    } else {
        c_exp.replacen('e', "e+", 1)
    }
}

/// Text length in characters.
pub fn derive_text_len(s: &str) -> usize {
    s.chars().count()
}

/// Convert a date-time to an Excel serial date (1900 date system).
///
/// Dates before 1900-03-01 fall inside Excel's phantom leap day and are not
/// representable; they return `None`.
pub fn derive_excel_serial_from_datetime(dt: &NaiveDateTime) -> Option<f64> {
    let dt_first_valid = NaiveDate::from_ymd_opt(1900, 3, 1)?.and_hms_opt(0, 0, 0)?;
    if *dt < dt_first_valid {
        return None;
    }
    let dt_epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let n_millis = dt.signed_duration_since(dt_epoch).num_milliseconds();
    Some(n_millis as f64 / 86_400_000.0)
}

/// Parse `AARRGGBB`, `RRGGBB` or `#RRGGBB` into a 24-bit RGB value.
pub fn parse_argb_color(argb: &str) -> Option<u32> {
    let c_hex = argb.trim().trim_start_matches('#');
    if !c_hex.chars().all(|chr| chr.is_ascii_hexdigit()) {
        return None;
    }
    let c_rgb = match c_hex.len() {
        8 => &c_hex[2..],
        6 => c_hex,
        _ => return None,
    };
    u32::from_str_radix(c_rgb, 16).ok()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_DEFAULT.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Return `name`, or `name__2`, `name__3`, ... when already taken.
///
/// Excel compares sheet names case-insensitively; so does this.
pub fn derive_unique_sheet_name(name: &str, set_names_existing: &mut BTreeSet<String>) -> String {
    if set_names_existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let mut n_idx = 2usize;
    loop {
        // Suffix is never truncated; the base shrinks to make room.
        let c_suffix = format!("__{n_idx}");
        let n_len_base = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_suffix.len());
        let base_name: String = name.chars().take(n_len_base).collect();
        let candidate = format!("{base_name}{c_suffix}");
        if set_names_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
