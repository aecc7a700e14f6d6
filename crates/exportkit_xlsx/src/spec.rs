//! Shared export specification models.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::conf::{
    C_FMT_DATE_DEFAULT, C_MSG_EXPORT_FAILURE, N_WIDTH_DECLARED_MIN, N_WIDTH_HEADER_FALLBACK,
    N_WIDTH_PADDING,
};

/// Error type returned by caller-supplied cell style functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Per-cell style callback: `(resolved value, row record) -> partial style`.
///
/// The callback must be pure. Returned fields overwrite the cell's current
/// style field-by-field; fields left as `None` are untouched.
pub type CellStyleFn =
    Rc<dyn Fn(Option<&EnumRecordValue>, &SpecRowRecord) -> Result<SpecCellStyle, BoxError>>;

/// One input row: field name -> value.
pub type SpecRowRecord = BTreeMap<String, EnumRecordValue>;

////////////////////////////////////////////////////////////////////////////////
// #region RecordValue

/// Structured value held by a row record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumRecordValue {
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    String(String),
    /// Date-time value, written as an Excel serial date.
    Date(NaiveDateTime),
    /// Ordered sequence; reachable by numeric path segments.
    List(Vec<EnumRecordValue>),
    /// Nested mapping; reachable by named path segments.
    Map(BTreeMap<String, EnumRecordValue>),
}

impl From<bool> for EnumRecordValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for EnumRecordValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for EnumRecordValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for EnumRecordValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumRecordValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NaiveDateTime> for EnumRecordValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::Date(value)
    }
}

impl From<serde_json::Value> for EnumRecordValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(val) => Self::Bool(val),
            serde_json::Value::Number(val) => val.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(val) => Self::String(val),
            serde_json::Value::Array(l_values) => {
                Self::List(l_values.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(dict_values) => Self::Map(
                dict_values
                    .into_iter()
                    .map(|(key, val)| (key, Self::from(val)))
                    .collect(),
            ),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleSpecification

/// ARGB color, e.g. `FFEFEFEF`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecColor {
    /// Hex color; 8 digits (alpha first) or 6 digits, optional `#`.
    pub argb: String,
}

impl SpecColor {
    /// Build a color from an ARGB/RGB hex string.
    pub fn argb(value: impl Into<String>) -> Self {
        Self {
            argb: value.into(),
        }
    }
}

/// Font attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecFont {
    /// Font family name.
    pub name: Option<String>,
    /// Font size in points.
    pub size: Option<f64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Single underline.
    pub underline: Option<bool>,
    /// Strikethrough.
    pub strike: Option<bool>,
    /// Font color.
    pub color: Option<SpecColor>,
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumHorizontalAlign {
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

/// Vertical alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumVerticalAlign {
    Top,
    Middle,
    Bottom,
    Distributed,
    Justify,
}

/// Alignment attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecAlignment {
    /// Horizontal alignment.
    pub horizontal: Option<EnumHorizontalAlign>,
    /// Vertical alignment.
    pub vertical: Option<EnumVerticalAlign>,
    /// Text wrap.
    pub wrap_text: Option<bool>,
    /// Indent level.
    pub indent: Option<u8>,
}

/// Fill kind. A fill without a declared kind is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumFillType {
    Pattern,
}

/// Pattern used by a pattern fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumFillPattern {
    None,
    Solid,
    DarkGray,
    MediumGray,
    LightGray,
    Gray125,
    Gray0625,
}

/// Cell fill.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecFill {
    /// Fill kind; required for the fill to take effect.
    #[serde(rename = "type")]
    pub fill_type: Option<EnumFillType>,
    /// Fill pattern; solid when omitted.
    pub pattern: Option<EnumFillPattern>,
    /// Pattern foreground (the visible color of a solid fill).
    pub fg_color: Option<SpecColor>,
    /// Pattern background.
    pub bg_color: Option<SpecColor>,
}

impl SpecFill {
    /// Solid pattern fill with the given ARGB color.
    pub fn solid(argb: impl Into<String>) -> Self {
        Self {
            fill_type: Some(EnumFillType::Pattern),
            pattern: Some(EnumFillPattern::Solid),
            fg_color: Some(SpecColor::argb(argb)),
            bg_color: None,
        }
    }
}

/// Border line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumBorderStyle {
    Thin,
    Dotted,
    Hair,
    Medium,
    Double,
    Thick,
    Dashed,
    DashDot,
    DashDotDot,
    SlantDashDot,
    MediumDashed,
    MediumDashDot,
    MediumDashDotDot,
}

/// One border edge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecBorderEdge {
    /// Line style.
    pub style: Option<EnumBorderStyle>,
    /// Line color.
    pub color: Option<SpecColor>,
}

impl SpecBorderEdge {
    /// Edge with a style and no explicit color.
    pub fn new(style: EnumBorderStyle) -> Self {
        Self {
            style: Some(style),
            color: None,
        }
    }

    /// Edge with a style and an ARGB color.
    pub fn with_color(style: EnumBorderStyle, argb: impl Into<String>) -> Self {
        Self {
            style: Some(style),
            color: Some(SpecColor::argb(argb)),
        }
    }
}

/// Cell borders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpecBorder {
    pub top: Option<SpecBorderEdge>,
    pub left: Option<SpecBorderEdge>,
    pub bottom: Option<SpecBorderEdge>,
    pub right: Option<SpecBorderEdge>,
}

/// Header row decoration. Undefined sub-fields stay at the writer default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecHeaderStyle {
    pub font: Option<SpecFont>,
    pub alignment: Option<SpecAlignment>,
    pub fill: Option<SpecFill>,
    pub border: Option<SpecBorder>,
}

/// Partial cell style; also the resolved style of a built cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecCellStyle {
    /// Number format code.
    pub num_fmt: Option<String>,
    pub font: Option<SpecFont>,
    pub alignment: Option<SpecAlignment>,
    pub fill: Option<SpecFill>,
    pub border: Option<SpecBorder>,
}

impl SpecCellStyle {
    /// Merge two styles with right-side non-`None` overwrite semantics.
    ///
    /// Sub-records are replaced whole, not merged attribute by attribute.
    pub fn merge(&self, other: &SpecCellStyle) -> SpecCellStyle {
        SpecCellStyle {
            num_fmt: other.num_fmt.clone().or_else(|| self.num_fmt.clone()),
            font: other.font.clone().or_else(|| self.font.clone()),
            alignment: other.alignment.clone().or_else(|| self.alignment.clone()),
            fill: other.fill.clone().or_else(|| self.fill.clone()),
            border: other.border.clone().or_else(|| self.border.clone()),
        }
    }

    /// Whether no style field is set.
    pub fn is_empty(&self) -> bool {
        self.num_fmt.is_none()
            && self.font.is_none()
            && self.alignment.is_none()
            && self.fill.is_none()
            && self.border.is_none()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RequestSpecification

/// Column definition.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecColumn {
    /// Header text.
    pub label: String,
    /// Dotted path into the row record (`address.city`).
    pub key: String,
    /// Number format applied to every data cell of the column.
    #[serde(default, rename = "format", alias = "numericFormat")]
    pub num_format: Option<String>,
    /// Declared width; auto-sizing still has the final say.
    #[serde(default, rename = "width", alias = "widthOverride")]
    pub width_override: Option<u32>,
    /// Optional per-cell style callback.
    #[serde(skip)]
    pub cell_style_fn: Option<CellStyleFn>,
}

impl SpecColumn {
    /// Column with a label and a record key.
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Set the number format code.
    pub fn with_num_format(mut self, num_format: impl Into<String>) -> Self {
        self.num_format = Some(num_format.into());
        self
    }

    /// Set the declared width.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width_override = Some(width);
        self
    }

    /// Set the per-cell style callback.
    pub fn with_cell_style<F>(mut self, fn_style: F) -> Self
    where
        F: Fn(Option<&EnumRecordValue>, &SpecRowRecord) -> Result<SpecCellStyle, BoxError>
            + 'static,
    {
        self.cell_style_fn = Some(Rc::new(fn_style));
        self
    }
}

impl fmt::Debug for SpecColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecColumn")
            .field("label", &self.label)
            .field("key", &self.key)
            .field("num_format", &self.num_format)
            .field("width_override", &self.width_override)
            .field(
                "cell_style_fn",
                &self.cell_style_fn.as_ref().map(|_| "<fn>"),
            )
            .finish()
    }
}

/// One worksheet to export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecSheet {
    /// Worksheet name; `Sheet` when empty.
    #[serde(default)]
    pub name: String,
    /// Ordered column definitions; must be non-empty.
    #[serde(default)]
    pub columns: Vec<SpecColumn>,
    /// Ordered row records; must be present (may be empty).
    #[serde(default, rename = "data", alias = "rows")]
    pub rows: Option<Vec<SpecRowRecord>>,
    /// Header row decoration.
    #[serde(default)]
    pub header_style: Option<SpecHeaderStyle>,
    /// Freeze the header row and put an auto-filter over it.
    #[serde(default)]
    pub freeze_header: Option<bool>,
}

impl SpecSheet {
    /// Sheet with columns and rows, no header style, no freeze.
    pub fn new(name: impl Into<String>, columns: Vec<SpecColumn>, rows: Vec<SpecRowRecord>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Some(rows),
            header_style: None,
            freeze_header: None,
        }
    }

    /// Set the header style.
    pub fn with_header_style(mut self, header_style: SpecHeaderStyle) -> Self {
        self.header_style = Some(header_style);
        self
    }

    /// Set the freeze-header flag.
    pub fn with_freeze_header(mut self, if_freeze_header: bool) -> Self {
        self.freeze_header = Some(if_freeze_header);
        self
    }
}

/// Input of one export call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecExportRequest {
    /// Download file name, used verbatim.
    pub file_name: String,
    /// Ordered sheets; must be non-empty.
    #[serde(default)]
    pub sheets: Vec<SpecSheet>,
}

impl SpecExportRequest {
    /// Request for `file_name` with the given sheets.
    pub fn new(file_name: impl Into<String>, sheets: Vec<SpecSheet>) -> Self {
        Self {
            file_name: file_name.into(),
            sheets,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region BuiltWorkbook

/// One populated cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecBuiltCell {
    /// Stored value; `None` for an absent path.
    pub value: Option<EnumRecordValue>,
    /// Resolved style.
    pub style: SpecCellStyle,
}

/// One declared column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecBuiltColumn {
    /// Header text.
    pub header: String,
    /// Record key.
    pub key: String,
    /// Width registered when the column was declared.
    pub width_declared: usize,
    /// Final width after auto-sizing.
    pub width: usize,
}

/// Frozen pane split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecFreezePane {
    /// Rows kept visible at the top.
    pub n_rows: usize,
    /// Columns kept visible at the left.
    pub n_cols: usize,
}

/// Inclusive zero-based cell range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCellRange {
    pub row_first: usize,
    pub col_first: usize,
    pub row_last: usize,
    pub col_last: usize,
}

impl SpecCellRange {
    /// Number of columns spanned.
    pub fn width(&self) -> usize {
        self.col_last + 1 - self.col_first
    }
}

/// Fully populated worksheet; row 0 is the header row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecBuiltSheet {
    /// Final worksheet name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<SpecBuiltColumn>,
    /// Header row followed by one row per record.
    pub rows: Vec<Vec<SpecBuiltCell>>,
    /// Frozen pane, when requested.
    pub freeze_pane: Option<SpecFreezePane>,
    /// Auto-filter range, when requested.
    pub autofilter: Option<SpecCellRange>,
}

impl SpecBuiltSheet {
    /// Row count including the header row.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Column count.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Cell at zero-based `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&SpecBuiltCell> {
        self.rows.get(row).and_then(|l_cells| l_cells.get(col))
    }
}

/// All built worksheets of one export call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecWorkbook {
    pub sheets: Vec<SpecBuiltSheet>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExportOptions

/// Column width policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitPolicy {
    /// Header length used when the header text is empty.
    pub width_header_fallback: usize,
    /// Lower bound of the declared width when no override is given.
    pub width_declared_min: usize,
    /// Padding added to the measured length.
    pub width_padding: usize,
}

impl Default for SpecAutofitPolicy {
    fn default() -> Self {
        Self {
            width_header_fallback: N_WIDTH_HEADER_FALLBACK,
            width_declared_min: N_WIDTH_DECLARED_MIN,
            width_padding: N_WIDTH_PADDING,
        }
    }
}

/// Exporter-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportOptions {
    /// Column width policy.
    pub policy_autofit: SpecAutofitPolicy,
    /// Number format given to date cells without one.
    pub fmt_date: String,
    /// Generic user-facing failure text.
    pub message_failure: String,
    /// Replace illegal sheet-name characters and de-duplicate names.
    pub if_sanitize_sheet_names: bool,
}

impl Default for SpecExportOptions {
    fn default() -> Self {
        Self {
            policy_autofit: SpecAutofitPolicy::default(),
            fmt_date: C_FMT_DATE_DEFAULT.to_string(),
            message_failure: C_MSG_EXPORT_FAILURE.to_string(),
            if_sanitize_sheet_names: true,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Shape of one emitted worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetReport {
    /// Final worksheet name.
    pub sheet_name: String,
    /// Rows including the header row.
    pub n_rows: usize,
    /// Columns.
    pub n_cols: usize,
}

/// Per-export report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportReport {
    /// Delivered file name.
    pub file_name: String,
    /// Emitted worksheets in order.
    pub sheets: Vec<SpecSheetReport>,
    /// Serialized size.
    pub n_bytes: usize,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecExportReport {
    /// Empty report for `file_name`.
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            ..Default::default()
        }
    }

    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_style_merge_overwrites_whole_fields() {
        let style_base = SpecCellStyle {
            num_fmt: Some("0.00".to_string()),
            font: Some(SpecFont {
                bold: Some(true),
                size: Some(14.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let style_patch = SpecCellStyle {
            font: Some(SpecFont {
                italic: Some(true),
                ..Default::default()
            }),
            fill: Some(SpecFill::solid("FFFF0000")),
            ..Default::default()
        };

        let style = style_base.merge(&style_patch);
        assert_eq!(style.num_fmt.as_deref(), Some("0.00"));
        assert_eq!(style.font.as_ref().and_then(|font| font.bold), None);
        assert_eq!(style.font.as_ref().and_then(|font| font.italic), Some(true));
        assert_eq!(style.fill, Some(SpecFill::solid("FFFF0000")));
        assert!(style.border.is_none());
    }

    #[test]
    fn test_record_value_from_json_keeps_nesting() {
        let value = EnumRecordValue::from(serde_json::json!({
            "name": "Alice",
            "score": 95.25,
            "active": true,
            "tags": ["a", "b"],
            "address": {"city": null}
        }));

        let EnumRecordValue::Map(dict_value) = value else {
            panic!("expected a map");
        };
        assert_eq!(dict_value["name"], EnumRecordValue::from("Alice"));
        assert_eq!(dict_value["score"], EnumRecordValue::Number(95.25));
        assert_eq!(dict_value["active"], EnumRecordValue::Bool(true));
        assert_eq!(
            dict_value["tags"],
            EnumRecordValue::List(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            dict_value["address"],
            EnumRecordValue::Map(BTreeMap::from([(
                "city".to_string(),
                EnumRecordValue::Null
            )]))
        );
    }

    #[test]
    fn test_request_deserializes_from_exceljs_shape() {
        let request: SpecExportRequest = serde_json::from_value(serde_json::json!({
            "fileName": "report.xlsx",
            "sheets": [{
                "name": "Orders",
                "columns": [
                    {"label": "Id", "key": "id"},
                    {"label": "Total", "key": "amount.total", "format": "0.00", "width": 20}
                ],
                "data": [{"id": 1, "amount": {"total": 9.5}}],
                "headerStyle": {
                    "font": {"bold": true, "color": {"argb": "FFFFFFFF"}},
                    "fill": {"type": "pattern", "pattern": "solid", "fgColor": {"argb": "FF4F81BD"}},
                    "alignment": {"horizontal": "center", "vertical": "middle"},
                    "border": {"bottom": {"style": "thin"}}
                },
                "freezeHeader": true
            }]
        }))
        .expect("deserialize request");

        assert_eq!(request.file_name, "report.xlsx");
        let sheet = &request.sheets[0];
        assert_eq!(sheet.columns[1].num_format.as_deref(), Some("0.00"));
        assert_eq!(sheet.columns[1].width_override, Some(20));
        assert_eq!(sheet.rows.as_ref().map(Vec::len), Some(1));
        assert_eq!(sheet.freeze_header, Some(true));

        let header_style = sheet.header_style.as_ref().expect("header style");
        assert_eq!(header_style.fill, Some(SpecFill::solid("FF4F81BD")));
        assert_eq!(
            header_style.alignment.as_ref().and_then(|align| align.vertical),
            Some(EnumVerticalAlign::Middle)
        );
        assert_eq!(
            header_style
                .border
                .as_ref()
                .and_then(|border| border.bottom.as_ref())
                .and_then(|edge| edge.style),
            Some(EnumBorderStyle::Thin)
        );
    }

    #[test]
    fn test_sheet_without_data_deserializes_to_missing_rows() {
        let sheet: SpecSheet = serde_json::from_value(serde_json::json!({
            "name": "Empty",
            "columns": [{"label": "A", "key": "a"}]
        }))
        .expect("deserialize sheet");
        assert!(sheet.rows.is_none());
    }
}
