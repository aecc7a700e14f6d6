//! XLSX serializer that renders a built workbook into OOXML bytes.

use std::future::Future;

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, FormatUnderline, Workbook, Worksheet,
};

use crate::error::ExportError;
use crate::spec::{
    EnumBorderStyle, EnumFillPattern, EnumHorizontalAlign, EnumRecordValue, EnumVerticalAlign,
    SpecBuiltSheet, SpecCellStyle, SpecColor, SpecWorkbook,
};
use crate::util::{
    convert_nan_inf_to_str, derive_display_text, derive_excel_serial_from_datetime,
    parse_argb_color,
};

/// Renders a built workbook into an in-memory document.
///
/// This is the only suspension point of an export.
pub trait WorkbookSerializer {
    /// Serialize `workbook` to bytes.
    fn serialize(
        &self,
        workbook: &SpecWorkbook,
    ) -> impl Future<Output = Result<Vec<u8>, ExportError>>;
}

/// Serializer backed by `rust_xlsxwriter`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWorkbookSerializer;

impl WorkbookSerializer for XlsxWorkbookSerializer {
    async fn serialize(&self, workbook: &SpecWorkbook) -> Result<Vec<u8>, ExportError> {
        derive_xlsx_buffer(workbook)
    }
}

/// Write every sheet into a fresh workbook and return the xlsx bytes.
pub fn derive_xlsx_buffer(workbook_spec: &SpecWorkbook) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    for sheet in &workbook_spec.sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet)?;
    }

    let v_buffer = workbook.save_to_buffer()?;
    tracing::debug!(
        n_sheets = workbook_spec.sheets.len(),
        n_bytes = v_buffer.len(),
        "workbook serialized"
    );
    Ok(v_buffer)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &SpecBuiltSheet) -> Result<(), ExportError> {
    worksheet.set_name(&sheet.name)?;

    for (col_idx, column) in sheet.columns.iter().enumerate() {
        worksheet.set_column_width(cast_col_num(col_idx)?, column.width as f64)?;
    }

    for (row_idx, l_cells) in sheet.rows.iter().enumerate() {
        for (col_idx, cell) in l_cells.iter().enumerate() {
            let format = derive_rust_xlsx_format(&cell.style);
            write_cell_with_format(
                worksheet,
                row_idx,
                col_idx,
                cell.value.as_ref(),
                &format,
                cell.style.is_empty(),
            )?;
        }
    }

    if let Some(pane) = sheet.freeze_pane {
        worksheet.set_freeze_panes(cast_row_num(pane.n_rows)?, cast_col_num(pane.n_cols)?)?;
    }
    if let Some(range) = sheet.autofilter {
        worksheet.autofilter(
            cast_row_num(range.row_first)?,
            cast_col_num(range.col_first)?,
            cast_row_num(range.row_last)?,
            cast_col_num(range.col_last)?,
        )?;
    }

    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: Option<&EnumRecordValue>,
    format: &Format,
    if_style_empty: bool,
) -> Result<(), ExportError> {
    let row = cast_row_num(row_idx)?;
    let col = cast_col_num(col_idx)?;

    match value {
        None | Some(EnumRecordValue::Null) => {
            if !if_style_empty {
                worksheet.write_blank(row, col, format)?;
            }
        }
        Some(EnumRecordValue::String(val)) if val.is_empty() => {
            if !if_style_empty {
                worksheet.write_blank(row, col, format)?;
            }
        }
        Some(EnumRecordValue::Bool(val)) => {
            worksheet.write_boolean_with_format(row, col, *val, format)?;
        }
        Some(EnumRecordValue::Number(val)) => match convert_nan_inf_to_str(*val) {
            Some(txt) => {
                worksheet.write_string_with_format(row, col, txt, format)?;
            }
            None => {
                worksheet.write_number_with_format(row, col, *val, format)?;
            }
        },
        Some(EnumRecordValue::String(val)) => {
            worksheet.write_string_with_format(row, col, val, format)?;
        }
        Some(EnumRecordValue::Date(dt)) => match derive_excel_serial_from_datetime(dt) {
            Some(n_serial) => {
                worksheet.write_number_with_format(row, col, n_serial, format)?;
            }
            None => {
                worksheet.write_string_with_format(row, col, dt.to_string(), format)?;
            }
        },
        Some(value @ (EnumRecordValue::List(_) | EnumRecordValue::Map(_))) => {
            worksheet.write_string_with_format(row, col, derive_display_text(value), format)?;
        }
    }
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// #region FormatConversion

/// Convert a resolved cell style into a `rust_xlsxwriter` format.
///
/// Unparseable colors are logged and skipped.
pub fn derive_rust_xlsx_format(style: &SpecCellStyle) -> Format {
    let mut format = Format::new();

    if let Some(val) = &style.num_fmt {
        format = format.set_num_format(val.as_str());
    }

    if let Some(font) = &style.font {
        if let Some(val) = &font.name {
            format = format.set_font_name(val.as_str());
        }
        if let Some(val) = font.size {
            format = format.set_font_size(val);
        }
        if font.bold.unwrap_or(false) {
            format = format.set_bold();
        }
        if font.italic.unwrap_or(false) {
            format = format.set_italic();
        }
        if font.underline.unwrap_or(false) {
            format = format.set_underline(FormatUnderline::Single);
        }
        if font.strike.unwrap_or(false) {
            format = format.set_font_strikethrough();
        }
        if let Some(color) = derive_color(font.color.as_ref()) {
            format = format.set_font_color(color);
        }
    }

    if let Some(alignment) = &style.alignment {
        if let Some(val) = alignment.horizontal {
            format = format.set_align(derive_format_align_horizontal(val));
        }
        if let Some(val) = alignment.vertical {
            format = format.set_align(derive_format_align_vertical(val));
        }
        if alignment.wrap_text.unwrap_or(false) {
            format = format.set_text_wrap();
        }
        if let Some(val) = alignment.indent {
            format = format.set_indent(val);
        }
    }

    if let Some(fill) = &style.fill
        && fill.fill_type.is_some()
    {
        let pattern = fill.pattern.unwrap_or(EnumFillPattern::Solid);
        format = format.set_pattern(derive_format_pattern(pattern));

        let color_fg = derive_color(fill.fg_color.as_ref());
        let color_bg = derive_color(fill.bg_color.as_ref());
        if pattern == EnumFillPattern::Solid {
            // Solid fills paint with the background color.
            if let Some(color) = color_fg.or(color_bg) {
                format = format.set_background_color(color);
            }
        } else {
            if let Some(color) = color_fg {
                format = format.set_foreground_color(color);
            }
            if let Some(color) = color_bg {
                format = format.set_background_color(color);
            }
        }
    }

    if let Some(border) = &style.border {
        if let Some(edge) = &border.top {
            if let Some(val) = edge.style {
                format = format.set_border_top(derive_format_border(val));
            }
            if let Some(color) = derive_color(edge.color.as_ref()) {
                format = format.set_border_top_color(color);
            }
        }
        if let Some(edge) = &border.bottom {
            if let Some(val) = edge.style {
                format = format.set_border_bottom(derive_format_border(val));
            }
            if let Some(color) = derive_color(edge.color.as_ref()) {
                format = format.set_border_bottom_color(color);
            }
        }
        if let Some(edge) = &border.left {
            if let Some(val) = edge.style {
                format = format.set_border_left(derive_format_border(val));
            }
            if let Some(color) = derive_color(edge.color.as_ref()) {
                format = format.set_border_left_color(color);
            }
        }
        if let Some(edge) = &border.right {
            if let Some(val) = edge.style {
                format = format.set_border_right(derive_format_border(val));
            }
            if let Some(color) = derive_color(edge.color.as_ref()) {
                format = format.set_border_right_color(color);
            }
        }
    }

    format
}

fn derive_color(color: Option<&SpecColor>) -> Option<Color> {
    let color = color?;
    match parse_argb_color(&color.argb) {
        Some(n_rgb) => Some(Color::RGB(n_rgb)),
        None => {
            tracing::warn!(argb = %color.argb, "unparseable color ignored");
            None
        }
    }
}

fn derive_format_align_horizontal(align: EnumHorizontalAlign) -> FormatAlign {
    match align {
        EnumHorizontalAlign::Left => FormatAlign::Left,
        EnumHorizontalAlign::Center => FormatAlign::Center,
        EnumHorizontalAlign::Right => FormatAlign::Right,
        EnumHorizontalAlign::Fill => FormatAlign::Fill,
        EnumHorizontalAlign::Justify => FormatAlign::Justify,
        EnumHorizontalAlign::CenterContinuous => FormatAlign::CenterAcross,
        EnumHorizontalAlign::Distributed => FormatAlign::Distributed,
    }
}

fn derive_format_align_vertical(align: EnumVerticalAlign) -> FormatAlign {
    match align {
        EnumVerticalAlign::Top => FormatAlign::Top,
        EnumVerticalAlign::Middle => FormatAlign::VerticalCenter,
        EnumVerticalAlign::Bottom => FormatAlign::Bottom,
        EnumVerticalAlign::Distributed => FormatAlign::VerticalDistributed,
        EnumVerticalAlign::Justify => FormatAlign::VerticalJustify,
    }
}

fn derive_format_pattern(pattern: EnumFillPattern) -> FormatPattern {
    match pattern {
        EnumFillPattern::None => FormatPattern::None,
        EnumFillPattern::Solid => FormatPattern::Solid,
        EnumFillPattern::DarkGray => FormatPattern::DarkGray,
        EnumFillPattern::MediumGray => FormatPattern::MediumGray,
        EnumFillPattern::LightGray => FormatPattern::LightGray,
        EnumFillPattern::Gray125 => FormatPattern::Gray125,
        EnumFillPattern::Gray0625 => FormatPattern::Gray0625,
    }
}

fn derive_format_border(border: EnumBorderStyle) -> FormatBorder {
    match border {
        EnumBorderStyle::Thin => FormatBorder::Thin,
        EnumBorderStyle::Dotted => FormatBorder::Dotted,
        EnumBorderStyle::Hair => FormatBorder::Hair,
        EnumBorderStyle::Medium => FormatBorder::Medium,
        EnumBorderStyle::Double => FormatBorder::Double,
        EnumBorderStyle::Thick => FormatBorder::Thick,
        EnumBorderStyle::Dashed => FormatBorder::Dashed,
        EnumBorderStyle::DashDot => FormatBorder::DashDot,
        EnumBorderStyle::DashDotDot => FormatBorder::DashDotDot,
        EnumBorderStyle::SlantDashDot => FormatBorder::SlantDashDot,
        EnumBorderStyle::MediumDashed => FormatBorder::MediumDashed,
        EnumBorderStyle::MediumDashDot => FormatBorder::MediumDashDot,
        EnumBorderStyle::MediumDashDotDot => FormatBorder::MediumDashDotDot,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

fn cast_row_num(value: usize) -> Result<u32, ExportError> {
    u32::try_from(value).map_err(|_| ExportError::IndexOverflow(format!("row {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, ExportError> {
    u16::try_from(value).map_err(|_| ExportError::IndexOverflow(format!("column {value}")))
}
