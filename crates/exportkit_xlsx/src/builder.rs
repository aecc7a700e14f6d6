//! Request validation and worksheet construction.
//!
//! The builder turns a [`SpecExportRequest`] into an in-memory
//! [`SpecWorkbook`]; nothing here touches the xlsx writer.

use std::collections::BTreeSet;

use crate::conf::{C_SHEET_NAME_DEFAULT, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX};
use crate::error::{ConfigurationError, EnumConfigurationIssue, ExportError};
use crate::spec::{
    EnumRecordValue, SpecAutofitPolicy, SpecBuiltCell, SpecBuiltColumn, SpecBuiltSheet,
    SpecCellRange, SpecCellStyle, SpecColumn, SpecExportOptions, SpecExportReport,
    SpecExportRequest, SpecFreezePane, SpecHeaderStyle, SpecRowRecord, SpecSheet, SpecWorkbook,
};
use crate::util::{
    derive_display_text, derive_text_len, derive_unique_sheet_name, derive_value_at_path,
    sanitize_sheet_name,
};

////////////////////////////////////////////////////////////////////////////////
// #region Validation

/// Validate the autofit policy.
pub fn validate_policy_autofit(policy_autofit: &SpecAutofitPolicy) -> Result<(), ConfigurationError> {
    if policy_autofit.width_header_fallback == 0 {
        return Err(ConfigurationError::new(EnumConfigurationIssue::InvalidPolicy(
            "policy_autofit.width_header_fallback must be >= 1.".to_string(),
        )));
    }
    Ok(())
}

/// Validate one sheet and return its rows.
pub fn validate_sheet(sheet: &SpecSheet) -> Result<&[SpecRowRecord], ConfigurationError> {
    if sheet.columns.is_empty() {
        return Err(ConfigurationError::for_sheet(
            &sheet.name,
            EnumConfigurationIssue::MissingColumns,
        ));
    }
    let Some(l_rows) = sheet.rows.as_deref() else {
        return Err(ConfigurationError::for_sheet(
            &sheet.name,
            EnumConfigurationIssue::MissingData,
        ));
    };

    if let Some(column) = sheet
        .columns
        .iter()
        .find(|column| column.width_override == Some(0))
    {
        return Err(ConfigurationError::for_sheet(
            &sheet.name,
            EnumConfigurationIssue::InvalidColumnWidth {
                column: column.key.clone(),
            },
        ));
    }

    let n_rows = l_rows.len() + 1;
    if n_rows > N_NROWS_EXCEL_MAX {
        return Err(ConfigurationError::for_sheet(
            &sheet.name,
            EnumConfigurationIssue::TooManyRows { n_rows },
        ));
    }
    let n_cols = sheet.columns.len();
    if n_cols > N_NCOLS_EXCEL_MAX {
        return Err(ConfigurationError::for_sheet(
            &sheet.name,
            EnumConfigurationIssue::TooManyColumns { n_cols },
        ));
    }

    Ok(l_rows)
}

/// Validate a whole request before any worksheet is built.
pub fn validate_request(
    request: &SpecExportRequest,
    options: &SpecExportOptions,
) -> Result<(), ConfigurationError> {
    validate_policy_autofit(&options.policy_autofit)?;
    if request.sheets.is_empty() {
        return Err(ConfigurationError::new(EnumConfigurationIssue::NoSheets));
    }
    for sheet in &request.sheets {
        validate_sheet(sheet)?;
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNames

/// Plan final worksheet names, in request order.
///
/// With sanitization enabled, illegal names are repaired and duplicates get a
/// `__N` suffix; every change is recorded in `report`.
pub fn plan_sheet_names(
    request: &SpecExportRequest,
    options: &SpecExportOptions,
    report: &mut SpecExportReport,
) -> Vec<String> {
    let mut set_names_existing = BTreeSet::new();
    let mut l_names = Vec::with_capacity(request.sheets.len());

    for sheet in &request.sheets {
        if !options.if_sanitize_sheet_names {
            l_names.push(if sheet.name.is_empty() {
                C_SHEET_NAME_DEFAULT.to_string()
            } else {
                sheet.name.clone()
            });
            continue;
        }

        let name_clean = sanitize_sheet_name(&sheet.name, "_");
        let name_final = derive_unique_sheet_name(&name_clean, &mut set_names_existing);
        if !sheet.name.is_empty() && name_final != sheet.name {
            tracing::warn!(
                sheet = %sheet.name,
                renamed = %name_final,
                "worksheet renamed"
            );
            report.warn(format!(
                "Sheet {:?} renamed to {name_final:?}.",
                sheet.name
            ));
        }
        l_names.push(name_final);
    }

    l_names
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnWidth

/// Width registered when a column is declared.
pub fn derive_declared_width(column: &SpecColumn, policy_autofit: &SpecAutofitPolicy) -> usize {
    match column.width_override {
        Some(width) => width as usize,
        None => usize::max(
            policy_autofit.width_declared_min,
            derive_text_len(&column.label) + policy_autofit.width_padding,
        ),
    }
}

/// Final width of column `col_idx` from the header text and every written value.
pub fn derive_autofit_width(
    sheet: &SpecBuiltSheet,
    col_idx: usize,
    policy_autofit: &SpecAutofitPolicy,
) -> usize {
    let n_len_header = sheet
        .columns
        .get(col_idx)
        .map_or(0, |column| derive_text_len(&column.header));
    let n_len_header = if n_len_header == 0 {
        policy_autofit.width_header_fallback
    } else {
        n_len_header
    };

    let n_len_content = sheet
        .rows
        .iter()
        .skip(1)
        .filter_map(|l_cells| l_cells.get(col_idx))
        .filter_map(|cell| cell.value.as_ref())
        .map(|value| derive_text_len(&derive_display_text(value)))
        .max()
        .unwrap_or(0);

    usize::max(n_len_header, n_len_content) + policy_autofit.width_padding
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetBuilder

/// Convert a header style into the style applied to header cells.
///
/// A fill without a declared type is dropped, leaving the writer default.
pub fn derive_header_cell_style(header_style: &SpecHeaderStyle) -> (SpecCellStyle, bool) {
    let mut if_fill_dropped = false;
    let fill = match &header_style.fill {
        Some(fill) if fill.fill_type.is_some() => Some(fill.clone()),
        Some(_) => {
            if_fill_dropped = true;
            None
        }
        None => None,
    };

    let style = SpecCellStyle {
        num_fmt: None,
        font: header_style.font.clone(),
        alignment: header_style.alignment.clone(),
        fill,
        border: header_style.border.clone(),
    };
    (style, if_fill_dropped)
}

fn derive_data_cell(
    sheet: &SpecSheet,
    column: &SpecColumn,
    record: &SpecRowRecord,
    row_idx: usize,
    options: &SpecExportOptions,
) -> Result<SpecBuiltCell, ExportError> {
    let value = derive_value_at_path(record, &column.key);

    let mut style = SpecCellStyle {
        num_fmt: column.num_format.clone(),
        ..Default::default()
    };
    if style.num_fmt.is_none() && matches!(value, Some(EnumRecordValue::Date(_))) {
        style.num_fmt = Some(options.fmt_date.clone());
    }

    if let Some(fn_style) = &column.cell_style_fn {
        let style_patch = fn_style(value, record).map_err(|err| ExportError::StyleFunction {
            sheet: sheet.name.clone(),
            column: column.key.clone(),
            row: row_idx,
            source: err,
        })?;
        style = style.merge(&style_patch);
    }

    Ok(SpecBuiltCell {
        value: value.cloned(),
        style,
    })
}

/// Build one worksheet.
///
/// `name` is the final worksheet name from [`plan_sheet_names`].
pub fn build_sheet(
    sheet: &SpecSheet,
    name: &str,
    options: &SpecExportOptions,
    report: &mut SpecExportReport,
) -> Result<SpecBuiltSheet, ExportError> {
    let l_rows = validate_sheet(sheet)?;
    let policy_autofit = &options.policy_autofit;
    let n_cols = sheet.columns.len();

    let l_columns: Vec<SpecBuiltColumn> = sheet
        .columns
        .iter()
        .map(|column| {
            let width = derive_declared_width(column, policy_autofit);
            SpecBuiltColumn {
                header: column.label.clone(),
                key: column.key.clone(),
                width_declared: width,
                width,
            }
        })
        .collect();

    let mut l_header_cells: Vec<SpecBuiltCell> = sheet
        .columns
        .iter()
        .map(|column| SpecBuiltCell {
            value: Some(EnumRecordValue::String(column.label.clone())),
            style: SpecCellStyle::default(),
        })
        .collect();

    let mut l_grid = Vec::with_capacity(l_rows.len() + 1);
    l_grid.push(Vec::new());
    for (row_idx, record) in l_rows.iter().enumerate() {
        let l_cells = sheet
            .columns
            .iter()
            .map(|column| derive_data_cell(sheet, column, record, row_idx, options))
            .collect::<Result<Vec<_>, _>>()?;
        l_grid.push(l_cells);
    }

    if let Some(header_style) = &sheet.header_style {
        let (style_header, if_fill_dropped) = derive_header_cell_style(header_style);
        if if_fill_dropped {
            tracing::warn!(sheet = %name, "header fill without a type ignored");
            report.warn(format!("Sheet {name:?}: header fill without a type ignored."));
        }
        for cell in &mut l_header_cells {
            cell.style = cell.style.merge(&style_header);
        }
    }
    l_grid[0] = l_header_cells;

    let (freeze_pane, autofilter) = if sheet.freeze_header == Some(true) {
        (
            Some(SpecFreezePane {
                n_rows: 1,
                n_cols: 0,
            }),
            Some(SpecCellRange {
                row_first: 0,
                col_first: 0,
                row_last: 0,
                col_last: n_cols - 1,
            }),
        )
    } else {
        (None, None)
    };

    let mut sheet_built = SpecBuiltSheet {
        name: name.to_string(),
        columns: l_columns,
        rows: l_grid,
        freeze_pane,
        autofilter,
    };

    for col_idx in 0..n_cols {
        let width = derive_autofit_width(&sheet_built, col_idx, policy_autofit);
        sheet_built.columns[col_idx].width = width;
    }

    tracing::debug!(
        sheet = %sheet_built.name,
        n_rows = sheet_built.height(),
        n_cols = sheet_built.width(),
        "worksheet built"
    );
    Ok(sheet_built)
}

/// Validate a request and build every worksheet in order.
pub fn build_workbook(
    request: &SpecExportRequest,
    options: &SpecExportOptions,
    report: &mut SpecExportReport,
) -> Result<SpecWorkbook, ExportError> {
    validate_request(request, options)?;

    let l_names = plan_sheet_names(request, options, report);
    let mut l_sheets = Vec::with_capacity(request.sheets.len());
    for (sheet, name) in request.sheets.iter().zip(&l_names) {
        l_sheets.push(build_sheet(sheet, name, options, report)?);
    }

    Ok(SpecWorkbook { sheets: l_sheets })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::conf::get_header_style_theme;
    use crate::spec::{EnumFillPattern, SpecFill, SpecFont};

    fn create_record(pairs: &[(&str, EnumRecordValue)]) -> SpecRowRecord {
        pairs
            .iter()
            .map(|(key, val)| (key.to_string(), val.clone()))
            .collect()
    }

    fn create_scores_sheet() -> SpecSheet {
        SpecSheet::new(
            "TestSheet",
            vec![
                SpecColumn::new("Name", "name"),
                SpecColumn::new("Score", "score").with_num_format("0.00"),
            ],
            vec![
                create_record(&[("name", "Alice".into()), ("score", 95.25.into())]),
                create_record(&[("name", "Bob".into()), ("score", 82.1.into())]),
            ],
        )
    }

    fn build_one(sheet: SpecSheet) -> Result<SpecBuiltSheet, ExportError> {
        let request = SpecExportRequest::new("out.xlsx", vec![sheet]);
        let mut report = SpecExportReport::new("out.xlsx");
        let workbook = build_workbook(&request, &SpecExportOptions::default(), &mut report)?;
        Ok(workbook.sheets.into_iter().next().expect("one sheet"))
    }

    #[test]
    fn test_build_sheet_shape_and_formats() {
        let sheet = build_one(create_scores_sheet()).expect("build");
        assert_eq!(sheet.name, "TestSheet");
        assert_eq!(sheet.width(), 2);
        assert_eq!(sheet.height(), 3);
        assert_eq!(
            sheet.cell(0, 1).and_then(|cell| cell.value.clone()),
            Some(EnumRecordValue::from("Score"))
        );
        assert_eq!(
            sheet.cell(2, 1).and_then(|cell| cell.value.clone()),
            Some(EnumRecordValue::Number(82.1))
        );
        assert_eq!(
            sheet.cell(1, 1).and_then(|cell| cell.style.num_fmt.as_deref()),
            Some("0.00")
        );
        assert_eq!(
            sheet.cell(1, 0).and_then(|cell| cell.style.num_fmt.as_deref()),
            None
        );
        assert_eq!(sheet.freeze_pane, None);
        assert_eq!(sheet.autofilter, None);
    }

    #[test]
    fn test_missing_path_segment_yields_empty_cell() {
        let sheet = SpecSheet::new(
            "People",
            vec![SpecColumn::new("City", "address.city")],
            vec![
                create_record(&[(
                    "address",
                    EnumRecordValue::Map(BTreeMap::from([(
                        "city".to_string(),
                        EnumRecordValue::from("Oslo"),
                    )])),
                )]),
                create_record(&[("name", "NoAddress".into())]),
            ],
        );
        let sheet = build_one(sheet).expect("build");
        assert_eq!(
            sheet.cell(1, 0).and_then(|cell| cell.value.clone()),
            Some(EnumRecordValue::from("Oslo"))
        );
        assert_eq!(sheet.cell(2, 0).and_then(|cell| cell.value.clone()), None);
    }

    #[test]
    fn test_autofit_overrides_declared_width() {
        let sheet = SpecSheet::new(
            "Widths",
            vec![
                SpecColumn::new("Name", "name").with_width(40),
                SpecColumn::new("", "note"),
                SpecColumn::new("Comment", "comment"),
            ],
            vec![create_record(&[
                ("name", "Al".into()),
                ("comment", "a fairly long comment text".into()),
            ])],
        );
        let sheet = build_one(sheet).expect("build");

        assert_eq!(sheet.columns[0].width_declared, 40);
        assert_eq!(sheet.columns[0].width, 6);
        assert_eq!(sheet.columns[1].width_declared, 12);
        assert_eq!(sheet.columns[1].width, 12);
        assert_eq!(sheet.columns[2].width, 28);
    }

    #[test]
    fn test_empty_rows_yield_header_only_sheet() {
        let sheet = SpecSheet::new("Empty", vec![SpecColumn::new("A", "a")], vec![]);
        let sheet = build_one(sheet).expect("build");
        assert_eq!(sheet.height(), 1);
        assert_eq!(sheet.columns[0].width, 3);
    }

    #[test]
    fn test_freeze_header_sets_pane_and_filter() {
        let sheet = build_one(create_scores_sheet().with_freeze_header(true)).expect("build");
        assert_eq!(
            sheet.freeze_pane,
            Some(SpecFreezePane {
                n_rows: 1,
                n_cols: 0
            })
        );
        let range = sheet.autofilter.expect("autofilter");
        assert_eq!((range.row_first, range.row_last), (0, 0));
        assert_eq!(range.width(), 2);

        let sheet = build_one(create_scores_sheet().with_freeze_header(false)).expect("build");
        assert_eq!(sheet.freeze_pane, None);
        assert_eq!(sheet.autofilter, None);
    }

    #[test]
    fn test_header_style_applies_to_header_cells_only() {
        let style_theme = get_header_style_theme("modern").expect("theme").clone();
        let sheet = build_one(create_scores_sheet().with_header_style(style_theme)).expect("build");

        let cell_header = sheet.cell(0, 0).expect("header");
        assert_eq!(
            cell_header.style.fill.as_ref().and_then(|fill| fill.pattern),
            Some(EnumFillPattern::Solid)
        );
        assert!(cell_header.style.border.is_some());
        assert!(sheet.cell(1, 0).expect("data").style.fill.is_none());
    }

    #[test]
    fn test_header_fill_without_type_is_ignored() {
        let header_style = SpecHeaderStyle {
            font: Some(SpecFont {
                bold: Some(true),
                ..Default::default()
            }),
            fill: Some(SpecFill {
                fill_type: None,
                ..SpecFill::solid("FF00FF00")
            }),
            ..Default::default()
        };
        let request = SpecExportRequest::new(
            "out.xlsx",
            vec![create_scores_sheet().with_header_style(header_style)],
        );
        let mut report = SpecExportReport::new("out.xlsx");
        let workbook =
            build_workbook(&request, &SpecExportOptions::default(), &mut report).expect("build");

        let cell_header = workbook.sheets[0].cell(0, 1).expect("header");
        assert!(cell_header.style.fill.is_none());
        assert!(cell_header.style.font.is_some());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_cell_style_fn_merges_and_sees_record() {
        let column = SpecColumn::new("Score", "score")
            .with_num_format("0.00")
            .with_cell_style(|value, record| {
                let if_low = matches!(value, Some(EnumRecordValue::Number(n)) if *n < 90.0);
                let if_bob = record.get("name") == Some(&EnumRecordValue::from("Bob"));
                Ok(SpecCellStyle {
                    fill: (if_low && if_bob).then(|| SpecFill::solid("FFFFC7CE")),
                    ..Default::default()
                })
            });
        let mut sheet = create_scores_sheet();
        sheet.columns[1] = column;

        let sheet = build_one(sheet).expect("build");
        assert!(sheet.cell(1, 1).expect("alice").style.fill.is_none());
        let cell_bob = sheet.cell(2, 1).expect("bob");
        assert_eq!(cell_bob.style.fill, Some(SpecFill::solid("FFFFC7CE")));
        assert_eq!(cell_bob.style.num_fmt.as_deref(), Some("0.00"));
    }

    #[test]
    fn test_cell_style_fn_failure_names_location() {
        let mut sheet = create_scores_sheet();
        sheet.columns[1] = SpecColumn::new("Score", "score").with_cell_style(|value, _| {
            match value {
                Some(EnumRecordValue::Number(n)) if *n < 90.0 => Err("score too low".into()),
                _ => Ok(SpecCellStyle::default()),
            }
        });

        match build_one(sheet) {
            Err(ExportError::StyleFunction {
                sheet, column, row, ..
            }) => {
                assert_eq!(sheet, "TestSheet");
                assert_eq!(column, "score");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_date_cells_get_default_date_format() {
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        let sheet = SpecSheet::new(
            "Dates",
            vec![SpecColumn::new("When", "when")],
            vec![create_record(&[("when", dt.into())])],
        );
        let sheet = build_one(sheet).expect("build");
        assert_eq!(
            sheet.cell(1, 0).and_then(|cell| cell.style.num_fmt.as_deref()),
            Some("yyyy-mm-dd hh:mm:ss")
        );
    }

    #[test]
    fn test_validation_errors_name_the_sheet() {
        let options = SpecExportOptions::default();
        let mut report = SpecExportReport::new("out.xlsx");

        let request = SpecExportRequest::new("out.xlsx", vec![]);
        let err = build_workbook(&request, &options, &mut report).expect_err("no sheets");
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "no sheets provided");

        let request =
            SpecExportRequest::new("out.xlsx", vec![SpecSheet::new("Blank", vec![], vec![])]);
        let err = build_workbook(&request, &options, &mut report).expect_err("no columns");
        assert_eq!(err.to_string(), "Sheet \"Blank\": missing columns");

        let mut sheet = create_scores_sheet();
        sheet.rows = None;
        let request = SpecExportRequest::new("out.xlsx", vec![sheet]);
        let err = build_workbook(&request, &options, &mut report).expect_err("no rows");
        assert_eq!(err.to_string(), "Sheet \"TestSheet\": missing data");
    }

    #[test]
    fn test_sheet_names_are_sanitized_and_unique() {
        let request = SpecExportRequest::new(
            "out.xlsx",
            vec![
                create_scores_sheet(),
                create_scores_sheet(),
                SpecSheet {
                    name: String::new(),
                    ..create_scores_sheet()
                },
                SpecSheet {
                    name: "Q1/Q2".to_string(),
                    ..create_scores_sheet()
                },
            ],
        );
        let mut report = SpecExportReport::new("out.xlsx");
        let workbook =
            build_workbook(&request, &SpecExportOptions::default(), &mut report).expect("build");

        let l_names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(l_names, ["TestSheet", "TestSheet__2", "Sheet", "Q1_Q2"]);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_rebuild_keeps_column_order_and_headers() {
        let request = SpecExportRequest::new("out.xlsx", vec![create_scores_sheet()]);
        let options = SpecExportOptions::default();
        let derive_headers = || {
            let mut report = SpecExportReport::new("out.xlsx");
            build_workbook(&request, &options, &mut report)
                .expect("build")
                .sheets[0]
                .columns
                .iter()
                .map(|column| (column.key.clone(), column.header.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(derive_headers(), derive_headers());
    }

    #[test]
    fn test_zero_column_width_is_rejected() {
        let mut sheet = create_scores_sheet();
        sheet.columns[1] = SpecColumn::new("Score", "score").with_width(0);

        let err = validate_sheet(&sheet).expect_err("zero width");
        assert_eq!(
            err.issue,
            EnumConfigurationIssue::InvalidColumnWidth {
                column: "score".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "Sheet \"TestSheet\": column \"score\" declares a zero width"
        );

        let err = build_one(sheet).expect_err("zero width");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_sheet_size_limits_are_checked_up_front() {
        let l_columns: Vec<SpecColumn> = (0..=N_NCOLS_EXCEL_MAX)
            .map(|n_idx| SpecColumn::new(format!("C{n_idx}"), format!("c{n_idx}")))
            .collect();
        let sheet_wide = SpecSheet::new("Wide", l_columns, vec![]);
        let err = validate_sheet(&sheet_wide).expect_err("too many columns");
        assert_eq!(
            err.issue,
            EnumConfigurationIssue::TooManyColumns {
                n_cols: N_NCOLS_EXCEL_MAX + 1
            }
        );

        let sheet_tall = SpecSheet::new(
            "Tall",
            vec![SpecColumn::new("Name", "name")],
            vec![SpecRowRecord::new(); N_NROWS_EXCEL_MAX],
        );
        let err = validate_sheet(&sheet_tall).expect_err("too many rows");
        assert_eq!(
            err.issue,
            EnumConfigurationIssue::TooManyRows {
                n_rows: N_NROWS_EXCEL_MAX + 1
            }
        );

        let request = SpecExportRequest::new("out.xlsx", vec![create_scores_sheet(), sheet_wide]);
        let mut report = SpecExportReport::new("out.xlsx");
        let err = build_workbook(&request, &SpecExportOptions::default(), &mut report)
            .expect_err("invalid second sheet");
        assert_eq!(
            err.to_string(),
            format!(
                "Sheet \"Wide\": {} columns exceed the worksheet column limit",
                N_NCOLS_EXCEL_MAX + 1
            )
        );
    }

    #[test]
    fn test_zero_header_fallback_is_rejected() {
        let mut options = SpecExportOptions::default();
        options.policy_autofit.width_header_fallback = 0;
        let request = SpecExportRequest::new("out.xlsx", vec![create_scores_sheet()]);
        let mut report = SpecExportReport::new("out.xlsx");
        let err = build_workbook(&request, &options, &mut report).expect_err("invalid policy");
        assert!(err.is_configuration());
    }
}
