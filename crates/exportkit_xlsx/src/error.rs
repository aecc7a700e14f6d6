//! Export error types.

use std::fmt;

use rust_xlsxwriter::XlsxError;

use crate::spec::BoxError;

/// Reason a request was rejected before any worksheet was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumConfigurationIssue {
    /// The request holds no sheets.
    NoSheets,
    /// A sheet holds no columns.
    MissingColumns,
    /// A sheet has no row data (absent, not empty).
    MissingData,
    /// A declared column width is zero.
    InvalidColumnWidth {
        /// Offending column key.
        column: String,
    },
    /// Header plus data rows exceed the Excel row limit.
    TooManyRows {
        /// Requested row count including the header.
        n_rows: usize,
    },
    /// Column count exceeds the Excel column limit.
    TooManyColumns {
        /// Requested column count.
        n_cols: usize,
    },
    /// Export options failed validation.
    InvalidPolicy(String),
}

impl fmt::Display for EnumConfigurationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSheets => write!(f, "no sheets provided"),
            Self::MissingColumns => write!(f, "missing columns"),
            Self::MissingData => write!(f, "missing data"),
            Self::InvalidColumnWidth { column } => {
                write!(f, "column {column:?} declares a zero width")
            }
            Self::TooManyRows { n_rows } => {
                write!(f, "{n_rows} rows exceed the worksheet row limit")
            }
            Self::TooManyColumns { n_cols } => {
                write!(f, "{n_cols} columns exceed the worksheet column limit")
            }
            Self::InvalidPolicy(msg) => write!(f, "{msg}"),
        }
    }
}

/// Request validation failure, naming the sheet where applicable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    /// Offending sheet name, if the issue is sheet-scoped.
    pub sheet: Option<String>,
    /// What is wrong.
    pub issue: EnumConfigurationIssue,
}

impl ConfigurationError {
    /// Request-scoped error.
    pub fn new(issue: EnumConfigurationIssue) -> Self {
        Self { sheet: None, issue }
    }

    /// Sheet-scoped error.
    pub fn for_sheet(sheet: &str, issue: EnumConfigurationIssue) -> Self {
        Self {
            sheet: Some(sheet.to_string()),
            issue,
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "Sheet {sheet:?}: {}", self.issue),
            None => write!(f, "{}", self.issue),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Any failure of the build, serialize and deliver pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Invalid request or options.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A caller-supplied cell style function failed.
    #[error("Cell style function failed on sheet {sheet:?}, column {column:?}, row {row}: {source}")]
    StyleFunction {
        /// Sheet being built.
        sheet: String,
        /// Column key.
        column: String,
        /// Zero-based index into the sheet's rows.
        row: usize,
        /// Error returned by the callback.
        #[source]
        source: BoxError,
    },

    /// The spreadsheet writer rejected the workbook.
    #[error("xlsx write error: {0}")]
    Serialization(#[from] XlsxError),

    /// A row/column index does not fit the writer's index types.
    #[error("xlsx index overflow: {0}")]
    IndexOverflow(String),

    /// The download target failed.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// A DataFrame row source could not be read.
    #[cfg(feature = "frame")]
    #[error("failed to read DataFrame: {0}")]
    Frame(#[from] polars::prelude::PolarsError),
}

impl ExportError {
    /// Whether the error is a request validation failure.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_the_sheet() {
        let err = ConfigurationError::for_sheet("Orders", EnumConfigurationIssue::MissingColumns);
        assert_eq!(err.to_string(), "Sheet \"Orders\": missing columns");

        let err = ConfigurationError::new(EnumConfigurationIssue::NoSheets);
        assert_eq!(err.to_string(), "no sheets provided");
    }

    #[test]
    fn test_style_function_error_keeps_source() {
        let err = ExportError::StyleFunction {
            sheet: "S".to_string(),
            column: "score".to_string(),
            row: 3,
            source: "boom".into(),
        };
        assert!(err.to_string().ends_with("row 3: boom"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_configuration());
    }
}
