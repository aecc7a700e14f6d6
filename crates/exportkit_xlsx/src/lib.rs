//! `exportkit_xlsx`:
//! Tabular records to downloadable XLSX workbooks.
//!
//! Modules:
//! - `conf`     : constants, header style themes and default presets
//! - `spec`     : request/style/value models, built workbook, options, report
//! - `error`    : configuration and export errors
//! - `util`     : pure helper functions
//! - `builder`  : validation and sheet construction
//! - `writer`   : `rust_xlsxwriter` serializer
//! - `delivery` : blobs and download targets
//! - `exporter` : top-level export entry points
//! - `frame`    : Polars DataFrame source (feature `frame`)
pub mod builder;
pub mod conf;
pub mod delivery;
pub mod error;
pub mod exporter;
#[cfg(feature = "frame")]
pub mod frame;
pub mod spec;
pub mod util;
pub mod writer;

pub use builder::{build_sheet, build_workbook, validate_request, validate_sheet};
pub use conf::{
    C_MIME_XLSX, EnumHeaderStyleTheme, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, get_header_style_theme,
};
pub use delivery::{
    DirectoryDownloadTarget, DownloadTarget, MemoryDownloadTarget, SpecBlob, SpecDownload,
    deliver_blob,
};
pub use error::{ConfigurationError, EnumConfigurationIssue, ExportError};
pub use exporter::{ExcelExporter, ExportHandle, FailureNotifier, LogFailureNotifier};
#[cfg(feature = "frame")]
pub use frame::{derive_dataframe_from_ipc_bytes, derive_sheet_from_dataframe};
pub use spec::{
    BoxError, CellStyleFn, EnumBorderStyle, EnumFillPattern, EnumFillType, EnumHorizontalAlign,
    EnumRecordValue, EnumVerticalAlign, SpecAlignment, SpecAutofitPolicy, SpecBorder,
    SpecBorderEdge, SpecBuiltSheet, SpecCellStyle, SpecColor, SpecColumn, SpecExportOptions,
    SpecExportReport, SpecExportRequest, SpecFill, SpecFont, SpecHeaderStyle, SpecRowRecord,
    SpecSheet, SpecWorkbook,
};
pub use writer::{WorkbookSerializer, XlsxWorkbookSerializer};
