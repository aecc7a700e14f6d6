//! Top-level export entry points.
//!
//! [`ExcelExporter::try_export`] runs build, serialize and deliver and returns
//! the first error. [`ExcelExporter::export`] is the catch-all variant: it logs
//! the error, shows one generic failure message and resolves normally.

use std::path::PathBuf;
use std::rc::Rc;

use crate::builder::build_workbook;
use crate::conf::C_MIME_XLSX;
use crate::delivery::{DirectoryDownloadTarget, DownloadTarget, SpecBlob, deliver_blob};
use crate::error::ExportError;
use crate::spec::{SpecExportOptions, SpecExportReport, SpecExportRequest, SpecSheetReport};
use crate::writer::{WorkbookSerializer, XlsxWorkbookSerializer};

/// Shows the generic failure message to the end user.
pub trait FailureNotifier {
    /// Present `message`.
    fn notify_failure(&self, message: &str);
}

/// Notifier that only records the message in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailureNotifier;

impl FailureNotifier for LogFailureNotifier {
    fn notify_failure(&self, message: &str) {
        tracing::warn!(%message, "export failure notified");
    }
}

impl<F> FailureNotifier for F
where
    F: Fn(&str),
{
    fn notify_failure(&self, message: &str) {
        self(message)
    }
}

/// Exporter bound to a serializer, a download target and a failure notifier.
#[derive(Debug)]
pub struct ExcelExporter<S, D, N> {
    serializer: S,
    target: D,
    notifier: N,
    options: SpecExportOptions,
}

impl ExcelExporter<XlsxWorkbookSerializer, DirectoryDownloadTarget, LogFailureNotifier> {
    /// Exporter writing finished files into `dir_out`.
    pub fn to_directory(dir_out: impl Into<PathBuf>) -> Self {
        Self::new(
            XlsxWorkbookSerializer,
            DirectoryDownloadTarget::new(dir_out),
            LogFailureNotifier,
        )
    }
}

impl<S, D, N> ExcelExporter<S, D, N>
where
    S: WorkbookSerializer,
    D: DownloadTarget,
    N: FailureNotifier,
{
    /// Exporter with default options.
    pub fn new(serializer: S, target: D, notifier: N) -> Self {
        Self {
            serializer,
            target,
            notifier,
            options: SpecExportOptions::default(),
        }
    }

    /// Replace the export options.
    pub fn with_options(mut self, options: SpecExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SpecExportOptions {
        &self.options
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    /// Build, serialize and deliver `request`.
    ///
    /// Validation completes before the serializer is called; a failed
    /// serialization triggers no download.
    pub async fn try_export(
        &self,
        request: &SpecExportRequest,
    ) -> Result<SpecExportReport, ExportError> {
        let mut report = SpecExportReport::new(&request.file_name);
        let workbook = build_workbook(request, &self.options, &mut report)?;
        report.sheets = workbook
            .sheets
            .iter()
            .map(|sheet| SpecSheetReport {
                sheet_name: sheet.name.clone(),
                n_rows: sheet.height(),
                n_cols: sheet.width(),
            })
            .collect();

        let v_buffer = self.serializer.serialize(&workbook).await?;
        drop(workbook);

        report.n_bytes = v_buffer.len();
        deliver_blob(
            &self.target,
            SpecBlob::new(v_buffer, C_MIME_XLSX),
            &request.file_name,
        )?;

        tracing::info!(
            file_name = %request.file_name,
            n_sheets = report.sheets.len(),
            n_bytes = report.n_bytes,
            "spreadsheet download triggered"
        );
        Ok(report)
    }

    /// Export `request`, handling every failure in place.
    ///
    /// Errors are logged and reported through the notifier with the generic
    /// failure message; the returned future always completes normally.
    pub async fn export(&self, request: &SpecExportRequest) {
        if let Err(err) = self.try_export(request).await {
            tracing::error!(
                file_name = %request.file_name,
                error = %err,
                "spreadsheet export failed"
            );
            self.notifier.notify_failure(&self.options.message_failure);
        }
    }

    /// Bind `request` to this exporter.
    pub fn bind(self: &Rc<Self>, request: SpecExportRequest) -> ExportHandle<S, D, N> {
        ExportHandle {
            exporter: Rc::clone(self),
            request,
        }
    }
}

/// Fixed request bound to an exporter; exports on every call.
#[derive(Debug)]
pub struct ExportHandle<S, D, N> {
    exporter: Rc<ExcelExporter<S, D, N>>,
    request: SpecExportRequest,
}

impl<S, D, N> Clone for ExportHandle<S, D, N> {
    fn clone(&self) -> Self {
        Self {
            exporter: Rc::clone(&self.exporter),
            request: self.request.clone(),
        }
    }
}

impl<S, D, N> ExportHandle<S, D, N>
where
    S: WorkbookSerializer,
    D: DownloadTarget,
    N: FailureNotifier,
{
    /// Export the bound request with catch-all failure handling.
    pub async fn export_file(&self) {
        self.exporter.export(&self.request).await
    }

    pub fn request(&self) -> &SpecExportRequest {
        &self.request
    }
}
