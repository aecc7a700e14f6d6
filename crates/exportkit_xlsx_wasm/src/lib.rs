//! Browser bindings for `exportkit_xlsx`.
//!
//! JS surface:
//! - `generateExcelFile(config)`: build, serialize and download one workbook
//! - `useExcelExporter(config).exportFile()`: same, bound to a fixed config
//! - `getHeaderStyleTheme(name)`: header style preset or `undefined`
//!
//! Failures never reject: they are logged and shown with one `alert`.

mod browser;
mod config;

use std::rc::Rc;

use exportkit_xlsx::{
    ExcelExporter, ExportHandle, FailureNotifier, SpecExportOptions, XlsxWorkbookSerializer,
    get_header_style_theme,
};
use wasm_bindgen::prelude::*;

pub use browser::{AlertFailureNotifier, BrowserDownloadTarget};
pub use config::{derive_cell_style_fn, derive_record_value_from_js_date, parse_export_request};

type BrowserExporter =
    ExcelExporter<XlsxWorkbookSerializer, BrowserDownloadTarget, AlertFailureNotifier>;
type BrowserExportHandle =
    ExportHandle<XlsxWorkbookSerializer, BrowserDownloadTarget, AlertFailureNotifier>;

/// Install the panic hook and route `tracing` events to the browser console.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Err only when the host page already installed a subscriber.
    let _ = tracing_wasm::try_set_as_global_default();
}

fn create_exporter() -> BrowserExporter {
    ExcelExporter::new(
        XlsxWorkbookSerializer,
        BrowserDownloadTarget,
        AlertFailureNotifier,
    )
}

fn report_invalid_config(err: &str) {
    tracing::error!(error = %err, "invalid export configuration");
    AlertFailureNotifier.notify_failure(&SpecExportOptions::default().message_failure);
}

/// Build the workbook described by `config` and download it.
#[wasm_bindgen(js_name = generateExcelFile)]
pub async fn generate_excel_file(config: JsValue) {
    match parse_export_request(&config) {
        Ok(request) => create_exporter().export(&request).await,
        Err(err) => report_invalid_config(&err),
    }
}

/// Exporter bound to one configuration.
#[wasm_bindgen]
pub struct ExcelExporterHandle {
    inner: Result<BrowserExportHandle, String>,
}

#[wasm_bindgen]
impl ExcelExporterHandle {
    /// Export the bound configuration. The promise always resolves.
    #[wasm_bindgen(js_name = exportFile)]
    pub fn export_file(&self) -> js_sys::Promise {
        let inner = self.inner.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            match inner {
                Ok(handle) => handle.export_file().await,
                Err(err) => report_invalid_config(&err),
            }
            Ok(JsValue::UNDEFINED)
        })
    }
}

/// Bind `config` to a reusable exporter.
///
/// An invalid configuration is reported when `exportFile` is called.
#[wasm_bindgen(js_name = useExcelExporter)]
pub fn use_excel_exporter(config: JsValue) -> ExcelExporterHandle {
    let exporter = Rc::new(create_exporter());
    ExcelExporterHandle {
        inner: parse_export_request(&config).map(|request| exporter.bind(request)),
    }
}

/// Header style preset named `name`, or `undefined`.
#[wasm_bindgen(js_name = getHeaderStyleTheme)]
pub fn get_header_style_theme_js(name: &str) -> Result<JsValue, JsError> {
    match get_header_style_theme(name) {
        Some(style) => config::convert_to_js_value(style).map_err(|err| JsError::new(&err)),
        None => Ok(JsValue::UNDEFINED),
    }
}
