//! Browser delivery: Blob object URLs, anchor downloads and alerts.

use exportkit_xlsx::{DownloadTarget, ExportError, FailureNotifier, SpecBlob};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

/// Text of a thrown JS value.
pub(crate) fn derive_js_error_text(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn derive_delivery_error(err: JsValue) -> ExportError {
    ExportError::Delivery(derive_js_error_text(&err))
}

/// Download target backed by `URL.createObjectURL` and a temporary anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserDownloadTarget;

impl DownloadTarget for BrowserDownloadTarget {
    fn create_object_url(&self, blob: SpecBlob) -> Result<String, ExportError> {
        let arr_bytes = js_sys::Uint8Array::from(blob.v_bytes.as_slice());
        let l_parts = js_sys::Array::of1(&arr_bytes);
        let props = BlobPropertyBag::new();
        props.set_type(&blob.mime);

        let js_blob = Blob::new_with_u8_array_sequence_and_options(&l_parts, &props)
            .map_err(derive_delivery_error)?;
        Url::create_object_url_with_blob(&js_blob).map_err(derive_delivery_error)
    }

    fn trigger_download(&self, url: &str, file_name: &str) -> Result<(), ExportError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| ExportError::Delivery("no document available".to_string()))?;
        let body = document
            .body()
            .ok_or_else(|| ExportError::Delivery("document has no body".to_string()))?;

        let anchor: HtmlAnchorElement = document
            .create_element("a")
            .map_err(derive_delivery_error)?
            .dyn_into()
            .map_err(|_| ExportError::Delivery("created element is not an anchor".to_string()))?;
        anchor.set_href(url);
        anchor.set_download(file_name);

        body.append_child(&anchor).map_err(derive_delivery_error)?;
        anchor.click();
        anchor.remove();
        Ok(())
    }

    fn revoke_object_url(&self, url: &str) {
        if let Err(err) = Url::revoke_object_url(url) {
            tracing::warn!(url, error = %derive_js_error_text(&err), "object URL not revoked");
        }
    }
}

/// Shows the failure message with `window.alert`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertFailureNotifier;

impl FailureNotifier for AlertFailureNotifier {
    fn notify_failure(&self, message: &str) {
        let Some(window) = web_sys::window() else {
            tracing::warn!(%message, "no window to alert");
            return;
        };
        if let Err(err) = window.alert_with_message(message) {
            tracing::warn!(error = %derive_js_error_text(&err), "alert failed");
        }
    }
}
