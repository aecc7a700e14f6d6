//! Blob delivery: temporary object references and download triggers.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ExportError;

/// Serialized document tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecBlob {
    /// Document bytes.
    pub v_bytes: Vec<u8>,
    /// MIME type.
    pub mime: String,
}

impl SpecBlob {
    /// Wrap bytes with a MIME type.
    pub fn new(v_bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            v_bytes,
            mime: mime.into(),
        }
    }
}

/// Platform download facility.
///
/// A blob is first staged under a temporary URL, the download is triggered
/// against that URL, and the URL is revoked afterwards.
pub trait DownloadTarget {
    /// Stage `blob` and return a temporary reference to it.
    fn create_object_url(&self, blob: SpecBlob) -> Result<String, ExportError>;

    /// Offer the staged blob to the user as `file_name`.
    fn trigger_download(&self, url: &str, file_name: &str) -> Result<(), ExportError>;

    /// Release a temporary reference.
    fn revoke_object_url(&self, url: &str);
}

/// Stage, trigger and release. The reference is revoked even when the
/// trigger fails.
pub fn deliver_blob<D>(target: &D, blob: SpecBlob, file_name: &str) -> Result<(), ExportError>
where
    D: DownloadTarget + ?Sized,
{
    let url = target.create_object_url(blob)?;
    let result = target.trigger_download(&url, file_name);
    target.revoke_object_url(&url);
    result
}

////////////////////////////////////////////////////////////////////////////////
// #region StagedBlobs

#[derive(Debug, Default)]
struct StagedBlobs {
    dict_blobs: RefCell<BTreeMap<String, SpecBlob>>,
    n_seq: Cell<usize>,
}

impl StagedBlobs {
    fn stage(&self, blob: SpecBlob) -> String {
        let n_seq = self.n_seq.get() + 1;
        self.n_seq.set(n_seq);
        let url = format!("blob:exportkit/{n_seq}");
        self.dict_blobs.borrow_mut().insert(url.clone(), blob);
        url
    }

    fn get(&self, url: &str) -> Result<SpecBlob, ExportError> {
        self.dict_blobs
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| ExportError::Delivery(format!("unknown or revoked object URL: {url}")))
    }

    fn revoke(&self, url: &str) -> bool {
        self.dict_blobs.borrow_mut().remove(url).is_some()
    }

    fn len(&self) -> usize {
        self.dict_blobs.borrow().len()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DirectoryTarget

/// Delivers downloads as files inside a directory.
#[derive(Debug)]
pub struct DirectoryDownloadTarget {
    dir_out: PathBuf,
    staged: StagedBlobs,
}

impl DirectoryDownloadTarget {
    /// Target writing into `dir_out`, which must exist.
    pub fn new(dir_out: impl Into<PathBuf>) -> Self {
        Self {
            dir_out: dir_out.into(),
            staged: StagedBlobs::default(),
        }
    }

    /// Object URLs created and not yet revoked.
    pub fn n_staged(&self) -> usize {
        self.staged.len()
    }
}

impl DownloadTarget for DirectoryDownloadTarget {
    fn create_object_url(&self, blob: SpecBlob) -> Result<String, ExportError> {
        Ok(self.staged.stage(blob))
    }

    fn trigger_download(&self, url: &str, file_name: &str) -> Result<(), ExportError> {
        validate_file_name(file_name)?;
        let blob = self.staged.get(url)?;
        let path_file_out = self.dir_out.join(file_name);
        std::fs::write(&path_file_out, &blob.v_bytes).map_err(|err| {
            ExportError::Delivery(format!(
                "failed to write {}: {err}",
                path_file_out.display()
            ))
        })
    }

    fn revoke_object_url(&self, url: &str) {
        self.staged.revoke(url);
    }
}

fn validate_file_name(file_name: &str) -> Result<(), ExportError> {
    if file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(['/', '\\'])
    {
        return Err(ExportError::Delivery(format!(
            "file name must be a plain file name: {file_name:?}"
        )));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MemoryTarget

/// One captured download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDownload {
    pub file_name: String,
    pub mime: String,
    pub v_bytes: Vec<u8>,
}

/// Keeps downloads in memory; used by hosts without a file system and by tests.
#[derive(Debug, Default)]
pub struct MemoryDownloadTarget {
    staged: StagedBlobs,
    l_downloads: RefCell<Vec<SpecDownload>>,
    n_revoked: Cell<usize>,
    if_fail_trigger: bool,
}

impl MemoryDownloadTarget {
    /// Empty target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Target whose every trigger fails.
    pub fn failing() -> Self {
        Self {
            if_fail_trigger: true,
            ..Self::default()
        }
    }

    /// Downloads triggered so far.
    pub fn downloads(&self) -> Vec<SpecDownload> {
        self.l_downloads.borrow().clone()
    }

    /// Number of revoked object URLs.
    pub fn n_revoked(&self) -> usize {
        self.n_revoked.get()
    }

    /// Object URLs created and not yet revoked.
    pub fn n_staged(&self) -> usize {
        self.staged.len()
    }
}

impl DownloadTarget for MemoryDownloadTarget {
    fn create_object_url(&self, blob: SpecBlob) -> Result<String, ExportError> {
        Ok(self.staged.stage(blob))
    }

    fn trigger_download(&self, url: &str, file_name: &str) -> Result<(), ExportError> {
        if self.if_fail_trigger {
            return Err(ExportError::Delivery("download trigger rejected".to_string()));
        }
        let blob = self.staged.get(url)?;
        self.l_downloads.borrow_mut().push(SpecDownload {
            file_name: file_name.to_string(),
            mime: blob.mime,
            v_bytes: blob.v_bytes,
        });
        Ok(())
    }

    fn revoke_object_url(&self, url: &str) {
        if self.staged.revoke(url) {
            self.n_revoked.set(self.n_revoked.get() + 1);
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
