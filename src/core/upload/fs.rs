//! Blob store backed by a local directory tree.

use super::{BlobStore, Container};
use crate::error::UploadError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores blobs as `{root}/{container}/{key}`
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where a blob lives on disk
    pub fn blob_path(&self, container: Container, key: &str) -> Result<PathBuf, UploadError> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains('/')
            || key.contains('\\')
        {
            return Err(store_error(container, key, "invalid blob key".to_string()));
        }
        Ok(self.root.join(container.as_str()).join(key))
    }
}

fn store_error(container: Container, key: &str, reason: String) -> UploadError {
    UploadError::Store {
        container: container.to_string(),
        key: key.to_string(),
        reason,
    }
}

impl BlobStore for FsBlobStore {
    fn exists(&self, container: Container, key: &str) -> Result<bool, UploadError> {
        let path = self.blob_path(container, key)?;
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(store_error(container, key, e.to_string())),
        }
    }

    fn upload(&self, container: Container, key: &str, bytes: &[u8]) -> Result<(), UploadError> {
        let path = self.blob_path(container, key)?;
        let dir = self.root.join(container.as_str());
        fs::create_dir_all(&dir).map_err(|e| store_error(container, key, e.to_string()))?;

        // Readers never see a partial blob
        let partial = dir.join(format!(".{}.partial", key));
        fs::write(&partial, bytes).map_err(|e| store_error(container, key, e.to_string()))?;
        fs::rename(&partial, &path).map_err(|e| {
            let _ = fs::remove_file(&partial);
            store_error(container, key, e.to_string())
        })
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
