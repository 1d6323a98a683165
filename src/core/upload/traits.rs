//! Blob store trait definition.

use super::Container;
use crate::error::UploadError;

/// Trait for blob store backends
pub trait BlobStore: Send + Sync {
    /// Whether a blob is already stored under `key`
    fn exists(&self, container: Container, key: &str) -> Result<bool, UploadError>;

    /// Store `bytes` under `key`, replacing anything there
    fn upload(&self, container: Container, key: &str, bytes: &[u8]) -> Result<(), UploadError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

impl<S: BlobStore + ?Sized> BlobStore for &S {
    fn exists(&self, container: Container, key: &str) -> Result<bool, UploadError> {
        (**self).exists(container, key)
    }

    fn upload(&self, container: Container, key: &str, bytes: &[u8]) -> Result<(), UploadError> {
        (**self).upload(container, key, bytes)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<S: BlobStore + ?Sized> BlobStore for Box<S> {
    fn exists(&self, container: Container, key: &str) -> Result<bool, UploadError> {
        (**self).exists(container, key)
    }

    fn upload(&self, container: Container, key: &str, bytes: &[u8]) -> Result<(), UploadError> {
        (**self).upload(container, key, bytes)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
