//! In-memory blob store for testing.

use super::{BlobStore, Container};
use crate::error::UploadError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// In-memory blob store
///
/// Useful for tests and dry runs. Counts every write.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<(Container, String), Vec<u8>>>,
    writes: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of `upload` calls that reached the store
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Stored bytes, if any
    pub fn get(&self, container: Container, key: &str) -> Option<Vec<u8>> {
        self.blobs
            .read()
            .ok()?
            .get(&(container, key.to_string()))
            .cloned()
    }

    /// Keys stored in `container`, sorted
    pub fn keys(&self, container: Container) -> Vec<String> {
        let mut keys: Vec<String> = self
            .blobs
            .read()
            .map(|blobs| {
                blobs
                    .keys()
                    .filter(|(c, _)| *c == container)
                    .map(|(_, k)| k.clone())
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned(container: Container, key: &str) -> UploadError {
        UploadError::Store {
            container: container.to_string(),
            key: key.to_string(),
            reason: "in-memory store lock poisoned".to_string(),
        }
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn exists(&self, container: Container, key: &str) -> Result<bool, UploadError> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| Self::poisoned(container, key))?;
        Ok(blobs.contains_key(&(container, key.to_string())))
    }

    fn upload(&self, container: Container, key: &str, bytes: &[u8]) -> Result<(), UploadError> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| Self::poisoned(container, key))?;
        blobs.insert((container, key.to_string()), bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_then_exists() {
        let store = InMemoryBlobStore::new();

        assert!(!store.exists(Container::Objs, "a.tif").unwrap());
        store.upload(Container::Objs, "a.tif", b"pixels").unwrap();

        assert!(store.exists(Container::Objs, "a.tif").unwrap());
        assert_eq!(store.get(Container::Objs, "a.tif"), Some(b"pixels".to_vec()));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn containers_are_separate() {
        let store = InMemoryBlobStore::new();
        store.upload(Container::Thumbs, "a_TN.jpg", b"x").unwrap();

        assert!(!store.exists(Container::Smalls, "a_TN.jpg").unwrap());
        assert_eq!(store.keys(Container::Thumbs), vec!["a_TN.jpg".to_string()]);
        assert!(store.keys(Container::Objs).is_empty());
    }
}
