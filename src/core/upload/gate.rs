//! Exists-then-copy upload gate.

use super::{blob_key_for, BlobStore, Container, UploadOutcome};
use crate::error::UploadError;
use crate::events::{null_sender, Event, EventSender, UploadEvent};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// One attempted upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub local_path: PathBuf,
    pub container: Container,
    pub key: String,
    pub outcome: UploadOutcome,
    pub error: Option<String>,
}

/// Tallies for an upload batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReport {
    pub exists: usize,
    pub copied: usize,
    pub failed: usize,
    pub records: Vec<UploadRecord>,
}

impl UploadReport {
    fn record(&mut self, record: UploadRecord) {
        match record.outcome {
            UploadOutcome::Exists => self.exists += 1,
            UploadOutcome::Copied => self.copied += 1,
            UploadOutcome::Failed => self.failed += 1,
        }
        self.records.push(record);
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }
}

/// Uploads local files to a [`BlobStore`] without overwriting
pub struct UploadGate<S> {
    store: S,
}

impl<S: BlobStore> UploadGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upload `local_path` as `container/key` unless that blob exists.
    ///
    /// Errors are logged with key and container and reported as
    /// [`UploadOutcome::Failed`].
    pub fn upload(&self, local_path: &Path, container: Container, key: &str) -> UploadOutcome {
        match self.try_upload(local_path, container, key) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Upload of '{}' to '{}' failed: {}", key, container, e);
                UploadOutcome::Failed
            }
        }
    }

    /// Like [`upload`](Self::upload) but hands back the error
    pub fn try_upload(
        &self,
        local_path: &Path,
        container: Container,
        key: &str,
    ) -> Result<UploadOutcome, UploadError> {
        if self.store.exists(container, key)? {
            info!("Blob '{}' already exists in '{}'", key, container);
            return Ok(UploadOutcome::Exists);
        }

        let bytes = fs::read(local_path).map_err(|source| UploadError::ReadLocal {
            path: local_path.to_path_buf(),
            source,
        })?;
        self.store.upload(container, key, &bytes)?;

        info!(
            "Copied '{}' to '{}/{}' ({} bytes)",
            local_path.display(),
            container,
            key,
            bytes.len()
        );
        Ok(UploadOutcome::Copied)
    }

    /// Upload a batch of `(file, container)` pairs, keyed by file name
    pub fn upload_batch(&self, items: &[(PathBuf, Container)]) -> UploadReport {
        self.upload_batch_with_events(items, &null_sender())
    }

    /// Upload a batch with event reporting. Every item is attempted.
    pub fn upload_batch_with_events(
        &self,
        items: &[(PathBuf, Container)],
        events: &EventSender,
    ) -> UploadReport {
        let mut report = UploadReport::default();
        events.send(Event::Upload(UploadEvent::Started { total: items.len() }));

        for (local_path, container) in items {
            let container = *container;
            let key = blob_key_for(local_path).unwrap_or_default();

            let attempt = if key.is_empty() {
                Err(UploadError::Store {
                    container: container.to_string(),
                    key: key.clone(),
                    reason: format!("'{}' has no file name", local_path.display()),
                })
            } else {
                self.try_upload(local_path, container, &key)
            };

            let (outcome, error_message) = match attempt {
                Ok(outcome) => (outcome, None),
                Err(e) => {
                    error!("Upload of '{}' to '{}' failed: {}", key, container, e);
                    (UploadOutcome::Failed, Some(e.to_string()))
                }
            };

            let event = match outcome {
                UploadOutcome::Exists => UploadEvent::Exists {
                    container: container.to_string(),
                    key: key.clone(),
                },
                UploadOutcome::Copied => UploadEvent::Copied {
                    container: container.to_string(),
                    key: key.clone(),
                },
                UploadOutcome::Failed => UploadEvent::Failed {
                    container: container.to_string(),
                    key: key.clone(),
                    message: error_message.clone().unwrap_or_default(),
                },
            };
            events.send(Event::Upload(event));

            report.record(UploadRecord {
                local_path: local_path.clone(),
                container,
                key,
                outcome,
                error: error_message,
            });
        }

        info!(
            "Uploads via {}: {} copied, {} already present, {} failed",
            self.store.name(),
            report.copied,
            report.exists,
            report.failed
        );
        events.send(Event::Upload(UploadEvent::Completed {
            exists: report.exists,
            copied: report.copied,
            failed: report.failed,
        }));

        report
    }
}
