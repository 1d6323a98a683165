//! # Upload Module
//!
//! Copies originals and derivatives into a blob store without ever
//! overwriting what is already there.
//!
//! Every upload asks the store whether `(container, key)` exists first. An
//! existing blob is reported as [`UploadOutcome::Exists`] and left alone;
//! otherwise the local file is read and written, giving
//! [`UploadOutcome::Copied`]. Any error along the way is
//! [`UploadOutcome::Failed`] for that file only.
//!
//! ## Containers
//! | Artifact    | Container     |
//! |-------------|---------------|
//! | original    | `objs`        |
//! | thumbnail   | `thumbs`      |
//! | small       | `smalls`      |
//! | transcript  | `transcripts` |

mod fs;
mod gate;
mod memory;
mod traits;

pub use fs::FsBlobStore;
pub use gate::{UploadGate, UploadRecord, UploadReport};
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;

use crate::core::derivative::{DerivativeKind, CLIENT_THUMB_SUFFIX};
use crate::error::UploadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A blob store container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Objs,
    Thumbs,
    Smalls,
    Transcripts,
}

impl Container {
    pub const ALL: [Container; 4] = [
        Container::Objs,
        Container::Thumbs,
        Container::Smalls,
        Container::Transcripts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Container::Objs => "objs",
            Container::Thumbs => "thumbs",
            Container::Smalls => "smalls",
            Container::Transcripts => "transcripts",
        }
    }

    /// Container a derivative of `kind` belongs in
    pub fn for_derivative(kind: DerivativeKind) -> Self {
        match kind {
            DerivativeKind::Thumbnail => Container::Thumbs,
            DerivativeKind::Small => Container::Smalls,
        }
    }

    /// Guess the container from an artifact's file name.
    ///
    /// `_TN.` and `.clientThumb` are thumbnails, `_SMALL.` and the older
    /// `_JPG.` are smalls, everything else is an original. Transcripts are
    /// never inferred.
    pub fn infer_from_name(name: &str) -> Self {
        if name.contains("_TN.") || name.ends_with(CLIENT_THUMB_SUFFIX) {
            Container::Thumbs
        } else if name.contains("_SMALL.") || name.contains("_JPG.") {
            Container::Smalls
        } else {
            Container::Objs
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Container {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Container::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UploadError::UnknownContainer {
                name: s.to_string(),
            })
    }
}

/// Result of one gated upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadOutcome {
    /// Already in the store; nothing written
    Exists,
    /// Written to the store
    Copied,
    /// Existence check, read or transfer failed
    Failed,
}

impl fmt::Display for UploadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadOutcome::Exists => "EXISTS",
            UploadOutcome::Copied => "COPIED",
            UploadOutcome::Failed => "FAILED",
        })
    }
}

/// Blob key for a local artifact: its file name
pub fn blob_key_for(path: &Path) -> Option<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}

/// Public URL of a blob, `{base}/{container}/{key}`
pub fn blob_url(base: &str, container: Container, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), container, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_names() {
        assert_eq!(Container::Objs.as_str(), "objs");
        assert_eq!("Thumbs".parse::<Container>().unwrap(), Container::Thumbs);
        assert!(matches!(
            "archive".parse::<Container>(),
            Err(UploadError::UnknownContainer { .. })
        ));
    }

    #[test]
    fn container_for_derivatives() {
        assert_eq!(Container::for_derivative(DerivativeKind::Thumbnail), Container::Thumbs);
        assert_eq!(Container::for_derivative(DerivativeKind::Small), Container::Smalls);
    }

    #[test]
    fn container_inferred_from_name() {
        assert_eq!(Container::infer_from_name("a_TN.jpg"), Container::Thumbs);
        assert_eq!(Container::infer_from_name("a.jpg.clientThumb"), Container::Thumbs);
        assert_eq!(Container::infer_from_name("a_SMALL.jpg"), Container::Smalls);
        assert_eq!(Container::infer_from_name("a_JPG.jpg"), Container::Smalls);
        assert_eq!(Container::infer_from_name("a.tif"), Container::Objs);
    }

    #[test]
    fn key_is_file_name() {
        assert_eq!(
            blob_key_for(Path::new("/ingest/TN/a_TN.jpg")),
            Some("a_TN.jpg".to_string())
        );
        assert_eq!(blob_key_for(Path::new("/")), None);
    }

    #[test]
    fn url_joins_parts() {
        assert_eq!(
            blob_url("https://store.example.net/", Container::Smalls, "a_SMALL.jpg"),
            "https://store.example.net/smalls/a_SMALL.jpg"
        );
    }

    #[test]
    fn container_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Container::Transcripts).unwrap(), "\"transcripts\"");
    }
}
