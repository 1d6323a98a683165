//! # Matcher Module
//!
//! Finds the file under a search root whose name best matches a target name.
//!
//! Every file under the root is scored with
//! [`score`](crate::core::similarity::score) after lower-casing both names.
//! The best score wins; the first file to reach a score keeps it on ties. A
//! perfect 100 stops the walk immediately, which matters on large trees.
//!
//! ## Example
//! ```rust,ignore
//! use digital_ingest::core::matcher::find_best_match;
//!
//! let (path, score) = find_best_match("/Volumes/scans".as_ref(), "photo1.jpg", 90);
//! ```

mod walker;

pub use walker::{WalkConfig, WalkDirSource};

use crate::core::similarity::score;
use crate::error::MatchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Default acceptance threshold, in percent
pub const DEFAULT_THRESHOLD: u8 = 90;

/// The outcome of searching for one target name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// The name that was searched for
    pub target_name: String,
    /// The matched file, present only when `score` reached the threshold
    pub best_path: Option<PathBuf>,
    /// Best score seen, reported even when below the threshold
    pub score: u8,
}

impl MatchCandidate {
    /// A candidate with no accepted path
    pub fn miss(target_name: impl Into<String>, score: u8) -> Self {
        Self {
            target_name: target_name.into(),
            best_path: None,
            score,
        }
    }

    /// Whether a file was accepted for this target
    pub fn is_match(&self) -> bool {
        self.best_path.is_some()
    }

    /// `(path, score)` pair as handed to front ends
    pub fn as_pair(&self) -> (Option<PathBuf>, u8) {
        (self.best_path.clone(), self.score)
    }
}

/// Something that can enumerate the files under a root.
///
/// The default is [`WalkDirSource`]; tests plug in their own to observe how
/// far the matcher walks.
pub trait FileSource {
    /// Every file under `root`, in visiting order. Errors are yielded inline.
    fn files<'a>(
        &'a self,
        root: &Path,
    ) -> Box<dyn Iterator<Item = Result<PathBuf, MatchError>> + 'a>;
}

/// Fuzzy filename matcher over a [`FileSource`]
#[derive(Debug, Clone, Default)]
pub struct FuzzyMatcher<S = WalkDirSource> {
    source: S,
}

impl FuzzyMatcher<WalkDirSource> {
    /// Matcher that walks the real filesystem
    pub fn new(config: WalkConfig) -> Self {
        Self {
            source: WalkDirSource::new(config),
        }
    }
}

impl<S: FileSource> FuzzyMatcher<S> {
    /// Matcher over a custom file source
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Find the best match for `target_name`, propagating walk errors.
    pub fn try_find_best_match(
        &self,
        root: &Path,
        target_name: &str,
        threshold: u8,
    ) -> Result<MatchCandidate, MatchError> {
        let target = target_name.to_lowercase();
        let mut best_path: Option<PathBuf> = None;
        let mut best_score = 0u8;

        for entry in self.source.files(root) {
            let path = entry?;
            let Some(name) = path.file_name() else {
                continue;
            };

            let ratio = score(&name.to_string_lossy().to_lowercase(), &target);
            if ratio > best_score {
                best_score = ratio;
                best_path = Some(path);

                if ratio == 100 {
                    debug!(target = target_name, "perfect match, stopping walk");
                    break;
                }
            }
        }

        Ok(MatchCandidate {
            target_name: target_name.to_string(),
            best_path: best_path.filter(|_| best_score >= threshold),
            score: best_score,
        })
    }

    /// Find the best match for `target_name`.
    ///
    /// Walk errors are logged and reported as a miss with score 0.
    pub fn find_best_match(&self, root: &Path, target_name: &str, threshold: u8) -> MatchCandidate {
        self.try_find_best_match(root, target_name, threshold)
            .unwrap_or_else(|e| {
                error!("Error in fuzzy search for '{}': {}", target_name, e);
                MatchCandidate::miss(target_name, 0)
            })
    }
}

/// Search `root` for the file that best matches `target_name`.
///
/// Returns `(Some(path), score)` when the best score reaches `threshold`,
/// otherwise `(None, best_score)`. I/O errors yield `(None, 0)`.
pub fn find_best_match(root: &Path, target_name: &str, threshold: u8) -> (Option<PathBuf>, u8) {
    FuzzyMatcher::new(WalkConfig::default())
        .find_best_match(root, target_name, threshold)
        .as_pair()
}
