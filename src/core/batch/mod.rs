//! # Batch Module
//!
//! Resolves an ordered list of target filenames against one search root.
//!
//! Targets are searched sequentially, one whole-tree walk at a time. After
//! each target the driver reports `(index + 1) / total` through an injected
//! `on_progress` callback, and before each target it asks an injected
//! `is_cancelled` callback whether to stop. A cancelled run returns `None`,
//! which callers must tell apart from an empty result set.
//!
//! ## Example
//! ```rust,ignore
//! use digital_ingest::core::batch::run_batch;
//!
//! let results = run_batch(root, &targets, 90, |p| bar.set(p), || token.is_cancelled());
//! match results {
//!     None => println!("cancelled"),
//!     Some(map) => println!("{} targets resolved", map.len()),
//! }
//! ```

mod driver;
mod session;

pub use driver::{BatchConfig, BatchMatcher, BatchMatcherBuilder, BatchStatus};
pub use session::{CancellationToken, SearchGuard, SearchSession};

use crate::core::matcher::MatchCandidate;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Mutable state of one batch run.
///
/// Owned by the caller and lent to [`BatchMatcher::drive`]. `cancelled` is
/// set by the driver when it observes cancellation and is never cleared;
/// start a new run with a new state.
#[derive(Debug, Clone)]
pub struct BatchSearchState {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    targets: Vec<String>,
    root: PathBuf,
    threshold: u8,
    progress: f64,
    cancelled: bool,
    results: BatchResults,
}

impl BatchSearchState {
    pub fn new(root: impl Into<PathBuf>, targets: Vec<String>, threshold: u8) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            targets,
            root: root.into(),
            threshold: threshold.min(100),
            progress: 0.0,
            cancelled: false,
            results: BatchResults::default(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Fraction of targets searched, 0.0 to 1.0
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Results so far. Empty after a cancellation.
    pub fn results(&self) -> &BatchResults {
        &self.results
    }

    /// The finished results, or `None` if the run was cancelled
    pub fn into_results(self) -> Option<BatchResults> {
        if self.cancelled {
            None
        } else {
            Some(self.results)
        }
    }
}

/// Match results keyed by target name, iterated in input order.
///
/// A target listed twice keeps a single entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResults {
    candidates: Vec<MatchCandidate>,
    index: HashMap<String, usize>,
}

impl BatchResults {
    /// Insert or replace the entry for `candidate.target_name`
    pub fn insert(&mut self, candidate: MatchCandidate) {
        match self.index.get(&candidate.target_name) {
            Some(&i) => self.candidates[i] = candidate,
            None => {
                self.index
                    .insert(candidate.target_name.clone(), self.candidates.len());
                self.candidates.push(candidate);
            }
        }
    }

    pub fn get(&self, target_name: &str) -> Option<&MatchCandidate> {
        self.index.get(target_name).map(|&i| &self.candidates[i])
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
        self.index.clear();
    }

    /// Candidates in input order
    pub fn iter(&self) -> impl Iterator<Item = &MatchCandidate> {
        self.candidates.iter()
    }

    /// Number of targets with an accepted path
    pub fn matched_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.is_match()).count()
    }

    /// Accepted paths in input order
    pub fn matched_paths(&self) -> Vec<PathBuf> {
        self.candidates
            .iter()
            .filter_map(|c| c.best_path.clone())
            .collect()
    }

    /// `target -> (path, score)` as handed to front ends
    pub fn into_map(self) -> HashMap<String, (Option<PathBuf>, u8)> {
        self.candidates
            .into_iter()
            .map(|c| (c.target_name, (c.best_path, c.score)))
            .collect()
    }
}

/// Search `root` for every name in `targets`, in order.
///
/// Returns `None` when `is_cancelled` reports true before any target;
/// otherwise a map from each target to `(matched path, score)`.
pub fn run_batch<P, C>(
    root: &Path,
    targets: &[String],
    threshold: u8,
    on_progress: P,
    is_cancelled: C,
) -> Option<HashMap<String, (Option<PathBuf>, u8)>>
where
    P: FnMut(f64),
    C: FnMut() -> bool,
{
    BatchMatcher::builder()
        .root(root)
        .threshold(threshold)
        .build()
        .run(targets, on_progress, is_cancelled)
        .map(BatchResults::into_map)
}
