//! Sequential batch matching with progress and cancellation.

use super::{BatchResults, BatchSearchState};
use crate::core::matcher::{
    FileSource, FuzzyMatcher, MatchCandidate, WalkConfig, WalkDirSource, DEFAULT_THRESHOLD,
};
use crate::events::{null_sender, Event, EventSender, MatchEvent, MatchProgress};
use std::path::PathBuf;
use tracing::{error, info};

/// How a drive over a [`BatchSearchState`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every target was searched
    Completed,
    /// `is_cancelled` returned true before a target; results were discarded
    Cancelled,
}

/// Configuration for a batch run
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory tree to search
    pub root: PathBuf,
    /// Minimum score to accept a match (0-100)
    pub threshold: u8,
    /// Directory walk options
    pub walk: WalkConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            threshold: DEFAULT_THRESHOLD,
            walk: WalkConfig::default(),
        }
    }
}

/// Builder for [`BatchMatcher`]
pub struct BatchMatcherBuilder {
    config: BatchConfig,
}

impl BatchMatcherBuilder {
    pub fn new() -> Self {
        Self {
            config: BatchConfig::default(),
        }
    }

    /// Set the search root
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Set the acceptance threshold, clamped to 100
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.threshold = threshold.min(100);
        self
    }

    /// Set walk options
    pub fn walk_config(mut self, walk: WalkConfig) -> Self {
        self.config.walk = walk;
        self
    }

    /// Build a matcher that walks the real filesystem
    pub fn build(self) -> BatchMatcher {
        let matcher = FuzzyMatcher::new(self.config.walk.clone());
        BatchMatcher {
            config: self.config,
            matcher,
        }
    }

    /// Build a matcher over a custom file source
    pub fn build_with_source<S: FileSource>(self, source: S) -> BatchMatcher<S> {
        BatchMatcher {
            config: self.config,
            matcher: FuzzyMatcher::with_source(source),
        }
    }
}

impl Default for BatchMatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the fuzzy matcher over an ordered list of target names, one at a
/// time.
///
/// Cancellation is checked once per target, right before its walk starts.
/// A walk in progress is never interrupted.
pub struct BatchMatcher<S = WalkDirSource> {
    config: BatchConfig,
    matcher: FuzzyMatcher<S>,
}

impl BatchMatcher<WalkDirSource> {
    pub fn builder() -> BatchMatcherBuilder {
        BatchMatcherBuilder::new()
    }
}

impl<S: FileSource> BatchMatcher<S> {
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// A fresh state for `targets` using this matcher's root and threshold
    pub fn new_state(&self, targets: Vec<String>) -> BatchSearchState {
        BatchSearchState::new(self.config.root.clone(), targets, self.config.threshold)
    }

    /// Run a batch. Returns `None` if cancelled.
    pub fn run<P, C>(&self, targets: &[String], on_progress: P, is_cancelled: C) -> Option<BatchResults>
    where
        P: FnMut(f64),
        C: FnMut() -> bool,
    {
        self.run_with_events(targets, on_progress, is_cancelled, &null_sender())
    }

    /// Run a batch with event reporting. Returns `None` if cancelled.
    pub fn run_with_events<P, C>(
        &self,
        targets: &[String],
        on_progress: P,
        is_cancelled: C,
        events: &EventSender,
    ) -> Option<BatchResults>
    where
        P: FnMut(f64),
        C: FnMut() -> bool,
    {
        let mut state = self.new_state(targets.to_vec());
        match self.drive(&mut state, on_progress, is_cancelled, events) {
            BatchStatus::Completed => state.into_results(),
            BatchStatus::Cancelled => None,
        }
    }

    /// Drive an existing state to completion or cancellation.
    ///
    /// `on_progress` is called once per finished target with
    /// `(index + 1) / total`; the last call of a completed run is exactly
    /// `1.0`. On cancellation the state's results are cleared and
    /// `cancelled` is set.
    pub fn drive<P, C>(
        &self,
        state: &mut BatchSearchState,
        mut on_progress: P,
        mut is_cancelled: C,
        events: &EventSender,
    ) -> BatchStatus
    where
        P: FnMut(f64),
        C: FnMut() -> bool,
    {
        let total = state.targets.len();

        events.send(Event::Match(MatchEvent::Started {
            run_id: state.run_id.to_string(),
            root: state.root.clone(),
            total_targets: total,
        }));

        for index in 0..total {
            if state.cancelled || is_cancelled() {
                info!("Fuzzy search cancelled after {} of {} targets", index, total);
                state.cancelled = true;
                state.results.clear();
                events.send(Event::Match(MatchEvent::Cancelled { completed: index }));
                return BatchStatus::Cancelled;
            }

            let target = state.targets[index].clone();
            info!("Searching for match to '{}' ({}/{})", target, index + 1, total);

            let candidate = match self
                .matcher
                .try_find_best_match(&state.root, &target, state.threshold)
            {
                Ok(candidate) => candidate,
                Err(e) => {
                    error!("Error in fuzzy search for '{}': {}", target, e);
                    events.send(Event::Match(MatchEvent::Error {
                        target: target.clone(),
                        message: e.to_string(),
                    }));
                    MatchCandidate::miss(target.clone(), 0)
                }
            };

            match &candidate.best_path {
                Some(path) => {
                    info!(
                        "Found match for '{}': {} ({}% match)",
                        target,
                        path.display(),
                        candidate.score
                    );
                    events.send(Event::Match(MatchEvent::Matched {
                        target: target.clone(),
                        path: path.clone(),
                        score: candidate.score,
                    }));
                }
                None => {
                    info!(
                        "No match found for '{}' meeting {}% threshold (best {}%)",
                        target, state.threshold, candidate.score
                    );
                    events.send(Event::Match(MatchEvent::Missed {
                        target: target.clone(),
                        best_score: candidate.score,
                    }));
                }
            }

            state.results.insert(candidate);

            let completed = index + 1;
            let fraction = completed as f64 / total as f64;
            state.progress = fraction;
            events.send(Event::Match(MatchEvent::Progress(MatchProgress {
                completed,
                total,
                fraction,
                target,
            })));
            on_progress(fraction);
        }

        events.send(Event::Match(MatchEvent::Completed {
            matched: state.results.matched_count(),
            missed: state.results.len() - state.results.matched_count(),
        }));

        BatchStatus::Completed
    }
}
