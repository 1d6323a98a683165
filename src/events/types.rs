//! Event type definitions for progress reporting.

use crate::core::derivative::DerivativeKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the ingest pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Fuzzy match batch events
    Match(MatchEvent),
    /// Derivative generation events
    Derivative(DerivativeEvent),
    /// Upload gate events
    Upload(UploadEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during a batch match run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// A batch run has started
    Started {
        run_id: String,
        root: PathBuf,
        total_targets: usize,
    },
    /// One target finished (hit or miss)
    Progress(MatchProgress),
    /// A target resolved to a file at or above the threshold
    Matched {
        target: String,
        path: PathBuf,
        score: u8,
    },
    /// No file reached the threshold; the closest score is reported
    Missed { target: String, best_score: u8 },
    /// The walk failed for this target; it is treated as a miss
    Error { target: String, message: String },
    /// The caller cancelled the run before `completed` targets were searched
    Cancelled { completed: usize },
    /// The run finished every target
    Completed { matched: usize, missed: usize },
}

/// Progress information during a batch match run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchProgress {
    /// Targets searched so far
    pub completed: usize,
    /// Total targets in this run
    pub total: usize,
    /// `completed / total`
    pub fraction: f64,
    /// The target that just finished
    pub target: String,
}

/// Events during derivative generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DerivativeEvent {
    /// Generation started; `total` counts (source, kind) pairs
    Started { total: usize },
    /// A derivative was written
    Created {
        source: PathBuf,
        output: PathBuf,
        kind: DerivativeKind,
    },
    /// A derivative could not be created; the batch continues
    Failed {
        source: PathBuf,
        kind: DerivativeKind,
        message: String,
    },
    /// A post-pass rename happened
    Renamed { from: PathBuf, to: PathBuf },
    /// Generation finished
    Completed { created: usize, failed: usize },
}

/// Events from the upload gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UploadEvent {
    /// A batch of `total` uploads started
    Started { total: usize },
    /// The blob already existed; nothing was written
    Exists { container: String, key: String },
    /// The local file was copied into the store
    Copied { container: String, key: String },
    /// The existence check or transfer failed
    Failed {
        container: String,
        key: String,
        message: String,
    },
    /// All uploads in the batch were attempted
    Completed {
        exists: usize,
        copied: usize,
        failed: usize,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled during matching
    Cancelled,
}

/// Phases of the ingest pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Matching,
    Deriving,
    Renaming,
    Uploading,
}

/// Summary of an ingest run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub targets: usize,
    pub matched: usize,
    pub derivatives_created: usize,
    pub derivatives_failed: usize,
    pub uploads_copied: usize,
    pub uploads_existing: usize,
    pub uploads_failed: usize,
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Matching => write!(f, "Matching"),
            PipelinePhase::Deriving => write!(f, "Creating derivatives"),
            PipelinePhase::Renaming => write!(f, "Renaming"),
            PipelinePhase::Uploading => write!(f, "Uploading"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_progress_round_trips_through_json() {
        let event = Event::Match(MatchEvent::Progress(MatchProgress {
            completed: 3,
            total: 4,
            fraction: 0.75,
            target: "grinnell_1234.tif".to_string(),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Match(MatchEvent::Progress(p)) => {
                assert_eq!(p.completed, 3);
                assert_eq!(p.target, "grinnell_1234.tif");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn derivative_event_carries_kind() {
        let event = Event::Derivative(DerivativeEvent::Created {
            source: PathBuf::from("/objs/a.tif"),
            output: PathBuf::from("/objs/a_TN.jpg"),
            kind: DerivativeKind::Thumbnail,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Thumbnail"));
        assert!(json.contains("a_TN.jpg"));
    }

    #[test]
    fn phase_display_is_human_readable() {
        assert_eq!(PipelinePhase::Deriving.to_string(), "Creating derivatives");
    }
}
