//! # Reporter Module
//!
//! Turns batch results into something a person or a spreadsheet can read.
//!
//! Match results go out as CSV (`target,matched_path,score,accepted`) or as a
//! JSON [`MatchReport`]; derivative and upload results have CSV exporters of
//! their own.

mod export;

pub use export::{
    escape as escape_csv_field, export_derivatives_csv, export_matches_csv, export_uploads_csv,
};

use crate::core::batch::BatchResults;
use crate::core::matcher::MatchCandidate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Serializable summary of one batch match run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub generated_at: DateTime<Utc>,
    pub root: PathBuf,
    pub threshold: u8,
    pub matched: usize,
    pub missed: usize,
    pub results: Vec<MatchCandidate>,
}

impl MatchReport {
    pub fn new(root: impl Into<PathBuf>, threshold: u8, results: &BatchResults) -> Self {
        let matched = results.matched_count();
        Self {
            generated_at: Utc::now(),
            root: root.into(),
            threshold,
            matched,
            missed: results.len() - matched,
            results: results.iter().cloned().collect(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// One line for humans, e.g. "3 of 4 targets matched at >= 90%"
    pub fn summary(&self) -> String {
        format!(
            "{} of {} targets matched at >= {}%",
            self.matched,
            self.matched + self.missed,
            self.threshold
        )
    }
}
