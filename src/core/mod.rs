//! # Core Module
//!
//! The GUI-agnostic ingest engine.
//!
//! ## Modules
//! - `similarity` - Scores how alike two filenames are
//! - `matcher` - Finds the best-matching file under a root
//! - `batch` - Matches many targets with progress and cancellation
//! - `derivative` - Creates thumbnails and smalls
//! - `upload` - Copies artifacts to a blob store without overwriting
//! - `reporter` - CSV and JSON output
//! - `pipeline` - Orchestrates the full workflow

pub mod batch;
pub mod derivative;
pub mod matcher;
pub mod pipeline;
pub mod reporter;
pub mod similarity;
pub mod upload;

// Re-export commonly used types
pub use batch::{BatchResults, BatchSearchState};
pub use derivative::{DerivativeKind, DerivativeResult, DerivativeSpec, ProcessingMode};
pub use matcher::MatchCandidate;
pub use similarity::score;
pub use upload::{Container, UploadOutcome};
