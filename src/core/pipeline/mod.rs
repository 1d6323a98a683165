//! # Pipeline Module
//!
//! Orchestrates a full ingest.
//!
//! ## Pipeline Stages
//! 1. **Match** - Resolve spreadsheet filenames to files under the root
//! 2. **Derive** - Create thumbnails (and smalls) for the matched files
//! 3. **Rename** - Alma only: `_TN.jpg` becomes `.jpg.clientThumb`
//! 4. **Upload** - Copy originals and derivatives to the blob store, if one
//!    is configured
//!
//! Every stage is sequential. Cancellation is only observed while matching.

mod executor;

pub use executor::{IngestPipeline, PipelineBuilder, PipelineConfig, PipelineResult};
