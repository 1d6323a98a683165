//! # Manage Digital Ingest
//!
//! Prepares digitized collection objects for Alma or CollectionBuilder.
//!
//! ## Workflow
//! - **Match** - resolve the filenames listed in a spreadsheet to files on
//!   disk, tolerating case and small spelling differences
//! - **Derive** - create thumbnail and small JPEG derivatives
//! - **Upload** - copy originals and derivatives to a blob store, never
//!   overwriting a blob that already exists
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - Matching, derivatives, uploads
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `config` - Saved settings
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface (binary only)

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{IngestError, Result};

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// `RUST_LOG` wins over `default_directive` when set. Calling it twice is
/// harmless; the second subscriber is ignored.
pub fn init_tracing(default_directive: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Like [`init_tracing`], additionally appending every record to `log_file`
pub fn init_tracing_with_log_file(default_directive: &str, log_file: &Path) -> std::io::Result<()> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .with_ansi(false)
        .with_writer(std::io::stderr.and(Mutex::new(file)))
        .try_init();
    Ok(())
}

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}
