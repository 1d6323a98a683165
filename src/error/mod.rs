//! # Error Module
//!
//! Error types for the digital ingest pipeline.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, blob keys, the command that failed
//! - **Per-file failures stay per-file** - batch drivers record these and move on

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Matching error: {0}")]
    Match(#[from] MatchError),

    #[error("Derivative error: {0}")]
    Derivative(#[from] DerivativeError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(String),
}

/// Errors that occur while walking a search root
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Search root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid threshold: {value} (must be 0-100)")]
    InvalidThreshold { value: u32 },

    #[error("A search is already running. Cancel it or wait for it to finish.")]
    SearchInProgress,
}

/// Errors that occur while creating a single derivative
#[derive(Error, Debug)]
pub enum DerivativeError {
    #[error("File path '{path}' contains one or more spaces! Sanitize the file name before proceeding.")]
    PathContainsWhitespace { path: PathBuf },

    #[error("Invalid processing mode '{mode}' (expected 'Alma' or 'CollectionBuilder')")]
    UnknownMode { mode: String },

    #[error("{mode} does not produce a '{kind}' derivative")]
    UnsupportedKind { mode: String, kind: String },

    #[error("Can't create a derivative for '{path}' (unsupported file type: {extension})")]
    UnsupportedFileType { path: PathBuf, extension: String },

    #[error("Failed to launch `{command}`: {source}")]
    ToolLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {code}: {stderr}")]
    ToolFailed {
        command: String,
        code: String,
        stderr: String,
    },

    #[error("Failed to process image {path}: {reason}")]
    Image { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while talking to a blob store
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Blob store error for '{key}' in container '{container}': {reason}")]
    Store {
        container: String,
        key: String,
        reason: String,
    },

    #[error("Failed to read local file {path}: {source}")]
    ReadLocal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown container '{name}' (expected objs, thumbs, smalls or transcripts)")]
    UnknownContainer { name: String },
}

/// Errors loading or saving the settings file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file {path} is not valid JSON: {reason}. Fix or delete it and try again.")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to write config file {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, IngestError>;
