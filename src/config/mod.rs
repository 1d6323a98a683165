//! # Config Module
//!
//! Persistent settings for the `mdi` command.
//!
//! Stored as pretty JSON at `{config_dir}/manage-digital-ingest/config.json`
//! unless a path is given explicitly. A missing file means defaults;
//! command-line flags override whatever the file says.

use crate::core::derivative::ProcessingMode;
use crate::core::matcher::DEFAULT_THRESHOLD;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "manage-digital-ingest";
const CONFIG_FILE: &str = "config.json";

/// Saved settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Derivative mode used when `--mode` is not given
    pub mode: Option<ProcessingMode>,
    /// Match threshold, 0-100
    pub threshold: u8,
    /// Default search root
    pub search_root: Option<PathBuf>,
    /// Directory backing the filesystem blob store
    pub blob_root: Option<PathBuf>,
    /// Public base URL blobs are served from
    pub blob_base_url: Option<String>,
    /// Append-only application log
    pub log_file: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            mode: None,
            threshold: DEFAULT_THRESHOLD,
            search_root: None,
            blob_root: None,
            blob_base_url: None,
            log_file: None,
        }
    }
}

impl IngestConfig {
    /// `{config_dir}/manage-digital-ingest/config.json`, if the platform
    /// has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or the default location when `None`.
    ///
    /// A file that does not exist yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let mut config: Self = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        config.threshold = config.threshold.min(100);

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write to `path`, creating parent directories. Returns the path used.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(Self::default_path)
            .ok_or_else(|| ConfigError::Write {
                path: PathBuf::from(CONFIG_FILE),
                reason: "no config directory on this platform".to_string(),
            })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Write {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| ConfigError::Write {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        Ok(path)
    }
}
