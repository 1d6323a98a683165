//! Output locations and file names for derivatives.

use super::DerivativeKind;
use crate::error::DerivativeError;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Final suffix of an Alma thumbnail
pub const CLIENT_THUMB_SUFFIX: &str = ".jpg.clientThumb";

const THUMBNAIL_SUFFIX: &str = "_TN.jpg";

/// Directory a derivative of `source` is written to.
///
/// A source whose parent directory is named `OBJS` (any case) gets a sibling
/// `TN/` or `SMALL/`; anything else is written alongside the source.
pub fn output_dir(source: &Path, kind: DerivativeKind) -> PathBuf {
    let parent = match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let in_objs = parent
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.eq_ignore_ascii_case("OBJS"))
        .unwrap_or(false);

    if in_objs {
        parent.with_file_name(kind.sibling_dir())
    } else {
        parent.to_path_buf()
    }
}

/// `{dir}/{stem}_TN.jpg` or `{dir}/{stem}_SMALL.jpg`
pub fn derivative_path(source: &Path, kind: DerivativeKind) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    output_dir(source, kind).join(format!("{}{}.jpg", stem, kind.suffix()))
}

/// The `.jpg.clientThumb` name for a `_TN.jpg` file, or `None` if `path`
/// is not a thumbnail.
pub fn client_thumb_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(THUMBNAIL_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(format!("{}{}", stem, CLIENT_THUMB_SUFFIX)))
}

/// Rename every `*_TN.jpg` in `dir` to `*.jpg.clientThumb`.
///
/// Returns the `(from, to)` pairs in file-name order. Stops at the first
/// rename that fails.
pub fn finalize_alma_thumbnails(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>, DerivativeError> {
    let entries = fs::read_dir(dir).map_err(|source| DerivativeError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut thumbnails: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && client_thumb_path(path).is_some())
        .collect();
    thumbnails.sort();

    let mut renamed = Vec::with_capacity(thumbnails.len());
    for from in thumbnails {
        let Some(to) = client_thumb_path(&from) else {
            continue;
        };
        fs::rename(&from, &to).map_err(|source| DerivativeError::Rename {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        debug!("Renamed {} -> {}", from.display(), to.display());
        renamed.push((from, to));
    }

    info!(
        "Renamed {} thumbnail(s) to {} in {}",
        renamed.len(),
        CLIENT_THUMB_SUFFIX,
        dir.display()
    );
    Ok(renamed)
}

/// Whether any character of `path` is whitespace
pub fn contains_whitespace(path: &Path) -> bool {
    path.to_string_lossy().chars().any(char::is_whitespace)
}

/// Make a file name safe for derivative generation and blob keys.
///
/// Spaces become `_`, then anything other than a word character, `-`, `_`
/// or `.` becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| Regex::new(r"[^\w\-_.]").expect("static pattern"));

    let spaced = name.replace(' ', "_");
    unsafe_chars.replace_all(&spaced, "_").into_owned()
}

/// Rename `path` in place to its [`sanitize_filename`] form.
///
/// Returns the path the file now lives at, which is `path` itself when the
/// name was already clean. Refuses to overwrite an existing file.
pub fn sanitize_path(path: &Path) -> Result<PathBuf, DerivativeError> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Err(DerivativeError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "no UTF-8 file name"),
        });
    };

    let clean = sanitize_filename(name);
    if clean == name {
        return Ok(path.to_path_buf());
    }

    let to = path.with_file_name(&clean);
    if to.exists() {
        return Err(DerivativeError::Rename {
            from: path.to_path_buf(),
            to,
            source: io::Error::new(io::ErrorKind::AlreadyExists, "target already exists"),
        });
    }

    fs::rename(path, &to).map_err(|source| DerivativeError::Rename {
        from: path.to_path_buf(),
        to: to.clone(),
        source,
    })?;
    info!("Sanitized {} -> {}", name, clean);
    Ok(to)
}
