//! Directory walking implementation using walkdir.

use super::FileSource;
use crate::error::MatchError;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory walk
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to consider hidden files and descend into hidden directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Visit directory entries in file-name order so ties resolve the same
    /// way on every platform
    pub sorted: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            sorted: true,
        }
    }
}

/// [`FileSource`] backed by the walkdir crate
#[derive(Debug, Clone, Default)]
pub struct WalkDirSource {
    config: WalkConfig,
}

impl WalkDirSource {
    /// Create a new walker with the given configuration
    pub fn new(config: WalkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }
}

impl FileSource for WalkDirSource {
    fn files<'a>(
        &'a self,
        root: &Path,
    ) -> Box<dyn Iterator<Item = Result<PathBuf, MatchError>> + 'a> {
        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        if self.config.sorted {
            walker = walker.sort_by_file_name();
        }

        let include_hidden = self.config.include_hidden;
        let root = root.to_path_buf();

        let iter = walker
            .into_iter()
            .filter_entry(move |entry| include_hidden || entry.depth() == 0 || !is_hidden(entry))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        None
                    } else {
                        Some(Ok(entry.into_path()))
                    }
                }
                Err(e) => Some(Err(classify_walk_error(&root, e))),
            });

        Box::new(iter)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn classify_walk_error(root: &Path, error: walkdir::Error) -> MatchError {
    let path = error
        .path()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| root.to_path_buf());

    match error.io_error().map(|e| e.kind()) {
        Some(std::io::ErrorKind::NotFound) if error.depth() == 0 => {
            MatchError::RootNotFound { path }
        }
        Some(std::io::ErrorKind::PermissionDenied) => MatchError::PermissionDenied { path },
        _ => MatchError::ReadDirectory {
            path,
            source: std::io::Error::new(std::io::ErrorKind::Other, error.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    fn collect(source: &WalkDirSource, root: &Path) -> Vec<PathBuf> {
        source.files(root).map(|r| r.unwrap()).collect()
    }

    #[test]
    fn walk_empty_directory_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = WalkDirSource::default();

        assert!(collect(&source, temp_dir.path()).is_empty());
    }

    #[test]
    fn walk_yields_files_not_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("OBJS")).unwrap();
        touch(temp_dir.path(), "a.tif");
        touch(&temp_dir.path().join("OBJS"), "b.pdf");

        let files = collect(&WalkDirSource::default(), temp_dir.path());

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.is_file()));
    }

    #[test]
    fn walk_is_sorted_by_default() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "c.jpg");
        touch(temp_dir.path(), "a.jpg");
        touch(temp_dir.path(), "b.jpg");

        let names: Vec<_> = collect(&WalkDirSource::default(), temp_dir.path())
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn hidden_files_are_included_by_default() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), ".hidden.jpg");
        touch(temp_dir.path(), "visible.jpg");

        assert_eq!(collect(&WalkDirSource::default(), temp_dir.path()).len(), 2);
    }

    #[test]
    fn hidden_entries_can_be_skipped() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), ".hidden.jpg");
        touch(temp_dir.path(), "visible.jpg");
        fs::create_dir(temp_dir.path().join(".cache")).unwrap();
        touch(&temp_dir.path().join(".cache"), "inner.jpg");

        let source = WalkDirSource::new(WalkConfig {
            include_hidden: false,
            ..Default::default()
        });
        let files = collect(&source, temp_dir.path());

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("visible.jpg"));
    }

    #[test]
    fn max_depth_limits_recursion() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        touch(temp_dir.path(), "top.jpg");
        touch(&nested, "deep.jpg");

        let source = WalkDirSource::new(WalkConfig {
            max_depth: Some(1),
            ..Default::default()
        });

        assert_eq!(collect(&source, temp_dir.path()).len(), 1);
    }

    #[test]
    fn missing_root_is_reported() {
        let source = WalkDirSource::default();
        let results: Vec<_> = source.files(Path::new("/nonexistent/path/12345")).collect();

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(MatchError::RootNotFound { .. })));
    }
}
