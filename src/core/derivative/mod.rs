//! # Derivative Module
//!
//! Creates thumbnail and small JPEG derivatives of matched originals.
//!
//! ## Modes
//! - **Alma**: one 200x200 thumbnail per source, written as `{stem}_TN.jpg`
//!   and renamed to `{stem}.jpg.clientThumb` once the whole batch is done.
//! - **CollectionBuilder**: a 400x400 `{stem}_TN.jpg` thumbnail and an
//!   800x800 `{stem}_SMALL.jpg` small per source.
//!
//! Sources in a directory named `OBJS` get their derivatives in a sibling
//! `TN/` or `SMALL/` directory; everything else is written alongside.
//!
//! The actual pixel work sits behind [`ImageResizer`]: [`MagickResizer`]
//! shells out to ImageMagick, [`NativeResizer`] resizes in-process.

mod generator;
mod magick;
mod naming;
mod native;
mod resizer;

pub use generator::{DerivativeGenerator, DerivativeReport};
pub use magick::MagickResizer;
pub use naming::{
    client_thumb_path, contains_whitespace, derivative_path, finalize_alma_thumbnails,
    output_dir, sanitize_filename, sanitize_path, CLIENT_THUMB_SUFFIX,
};
pub use native::NativeResizer;
pub use resizer::{ImageResizer, ResizeRequest};

use crate::error::DerivativeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The downstream system derivatives are produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingMode {
    Alma,
    CollectionBuilder,
}

impl ProcessingMode {
    /// Derivative kinds produced per source, in creation order
    pub fn derivative_kinds(self) -> &'static [DerivativeKind] {
        match self {
            ProcessingMode::Alma => &[DerivativeKind::Thumbnail],
            ProcessingMode::CollectionBuilder => &[DerivativeKind::Thumbnail, DerivativeKind::Small],
        }
    }

    /// Whether `_TN.jpg` outputs get the `.jpg.clientThumb` post-pass
    pub fn renames_thumbnails(self) -> bool {
        matches!(self, ProcessingMode::Alma)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingMode::Alma => "Alma",
            ProcessingMode::CollectionBuilder => "CollectionBuilder",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = DerivativeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alma" => Ok(ProcessingMode::Alma),
            "collectionbuilder" | "collection-builder" | "collection_builder" => {
                Ok(ProcessingMode::CollectionBuilder)
            }
            _ => Err(DerivativeError::UnknownMode {
                mode: s.to_string(),
            }),
        }
    }
}

/// A kind of derivative image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivativeKind {
    Thumbnail,
    Small,
}

impl DerivativeKind {
    /// Filename suffix inserted before `.jpg`
    pub fn suffix(self) -> &'static str {
        match self {
            DerivativeKind::Thumbnail => "_TN",
            DerivativeKind::Small => "_SMALL",
        }
    }

    /// Sibling directory used for sources that live in `OBJS/`
    pub fn sibling_dir(self) -> &'static str {
        match self {
            DerivativeKind::Thumbnail => "TN",
            DerivativeKind::Small => "SMALL",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DerivativeKind::Thumbnail => "thumbnail",
            DerivativeKind::Small => "small",
        }
    }
}

impl fmt::Display for DerivativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry and encoding of one derivative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeSpec {
    pub kind: DerivativeKind,
    /// Bounding box; the image is scaled to fit, aspect preserved
    pub width: u32,
    pub height: u32,
    /// JPEG quality, 0-100
    pub quality: u8,
    /// Trim uniform borders before scaling
    pub trim: bool,
}

impl DerivativeSpec {
    const QUALITY: u8 = 85;

    /// The spec for `kind` under `mode`.
    ///
    /// Alma only produces thumbnails; asking for an Alma small fails.
    pub fn for_mode(mode: ProcessingMode, kind: DerivativeKind) -> Result<Self, DerivativeError> {
        let size = match (mode, kind) {
            (ProcessingMode::Alma, DerivativeKind::Thumbnail) => 200,
            (ProcessingMode::Alma, DerivativeKind::Small) => {
                return Err(DerivativeError::UnsupportedKind {
                    mode: mode.to_string(),
                    kind: kind.to_string(),
                })
            }
            (ProcessingMode::CollectionBuilder, DerivativeKind::Thumbnail) => 400,
            (ProcessingMode::CollectionBuilder, DerivativeKind::Small) => 800,
        };

        Ok(Self {
            kind,
            width: size,
            height: size,
            quality: Self::QUALITY,
            trim: false,
        })
    }
}

/// How a source file is fed to the resizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Raster image, resized directly
    Image,
    /// PDF, first page rasterized then resized
    Pdf,
}

impl SourceKind {
    const IMAGE_EXTENSIONS: &'static [&'static str] = &["tiff", "tif", "jpg", "jpeg", "png"];

    /// Classify by extension, case-insensitively
    pub fn from_path(path: &Path) -> Result<Self, DerivativeError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if Self::IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Ok(SourceKind::Image)
        } else if extension == "pdf" {
            Ok(SourceKind::Pdf)
        } else {
            Err(DerivativeError::UnsupportedFileType {
                path: path.to_path_buf(),
                extension: if extension.is_empty() {
                    "none".to_string()
                } else {
                    extension
                },
            })
        }
    }
}

/// Outcome of one (source, kind) attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivativeResult {
    pub source_path: PathBuf,
    /// Final location of the derivative; `None` when nothing was written
    pub output_path: Option<PathBuf>,
    pub kind: DerivativeKind,
    pub success: bool,
    pub error: Option<String>,
}

impl DerivativeResult {
    pub fn created(source_path: PathBuf, output_path: PathBuf, kind: DerivativeKind) -> Self {
        Self {
            source_path,
            output_path: Some(output_path),
            kind,
            success: true,
            error: None,
        }
    }

    pub fn failed(source_path: PathBuf, kind: DerivativeKind, error: &DerivativeError) -> Self {
        Self {
            source_path,
            output_path: None,
            kind,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("alma".parse::<ProcessingMode>().unwrap(), ProcessingMode::Alma);
        assert_eq!(
            "CollectionBuilder".parse::<ProcessingMode>().unwrap(),
            ProcessingMode::CollectionBuilder
        );
        assert_eq!(
            "collection-builder".parse::<ProcessingMode>().unwrap(),
            ProcessingMode::CollectionBuilder
        );
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let err = "Islandora".parse::<ProcessingMode>().unwrap_err();
        assert!(matches!(err, DerivativeError::UnknownMode { ref mode } if mode == "Islandora"));
    }

    #[test]
    fn kinds_per_mode() {
        assert_eq!(ProcessingMode::Alma.derivative_kinds(), &[DerivativeKind::Thumbnail]);
        assert_eq!(
            ProcessingMode::CollectionBuilder.derivative_kinds(),
            &[DerivativeKind::Thumbnail, DerivativeKind::Small]
        );
    }

    #[test]
    fn specs_per_mode_and_kind() {
        let alma = DerivativeSpec::for_mode(ProcessingMode::Alma, DerivativeKind::Thumbnail).unwrap();
        assert_eq!((alma.width, alma.height, alma.quality, alma.trim), (200, 200, 85, false));

        let cb_tn =
            DerivativeSpec::for_mode(ProcessingMode::CollectionBuilder, DerivativeKind::Thumbnail)
                .unwrap();
        assert_eq!((cb_tn.width, cb_tn.height), (400, 400));

        let cb_small =
            DerivativeSpec::for_mode(ProcessingMode::CollectionBuilder, DerivativeKind::Small)
                .unwrap();
        assert_eq!((cb_small.width, cb_small.height, cb_small.quality), (800, 800, 85));
    }

    #[test]
    fn alma_has_no_small() {
        let err = DerivativeSpec::for_mode(ProcessingMode::Alma, DerivativeKind::Small).unwrap_err();
        assert!(matches!(err, DerivativeError::UnsupportedKind { .. }));
    }

    #[test]
    fn source_kind_by_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a.TIF")).unwrap(), SourceKind::Image);
        assert_eq!(SourceKind::from_path(Path::new("a.jpeg")).unwrap(), SourceKind::Image);
        assert_eq!(SourceKind::from_path(Path::new("a.png")).unwrap(), SourceKind::Image);
        assert_eq!(SourceKind::from_path(Path::new("a.Pdf")).unwrap(), SourceKind::Pdf);
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        assert!(matches!(
            SourceKind::from_path(Path::new("clip.mp4")),
            Err(DerivativeError::UnsupportedFileType { ref extension, .. }) if extension == "mp4"
        ));
        assert!(matches!(
            SourceKind::from_path(Path::new("README")),
            Err(DerivativeError::UnsupportedFileType { ref extension, .. }) if extension == "none"
        ));
    }

    #[test]
    fn kind_serializes_by_name() {
        let json = serde_json::to_string(&DerivativeKind::Thumbnail).unwrap();
        assert_eq!(json, "\"Thumbnail\"");
    }
}
