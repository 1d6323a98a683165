//! Resizer trait definition.

use crate::error::DerivativeError;
use std::path::Path;

/// One resize job: fit `input` into `width` x `height` and write a JPEG
#[derive(Debug, Clone, Copy)]
pub struct ResizeRequest<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub trim: bool,
    /// Rasterize only the first page of a multi-page input
    pub first_page: bool,
}

/// Trait for image resize backends
pub trait ImageResizer: Send + Sync {
    /// Perform the resize. The output directory already exists.
    fn resize(&self, request: &ResizeRequest<'_>) -> Result<(), DerivativeError>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

impl<R: ImageResizer + ?Sized> ImageResizer for &R {
    fn resize(&self, request: &ResizeRequest<'_>) -> Result<(), DerivativeError> {
        (**self).resize(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<R: ImageResizer + ?Sized> ImageResizer for Box<R> {
    fn resize(&self, request: &ResizeRequest<'_>) -> Result<(), DerivativeError> {
        (**self).resize(request)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
