//! In-process resizer using SIMD-accelerated resizing.
//!
//! Decodes with the `image` crate, scales with `fast_image_resize` and writes
//! a baseline JPEG. No PDF support; use [`MagickResizer`](super::MagickResizer)
//! for those.

use super::{ImageResizer, ResizeRequest};
use crate::error::DerivativeError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Channel difference below which a pixel counts as border when trimming
const TRIM_TOLERANCE: u8 = 8;

/// Resizer that never leaves the process
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeResizer;

impl NativeResizer {
    pub fn new() -> Self {
        Self
    }

    fn scale(&self, image: &RgbImage, width: u32, height: u32, path: &Path) -> Result<RgbImage, DerivativeError> {
        let (dst_width, dst_height) = fit_within(image.width(), image.height(), width, height);

        let src_image = Image::from_vec_u8(
            image.width(),
            image.height(),
            image.as_raw().clone(),
            PixelType::U8x3,
        )
        .map_err(|e| image_error(path, format!("Failed to create source image: {}", e)))?;

        let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x3);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));

        Resizer::new()
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| image_error(path, format!("Resize failed: {}", e)))?;

        RgbImage::from_raw(dst_width, dst_height, dst_image.into_vec())
            .ok_or_else(|| image_error(path, "Failed to create result buffer".to_string()))
    }
}

impl ImageResizer for NativeResizer {
    fn resize(&self, request: &ResizeRequest<'_>) -> Result<(), DerivativeError> {
        if request.first_page {
            return Err(image_error(
                request.input,
                "multi-page sources need the magick resizer".to_string(),
            ));
        }

        let decoded = image::open(request.input)
            .map_err(|e| image_error(request.input, e.to_string()))?
            .to_rgb8();

        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(image_error(request.input, "Invalid source dimensions".to_string()));
        }

        let source = if request.trim { trim(decoded) } else { decoded };
        let scaled = self.scale(&source, request.width, request.height, request.input)?;

        let file = File::create(request.output).map_err(|source| DerivativeError::Io {
            path: request.output.to_path_buf(),
            source,
        })?;
        JpegEncoder::new_with_quality(BufWriter::new(file), request.quality.clamp(1, 100))
            .encode_image(&scaled)
            .map_err(|e| image_error(request.output, e.to_string()))
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

fn image_error(path: &Path, reason: String) -> DerivativeError {
    DerivativeError::Image {
        path: path.to_path_buf(),
        reason,
    }
}

/// Largest size with the source aspect ratio that fits the box
pub(crate) fn fit_within(src_width: u32, src_height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale = f64::min(
        max_width as f64 / src_width as f64,
        max_height as f64 / src_height as f64,
    );
    let width = ((src_width as f64 * scale).round() as u32).clamp(1, max_width.max(1));
    let height = ((src_height as f64 * scale).round() as u32).clamp(1, max_height.max(1));
    (width, height)
}

/// Crop away a uniform border matching the top-left pixel
fn trim(image: RgbImage) -> RgbImage {
    let border = *image.get_pixel(0, 0);
    let differs = |p: &Rgb<u8>| {
        p.0.iter()
            .zip(border.0.iter())
            .any(|(a, b)| a.abs_diff(*b) > TRIM_TOLERANCE)
    };

    let (mut min_x, mut min_y) = (image.width(), image.height());
    let (mut max_x, mut max_y) = (0, 0);
    for (x, y, pixel) in image.enumerate_pixels() {
        if differs(pixel) {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if min_x > max_x || min_y > max_y {
        return image;
    }

    image::imageops::crop_imm(&image, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            Rgb([r, g, 128])
        })
    }

    fn request<'a>(input: &'a Path, output: &'a Path, trim: bool) -> ResizeRequest<'a> {
        ResizeRequest {
            input,
            output,
            width: 200,
            height: 200,
            quality: 85,
            trim,
            first_page: false,
        }
    }

    #[test]
    fn fit_preserves_aspect_ratio() {
        assert_eq!(fit_within(1000, 500, 200, 200), (200, 100));
        assert_eq!(fit_within(300, 600, 400, 400), (200, 400));
        assert_eq!(fit_within(100, 100, 400, 400), (400, 400));
        assert_eq!(fit_within(4000, 1, 200, 200), (200, 1));
    }

    #[test]
    fn resize_writes_jpeg_within_box() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("wide.png");
        let output = temp_dir.path().join("wide_TN.jpg");
        create_test_image(400, 200).save(&input).unwrap();

        NativeResizer::new()
            .resize(&request(&input, &output, false))
            .unwrap();

        let written = image::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (200, 100));
    }

    #[test]
    fn trim_removes_uniform_border() {
        let mut image = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
        for x in 10..20 {
            for y in 5..45 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }

        let trimmed = trim(image);

        assert_eq!((trimmed.width(), trimmed.height()), (10, 40));
    }

    #[test]
    fn trim_keeps_blank_image() {
        let image = RgbImage::from_pixel(20, 10, Rgb([255, 255, 255]));
        assert_eq!(trim(image).dimensions(), (20, 10));
    }

    #[test]
    fn first_page_requests_are_refused() {
        let mut req = request(Path::new("/in/doc.pdf"), Path::new("/in/doc_TN.jpg"), false);
        req.first_page = true;

        assert!(matches!(
            NativeResizer::new().resize(&req),
            Err(DerivativeError::Image { .. })
        ));
    }

    #[test]
    fn undecodable_input_is_an_image_error() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("broken.jpg");
        std::fs::write(&input, b"not a jpeg").unwrap();
        let output = temp_dir.path().join("broken_TN.jpg");

        assert!(matches!(
            NativeResizer::new().resize(&request(&input, &output, false)),
            Err(DerivativeError::Image { .. })
        ));
        assert!(!output.exists());
    }
}
