//! Best-effort image downscaling before recognition.
//!
//! Photos are decoded, fitted into a bounding box with a Lanczos filter and
//! re-encoded as JPEG. Any failure hands back the original bytes, so the
//! output is never guaranteed to be smaller than the input.

use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;

use tokio::task;
use tracing::{info, warn};

use crate::error::NormalizeError;

pub const DEFAULT_MAX_DIMENSION: u32 = 800;
pub const JPEG_QUALITY: u8 = 85;

/// Normalization stage settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeSettings {
    pub enabled: bool,
    pub max_width: u32,
    pub max_height: u32,
}

impl NormalizeSettings {
    pub fn max_dims(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Downscales `bytes` into `max_dims` and re-encodes as JPEG.
///
/// Returns `Cow::Borrowed(bytes)` when the image cannot be processed.
pub fn normalize_image(bytes: &[u8], max_dims: (u32, u32)) -> Cow<'_, [u8]> {
    match downscale_to_jpeg(bytes, max_dims) {
        Ok(normalized) => {
            info!(
                input_bytes = bytes.len(),
                output_bytes = normalized.len(),
                "image normalized"
            );
            Cow::Owned(normalized)
        }
        Err(err) => {
            warn!(error = %err, input_bytes = bytes.len(), "image normalization failed, using original");
            Cow::Borrowed(bytes)
        }
    }
}

/// Runs [`normalize_image`] on the blocking pool and returns owned bytes.
pub async fn normalize_in_background(bytes: Vec<u8>, max_dims: (u32, u32)) -> Vec<u8> {
    let shared = Arc::new(bytes);
    let worker = Arc::clone(&shared);
    let outcome = task::spawn_blocking(move || match normalize_image(&worker, max_dims) {
        Cow::Owned(normalized) => Some(normalized),
        Cow::Borrowed(_) => None,
    })
    .await;

    match outcome {
        Ok(Some(normalized)) => normalized,
        Ok(None) => into_owned(shared),
        Err(err) => {
            warn!(error = %err, "image normalization task failed, using original");
            into_owned(shared)
        }
    }
}

fn into_owned(shared: Arc<Vec<u8>>) -> Vec<u8> {
    Arc::try_unwrap(shared).unwrap_or_else(|shared| shared.as_ref().clone())
}

fn downscale_to_jpeg(bytes: &[u8], max_dims: (u32, u32)) -> Result<Vec<u8>, NormalizeError> {
    let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let decoded = reader.decode()?;

    let (width, height) = (decoded.width(), decoded.height());
    let (target_w, target_h) = fit_within(width, height, max_dims);
    let rgb = decoded.to_rgb8();
    let rgb = if (target_w, target_h) == (width, height) {
        rgb
    } else {
        resize_lanczos(rgb, target_w, target_h)?
    };

    info!(
        source_width = width,
        source_height = height,
        width = target_w,
        height = target_h,
        "image resized"
    );
    encode_jpeg(&rgb)
}

/// Largest size with the same aspect ratio that fits inside `max_dims`.
/// Images already inside the box are left alone.
pub fn fit_within(width: u32, height: u32, max_dims: (u32, u32)) -> (u32, u32) {
    let (max_w, max_h) = (max_dims.0.max(1), max_dims.1.max(1));
    if width <= max_w && height <= max_h {
        return (width, height);
    }

    let scale = f64::min(
        f64::from(max_w) / f64::from(width),
        f64::from(max_h) / f64::from(height),
    );
    let scaled_w = (f64::from(width) * scale).round() as u32;
    let scaled_h = (f64::from(height) * scale).round() as u32;
    (scaled_w.clamp(1, max_w), scaled_h.clamp(1, max_h))
}

fn resize_lanczos(
    src: image::RgbImage,
    dst_w: u32,
    dst_h: u32,
) -> Result<image::RgbImage, NormalizeError> {
    use fast_image_resize as fir;
    use fast_image_resize::images::Image;

    let (src_w, src_h) = src.dimensions();
    let src_image = Image::from_vec_u8(src_w, src_h, src.into_raw(), fir::PixelType::U8x3)
        .map_err(|e| NormalizeError::Resize(e.to_string()))?;

    let mut dst_image = Image::new(dst_w, dst_h, fir::PixelType::U8x3);
    let mut resizer = fir::Resizer::new();
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| NormalizeError::Resize(e.to_string()))?;

    image::RgbImage::from_raw(dst_w, dst_h, dst_image.into_vec())
        .ok_or_else(|| NormalizeError::Resize("invalid output buffer".to_string()))
}

fn encode_jpeg(img: &image::RgbImage) -> Result<Vec<u8>, NormalizeError> {
    use image::ImageEncoder as _;
    use image::codecs::jpeg::JpegEncoder;

    let mut buf = Vec::new();
    let (w, h) = img.dimensions();
    JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
        .write_image(img.as_raw(), w, h, image::ExtendedColorType::Rgb8)
        .map_err(NormalizeError::Encode)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_corrupt_bytes_are_returned_unchanged() {
        let corrupt = b"definitely not an image".to_vec();
        let out = normalize_image(&corrupt, (800, 800));
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out.as_ref(), corrupt.as_slice());
    }

    #[test]
    fn test_truncated_jpeg_header_is_returned_unchanged() {
        let truncated = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        let out = normalize_image(&truncated, (800, 800));
        assert_eq!(out.as_ref(), truncated.as_slice());
    }

    #[test]
    fn test_large_image_fits_bounding_box_with_aspect_ratio() {
        let source = png_bytes(2000, 1500);
        let out = normalize_image(&source, (800, 800));
        assert!(matches!(out, Cow::Owned(_)));

        let decoded = image::load_from_memory(&out).unwrap();
        let (w, h) = (decoded.width(), decoded.height());
        assert!(w.max(h) <= 800);
        assert_eq!((w, h), (800, 600));

        let ratio = f64::from(w) / f64::from(h);
        assert!((ratio - 2000.0 / 1500.0).abs() < 0.01);
    }

    #[test]
    fn test_output_is_jpeg() {
        let source = png_bytes(1200, 400);
        let out = normalize_image(&source, (800, 800));
        assert!(out.starts_with(&[0xFF, 0xD8]));
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 267));
    }

    #[test]
    fn test_small_image_is_not_upscaled() {
        let source = png_bytes(320, 240);
        let out = normalize_image(&source, (800, 800));
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(2000, 1500, (800, 800)), (800, 600));
        assert_eq!(fit_within(1500, 2000, (800, 800)), (600, 800));
        assert_eq!(fit_within(800, 800, (800, 800)), (800, 800));
        assert_eq!(fit_within(100, 50, (800, 800)), (100, 50));
        assert_eq!(fit_within(10_000, 1, (800, 800)), (800, 1));
        assert_eq!(fit_within(1000, 1000, (400, 200)), (200, 200));
    }

    #[tokio::test]
    async fn test_background_normalization_keeps_corrupt_input() {
        let corrupt = vec![1, 2, 3, 4];
        let out = normalize_in_background(corrupt.clone(), (800, 800)).await;
        assert_eq!(out, corrupt);
    }

    #[tokio::test]
    async fn test_background_normalization_shrinks_large_input() {
        let out = normalize_in_background(png_bytes(1600, 1200), (800, 800)).await;
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }
}
