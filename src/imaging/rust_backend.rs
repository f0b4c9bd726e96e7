//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::load_from_memory` |
//! | Resample | `DynamicImage::resize_exact` with `CatmullRom` (bicubic) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//!
//! Output is always baseline RGB JPEG. Alpha is flattened by dropping the
//! channel, same as drawing onto an opaque canvas.
//!
//! A target box the JPEG encoder cannot write (a zero side, or a side over
//! [`MAX_JPEG_SIDE`]) is rejected before the source is decoded, so no
//! resample buffer is ever allocated for it.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder, ImageReader};
use std::io::Cursor;

/// Resampling filter used for every resize.
pub const RESAMPLING_FILTER: FilterType = FilterType::CatmullRom;

/// Largest width or height a baseline JPEG can store.
pub const MAX_JPEG_SIDE: u32 = u16::MAX as u32;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an encoded image held in memory.
fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(source).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Encode as JPEG into a fresh buffer.
fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    if out.is_empty() {
        return Err(BackendError::Encode("encoder produced no data".into()));
    }
    Ok(out)
}

/// Reject target boxes the JPEG encoder would refuse.
fn check_encodable(width: u32, height: u32) -> Result<(), BackendError> {
    if width == 0 || height == 0 || width > MAX_JPEG_SIDE || height > MAX_JPEG_SIDE {
        return Err(BackendError::Encode(format!(
            "{width} × {height} px is outside 1-{MAX_JPEG_SIDE} px per side"
        )));
    }
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        check_encodable(params.width, params.height)?;
        let img = load_image(params.source)?;
        let resized = img.resize_exact(params.width, params.height, RESAMPLING_FILTER);
        encode_jpeg(&resized, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use image::{ImageFormat, RgbImage, RgbaImage};

    /// Encode a small gradient in the given format.
    fn synthetic(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let img = match format {
            ImageFormat::Gif => DynamicImage::ImageRgba8(DynamicImage::ImageRgb8(img).to_rgba8()),
            _ => DynamicImage::ImageRgb8(img),
        };
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn identify_synthetic_png() {
        let source = synthetic(200, 150, ImageFormat::Png);
        let dims = RustBackend::new().identify(&source).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_garbage_errors() {
        let result = RustBackend::new().identify(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn resize_jpeg_to_exact_box() {
        let source = synthetic(400, 300, ImageFormat::Jpeg);
        let backend = RustBackend::new();
        let out = backend
            .resize(&ResizeParams {
                source: &source,
                width: 120,
                height: 200,
                quality: Quality::new(95),
            })
            .unwrap();

        assert_eq!(
            image::guess_format(&out).unwrap(),
            ImageFormat::Jpeg,
            "output must be JPEG"
        );
        assert_eq!(
            backend.identify(&out).unwrap(),
            Dimensions { width: 120, height: 200 }
        );
    }

    #[test]
    fn resize_flattens_alpha_sources() {
        let img = RgbaImage::from_pixel(32, 32, image::Rgba([10, 20, 30, 0]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();

        let out = RustBackend::new()
            .resize(&ResizeParams {
                source: buf.get_ref(),
                width: 16,
                height: 16,
                quality: Quality::default(),
            })
            .unwrap();
        assert!(!out.is_empty());
    }

    #[test]
    fn resize_accepts_every_indexed_format() {
        for format in [
            ImageFormat::Png,
            ImageFormat::Jpeg,
            ImageFormat::Gif,
            ImageFormat::Bmp,
            ImageFormat::Tiff,
            ImageFormat::WebP,
        ] {
            let source = synthetic(20, 10, format);
            let out = RustBackend::new().resize(&ResizeParams {
                source: &source,
                width: 10,
                height: 5,
                quality: Quality::default(),
            });
            assert!(out.is_ok(), "{format:?}: {:?}", out.err());
        }
    }

    #[test]
    fn unencodable_box_is_rejected_before_decoding() {
        // Not an image: reaching the decoder would give a Decode error instead
        let source = b"never decoded";
        for (width, height) in [(300, 0), (0, 300), (MAX_JPEG_SIDE + 1, 10), (10, 3_000_000_000)] {
            let result = RustBackend::new().resize(&ResizeParams {
                source,
                width,
                height,
                quality: Quality::default(),
            });
            assert!(
                matches!(result, Err(BackendError::Encode(_))),
                "{width}x{height}: {result:?}"
            );
        }
    }

    #[test]
    fn largest_side_is_accepted() {
        assert!(check_encodable(MAX_JPEG_SIDE, 1).is_ok());
        assert!(check_encodable(1, MAX_JPEG_SIDE).is_ok());
    }

    #[test]
    fn resize_truncated_source_is_decode_error() {
        let source = synthetic(64, 64, ImageFormat::Png);
        let result = RustBackend::new().resize(&ResizeParams {
            source: &source[..source.len() / 2],
            width: 10,
            height: 10,
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }
}
