//! Image ingestion, the recompute pass, and export.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders) |
//! | Downscale on load | `image::imageops::resize` with `Lanczos3` |
//! | Rotate ±90° | `image::imageops::rotate90` / `rotate270` |
//! | Crop | `image::imageops::crop_imm` |
//! | Export → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! The recompute pass ([`render`]) is the single deterministic path from
//! editing state to pixels: it always starts from the session baseline,
//! never from the previous rendered frame, so filters cannot compound
//! across re-renders.

use crate::filters::{self, NoiseSource};
use crate::geometry::{CROP_MIN_SIZE, CropRect, RotateDirection};
use crate::state::EditState;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage, imageops};
use thiserror::Error;

/// Upload size ceiling, matching the product's 5MB limit.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Working images are downscaled to fit this bounding box so per-pixel
/// passes stay interactive.
pub const MAX_WIDTH: u32 = 1200;
pub const MAX_HEIGHT: u32 = 800;

/// Quality for the single lossy export format.
const EXPORT_JPEG_QUALITY: u8 = 90;

/// Formats whose decoders are compiled in and accepted for ingestion.
const ACCEPTED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("image is {0} bytes; the limit is {MAX_UPLOAD_BYTES}")]
    TooLarge(usize),
    #[error("unsupported image format (expected JPEG, PNG, or WebP)")]
    UnsupportedFormat,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode uploaded bytes into a working baseline.
///
/// Rejects oversize payloads and formats outside the accepted set before
/// decoding; the decoded image is downscaled to fit [`MAX_WIDTH`] ×
/// [`MAX_HEIGHT`] preserving aspect ratio. Nothing is mutated on error.
pub fn ingest(bytes: &[u8]) -> Result<RgbaImage, LoadError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(LoadError::TooLarge(bytes.len()));
    }
    let format = image::guess_format(bytes).map_err(|_| LoadError::UnsupportedFormat)?;
    if !ACCEPTED_FORMATS.contains(&format) {
        return Err(LoadError::UnsupportedFormat);
    }
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    Ok(fit_within_bounds(decoded.to_rgba8()))
}

/// Downscale (never upscale) to fit the working bounding box.
fn fit_within_bounds(img: RgbaImage) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || (w <= MAX_WIDTH && h <= MAX_HEIGHT) {
        return img;
    }
    let scale = (MAX_WIDTH as f64 / w as f64).min(MAX_HEIGHT as f64 / h as f64);
    let nw = ((w as f64 * scale).round() as u32).max(1);
    let nh = ((h as f64 * scale).round() as u32).max(1);
    imageops::resize(&img, nw, nh, FilterType::Lanczos3)
}

/// Recompute the rendered bitmap from a baseline and the current state.
///
/// Enabled filters run first, in declaration order, then the tonal
/// adjustments. The crop guide is a presentation concern and never touches
/// pixels. Zero-sized baselines render as-is.
pub fn render(baseline: &RgbaImage, state: &EditState, noise: &NoiseSource) -> RgbaImage {
    let mut out = baseline.clone();
    filters::apply_enabled(&mut out, &state.filters, noise);
    filters::apply_adjustments(&mut out, &state.adjustments);
    out
}

/// Re-project pixels through a 90° rotation, swapping dimensions.
pub fn rotate(img: &RgbaImage, direction: RotateDirection) -> RgbaImage {
    match direction {
        RotateDirection::Left => imageops::rotate270(img),
        RotateDirection::Right => imageops::rotate90(img),
    }
}

/// Copy the crop sub-rectangle out of a rendered bitmap as a new baseline.
///
/// The rectangle is rounded to whole pixels and intersected with the image;
/// a result below the minimum crop size is refused.
pub fn crop(img: &RgbaImage, rect: &CropRect) -> Option<RgbaImage> {
    let (iw, ih) = img.dimensions();
    let x = rect.x.round().clamp(0.0, iw as f64) as u32;
    let y = rect.y.round().clamp(0.0, ih as f64) as u32;
    let w = (rect.width.round() as u32).min(iw.saturating_sub(x));
    let h = (rect.height.round() as u32).min(ih.saturating_sub(y));
    if (w as f64) < CROP_MIN_SIZE || (h as f64) < CROP_MIN_SIZE {
        return None;
    }
    Some(imageops::crop_imm(img, x, y, w, h).to_image())
}

/// Encode a bitmap as JPEG — the single lossy export/snapshot format.
///
/// JPEG carries no alpha, so the image is flattened to RGB first.
pub fn encode_jpeg(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, EXPORT_JPEG_QUALITY).write_image(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// Decode snapshot bytes produced by [`encode_jpeg`].
pub fn decode_jpeg(bytes: &[u8]) -> Result<RgbaImage, image::ImageError> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Filter, Slider};
    use crate::test_helpers::{gradient_image, png_bytes, solid_image};

    // =========================================================================
    // Ingestion
    // =========================================================================

    #[test]
    fn ingest_decodes_png() {
        let img = ingest(&png_bytes(&gradient_image(320, 240))).unwrap();
        assert_eq!(img.dimensions(), (320, 240));
    }

    #[test]
    fn ingest_rejects_oversize_payload() {
        let bytes = vec![0u8; MAX_UPLOAD_BYTES + 1];
        assert!(matches!(ingest(&bytes), Err(LoadError::TooLarge(_))));
    }

    #[test]
    fn ingest_rejects_non_image_bytes() {
        let result = ingest(b"definitely not pixels");
        assert!(matches!(result, Err(LoadError::UnsupportedFormat)));
    }

    #[test]
    fn ingest_rejects_unaccepted_format() {
        // A valid GIF header: decodable by some stacks, but outside the set
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
        assert!(matches!(ingest(gif), Err(LoadError::UnsupportedFormat)));
    }

    #[test]
    fn ingest_downscales_to_bounding_box() {
        let img = ingest(&png_bytes(&solid_image(2400, 1200, [9, 9, 9, 255]))).unwrap();
        // Width-constrained: 2400x1200 → 1200x600
        assert_eq!(img.dimensions(), (1200, 600));
    }

    #[test]
    fn ingest_downscale_is_height_constrained_for_portrait() {
        let img = ingest(&png_bytes(&solid_image(900, 1600, [9, 9, 9, 255]))).unwrap();
        let (w, h) = img.dimensions();
        assert_eq!(h, 800);
        assert_eq!(w, 450);
    }

    #[test]
    fn ingest_keeps_small_images_unscaled() {
        let img = ingest(&png_bytes(&gradient_image(640, 480))).unwrap();
        assert_eq!(img.dimensions(), (640, 480));
    }

    // =========================================================================
    // Recompute
    // =========================================================================

    #[test]
    fn render_with_default_state_matches_baseline() {
        let baseline = gradient_image(32, 32);
        let out = render(&baseline, &EditState::default(), &NoiseSource::default());
        assert_eq!(out, baseline);
    }

    #[test]
    fn render_applies_filters_before_adjustments() {
        let baseline = solid_image(8, 8, [100, 50, 25, 255]);
        let mut state = EditState::default();
        state.filters.set(Filter::Sepia, true);
        state.adjustments.set(Slider::Exposure, 50);

        let out = render(&baseline, &state, &NoiseSource::default());

        // Sepia first, then the brightness/contrast pass on its output
        let mut expected = baseline.clone();
        crate::filters::apply(&mut expected, Filter::Sepia, &NoiseSource::default());
        crate::filters::apply_adjustments(&mut expected, &state.adjustments);
        assert_eq!(out, expected);
    }

    #[test]
    fn render_does_not_mutate_the_baseline() {
        let baseline = gradient_image(16, 16);
        let before = baseline.clone();
        let mut state = EditState::default();
        state.filters.set(Filter::Invert, true);
        let _ = render(&baseline, &state, &NoiseSource::default());
        assert_eq!(baseline, before);
    }

    #[test]
    fn render_zero_sized_baseline_is_skipped() {
        let baseline = RgbaImage::new(0, 0);
        let mut state = EditState::default();
        state.filters.set(Filter::Sepia, true);
        state.adjustments.set(Slider::Exposure, 100);
        let out = render(&baseline, &state, &NoiseSource::default());
        assert_eq!(out.dimensions(), (0, 0));
    }

    // =========================================================================
    // Rotate / crop
    // =========================================================================

    #[test]
    fn rotate_swaps_dimensions() {
        let img = gradient_image(60, 40);
        assert_eq!(rotate(&img, RotateDirection::Left).dimensions(), (40, 60));
        assert_eq!(rotate(&img, RotateDirection::Right).dimensions(), (40, 60));
    }

    #[test]
    fn four_left_rotations_restore_the_image() {
        let img = gradient_image(60, 40);
        let mut out = img.clone();
        for _ in 0..4 {
            out = rotate(&out, RotateDirection::Left);
        }
        assert_eq!(out, img);
    }

    #[test]
    fn left_then_right_rotation_cancels() {
        let img = gradient_image(60, 40);
        let out = rotate(&rotate(&img, RotateDirection::Left), RotateDirection::Right);
        assert_eq!(out, img);
    }

    #[test]
    fn crop_extracts_subrectangle() {
        let img = gradient_image(200, 200);
        let out = crop(&img, &CropRect::new(10.0, 20.0, 100.0, 80.0)).unwrap();
        assert_eq!(out.dimensions(), (100, 80));
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(10, 20));
        assert_eq!(out.get_pixel(99, 79), img.get_pixel(109, 99));
    }

    #[test]
    fn crop_refuses_degenerate_rect() {
        let img = gradient_image(200, 200);
        assert!(crop(&img, &CropRect::new(0.0, 0.0, 20.0, 200.0)).is_none());
    }

    #[test]
    fn crop_refuses_rect_clamped_below_minimum() {
        let img = gradient_image(200, 200);
        // Nominally large enough, but clamping to bounds leaves 30px
        assert!(crop(&img, &CropRect::new(170.0, 0.0, 100.0, 100.0)).is_none());
    }

    // =========================================================================
    // Encode / decode
    // =========================================================================

    #[test]
    fn jpeg_round_trip_preserves_dimensions() {
        let img = gradient_image(120, 90);
        let bytes = encode_jpeg(&img).unwrap();
        let back = decode_jpeg(&bytes).unwrap();
        assert_eq!(back.dimensions(), (120, 90));
    }

    #[test]
    fn decode_jpeg_rejects_garbage() {
        assert!(decode_jpeg(b"not a jpeg").is_err());
    }
}
