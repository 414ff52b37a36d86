//! Shared test utilities for the robeautify test suite.
//!
//! Synthetic image builders used across module tests. Everything here is
//! deterministic so pixel-exact assertions stay meaningful.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

/// A solid-color image.
pub fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, image::Rgba(rgba))
}

/// A deterministic gradient with distinct values per channel, so transforms
/// that mix channels or coordinates show up in comparisons.
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x + y) % 256) as u8,
            255,
        ])
    })
}

/// Losslessly encode an image as PNG bytes, for feeding the load path.
pub fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgba8,
        )
        .expect("PNG encoding of a test image cannot fail");
    bytes
}
