//! Per-pixel filters and tonal adjustments.
//!
//! Every function here takes a pixel buffer and mutates it in place; none
//! touch the alpha channel, and every output channel is clamped to `0..=255`.
//! Filter recipes are fixed coefficients — they are the contract, not an
//! aesthetic suggestion — and compose in [`Filter::ALL`] declaration order
//! via [`apply_enabled`].
//!
//! # Randomized filters
//!
//! `noise`, the `lofi` grain, and the `robeautify` decorations draw from a
//! [`NoiseSource`]: a per-coordinate hash, not a stateful RNG. The same seed
//! over the same image reproduces the exact output, so a re-render of a
//! restored session looks identical and regression tests can pin a seed.

use crate::state::{Adjustments, Filter, FilterState};
use image::RgbaImage;

/// Luma weights used by saturation and grayscale mixing.
const LUMA_R: f32 = 0.2989;
const LUMA_G: f32 = 0.5870;
const LUMA_B: f32 = 0.1140;

/// Deterministic per-coordinate noise for the randomized filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseSource {
    seed: u32,
}

/// Per-filter salts so the same coordinate draws independent values.
const SALT_NOISE: u32 = 0;
const SALT_GRAIN: u32 = 1;
const SALT_DECOR_PLACE: u32 = 2;
const SALT_DECOR_KIND: u32 = 3;
const SALT_DECOR_SIZE: u32 = 4;
const SALT_DECOR_ALPHA: u32 = 5;

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(0x00c0_ffee)
    }
}

impl NoiseSource {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    fn hash(&self, x: u32, y: u32, salt: u32) -> u32 {
        let mut h = self.seed.wrapping_add(salt.wrapping_mul(0x9e37_79b9));
        h ^= x;
        h = h.wrapping_mul(0x85eb_ca6b);
        h ^= y;
        h = h.wrapping_mul(0xc2b2_ae35);
        h ^= h >> 16;
        h
    }

    /// Uniform value in `[0, 1)`.
    fn unit(&self, x: u32, y: u32, salt: u32) -> f32 {
        (self.hash(x, y, salt) & 0x7f_ffff) as f32 / 0x80_0000 as f32
    }

    /// Uniform value in `[-amplitude, amplitude)`.
    fn signed(&self, x: u32, y: u32, salt: u32, amplitude: f32) -> f32 {
        (self.unit(x, y, salt) * 2.0 - 1.0) * amplitude
    }
}

/// Apply every enabled filter in declaration order.
///
/// Zero-sized buffers are left untouched.
pub fn apply_enabled(img: &mut RgbaImage, filters: &FilterState, noise: &NoiseSource) {
    if img.width() == 0 || img.height() == 0 {
        return;
    }
    for filter in filters.enabled() {
        apply(img, filter, noise);
    }
}

/// Apply a single filter.
pub fn apply(img: &mut RgbaImage, filter: Filter, noise: &NoiseSource) {
    match filter {
        Filter::BlackWhite => black_white(img),
        Filter::Noise => add_noise(img, noise),
        Filter::Sharpen => sharpen(img),
        Filter::Sepia => sepia(img),
        Filter::Vintage => vintage(img),
        Filter::Invert => invert(img),
        Filter::Gotham => gotham(img),
        Filter::Lofi => lofi(img, noise),
        Filter::Pastel => pastel(img),
        Filter::Hudson => hudson(img),
        Filter::Amaro => amaro(img),
        Filter::Xpro => xpro(img),
        Filter::Sierra => sierra(img),
        Filter::Valencia => valencia(img),
        Filter::Moon => moon(img),
        Filter::Robeautify => robeautify(img, noise),
    }
}

fn clamp_channel(v: f32) -> u8 {
    v.clamp(0.0, 255.0).round() as u8
}

/// Run `f` over the RGB channels of every pixel, clamping the result.
/// Alpha passes through unchanged.
fn map_rgb(img: &mut RgbaImage, f: impl Fn([f32; 3]) -> [f32; 3]) {
    for px in img.pixels_mut() {
        let [r, g, b, a] = px.0;
        let out = f([r as f32, g as f32, b as f32]);
        px.0 = [
            clamp_channel(out[0]),
            clamp_channel(out[1]),
            clamp_channel(out[2]),
            a,
        ];
    }
}

/// Like [`map_rgb`] but with pixel coordinates, for position-dependent
/// effects (vignettes, grain).
fn map_rgb_at(img: &mut RgbaImage, f: impl Fn(u32, u32, [f32; 3]) -> [f32; 3]) {
    let width = img.width();
    for (i, px) in img.pixels_mut().enumerate() {
        let x = i as u32 % width;
        let y = i as u32 / width;
        let [r, g, b, a] = px.0;
        let out = f(x, y, [r as f32, g as f32, b as f32]);
        px.0 = [
            clamp_channel(out[0]),
            clamp_channel(out[1]),
            clamp_channel(out[2]),
            a,
        ];
    }
}

/// Contrast about the 128 midpoint.
fn contrast_about_mid(v: f32, factor: f32) -> f32 {
    (v - 128.0) * factor + 128.0
}

/// Radial falloff used by `xpro`: 1 at the center, 0 past `width × 0.7`.
fn vignette_xpro(x: u32, y: u32, width: u32, height: u32) -> f32 {
    let dx = x as f32 - width as f32 / 2.0;
    let dy = y as f32 - height as f32 / 2.0;
    (1.0 - (dx * dx + dy * dy).sqrt() / (width as f32 * 0.7)).max(0.0)
}

/// Gentler falloff used by `sierra`: at most a 30% darkening.
fn vignette_sierra(x: u32, y: u32, width: u32, height: u32) -> f32 {
    let dx = x as f32 - width as f32 / 2.0;
    let dy = y as f32 - height as f32 / 2.0;
    (1.0 - ((dx * dx + dy * dy).sqrt() / (width as f32 * 0.6)) * 0.3).max(0.0)
}

fn black_white(img: &mut RgbaImage) {
    map_rgb(img, |[r, g, b]| {
        let avg = (r + g + b) / 3.0;
        [avg, avg, avg]
    });
}

fn add_noise(img: &mut RgbaImage, noise: &NoiseSource) {
    map_rgb_at(img, |x, y, [r, g, b]| {
        // One shared delta per pixel so the grain is luminance-only
        let d = noise.signed(x, y, SALT_NOISE, 25.0);
        [r + d, g + d, b + d]
    });
}

/// 3×3 sharpen kernel; sums to one, so flat regions are unchanged.
fn sharpen(img: &mut RgbaImage) {
    const KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];
    if img.width() < 3 || img.height() < 3 {
        return;
    }
    *img = image::imageops::filter3x3(img, &KERNEL);
}

fn sepia(img: &mut RgbaImage) {
    map_rgb(img, |[r, g, b]| {
        [
            r * 0.393 + g * 0.769 + b * 0.189,
            r * 0.349 + g * 0.686 + b * 0.168,
            r * 0.272 + g * 0.534 + b * 0.131,
        ]
    });
}

fn vintage(img: &mut RgbaImage) {
    map_rgb(img, |[r, g, b]| [r * 0.9, g * 0.8 + 20.0, b * 0.5]);
}

fn invert(img: &mut RgbaImage) {
    map_rgb(img, |[r, g, b]| [255.0 - r, 255.0 - g, 255.0 - b]);
}

/// Dark, high-contrast look with muted blues and deepened shadows.
fn gotham(img: &mut RgbaImage) {
    map_rgb(img, |[r, g, b]| {
        let mut r = contrast_about_mid(r, 1.4) * 0.9;
        let mut g = contrast_about_mid(g, 1.4) * 0.85;
        let mut b = (contrast_about_mid(b, 1.4) * 1.1).min(220.0);
        if r + g + b < 300.0 {
            r *= 0.8;
            g *= 0.8;
            b *= 0.9;
        }
        [r, g, b]
    });
}

/// Muted earthy tones with a light shared grain.
fn lofi(img: &mut RgbaImage, noise: &NoiseSource) {
    map_rgb_at(img, |x, y, [r, g, b]| {
        let grain = noise.signed(x, y, SALT_GRAIN, 5.0);
        [
            r * 0.8 + 40.0 + grain,
            g * 0.85 + 30.0 + grain,
            b * 0.7 + 20.0 + grain,
        ]
    });
}

fn pastel(img: &mut RgbaImage) {
    map_rgb(img, |[r, g, b]| {
        let avg = (r + g + b) / 3.0;
        [
            (avg * 0.7 + r * 0.3) * 1.1,
            (avg * 0.7 + g * 0.3) * 1.1,
            (avg * 0.7 + b * 0.3) * 1.1,
        ]
    });
}

/// Cool tones with soft contrast.
fn hudson(img: &mut RgbaImage) {
    let factor = (259.0 * (128.0 + 20.0)) / (255.0 * (259.0 - 20.0));
    map_rgb(img, |[r, g, b]| {
        [
            contrast_about_mid(r * 0.9, factor),
            contrast_about_mid(g * 0.95, factor),
            contrast_about_mid((b * 1.1).min(255.0), factor),
        ]
    });
}

/// Brightened with a pink cast.
fn amaro(img: &mut RgbaImage) {
    map_rgb(img, |[r, g, b]| {
        [
            (r * 1.15).min(255.0) * 1.05,
            g * 1.1,
            (b * 0.95).min(255.0) * 1.05,
        ]
    });
}

/// Cross-processing: saturation push plus a hard vignette.
fn xpro(img: &mut RgbaImage) {
    let (width, height) = img.dimensions();
    map_rgb_at(img, |x, y, [r, g, b]| {
        let avg = (r + g + b) / 3.0;
        let v = vignette_xpro(x, y, width, height);
        [
            (avg + 1.5 * (r - avg)) * v,
            (avg + 1.3 * (g - avg)) * v,
            (avg + 1.1 * (b - avg)) * v,
        ]
    });
}

/// Warm sunset tones with a gentle vignette.
fn sierra(img: &mut RgbaImage) {
    let (width, height) = img.dimensions();
    map_rgb_at(img, |x, y, [r, g, b]| {
        let v = vignette_sierra(x, y, width, height);
        [
            (r * 1.2).min(255.0) * v,
            (g * 0.9).min(255.0) * v,
            (b * 0.8).min(255.0) * v,
        ]
    });
}

/// Partial desaturation with warm highlights.
fn valencia(img: &mut RgbaImage) {
    map_rgb(img, |[r, g, b]| {
        let avg = (r + g + b) / 3.0;
        let r = ((avg * 0.3 + r * 0.7) * 1.1).min(255.0);
        let g = ((avg * 0.3 + g * 0.7) * 1.05).min(255.0);
        let b = (avg * 0.4 + b * 0.6) * 0.9;
        if (r + g + b) / 3.0 > 150.0 {
            [(r * 1.1).min(255.0), (g * 1.1).min(255.0), b]
        } else {
            [r, g, b]
        }
    });
}

/// Blue-white lunar grayscale.
fn moon(img: &mut RgbaImage) {
    let factor = (259.0 * (128.0 + 30.0)) / (255.0 * (259.0 - 30.0));
    map_rgb(img, |[r, g, b]| {
        let avg = (r + g + b) / 3.0;
        [
            contrast_about_mid(avg * 0.9, factor),
            contrast_about_mid(avg * 0.95, factor),
            contrast_about_mid((avg * 1.1).min(255.0), factor),
        ]
    });
}

/// Signature look: soft pink tint, lifted shadows, and sparse decorative
/// glints over bright regions, finished with a translucent pink wash.
///
/// Decoration placement is pseudo-random (seeded) and intentionally
/// approximate — the contract is the overall direction, not exact shapes.
fn robeautify(img: &mut RgbaImage, noise: &NoiseSource) {
    map_rgb(img, |[r, g, b]| {
        let brightness = (r + g + b) / 3.0;
        let mut r = (r * 1.08).min(230.0);
        let mut g = (g * 0.85).min(220.0);
        let mut b = (b * 1.05).min(230.0);
        if brightness < 100.0 {
            let lift = (100.0 - brightness) / 100.0 * 15.0;
            r += lift * 0.8;
            g += lift * 0.6;
            b += lift * 0.7;
        }
        [r, g, b]
    });

    decorate(img, noise);

    // Final wash: 20% pink over everything
    const PINK: [f32; 3] = [248.0, 110.0, 170.0];
    map_rgb(img, |[r, g, b]| {
        [
            r * 0.8 + PINK[0] * 0.2,
            g * 0.8 + PINK[1] * 0.2,
            b * 0.8 + PINK[2] * 0.2,
        ]
    });
}

/// Additively stamp small hearts and sparkles onto bright areas.
fn decorate(img: &mut RgbaImage, noise: &NoiseSource) {
    const DENSITY: f32 = 0.002;
    const SIZES: [f32; 3] = [1.2, 1.5, 1.8];
    const HEART: [f32; 3] = [255.0, 220.0, 230.0];
    const SPARKLE: [f32; 3] = [255.0, 255.0, 255.0];

    let (width, height) = img.dimensions();
    for y in (0..height).step_by(2) {
        for x in (0..width).step_by(2) {
            if noise.unit(x, y, SALT_DECOR_PLACE) >= DENSITY {
                continue;
            }
            let px = img.get_pixel(x, y).0;
            let brightness = (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0;
            if brightness <= 170.0 {
                continue;
            }

            let size = SIZES[(noise.hash(x, y, SALT_DECOR_SIZE) % 3) as usize];
            let (color, alpha) = if noise.unit(x, y, SALT_DECOR_KIND) > 0.3 {
                (HEART, 0.5 + noise.unit(x, y, SALT_DECOR_ALPHA) * 0.3)
            } else {
                (SPARKLE, 0.6 + noise.unit(x, y, SALT_DECOR_ALPHA) * 0.3)
            };
            stamp_glow(img, x, y, size, color, alpha);
        }
    }
}

/// Additive soft dot, the screen-blend stand-in for the tiny decorative
/// shapes (at 1–2px they read as glints either way).
fn stamp_glow(img: &mut RgbaImage, cx: u32, cy: u32, radius: f32, color: [f32; 3], alpha: f32) {
    let (width, height) = img.dimensions();
    let r = radius.ceil() as i64;
    for dy in -r..=r {
        for dx in -r..=r {
            let x = cx as i64 + dx;
            let y = cy as i64 + dy;
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                continue;
            }
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            if dist > radius {
                continue;
            }
            let falloff = alpha * (1.0 - dist / (radius + 1.0));
            let px = img.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                let v = px.0[c] as f32 + color[c] * falloff;
                px.0[c] = clamp_channel(v);
            }
        }
    }
}

/// Apply the four tonal sliders.
///
/// Exposure and contrast run as one combined multiplicative pass; saturation
/// and temperature as a second per-pixel pass. An identity [`Adjustments`]
/// leaves the buffer byte-for-byte untouched.
pub fn apply_adjustments(img: &mut RgbaImage, adjustments: &Adjustments) {
    if adjustments.is_identity() || img.width() == 0 || img.height() == 0 {
        return;
    }

    if adjustments.exposure != 0 || adjustments.contrast != 0 {
        let brightness = 1.0 + adjustments.exposure as f32 / 100.0;
        let contrast = 1.0 + adjustments.contrast as f32 / 100.0;
        map_rgb(img, |[r, g, b]| {
            [
                contrast_about_mid(r * brightness, contrast),
                contrast_about_mid(g * brightness, contrast),
                contrast_about_mid(b * brightness, contrast),
            ]
        });
    }

    if adjustments.saturation != 0 || adjustments.temperature != 0 {
        let saturation = 1.0 + adjustments.saturation as f32 / 100.0;
        // One signed formula covers both directions: positive shifts warm
        // (red up, blue down), negative cools by sign propagation.
        let warmth = adjustments.temperature as f32 * 2.55;
        map_rgb(img, |[mut r, mut g, mut b]| {
            if saturation != 1.0 {
                let gray = LUMA_R * r + LUMA_G * g + LUMA_B * b;
                r = (gray + (r - gray) * saturation).clamp(0.0, 255.0);
                g = (gray + (g - gray) * saturation).clamp(0.0, 255.0);
                b = (gray + (b - gray) * saturation).clamp(0.0, 255.0);
            }
            [r + warmth, g, b - warmth]
        });
    }
}
