//! Pixel implementations of [`FilterOp`].
//!
//! All filters operate on 8-bit RGBA and leave alpha untouched. Intermediate
//! math is done in `f32` and written back with round-and-clamp.

use image::RgbaImage;

use super::{BlendMode, FilterOp, FilterStack};
use crate::Color;

/// Apply every filter in the stack, in canonical order, in place.
pub fn apply_filters(image: &mut RgbaImage, stack: &FilterStack) {
    for filter in stack.iter() {
        apply_op(image, &filter.op);
    }
}

fn apply_op(image: &mut RgbaImage, op: &FilterOp) {
    match *op {
        FilterOp::Brightness { brightness } => apply_brightness(image, brightness),
        FilterOp::Contrast { contrast } => apply_contrast(image, contrast),
        FilterOp::Saturation { saturation } => apply_saturation(image, saturation),
        FilterOp::BlendColor { color, mode, alpha } => apply_blend(image, color, mode, alpha),
        FilterOp::Gamma { gamma } => apply_gamma(image, gamma),
        FilterOp::Convolute { matrix, opacity } => apply_convolution(image, &matrix, opacity),
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Map each RGB channel through `f`, leaving alpha alone.
fn map_rgb(image: &mut RgbaImage, f: impl Fn(usize, f32) -> f32) {
    for px in image.pixels_mut() {
        for c in 0..3 {
            px.0[c] = to_u8(f(c, px.0[c] as f32));
        }
    }
}

/// Formula: `output = input + brightness * 255`
fn apply_brightness(image: &mut RgbaImage, brightness: f32) {
    let offset = brightness * 255.0;
    map_rgb(image, |_, v| v + offset);
}

/// Formula: `f = 259(c + 255) / (255(259 - c))`, `output = f(input - 128) + 128`
/// where `c = contrast * 255`.
fn apply_contrast(image: &mut RgbaImage, contrast: f32) {
    let c = contrast * 255.0;
    let factor = 259.0 * (c + 255.0) / (255.0 * (259.0 - c));
    map_rgb(image, |_, v| factor * (v - 128.0) + 128.0);
}

/// Channels move away from (positive) or toward (negative) the pixel's
/// maximum channel.
fn apply_saturation(image: &mut RgbaImage, saturation: f32) {
    let adjust = -saturation;
    for px in image.pixels_mut() {
        let [r, g, b, _] = px.0;
        let max = r.max(g).max(b) as f32;
        for c in 0..3 {
            let v = px.0[c] as f32;
            if v != max {
                px.0[c] = to_u8(v + (max - v) * adjust);
            }
        }
    }
}

fn apply_blend(image: &mut RgbaImage, color: Color, mode: BlendMode, alpha: f32) {
    let tint = [color.r as f32, color.g as f32, color.b as f32];
    let keep = 1.0 - alpha;
    match mode {
        BlendMode::Tint => map_rgb(image, |c, v| v * keep + tint[c] * alpha),
        BlendMode::Multiply => map_rgb(image, |c, v| v * keep + (v * tint[c] / 255.0) * alpha),
    }
}

/// Formula: `output = 255 * (input / 255) ^ (1 / gamma)`
fn apply_gamma(image: &mut RgbaImage, gamma: [f32; 3]) {
    let inv = gamma.map(|g| 1.0 / g);
    // 256-entry lookup per channel
    let lut: [[u8; 256]; 3] = std::array::from_fn(|c| {
        std::array::from_fn(|i| to_u8(255.0 * (i as f32 / 255.0).powf(inv[c])))
    });
    for px in image.pixels_mut() {
        for c in 0..3 {
            px.0[c] = lut[c][px.0[c] as usize];
        }
    }
}

/// 3x3 convolution with clamp-to-edge sampling, blended over the original
/// by `opacity`.
fn apply_convolution(image: &mut RgbaImage, matrix: &[f32; 9], opacity: f32) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || opacity <= 0.0 {
        return;
    }
    let source = image.clone();
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    for y in 0..height {
        for x in 0..width {
            let mut sum = [0.0f32; 3];
            for (k, weight) in matrix.iter().enumerate() {
                if *weight == 0.0 {
                    continue;
                }
                let sx = (x as i64 + (k % 3) as i64 - 1).clamp(0, max_x) as u32;
                let sy = (y as i64 + (k / 3) as i64 - 1).clamp(0, max_y) as u32;
                let sample = source.get_pixel(sx, sy).0;
                for c in 0..3 {
                    sum[c] += sample[c] as f32 * weight;
                }
            }

            let original = source.get_pixel(x, y).0;
            let out = image.get_pixel_mut(x, y);
            for c in 0..3 {
                let sharpened = sum[c].clamp(0.0, 255.0);
                out.0[c] = to_u8(original[c] as f32 * (1.0 - opacity) + sharpened * opacity);
            }
        }
    }
}
