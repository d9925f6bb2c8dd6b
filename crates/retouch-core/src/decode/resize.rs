//! Raster resizing.
//!
//! All functions return new `DecodedImage` instances without modifying the input.

use super::{DecodeError, DecodedImage, FilterType};

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` if either target side is zero.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let rgba = image
        .to_rgba_image()
        .ok_or_else(|| DecodeError::CorruptedFile("pixel buffer size mismatch".to_string()))?;

    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());

    Ok(DecodedImage::from_rgba_image(resized))
}

/// Resize by a uniform factor, rounding each side and keeping it at least 1px.
///
/// A scale of exactly 1.0 (or anything that rounds back to the source size)
/// returns a clone.
pub fn resize_by_scale(
    image: &DecodedImage,
    scale: f64,
    filter: FilterType,
) -> Result<DecodedImage, DecodeError> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(DecodeError::InvalidDimensions {
            width: 0,
            height: 0,
        });
    }
    let width = scaled_side(image.width, scale);
    let height = scaled_side(image.height, scale);
    resize(image, width, height, filter)
}

fn scaled_side(side: u32, scale: f64) -> u32 {
    ((side as f64 * scale).round() as u32).max(1)
}
