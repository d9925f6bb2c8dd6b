//! Rendering backend.
//!
//! The scene never paints directly; it goes through a [`RenderBackend`]
//! constructed once and shared by `Arc`. [`RasterBackend`] is the CPU
//! implementation: SDF rasterization for shapes and strokes, `ab_glyph` for text.

mod raster;
mod shapes;
mod text;

use std::fmt;
use std::str::FromStr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{DecodeError, DecodedImage};
use crate::encode::EncodeError;
use crate::scene::{DrawableObject, ViewportTransform};
use crate::Color;

pub use raster::RasterBackend;

/// Surfaces are plain RGBA buffers.
pub type Surface = RgbaImage;

/// Errors raised while configuring a backend.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid font data for family '{0}'")]
    InvalidFont(String),
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
        })
    }
}

/// Error returned for an unknown export format name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown export format: {0} (expected png or jpeg)")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" | "image/png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" | "image/jpeg" => Ok(ExportFormat::Jpeg),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Encoder settings passed to [`RenderBackend::export_raster`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Color translucent pixels are flattened onto for JPEG
    pub matte: Color,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 92,
            matte: Color::WHITE,
        }
    }
}

/// Painting and codec capabilities used by the scene.
pub trait RenderBackend: Send + Sync {
    /// A new surface filled with `background`.
    fn create_surface(&self, width: u32, height: u32, background: Color) -> Surface;

    /// Composite `image` with its top-left at scene position `(x, y)`.
    fn draw_image(
        &self,
        surface: &mut Surface,
        image: &RgbaImage,
        x: u32,
        y: u32,
        viewport: &ViewportTransform,
    );

    /// Paint one annotation.
    fn draw_object(
        &self,
        surface: &mut Surface,
        object: &DrawableObject,
        viewport: &ViewportTransform,
    );

    fn decode_image(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError>;

    fn export_raster(
        &self,
        surface: &Surface,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// Source-over blend of `color` at `coverage` into one pixel.
#[inline]
pub(crate) fn blend_pixel(dst: &mut image::Rgba<u8>, color: [u8; 4], coverage: f32) {
    let a = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let dst_a = dst.0[3] as f32 / 255.0;
    let out_a = a + dst_a * (1.0 - a);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let src = color[c] as f32;
        let d = dst.0[c] as f32;
        let v = (src * a + d * dst_a * (1.0 - a)) / out_a;
        dst.0[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
