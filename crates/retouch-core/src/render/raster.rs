//! CPU rendering backend.

use std::sync::{PoisonError, RwLock};

use ab_glyph::FontArc;
use image::RgbaImage;

use super::shapes::draw_shape;
use super::text::draw_text;
use super::{blend_pixel, ExportFormat, ExportOptions, RenderBackend, RenderError, Surface};
use crate::decode::{decode_image, DecodeError, DecodedImage};
use crate::encode::{encode_jpeg, encode_png, EncodeError};
use crate::scene::{DrawableObject, ObjectKind, ViewportTransform};
use crate::Color;

/// Default backend: `image` surfaces, SDF shapes, `ab_glyph` text.
///
/// Fonts are registered by family name. Text asks for its `font_family`
/// (case-insensitive); unknown families fall back to the first registered
/// font. With no fonts registered, text objects are skipped.
#[derive(Default)]
pub struct RasterBackend {
    fonts: RwLock<Vec<(String, FontArc)>>,
}

impl RasterBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TrueType/OpenType font under `family`, replacing any
    /// earlier font with the same name.
    pub fn register_font(&self, family: impl Into<String>, data: Vec<u8>) -> Result<(), RenderError> {
        let family = family.into();
        let font = FontArc::try_from_vec(data).map_err(|_| RenderError::InvalidFont(family.clone()))?;

        let mut fonts = self.fonts.write().unwrap_or_else(PoisonError::into_inner);
        match fonts.iter_mut().find(|(name, _)| name.eq_ignore_ascii_case(&family)) {
            Some(slot) => slot.1 = font,
            None => fonts.push((family.clone(), font)),
        }
        log::debug!("Registered font family '{}'", family);
        Ok(())
    }

    /// Registered family names in registration order.
    pub fn font_families(&self) -> Vec<String> {
        let fonts = self.fonts.read().unwrap_or_else(PoisonError::into_inner);
        fonts.iter().map(|(name, _)| name.clone()).collect()
    }

    fn font_for(&self, family: &str) -> Option<FontArc> {
        let fonts = self.fonts.read().unwrap_or_else(PoisonError::into_inner);
        fonts
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(family))
            .or_else(|| fonts.first())
            .map(|(_, font)| font.clone())
    }
}

impl RenderBackend for RasterBackend {
    fn create_surface(&self, width: u32, height: u32, background: Color) -> Surface {
        RgbaImage::from_pixel(width, height, image::Rgba(background.to_array()))
    }

    fn draw_image(
        &self,
        surface: &mut Surface,
        image: &RgbaImage,
        x: u32,
        y: u32,
        viewport: &ViewportTransform,
    ) {
        if viewport.is_identity() {
            image::imageops::overlay(surface, image, x as i64, y as i64);
            return;
        }

        // Nearest-neighbour resample through the inverse viewport
        let (iw, ih) = image.dimensions();
        let (sw, sh) = surface.dimensions();
        for sy in 0..sh {
            for sx in 0..sw {
                let (wx, wy) = viewport.invert(sx as f32 + 0.5, sy as f32 + 0.5);
                let lx = (wx - x as f32).floor();
                let ly = (wy - y as f32).floor();
                if lx < 0.0 || ly < 0.0 || lx >= iw as f32 || ly >= ih as f32 {
                    continue;
                }
                let src = image.get_pixel(lx as u32, ly as u32).0;
                blend_pixel(surface.get_pixel_mut(sx, sy), src, 1.0);
            }
        }
    }

    fn draw_object(
        &self,
        surface: &mut Surface,
        object: &DrawableObject,
        viewport: &ViewportTransform,
    ) {
        match &object.kind {
            ObjectKind::Text { font_family, .. } => match self.font_for(font_family) {
                Some(font) => draw_text(surface, &font, object, viewport),
                None => log::debug!("No font registered; skipping text object {}", object.id),
            },
            _ => draw_shape(surface, object, viewport),
        }
    }

    fn decode_image(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        decode_image(bytes)
    }

    fn export_raster(
        &self,
        surface: &Surface,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, EncodeError> {
        let (width, height) = surface.dimensions();
        match format {
            ExportFormat::Png => encode_png(surface.as_raw(), width, height),
            ExportFormat::Jpeg => {
                let m = options.matte;
                encode_jpeg(surface.as_raw(), width, height, options.jpeg_quality, [m.r, m.g, m.b])
            }
        }
    }
}
