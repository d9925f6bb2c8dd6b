//! Text rasterization with `ab_glyph`.
//!
//! Text is laid out line by line (split on `\n`) from the object's top-left,
//! with kerning, and filled with the object's fill color. Rotation is not
//! applied to text; scale and viewport zoom are.

use ab_glyph::{point, Font, FontArc, PxScale, ScaleFont};
use image::RgbaImage;

use super::blend_pixel;
use crate::scene::{DrawableObject, ObjectKind, ViewportTransform};

/// Paint a text object with `font`.
pub(crate) fn draw_text(
    surface: &mut RgbaImage,
    font: &FontArc,
    object: &DrawableObject,
    viewport: &ViewportTransform,
) {
    let ObjectKind::Text {
        content, font_size, ..
    } = &object.kind
    else {
        return;
    };
    let Some(fill) = object.style.fill else {
        return;
    };
    let color = fill.to_array();

    let scale = PxScale {
        x: font_size * object.transform.scale_x.abs() * viewport.zoom,
        y: font_size * object.transform.scale_y.abs() * viewport.zoom,
    };
    if !(scale.x > 0.0 && scale.y > 0.0) {
        return;
    }

    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let line_height = scaled.height() + scaled.line_gap();
    let (origin_x, origin_y) = viewport.apply(object.left, object.top);
    let (width, height) = surface.dimensions();

    for (line_index, line) in content.split('\n').enumerate() {
        let baseline = origin_y + ascent + line_index as f32 * line_height;
        let mut cursor_x = origin_x;
        let mut previous = None;

        for ch in line.chars() {
            let glyph_id = font.glyph_id(ch);
            if let Some(prev) = previous {
                cursor_x += scaled.kern(prev, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, baseline));
            cursor_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                    return;
                }
                blend_pixel(surface.get_pixel_mut(x as u32, y as u32), color, coverage);
            });
        }
    }
}
