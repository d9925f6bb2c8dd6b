//! Signed-distance rasterization of shapes and freehand strokes.
//!
//! Each pixel in the object's surface bounding box is mapped back into the
//! object's local frame (inverse viewport, inverse rotation about the centre,
//! inverse scale) and shaded by its distance to the outline.

use image::RgbaImage;

use super::blend_pixel;
use crate::scene::{DrawableObject, ObjectKind, Point, ViewportTransform};

// ============================================================================
// SDF functions (negative = inside)
// ============================================================================

/// Box centred at origin with half-extents (hx, hy).
#[inline]
fn sdf_box(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let dx = px.abs() - hx;
    let dy = py.abs() - hy;
    let outside = (dx.max(0.0) * dx.max(0.0) + dy.max(0.0) * dy.max(0.0)).sqrt();
    let inside = dx.max(dy).min(0.0);
    outside + inside
}

#[inline]
fn sdf_circle(px: f32, py: f32, r: f32) -> f32 {
    (px * px + py * py).sqrt() - r
}

/// Isoceles triangle with apex at top centre, base along the bottom edge.
#[inline]
fn sdf_triangle(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    sdf_polygon(&[(0.0, -hy), (hx, hy), (-hx, hy)], px, py)
}

/// Signed distance to a simple polygon.
fn sdf_polygon(verts: &[(f32, f32)], px: f32, py: f32) -> f32 {
    let n = verts.len();
    let mut d = (px - verts[0].0).powi(2) + (py - verts[0].1).powi(2);
    let mut s: f32 = 1.0;
    let mut j = n - 1;
    for i in 0..n {
        let ex = verts[j].0 - verts[i].0;
        let ey = verts[j].1 - verts[i].1;
        let wx = px - verts[i].0;
        let wy = py - verts[i].1;
        let t = ((wx * ex + wy * ey) / (ex * ex + ey * ey)).clamp(0.0, 1.0);
        let bx = wx - ex * t;
        let by = wy - ey * t;
        d = d.min(bx * bx + by * by);
        // Crossing test
        let c1 = py >= verts[i].1;
        let c2 = py < verts[j].1;
        let c3 = ex * wy > ey * wx;
        if (c1 && c2 && c3) || (!c1 && !c2 && !c3) {
            s = -s;
        }
        j = i;
    }
    s * d.sqrt()
}

/// Unsigned distance to a line segment.
#[inline]
fn sdf_segment(px: f32, py: f32, a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - a.x) * dx + (py - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = a.x + t * dx;
    let cy = a.y + t * dy;
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

fn sdf_polyline(points: &[Point], px: f32, py: f32) -> f32 {
    match points {
        [] => f32::INFINITY,
        [only] => sdf_segment(px, py, *only, *only),
        _ => points
            .windows(2)
            .map(|w| sdf_segment(px, py, w[0], w[1]))
            .fold(f32::INFINITY, f32::min),
    }
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Coverage of a region whose signed pixel distance is `d`.
#[inline]
fn fill_coverage(d: f32) -> f32 {
    1.0 - smoothstep(-0.5, 0.5, d)
}

/// Maps surface pixels into an object's local, centred frame.
struct LocalFrame {
    viewport: ViewportTransform,
    cx: f32,
    cy: f32,
    cos: f32,
    sin: f32,
    sx: f32,
    sy: f32,
    /// Local units to surface pixels
    px_per_unit: f32,
}

impl LocalFrame {
    fn new(object: &DrawableObject, width: f32, height: f32, viewport: &ViewportTransform) -> Self {
        let t = object.transform;
        let (sin, cos) = t.rotation.to_radians().sin_cos();
        Self {
            viewport: *viewport,
            cx: object.left + width * t.scale_x / 2.0,
            cy: object.top + height * t.scale_y / 2.0,
            cos,
            sin,
            sx: t.scale_x,
            sy: t.scale_y,
            px_per_unit: t.scale_x.abs().min(t.scale_y.abs()) * viewport.zoom,
        }
    }

    /// Surface pixel centre to local coordinates.
    fn to_local(&self, x: u32, y: u32) -> (f32, f32) {
        let (wx, wy) = self.viewport.invert(x as f32 + 0.5, y as f32 + 0.5);
        let dx = wx - self.cx;
        let dy = wy - self.cy;
        let rx = dx * self.cos + dy * self.sin;
        let ry = -dx * self.sin + dy * self.cos;
        (rx / self.sx, ry / self.sy)
    }

    /// Local coordinates to surface position.
    fn to_surface(&self, lx: f32, ly: f32) -> (f32, f32) {
        let dx = lx * self.sx;
        let dy = ly * self.sy;
        let wx = self.cx + dx * self.cos - dy * self.sin;
        let wy = self.cy + dx * self.sin + dy * self.cos;
        self.viewport.apply(wx, wy)
    }

    /// Surface pixel bounds of the local box `[-hx-m, hx+m] x [-hy-m, hy+m]`.
    fn surface_bounds(&self, hx: f32, hy: f32, margin: f32, surface: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        let (w, h) = surface.dimensions();
        let (hx, hy) = (hx + margin, hy + margin);
        let corners = [(-hx, -hy), (hx, -hy), (hx, hy), (-hx, hy)].map(|(x, y)| self.to_surface(x, y));

        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min).floor();
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min).floor();
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max).ceil();
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max).ceil();

        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }
        if max_x < 0.0 || max_y < 0.0 || min_x >= w as f32 || min_y >= h as f32 {
            return None;
        }
        Some((
            min_x.max(0.0) as u32,
            min_y.max(0.0) as u32,
            (max_x as u32).min(w),
            (max_y as u32).min(h),
        ))
    }
}

/// Paint a rect, circle, triangle or freehand stroke.
pub(crate) fn draw_shape(surface: &mut RgbaImage, object: &DrawableObject, viewport: &ViewportTransform) {
    let Some((width, height)) = object.extent() else {
        return;
    };
    if object.transform.scale_x == 0.0 || object.transform.scale_y == 0.0 {
        return;
    }
    let (hx, hy) = (width / 2.0, height / 2.0);
    let frame = LocalFrame::new(object, width, height, viewport);
    let style = object.style;

    if let ObjectKind::FreehandStroke { points, brush_width } = &object.kind {
        let Some(color) = style.stroke else {
            return;
        };
        let radius = brush_width / 2.0;
        let Some(bounds) = frame.surface_bounds(hx, hy, radius + 1.0, surface) else {
            return;
        };
        shade(surface, bounds, |x, y| {
            let (lx, ly) = frame.to_local(x, y);
            let d = sdf_polyline(points, lx + hx, ly + hy) - radius;
            vec![(color.to_array(), fill_coverage(d * frame.px_per_unit))]
        });
        return;
    }

    let sdf = |lx: f32, ly: f32| match &object.kind {
        ObjectKind::Rect { .. } => sdf_box(lx, ly, hx, hy),
        ObjectKind::Circle { radius } => sdf_circle(lx, ly, *radius),
        ObjectKind::Triangle { .. } => sdf_triangle(lx, ly, hx, hy),
        _ => f32::INFINITY,
    };

    let half_stroke = if style.stroke.is_some() {
        style.stroke_width.max(0.0) / 2.0
    } else {
        0.0
    };
    let Some(bounds) = frame.surface_bounds(hx, hy, half_stroke + 1.0, surface) else {
        return;
    };

    shade(surface, bounds, |x, y| {
        let (lx, ly) = frame.to_local(x, y);
        let d = sdf(lx, ly) * frame.px_per_unit;
        let mut layers = Vec::with_capacity(2);
        if let Some(fill) = style.fill {
            layers.push((fill.to_array(), fill_coverage(d)));
        }
        if let Some(stroke) = style.stroke {
            let half = half_stroke * frame.px_per_unit;
            if half > 0.0 {
                layers.push((stroke.to_array(), fill_coverage(d.abs() - half)));
            }
        }
        layers
    });
}

/// Blend the layers produced for each pixel inside `bounds`.
fn shade(
    surface: &mut RgbaImage,
    (x0, y0, x1, y1): (u32, u32, u32, u32),
    layers_at: impl Fn(u32, u32) -> Vec<([u8; 4], f32)>,
) {
    for y in y0..y1 {
        for x in x0..x1 {
            let layers = layers_at(x, y);
            let px = surface.get_pixel_mut(x, y);
            for (color, coverage) in layers {
                blend_pixel(px, color, coverage);
            }
        }
    }
}
