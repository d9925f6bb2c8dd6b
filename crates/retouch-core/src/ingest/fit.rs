//! Fit-to-viewport arithmetic.

use crate::config::IngestConfig;

/// Display scale and canvas size for an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub scale: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

/// `scale = min(vw / w, vh / h, 1)`, floored to `min_scale`; the canvas is
/// the scaled size rounded, floored to `min_canvas_px` per side.
pub fn compute_fit(width: u32, height: u32, config: &IngestConfig) -> Fit {
    let (w, h) = (width.max(1) as f64, height.max(1) as f64);
    let scale = (config.viewport_width as f64 / w)
        .min(config.viewport_height as f64 / h)
        .min(1.0)
        .max(config.min_scale);

    let side = |len: f64| ((len * scale).round() as u32).max(config.min_canvas_px);
    Fit {
        scale,
        canvas_width: side(w),
        canvas_height: side(h),
    }
}
