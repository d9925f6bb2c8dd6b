//! The background raster layer.

use std::sync::Arc;

use crate::adjustments::FilterStack;
use crate::decode::{resize_by_scale, DecodeError, DecodedImage, FilterType};

/// The single raster beneath all annotations.
///
/// Keeps the decoded source (for its original dimensions) and a display copy
/// resized by `display_scale`. Both are shared by `Arc`, so history snapshots
/// never copy pixel data.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    source: Arc<DecodedImage>,
    display: Arc<DecodedImage>,
    display_scale: f64,
    offset_x: u32,
    offset_y: u32,
    filters: FilterStack,
}

impl BackgroundImage {
    /// Build a background shown at `display_scale`, centred on a canvas of
    /// `canvas_width x canvas_height` when it is smaller than the canvas.
    /// The display copy is resampled with `filter`.
    pub fn fit(
        source: DecodedImage,
        display_scale: f64,
        canvas_width: u32,
        canvas_height: u32,
        filter: FilterType,
    ) -> Result<Self, DecodeError> {
        let display = resize_by_scale(&source, display_scale, filter)?;
        let offset_x = canvas_width.saturating_sub(display.width) / 2;
        let offset_y = canvas_height.saturating_sub(display.height) / 2;
        Ok(Self {
            source: Arc::new(source),
            display: Arc::new(display),
            display_scale,
            offset_x,
            offset_y,
            filters: FilterStack::new(),
        })
    }

    pub(crate) fn from_parts(
        source: Arc<DecodedImage>,
        display: Arc<DecodedImage>,
        display_scale: f64,
        offset: (u32, u32),
        filters: FilterStack,
    ) -> Self {
        Self {
            source,
            display,
            display_scale,
            offset_x: offset.0,
            offset_y: offset.1,
            filters,
        }
    }

    /// Source pixel width (immutable).
    pub fn original_width(&self) -> u32 {
        self.source.width
    }

    /// Source pixel height (immutable).
    pub fn original_height(&self) -> u32 {
        self.source.height
    }

    pub fn display_scale(&self) -> f64 {
        self.display_scale
    }

    /// Top-left of the display raster on the canvas.
    pub fn offset(&self) -> (u32, u32) {
        (self.offset_x, self.offset_y)
    }

    pub fn source(&self) -> &Arc<DecodedImage> {
        &self.source
    }

    pub fn display(&self) -> &Arc<DecodedImage> {
        &self.display
    }

    pub fn filters(&self) -> &FilterStack {
        &self.filters
    }

    pub(crate) fn filters_mut(&mut self) -> &mut FilterStack {
        &mut self.filters
    }
}
