//! Editor configuration.
//!
//! Configuration is organized into logical sections:
//! - Canvas defaults (size, background color)
//! - Ingestion limits (byte sizes, decode timeout, reference viewport)
//! - History (capacity, debounce window)
//! - Export (JPEG quality)
//! - Brush defaults for freehand strokes
//!
//! Every field has a default, so a host may supply a partial JSON document.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::FilterType;
use crate::scene::{is_valid_canvas_size, MAX_CANVAS_PIXELS, MAX_CANVAS_SIDE};
use crate::Color;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Canvas defaults used at startup and after `clear()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Default canvas width in pixels
    pub width: u32,
    /// Default canvas height in pixels
    pub height: u32,
    /// Fill color painted beneath everything
    pub background_color: Color,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background_color: Color::WHITE,
        }
    }
}

/// Limits and fit parameters for image ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Largest accepted upload in bytes
    pub max_bytes: u64,
    /// Smallest accepted upload in bytes
    pub min_bytes: u64,
    /// Decode deadline in milliseconds
    pub decode_timeout_ms: u64,
    /// Decoded images with a shorter side below this are rejected
    pub min_side_px: u32,
    /// Decoded images with a side above this are accepted with a warning
    pub warn_side_px: u32,
    /// Reference viewport width used for fitting
    pub viewport_width: u32,
    /// Reference viewport height used for fitting
    pub viewport_height: u32,
    /// Lower bound for the display scale
    pub min_scale: f64,
    /// Lower bound for each canvas side after fitting
    pub min_canvas_px: u32,
    /// Resampling filter for the display copy of an upload
    pub resize_filter: FilterType,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            min_bytes: 1024,
            decode_timeout_ms: 30_000,
            min_side_px: 10,
            warn_side_px: 4096,
            viewport_width: 800,
            viewport_height: 600,
            min_scale: 0.1,
            min_canvas_px: 100,
            resize_filter: FilterType::Bilinear,
        }
    }
}

impl IngestConfig {
    pub fn decode_timeout(&self) -> Duration {
        Duration::from_millis(self.decode_timeout_ms)
    }
}

/// Undo/redo history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept (oldest evicted first)
    pub capacity: usize,
    /// Quiet period before a burst of slider changes becomes one snapshot
    pub debounce_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            debounce_ms: 500,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { jpeg_quality: 92 }
    }
}

/// Freehand brush defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    pub width: f32,
    pub color: Color,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            width: 5.0,
            color: Color::BLACK,
        }
    }
}

/// Complete editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas: CanvasConfig,
    pub ingest: IngestConfig,
    pub history: HistoryConfig,
    pub export: ExportConfig,
    pub brush: BrushConfig,
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would break the editing core's invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !is_valid_canvas_size(self.canvas.width, self.canvas.height) {
            return invalid(format!(
                "canvas size must be non-zero, at most {MAX_CANVAS_SIDE} per side \
                 and {MAX_CANVAS_PIXELS} pixels, got {}x{}",
                self.canvas.width, self.canvas.height
            ));
        }

        let ingest = &self.ingest;
        if ingest.min_bytes > ingest.max_bytes {
            return invalid(format!(
                "ingest.min_bytes ({}) exceeds ingest.max_bytes ({})",
                ingest.min_bytes, ingest.max_bytes
            ));
        }
        if !is_valid_canvas_size(ingest.viewport_width, ingest.viewport_height) {
            return invalid(format!(
                "ingest viewport must be a valid canvas size, got {}x{}",
                ingest.viewport_width, ingest.viewport_height
            ));
        }
        if !is_valid_canvas_size(ingest.min_canvas_px, ingest.min_canvas_px) {
            return invalid(format!(
                "ingest.min_canvas_px must be a valid canvas side, got {}",
                ingest.min_canvas_px
            ));
        }
        if !(ingest.min_scale > 0.0 && ingest.min_scale <= 1.0) {
            return invalid(format!(
                "ingest.min_scale must be in (0, 1], got {}",
                ingest.min_scale
            ));
        }
        if ingest.decode_timeout_ms == 0 {
            return invalid("ingest.decode_timeout_ms must be non-zero".to_string());
        }

        if self.history.capacity == 0 {
            return invalid("history.capacity must be at least 1".to_string());
        }
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return invalid(format!(
                "export.jpeg_quality must be 1-100, got {}",
                self.export.jpeg_quality
            ));
        }
        if !(self.brush.width > 0.0) {
            return invalid(format!("brush.width must be positive, got {}", self.brush.width));
        }

        Ok(())
    }
}
