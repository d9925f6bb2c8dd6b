//! Retouch Core - Image annotation and editing core
//!
//! This crate provides the editing core for Retouch: a scene of vector
//! annotations over a single background raster, non-destructive finetune
//! adjustments, image ingestion with fit-to-viewport, and snapshot-based
//! undo/redo. A host UI drives everything through [`Editor`].

pub mod adjustments;
pub mod config;
pub mod decode;
pub mod editor;
pub mod encode;
pub mod error;
pub mod history;
pub mod ingest;
pub mod render;
pub mod scene;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use adjustments::{AdjustmentFilter, AdjustmentKind, FilterOp, FilterStack};
pub use config::EditorConfig;
pub use editor::{CanvasDimensions, Editor, EditorState, Tool};
pub use error::EditorError;
pub use ingest::{ImageDescriptor, IngestError, UploadFile};
pub use render::{ExportFormat, RasterBackend, RenderBackend};
pub use scene::{DrawableObject, ObjectId, Scene, ShapeKind};

/// Current slider value for each of the eight finetune adjustments.
///
/// This is the UI-facing mirror of the filters present on the background
/// image; it is always derived from the filter list, never stored separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinetuneValues {
    /// Brightness (-100 to 100)
    pub brightness: i32,
    /// Contrast (-100 to 100)
    pub contrast: i32,
    /// Saturation (-100 to 100)
    pub saturation: i32,
    /// Exposure (-100 to 100)
    pub exposure: i32,
    /// Temperature (-100 cool to 100 warm)
    pub temperature: i32,
    /// Gamma (-100 to 100)
    pub gamma: i32,
    /// Clarity (0 to 100)
    pub clarity: i32,
    /// Vignette (0 to 100)
    pub vignette: i32,
}

impl FinetuneValues {
    /// Create a new FinetuneValues with every kind at neutral
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are neutral
    pub fn is_neutral(&self) -> bool {
        AdjustmentKind::ALL
            .iter()
            .all(|kind| self.get(*kind) == kind.neutral())
    }

    /// Get the value for one adjustment kind
    pub fn get(&self, kind: AdjustmentKind) -> i32 {
        match kind {
            AdjustmentKind::Brightness => self.brightness,
            AdjustmentKind::Contrast => self.contrast,
            AdjustmentKind::Saturation => self.saturation,
            AdjustmentKind::Exposure => self.exposure,
            AdjustmentKind::Temperature => self.temperature,
            AdjustmentKind::Gamma => self.gamma,
            AdjustmentKind::Clarity => self.clarity,
            AdjustmentKind::Vignette => self.vignette,
        }
    }

    /// Set the value for one adjustment kind (no clamping)
    pub fn set(&mut self, kind: AdjustmentKind, value: i32) {
        let slot = match kind {
            AdjustmentKind::Brightness => &mut self.brightness,
            AdjustmentKind::Contrast => &mut self.contrast,
            AdjustmentKind::Saturation => &mut self.saturation,
            AdjustmentKind::Exposure => &mut self.exposure,
            AdjustmentKind::Temperature => &mut self.temperature,
            AdjustmentKind::Gamma => &mut self.gamma,
            AdjustmentKind::Clarity => &mut self.clarity,
            AdjustmentKind::Vignette => &mut self.vignette,
        };
        *slot = value;
    }
}

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color '{0}': expected #rrggbb or #rrggbbaa")]
pub struct ColorParseError(pub String);

/// An 8-bit RGBA color, serialized as a `#rrggbb` / `#rrggbbaa` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.trim().trim_start_matches('#');
        let err = || ColorParseError(hex.to_string());
        if !digits.is_ascii() || !(digits.len() == 6 || digits.len() == 8) {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| err());
        let a = if digits.len() == 8 { channel(6)? } else { 0xff };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Format as lowercase hex, omitting alpha when opaque.
    pub fn to_hex(self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}
