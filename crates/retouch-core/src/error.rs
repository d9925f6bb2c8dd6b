//! Facade-level error type.
//!
//! Module errors ([`IngestError`], [`EncodeError`], [`SnapshotError`],
//! [`ConfigError`]) convert into [`EditorError`] so facade operations can
//! propagate them with `?`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::encode::EncodeError;
use crate::ingest::IngestError;
use crate::scene::SnapshotError;

/// Errors surfaced to the host by [`crate::Editor`] operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Upload validation, decode or fit failed; the scene is unchanged.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Flattening the scene to PNG/JPEG failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A history snapshot could not be restored; the live scene is unchanged.
    #[error("History restore failed: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The editor configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The scene has not painted a frame yet.
    #[error("Canvas not initialized: no frame has been rendered")]
    CanvasNotInitialized,

    /// Width or height is zero or otherwise unusable.
    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Zoom must be positive and finite; pan must be finite.
    #[error("Invalid viewport transform: zoom {zoom}, pan ({pan_x}, {pan_y})")]
    InvalidViewport { zoom: f32, pan_x: f32, pan_y: f32 },

    /// An object's geometry contains NaN or infinity.
    #[error("Invalid object: {field} must be finite")]
    InvalidObject { field: &'static str },
}

impl EditorError {
    /// Short machine-readable code for the host's error taxonomy.
    pub fn code(&self) -> &'static str {
        match self {
            EditorError::Ingest(e) => e.code(),
            EditorError::Encode(_) => "EncodeFailed",
            EditorError::Snapshot(_) => "SnapshotCorrupt",
            EditorError::Config(_) => "InvalidConfig",
            EditorError::CanvasNotInitialized => "CanvasNotInitialized",
            EditorError::InvalidDimensions { .. } => "InvalidDimensions",
            EditorError::InvalidViewport { .. } => "InvalidViewport",
            EditorError::InvalidObject { .. } => "InvalidObject",
        }
    }
}
