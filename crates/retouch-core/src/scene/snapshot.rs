//! Scene snapshots for history.
//!
//! A snapshot is a JSON document describing the scene (size, viewport,
//! objects, background placement and filters) plus shared references to the
//! background rasters. Pixel data is never serialized.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{is_valid_canvas_size, BackgroundImage, DrawableObject, ViewportTransform};
use crate::adjustments::FilterStack;
use crate::decode::DecodedImage;
use crate::Color;

/// Current snapshot document version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised when a snapshot cannot be restored.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Snapshot references a background but carries no raster")]
    MissingRaster,

    #[error("Snapshot raster is {actual_width}x{actual_height}, document expects {expected_width}x{expected_height}")]
    RasterMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("Snapshot has invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Serializable description of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SceneDocument {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub background_color: Color,
    #[serde(default)]
    pub viewport: ViewportTransform,
    pub objects: Vec<DrawableObject>,
    pub background: Option<BackgroundState>,
}

/// Background placement and filters, without pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BackgroundState {
    pub original_width: u32,
    pub original_height: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub display_scale: f64,
    pub offset_x: u32,
    pub offset_y: u32,
    pub filters: FilterStack,
}

#[derive(Clone, PartialEq)]
pub(crate) struct BackgroundRaster {
    source: Arc<DecodedImage>,
    display: Arc<DecodedImage>,
}

/// An immutable, restorable copy of a [`super::Scene`].
#[derive(Clone, PartialEq)]
pub struct SceneSnapshot {
    document: String,
    raster: Option<BackgroundRaster>,
}

impl SceneSnapshot {
    pub(crate) fn capture(
        document: &SceneDocument,
        background: Option<&BackgroundImage>,
    ) -> Result<Self, SnapshotError> {
        Ok(Self {
            document: serde_json::to_string(document)?,
            raster: background.map(|bg| BackgroundRaster {
                source: Arc::clone(bg.source()),
                display: Arc::clone(bg.display()),
            }),
        })
    }

    /// Build a snapshot from a bare document with no background raster.
    pub fn from_document(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            raster: None,
        }
    }

    /// The JSON scene description.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn has_raster(&self) -> bool {
        self.raster.is_some()
    }

    /// Parse and check the snapshot without touching any scene.
    pub(crate) fn decode(
        &self,
    ) -> Result<(SceneDocument, Option<BackgroundImage>), SnapshotError> {
        let mut doc: SceneDocument = serde_json::from_str(&self.document)?;
        if doc.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(doc.version));
        }
        if !is_valid_canvas_size(doc.width, doc.height) {
            return Err(SnapshotError::InvalidSize {
                width: doc.width,
                height: doc.height,
            });
        }

        let background = match doc.background.take() {
            None => None,
            Some(state) => {
                let raster = self.raster.as_ref().ok_or(SnapshotError::MissingRaster)?;
                check_dims(state.original_width, state.original_height, &raster.source)?;
                check_dims(state.display_width, state.display_height, &raster.display)?;
                Some(BackgroundImage::from_parts(
                    Arc::clone(&raster.source),
                    Arc::clone(&raster.display),
                    state.display_scale,
                    (state.offset_x, state.offset_y),
                    state.filters,
                ))
            }
        };

        Ok((doc, background))
    }
}

fn check_dims(width: u32, height: u32, image: &DecodedImage) -> Result<(), SnapshotError> {
    if image.width != width || image.height != height {
        return Err(SnapshotError::RasterMismatch {
            expected_width: width,
            expected_height: height,
            actual_width: image.width,
            actual_height: image.height,
        });
    }
    Ok(())
}

impl BackgroundState {
    pub(crate) fn of(bg: &BackgroundImage) -> Self {
        let (offset_x, offset_y) = bg.offset();
        Self {
            original_width: bg.original_width(),
            original_height: bg.original_height(),
            display_width: bg.display().width,
            display_height: bg.display().height,
            display_scale: bg.display_scale(),
            offset_x,
            offset_y,
            filters: bg.filters().clone(),
        }
    }
}

impl fmt::Debug for SceneSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneSnapshot")
            .field("document_len", &self.document.len())
            .field("has_raster", &self.has_raster())
            .finish()
    }
}
