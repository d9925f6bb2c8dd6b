//! Image ingestion: validate an upload, decode it under a deadline, fit it
//! to the reference viewport and install it as the scene background.
//!
//! Failures never touch the scene. Ingestion is two-phase so a host can
//! decode off the main thread and still get latest-wins semantics:
//! the facade stamps each [`PendingUpload`] with a generation and refuses
//! to commit anything but the newest.

mod fit;
mod pending;
mod types;
mod validate;

use thiserror::Error;

use crate::config::IngestConfig;
use crate::decode::{DecodeError, DecodedImage};
use crate::error::EditorError;
use crate::scene::{BackgroundImage, Scene};

pub use fit::{compute_fit, Fit};
pub use pending::{DecodedUpload, PendingUpload};
pub use types::{ImageDescriptor, UploadFile};
pub use validate::{validate_decoded, validate_file};

/// Upload failures, in the order they are checked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("Unsupported file type '{mime}': please upload an image")]
    UnsupportedType { mime: String },

    #[error("File is too large ({size} bytes); the limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("File is too small ({size} bytes); the minimum is {min} bytes")]
    TooSmall { size: u64, min: u64 },

    #[error("Image decoding timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("Image is corrupt or unreadable: {0}")]
    Corrupt(String),

    #[error("Image is too small ({width}x{height}); each side must be at least {min} px")]
    DimensionTooSmall { width: u32, height: u32, min: u32 },

    #[error("Upload {generation} was superseded by upload {latest}")]
    Superseded { generation: u64, latest: u64 },
}

impl IngestError {
    /// Short machine-readable code for the host's error taxonomy.
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::UnsupportedType { .. } => "UnsupportedType",
            IngestError::TooLarge { .. } => "TooLarge",
            IngestError::TooSmall { .. } => "TooSmall",
            IngestError::Timeout { .. } => "Timeout",
            IngestError::Corrupt(_) => "Corrupt",
            IngestError::DimensionTooSmall { .. } => "DimensionTooSmall",
            IngestError::Superseded { .. } => "Superseded",
        }
    }
}

impl From<DecodeError> for IngestError {
    fn from(err: DecodeError) -> Self {
        IngestError::Corrupt(err.to_string())
    }
}

/// Fit `image` to the reference viewport and make it the scene's background.
///
/// Resizes the canvas, centres the image if the canvas was floored larger
/// than it, and discards all prior objects and filters.
pub fn load_as_background(
    scene: &mut Scene,
    image: DecodedImage,
    config: &IngestConfig,
) -> Result<ImageDescriptor, EditorError> {
    let (original_width, original_height) = (image.width, image.height);
    let fit = compute_fit(original_width, original_height, config);

    let background = BackgroundImage::fit(
        image,
        fit.scale,
        fit.canvas_width,
        fit.canvas_height,
        config.resize_filter,
    )
    .map_err(IngestError::from)?;
    scene.replace_with_background(background, fit.canvas_width, fit.canvas_height)?;

    log::info!(
        "Loaded {}x{} image at scale {:.3} onto {}x{} canvas",
        original_width,
        original_height,
        fit.scale,
        fit.canvas_width,
        fit.canvas_height
    );

    Ok(ImageDescriptor {
        original_width,
        original_height,
        canvas_width: fit.canvas_width,
        canvas_height: fit.canvas_height,
        scale: fit.scale,
    })
}
