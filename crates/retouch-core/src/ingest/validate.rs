//! Upload checks that run before and after decoding.

use super::{IngestError, UploadFile};
use crate::config::IngestConfig;
use crate::decode::DecodedImage;

/// Checks that need no decoding: MIME type, then byte size.
pub fn validate_file(file: &UploadFile, config: &IngestConfig) -> Result<(), IngestError> {
    let mime = file.mime.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") {
        return Err(IngestError::UnsupportedType {
            mime: file.mime.clone(),
        });
    }

    let size = file.size();
    if size > config.max_bytes {
        return Err(IngestError::TooLarge {
            size,
            max: config.max_bytes,
        });
    }
    if size < config.min_bytes {
        return Err(IngestError::TooSmall {
            size,
            min: config.min_bytes,
        });
    }

    Ok(())
}

/// Checks on the decoded raster. Oversized images pass with a warning.
pub fn validate_decoded(image: &DecodedImage, config: &IngestConfig) -> Result<(), IngestError> {
    if image.is_empty() {
        return Err(IngestError::Corrupt(format!(
            "decoded image has invalid dimensions {}x{}",
            image.width, image.height
        )));
    }

    if image.min_side() < config.min_side_px {
        return Err(IngestError::DimensionTooSmall {
            width: image.width,
            height: image.height,
            min: config.min_side_px,
        });
    }

    if image.max_side() > config.warn_side_px {
        log::warn!(
            "Large image {}x{} exceeds {} px; it will be downscaled for display",
            image.width,
            image.height,
            config.warn_side_px
        );
    }

    Ok(())
}
