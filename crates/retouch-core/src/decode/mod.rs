//! Image decoding for Retouch.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG, GIF, WebP and BMP uploads to RGBA
//! - Correcting EXIF orientation so the raster is upright
//! - Resizing rasters for the display copy kept by the scene
//!
//! All operations are synchronous. Callers that need a deadline (ingestion)
//! wrap them; see [`crate::ingest`].

mod raster;
mod resize;
mod types;

pub use raster::decode_image;
pub use resize::{resize, resize_by_scale};
pub use types::{DecodeError, DecodedImage, FilterType, Orientation};
