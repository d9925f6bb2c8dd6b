//! Decode phase of a two-phase upload.

use std::sync::Arc;
use std::time::Duration;

use super::{validate_decoded, IngestError};
use crate::config::IngestConfig;
use crate::decode::DecodedImage;
use crate::render::RenderBackend;

/// A validated upload waiting to be decoded.
///
/// Produced by `Editor::begin_upload`. It owns everything it needs, so
/// [`PendingUpload::decode`] can run on any thread.
pub struct PendingUpload {
    generation: u64,
    bytes: Arc<Vec<u8>>,
    backend: Arc<dyn RenderBackend>,
    config: IngestConfig,
}

/// A decoded upload ready to be committed by `Editor::finish_upload`.
#[derive(Debug, Clone)]
pub struct DecodedUpload {
    pub(crate) generation: u64,
    pub(crate) image: DecodedImage,
}

impl DecodedUpload {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }
}

impl PendingUpload {
    pub(crate) fn new(
        generation: u64,
        bytes: Vec<u8>,
        backend: Arc<dyn RenderBackend>,
        config: IngestConfig,
    ) -> Self {
        Self {
            generation,
            bytes: Arc::new(bytes),
            backend,
            config,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Decode and check the raster.
    ///
    /// On native targets the decode runs on a worker thread and is abandoned
    /// with [`IngestError::Timeout`] once the configured deadline passes.
    pub fn decode(self) -> Result<DecodedUpload, IngestError> {
        let image = decode_with_deadline(
            Arc::clone(&self.backend),
            Arc::clone(&self.bytes),
            self.config.decode_timeout(),
        )?;
        validate_decoded(&image, &self.config)?;
        Ok(DecodedUpload {
            generation: self.generation,
            image,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn decode_with_deadline(
    backend: Arc<dyn RenderBackend>,
    bytes: Arc<Vec<u8>>,
    timeout: Duration,
) -> Result<DecodedImage, IngestError> {
    use std::sync::mpsc::{self, RecvTimeoutError};
    use std::thread;

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("retouch-decode".to_string())
        .spawn(move || {
            // Receiver may be gone after a timeout
            let _ = tx.send(backend.decode_image(&bytes));
        })
        .map_err(|e| IngestError::Corrupt(format!("could not start decoder: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map_err(IngestError::from),
        Err(RecvTimeoutError::Timeout) => {
            let after_ms = timeout.as_millis() as u64;
            log::warn!("Image decode abandoned after {} ms", after_ms);
            Err(IngestError::Timeout { after_ms })
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(IngestError::Corrupt("decoder stopped unexpectedly".to_string()))
        }
    }
}

/// No threads on wasm32: the host enforces its own deadline around the call.
#[cfg(target_arch = "wasm32")]
fn decode_with_deadline(
    backend: Arc<dyn RenderBackend>,
    bytes: Arc<Vec<u8>>,
    _timeout: Duration,
) -> Result<DecodedImage, IngestError> {
    backend.decode_image(&bytes).map_err(IngestError::from)
}
