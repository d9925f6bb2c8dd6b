use serde::{Deserialize, Serialize};

/// Raw upload as handed over by the host's file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub bytes: Vec<u8>,
    /// MIME type reported by the host, e.g. `image/png`
    pub mime: String,
}

impl UploadFile {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of a successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub original_width: u32,
    pub original_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Display scale (at most 1.0)
    pub scale: f64,
}
