//! Editor bindings.
//!
//! [`JsEditor`] wraps the core facade one-to-one. Names, shapes and formats
//! are passed as strings (`"rect"`, `"brightness"`, `"png"`); structured
//! results come back as plain JavaScript objects.
//!
//! # Example
//!
//! ```typescript
//! import { JsEditor } from '@retouch/wasm';
//!
//! const editor = new JsEditor({ history: { capacity: 30 } });
//! editor.subscribe((state) => toolbar.update(state));
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const info = editor.upload_image(bytes, file.type);
//! editor.set_adjustment('brightness', 40);
//! setInterval(() => editor.tick(), 250);
//!
//! const png = editor.export('png');
//! ```

use std::sync::Arc;

use retouch_core::ingest::{DecodedUpload, PendingUpload};
use retouch_core::scene::{ObjectId, Point, ViewportTransform};
use retouch_core::{
    AdjustmentKind, Editor, EditorConfig, EditorError, ExportFormat, RasterBackend, RenderBackend,
    ShapeKind, Tool, UploadFile,
};
use wasm_bindgen::prelude::*;

use crate::types::{editor_error, js_error, parse_name, timestamp_from_millis, to_js};

/// The image editor, exposed to JavaScript.
#[wasm_bindgen]
pub struct JsEditor {
    inner: Editor,
    backend: Arc<RasterBackend>,
}

#[wasm_bindgen]
impl JsEditor {
    /// Create an editor. `config` may be omitted or a partial config object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsEditor, JsValue> {
        let config: EditorConfig = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_error)?
        };
        Self::from_config(config).map_err(editor_error)
    }

    /// Create an editor from a JSON configuration document.
    pub fn from_json(json: &str) -> Result<JsEditor, JsValue> {
        let config = EditorConfig::from_json(json).map_err(js_error)?;
        Self::from_config(config).map_err(editor_error)
    }

    /// Register a TrueType/OpenType font for text objects.
    ///
    /// The first font registered is used for families with no match.
    pub fn register_font(&mut self, family: &str, data: Vec<u8>) -> Result<(), JsValue> {
        self.backend.register_font(family, data).map_err(js_error)?;
        self.inner.refresh_filters();
        Ok(())
    }

    pub fn font_families(&self) -> Result<JsValue, JsValue> {
        to_js(&self.backend.font_families())
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Add a text object; returns its id.
    pub fn add_text(&mut self, content: &str) -> String {
        self.inner.add_text(content).to_string()
    }

    /// Add a `rect`, `circle` or `triangle`; returns its id.
    pub fn add_shape(&mut self, kind: &str) -> Result<String, JsValue> {
        let kind: ShapeKind = parse_name(kind).map_err(js_error)?;
        Ok(self.inner.add_shape(kind).to_string())
    }

    /// Add a freehand stroke from flat `[x0, y0, x1, y1, ...]` coordinates.
    ///
    /// Returns `undefined` when there are no complete points and throws
    /// `InvalidObject` for NaN or infinite coordinates.
    pub fn add_stroke(&mut self, coords: &[f32]) -> Result<Option<String>, JsValue> {
        let points: Vec<Point> = coords
            .chunks_exact(2)
            .map(|xy| Point::new(xy[0], xy[1]))
            .collect();
        let id = self.inner.add_stroke(&points).map_err(editor_error)?;
        Ok(id.map(|id| id.to_string()))
    }

    pub fn remove_object(&mut self, id: &str) -> Result<bool, JsValue> {
        let id: ObjectId = id.parse().map_err(js_error)?;
        Ok(self.inner.remove_object(id))
    }

    /// All objects in paint order.
    pub fn objects(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.scene().objects())
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Validate, decode and install an image in one call.
    pub fn upload_image(&mut self, bytes: Vec<u8>, mime: &str) -> Result<JsValue, JsValue> {
        let descriptor = self
            .inner
            .upload_image(UploadFile::new(bytes, mime))
            .map_err(editor_error)?;
        to_js(&descriptor)
    }

    /// First phase of a two-phase upload: validate and claim the latest slot.
    pub fn begin_upload(&mut self, bytes: Vec<u8>, mime: &str) -> Result<JsPendingUpload, JsValue> {
        self.inner
            .begin_upload(UploadFile::new(bytes, mime))
            .map(|inner| JsPendingUpload { inner })
            .map_err(|e| editor_error(e.into()))
    }

    /// Last phase: commit the decoded image unless a newer upload began.
    pub fn finish_upload(&mut self, decoded: JsDecodedUpload) -> Result<JsValue, JsValue> {
        let descriptor = self
            .inner
            .finish_upload(decoded.inner)
            .map_err(editor_error)?;
        to_js(&descriptor)
    }

    /// The current background's descriptor, or `null`.
    pub fn image_descriptor(&self) -> Result<JsValue, JsValue> {
        match self.inner.image_descriptor() {
            Some(descriptor) => to_js(&descriptor),
            None => Ok(JsValue::NULL),
        }
    }

    // ========================================================================
    // Adjustments
    // ========================================================================

    /// Move a slider. Returns `false` when no image is loaded.
    pub fn set_adjustment(&mut self, kind: &str, value: i32) -> Result<bool, JsValue> {
        let kind: AdjustmentKind = parse_name(kind).map_err(js_error)?;
        Ok(self.inner.set_adjustment(kind, value))
    }

    pub fn reset_adjustments(&mut self) -> bool {
        self.inner.reset_adjustments()
    }

    pub fn finetune_values(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.finetune_values())
    }

    pub fn filter_status(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.filter_status())
    }

    pub fn refresh_filters(&mut self) {
        self.inner.refresh_filters();
    }

    // ========================================================================
    // Canvas
    // ========================================================================

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.inner.resize_canvas(width, height).map_err(editor_error)
    }

    pub fn set_viewport(&mut self, zoom: f32, pan_x: f32, pan_y: f32) -> Result<(), JsValue> {
        self.inner
            .set_viewport(ViewportTransform { zoom, pan_x, pan_y })
            .map_err(editor_error)
    }

    // ========================================================================
    // History
    // ========================================================================

    pub fn undo(&mut self) -> Result<bool, JsValue> {
        self.inner.undo().map_err(editor_error)
    }

    pub fn redo(&mut self) -> Result<bool, JsValue> {
        self.inner.redo().map_err(editor_error)
    }

    #[wasm_bindgen(getter)]
    pub fn can_undo(&self) -> bool {
        self.inner.can_undo()
    }

    #[wasm_bindgen(getter)]
    pub fn can_redo(&self) -> bool {
        self.inner.can_redo()
    }

    /// Drive the history debounce. `now_ms` defaults to `Date.now()`.
    pub fn tick(&mut self, now_ms: Option<f64>) -> bool {
        let now_ms = now_ms.unwrap_or_else(js_sys::Date::now);
        match timestamp_from_millis(now_ms) {
            Some(now) => self.inner.tick(now),
            None => false,
        }
    }

    pub fn flush_history(&mut self) {
        self.inner.flush_history();
    }

    pub fn history_info(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.history_info())
    }

    pub fn clear_history(&mut self) -> Result<(), JsValue> {
        self.inner.clear_history().map_err(editor_error)
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Encode the current frame as `png` or `jpeg`.
    pub fn export(&self, format: &str) -> Result<Vec<u8>, JsValue> {
        let format: ExportFormat = parse_name(format).map_err(js_error)?;
        self.inner.export(format).map_err(editor_error)
    }

    /// `{ png: Uint8Array, jpeg: Uint8Array }`
    pub fn export_all(&self) -> Result<JsValue, JsValue> {
        let bundle = self.inner.export_all().map_err(editor_error)?;
        let out = js_sys::Object::new();
        js_sys::Reflect::set(
            &out,
            &JsValue::from_str("png"),
            &js_sys::Uint8Array::from(bundle.png.as_slice()),
        )?;
        js_sys::Reflect::set(
            &out,
            &JsValue::from_str("jpeg"),
            &js_sys::Uint8Array::from(bundle.jpeg.as_slice()),
        )?;
        Ok(out.into())
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn set_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        let tool: Tool = parse_name(tool).map_err(js_error)?;
        self.inner.set_tool(tool);
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn tool(&self) -> String {
        self.inner.current_tool().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn drawing_mode(&self) -> bool {
        self.inner.is_drawing_mode()
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.state())
    }

    /// Call `callback(state)` after every mutating call.
    pub fn subscribe(&mut self, callback: js_sys::Function) {
        self.inner.subscribe(move |state| {
            let value = match to_js(state) {
                Ok(value) => value,
                Err(e) => {
                    log::error!("Failed to convert editor state: {:?}", e);
                    return;
                }
            };
            if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                log::warn!("State listener threw: {:?}", e);
            }
        });
    }
}

impl JsEditor {
    pub(crate) fn from_config(config: EditorConfig) -> Result<Self, EditorError> {
        let backend = Arc::new(RasterBackend::new());
        let shared: Arc<dyn RenderBackend> = backend.clone();
        let inner = Editor::with_backend(config, shared)?;
        Ok(Self { inner, backend })
    }
}

/// A validated upload waiting to be decoded.
#[wasm_bindgen]
pub struct JsPendingUpload {
    inner: PendingUpload,
}

#[wasm_bindgen]
impl JsPendingUpload {
    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> u32 {
        self.inner.generation() as u32
    }

    /// Decode the image. Consumes the pending upload.
    pub fn decode(self) -> Result<JsDecodedUpload, JsValue> {
        self.inner
            .decode()
            .map(|inner| JsDecodedUpload { inner })
            .map_err(|e| editor_error(e.into()))
    }
}

/// A decoded upload ready for [`JsEditor::finish_upload`].
#[wasm_bindgen]
pub struct JsDecodedUpload {
    inner: DecodedUpload,
}

#[wasm_bindgen]
impl JsDecodedUpload {
    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> u32 {
        self.inner.generation() as u32
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.image().width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.image().height
    }
}
