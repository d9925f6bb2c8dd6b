//! The editor facade.
//!
//! [`Editor`] owns one [`Scene`] and one [`History`] and is the only thing a
//! host talks to. Every mutating call completes, records history, then
//! notifies subscribers with a fresh [`EditorState`].
//!
//! History granularity:
//! - discrete commands (objects, uploads, clear, reset, resize, viewport)
//!   save a snapshot immediately
//! - slider updates only mark the history dirty; the burst becomes one
//!   snapshot once [`Editor::tick`] sees the debounce window pass, or when
//!   the next discrete command, undo or redo forces it

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adjustments::{self, AdjustmentKind, FilterStatus};
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::history::{Debouncer, History, HistoryInfo};
use crate::ingest::{
    load_as_background, validate_file, DecodedUpload, ImageDescriptor, IngestError, PendingUpload,
    UploadFile,
};
use crate::render::{ExportFormat, ExportOptions, RasterBackend, RenderBackend};
use crate::scene::{DrawableObject, ObjectId, Point, Scene, ShapeKind, ViewportTransform};
use crate::FinetuneValues;

/// The active toolbar tool. Only `Draw` changes how the core behaves: it
/// enables freehand strokes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Draw,
    Text,
    Rect,
    Circle,
    Triangle,
    Image,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Draw => "draw",
            Tool::Text => "text",
            Tool::Rect => "rect",
            Tool::Circle => "circle",
            Tool::Triangle => "triangle",
            Tool::Image => "image",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

impl FromStr for Tool {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" => Ok(Tool::Select),
            "draw" => Ok(Tool::Draw),
            "text" => Ok(Tool::Text),
            "rect" | "rectangle" => Ok(Tool::Rect),
            "circle" => Ok(Tool::Circle),
            "triangle" => Ok(Tool::Triangle),
            "image" => Ok(Tool::Image),
            _ => Err(UnknownTool(s.to_string())),
        }
    }
}

/// Canvas size plus how the background maps onto it.
///
/// Without a background, `scale` is 1 and the original size equals the
/// canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDimensions {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub original_width: u32,
    pub original_height: u32,
}

/// Snapshot of everything the host UI reflects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub has_image: bool,
    pub canvas_dimensions: CanvasDimensions,
    pub finetune_values: FinetuneValues,
    pub current_tool: Tool,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Both encodings of the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub png: Vec<u8>,
    pub jpeg: Vec<u8>,
}

type Listener = Box<dyn FnMut(&EditorState)>;

pub struct Editor {
    config: EditorConfig,
    backend: Arc<dyn RenderBackend>,
    scene: Scene,
    history: History,
    debouncer: Debouncer,
    current_tool: Tool,
    upload_generation: u64,
    listeners: Vec<Listener>,
}

impl Editor {
    /// An editor painting with the default [`RasterBackend`].
    pub fn new(config: EditorConfig) -> Result<Self, EditorError> {
        Self::with_backend(config, Arc::new(RasterBackend::new()))
    }

    /// An editor painting through `backend`.
    ///
    /// The blank canvas is painted and recorded as the initial history state.
    pub fn with_backend(
        config: EditorConfig,
        backend: Arc<dyn RenderBackend>,
    ) -> Result<Self, EditorError> {
        config.validate()?;

        let mut scene = Scene::new(
            Arc::clone(&backend),
            config.canvas.width,
            config.canvas.height,
            config.canvas.background_color,
        )?;
        scene.render();
        let history = History::new(config.history.capacity, scene.to_snapshot()?);
        let debouncer = Debouncer::new(config.history.debounce_ms);

        Ok(Self {
            config,
            backend,
            scene,
            history,
            debouncer,
            current_tool: Tool::default(),
            upload_generation: 0,
            listeners: Vec::new(),
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn current_tool(&self) -> Tool {
        self.current_tool
    }

    /// Whether pointer drags should become freehand strokes.
    pub fn is_drawing_mode(&self) -> bool {
        self.current_tool == Tool::Draw
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Add a text object with the stock font and position.
    pub fn add_text(&mut self, content: impl Into<String>) -> ObjectId {
        self.insert(DrawableObject::text(content))
    }

    pub fn add_shape(&mut self, kind: ShapeKind) -> ObjectId {
        self.insert(DrawableObject::shape(kind))
    }

    /// Add a freehand stroke with the configured brush.
    ///
    /// Returns `Ok(None)` for an empty point list and `InvalidObject` when a
    /// point is NaN or infinite.
    pub fn add_stroke(&mut self, points: &[Point]) -> Result<Option<ObjectId>, EditorError> {
        if points.is_empty() {
            return Ok(None);
        }
        let brush = &self.config.brush;
        let stroke = DrawableObject::stroke(points, brush.width, brush.color);
        self.add_object(stroke).map(Some)
    }

    /// Add a caller-built object. Objects with non-finite geometry are
    /// rejected and the scene is left unchanged.
    pub fn add_object(&mut self, object: DrawableObject) -> Result<ObjectId, EditorError> {
        if let Some(field) = object.non_finite_field() {
            log::warn!("Rejecting {} object: {} is not finite", object.type_name(), field);
            return Err(EditorError::InvalidObject { field });
        }
        Ok(self.insert(object))
    }

    fn insert(&mut self, object: DrawableObject) -> ObjectId {
        self.flush_history();
        let id = self.scene.add_object(object);
        self.commit();
        id
    }

    /// Remove an object by id; unknown ids change nothing.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        self.flush_history();
        let removed = self.scene.remove_object(id);
        if removed {
            self.commit();
        }
        removed
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Validate, decode and install `file` as the background in one call.
    pub fn upload_image(&mut self, file: UploadFile) -> Result<ImageDescriptor, EditorError> {
        let pending = self.begin_upload(file)?;
        let decoded = pending.decode()?;
        self.finish_upload(decoded)
    }

    /// Check `file` against the byte limits and claim the newest upload slot.
    ///
    /// Any upload begun earlier is superseded once this returns `Ok`. The
    /// returned [`PendingUpload`] may be decoded on another thread.
    pub fn begin_upload(&mut self, file: UploadFile) -> Result<PendingUpload, IngestError> {
        validate_file(&file, &self.config.ingest)?;
        self.upload_generation += 1;
        log::debug!(
            "Upload {} accepted ({} bytes, {})",
            self.upload_generation,
            file.size(),
            file.mime
        );
        Ok(PendingUpload::new(
            self.upload_generation,
            file.bytes,
            Arc::clone(&self.backend),
            self.config.ingest.clone(),
        ))
    }

    /// Commit a decoded upload, unless a newer one has begun since.
    pub fn finish_upload(&mut self, decoded: DecodedUpload) -> Result<ImageDescriptor, EditorError> {
        if decoded.generation != self.upload_generation {
            log::debug!(
                "Discarding stale upload {} (latest is {})",
                decoded.generation,
                self.upload_generation
            );
            return Err(IngestError::Superseded {
                generation: decoded.generation,
                latest: self.upload_generation,
            }
            .into());
        }

        self.flush_history();
        let descriptor = load_as_background(&mut self.scene, decoded.image, &self.config.ingest)?;
        self.commit();
        Ok(descriptor)
    }

    /// The current background's descriptor, if there is one.
    pub fn image_descriptor(&self) -> Option<ImageDescriptor> {
        self.scene.background().map(|bg| ImageDescriptor {
            original_width: bg.original_width(),
            original_height: bg.original_height(),
            canvas_width: self.scene.width(),
            canvas_height: self.scene.height(),
            scale: bg.display_scale(),
        })
    }

    // ========================================================================
    // Adjustments
    // ========================================================================

    /// Move one slider. Returns `false` when there is no background.
    ///
    /// Re-sending the current (clamped) value changes nothing, so it neither
    /// starts a history entry nor discards the redo branch.
    pub fn set_adjustment(&mut self, kind: AdjustmentKind, value: i32) -> bool {
        if self.scene.has_background()
            && self.finetune_values().get(kind) == kind.clamp_value(value)
        {
            return true;
        }
        let applied = adjustments::update_value(&mut self.scene, kind, value);
        if applied {
            self.debouncer.mark(Utc::now());
            self.notify();
        }
        applied
    }

    /// Return every slider to neutral in one step.
    pub fn reset_adjustments(&mut self) -> bool {
        self.flush_history();
        let applied = adjustments::reset(&mut self.scene);
        if applied {
            self.commit();
        }
        applied
    }

    pub fn finetune_values(&self) -> FinetuneValues {
        adjustments::finetune_values(&self.scene)
    }

    pub fn filter_status(&self) -> Vec<FilterStatus> {
        adjustments::filter_status(&self.scene)
    }

    /// Repaint without changing any state.
    pub fn refresh_filters(&mut self) {
        self.scene.render();
    }

    // ========================================================================
    // Canvas
    // ========================================================================

    /// Return to the initial empty canvas. Undoable.
    pub fn clear(&mut self) {
        self.flush_history();
        self.scene.clear();
        self.commit();
    }

    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        self.flush_history();
        self.scene.resize(width, height)?;
        self.commit();
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: ViewportTransform) -> Result<(), EditorError> {
        self.flush_history();
        self.scene.set_viewport(viewport)?;
        self.commit();
        Ok(())
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Step back one state. Pending slider changes are saved first.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. A snapshot that
    /// fails to restore leaves the scene and cursor unchanged.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.flush_history();
        let moved = self.history.undo(&mut self.scene)?;
        if moved {
            self.notify();
        }
        Ok(moved)
    }

    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.flush_history();
        let moved = self.history.redo(&mut self.scene)?;
        if moved {
            self.notify();
        }
        Ok(moved)
    }

    /// Pending slider changes count as undoable.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.debouncer.is_pending()
    }

    /// Pending slider changes will discard the redo states when saved.
    pub fn can_redo(&self) -> bool {
        !self.debouncer.is_pending() && self.history.can_redo()
    }

    /// Save pending slider changes once they have been quiet long enough.
    /// Returns whether a snapshot was taken.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.debouncer.is_due(now) {
            self.flush_history();
            true
        } else {
            false
        }
    }

    /// Save pending slider changes now.
    pub fn flush_history(&mut self) {
        if self.debouncer.take() {
            self.save();
        }
    }

    pub fn history_info(&self) -> HistoryInfo {
        self.history.info()
    }

    /// Forget all undo/redo states, keeping the current scene as the only one.
    pub fn clear_history(&mut self) -> Result<(), EditorError> {
        self.debouncer.take();
        self.history.reset(self.scene.to_snapshot()?);
        self.notify();
        Ok(())
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Encode exactly what was last painted.
    ///
    /// JPEG flattens translucent pixels onto the canvas background color.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, EditorError> {
        let options = ExportOptions {
            jpeg_quality: self.config.export.jpeg_quality,
            matte: self.scene.background_color(),
        };
        self.scene.export(format, &options)
    }

    pub fn export_all(&self) -> Result<ExportBundle, EditorError> {
        Ok(ExportBundle {
            png: self.export(ExportFormat::Png)?,
            jpeg: self.export(ExportFormat::Jpeg)?,
        })
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn set_tool(&mut self, tool: Tool) {
        self.current_tool = tool;
        self.notify();
    }

    pub fn state(&self) -> EditorState {
        let (width, height) = (self.scene.width(), self.scene.height());
        let canvas_dimensions = match self.scene.background() {
            Some(bg) => CanvasDimensions {
                width,
                height,
                scale: bg.display_scale(),
                original_width: bg.original_width(),
                original_height: bg.original_height(),
            },
            None => CanvasDimensions {
                width,
                height,
                scale: 1.0,
                original_width: width,
                original_height: height,
            },
        };

        EditorState {
            has_image: self.scene.has_background(),
            canvas_dimensions,
            finetune_values: self.finetune_values(),
            current_tool: self.current_tool,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// Call `listener` with the new state after every mutating call.
    pub fn subscribe(&mut self, listener: impl FnMut(&EditorState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn save(&mut self) {
        if let Err(e) = self.history.save_state(&self.scene) {
            log::error!("Failed to capture history state: {}", e);
        }
    }

    fn commit(&mut self) {
        self.save();
        self.notify();
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let state = self.state();
        for listener in &mut self.listeners {
            listener(&state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::TimeDelta;

    use crate::decode::DecodedImage;

    fn editor() -> Editor {
        Editor::new(EditorConfig::default()).unwrap()
    }

    /// Install a background directly, skipping byte validation.
    fn with_background(editor: &mut Editor, width: u32, height: u32) {
        let image = DecodedImage::filled(width, height, [120, 90, 60, 255]);
        load_as_background(&mut editor.scene, image, &editor.config.ingest).unwrap();
        editor.commit();
    }

    #[test]
    fn test_new_editor_initial_state() {
        let editor = editor();
        let state = editor.state();
        assert!(!state.has_image);
        assert_eq!(state.canvas_dimensions.width, 800);
        assert_eq!(state.canvas_dimensions.height, 600);
        assert_eq!(state.current_tool, Tool::Select);
        assert!(!state.can_undo);
        assert!(!state.can_redo);
        assert!(state.finetune_values.is_neutral());
        assert_eq!(editor.history_info().total_states, 1);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = EditorConfig::default();
        config.canvas.width = 0;
        assert!(matches!(Editor::new(config), Err(EditorError::Config(_))));
    }

    #[test]
    fn test_add_objects_records_history() {
        let mut editor = editor();
        let text = editor.add_text("Hello");
        let rect = editor.add_shape(ShapeKind::Rect);
        assert_ne!(text, rect);
        assert_eq!(editor.scene().objects().len(), 2);
        assert_eq!(editor.history_info().total_states, 3);

        assert!(editor.undo().unwrap());
        assert_eq!(editor.scene().objects().len(), 1);
        assert!(editor.redo().unwrap());
        assert_eq!(editor.scene().objects().len(), 2);
    }

    #[test]
    fn test_add_stroke_uses_brush_config() {
        let mut editor = editor();
        assert!(editor.add_stroke(&[]).unwrap().is_none());

        let id = editor
            .add_stroke(&[Point::new(10.0, 20.0), Point::new(30.0, 25.0)])
            .unwrap()
            .unwrap();
        let stroke = editor.scene().object(id).unwrap();
        assert_eq!(stroke.style.stroke, Some(editor.config().brush.color));
        assert_eq!(stroke.style.stroke_width, 5.0);
        assert_eq!((stroke.left, stroke.top), (10.0, 20.0));
    }

    #[test]
    fn test_non_finite_stroke_rejected() {
        let mut editor = editor();
        editor.add_text("keep");
        let states = editor.history_info().total_states;

        let err = editor
            .add_stroke(&[Point::new(1.0, 2.0), Point::new(f32::NAN, 3.0)])
            .unwrap_err();
        assert!(matches!(err, EditorError::InvalidObject { field: "points" }));
        let err = editor
            .add_stroke(&[Point::new(f32::INFINITY, f32::NEG_INFINITY)])
            .unwrap_err();
        assert_eq!(err.code(), "InvalidObject");

        assert_eq!(editor.scene().objects().len(), 1);
        assert_eq!(editor.history_info().total_states, states);
        assert!(editor.undo().unwrap());
        assert!(editor.scene().objects().is_empty());
        assert!(editor.redo().unwrap());
        assert_eq!(editor.scene().objects().len(), 1);
    }

    #[test]
    fn test_add_object_rejects_non_finite_placement() {
        let mut editor = editor();
        let moved = DrawableObject::shape(ShapeKind::Rect).at(f32::NAN, 10.0);
        assert!(matches!(
            editor.add_object(moved),
            Err(EditorError::InvalidObject { field: "left" })
        ));
        assert!(editor.scene().objects().is_empty());
        assert!(!editor.can_undo());

        let placed = DrawableObject::shape(ShapeKind::Rect).at(5.0, 10.0);
        let id = editor.add_object(placed).unwrap();
        assert_eq!(editor.scene().object(id).map(|o| o.left), Some(5.0));
    }

    #[test]
    fn test_text_paints_with_registered_font() {
        let backend = Arc::new(RasterBackend::new());
        backend
            .register_font("Mono", include_bytes!("../tests/fonts/DejaVuSansMono.ttf").to_vec())
            .unwrap();
        let mut editor = Editor::with_backend(EditorConfig::default(), backend).unwrap();
        let blank = editor.scene().frame().unwrap().clone();

        editor.add_text("Hello\nworld");
        let frame = editor.scene().frame().unwrap();
        assert_ne!(*frame, blank);
        // Stock text sits at (50, 50); nothing left of or above it changes
        assert_eq!(frame.get_pixel(10, 10), blank.get_pixel(10, 10));
    }

    #[test]
    fn test_remove_unknown_object_is_noop() {
        let mut editor = editor();
        editor.add_text("a");
        let states = editor.history_info().total_states;
        assert!(!editor.remove_object(ObjectId::new()));
        assert_eq!(editor.history_info().total_states, states);
    }

    #[test]
    fn test_undo_redo_at_boundaries_are_noops() {
        let mut editor = editor();
        assert!(!editor.undo().unwrap());
        assert!(!editor.redo().unwrap());
    }

    #[test]
    fn test_set_adjustment_without_background_is_ignored() {
        let mut editor = editor();
        assert!(!editor.set_adjustment(AdjustmentKind::Brightness, 50));
        assert!(editor.finetune_values().is_neutral());
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_slider_burst_collapses_into_one_snapshot() {
        let mut editor = editor();
        with_background(&mut editor, 200, 100);
        let before = editor.history_info().total_states;

        for v in [10, 20, 30, 40] {
            assert!(editor.set_adjustment(AdjustmentKind::Contrast, v));
        }
        assert_eq!(editor.history_info().total_states, before);
        assert!(editor.can_undo());

        assert!(!editor.tick(Utc::now() - TimeDelta::seconds(10)));
        assert!(editor.tick(Utc::now() + TimeDelta::seconds(10)));
        assert_eq!(editor.history_info().total_states, before + 1);

        assert!(editor.undo().unwrap());
        assert!(editor.finetune_values().is_neutral());
        assert!(editor.redo().unwrap());
        assert_eq!(editor.finetune_values().contrast, 40);
    }

    #[test]
    fn test_repeating_current_value_keeps_redo() {
        let mut editor = editor();
        with_background(&mut editor, 200, 100);
        assert!(editor.set_adjustment(AdjustmentKind::Contrast, 40));
        assert!(editor.tick(Utc::now() + TimeDelta::seconds(10)));
        assert!(editor.undo().unwrap());
        assert!(editor.can_redo());
        let states = editor.history_info().total_states;

        assert!(editor.set_adjustment(AdjustmentKind::Contrast, 0));
        // Clarity clamps to 0, which is already its value
        assert!(editor.set_adjustment(AdjustmentKind::Clarity, -20));
        assert!(editor.can_redo());
        assert!(!editor.tick(Utc::now() + TimeDelta::seconds(10)));
        assert_eq!(editor.history_info().total_states, states);

        assert!(editor.redo().unwrap());
        assert_eq!(editor.finetune_values().contrast, 40);
    }

    #[test]
    fn test_undo_flushes_pending_slider_changes() {
        let mut editor = editor();
        with_background(&mut editor, 200, 100);
        editor.set_adjustment(AdjustmentKind::Gamma, 30);

        assert!(editor.undo().unwrap());
        assert_eq!(editor.finetune_values().gamma, 0);
        assert!(editor.can_redo());
    }

    #[test]
    fn test_reset_adjustments() {
        let mut editor = editor();
        assert!(!editor.reset_adjustments());

        with_background(&mut editor, 200, 100);
        editor.set_adjustment(AdjustmentKind::Saturation, -60);
        editor.set_adjustment(AdjustmentKind::Vignette, 40);
        assert_eq!(editor.filter_status().len(), 2);

        assert!(editor.reset_adjustments());
        assert!(editor.finetune_values().is_neutral());
        assert!(editor.filter_status().is_empty());
    }

    #[test]
    fn test_clear_is_undoable() {
        let mut editor = editor();
        with_background(&mut editor, 2000, 1000);
        editor.add_text("note");
        assert_eq!(editor.scene().width(), 800);
        assert_eq!(editor.scene().height(), 400);

        editor.clear();
        let state = editor.state();
        assert!(!state.has_image);
        assert_eq!(state.canvas_dimensions.height, 600);
        assert!(editor.scene().objects().is_empty());

        assert!(editor.undo().unwrap());
        assert!(editor.state().has_image);
        assert_eq!(editor.scene().objects().len(), 1);
    }

    #[test]
    fn test_resize_canvas_rejects_zero() {
        let mut editor = editor();
        let err = editor.resize_canvas(0, 10).unwrap_err();
        assert_eq!(err.code(), "InvalidDimensions");
        editor.resize_canvas(320, 240).unwrap();
        assert_eq!(editor.state().canvas_dimensions.width, 320);
    }

    #[test]
    fn test_resize_canvas_rejects_oversized() {
        let mut editor = editor();
        let states = editor.history_info().total_states;
        let err = editor.resize_canvas(u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, EditorError::InvalidDimensions { .. }));
        assert!(editor.resize_canvas(9000, 100).is_err());

        let dims = editor.state().canvas_dimensions;
        assert_eq!((dims.width, dims.height), (800, 600));
        assert_eq!(editor.history_info().total_states, states);
        let png = editor.export(ExportFormat::Png).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_invalid_viewport_rejected() {
        let mut editor = editor();
        let viewport = ViewportTransform {
            zoom: 0.0,
            ..ViewportTransform::default()
        };
        assert!(matches!(
            editor.set_viewport(viewport),
            Err(EditorError::InvalidViewport { .. })
        ));
    }

    #[test]
    fn test_state_reports_background_dimensions() {
        let mut editor = editor();
        with_background(&mut editor, 2000, 1000);
        let dims = editor.state().canvas_dimensions;
        assert_eq!((dims.width, dims.height), (800, 400));
        assert_eq!((dims.original_width, dims.original_height), (2000, 1000));
        assert!((dims.scale - 0.4).abs() < 1e-9);
        assert_eq!(editor.image_descriptor().unwrap().canvas_width, 800);
    }

    #[test]
    fn test_subscribers_notified() {
        let mut editor = editor();
        let seen: Rc<RefCell<Vec<EditorState>>> = Rc::default();
        let sink = Rc::clone(&seen);
        editor.subscribe(move |state| sink.borrow_mut().push(state.clone()));

        editor.set_tool(Tool::Draw);
        editor.add_shape(ShapeKind::Circle);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].current_tool, Tool::Draw);
        assert!(seen[1].can_undo);
        assert!(editor.is_drawing_mode());
    }

    #[test]
    fn test_clear_history() {
        let mut editor = editor();
        editor.add_text("a");
        editor.add_text("b");
        editor.clear_history().unwrap();
        assert_eq!(editor.history_info().total_states, 1);
        assert!(!editor.can_undo());
        assert_eq!(editor.scene().objects().len(), 2);
    }

    #[test]
    fn test_export_before_and_after_paint() {
        let editor = editor();
        let png = editor.export(ExportFormat::Png).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let bundle = editor.export_all().unwrap();
        assert_eq!(&bundle.jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_tool_parse_and_serde() {
        assert_eq!("Draw".parse::<Tool>().unwrap(), Tool::Draw);
        assert_eq!("rectangle".parse::<Tool>().unwrap(), Tool::Rect);
        assert!("lasso".parse::<Tool>().is_err());
        assert_eq!(serde_json::to_string(&Tool::Triangle).unwrap(), "\"triangle\"");
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let json = serde_json::to_value(editor().state()).unwrap();
        assert_eq!(json["hasImage"], false);
        assert_eq!(json["canvasDimensions"]["originalWidth"], 800);
        assert_eq!(json["currentTool"], "select");
        assert_eq!(json["finetuneValues"]["brightness"], 0);
    }
}
