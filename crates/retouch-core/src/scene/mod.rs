//! The scene: an ordered list of drawable objects over one optional
//! background raster.
//!
//! Paint order is fixed: canvas fill, then the background (with its filters
//! applied), then objects in insertion order. Every mutating call repaints
//! through the injected [`RenderBackend`], and the last painted frame is what
//! [`Scene::export`] encodes.

mod background;
mod object;
mod snapshot;

use std::sync::Arc;

use image::RgbaImage;

use crate::adjustments::apply_filters;
use crate::error::EditorError;
use crate::render::{ExportFormat, ExportOptions, RenderBackend};
use crate::Color;

pub use background::BackgroundImage;
pub use object::{
    DrawableObject, ObjectId, ObjectKind, Point, ShapeKind, Style, Transform, UnknownShape,
    ViewportTransform,
};
pub use snapshot::{SceneSnapshot, SnapshotError, SNAPSHOT_VERSION};

use snapshot::{BackgroundState, SceneDocument};

/// Longest canvas side in pixels.
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// Largest canvas area in pixels.
pub const MAX_CANVAS_PIXELS: u64 = 1 << 25;

/// True when a `width x height` canvas can be allocated and painted.
pub fn is_valid_canvas_size(width: u32, height: u32) -> bool {
    width > 0
        && height > 0
        && width <= MAX_CANVAS_SIDE
        && height <= MAX_CANVAS_SIDE
        && width as u64 * height as u64 <= MAX_CANVAS_PIXELS
}

pub struct Scene {
    backend: Arc<dyn RenderBackend>,
    default_width: u32,
    default_height: u32,
    default_color: Color,
    width: u32,
    height: u32,
    background_color: Color,
    viewport: ViewportTransform,
    objects: Vec<DrawableObject>,
    background: Option<BackgroundImage>,
    frame: Option<RgbaImage>,
}

impl Scene {
    /// Create an empty scene. Nothing is painted until the first mutation or
    /// [`Scene::render`].
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        width: u32,
        height: u32,
        background_color: Color,
    ) -> Result<Self, EditorError> {
        check_size(width, height)?;
        Ok(Self {
            backend,
            default_width: width,
            default_height: height,
            default_color: background_color,
            width,
            height,
            background_color,
            viewport: ViewportTransform::default(),
            objects: Vec::new(),
            background: None,
            frame: None,
        })
    }

    pub fn backend(&self) -> &Arc<dyn RenderBackend> {
        &self.backend
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The size the scene returns to on `clear()` or when the background is removed.
    pub fn default_size(&self) -> (u32, u32) {
        (self.default_width, self.default_height)
    }

    pub fn background_color(&self) -> Color {
        self.background_color
    }

    pub fn viewport(&self) -> ViewportTransform {
        self.viewport
    }

    /// Objects in paint order (topmost last).
    pub fn objects(&self) -> &[DrawableObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&DrawableObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    pub(crate) fn background_mut(&mut self) -> Option<&mut BackgroundImage> {
        self.background.as_mut()
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// The last painted frame.
    pub fn frame(&self) -> Option<&RgbaImage> {
        self.frame.as_ref()
    }

    /// Append an object on top and repaint.
    pub fn add_object(&mut self, object: DrawableObject) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        self.render();
        id
    }

    /// Remove an object. Absent ids are ignored; returns whether anything was removed.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| o.id != id);
        let removed = self.objects.len() != before;
        if removed {
            self.render();
        }
        removed
    }

    /// Replace the background. `None` clears it and restores the default size.
    pub fn set_background_image(&mut self, background: Option<BackgroundImage>) {
        if background.is_none() {
            self.width = self.default_width;
            self.height = self.default_height;
        }
        self.background = background;
        self.render();
    }

    /// Install a new background on a canvas of the given size, discarding all
    /// objects. Nothing changes if the size is invalid.
    pub fn replace_with_background(
        &mut self,
        background: BackgroundImage,
        width: u32,
        height: u32,
    ) -> Result<(), EditorError> {
        check_size(width, height)?;
        self.objects.clear();
        self.background = Some(background);
        self.width = width;
        self.height = height;
        self.render();
        Ok(())
    }

    /// Change the canvas size, keeping the viewport transform.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        check_size(width, height)?;
        self.width = width;
        self.height = height;
        self.render();
        Ok(())
    }

    pub fn set_viewport(&mut self, viewport: ViewportTransform) -> Result<(), EditorError> {
        if !(viewport.zoom.is_finite() && viewport.zoom > 0.0)
            || !viewport.pan_x.is_finite()
            || !viewport.pan_y.is_finite()
        {
            return Err(EditorError::InvalidViewport {
                zoom: viewport.zoom,
                pan_x: viewport.pan_x,
                pan_y: viewport.pan_y,
            });
        }
        self.viewport = viewport;
        self.render();
        Ok(())
    }

    /// Remove everything and return to the configured size and fill.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.background = None;
        self.width = self.default_width;
        self.height = self.default_height;
        self.background_color = self.default_color;
        self.viewport = ViewportTransform::default();
        self.render();
    }

    /// Paint the whole scene into a fresh frame.
    pub fn render(&mut self) {
        let backend = &self.backend;
        let mut surface = backend.create_surface(self.width, self.height, self.background_color);

        if let Some(bg) = &self.background {
            let display = bg.display();
            if let Some(mut raster) = display.to_rgba_image() {
                apply_filters(&mut raster, bg.filters());
                let (x, y) = bg.offset();
                backend.draw_image(&mut surface, &raster, x, y, &self.viewport);
            } else {
                log::error!(
                    "Background raster {}x{} has a mismatched buffer; skipped",
                    display.width,
                    display.height
                );
            }
        }

        for object in &self.objects {
            backend.draw_object(&mut surface, object, &self.viewport);
        }

        self.frame = Some(surface);
    }

    /// Encode the last painted frame.
    pub fn export(
        &self,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<Vec<u8>, EditorError> {
        let frame = self.frame.as_ref().ok_or(EditorError::CanvasNotInitialized)?;
        Ok(self.backend.export_raster(frame, format, options)?)
    }

    pub fn to_snapshot(&self) -> Result<SceneSnapshot, SnapshotError> {
        let document = SceneDocument {
            version: SNAPSHOT_VERSION,
            width: self.width,
            height: self.height,
            background_color: self.background_color,
            viewport: self.viewport,
            objects: self.objects.clone(),
            background: self.background.as_ref().map(BackgroundState::of),
        };
        SceneSnapshot::capture(&document, self.background.as_ref())
    }

    /// Replace the scene's state with the snapshot's and repaint.
    ///
    /// The snapshot is fully decoded first; on error the scene is untouched.
    pub fn restore_from_snapshot(&mut self, snapshot: &SceneSnapshot) -> Result<(), SnapshotError> {
        let (document, background) = snapshot.decode()?;

        self.width = document.width;
        self.height = document.height;
        self.background_color = document.background_color;
        self.viewport = document.viewport;
        self.objects = document.objects;
        self.background = background;
        self.render();
        Ok(())
    }
}

fn check_size(width: u32, height: u32) -> Result<(), EditorError> {
    if !is_valid_canvas_size(width, height) {
        return Err(EditorError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjustments::{update_value, AdjustmentKind};
    use crate::decode::{DecodedImage, FilterType};
    use crate::render::RasterBackend;

    fn scene() -> Scene {
        Scene::new(Arc::new(RasterBackend::new()), 200, 150, Color::WHITE).unwrap()
    }

    fn with_background(scene: &mut Scene) {
        let bg = BackgroundImage::fit(
            DecodedImage::filled(40, 20, [100, 50, 25, 255]),
            1.0,
            100,
            100,
            FilterType::Bilinear,
        )
        .unwrap();
        scene.replace_with_background(bg, 100, 100).unwrap();
    }

    #[test]
    fn test_new_rejects_zero_size() {
        let result = Scene::new(Arc::new(RasterBackend::new()), 0, 10, Color::WHITE);
        assert!(matches!(
            result,
            Err(EditorError::InvalidDimensions {
                width: 0,
                height: 10
            })
        ));
    }

    #[test]
    fn test_add_object_paints_frame() {
        let mut scene = scene();
        assert!(scene.frame().is_none());

        let id = scene.add_object(DrawableObject::shape(ShapeKind::Rect).at(10.0, 10.0));
        assert_eq!(scene.objects().len(), 1);
        assert_eq!(scene.object(id).unwrap().id, id);

        let frame = scene.frame().unwrap();
        assert_eq!(frame.dimensions(), (200, 150));
        // Rect interior is red
        assert_eq!(frame.get_pixel(50, 50).0, [255, 0, 0, 255]);
        // Outside stays white
        assert_eq!(frame.get_pixel(190, 140).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut scene = scene();
        scene.add_object(DrawableObject::text("a"));
        assert!(!scene.remove_object(ObjectId::new()));
        assert_eq!(scene.objects().len(), 1);
    }

    #[test]
    fn test_remove_object() {
        let mut scene = scene();
        let id = scene.add_object(DrawableObject::shape(ShapeKind::Circle));
        assert!(scene.remove_object(id));
        assert!(scene.objects().is_empty());
    }

    #[test]
    fn test_export_before_render_fails() {
        let scene = scene();
        let result = scene.export(ExportFormat::Png, &ExportOptions::default());
        assert!(matches!(result, Err(EditorError::CanvasNotInitialized)));
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut scene = scene();
        with_background(&mut scene);
        scene.add_object(DrawableObject::shape(ShapeKind::Triangle));
        update_value(&mut scene, AdjustmentKind::Contrast, 40);

        scene.render();
        let first = scene.frame().unwrap().clone();
        scene.render();
        assert_eq!(scene.frame().unwrap(), &first);
    }

    #[test]
    fn test_background_painted_first_and_centred() {
        let mut scene = scene();
        with_background(&mut scene);
        let frame = scene.frame().unwrap();
        assert_eq!(frame.dimensions(), (100, 100));
        // 40x20 centred on 100x100 starts at (30, 40)
        assert_eq!(frame.get_pixel(30, 40).0, [100, 50, 25, 255]);
        assert_eq!(frame.get_pixel(29, 40).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_replace_with_background_discards_objects() {
        let mut scene = scene();
        scene.add_object(DrawableObject::text("note"));
        with_background(&mut scene);
        assert!(scene.objects().is_empty());
        assert!(scene.has_background());
    }

    #[test]
    fn test_replace_with_invalid_size_changes_nothing() {
        let mut scene = scene();
        scene.add_object(DrawableObject::text("note"));
        let bg = BackgroundImage::fit(
            DecodedImage::filled(4, 4, [0, 0, 0, 255]),
            1.0,
            4,
            4,
            FilterType::Bilinear,
        )
        .unwrap();
        assert!(scene.replace_with_background(bg, 0, 4).is_err());
        assert_eq!(scene.objects().len(), 1);
        assert!(!scene.has_background());
    }

    #[test]
    fn test_set_background_none_resets_size() {
        let mut scene = scene();
        with_background(&mut scene);
        scene.set_background_image(None);
        assert!(!scene.has_background());
        assert_eq!((scene.width(), scene.height()), (200, 150));
    }

    #[test]
    fn test_resize_preserves_viewport() {
        let mut scene = scene();
        let vp = ViewportTransform {
            zoom: 1.5,
            pan_x: 4.0,
            pan_y: 8.0,
        };
        scene.set_viewport(vp).unwrap();
        scene.resize(320, 240).unwrap();
        assert_eq!(scene.viewport(), vp);
        assert_eq!(scene.frame().unwrap().dimensions(), (320, 240));
    }

    #[test]
    fn test_resize_rejects_zero() {
        let mut scene = scene();
        assert!(scene.resize(0, 0).is_err());
        assert_eq!((scene.width(), scene.height()), (200, 150));
    }

    #[test]
    fn test_resize_rejects_oversized() {
        let mut scene = scene();
        scene.render();
        let err = scene.resize(u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, EditorError::InvalidDimensions { .. }));
        assert!(scene.resize(MAX_CANVAS_SIDE + 1, 10).is_err());
        assert!(scene.resize(MAX_CANVAS_SIDE, MAX_CANVAS_SIDE).is_err());
        assert_eq!((scene.width(), scene.height()), (200, 150));
        assert_eq!(scene.frame().map(|f| f.dimensions()), Some((200, 150)));
    }

    #[test]
    fn test_canvas_size_limits() {
        assert!(is_valid_canvas_size(1, 1));
        assert!(is_valid_canvas_size(MAX_CANVAS_SIDE, 4096));
        assert!(!is_valid_canvas_size(0, 10));
        assert!(!is_valid_canvas_size(MAX_CANVAS_SIDE + 1, 1));
        assert!(!is_valid_canvas_size(MAX_CANVAS_SIDE, MAX_CANVAS_SIDE));
    }

    #[test]
    fn test_new_rejects_oversized() {
        assert!(Scene::new(Arc::new(RasterBackend::new()), u32::MAX, 1, Color::WHITE).is_err());
    }

    #[test]
    fn test_set_viewport_rejects_bad_zoom() {
        let mut scene = scene();
        let bad = ViewportTransform {
            zoom: 0.0,
            ..Default::default()
        };
        assert!(scene.set_viewport(bad).is_err());
        assert!(scene.viewport().is_identity());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut scene = scene();
        with_background(&mut scene);
        scene.add_object(DrawableObject::text("x"));
        scene
            .set_viewport(ViewportTransform {
                zoom: 2.0,
                ..Default::default()
            })
            .unwrap();

        scene.clear();
        assert!(scene.objects().is_empty());
        assert!(!scene.has_background());
        assert_eq!((scene.width(), scene.height()), (200, 150));
        assert!(scene.viewport().is_identity());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut scene = scene();
        with_background(&mut scene);
        update_value(&mut scene, AdjustmentKind::Saturation, -30);
        let a = scene.add_object(DrawableObject::text("first"));
        let b = scene.add_object(DrawableObject::shape(ShapeKind::Circle).at(70.0, 20.0));

        let snapshot = scene.to_snapshot().unwrap();
        let frame = scene.frame().unwrap().clone();

        let mut other = self::scene();
        other.restore_from_snapshot(&snapshot).unwrap();

        let ids: Vec<_> = other.objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(other.objects(), scene.objects());
        assert_eq!((other.width(), other.height()), (100, 100));
        let bg = other.background().unwrap();
        assert_eq!(bg.filters(), scene.background().unwrap().filters());
        assert_eq!(bg.offset(), (30, 40));
        assert_eq!(other.frame().unwrap(), &frame);
        assert_eq!(other.to_snapshot().unwrap(), snapshot);
    }

    #[test]
    fn test_snapshot_shares_raster() {
        let mut scene = scene();
        with_background(&mut scene);
        let snapshot = scene.to_snapshot().unwrap();
        assert!(snapshot.has_raster());

        scene.clear();
        scene.restore_from_snapshot(&snapshot).unwrap();
        assert!(scene.has_background());
    }

    #[test]
    fn test_malformed_snapshot_leaves_scene() {
        let mut scene = scene();
        scene.add_object(DrawableObject::text("keep"));
        let bad = SceneSnapshot::from_document("{\"version\":1,");
        assert!(matches!(
            scene.restore_from_snapshot(&bad),
            Err(SnapshotError::Malformed(_))
        ));
        assert_eq!(scene.objects().len(), 1);
    }

    #[test]
    fn test_snapshot_without_raster_fails() {
        let mut scene = scene();
        with_background(&mut scene);
        let doc = scene.to_snapshot().unwrap().document().to_string();

        let mut other = self::scene();
        let result = other.restore_from_snapshot(&SceneSnapshot::from_document(doc));
        assert!(matches!(result, Err(SnapshotError::MissingRaster)));
        assert!(!other.has_background());
    }

    #[test]
    fn test_snapshot_version_checked() {
        let mut scene = scene();
        let doc = scene
            .to_snapshot()
            .unwrap()
            .document()
            .replace("\"version\":1", "\"version\":99");
        let result = scene.restore_from_snapshot(&SceneSnapshot::from_document(doc));
        assert!(matches!(result, Err(SnapshotError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_snapshot_with_oversized_canvas_rejected() {
        let mut scene = scene();
        scene.render();
        let doc = scene
            .to_snapshot()
            .unwrap()
            .document()
            .replace("\"width\":200", "\"width\":4294967295");
        let result = scene.restore_from_snapshot(&SceneSnapshot::from_document(doc));
        assert!(matches!(
            result,
            Err(SnapshotError::InvalidSize {
                width: u32::MAX,
                height: 150
            })
        ));
        assert_eq!((scene.width(), scene.height()), (200, 150));
        assert_eq!(scene.frame().map(|f| f.dimensions()), Some((200, 150)));
    }
}
