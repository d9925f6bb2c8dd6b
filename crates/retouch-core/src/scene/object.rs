//! Drawable annotation objects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::Color;

/// Stable identifier assigned to every drawable object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ObjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A 2D point in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Object scale and rotation (degrees, clockwise, about the object centre).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

impl Transform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Fill and stroke styling. `None` means the part is not painted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
}

/// Variant-specific object data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    Text {
        content: String,
        font_family: String,
        font_size: f32,
    },
    Rect {
        width: f32,
        height: f32,
    },
    Circle {
        radius: f32,
    },
    Triangle {
        width: f32,
        height: f32,
    },
    /// Points are relative to the object's `(left, top)`.
    FreehandStroke {
        points: Vec<Point>,
        brush_width: f32,
    },
}

/// One annotation on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawableObject {
    pub id: ObjectId,
    pub left: f32,
    pub top: f32,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub style: Style,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

/// Default placement for newly added objects.
const DEFAULT_ORIGIN: f32 = 50.0;

impl DrawableObject {
    /// Create an object with a fresh id at the default origin.
    pub fn new(kind: ObjectKind, style: Style) -> Self {
        Self {
            id: ObjectId::new(),
            left: DEFAULT_ORIGIN,
            top: DEFAULT_ORIGIN,
            transform: Transform::default(),
            style,
            kind,
        }
    }

    /// 20px Arial text filled black.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(
            ObjectKind::Text {
                content: content.into(),
                font_family: "Arial".to_string(),
                font_size: 20.0,
            },
            Style {
                fill: Some(Color::BLACK),
                stroke: None,
                stroke_width: 0.0,
            },
        )
    }

    /// A shape with the stock size and fill for its kind, outlined 1px black.
    pub fn shape(kind: ShapeKind) -> Self {
        let (object_kind, fill) = match kind {
            ShapeKind::Rect => (
                ObjectKind::Rect {
                    width: 100.0,
                    height: 100.0,
                },
                Color::rgb(0xff, 0x00, 0x00),
            ),
            ShapeKind::Circle => (ObjectKind::Circle { radius: 25.0 }, Color::rgb(0x00, 0xff, 0x00)),
            ShapeKind::Triangle => (
                ObjectKind::Triangle {
                    width: 100.0,
                    height: 100.0,
                },
                Color::rgb(0x00, 0x00, 0xff),
            ),
        };
        Self::new(
            object_kind,
            Style {
                fill: Some(fill),
                stroke: Some(Color::BLACK),
                stroke_width: 1.0,
            },
        )
    }

    /// A freehand stroke through canvas-space `points`.
    ///
    /// The object is anchored at the points' top-left corner and the points
    /// are stored relative to it.
    pub fn stroke(points: &[Point], brush_width: f32, color: Color) -> Self {
        let left = points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let top = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let (left, top) = if left.is_finite() && top.is_finite() {
            (left, top)
        } else {
            (0.0, 0.0)
        };

        let mut object = Self::new(
            ObjectKind::FreehandStroke {
                points: points
                    .iter()
                    .map(|p| Point::new(p.x - left, p.y - top))
                    .collect(),
                brush_width,
            },
            Style {
                fill: None,
                stroke: Some(color),
                stroke_width: brush_width,
            },
        );
        object.left = left;
        object.top = top;
        object
    }

    /// Move the object to `(left, top)`.
    pub fn at(mut self, left: f32, top: f32) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Unscaled local size, if it is known without font metrics.
    pub fn extent(&self) -> Option<(f32, f32)> {
        match &self.kind {
            ObjectKind::Rect { width, height } | ObjectKind::Triangle { width, height } => {
                Some((*width, *height))
            }
            ObjectKind::Circle { radius } => Some((radius * 2.0, radius * 2.0)),
            ObjectKind::FreehandStroke { points, .. } => {
                let w = points.iter().map(|p| p.x).fold(0.0, f32::max);
                let h = points.iter().map(|p| p.y).fold(0.0, f32::max);
                Some((w, h))
            }
            ObjectKind::Text { .. } => None,
        }
    }

    /// Name of the first geometry field that is NaN or infinite.
    ///
    /// Such objects cannot be painted or written to a snapshot.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let scalars = [
            ("left", self.left),
            ("top", self.top),
            ("scale_x", self.transform.scale_x),
            ("scale_y", self.transform.scale_y),
            ("rotation", self.transform.rotation),
            ("stroke_width", self.style.stroke_width),
        ];
        if let Some((name, _)) = scalars.into_iter().find(|(_, v)| !v.is_finite()) {
            return Some(name);
        }

        match &self.kind {
            ObjectKind::Text { font_size, .. } => (!font_size.is_finite()).then_some("font_size"),
            ObjectKind::Rect { width, height } | ObjectKind::Triangle { width, height } => {
                if !width.is_finite() {
                    Some("width")
                } else if !height.is_finite() {
                    Some("height")
                } else {
                    None
                }
            }
            ObjectKind::Circle { radius } => (!radius.is_finite()).then_some("radius"),
            ObjectKind::FreehandStroke {
                points,
                brush_width,
            } => {
                if !brush_width.is_finite() {
                    Some("brush_width")
                } else if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
                    Some("points")
                } else {
                    None
                }
            }
        }
    }

    /// Short type name.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Text { .. } => "text",
            ObjectKind::Rect { .. } => "rect",
            ObjectKind::Circle { .. } => "circle",
            ObjectKind::Triangle { .. } => "triangle",
            ObjectKind::FreehandStroke { .. } => "freehand_stroke",
        }
    }
}

/// Error returned for an unknown shape name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown shape kind: {0} (expected rect, circle or triangle)")]
pub struct UnknownShape(pub String);

/// Shapes the host can add with one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Circle,
    Triangle,
}

impl FromStr for ShapeKind {
    type Err = UnknownShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rect" | "rectangle" => Ok(ShapeKind::Rect),
            "circle" => Ok(ShapeKind::Circle),
            "triangle" => Ok(ShapeKind::Triangle),
            _ => Err(UnknownShape(s.to_string())),
        }
    }
}

/// Canvas-wide zoom and pan applied when painting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportTransform {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl ViewportTransform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Scene coordinates to surface coordinates.
    #[inline]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.zoom + self.pan_x, y * self.zoom + self.pan_y)
    }

    /// Surface coordinates back to scene coordinates.
    #[inline]
    pub fn invert(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pan_x) / self.zoom, (y - self.pan_y) / self.zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_defaults() {
        let obj = DrawableObject::text("Hello");
        assert_eq!((obj.left, obj.top), (50.0, 50.0));
        assert_eq!(obj.style.fill, Some(Color::BLACK));
        match obj.kind {
            ObjectKind::Text {
                content,
                font_family,
                font_size,
            } => {
                assert_eq!(content, "Hello");
                assert_eq!(font_family, "Arial");
                assert_eq!(font_size, 20.0);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_shape_defaults() {
        let rect = DrawableObject::shape(ShapeKind::Rect);
        assert_eq!(rect.extent(), Some((100.0, 100.0)));
        assert_eq!(rect.style.fill, Some(Color::rgb(255, 0, 0)));
        assert_eq!(rect.style.stroke, Some(Color::BLACK));
        assert_eq!(rect.style.stroke_width, 1.0);

        let circle = DrawableObject::shape(ShapeKind::Circle);
        assert_eq!(circle.extent(), Some((50.0, 50.0)));
        assert_eq!(circle.style.fill, Some(Color::rgb(0, 255, 0)));

        let tri = DrawableObject::shape(ShapeKind::Triangle);
        assert_eq!(tri.type_name(), "triangle");
        assert_eq!(tri.style.fill, Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = DrawableObject::shape(ShapeKind::Rect);
        let b = DrawableObject::shape(ShapeKind::Rect);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_stroke_anchored_at_bounds() {
        let points = [Point::new(30.0, 40.0), Point::new(10.0, 60.0), Point::new(25.0, 45.0)];
        let obj = DrawableObject::stroke(&points, 5.0, Color::BLACK);
        assert_eq!((obj.left, obj.top), (10.0, 40.0));
        match &obj.kind {
            ObjectKind::FreehandStroke { points, brush_width } => {
                assert_eq!(points[0], Point::new(20.0, 0.0));
                assert_eq!(points[1], Point::new(0.0, 20.0));
                assert_eq!(*brush_width, 5.0);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(obj.extent(), Some((20.0, 20.0)));
    }

    #[test]
    fn test_empty_stroke() {
        let obj = DrawableObject::stroke(&[], 5.0, Color::BLACK);
        assert_eq!((obj.left, obj.top), (0.0, 0.0));
    }

    #[test]
    fn test_non_finite_geometry_detected() {
        assert_eq!(DrawableObject::shape(ShapeKind::Rect).non_finite_field(), None);
        assert_eq!(DrawableObject::text("ok").non_finite_field(), None);

        let points = [Point::new(1.0, 2.0), Point::new(f32::NAN, 4.0)];
        let stroke = DrawableObject::stroke(&points, 5.0, Color::BLACK);
        assert_eq!(stroke.non_finite_field(), Some("points"));

        let points = [Point::new(f32::INFINITY, 2.0)];
        let stroke = DrawableObject::stroke(&points, 5.0, Color::BLACK);
        assert!(stroke.non_finite_field().is_some());

        let moved = DrawableObject::shape(ShapeKind::Circle).at(f32::NAN, 0.0);
        assert_eq!(moved.non_finite_field(), Some("left"));

        let skewed = DrawableObject::shape(ShapeKind::Triangle).with_transform(Transform {
            rotation: f32::NEG_INFINITY,
            ..Transform::default()
        });
        assert_eq!(skewed.non_finite_field(), Some("rotation"));

        let wide = DrawableObject::stroke(&[Point::new(0.0, 0.0)], f32::NAN, Color::BLACK);
        assert_eq!(wide.non_finite_field(), Some("stroke_width"));
    }

    #[test]
    fn test_shape_kind_parse() {
        assert_eq!("rect".parse::<ShapeKind>().unwrap(), ShapeKind::Rect);
        assert_eq!("Circle".parse::<ShapeKind>().unwrap(), ShapeKind::Circle);
        assert!("hexagon".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn test_object_json_shape() {
        let obj = DrawableObject::shape(ShapeKind::Circle).at(5.0, 6.0);
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json["type"], "circle");
        assert_eq!(json["radius"], 25.0);
        assert_eq!(json["style"]["fill"], "#00ff00");

        let back: DrawableObject = serde_json::from_value(json).unwrap();
        assert_eq!(back, obj);
    }

    #[test]
    fn test_viewport_invert() {
        let vp = ViewportTransform {
            zoom: 2.0,
            pan_x: 10.0,
            pan_y: -4.0,
        };
        let (x, y) = vp.apply(3.0, 5.0);
        assert_eq!((x, y), (16.0, 6.0));
        assert_eq!(vp.invert(x, y), (3.0, 5.0));
        assert!(ViewportTransform::default().is_identity());
    }
}
