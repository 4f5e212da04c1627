//! Stroke data model and the spatial algorithms that create and erase strokes.

mod creator;
mod eraser;
mod pen;

pub use creator::{StrokeCreator, StrokeStyle};
pub use eraser::{EraseRegion, EraseResult, EraserKind, StrokeEraser, sample_points, union_bounds};
pub use pen::{PenKind, PenSetting, PenSettingsTable};

use kurbo::{Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for strokes.
pub type StrokeId = Uuid;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// One raw input sample, in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub size: f32,
    pub tilt_x: i32,
    pub tilt_y: i32,
    pub timestamp: i64,
}

impl TouchPoint {
    /// A sample with nominal pressure and no tilt.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            pressure: 1.0,
            size: 1.0,
            tilt_x: 0,
            tilt_y: 0,
            timestamp: 0,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// A stroke sample in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub pressure: f32,
    #[serde(default)]
    pub size: f32,
    #[serde(default)]
    pub tilt_x: i32,
    #[serde(default)]
    pub tilt_y: i32,
    #[serde(default)]
    pub timestamp: i64,
}

impl StrokePoint {
    pub fn position(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }

    /// The same sample moved by `(dx, dy)`.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Packed `0xAARRGGBB` stroke color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeColor(pub u32);

impl StrokeColor {
    pub const BLACK: Self = Self(0xFF00_0000);

    pub fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(u32::from_be_bytes([a, r, g, b]))
    }
}

impl Default for StrokeColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<StrokeColor> for Color {
    fn from(color: StrokeColor) -> Self {
        let [a, r, g, b] = color.0.to_be_bytes();
        Color::from_rgba8(r, g, b, a)
    }
}

impl From<Color> for StrokeColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::argb(rgba.a, rgba.r, rgba.g, rgba.b)
    }
}

/// Axis-aligned bounding box of a stroke, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StrokeBounds {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl StrokeBounds {
    /// Bounding box of `points`, inflated by `inflate` on every side.
    pub fn of_points(points: &[StrokePoint], inflate: f32) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            top: first.y,
            bottom: first.y,
            left: first.x,
            right: first.x,
        };
        for point in &points[1..] {
            bounds.top = bounds.top.min(point.y);
            bounds.bottom = bounds.bottom.max(point.y);
            bounds.left = bounds.left.min(point.x);
            bounds.right = bounds.right.max(point.x);
        }
        Some(Self {
            top: bounds.top - inflate,
            bottom: bounds.bottom + inflate,
            left: bounds.left - inflate,
            right: bounds.right + inflate,
        })
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.left as f64,
            self.top as f64,
            self.right as f64,
            self.bottom as f64,
        )
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            top: self.top + dy,
            bottom: self.bottom + dy,
            left: self.left + dx,
            right: self.right + dx,
        }
    }
}

/// A finished pen stroke owned by a page's stroke set.
///
/// Strokes are values: moving or shifting one produces a new `Stroke`
/// with the same id, so history snapshots never alias live data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub size: f32,
    pub pen: PenKind,
    #[serde(default)]
    pub color: StrokeColor,
    pub bounds: StrokeBounds,
    pub points: Vec<StrokePoint>,
    pub page_id: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub created_scroll_y: f32,
}

impl Stroke {
    /// Build a stroke from page-space points. Returns `None` for an empty point list.
    pub fn from_points(
        page_id: impl Into<String>,
        style: StrokeStyle,
        points: Vec<StrokePoint>,
        created_scroll_y: f32,
    ) -> Option<Self> {
        let bounds = StrokeBounds::of_points(&points, style.size)?;
        let now = now_millis();
        Some(Self {
            id: Uuid::new_v4(),
            size: style.size,
            pen: style.pen,
            color: style.color,
            bounds,
            points,
            page_id: page_id.into(),
            created_at: now,
            updated_at: now,
            created_scroll_y,
        })
    }

    /// Bounding box as a kurbo rectangle.
    pub fn rect(&self) -> Rect {
        self.bounds.rect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A copy moved by `(dx, dy)`, keeping id and timestamps.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            bounds: self.bounds.translated(dx, dy),
            points: self.points.iter().map(|p| p.translated(dx, dy)).collect(),
            ..self.clone()
        }
    }

    /// A copy with a new id.
    pub fn with_fresh_id(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }

    /// Whether the id and every coordinate match `other`.
    pub fn same_geometry(&self, other: &Stroke) -> bool {
        self.id == other.id && self.bounds == other.bounds && self.points == other.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32, y: f32) -> StrokePoint {
        StrokePoint {
            x,
            y,
            pressure: 0.5,
            size: 1.0,
            tilt_x: 0,
            tilt_y: 0,
            timestamp: 0,
        }
    }

    #[test]
    fn test_bounds_inflated_by_size() {
        let stroke = Stroke::from_points(
            "page",
            StrokeStyle::new(2.0, StrokeColor::BLACK, PenKind::Ballpoint),
            vec![point(10.0, 20.0), point(30.0, 5.0)],
            0.0,
        )
        .unwrap();
        assert_eq!(
            stroke.bounds,
            StrokeBounds {
                top: 3.0,
                bottom: 22.0,
                left: 8.0,
                right: 32.0
            }
        );
    }

    #[test]
    fn test_empty_points_rejected() {
        let stroke = Stroke::from_points("page", StrokeStyle::default(), Vec::new(), 0.0);
        assert!(stroke.is_none());
    }

    #[test]
    fn test_translated_keeps_identity() {
        let stroke = Stroke::from_points("page", StrokeStyle::default(), vec![point(1.0, 2.0)], 0.0).unwrap();
        let moved = stroke.translated(0.0, 1010.0);
        assert_eq!(moved.id, stroke.id);
        assert_eq!(moved.points[0].y, 1012.0);
        assert_eq!(moved.bounds.top, stroke.bounds.top + 1010.0);
        assert_eq!(moved.translated(0.0, -1010.0).points, stroke.points);
        assert_eq!(stroke.points[0].y, 2.0);
    }

    #[test]
    fn test_color_conversion() {
        let color = StrokeColor::argb(0xFF, 0x12, 0x34, 0x56);
        assert_eq!(color.0, 0xFF12_3456);
        let peniko_color: Color = color.into();
        assert_eq!(StrokeColor::from(peniko_color), color);
    }

    #[test]
    fn test_stroke_deserializes_with_missing_optional_fields() {
        let json = r#"{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "size": 3.0,
            "pen": "MARKER",
            "bounds": {"top": 0.0, "bottom": 10.0, "left": 0.0, "right": 10.0},
            "points": [{"x": 5.0, "y": 5.0}],
            "page_id": "p1",
            "future_field": true
        }"#;
        let stroke: Stroke = serde_json::from_str(json).unwrap();
        assert_eq!(stroke.pen, PenKind::Marker);
        assert_eq!(stroke.color, StrokeColor::BLACK);
        assert_eq!(stroke.created_scroll_y, 0.0);
    }
}
