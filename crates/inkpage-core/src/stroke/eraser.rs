//! Erase regions and sampled stroke hit-testing.

use super::{Stroke, StrokePoint, TouchPoint};
use crate::config::DEFAULT_ERASER_WIDTH;
use crate::viewport::{ViewportTransformer, rects_intersect};
use kurbo::{BezPath, Cap, Circle, Join, Point, Rect, Shape, StrokeOpts};
use serde::{Deserialize, Serialize};

/// Curve flattening tolerance for region outlines.
const OUTLINE_TOLERANCE: f64 = 0.1;

/// Most points sampled from one stroke.
const MAX_SAMPLES: usize = 20;
/// Fewest points sampled from one stroke.
const MIN_SAMPLES: usize = 3;

/// How the erase gesture is turned into a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EraserKind {
    /// The gesture is widened into a thick round-capped outline.
    #[default]
    Pen,
    /// The gesture is closed into a lasso polygon.
    Select,
}

/// A page-space fill region produced by an erase gesture.
#[derive(Debug, Clone)]
pub struct EraseRegion {
    path: BezPath,
    bounds: Rect,
}

impl EraseRegion {
    /// Build the region from view-space input. Returns `None` for empty input.
    pub fn from_touch_points(
        points: &[TouchPoint],
        kind: EraserKind,
        width: f64,
        viewport: &ViewportTransformer,
    ) -> Option<Self> {
        let page_points: Vec<Point> = points
            .iter()
            .map(|p| viewport.view_to_page(p.position()))
            .collect();
        Self::from_page_points(&page_points, kind, width)
    }

    /// Build the region from points already in page space.
    ///
    /// A pen gesture needs at least two samples; a single tap has no extent
    /// and erases nothing.
    pub fn from_page_points(points: &[Point], kind: EraserKind, width: f64) -> Option<Self> {
        let first = *points.first()?;
        if kind == EraserKind::Pen && points.len() < 2 {
            return None;
        }
        let mut gesture = BezPath::new();
        gesture.move_to(first);
        for point in &points[1..] {
            gesture.line_to(*point);
        }

        let path = match kind {
            EraserKind::Select => {
                gesture.close_path();
                gesture
            }
            EraserKind::Pen if points.iter().all(|p| *p == first) => {
                Circle::new(first, width / 2.0).to_path(OUTLINE_TOLERANCE)
            }
            EraserKind::Pen => {
                let style = kurbo::Stroke::new(width)
                    .with_caps(Cap::Round)
                    .with_join(Join::Round);
                kurbo::stroke(gesture.iter(), &style, &StrokeOpts::default(), OUTLINE_TOLERANCE)
            }
        };

        let bounds = path.bounding_box();
        Some(Self { path, bounds })
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn path(&self) -> &BezPath {
        &self.path
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds.contains(point) && self.path.contains(point)
    }

    /// Whether the stroke should be erased: its bounds meet the region and
    /// at least one sampled point lies inside it.
    pub fn hits(&self, stroke: &Stroke) -> bool {
        if !rects_intersect(stroke.rect(), self.bounds) {
            return false;
        }
        sample_points(&stroke.points)
            .iter()
            .any(|point| self.contains(point.position()))
    }
}

/// Strokes removed by one erase gesture.
#[derive(Debug, Clone, Default)]
pub struct EraseResult {
    pub strokes: Vec<Stroke>,
    /// Union of the erased strokes' bounds, for a partial redraw.
    pub bounds: Option<Rect>,
}

impl EraseResult {
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
}

/// Hit-tests strokes against erase gestures.
#[derive(Debug, Clone)]
pub struct StrokeEraser {
    width: f64,
}

impl Default for StrokeEraser {
    fn default() -> Self {
        Self::new(DEFAULT_ERASER_WIDTH)
    }
}

impl StrokeEraser {
    pub fn new(width: f64) -> Self {
        Self { width }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Strokes from `candidates` touched by the erase gesture `points`.
    pub fn find_strokes_to_erase<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a Stroke>,
        points: &[TouchPoint],
        kind: EraserKind,
        viewport: &ViewportTransformer,
    ) -> EraseResult {
        match EraseRegion::from_touch_points(points, kind, self.width, viewport) {
            Some(region) => Self::strokes_in_region(candidates, &region),
            None => EraseResult::default(),
        }
    }

    pub fn strokes_in_region<'a>(candidates: impl IntoIterator<Item = &'a Stroke>, region: &EraseRegion) -> EraseResult {
        let strokes: Vec<Stroke> = candidates
            .into_iter()
            .filter(|stroke| region.hits(stroke))
            .cloned()
            .collect();
        let bounds = union_bounds(&strokes);
        EraseResult { strokes, bounds }
    }
}

/// Evenly spaced subset of `points` used for hit-testing.
///
/// Short strokes are tested in full; longer ones are thinned to at most
/// twenty samples, first and last point included.
pub fn sample_points(points: &[StrokePoint]) -> Vec<StrokePoint> {
    let total = points.len();
    let sample_size = match total {
        n if n < 10 => n,
        n if n < 50 => n / 3,
        n if n < 200 => n / 10,
        _ => MAX_SAMPLES,
    }
    .max(MIN_SAMPLES);

    if sample_size >= total {
        return points.to_vec();
    }
    (0..sample_size)
        .map(|i| points[i * (total - 1) / (sample_size - 1)])
        .collect()
}

/// Union of the bounds of `strokes`, or `None` when there are none.
pub fn union_bounds<'a>(strokes: impl IntoIterator<Item = &'a Stroke>) -> Option<Rect> {
    strokes
        .into_iter()
        .map(Stroke::rect)
        .reduce(|acc, rect| acc.union(rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokeStyle;

    fn stroke(points: &[(f32, f32)]) -> Stroke {
        let points = points
            .iter()
            .map(|&(x, y)| StrokePoint {
                x,
                y,
                pressure: 1.0,
                size: 1.0,
                tilt_x: 0,
                tilt_y: 0,
                timestamp: 0,
            })
            .collect();
        Stroke::from_points("page", StrokeStyle::default(), points, 0.0).unwrap()
    }

    fn horizontal_swipe() -> EraseRegion {
        EraseRegion::from_page_points(&[Point::new(0.0, 100.0), Point::new(200.0, 100.0)], EraserKind::Pen, 30.0)
            .unwrap()
    }

    #[test]
    fn test_empty_gesture_has_no_region() {
        assert!(EraseRegion::from_page_points(&[], EraserKind::Pen, 30.0).is_none());
    }

    #[test]
    fn test_pen_outline_has_eraser_width() {
        let region = horizontal_swipe();
        assert!(region.contains(Point::new(100.0, 110.0)));
        assert!(region.contains(Point::new(100.0, 90.0)));
        assert!(!region.contains(Point::new(100.0, 120.0)));
        // Round cap past the end.
        assert!(region.contains(Point::new(210.0, 100.0)));
        assert!((region.bounds().height() - 30.0).abs() < 0.5);
    }

    #[test]
    fn test_single_tap_pen_erase_has_no_region() {
        assert!(EraseRegion::from_page_points(&[Point::new(105.0, 100.0)], EraserKind::Pen, 30.0).is_none());

        let config = crate::config::EditorConfig::with_view_size(800.0, 1200.0);
        let viewport = ViewportTransformer::new(&config);
        let target = stroke(&[(100.0, 100.0), (110.0, 100.0)]);
        let result = StrokeEraser::default().find_strokes_to_erase(
            [&target],
            &[TouchPoint::at(105.0, 100.0)],
            EraserKind::Pen,
            &viewport,
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_stationary_pen_erase_is_a_dot() {
        let tap = [Point::new(50.0, 50.0), Point::new(50.0, 50.0)];
        let region = EraseRegion::from_page_points(&tap, EraserKind::Pen, 30.0).unwrap();
        assert!(region.contains(Point::new(60.0, 50.0)));
        assert!(!region.contains(Point::new(70.0, 50.0)));
    }

    #[test]
    fn test_select_region_is_closed_polygon() {
        let lasso = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        let region = EraseRegion::from_page_points(&lasso, EraserKind::Select, 30.0).unwrap();
        assert!(region.contains(Point::new(50.0, 50.0)));
        assert!(!region.contains(Point::new(150.0, 50.0)));
    }

    #[test]
    fn test_strokes_outside_region_bounds_are_kept() {
        let region = horizontal_swipe();
        let near = stroke(&[(50.0, 105.0), (60.0, 140.0)]);
        let far = stroke(&[(50.0, 400.0), (60.0, 420.0)]);
        let result = StrokeEraser::strokes_in_region([&near, &far], &region);
        assert_eq!(result.strokes.len(), 1);
        assert_eq!(result.strokes[0].id, near.id);
        assert_eq!(result.bounds, Some(near.rect()));
    }

    #[test]
    fn test_bounds_overlap_without_point_inside_is_kept() {
        let region = horizontal_swipe();
        // Bounds reach into the swipe but every point is below it.
        let grazing = stroke(&[(50.0, 119.0), (60.0, 130.0)]);
        assert!(rects_intersect(grazing.rect(), region.bounds()));
        assert!(!region.hits(&grazing));
    }

    #[test]
    fn test_sample_sizes() {
        let points: Vec<StrokePoint> = (0..300).map(|i| stroke(&[(i as f32, 0.0)]).points[0]).collect();
        assert_eq!(sample_points(&points[..2]).len(), 2);
        assert_eq!(sample_points(&points[..9]).len(), 9);
        assert_eq!(sample_points(&points[..30]).len(), 10);
        assert_eq!(sample_points(&points[..100]).len(), 10);
        assert_eq!(sample_points(&points[..10]).len(), 3);

        let sampled = sample_points(&points);
        assert_eq!(sampled.len(), 20);
        assert_eq!(sampled.first().unwrap().x, 0.0);
        assert_eq!(sampled.last().unwrap().x, 299.0);
    }

    #[test]
    fn test_union_bounds() {
        let a = stroke(&[(0.0, 0.0)]);
        let b = stroke(&[(100.0, 200.0)]);
        assert_eq!(union_bounds([&a, &b]), Some(Rect::new(-5.0, -5.0, 105.0, 205.0)));
        assert_eq!(union_bounds(std::iter::empty::<&Stroke>()), None);
    }
}
