//! Turning raw view-space input into page-space strokes.

use super::{PenKind, Stroke, StrokeColor, StrokePoint, TouchPoint};
use crate::viewport::ViewportTransformer;

/// Pen parameters applied to a new stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub size: f32,
    pub color: StrokeColor,
    pub pen: PenKind,
}

impl StrokeStyle {
    pub fn new(size: f32, color: StrokeColor, pen: PenKind) -> Self {
        Self { size, color, pen }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new(5.0, StrokeColor::BLACK, PenKind::Ballpoint)
    }
}

/// Builds strokes from input batches.
pub struct StrokeCreator;

impl StrokeCreator {
    /// Convert `points` to page space and wrap them in a new stroke.
    ///
    /// Returns `None` when there are no points.
    pub fn create_stroke(
        points: &[TouchPoint],
        style: StrokeStyle,
        page_id: &str,
        viewport: &ViewportTransformer,
    ) -> Option<Stroke> {
        if points.is_empty() {
            return None;
        }
        let page_points = points
            .iter()
            .map(|touch| {
                let page = viewport.view_to_page(touch.position());
                StrokePoint {
                    x: page.x as f32,
                    y: page.y as f32,
                    pressure: touch.pressure,
                    size: touch.size,
                    tilt_x: touch.tilt_x,
                    tilt_y: touch.tilt_y,
                    timestamp: touch.timestamp,
                }
            })
            .collect();
        let scroll_y = viewport.scroll_offset().y as f32;
        Stroke::from_points(page_id, style, page_points, scroll_y)
    }
}
