//! Zoom state changes and the horizontal scroll compensation that follows them.

use super::coords::CoordinateTransformer;
use super::indicator::IndicatorTimer;
use crate::config::{zoom_range_is_valid, MAX_ZOOM, MIN_ZOOM};
use kurbo::{Point, Vec2};
use std::time::{Duration, Instant};

/// Scale changes smaller than this are ignored.
const ZOOM_EPSILON: f64 = 1e-3;

/// Clamped zoom around a focus point.
#[derive(Debug, Clone)]
pub struct ZoomManager {
    min_zoom: f64,
    max_zoom: f64,
    indicator: IndicatorTimer,
}

impl Default for ZoomManager {
    fn default() -> Self {
        Self::new(MIN_ZOOM, MAX_ZOOM, Duration::from_millis(1500))
    }
}

impl ZoomManager {
    /// An unusable range (inverted, non-finite or not positive) falls back
    /// to the default bounds.
    pub fn new(min_zoom: f64, max_zoom: f64, indicator_duration: Duration) -> Self {
        let (min_zoom, max_zoom) = if zoom_range_is_valid(min_zoom, max_zoom) {
            (min_zoom, max_zoom)
        } else {
            log::warn!("Ignoring invalid zoom range {}..{}", min_zoom, max_zoom);
            (MIN_ZOOM, MAX_ZOOM)
        };
        Self {
            min_zoom,
            max_zoom,
            indicator: IndicatorTimer::new(indicator_duration),
        }
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Zoom to `target_scale` keeping the view point `focus` under the finger.
    ///
    /// Returns false when the clamped scale is within epsilon of the current one.
    pub fn zoom(&mut self, coords: &mut CoordinateTransformer, target_scale: f64, focus: Point, now: Instant) -> bool {
        let new_scale = target_scale.clamp(self.min_zoom, self.max_zoom);
        let previous_scale = coords.zoom_scale();
        if (new_scale - previous_scale).abs() < ZOOM_EPSILON {
            return false;
        }

        // Focus must be taken in page space before the zoom changes.
        let page_focus = coords.view_to_page(focus);
        coords.update_zoom(new_scale, page_focus);
        self.adjust_scroll_for_zoom(coords, new_scale, previous_scale, focus.x);

        log::debug!("zoom {:.3} -> {:.3} at {:?}", previous_scale, new_scale, focus);
        self.indicator.show(now);
        true
    }

    /// Back to 100%. Vertical scroll is kept.
    pub fn reset_zoom(&mut self, coords: &mut CoordinateTransformer, now: Instant) {
        coords.update_zoom(1.0, Point::ZERO);
        coords.set_scroll_x(0.0);
        self.indicator.show(now);
    }

    pub fn is_indicator_visible(&self, now: Instant) -> bool {
        self.indicator.is_visible(now)
    }

    /// Current scale as a whole percentage, e.g. `"150%"`.
    pub fn zoom_percentage(coords: &CoordinateTransformer) -> String {
        format!("{}%", (coords.zoom_scale() * 100.0).round() as i64)
    }

    fn adjust_scroll_for_zoom(
        &self,
        coords: &mut CoordinateTransformer,
        new_scale: f64,
        previous_scale: f64,
        focus_x: f64,
    ) {
        if new_scale <= 1.0 {
            coords.set_scroll_x(0.0);
            return;
        }

        let view_width = coords.view_size().width;
        let half_width = view_width / 2.0;
        let focus_ratio = (focus_x - half_width) / half_width;
        let delta = view_width * (new_scale - previous_scale) * focus_ratio * 0.5;

        let scroll = coords.scroll();
        let mut proposed = scroll.x + delta;
        let viewport = coords.viewport_with_scroll(Vec2::new(proposed, scroll.y));
        if viewport.x0 < 0.0 {
            proposed -= viewport.x0 * new_scale;
        }
        if viewport.x1 > view_width {
            proposed += (view_width - viewport.x1) * new_scale;
        }

        let max_scroll_x = (view_width * new_scale - view_width) / 2.0;
        coords.set_scroll_x(proposed.clamp(-max_scroll_x, max_scroll_x));
    }
}
