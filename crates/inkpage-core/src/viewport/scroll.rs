//! Scroll state, top boundary handling and document growth.

use super::coords::CoordinateTransformer;
use super::indicator::IndicatorTimer;
use crate::config::DEFAULT_BOTTOM_PADDING;
use crate::pagination::PaginationManager;
use kurbo::Vec2;
use std::time::{Duration, Instant};

/// What a scroll request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOutcome {
    /// The viewport moved.
    pub changed: bool,
    /// The scroll ran into the top for the first time since the last accepted scroll.
    pub top_boundary_reached: bool,
}

/// Vertical and horizontal scrolling.
///
/// The document height itself lives in the [`PaginationManager`] so both
/// sides always agree on it.
#[derive(Debug, Clone)]
pub struct ScrollManager {
    view_height: f64,
    bottom_padding: f64,
    scroll_indicator: IndicatorTimer,
    top_boundary_indicator: IndicatorTimer,
    at_top_latched: bool,
}

impl ScrollManager {
    pub fn new(view_height: f64) -> Self {
        Self::with_settings(
            view_height,
            DEFAULT_BOTTOM_PADDING,
            Duration::from_millis(1500),
            Duration::from_millis(800),
        )
    }

    pub fn with_settings(
        view_height: f64,
        bottom_padding: f64,
        scroll_indicator: Duration,
        top_boundary_indicator: Duration,
    ) -> Self {
        Self {
            view_height,
            bottom_padding,
            scroll_indicator: IndicatorTimer::new(scroll_indicator),
            top_boundary_indicator: IndicatorTimer::new(top_boundary_indicator),
            at_top_latched: false,
        }
    }

    pub fn bottom_padding(&self) -> f64 {
        self.bottom_padding
    }

    /// Scroll by `delta` view pixels.
    pub fn scroll(
        &mut self,
        coords: &mut CoordinateTransformer,
        pages: &mut PaginationManager,
        delta: Vec2,
        now: Instant,
    ) -> ScrollOutcome {
        let current = coords.scroll();
        let new_scroll_y = current.y + delta.y;

        if new_scroll_y < 0.0 {
            let top_boundary_reached = !self.at_top_latched;
            self.at_top_latched = true;
            self.top_boundary_indicator.show(now);
            if current.y > 0.0 {
                coords.set_scroll(Vec2::new(current.x, 0.0));
                self.scroll_indicator.show(now);
                return ScrollOutcome {
                    changed: true,
                    top_boundary_reached,
                };
            }
            log::debug!("scroll rejected at top boundary");
            return ScrollOutcome {
                changed: false,
                top_boundary_reached,
            };
        }
        self.at_top_latched = false;

        let delta_x = if coords.zoom_scale() > 1.0 { delta.x } else { 0.0 };
        let new_scroll_x = self.constrained_scroll_x(coords, current.x + delta_x);

        self.extend_document(coords, pages, new_scroll_y);
        coords.set_scroll(Vec2::new(new_scroll_x, new_scroll_y));
        self.scroll_indicator.show(now);
        ScrollOutcome {
            changed: true,
            top_boundary_reached: false,
        }
    }

    /// Center page-space `y` in the viewport, clamped to the document.
    pub fn scroll_to_position(
        &mut self,
        coords: &mut CoordinateTransformer,
        pages: &PaginationManager,
        y: f64,
        now: Instant,
    ) {
        let target = y - self.view_height / (2.0 * coords.zoom_scale());
        let max_scroll_y = (pages.document_height() - self.view_height).max(0.0);
        let bounded = target.clamp(0.0, max_scroll_y);
        coords.set_scroll(Vec2::new(coords.scroll().x, bounded));
        self.scroll_indicator.show(now);
    }

    /// Set the document height, never smaller than the view.
    pub fn update_document_height(&self, pages: &mut PaginationManager, height: f64) {
        pages.set_document_height(height.max(self.view_height));
    }

    pub fn is_scroll_indicator_visible(&self, now: Instant) -> bool {
        self.scroll_indicator.is_visible(now)
    }

    pub fn is_at_top_boundary(&self, now: Instant) -> bool {
        self.top_boundary_indicator.is_visible(now)
    }

    fn constrained_scroll_x(&self, coords: &CoordinateTransformer, proposed: f64) -> f64 {
        let zoom = coords.zoom_scale();
        if zoom <= 1.0 {
            return 0.0;
        }
        let view_width = coords.view_size().width;
        let viewport = coords.viewport_with_scroll(Vec2::new(proposed, coords.scroll().y));

        let mut constrained = proposed;
        if viewport.x0 < 0.0 {
            constrained -= viewport.x0 * zoom;
        } else if viewport.x1 > view_width {
            constrained += (view_width - viewport.x1) * zoom;
        }

        let max_scroll_x = (view_width * zoom - view_width) / 2.0;
        constrained.clamp(-max_scroll_x, max_scroll_x)
    }

    fn extend_document(&self, coords: &CoordinateTransformer, pages: &mut PaginationManager, new_scroll_y: f64) {
        let viewport_bottom = new_scroll_y + self.view_height / coords.zoom_scale();
        let document_height = pages.document_height();
        if viewport_bottom <= document_height - self.bottom_padding {
            return;
        }

        let grown = if pages.is_enabled() {
            let page_index = pages.page_index_for_y(viewport_bottom);
            pages.exclusion_zone_bottom_y(page_index) + pages.page_height()
        } else {
            viewport_bottom + self.bottom_padding
        };
        if grown > document_height {
            log::debug!("document height {:.0} -> {:.0}", document_height, grown);
            pages.set_document_height(grown);
        }
    }
}
