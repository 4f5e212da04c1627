//! Viewport: zoom, scroll and pagination composed behind one facade.
//!
//! Other subsystems only talk to [`ViewportTransformer`]; the managers it
//! wraps are exposed for tests and for callers that need the raw math.

mod coords;
mod indicator;
mod scroll;
mod zoom;

pub use coords::CoordinateTransformer;
pub use indicator::IndicatorTimer;
pub use scroll::{ScrollManager, ScrollOutcome};
pub use zoom::ZoomManager;

use crate::config::EditorConfig;
use crate::events::{EventBus, ViewportEvent};
use crate::pagination::{PaginationManager, PaperSize};
use kurbo::{Point, Rect, Size, Vec2};
use std::sync::mpsc::Receiver;
use std::time::Instant;

/// Whether two rectangles share interior area. Touching edges do not count.
pub fn rects_intersect(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// The viewport of one open page.
#[derive(Debug)]
pub struct ViewportTransformer {
    coords: CoordinateTransformer,
    pagination: PaginationManager,
    zoom: ZoomManager,
    scroll: ScrollManager,
    events: EventBus<ViewportEvent>,
}

impl ViewportTransformer {
    pub fn new(config: &EditorConfig) -> Self {
        let mut pagination =
            PaginationManager::new(config.view_width, config.paper_size, config.exclusion_zone_height);
        pagination.set_enabled(config.pagination_enabled);
        Self::with_pagination(config, pagination)
    }

    /// Viewport over an explicit page layout. The layout's own enabled flag wins
    /// over `config.pagination_enabled`.
    pub fn with_pagination(config: &EditorConfig, mut pagination: PaginationManager) -> Self {
        let view_size = config.view_size();
        let scroll = ScrollManager::with_settings(
            view_size.height,
            config.bottom_padding,
            config.scroll_indicator_duration(),
            config.top_boundary_indicator_duration(),
        );
        let initial_height = if pagination.is_enabled() {
            pagination.exclusion_zone_bottom_y(0)
        } else {
            view_size.height
        };
        scroll.update_document_height(&mut pagination, initial_height);

        Self {
            coords: CoordinateTransformer::new(view_size),
            pagination,
            zoom: ZoomManager::new(config.min_zoom, config.max_zoom, config.zoom_indicator_duration()),
            scroll,
            events: EventBus::new(),
        }
    }

    /// Register a listener for viewport changes.
    pub fn subscribe(&mut self) -> Receiver<ViewportEvent> {
        self.events.subscribe()
    }

    /// Scroll by a view-space delta. Returns whether the viewport moved.
    pub fn scroll(&mut self, dx: f64, dy: f64) -> bool {
        let outcome = self
            .scroll
            .scroll(&mut self.coords, &mut self.pagination, Vec2::new(dx, dy), Instant::now());
        if outcome.top_boundary_reached {
            self.events.emit(ViewportEvent::TopBoundaryReached);
        }
        if outcome.changed {
            self.events.emit(ViewportEvent::Changed);
        }
        outcome.changed
    }

    /// Zoom to `scale` around the view point `(focus_x, focus_y)`.
    pub fn zoom(&mut self, scale: f64, focus_x: f64, focus_y: f64) -> bool {
        let changed = self
            .zoom
            .zoom(&mut self.coords, scale, Point::new(focus_x, focus_y), Instant::now());
        if changed {
            self.events.emit(ViewportEvent::Changed);
        }
        changed
    }

    pub fn reset_zoom(&mut self) {
        self.zoom.reset_zoom(&mut self.coords, Instant::now());
        self.events.emit(ViewportEvent::Changed);
    }

    /// Center page-space `y` in the view.
    pub fn scroll_to_position(&mut self, y: f64) {
        self.scroll
            .scroll_to_position(&mut self.coords, &self.pagination, y, Instant::now());
        self.events.emit(ViewportEvent::Changed);
    }

    pub fn page_to_view(&self, page_point: Point) -> Point {
        self.coords.page_to_view(page_point)
    }

    pub fn view_to_page(&self, view_point: Point) -> Point {
        self.coords.view_to_page(view_point)
    }

    pub fn is_rect_visible(&self, rect: Rect) -> bool {
        rects_intersect(self.coords.viewport_in_page_space(), rect)
    }

    /// Set the document height; it never drops below the view height.
    pub fn update_document_height(&mut self, height: f64) {
        self.scroll.update_document_height(&mut self.pagination, height);
    }

    pub fn update_paper_size(&mut self, paper_size: PaperSize) {
        self.pagination.update_paper_size(paper_size);
        log::info!("paper size set to {:?}", paper_size);
        self.events.emit(ViewportEvent::Changed);
    }

    /// Turn pagination on or off. Enabling makes room for at least the first page.
    pub fn update_pagination_enabled(&mut self, enabled: bool) {
        self.pagination.set_enabled(enabled);
        if enabled {
            let first_page = self.pagination.exclusion_zone_bottom_y(0);
            let height = self.pagination.document_height().max(first_page);
            self.update_document_height(height);
        }
        self.events.emit(ViewportEvent::Changed);
    }

    /// Whether input at a view point may draw; gutters between pages reject it.
    pub fn is_touch_allowed(&self, view_point: Point) -> bool {
        let page_point = self.coords.view_to_page(view_point);
        !self.pagination.is_in_exclusion_zone(page_point.y)
    }

    /// Gutters currently on screen, as full-width view-space rectangles.
    pub fn exclusion_zones_in_view(&self) -> Vec<Rect> {
        let viewport = self.coords.viewport_in_page_space();
        let width = self.coords.view_size().width;
        self.pagination
            .exclusion_zones_in_range(viewport.y0, viewport.height())
            .into_iter()
            .map(|zone| {
                let top = self.coords.page_to_view(Point::new(0.0, zone.start)).y;
                let bottom = self.coords.page_to_view(Point::new(0.0, zone.end)).y;
                Rect::new(0.0, top, width, bottom)
            })
            .collect()
    }

    pub fn viewport_in_page_space(&self) -> Rect {
        self.coords.viewport_in_page_space()
    }

    pub fn view_size(&self) -> Size {
        self.coords.view_size()
    }

    pub fn scroll_offset(&self) -> Vec2 {
        self.coords.scroll()
    }

    pub fn zoom_scale(&self) -> f64 {
        self.coords.zoom_scale()
    }

    pub fn zoom_percentage(&self) -> String {
        ZoomManager::zoom_percentage(&self.coords)
    }

    pub fn document_height(&self) -> f64 {
        self.pagination.document_height()
    }

    pub fn bottom_padding(&self) -> f64 {
        self.scroll.bottom_padding()
    }

    pub fn pagination(&self) -> &PaginationManager {
        &self.pagination
    }

    pub fn coordinates(&self) -> &CoordinateTransformer {
        &self.coords
    }

    pub fn is_zoom_indicator_visible(&self, now: Instant) -> bool {
        self.zoom.is_indicator_visible(now)
    }

    pub fn is_scroll_indicator_visible(&self, now: Instant) -> bool {
        self.scroll.is_scroll_indicator_visible(now)
    }

    pub fn is_at_top_boundary(&self, now: Instant) -> bool {
        self.scroll.is_at_top_boundary(now)
    }
}
