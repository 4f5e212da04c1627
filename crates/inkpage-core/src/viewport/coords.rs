//! Page/view coordinate mapping under zoom and scroll.

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Maps between page space (where strokes live) and view space (the screen).
///
/// Zoom scales around `zoom_center` in page space, then the scroll offset
/// is subtracted.
#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    view_size: Size,
    zoom_scale: f64,
    zoom_center: Point,
    scroll: Vec2,
}

impl CoordinateTransformer {
    pub fn new(view_size: Size) -> Self {
        Self {
            view_size,
            zoom_scale: 1.0,
            zoom_center: Point::ZERO,
            scroll: Vec2::ZERO,
        }
    }

    pub fn view_size(&self) -> Size {
        self.view_size
    }

    pub fn zoom_scale(&self) -> f64 {
        self.zoom_scale
    }

    pub fn zoom_center(&self) -> Point {
        self.zoom_center
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// Page-to-view transform for the current state.
    pub fn transform(&self) -> Affine {
        self.transform_with_scroll(self.scroll)
    }

    fn transform_with_scroll(&self, scroll: Vec2) -> Affine {
        Affine::translate(-scroll) * Affine::scale_about(self.zoom_scale, self.zoom_center)
    }

    pub fn update_zoom(&mut self, scale: f64, center: Point) {
        self.zoom_scale = scale;
        self.zoom_center = center;
    }

    pub fn update_scroll(&mut self, delta: Vec2) {
        self.scroll += delta;
    }

    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.scroll = scroll;
    }

    pub fn set_scroll_x(&mut self, x: f64) {
        self.scroll.x = x;
    }

    pub fn page_to_view(&self, page_point: Point) -> Point {
        self.transform() * page_point
    }

    /// Undo the scroll, then undo the scale around the zoom center.
    pub fn view_to_page(&self, view_point: Point) -> Point {
        let scrolled = view_point + self.scroll;
        let c = self.zoom_center;
        Point::new(
            c.x + (scrolled.x - c.x) / self.zoom_scale,
            c.y + (scrolled.y - c.y) / self.zoom_scale,
        )
    }

    /// The visible area expressed in page coordinates.
    pub fn viewport_in_page_space(&self) -> Rect {
        self.viewport_with_scroll(self.scroll)
    }

    /// The visible area if the scroll were `scroll`. Does not change state.
    pub fn viewport_with_scroll(&self, scroll: Vec2) -> Rect {
        let inverse = self.transform_with_scroll(scroll).inverse();
        let top_left = inverse * Point::ZERO;
        let bottom_right = inverse * Point::new(self.view_size.width, self.view_size.height);
        Rect::from_points(top_left, bottom_right)
    }

    /// Reset zoom and scroll to identity.
    pub fn reset(&mut self) {
        self.zoom_scale = 1.0;
        self.zoom_center = Point::ZERO;
        self.scroll = Vec2::ZERO;
    }
}
