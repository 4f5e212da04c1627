//! Lasso selection and the move/copy/paste gestures built on it.
//!
//! All points handed to [`SelectionEngine`] are in page space. Nothing here
//! touches the page store: completed gestures come back as
//! [`SelectionOutcome`] values for the caller to commit.

use crate::page::PageStrokes;
use crate::pagination::PaginationManager;
use crate::stroke::{Stroke, now_millis, union_bounds};
use crate::viewport::rects_intersect;
use kurbo::{BezPath, Point, Rect, Shape, Vec2};

/// What a touch down does while a selection is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    #[default]
    None,
    /// The selection is being dragged.
    Move,
    /// Copied strokes wait for a tap to be placed.
    Paste,
}

/// Phase of a selection touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Down,
    Move,
    Up,
}

/// A finished move, ready to be committed and recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCommit {
    pub original: Vec<Stroke>,
    pub modified: Vec<Stroke>,
    pub offset: Vec2,
}

/// Result of feeding one touch to the selection engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// Nothing to commit.
    None,
    /// A lasso finished; this many strokes are selected.
    Selected(usize),
    /// The selection was dropped by tapping outside it.
    Deselected,
    /// Moved strokes to swap into the page.
    Moved(MoveCommit),
    /// New strokes to add to the page.
    Pasted(Vec<Stroke>),
}

/// Transient selection state. Dropping or resetting it abandons any gesture.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    lasso: Vec<Point>,
    drawing: bool,
    selected: Vec<Stroke>,
    bounds: Option<Rect>,
    last_move_point: Option<Point>,
    move_offset: Vec2,
    placement: PlacementMode,
}

impl SelectionState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn is_moving(&self) -> bool {
        self.placement == PlacementMode::Move
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn placement(&self) -> PlacementMode {
        self.placement
    }

    pub fn selected(&self) -> &[Stroke] {
        &self.selected
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    pub fn move_offset(&self) -> Vec2 {
        self.move_offset
    }

    /// The lasso drawn so far, as an open path.
    pub fn lasso_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some((first, rest)) = self.lasso.split_first() {
            path.move_to(*first);
            for point in rest {
                path.line_to(*point);
            }
        }
        path
    }

    fn recompute_bounds(&mut self) {
        self.bounds = union_bounds(&self.selected);
    }
}

/// Drives the selection state machine.
#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    state: SelectionState,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Route one touch. `visible` limits lasso candidates to what is on screen.
    pub fn handle_touch(
        &mut self,
        phase: SelectionPhase,
        point: Point,
        page: &PageStrokes,
        visible: Rect,
        pages: &PaginationManager,
    ) -> SelectionOutcome {
        match phase {
            SelectionPhase::Down => {
                if self.state.placement == PlacementMode::Paste {
                    return self
                        .paste_selection(point)
                        .map_or(SelectionOutcome::None, SelectionOutcome::Pasted);
                }
                if self.state.has_selection() {
                    if !self.start_moving_selection(point) {
                        return SelectionOutcome::Deselected;
                    }
                } else {
                    self.start_selection_draw(point);
                }
                SelectionOutcome::None
            }
            SelectionPhase::Move => {
                if self.state.is_moving() {
                    self.update_moving_selection(point, pages);
                } else if self.state.drawing {
                    self.update_selection_draw(point);
                }
                SelectionOutcome::None
            }
            SelectionPhase::Up => {
                if self.state.is_moving() {
                    self.complete_moving_selection()
                        .map_or(SelectionOutcome::None, SelectionOutcome::Moved)
                } else if self.state.drawing {
                    SelectionOutcome::Selected(self.complete_selection_draw(point, page.visible_strokes(visible)))
                } else {
                    SelectionOutcome::None
                }
            }
        }
    }

    /// Begin a new lasso, dropping any previous selection.
    pub fn start_selection_draw(&mut self, point: Point) {
        self.state.reset();
        self.state.drawing = true;
        self.state.lasso.push(point);
    }

    pub fn update_selection_draw(&mut self, point: Point) {
        if self.state.drawing {
            self.state.lasso.push(point);
        }
    }

    /// Close the lasso and select every candidate lying entirely inside it.
    ///
    /// Returns the number of selected strokes.
    pub fn complete_selection_draw<'a>(
        &mut self,
        point: Point,
        candidates: impl IntoIterator<Item = &'a Stroke>,
    ) -> usize {
        if !self.state.drawing {
            return 0;
        }
        self.state.lasso.push(point);
        self.state.drawing = false;

        let mut region = self.state.lasso_path();
        region.close_path();
        let region_bounds = region.bounding_box();

        self.state.selected = candidates
            .into_iter()
            .filter(|stroke| rects_intersect(region_bounds, stroke.rect()))
            .filter(|stroke| stroke.points.iter().all(|p| region.contains(p.position())))
            .cloned()
            .collect();
        self.state.lasso.clear();
        self.state.recompute_bounds();
        log::debug!("lasso selected {} strokes", self.state.selected.len());
        self.state.selected.len()
    }

    /// Start dragging when `point` is inside the selection; otherwise deselect.
    pub fn start_moving_selection(&mut self, point: Point) -> bool {
        match self.state.bounds {
            Some(bounds) if self.state.has_selection() && bounds.contains(point) => {
                self.state.placement = PlacementMode::Move;
                self.state.last_move_point = Some(point);
                self.state.move_offset = Vec2::ZERO;
                true
            }
            _ => {
                self.state.reset();
                false
            }
        }
    }

    /// Drag by the distance from the previous accepted point.
    ///
    /// Returns false when the move would leave the page width or push the
    /// selection into a gutter between pages.
    pub fn update_moving_selection(&mut self, point: Point, pages: &PaginationManager) -> bool {
        let (Some(last), Some(bounds)) = (self.state.last_move_point, self.state.bounds) else {
            return false;
        };
        if !self.state.is_moving() {
            return false;
        }
        let delta = point - last;
        let moved = bounds + delta;
        if !is_move_within_boundaries(moved, pages) {
            log::debug!("selection move to {:?} rejected", moved);
            return false;
        }
        self.state.bounds = Some(moved);
        self.state.move_offset += delta;
        self.state.last_move_point = Some(point);
        true
    }

    /// Apply the accumulated offset to every selected stroke.
    ///
    /// Returns `None` when nothing moved.
    pub fn complete_moving_selection(&mut self) -> Option<MoveCommit> {
        if !self.state.is_moving() {
            return None;
        }
        let offset = self.state.move_offset;
        self.state.placement = PlacementMode::None;
        self.state.last_move_point = None;
        self.state.move_offset = Vec2::ZERO;
        if offset == Vec2::ZERO {
            return None;
        }

        let now = now_millis();
        let original = std::mem::take(&mut self.state.selected);
        let modified: Vec<Stroke> = original
            .iter()
            .map(|stroke| Stroke {
                updated_at: now,
                ..stroke.translated(offset.x as f32, offset.y as f32)
            })
            .collect();
        self.state.selected = modified.clone();
        self.state.recompute_bounds();
        Some(MoveCommit {
            original,
            modified,
            offset,
        })
    }

    /// Copy the selection to the clipboard and wait for a paste tap.
    ///
    /// Returns the number of copied strokes.
    pub fn copy_selection(&mut self) -> usize {
        if !self.state.has_selection() {
            return 0;
        }
        self.state.selected = self.state.selected.iter().map(Stroke::with_fresh_id).collect();
        self.state.placement = PlacementMode::Paste;
        self.state.recompute_bounds();
        log::info!("{} strokes copied", self.state.selected.len());
        self.state.selected.len()
    }

    /// Place the clipboard centered on `point`. The pasted strokes stay selected.
    pub fn paste_selection(&mut self, point: Point) -> Option<Vec<Stroke>> {
        if self.state.placement != PlacementMode::Paste {
            return None;
        }
        let bounds = self.state.bounds?;
        let delta = point - bounds.center();
        let now = now_millis();
        let pasted: Vec<Stroke> = self
            .state
            .selected
            .iter()
            .map(|stroke| Stroke {
                created_at: now,
                updated_at: now,
                ..stroke.translated(delta.x as f32, delta.y as f32).with_fresh_id()
            })
            .collect();
        if pasted.is_empty() {
            return None;
        }

        self.state.selected = pasted.clone();
        self.state.placement = PlacementMode::None;
        self.state.recompute_bounds();
        log::info!("{} strokes pasted", pasted.len());
        Some(pasted)
    }
}

/// Horizontal limits are the page width. Vertically the selection may go
/// anywhere except across a gutter between two pages.
fn is_move_within_boundaries(bounds: Rect, pages: &PaginationManager) -> bool {
    if bounds.x0 < 0.0 || bounds.x1 > pages.page_width() {
        return false;
    }
    if !pages.is_enabled() {
        return true;
    }
    let unit_index = |y: f64| (y / pages.page_unit()).floor().max(0.0) as usize;
    let top_index = unit_index(bounds.y0);
    let bottom_index = unit_index(bounds.y1);
    (top_index..bottom_index).all(|index| {
        let zone = pages.exclusion_zone(index);
        bounds.y1 <= zone.start || bounds.y0 >= zone.end
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{StrokePoint, StrokeStyle};

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
        Stroke::from_points("page", StrokeStyle::new(2.0, Default::default(), Default::default()), points, 0.0)
            .unwrap()
    }

    fn pages() -> PaginationManager {
        PaginationManager::with_dimensions(800.0, 1000.0, 10.0)
    }

    fn lasso_square(engine: &mut SelectionEngine, candidates: &[Stroke]) -> usize {
        engine.start_selection_draw(Point::new(0.0, 0.0));
        engine.update_selection_draw(Point::new(200.0, 0.0));
        engine.update_selection_draw(Point::new(200.0, 200.0));
        engine.complete_selection_draw(Point::new(0.0, 200.0), candidates)
    }

    #[test]
    fn test_selection_requires_full_containment() {
        let inside = stroke(&[(50.0, 50.0), (100.0, 100.0)]);
        let straddling = stroke(&[(150.0, 150.0), (250.0, 150.0)]);
        let outside = stroke(&[(500.0, 500.0)]);
        let mut engine = SelectionEngine::new();

        let count = lasso_square(&mut engine, &[inside.clone(), straddling, outside]);
        assert_eq!(count, 1);
        assert_eq!(engine.state().selected()[0].id, inside.id);
        assert_eq!(engine.state().bounds(), Some(inside.rect()));
        assert!(!engine.state().is_drawing());
    }

    #[test]
    fn test_tap_outside_deselects() {
        let mut engine = SelectionEngine::new();
        lasso_square(&mut engine, &[stroke(&[(50.0, 50.0), (100.0, 100.0)])]);
        assert!(!engine.start_moving_selection(Point::new(700.0, 700.0)));
        assert!(!engine.state().has_selection());
    }

    #[test]
    fn test_move_accumulates_from_last_point() {
        let original = stroke(&[(50.0, 50.0), (100.0, 100.0)]);
        let mut engine = SelectionEngine::new();
        lasso_square(&mut engine, &[original.clone()]);
        let pages = pages();

        assert!(engine.start_moving_selection(Point::new(75.0, 75.0)));
        assert!(engine.update_moving_selection(Point::new(85.0, 80.0), &pages));
        assert!(engine.update_moving_selection(Point::new(95.0, 90.0), &pages));
        assert_eq!(engine.state().move_offset(), Vec2::new(20.0, 15.0));

        let commit = engine.complete_moving_selection().unwrap();
        assert_eq!(commit.original[0], original);
        assert_eq!(commit.modified[0].id, original.id);
        assert_eq!(commit.modified[0].points[0].x, 70.0);
        assert_eq!(commit.modified[0].bounds.top, original.bounds.top + 15.0);
        assert_eq!(engine.state().placement(), PlacementMode::None);
        assert!(engine.state().has_selection());
    }

    #[test]
    fn test_move_rejected_past_page_width() {
        let mut engine = SelectionEngine::new();
        lasso_square(&mut engine, &[stroke(&[(50.0, 50.0), (100.0, 100.0)])]);
        let pages = pages();
        engine.start_moving_selection(Point::new(75.0, 75.0));

        assert!(!engine.update_moving_selection(Point::new(-75.0, 75.0), &pages));
        // The rejected point is not the new reference.
        assert!(engine.update_moving_selection(Point::new(85.0, 75.0), &pages));
        assert_eq!(engine.state().move_offset(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_move_rejected_across_gutter() {
        let mut engine = SelectionEngine::new();
        lasso_square(&mut engine, &[stroke(&[(50.0, 50.0), (100.0, 100.0)])]);
        let pages = pages();
        engine.start_moving_selection(Point::new(75.0, 75.0));

        // Bounds would span 980..1034, straddling the first gutter.
        assert!(!engine.update_moving_selection(Point::new(75.0, 1007.0), &pages));
        // Entirely on the second page is fine, and downward moves are unbounded.
        assert!(engine.update_moving_selection(Point::new(75.0, 1075.0), &pages));
        assert!(engine.update_moving_selection(Point::new(75.0, 50_075.0), &pages));
    }

    #[test]
    fn test_move_without_offset_commits_nothing() {
        let mut engine = SelectionEngine::new();
        lasso_square(&mut engine, &[stroke(&[(50.0, 50.0), (100.0, 100.0)])]);
        engine.start_moving_selection(Point::new(75.0, 75.0));
        assert!(engine.complete_moving_selection().is_none());
        assert!(!engine.state().is_moving());
    }

    #[test]
    fn test_copy_then_paste_centered_on_pointer() {
        let original = stroke(&[(50.0, 50.0), (100.0, 100.0)]);
        let mut engine = SelectionEngine::new();
        lasso_square(&mut engine, &[original.clone()]);

        assert_eq!(engine.copy_selection(), 1);
        assert_eq!(engine.state().placement(), PlacementMode::Paste);
        let copied_id = engine.state().selected()[0].id;
        assert_ne!(copied_id, original.id);

        // Bounds center is (75, 75); paste at (475, 575).
        let pasted = engine.paste_selection(Point::new(475.0, 575.0)).unwrap();
        assert_eq!(pasted.len(), 1);
        assert_ne!(pasted[0].id, original.id);
        assert_ne!(pasted[0].id, copied_id);
        assert_eq!(pasted[0].points[0].x, 450.0);
        assert_eq!(pasted[0].points[0].y, 550.0);
        assert_eq!(engine.state().placement(), PlacementMode::None);
        assert!(engine.paste_selection(Point::ZERO).is_none());
    }

    #[test]
    fn test_handle_touch_dispatch() {
        let target = stroke(&[(50.0, 50.0), (100.0, 100.0)]);
        let page = PageStrokes::with_strokes("page", vec![target.clone()]);
        let visible = Rect::new(0.0, 0.0, 800.0, 1000.0);
        let pages = pages();
        let mut engine = SelectionEngine::new();

        let mut touch = |phase, x, y| engine.handle_touch(phase, Point::new(x, y), &page, visible, &pages);
        assert_eq!(touch(SelectionPhase::Down, 0.0, 0.0), SelectionOutcome::None);
        touch(SelectionPhase::Move, 200.0, 0.0);
        touch(SelectionPhase::Move, 200.0, 200.0);
        assert_eq!(touch(SelectionPhase::Up, 0.0, 200.0), SelectionOutcome::Selected(1));

        assert_eq!(touch(SelectionPhase::Down, 75.0, 75.0), SelectionOutcome::None);
        touch(SelectionPhase::Move, 75.0, 125.0);
        match touch(SelectionPhase::Up, 75.0, 125.0) {
            SelectionOutcome::Moved(commit) => assert_eq!(commit.offset, Vec2::new(0.0, 50.0)),
            other => panic!("expected a move, got {other:?}"),
        }

        assert_eq!(touch(SelectionPhase::Down, 700.0, 900.0), SelectionOutcome::Deselected);
    }
}
