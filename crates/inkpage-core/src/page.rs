//! The in-memory stroke set of one page.

use crate::pagination::PaginationManager;
use crate::stroke::{Stroke, StrokeId};
use crate::viewport::rects_intersect;
use kurbo::Rect;
use std::collections::HashMap;

/// Strokes of one page, keyed by id and kept in drawing order.
#[derive(Debug, Clone, Default)]
pub struct PageStrokes {
    page_id: String,
    strokes: HashMap<StrokeId, Stroke>,
    /// Drawing order (oldest first).
    order: Vec<StrokeId>,
}

impl PageStrokes {
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            strokes: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// A page populated with previously saved strokes.
    pub fn with_strokes(page_id: impl Into<String>, strokes: Vec<Stroke>) -> Self {
        let mut page = Self::new(page_id);
        page.add_all(strokes);
        page
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// Add a stroke on top. A stroke with the same id is replaced in place.
    pub fn add(&mut self, stroke: Stroke) {
        let id = stroke.id;
        if self.strokes.insert(id, stroke).is_none() {
            self.order.push(id);
        }
    }

    pub fn add_all(&mut self, strokes: impl IntoIterator<Item = Stroke>) {
        for stroke in strokes {
            self.add(stroke);
        }
    }

    pub fn remove(&mut self, id: StrokeId) -> Option<Stroke> {
        let removed = self.strokes.remove(&id)?;
        self.order.retain(|&stroke_id| stroke_id != id);
        Some(removed)
    }

    /// Remove every listed stroke, returning the ones that were present.
    pub fn remove_all(&mut self, ids: &[StrokeId]) -> Vec<Stroke> {
        let removed: Vec<Stroke> = ids.iter().filter_map(|id| self.strokes.remove(id)).collect();
        if !removed.is_empty() {
            self.order.retain(|id| self.strokes.contains_key(id));
        }
        removed
    }

    /// Swap in new values for existing strokes, keeping their drawing order.
    /// Strokes that are not on the page are skipped.
    pub fn replace_all(&mut self, strokes: impl IntoIterator<Item = Stroke>) {
        for stroke in strokes {
            if let Some(slot) = self.strokes.get_mut(&stroke.id) {
                *slot = stroke;
            }
        }
    }

    /// Replace existing strokes and move them on top of the drawing order.
    /// Returns the strokes that were applied; ids not on the page are skipped.
    pub fn bring_to_front(&mut self, strokes: impl IntoIterator<Item = Stroke>) -> Vec<Stroke> {
        let applied: Vec<Stroke> = strokes.into_iter().filter(|s| self.contains(s.id)).collect();
        let ids: Vec<StrokeId> = applied.iter().map(|s| s.id).collect();
        self.remove_all(&ids);
        self.add_all(applied.iter().cloned());
        applied
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.order.clear();
    }

    pub fn get(&self, id: StrokeId) -> Option<&Stroke> {
        self.strokes.get(&id)
    }

    pub fn contains(&self, id: StrokeId) -> bool {
        self.strokes.contains_key(&id)
    }

    /// Strokes in drawing order.
    pub fn strokes_ordered(&self) -> impl Iterator<Item = &Stroke> {
        self.order.iter().filter_map(|id| self.strokes.get(id))
    }

    /// Owned copies of every stroke, in drawing order.
    pub fn snapshot(&self) -> Vec<Stroke> {
        self.strokes_ordered().cloned().collect()
    }

    /// Strokes whose bounds meet `viewport`.
    pub fn visible_strokes(&self, viewport: Rect) -> impl Iterator<Item = &Stroke> {
        self.strokes_ordered()
            .filter(move |stroke| rects_intersect(stroke.rect(), viewport))
    }

    /// Strokes whose bounds center lies on 1-based page `page_number`.
    pub fn strokes_on_page<'a>(
        &'a self,
        pages: &'a PaginationManager,
        page_number: usize,
    ) -> impl Iterator<Item = &'a Stroke> {
        self.strokes_ordered()
            .filter(move |stroke| pages.page_number_for_y(stroke.rect().center().y) == page_number)
    }

    pub fn stroke_count_on_page(&self, pages: &PaginationManager, page_number: usize) -> usize {
        self.strokes_on_page(pages, page_number).count()
    }

    /// Union of every stroke's bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.strokes
            .values()
            .map(Stroke::rect)
            .reduce(|acc, rect| acc.union(rect))
    }

    /// Lowest stroke bottom edge.
    pub fn content_bottom(&self) -> Option<f64> {
        self.strokes
            .values()
            .map(|stroke| stroke.bounds.bottom as f64)
            .reduce(f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }
}
