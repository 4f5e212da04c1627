//! Page insertion and its reversal.

use crate::history::{HistoryAction, HistoryManager, InsertPageActionData};
use crate::page::PageStrokes;
use crate::pagination::{PageError, PageInsertion};
use crate::stroke::{Stroke, StrokeId};
use crate::viewport::ViewportTransformer;

/// Page-level edits that touch layout, strokes and history together.
pub struct PageOperations;

impl PageOperations {
    /// Insert a blank page at 1-based `page_number`.
    ///
    /// Strokes starting at or below the new page's top move down by one page
    /// unit and the document grows to hold the extra page. On error nothing
    /// is changed.
    pub fn insert_page(
        page_number: usize,
        page: &mut PageStrokes,
        viewport: &mut ViewportTransformer,
        history: &mut HistoryManager,
    ) -> Result<PageInsertion, PageError> {
        let pagination = viewport.pagination();
        let old_total = pagination.total_page_count();
        let insertion = pagination.insert_page_at(page_number, &page.snapshot())?;
        let grown_height = pagination.page_bottom_y(old_total).max(pagination.document_height());

        page.replace_all(insertion.shifted.iter().cloned());
        history.add_action(HistoryAction::insert_page(
            page_number,
            insertion.affected_ids(),
            insertion.page_offset,
        ));
        viewport.update_document_height(grown_height);

        log::info!(
            "Inserted page {} at y={}, shifted {} strokes",
            page_number,
            insertion.insertion_y,
            insertion.shifted.len()
        );
        Ok(insertion)
    }

    /// Reverse an insertion: move the affected strokes back up and shrink
    /// the document. Returns the strokes that moved.
    pub fn undo_insert(
        data: &InsertPageActionData,
        page: &mut PageStrokes,
        viewport: &mut ViewportTransformer,
    ) -> Vec<Stroke> {
        let shifted = shift_strokes(page, &data.affected_stroke_ids, -data.page_offset);
        let height = viewport.document_height() - data.page_offset as f64;
        viewport.update_document_height(height);
        shifted
    }

    /// Apply an undone insertion again.
    pub fn redo_insert(
        data: &InsertPageActionData,
        page: &mut PageStrokes,
        viewport: &mut ViewportTransformer,
    ) -> Vec<Stroke> {
        let shifted = shift_strokes(page, &data.affected_stroke_ids, data.page_offset);
        let height = viewport.document_height() + data.page_offset as f64;
        viewport.update_document_height(height);
        shifted
    }
}

/// Translate the listed strokes vertically. Ids no longer on the page are skipped.
fn shift_strokes(page: &mut PageStrokes, ids: &[StrokeId], dy: f32) -> Vec<Stroke> {
    let shifted: Vec<Stroke> = ids
        .iter()
        .filter_map(|id| page.get(*id))
        .map(|stroke| stroke.translated(0.0, dy))
        .collect();
    page.replace_all(shifted.iter().cloned());
    shifted
}
