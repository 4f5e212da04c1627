//! Per-page editing facade.
//!
//! [`DrawingManager`] owns everything one open page needs: its strokes, the
//! viewport, history, eraser and selection. Every committed mutation is
//! applied in memory first, then queued for persistence and announced to
//! subscribers.

use crate::config::EditorConfig;
use crate::events::{EventBus, PageEvent};
use crate::history::{ActionData, HistoryAction, HistoryManager};
use crate::page::PageStrokes;
use crate::page_ops::PageOperations;
use crate::pagination::{PageError, PageInsertion};
use crate::selection::{MoveCommit, SelectionEngine, SelectionOutcome, SelectionPhase, SelectionState};
use crate::storage::{PageStorage, PersistenceHandle};
use crate::stroke::{
    EraseResult, EraserKind, PenKind, PenSetting, PenSettingsTable, Stroke, StrokeColor, StrokeCreator, StrokeEraser,
    StrokeId, StrokeStyle, TouchPoint, union_bounds,
};
use crate::viewport::ViewportTransformer;
use kurbo::Point;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

/// Mutual exclusion between overlapping draw and erase input streams.
///
/// Clones share the same lock.
#[derive(Debug, Clone, Default)]
pub struct DrawGate {
    lock: Arc<Mutex<()>>,
}

impl DrawGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the gate, or `None` while another stream holds it.
    pub fn try_enter(&self) -> Option<MutexGuard<'_, ()>> {
        match self.lock.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

/// Which way a history action is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    Undo,
    Redo,
}

/// Editing state of one open page.
pub struct DrawingManager {
    page: PageStrokes,
    viewport: ViewportTransformer,
    history: HistoryManager,
    eraser: StrokeEraser,
    selection: SelectionEngine,
    pens: PenSettingsTable,
    gate: DrawGate,
    events: EventBus<PageEvent>,
    persistence: Option<PersistenceHandle>,
}

impl DrawingManager {
    /// An empty, unpersisted page.
    pub fn new(page_id: &str, config: &EditorConfig) -> Self {
        Self::with_viewport(page_id, config, ViewportTransformer::new(config))
    }

    /// An empty, unpersisted page over a prepared viewport.
    pub fn with_viewport(page_id: &str, config: &EditorConfig, viewport: ViewportTransformer) -> Self {
        Self {
            page: PageStrokes::new(page_id),
            viewport,
            history: HistoryManager::new(page_id).with_max_stored_actions(config.max_stored_actions),
            eraser: StrokeEraser::new(config.eraser_width),
            selection: SelectionEngine::new(),
            pens: PenSettingsTable::default(),
            gate: DrawGate::new(),
            events: EventBus::new(),
            persistence: None,
        }
    }

    /// Open a saved page. Its strokes and history come from `storage`;
    /// later writes go through `persistence`.
    ///
    /// A page that cannot be read opens empty.
    pub fn open<S>(page_id: &str, config: &EditorConfig, storage: &S, persistence: PersistenceHandle) -> Self
    where
        S: PageStorage + ?Sized,
    {
        let mut manager = Self::new(page_id, config);
        let strokes = match pollster::block_on(storage.load_strokes(page_id)) {
            Ok(strokes) => strokes,
            Err(e) => {
                log::warn!("Failed to load strokes for {}: {}", page_id, e);
                Vec::new()
            }
        };
        manager.page = PageStrokes::with_strokes(page_id, strokes);

        let mut history = HistoryManager::new(page_id).with_max_stored_actions(config.max_stored_actions);
        history.load(storage);
        manager.history = history.with_persistence(persistence.clone());
        manager.persistence = Some(persistence);

        let loaded = manager.page.snapshot();
        manager.grow_document_for(&loaded);
        log::info!("Opened page {} with {} strokes", page_id, manager.page.len());
        manager
    }

    pub fn subscribe(&mut self) -> Receiver<PageEvent> {
        self.events.subscribe()
    }

    /// Turn one input batch into a stroke.
    ///
    /// Samples inside a page gutter are dropped. Returns `None` when nothing
    /// is left, or when another input stream is mid-operation.
    pub fn handle_draw(&mut self, points: &[TouchPoint], size: f32, color: StrokeColor, pen: PenKind) -> Option<Stroke> {
        let gate = self.gate.clone();
        let Some(_guard) = gate.try_enter() else {
            log::debug!("draw skipped: input busy");
            return None;
        };

        let allowed: Vec<TouchPoint> = points
            .iter()
            .copied()
            .filter(|point| self.viewport.is_touch_allowed(point.position()))
            .collect();
        if allowed.len() < points.len() {
            log::debug!("dropped {} samples in page gutters", points.len() - allowed.len());
        }

        let style = StrokeStyle::new(size, color, pen);
        let stroke = StrokeCreator::create_stroke(&allowed, style, self.page.page_id(), &self.viewport)?;
        self.pens.set(pen, PenSetting { stroke_size: size, color });

        self.selection.reset();
        self.history.add_action(HistoryAction::add_strokes(vec![stroke.clone()]));
        self.add_strokes(vec![stroke.clone()]);
        Some(stroke)
    }

    /// Erase visible strokes touched by the gesture `points`.
    pub fn handle_erase(&mut self, points: &[TouchPoint], kind: EraserKind) -> EraseResult {
        let gate = self.gate.clone();
        let Some(_guard) = gate.try_enter() else {
            log::debug!("erase skipped: input busy");
            return EraseResult::default();
        };

        let visible = self.viewport.viewport_in_page_space();
        let result = self
            .eraser
            .find_strokes_to_erase(self.page.visible_strokes(visible), points, kind, &self.viewport);
        if result.is_empty() {
            return result;
        }

        // A selection may hold the erased strokes.
        self.selection.reset();
        self.history.add_action(HistoryAction::delete_strokes(result.strokes.clone()));
        let ids: Vec<StrokeId> = result.strokes.iter().map(|s| s.id).collect();
        self.remove_strokes(&ids);
        log::debug!("erased {} strokes", ids.len());
        result
    }

    /// Revert the newest action. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(action) => {
                self.replay(&action, Replay::Undo);
                true
            }
            None => {
                log::debug!("nothing to undo");
                false
            }
        }
    }

    /// Reapply the newest undone action. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(action) => {
                self.replay(&action, Replay::Redo);
                true
            }
            None => {
                log::debug!("nothing to redo");
                false
            }
        }
    }

    /// Insert a blank page at 1-based `page_number`.
    pub fn insert_page(&mut self, page_number: usize) -> Result<PageInsertion, PageError> {
        let insertion = PageOperations::insert_page(page_number, &mut self.page, &mut self.viewport, &mut self.history)?;
        self.selection.reset();
        self.persist_save(insertion.shifted.clone());
        self.events.emit(PageEvent::PageInserted {
            page_number,
            shifted: insertion.shifted.len(),
        });
        Ok(insertion)
    }

    /// Feed one selection touch at a view-space point and commit what it finishes.
    pub fn handle_selection_touch(&mut self, phase: SelectionPhase, view_point: Point) -> SelectionOutcome {
        let point = self.viewport.view_to_page(view_point);
        let visible = self.viewport.viewport_in_page_space();
        let outcome = self
            .selection
            .handle_touch(phase, point, &self.page, visible, self.viewport.pagination());

        match outcome {
            SelectionOutcome::Moved(commit) => self.commit_move(commit),
            SelectionOutcome::Pasted(strokes) => {
                self.history.add_action(HistoryAction::add_strokes(strokes.clone()));
                self.add_strokes(strokes.clone());
                SelectionOutcome::Pasted(strokes)
            }
            other => other,
        }
    }

    /// Record and apply a finished move for the strokes still on the page.
    fn commit_move(&mut self, commit: MoveCommit) -> SelectionOutcome {
        let (original, modified): (Vec<Stroke>, Vec<Stroke>) = commit
            .original
            .into_iter()
            .zip(commit.modified)
            .filter(|(stroke, _)| self.page.contains(stroke.id))
            .unzip();
        if original.is_empty() {
            log::warn!("Dropped a move of strokes no longer on the page");
            return SelectionOutcome::None;
        }

        self.history.add_action(HistoryAction::move_strokes(
            original.clone(),
            modified.clone(),
            commit.offset.x as f32,
            commit.offset.y as f32,
        ));
        self.move_strokes(&original, modified.clone());
        SelectionOutcome::Moved(MoveCommit {
            original,
            modified,
            offset: commit.offset,
        })
    }

    /// Copy the current selection; the next selection touch down pastes it.
    pub fn copy_selection(&mut self) -> usize {
        self.selection.copy_selection()
    }

    /// Abandon any lasso, move or pending paste.
    pub fn reset_selection(&mut self) {
        self.selection.reset();
    }

    pub fn clear_history(&mut self) {
        self.history.clear_history();
    }

    pub fn page(&self) -> &PageStrokes {
        &self.page
    }

    pub fn viewport(&self) -> &ViewportTransformer {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportTransformer {
        &mut self.viewport
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn pen_settings(&self) -> &PenSettingsTable {
        &self.pens
    }

    /// A handle on the gate guarding draw and erase.
    pub fn draw_gate(&self) -> DrawGate {
        self.gate.clone()
    }

    fn replay(&mut self, action: &HistoryAction, direction: Replay) {
        self.selection.reset();
        match (&action.data, direction) {
            (ActionData::AddStrokes(data), Replay::Undo) | (ActionData::DeleteStrokes(data), Replay::Redo) => {
                self.remove_strokes(&data.stroke_ids);
            }
            (ActionData::AddStrokes(data), Replay::Redo) | (ActionData::DeleteStrokes(data), Replay::Undo) => {
                self.add_strokes(data.strokes.clone());
            }
            (ActionData::MoveStrokes(data), Replay::Undo) => {
                self.move_strokes(&data.modified_strokes, data.original_strokes.clone());
            }
            (ActionData::MoveStrokes(data), Replay::Redo) => {
                self.move_strokes(&data.original_strokes, data.modified_strokes.clone());
            }
            (ActionData::InsertPage(data), direction) => {
                let shifted = match direction {
                    Replay::Undo => PageOperations::undo_insert(data, &mut self.page, &mut self.viewport),
                    Replay::Redo => PageOperations::redo_insert(data, &mut self.page, &mut self.viewport),
                };
                if let Some(dirty) = union_bounds(&shifted) {
                    self.events.emit(PageEvent::StrokesReplaced {
                        ids: shifted.iter().map(|s| s.id).collect(),
                        dirty,
                    });
                }
                self.persist_save(shifted);
            }
        }
        log::debug!("{:?} {:?} #{}", direction, action.kind(), action.sequence_number);
        self.events.emit(PageEvent::HistoryReplayed);
    }

    fn add_strokes(&mut self, strokes: Vec<Stroke>) {
        let Some(dirty) = union_bounds(&strokes) else {
            return;
        };
        self.page.add_all(strokes.iter().cloned());
        self.grow_document_for(&strokes);
        self.events.emit(PageEvent::StrokesAdded {
            ids: strokes.iter().map(|s| s.id).collect(),
            dirty,
        });
        self.persist_save(strokes);
    }

    fn remove_strokes(&mut self, ids: &[StrokeId]) {
        let removed = self.page.remove_all(ids);
        let Some(dirty) = union_bounds(&removed) else {
            return;
        };
        let ids: Vec<StrokeId> = removed.iter().map(|s| s.id).collect();
        self.events.emit(PageEvent::StrokesRemoved { ids: ids.clone(), dirty });
        if let Some(handle) = &self.persistence {
            handle.delete_strokes(self.page.page_id(), ids);
        }
    }

    /// Swap `previous` for `next` and put the moved strokes on top.
    /// The dirty rect covers both positions.
    fn move_strokes(&mut self, previous: &[Stroke], next: Vec<Stroke>) {
        let next = self.page.bring_to_front(next);
        let dirty = match (union_bounds(previous), union_bounds(&next)) {
            (Some(a), Some(b)) => a.union(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => return,
        };
        self.grow_document_for(&next);
        self.events.emit(PageEvent::StrokesReplaced {
            ids: next.iter().map(|s| s.id).collect(),
            dirty,
        });
        self.persist_save(next);
    }

    /// Keep the document at least `bottom_padding` below the lowest stroke.
    fn grow_document_for(&mut self, strokes: &[Stroke]) {
        let Some(bottom) = strokes.iter().map(|s| s.bounds.bottom as f64).reduce(f64::max) else {
            return;
        };
        let needed = bottom + self.viewport.bottom_padding();
        if needed > self.viewport.document_height() {
            self.viewport.update_document_height(needed);
        }
    }

    fn persist_save(&self, strokes: Vec<Stroke>) {
        if let Some(handle) = &self.persistence {
            handle.save_strokes(self.page.page_id(), strokes);
        }
    }
}
