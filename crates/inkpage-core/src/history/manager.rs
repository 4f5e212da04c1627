//! Undo/redo stacks with a bounded persisted log.

use super::{ActionRecord, HistoryAction};
use crate::config::DEFAULT_MAX_STORED_ACTIONS;
use crate::storage::{HistoryStore, PersistenceHandle};

/// Undo and redo stacks of one page.
///
/// The stacks only store actions. Applying an action in either direction is
/// up to the caller. The persisted log mirrors the undo stack: undo removes
/// a record, redo writes it back, and the log never holds more than
/// `max_stored_actions` records.
pub struct HistoryManager {
    page_id: String,
    undo_stack: Vec<HistoryAction>,
    redo_stack: Vec<HistoryAction>,
    current_sequence: u32,
    max_stored_actions: usize,
    persistence: Option<PersistenceHandle>,
}

impl HistoryManager {
    /// Empty history that is not persisted.
    pub fn new(page_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current_sequence: 0,
            max_stored_actions: DEFAULT_MAX_STORED_ACTIONS,
            persistence: None,
        }
    }

    pub fn with_max_stored_actions(mut self, max: usize) -> Self {
        self.max_stored_actions = max;
        self
    }

    /// Queue every future change of the log on `handle`.
    pub fn with_persistence(mut self, handle: PersistenceHandle) -> Self {
        self.persistence = Some(handle);
        self
    }

    /// Rebuild the undo stack from the persisted log.
    ///
    /// Records that cannot be decoded are skipped. If the log itself cannot
    /// be read the history starts empty.
    pub fn load<S>(&mut self, store: &S)
    where
        S: HistoryStore + ?Sized,
    {
        let mut records = match pollster::block_on(store.load_actions(&self.page_id)) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Failed to load history for {}: {}", self.page_id, e);
                Vec::new()
            }
        };
        records.sort_by_key(|record| record.sequence_number);

        self.undo_stack.clear();
        self.redo_stack.clear();
        for record in &records {
            match record.to_action() {
                Ok(action) => self.undo_stack.push(action),
                Err(e) => log::warn!("Skipping history record {}: {}", record.id, e),
            }
        }
        self.current_sequence = records.iter().map(|r| r.sequence_number).max().unwrap_or(0);
        log::info!(
            "Loaded {} history actions for {} (sequence {})",
            self.undo_stack.len(),
            self.page_id,
            self.current_sequence
        );
    }

    /// Record a new action. Clears the redo stack and returns the assigned
    /// sequence number.
    pub fn add_action(&mut self, mut action: HistoryAction) -> u32 {
        let had_redo = !self.redo_stack.is_empty();
        self.redo_stack.clear();
        let last_kept = self.undo_stack.last().map_or(0, |a| a.sequence_number);
        self.current_sequence += 1;
        action.sequence_number = self.current_sequence;

        if let Some(handle) = &self.persistence {
            if had_redo {
                handle.delete_actions_above(&self.page_id, last_kept);
            }
            persist(handle, &self.page_id, &action);
            handle.prune(&self.page_id, self.max_stored_actions);
        }
        log::debug!("history: {:?} #{}", action.kind(), action.sequence_number);
        self.undo_stack.push(action);
        self.current_sequence
    }

    /// Move the newest action to the redo stack and return it for inversion.
    pub fn undo(&mut self) -> Option<HistoryAction> {
        let action = self.undo_stack.pop()?;
        if let Some(handle) = &self.persistence {
            handle.remove_action(&self.page_id, action.id);
        }
        self.redo_stack.push(action.clone());
        Some(action)
    }

    /// Move the newest undone action back and return it for reapplication.
    pub fn redo(&mut self) -> Option<HistoryAction> {
        let action = self.redo_stack.pop()?;
        if let Some(handle) = &self.persistence {
            persist(handle, &self.page_id, &action);
            handle.prune(&self.page_id, self.max_stored_actions);
        }
        self.undo_stack.push(action.clone());
        Some(action)
    }

    /// Drop both stacks and the persisted log.
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        if let Some(handle) = &self.persistence {
            handle.clear_history(&self.page_id);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn current_sequence(&self) -> u32 {
        self.current_sequence
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }
}

fn persist(handle: &PersistenceHandle, page_id: &str, action: &HistoryAction) {
    match ActionRecord::from_action(page_id, action) {
        Ok(record) => handle.append_action(record),
        Err(e) => log::error!("Failed to encode history action {}: {}", action.id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BoxFuture, MemoryStorage, PersistenceWorker, StorageError, StorageResult};
    use pollster::block_on;
    use std::sync::Arc;
    use uuid::Uuid;

    fn insert(n: usize) -> HistoryAction {
        HistoryAction::insert_page(n, Vec::new(), 1010.0)
    }

    fn sequences(storage: &MemoryStorage) -> Vec<u32> {
        let mut records = block_on(storage.load_actions("page")).unwrap();
        records.sort_by_key(|r| r.sequence_number);
        records.iter().map(|r| r.sequence_number).collect()
    }

    #[test]
    fn test_undo_redo_stacks() {
        let mut history = HistoryManager::new("page");
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        assert_eq!(history.add_action(insert(1)), 1);
        assert_eq!(history.add_action(insert(2)), 2);

        let undone = history.undo().unwrap();
        assert_eq!(undone.sequence_number, 2);
        assert!(history.can_redo());

        let redone = history.redo().unwrap();
        assert_eq!(redone, undone);
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_add_clears_redo() {
        let mut history = HistoryManager::new("page");
        history.add_action(insert(1));
        history.undo();
        assert_eq!(history.add_action(insert(2)), 2);
        assert!(!history.can_redo());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_persisted_log_mirrors_undo_stack() {
        let storage = Arc::new(MemoryStorage::new());
        let worker = PersistenceWorker::spawn(storage.clone());
        let handle = worker.handle();
        let mut history = HistoryManager::new("page")
            .with_max_stored_actions(3)
            .with_persistence(handle.clone());

        for n in 1..=5 {
            history.add_action(insert(n));
        }
        handle.flush();
        assert_eq!(sequences(&storage), vec![3, 4, 5]);

        history.undo();
        handle.flush();
        assert_eq!(sequences(&storage), vec![3, 4]);

        history.redo();
        handle.flush();
        assert_eq!(sequences(&storage), vec![3, 4, 5]);

        history.clear_history();
        handle.flush();
        assert!(sequences(&storage).is_empty());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_load_resumes_sequence_and_skips_bad_records() {
        let storage = MemoryStorage::new();
        for n in [2u32, 1, 4] {
            let mut action = insert(n as usize);
            action.sequence_number = n;
            block_on(storage.append_action(&ActionRecord::from_action("page", &action).unwrap())).unwrap();
        }
        let mut bad = ActionRecord::from_action("page", &insert(9)).unwrap();
        bad.action_kind = "ROTATE_STROKES".to_string();
        bad.sequence_number = 3;
        block_on(storage.append_action(&bad)).unwrap();

        let mut history = HistoryManager::new("page");
        history.load(&storage);
        assert_eq!(history.undo_depth(), 3);
        assert_eq!(history.current_sequence(), 4);
        assert_eq!(history.undo().unwrap().sequence_number, 4);
        assert_eq!(history.add_action(insert(5)), 5);
    }

    #[test]
    fn test_load_failure_starts_empty() {
        struct Broken;
        impl HistoryStore for Broken {
            fn load_actions(&self, _: &str) -> BoxFuture<'_, StorageResult<Vec<ActionRecord>>> {
                Box::pin(async { Err(StorageError::Serialization("corrupt".to_string())) })
            }
            fn append_action(&self, _: &ActionRecord) -> BoxFuture<'_, StorageResult<()>> {
                Box::pin(async { Ok(()) })
            }
            fn remove_action(&self, _: &str, _: Uuid) -> BoxFuture<'_, StorageResult<()>> {
                Box::pin(async { Ok(()) })
            }
            fn delete_actions_above(&self, _: &str, _: u32) -> BoxFuture<'_, StorageResult<()>> {
                Box::pin(async { Ok(()) })
            }
            fn prune_to_limit(&self, _: &str, _: usize) -> BoxFuture<'_, StorageResult<()>> {
                Box::pin(async { Ok(()) })
            }
            fn clear_history(&self, _: &str) -> BoxFuture<'_, StorageResult<()>> {
                Box::pin(async { Ok(()) })
            }
        }

        let mut history = HistoryManager::new("page");
        history.add_action(insert(1));
        history.load(&Broken);
        assert!(!history.can_undo());
        assert_eq!(history.current_sequence(), 0);
    }
}
