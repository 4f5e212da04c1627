//! In-memory storage implementation.

use super::{BoxFuture, HistoryStore, StorageError, StorageResult, StrokeStore, retain_newest};
use crate::history::ActionRecord;
use crate::stroke::{Stroke, StrokeId};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
struct PageData {
    strokes: Vec<Stroke>,
    actions: Vec<ActionRecord>,
}

/// In-memory storage for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    pages: RwLock<HashMap<String, PageData>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with an IO error, to exercise error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write<T>(&self, page_id: &str, f: impl FnOnce(&mut PageData) -> T) -> StorageResult<T> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(format!("Write to {} refused", page_id)));
        }
        let mut pages = self
            .pages
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        Ok(f(pages.entry(page_id.to_string()).or_default()))
    }

    fn read<T>(&self, page_id: &str, f: impl FnOnce(Option<&PageData>) -> T) -> StorageResult<T> {
        let pages = self
            .pages
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        Ok(f(pages.get(page_id)))
    }
}

impl StrokeStore for MemoryStorage {
    fn load_strokes(&self, page_id: &str) -> BoxFuture<'_, StorageResult<Vec<Stroke>>> {
        let page_id = page_id.to_string();
        Box::pin(async move { self.read(&page_id, |page| page.map(|p| p.strokes.clone()).unwrap_or_default()) })
    }

    fn save_strokes(&self, page_id: &str, strokes: &[Stroke]) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        let strokes = strokes.to_vec();
        Box::pin(async move {
            self.write(&page_id, |page| {
                for stroke in strokes {
                    match page.strokes.iter_mut().find(|s| s.id == stroke.id) {
                        Some(existing) => *existing = stroke,
                        None => page.strokes.push(stroke),
                    }
                }
            })
        })
    }

    fn delete_strokes(&self, page_id: &str, ids: &[StrokeId]) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        let ids = ids.to_vec();
        Box::pin(async move {
            self.write(&page_id, |page| page.strokes.retain(|s| !ids.contains(&s.id)))
        })
    }

    fn list_pages(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let pages = self
                .pages
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            Ok(pages
                .iter()
                .filter(|(_, page)| !page.strokes.is_empty())
                .map(|(id, _)| id.clone())
                .collect())
        })
    }
}

impl HistoryStore for MemoryStorage {
    fn load_actions(&self, page_id: &str) -> BoxFuture<'_, StorageResult<Vec<ActionRecord>>> {
        let page_id = page_id.to_string();
        Box::pin(async move { self.read(&page_id, |page| page.map(|p| p.actions.clone()).unwrap_or_default()) })
    }

    fn append_action(&self, record: &ActionRecord) -> BoxFuture<'_, StorageResult<()>> {
        let record = record.clone();
        Box::pin(async move {
            let page_id = record.page_id.clone();
            self.write(&page_id, |page| page.actions.push(record))
        })
    }

    fn remove_action(&self, page_id: &str, id: Uuid) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        Box::pin(async move { self.write(&page_id, |page| page.actions.retain(|r| r.id != id)) })
    }

    fn delete_actions_above(&self, page_id: &str, sequence: u32) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        Box::pin(async move {
            self.write(&page_id, |page| page.actions.retain(|r| r.sequence_number <= sequence))
        })
    }

    fn prune_to_limit(&self, page_id: &str, limit: usize) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        Box::pin(async move { self.write(&page_id, |page| retain_newest(&mut page.actions, limit)) })
    }

    fn clear_history(&self, page_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        Box::pin(async move { self.write(&page_id, |page| page.actions.clear()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryAction;
    use crate::stroke::{StrokePoint, StrokeStyle};
    use pollster::block_on;

    fn stroke(x: f32) -> Stroke {
        let point = StrokePoint {
            x,
            y: 0.0,
            pressure: 1.0,
            size: 1.0,
            tilt_x: 0,
            tilt_y: 0,
            timestamp: 0,
        };
        Stroke::from_points("page", StrokeStyle::default(), vec![point], 0.0).unwrap()
    }

    fn record(sequence: u32) -> ActionRecord {
        let mut action = HistoryAction::insert_page(1, Vec::new(), 1.0);
        action.sequence_number = sequence;
        ActionRecord::from_action("page", &action).unwrap()
    }

    #[test]
    fn test_save_is_upsert() {
        let storage = MemoryStorage::new();
        let a = stroke(1.0);
        let b = stroke(2.0);
        block_on(storage.save_strokes("page", &[a.clone(), b.clone()])).unwrap();
        block_on(storage.save_strokes("page", &[a.translated(5.0, 0.0)])).unwrap();

        let loaded = block_on(storage.load_strokes("page")).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, a.id);
        assert_eq!(loaded[0].points[0].x, 6.0);
    }

    #[test]
    fn test_delete_and_missing_page() {
        let storage = MemoryStorage::new();
        let a = stroke(1.0);
        block_on(storage.save_strokes("page", &[a.clone()])).unwrap();
        block_on(storage.delete_strokes("page", &[a.id])).unwrap();
        assert!(block_on(storage.load_strokes("page")).unwrap().is_empty());
        assert!(block_on(storage.load_strokes("other")).unwrap().is_empty());
        assert!(block_on(storage.list_pages()).unwrap().is_empty());
    }

    #[test]
    fn test_history_log_operations() {
        let storage = MemoryStorage::new();
        for sequence in 1..=5 {
            block_on(storage.append_action(&record(sequence))).unwrap();
        }
        block_on(storage.prune_to_limit("page", 3)).unwrap();
        block_on(storage.delete_actions_above("page", 4)).unwrap();
        let sequences: Vec<u32> = block_on(storage.load_actions("page"))
            .unwrap()
            .iter()
            .map(|r| r.sequence_number)
            .collect();
        assert_eq!(sequences, vec![3, 4]);

        block_on(storage.clear_history("page")).unwrap();
        assert!(block_on(storage.load_actions("page")).unwrap().is_empty());
    }

    #[test]
    fn test_failing_writes() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let result = block_on(storage.save_strokes("page", &[stroke(1.0)]));
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
