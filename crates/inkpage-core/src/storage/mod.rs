//! Storage abstraction for strokes and the history log.

mod file;
mod memory;
mod worker;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use worker::{PersistenceHandle, PersistenceJob, PersistenceWorker};

use crate::history::ActionRecord;
use crate::stroke::{Stroke, StrokeId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Page not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Stroke persistence for pages.
pub trait StrokeStore: Send + Sync {
    /// Load every stroke of a page in drawing order. A page never saved is empty.
    fn load_strokes(&self, page_id: &str) -> BoxFuture<'_, StorageResult<Vec<Stroke>>>;

    /// Insert or overwrite strokes by id.
    fn save_strokes(&self, page_id: &str, strokes: &[Stroke]) -> BoxFuture<'_, StorageResult<()>>;

    /// Delete strokes by id. Unknown ids are ignored.
    fn delete_strokes(&self, page_id: &str, ids: &[StrokeId]) -> BoxFuture<'_, StorageResult<()>>;

    /// Ids of every page with stored strokes.
    fn list_pages(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// Persistence of the bounded history log.
pub trait HistoryStore: Send + Sync {
    /// Records of a page in no particular order.
    fn load_actions(&self, page_id: &str) -> BoxFuture<'_, StorageResult<Vec<ActionRecord>>>;

    fn append_action(&self, record: &ActionRecord) -> BoxFuture<'_, StorageResult<()>>;

    fn remove_action(&self, page_id: &str, id: Uuid) -> BoxFuture<'_, StorageResult<()>>;

    /// Drop records with a sequence number above `sequence`.
    fn delete_actions_above(&self, page_id: &str, sequence: u32) -> BoxFuture<'_, StorageResult<()>>;

    /// Keep only the `limit` records with the highest sequence numbers.
    fn prune_to_limit(&self, page_id: &str, limit: usize) -> BoxFuture<'_, StorageResult<()>>;

    fn clear_history(&self, page_id: &str) -> BoxFuture<'_, StorageResult<()>>;
}

/// A backend that stores both strokes and history.
pub trait PageStorage: StrokeStore + HistoryStore {}

impl<T: StrokeStore + HistoryStore> PageStorage for T {}

/// Sort by sequence number and keep the newest `limit` records.
pub(crate) fn retain_newest(records: &mut Vec<ActionRecord>, limit: usize) {
    records.sort_by_key(|record| record.sequence_number);
    let excess = records.len().saturating_sub(limit);
    records.drain(..excess);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryAction;

    #[test]
    fn test_retain_newest() {
        let mut records: Vec<ActionRecord> = [3u32, 1, 4, 2]
            .into_iter()
            .map(|sequence| {
                let mut action = HistoryAction::insert_page(1, Vec::new(), 1.0);
                action.sequence_number = sequence;
                ActionRecord::from_action("page", &action).unwrap()
            })
            .collect();
        retain_newest(&mut records, 2);
        let sequences: Vec<u32> = records.iter().map(|r| r.sequence_number).collect();
        assert_eq!(sequences, vec![3, 4]);
    }
}
