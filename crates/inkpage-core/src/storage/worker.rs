//! Background persistence in submission order.
//!
//! Mutations are applied in memory first; their writes are queued here and
//! run one at a time on a dedicated thread, so a later write can never land
//! before an earlier one.

use super::PageStorage;
use crate::history::ActionRecord;
use crate::stroke::{Stroke, StrokeId};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};
use uuid::Uuid;

/// A write queued for the persistence thread.
pub enum PersistenceJob {
    SaveStrokes { page_id: String, strokes: Vec<Stroke> },
    DeleteStrokes { page_id: String, ids: Vec<StrokeId> },
    AppendAction(ActionRecord),
    RemoveAction { page_id: String, id: Uuid },
    DeleteActionsAbove { page_id: String, sequence: u32 },
    Prune { page_id: String, limit: usize },
    ClearHistory { page_id: String },
    /// Reply once every earlier job has run.
    Flush(Sender<()>),
    Shutdown,
}

impl PersistenceJob {
    fn name(&self) -> &'static str {
        match self {
            PersistenceJob::SaveStrokes { .. } => "save strokes",
            PersistenceJob::DeleteStrokes { .. } => "delete strokes",
            PersistenceJob::AppendAction(_) => "append action",
            PersistenceJob::RemoveAction { .. } => "remove action",
            PersistenceJob::DeleteActionsAbove { .. } => "delete newer actions",
            PersistenceJob::Prune { .. } => "prune history",
            PersistenceJob::ClearHistory { .. } => "clear history",
            PersistenceJob::Flush(_) => "flush",
            PersistenceJob::Shutdown => "shutdown",
        }
    }
}

/// Cloneable sender side of the persistence queue.
#[derive(Clone)]
pub struct PersistenceHandle {
    tx: Sender<PersistenceJob>,
}

impl PersistenceHandle {
    /// Queue a job. If the worker is gone the job is dropped and logged.
    pub fn submit(&self, job: PersistenceJob) {
        let name = job.name();
        if self.tx.send(job).is_err() {
            log::error!("Persistence worker stopped; dropped {} job", name);
        }
    }

    pub fn save_strokes(&self, page_id: &str, strokes: Vec<Stroke>) {
        if !strokes.is_empty() {
            self.submit(PersistenceJob::SaveStrokes {
                page_id: page_id.to_string(),
                strokes,
            });
        }
    }

    pub fn delete_strokes(&self, page_id: &str, ids: Vec<StrokeId>) {
        if !ids.is_empty() {
            self.submit(PersistenceJob::DeleteStrokes {
                page_id: page_id.to_string(),
                ids,
            });
        }
    }

    pub fn append_action(&self, record: ActionRecord) {
        self.submit(PersistenceJob::AppendAction(record));
    }

    pub fn remove_action(&self, page_id: &str, id: Uuid) {
        self.submit(PersistenceJob::RemoveAction {
            page_id: page_id.to_string(),
            id,
        });
    }

    pub fn delete_actions_above(&self, page_id: &str, sequence: u32) {
        self.submit(PersistenceJob::DeleteActionsAbove {
            page_id: page_id.to_string(),
            sequence,
        });
    }

    pub fn prune(&self, page_id: &str, limit: usize) {
        self.submit(PersistenceJob::Prune {
            page_id: page_id.to_string(),
            limit,
        });
    }

    pub fn clear_history(&self, page_id: &str) {
        self.submit(PersistenceJob::ClearHistory {
            page_id: page_id.to_string(),
        });
    }

    /// Block until every job queued so far has run.
    pub fn flush(&self) {
        let (done_tx, done_rx) = channel();
        self.submit(PersistenceJob::Flush(done_tx));
        if done_rx.recv().is_err() {
            log::warn!("Persistence worker exited before flush completed");
        }
    }
}

/// Owns the persistence thread. Dropping it drains the queue and joins.
pub struct PersistenceWorker {
    handle: PersistenceHandle,
    thread: Option<JoinHandle<()>>,
}

impl PersistenceWorker {
    pub fn spawn(storage: Arc<dyn PageStorage>) -> Self {
        let (tx, rx) = channel::<PersistenceJob>();
        let thread = thread::Builder::new()
            .name("inkpage-persistence".to_string())
            .spawn(move || run(storage, rx));
        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to start persistence thread: {}", e);
                None
            }
        };
        Self {
            handle: PersistenceHandle { tx },
            thread,
        }
    }

    pub fn handle(&self) -> PersistenceHandle {
        self.handle.clone()
    }
}

impl Drop for PersistenceWorker {
    fn drop(&mut self) {
        self.handle.submit(PersistenceJob::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Persistence thread panicked");
            }
        }
    }
}

fn run(storage: Arc<dyn PageStorage>, rx: Receiver<PersistenceJob>) {
    log::info!("Persistence worker started");
    while let Ok(job) = rx.recv() {
        let name = job.name();
        let result = match job {
            PersistenceJob::SaveStrokes { page_id, strokes } => {
                pollster::block_on(storage.save_strokes(&page_id, &strokes))
            }
            PersistenceJob::DeleteStrokes { page_id, ids } => pollster::block_on(storage.delete_strokes(&page_id, &ids)),
            PersistenceJob::AppendAction(record) => pollster::block_on(storage.append_action(&record)),
            PersistenceJob::RemoveAction { page_id, id } => pollster::block_on(storage.remove_action(&page_id, id)),
            PersistenceJob::DeleteActionsAbove { page_id, sequence } => {
                pollster::block_on(storage.delete_actions_above(&page_id, sequence))
            }
            PersistenceJob::Prune { page_id, limit } => pollster::block_on(storage.prune_to_limit(&page_id, limit)),
            PersistenceJob::ClearHistory { page_id } => pollster::block_on(storage.clear_history(&page_id)),
            PersistenceJob::Flush(done) => {
                let _ = done.send(());
                Ok(())
            }
            PersistenceJob::Shutdown => break,
        };
        if let Err(e) = result {
            log::error!("Persistence {} failed: {}", name, e);
        }
    }
    log::info!("Persistence worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryAction;
    use crate::storage::{HistoryStore, MemoryStorage, StrokeStore};
    use crate::stroke::{StrokePoint, StrokeStyle};
    use pollster::block_on;

    fn stroke() -> Stroke {
        let point = StrokePoint {
            x: 1.0,
            y: 1.0,
            pressure: 1.0,
            size: 1.0,
            tilt_x: 0,
            tilt_y: 0,
            timestamp: 0,
        };
        Stroke::from_points("page", StrokeStyle::default(), vec![point], 0.0).unwrap()
    }

    #[test]
    fn test_jobs_apply_in_order() {
        let storage = Arc::new(MemoryStorage::new());
        let worker = PersistenceWorker::spawn(storage.clone());
        let handle = worker.handle();

        let s = stroke();
        handle.save_strokes("page", vec![s.clone()]);
        handle.save_strokes("page", vec![s.translated(0.0, 10.0)]);
        handle.delete_strokes("page", vec![s.id]);
        handle.save_strokes("page", vec![s.translated(0.0, 20.0)]);
        handle.flush();

        let loaded = block_on(storage.load_strokes("page")).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].points[0].y, 21.0);
    }

    #[test]
    fn test_failures_do_not_stop_the_worker() {
        let storage = Arc::new(MemoryStorage::new());
        let worker = PersistenceWorker::spawn(storage.clone());
        let handle = worker.handle();

        storage.set_fail_writes(true);
        handle.save_strokes("page", vec![stroke()]);
        handle.flush();
        storage.set_fail_writes(false);

        let record = ActionRecord::from_action("page", &HistoryAction::insert_page(1, Vec::new(), 1.0)).unwrap();
        handle.append_action(record.clone());
        handle.flush();

        assert!(block_on(storage.load_strokes("page")).unwrap().is_empty());
        assert_eq!(block_on(storage.load_actions("page")).unwrap(), vec![record]);
    }

    #[test]
    fn test_drop_drains_queue() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let worker = PersistenceWorker::spawn(storage.clone());
            worker.handle().save_strokes("page", vec![stroke()]);
        }
        assert_eq!(block_on(storage.load_strokes("page")).unwrap().len(), 1);
    }
}
