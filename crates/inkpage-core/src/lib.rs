//! Inkpage Core Library
//!
//! Platform-agnostic page geometry, stroke editing and undo history for the
//! inkpage handwritten note editor.

pub mod config;
pub mod drawing;
pub mod events;
pub mod history;
pub mod page;
pub mod page_ops;
pub mod pagination;
pub mod selection;
pub mod storage;
pub mod stroke;
pub mod viewport;

pub use config::{ConfigError, EditorConfig};
pub use drawing::{DrawGate, DrawingManager};
pub use events::{EventBus, PageEvent, ViewportEvent};
pub use history::{ActionData, ActionKind, ActionRecord, HistoryAction, HistoryError, HistoryManager};
pub use page::PageStrokes;
pub use page_ops::PageOperations;
pub use pagination::{PageError, PageInsertion, PaginationManager, PaperSize};
pub use selection::{SelectionEngine, SelectionOutcome, SelectionPhase, SelectionState};
pub use storage::{FileStorage, MemoryStorage, PageStorage, PersistenceWorker, StorageError};
pub use stroke::{EraserKind, PenKind, Stroke, StrokeColor, StrokeId, StrokePoint, TouchPoint};
pub use viewport::ViewportTransformer;
