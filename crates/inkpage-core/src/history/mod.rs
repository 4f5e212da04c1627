//! Undo/redo history: reversible actions, their persisted records and the
//! stacks that hold them.

mod manager;
mod record;

pub use manager::HistoryManager;
pub use record::ActionRecord;

use crate::stroke::{Stroke, StrokeId, now_millis};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// History errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Unknown action kind: {0}")]
    UnknownActionKind(String),
    #[error("Malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode action: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted discriminant of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    AddStrokes,
    DeleteStrokes,
    MoveStrokes,
    InsertPage,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::AddStrokes,
        ActionKind::DeleteStrokes,
        ActionKind::MoveStrokes,
        ActionKind::InsertPage,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ActionKind::AddStrokes => "ADD_STROKES",
            ActionKind::DeleteStrokes => "DELETE_STROKES",
            ActionKind::MoveStrokes => "MOVE_STROKES",
            ActionKind::InsertPage => "INSERT_PAGE",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

/// Strokes added or deleted, as full snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeActionData {
    #[serde(default)]
    pub stroke_ids: Vec<StrokeId>,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
}

impl StrokeActionData {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self {
            stroke_ids: strokes.iter().map(|s| s.id).collect(),
            strokes,
        }
    }
}

/// Strokes before and after a move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveActionData {
    #[serde(default)]
    pub stroke_ids: Vec<StrokeId>,
    pub original_strokes: Vec<Stroke>,
    pub modified_strokes: Vec<Stroke>,
    #[serde(default)]
    pub offset_x: f32,
    #[serde(default)]
    pub offset_y: f32,
}

/// A page inserted above the listed strokes.
///
/// Only ids and the offset are kept; the shift is undone arithmetically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertPageActionData {
    pub page_number: usize,
    #[serde(default)]
    pub affected_stroke_ids: Vec<StrokeId>,
    pub page_offset: f32,
}

/// What an action did, with enough data to apply it in either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionData {
    AddStrokes(StrokeActionData),
    DeleteStrokes(StrokeActionData),
    MoveStrokes(MoveActionData),
    InsertPage(InsertPageActionData),
}

impl ActionData {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionData::AddStrokes(_) => ActionKind::AddStrokes,
            ActionData::DeleteStrokes(_) => ActionKind::DeleteStrokes,
            ActionData::MoveStrokes(_) => ActionKind::MoveStrokes,
            ActionData::InsertPage(_) => ActionKind::InsertPage,
        }
    }

    /// Serialize the variant's fields; the kind travels separately.
    pub fn encode(&self) -> Result<Vec<u8>, HistoryError> {
        let bytes = match self {
            ActionData::AddStrokes(data) | ActionData::DeleteStrokes(data) => serde_json::to_vec(data)?,
            ActionData::MoveStrokes(data) => serde_json::to_vec(data)?,
            ActionData::InsertPage(data) => serde_json::to_vec(data)?,
        };
        Ok(bytes)
    }

    /// Decode a payload written by [`ActionData::encode`]. Unknown fields are ignored.
    pub fn decode(kind_key: &str, payload: &[u8]) -> Result<Self, HistoryError> {
        let kind =
            ActionKind::from_key(kind_key).ok_or_else(|| HistoryError::UnknownActionKind(kind_key.to_string()))?;
        let malformed = |source| HistoryError::MalformedPayload {
            kind: kind.key(),
            source,
        };
        let data = match kind {
            ActionKind::AddStrokes => ActionData::AddStrokes(serde_json::from_slice(payload).map_err(malformed)?),
            ActionKind::DeleteStrokes => {
                ActionData::DeleteStrokes(serde_json::from_slice(payload).map_err(malformed)?)
            }
            ActionKind::MoveStrokes => ActionData::MoveStrokes(serde_json::from_slice(payload).map_err(malformed)?),
            ActionKind::InsertPage => ActionData::InsertPage(serde_json::from_slice(payload).map_err(malformed)?),
        };
        Ok(data)
    }
}

/// One entry on the undo or redo stack.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryAction {
    pub id: Uuid,
    pub data: ActionData,
    /// Assigned by [`HistoryManager::add_action`].
    pub sequence_number: u32,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl HistoryAction {
    pub fn new(data: ActionData) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            sequence_number: 0,
            timestamp: now_millis(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.data.kind()
    }

    pub fn add_strokes(strokes: Vec<Stroke>) -> Self {
        Self::new(ActionData::AddStrokes(StrokeActionData::new(strokes)))
    }

    pub fn delete_strokes(strokes: Vec<Stroke>) -> Self {
        Self::new(ActionData::DeleteStrokes(StrokeActionData::new(strokes)))
    }

    pub fn move_strokes(original: Vec<Stroke>, modified: Vec<Stroke>, offset_x: f32, offset_y: f32) -> Self {
        Self::new(ActionData::MoveStrokes(MoveActionData {
            stroke_ids: original.iter().map(|s| s.id).collect(),
            original_strokes: original,
            modified_strokes: modified,
            offset_x,
            offset_y,
        }))
    }

    pub fn insert_page(page_number: usize, affected_stroke_ids: Vec<StrokeId>, page_offset: f32) -> Self {
        Self::new(ActionData::InsertPage(InsertPageActionData {
            page_number,
            affected_stroke_ids,
            page_offset,
        }))
    }
}
