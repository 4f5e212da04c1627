//! Persisted form of a history action.

use super::{ActionData, HistoryAction, HistoryError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the persisted history log.
///
/// `payload` holds the JSON encoding of the action's fields and is written
/// as base64 in text formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: Uuid,
    pub page_id: String,
    pub action_kind: String,
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    pub sequence_number: u32,
    #[serde(default)]
    pub created_at: i64,
}

impl ActionRecord {
    pub fn from_action(page_id: &str, action: &HistoryAction) -> Result<Self, HistoryError> {
        Ok(Self {
            id: action.id,
            page_id: page_id.to_string(),
            action_kind: action.kind().key().to_string(),
            payload: action.data.encode()?,
            sequence_number: action.sequence_number,
            created_at: action.timestamp,
        })
    }

    pub fn to_action(&self) -> Result<HistoryAction, HistoryError> {
        Ok(HistoryAction {
            id: self.id,
            data: ActionData::decode(&self.action_kind, &self.payload)?,
            sequence_number: self.sequence_number,
            timestamp: self.created_at,
        })
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}
