//! File-based storage implementation.
//!
//! Each page gets a directory holding `strokes.json` and `history.json`.

use super::{BoxFuture, HistoryStore, StorageError, StorageResult, StrokeStore, retain_newest};
use crate::history::ActionRecord;
use crate::stroke::{Stroke, StrokeId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const STROKES_FILE: &str = "strokes.json";
const HISTORY_FILE: &str = "history.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StrokesFile {
    #[serde(default)]
    strokes: Vec<Stroke>,
}

/// File-based storage for native platforms.
pub struct FileStorage {
    /// Base directory for page storage.
    base_path: PathBuf,
    /// Serializes read-modify-write cycles on the JSON files.
    io_lock: Mutex<()>,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| StorageError::Io(format!("Failed to create storage directory: {}", e)))?;
        }
        Ok(Self {
            base_path,
            io_lock: Mutex::new(()),
        })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/inkpage/pages/`
    /// On Windows: `%LOCALAPPDATA%\inkpage\pages\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("inkpage").join("pages"))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn page_dir(&self, page_id: &str) -> PathBuf {
        let safe_id: String = page_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(safe_id)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, ()>> {
        self.io_lock
            .lock()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))
    }

    fn read_strokes(&self, page_id: &str) -> StorageResult<Vec<Stroke>> {
        let path = self.page_dir(page_id).join(STROKES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = read_file(&path)?;
        let file: StrokesFile = serde_json::from_str(&json)
            .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(file.strokes)
    }

    fn write_strokes(&self, page_id: &str, strokes: Vec<Stroke>) -> StorageResult<()> {
        let json = serde_json::to_string(&StrokesFile { strokes })
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        write_file(&self.page_dir(page_id), STROKES_FILE, &json)
    }

    /// Load the history log, skipping records that no longer parse.
    fn read_actions(&self, page_id: &str) -> StorageResult<Vec<ActionRecord>> {
        let path = self.page_dir(page_id).join(HISTORY_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = read_file(&path)?;
        let rows: Vec<serde_json::Value> = serde_json::from_str(&json)
            .map_err(|e| StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e)))?;
        Ok(rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping unreadable history row {} of {}: {}", index, page_id, e);
                    None
                }
            })
            .collect())
    }

    fn write_actions(&self, page_id: &str, records: &[ActionRecord]) -> StorageResult<()> {
        let json = serde_json::to_string(records).map_err(|e| StorageError::Serialization(e.to_string()))?;
        write_file(&self.page_dir(page_id), HISTORY_FILE, &json)
    }

    /// Read-modify-write of the history log. A log that no longer parses is
    /// replaced rather than blocking every later write.
    fn update_actions(&self, page_id: &str, f: impl FnOnce(&mut Vec<ActionRecord>)) -> StorageResult<()> {
        let _guard = self.lock()?;
        let mut records = match self.read_actions(page_id) {
            Ok(records) => records,
            Err(StorageError::Serialization(e)) => {
                log::warn!("Discarding unreadable history of {}: {}", page_id, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        f(&mut records);
        self.write_actions(page_id, &records)
    }
}

fn read_file(path: &Path) -> StorageResult<String> {
    fs::read_to_string(path).map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
}

/// Write through a temporary file so a crash never leaves half a file behind.
fn write_file(dir: &Path, name: &str, contents: &str) -> StorageResult<()> {
    fs::create_dir_all(dir).map_err(|e| StorageError::Io(format!("Failed to create {}: {}", dir.display(), e)))?;
    let path = dir.join(name);
    let tmp = dir.join(format!("{}.tmp", name));
    fs::write(&tmp, contents).map_err(|e| StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, &path).map_err(|e| StorageError::Io(format!("Failed to replace {}: {}", path.display(), e)))
}

impl StrokeStore for FileStorage {
    fn load_strokes(&self, page_id: &str) -> BoxFuture<'_, StorageResult<Vec<Stroke>>> {
        let page_id = page_id.to_string();
        Box::pin(async move {
            let _guard = self.lock()?;
            self.read_strokes(&page_id)
        })
    }

    fn save_strokes(&self, page_id: &str, strokes: &[Stroke]) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        let strokes = strokes.to_vec();
        Box::pin(async move {
            let _guard = self.lock()?;
            let mut stored = self.read_strokes(&page_id)?;
            for stroke in strokes {
                match stored.iter_mut().find(|s| s.id == stroke.id) {
                    Some(existing) => *existing = stroke,
                    None => stored.push(stroke),
                }
            }
            self.write_strokes(&page_id, stored)
        })
    }

    fn delete_strokes(&self, page_id: &str, ids: &[StrokeId]) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        let ids = ids.to_vec();
        Box::pin(async move {
            let _guard = self.lock()?;
            let mut stored = self.read_strokes(&page_id)?;
            stored.retain(|s| !ids.contains(&s.id));
            self.write_strokes(&page_id, stored)
        })
    }

    fn list_pages(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            let entries =
                fs::read_dir(&base).map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;
            let mut ids: Vec<String> = entries
                .flatten()
                .filter(|entry| entry.path().join(STROKES_FILE).exists())
                .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }
}

impl HistoryStore for FileStorage {
    fn load_actions(&self, page_id: &str) -> BoxFuture<'_, StorageResult<Vec<ActionRecord>>> {
        let page_id = page_id.to_string();
        Box::pin(async move {
            let _guard = self.lock()?;
            self.read_actions(&page_id)
        })
    }

    fn append_action(&self, record: &ActionRecord) -> BoxFuture<'_, StorageResult<()>> {
        let record = record.clone();
        Box::pin(async move {
            let page_id = record.page_id.clone();
            self.update_actions(&page_id, |records| {
                records.retain(|r| r.id != record.id);
                records.push(record);
            })
        })
    }

    fn remove_action(&self, page_id: &str, id: Uuid) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        Box::pin(async move { self.update_actions(&page_id, |records| records.retain(|r| r.id != id)) })
    }

    fn delete_actions_above(&self, page_id: &str, sequence: u32) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        Box::pin(async move {
            self.update_actions(&page_id, |records| records.retain(|r| r.sequence_number <= sequence))
        })
    }

    fn prune_to_limit(&self, page_id: &str, limit: usize) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        Box::pin(async move { self.update_actions(&page_id, |records| retain_newest(records, limit)) })
    }

    fn clear_history(&self, page_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let page_id = page_id.to_string();
        Box::pin(async move {
            let _guard = self.lock()?;
            self.write_actions(&page_id, &[])
        })
    }
}
