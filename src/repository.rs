//! Record repository: an ordered, newest-first collection of contact records.
//!
//! # Semantics
//!
//! - [`RecordStore::list_all`] never fails. A missing, unreadable, or corrupt
//!   backing document reads as an empty store (logged, not surfaced). Inside
//!   a well-formed array, an entry that is not a record is skipped on its
//!   own; the others still load.
//! - [`RecordStore::upsert`] replaces a record with the same id in place, or
//!   inserts a new one at the front.
//! - [`RecordStore::delete`] of an unknown id is a no-op.
//! - Write failures propagate as [`StorageError`]; losing a record silently
//!   is worse than reporting it.
//!
//! # Storage
//!
//! [`JsonFileStore`] keeps the whole sequence as one JSON array document.
//! Every mutation is a load → modify → save under a mutex, and the save goes
//! through a sibling temp file plus rename, so a reader in the same process
//! sees either the old document or the new one.

use crate::record::ContactRecord;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage for contact records.
pub trait RecordStore: Send + Sync {
    /// All records, most recently created first.
    fn list_all(&self) -> Vec<ContactRecord>;

    /// Insert-or-replace keyed by `record.id`.
    fn upsert(&self, record: ContactRecord) -> Result<(), StorageError>;

    fn delete(&self, id: &str) -> Result<(), StorageError>;

    fn delete_all(&self) -> Result<(), StorageError>;

    fn get(&self, id: &str) -> Option<ContactRecord> {
        self.list_all().into_iter().find(|r| r.id == id)
    }
}

/// Apply an upsert to an in-memory sequence.
pub fn upsert_into(records: &mut Vec<ContactRecord>, record: ContactRecord) {
    match records.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record,
        None => records.insert(0, record),
    }
}

/// Remove by id. Returns whether anything was removed.
pub fn delete_from(records: &mut Vec<ContactRecord>, id: &str) -> bool {
    let before = records.len();
    records.retain(|r| r.id != id);
    records.len() != before
}

// =============================================================================
// File-backed store
// =============================================================================

/// Records persisted as a single JSON array document.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Vec<ContactRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "record store unreadable, treating as empty");
                return Vec::new();
            }
        };
        let entries: Vec<serde_json::Value> = match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "record store corrupt, treating as empty");
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %self.path.display(), index, error = %e, "skipping unreadable record");
                    None
                }
            })
            .collect()
    }

    fn save(&self, records: &[ContactRecord]) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!(path = %self.path.display(), count = records.len(), "record store saved");
        Ok(())
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        // The guarded value is (), so a poisoned lock carries no broken state.
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordStore for JsonFileStore {
    fn list_all(&self) -> Vec<ContactRecord> {
        let _guard = self.guard();
        self.load()
    }

    fn upsert(&self, record: ContactRecord) -> Result<(), StorageError> {
        let _guard = self.guard();
        let mut records = self.load();
        upsert_into(&mut records, record);
        self.save(&records)
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        let _guard = self.guard();
        let mut records = self.load();
        if delete_from(&mut records, id) {
            self.save(&records)?;
        }
        Ok(())
    }

    fn delete_all(&self) -> Result<(), StorageError> {
        let _guard = self.guard();
        self.save(&[])
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Process-local store with the same semantics as [`JsonFileStore`].
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ContactRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, Vec<ContactRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RecordStore for MemoryStore {
    fn list_all(&self) -> Vec<ContactRecord> {
        self.records().clone()
    }

    fn upsert(&self, record: ContactRecord) -> Result<(), StorageError> {
        upsert_into(&mut self.records(), record);
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StorageError> {
        delete_from(&mut self.records(), id);
        Ok(())
    }

    fn delete_all(&self) -> Result<(), StorageError> {
        self.records().clear();
        Ok(())
    }
}
