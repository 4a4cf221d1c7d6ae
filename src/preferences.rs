//! The auto-save preference.
//!
//! The orchestrator only ever asks one question ("save straight away, or
//! hand the record to review?") through [`PreferenceSource`]. The source is
//! injected, so tests pass a plain `bool` or an `AtomicBool` and the CLI
//! passes a [`PreferenceStore`] backed by a small JSON document:
//!
//! ```json
//! { "autoSave": true }
//! ```

use crate::repository::StorageError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

pub trait PreferenceSource: Send + Sync {
    /// Persist successful extractions without a review step.
    fn auto_save(&self) -> bool;
}

impl PreferenceSource for bool {
    fn auto_save(&self) -> bool {
        *self
    }
}

impl PreferenceSource for AtomicBool {
    fn auto_save(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Preferences {
    auto_save: bool,
}

/// File-backed preference document.
pub struct PreferenceStore {
    path: PathBuf,
    data: RwLock<Preferences>,
}

impl PreferenceStore {
    /// Open the document at `path`. Missing or unreadable documents start
    /// from defaults (auto-save off).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "preferences corrupt, using defaults");
                Preferences::default()
            }),
            Err(_) => Preferences::default(),
        };
        Self {
            path,
            data: RwLock::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_auto_save(&self, enabled: bool) -> Result<(), StorageError> {
        let mut guard = self.data.write().unwrap_or_else(|e| e.into_inner());
        let updated = Preferences { auto_save: enabled };
        self.persist(&updated)?;
        *guard = updated;
        Ok(())
    }

    fn persist(&self, data: &Preferences) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, serialized).map_err(io_err)
    }
}

impl PreferenceSource for PreferenceStore {
    fn auto_save(&self) -> bool {
        self.data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .auto_save
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn bool_and_atomic_sources() {
        assert!(true.auto_save());
        assert!(!false.auto_save());

        let flag = AtomicBool::new(false);
        assert!(!flag.auto_save());
        flag.store(true, Ordering::SeqCst);
        assert!(flag.auto_save());
    }

    #[test]
    fn missing_document_defaults_to_review() {
        let tmp = TempDir::new().unwrap();
        let store = PreferenceStore::open(tmp.path().join("prefs.json"));
        assert!(!store.auto_save());
    }

    #[test]
    fn corrupt_document_defaults_to_review() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");
        fs::write(&path, "{{{").unwrap();
        assert!(!PreferenceStore::open(&path).auto_save());
    }

    #[test]
    fn set_auto_save_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");

        let store = PreferenceStore::open(&path);
        store.set_auto_save(true).unwrap();
        assert!(store.auto_save());

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"autoSave\": true"));
        assert!(PreferenceStore::open(&path).auto_save());
    }

    #[test]
    fn set_auto_save_write_failure_keeps_old_value() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let store = PreferenceStore::open(blocker.join("prefs.json"));
        assert!(store.set_auto_save(true).is_err());
        assert!(!store.auto_save());
    }
}
