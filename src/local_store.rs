//! Small JSON key-value file used for device-local flags such as the push token.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::warn;

/// Thread-safe string map mirrored to a JSON file. One writer at a time; every mutation rewrites the file.
#[derive(Clone, Default)]
pub struct LocalStore {
    inner: Arc<Mutex<BTreeMap<String, String>>>,
    path: Option<PathBuf>,
}

impl LocalStore {
    /// Opens the store in the platform data directory.
    pub fn open_default() -> Result<Self, String> {
        let dirs = directories::ProjectDirs::from("kr", "hcms", "hcms-portal")
            .ok_or_else(|| "Could not determine data directory".to_string())?;
        Ok(Self::open(dirs.data_dir().join("local-store.json")))
    }

    /// Loads entries from `path`; a missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
                warn!("Discarding unreadable local store {}: {}", path.display(), err);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            inner: Arc::new(Mutex::new(entries)),
            path: Some(path),
        }
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<(), String> {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value.into());
        self.flush(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<(), String> {
        let mut entries = self.entries();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), String> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| format!("Failed to create store directory: {err}"))?;
        }
        let payload = serde_json::to_string_pretty(entries)
            .map_err(|err| format!("Failed to serialize local store: {err}"))?;
        fs::write(path, payload).map_err(|err| format!("Failed to write local store: {err}"))
    }
}
