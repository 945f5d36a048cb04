//! Durable key-value storage backing the secret store.
//!
//! The host application owns this storage in production; behind the trait a
//! test can inject a fake, including one that always fails, to exercise the
//! degraded "rescue disabled" path.

use crate::error::{RescueError, RescueResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Minimal string key-value surface. Implementations must be usable from
/// concurrent requests without interior coordination by callers.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> RescueResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> RescueResult<()>;
}

/// JSON-file-backed store, one flat map per file.
///
/// Values are re-read on every access. That keeps concurrent workers
/// coherent through the filesystem without any in-memory shared state.
pub struct FileKvStore {
    path: PathBuf,
}

impl FileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> RescueResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| RescueError::storage(format!("{}: {e}", self.path.display())))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| RescueError::storage(format!("{}: {e}", self.path.display())))
    }
}

impl KeyValueStore for FileKvStore {
    fn get(&self, key: &str) -> RescueResult<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn put(&self, key: &str, value: &str) -> RescueResult<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RescueError::storage(format!("{}: {e}", parent.display())))?;
        }
        let raw = serde_json::to_string_pretty(&map)
            .map_err(|e| RescueError::storage(e.to_string()))?;
        fs::write(&self.path, raw)
            .map_err(|e| RescueError::storage(format!("{}: {e}", self.path.display())))
    }
}
