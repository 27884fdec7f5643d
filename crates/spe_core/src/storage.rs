//! Durable key/value storage for resume progress.
//!
//! The store is best-effort by contract: any read or write failure is
//! treated as a cache miss and logged, never surfaced. The show must keep
//! running in sandboxed contexts where the file is unreadable or the
//! directory is read-only.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// On-disk document: a versioned string map, room to grow without
/// breaking old files.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    entries: HashMap<String, String>,
}

/// JSON string map persisted to a single file.
pub struct FileStore {
    path: PathBuf,
    map: HashMap<String, String>,
}

impl FileStore {
    /// Load the backing file if it exists and parses; anything else starts
    /// from an empty map.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = match read_map(&path) {
            Ok(map) => map,
            Err(err) => {
                log::warn!(
                    "Progress store '{}' unavailable ({err}); starting empty",
                    path.display()
                );
                HashMap::new()
            }
        };
        Self { path, map }
    }

    fn persist(&self) {
        let document = StoreFile {
            entries: self.map.clone(),
        };
        let body = match serde_json::to_string_pretty(&document) {
            Ok(body) => body,
            Err(err) => {
                log::warn!("Failed to serialize progress store: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, body) {
            log::warn!(
                "Failed to write progress store '{}': {err}",
                self.path.display()
            );
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
        self.persist();
    }
}

fn read_map(path: &Path) -> Result<HashMap<String, String>, String> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let document: StoreFile = serde_json::from_str(&raw)
        .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;
    Ok(document.entries)
}

/// In-memory store for tests and for contexts with no writable disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded store, convenient for resume tests.
    pub fn with(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.set(key, value);
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }
}
