//! Pluggable preference stores.
//!
//! The engine never talks to disk or network itself; it receives a
//! `PreferenceStore` instance. Two implementations ship here: an
//! in-memory store (tests, embedding) and a JSON-file store under the
//! platform config directory.

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use crate::preferences::ColumnPreferences;

/// Store failure. Callers treat both load and save as best-effort, so
/// this only ever reaches a log line.
#[derive(Debug)]
pub enum StoreError {
    /// File read/write failure.
    Io(String),
    /// Payload did not parse/serialize.
    Serde(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Serde(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Key-value persistence keyed by an opaque (user_id, grid_id) pair.
pub trait PreferenceStore {
    /// `Ok(None)` means "nothing persisted yet" — the caller keeps
    /// seeded defaults.
    fn load(&self, user_id: &str, grid_id: &str)
        -> Result<Option<ColumnPreferences>, StoreError>;

    fn save(
        &self,
        user_id: &str,
        grid_id: &str,
        prefs: &ColumnPreferences,
    ) -> Result<(), StoreError>;
}

/// In-memory store. Single-threaded by design, matching the engine's
/// cooperative model.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<(String, String), ColumnPreferences>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn load(
        &self,
        user_id: &str,
        grid_id: &str,
    ) -> Result<Option<ColumnPreferences>, StoreError> {
        Ok(self
            .entries
            .borrow()
            .get(&(user_id.to_string(), grid_id.to_string()))
            .cloned())
    }

    fn save(
        &self,
        user_id: &str,
        grid_id: &str,
        prefs: &ColumnPreferences,
    ) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert((user_id.to_string(), grid_id.to_string()), prefs.clone());
        Ok(())
    }
}

/// A store that always fails. Exercises the recovery paths in tests.
#[cfg(any(test, feature = "test-support"))]
pub struct FailingStore;

#[cfg(any(test, feature = "test-support"))]
impl PreferenceStore for FailingStore {
    fn load(&self, _: &str, _: &str) -> Result<Option<ColumnPreferences>, StoreError> {
        Err(StoreError::Io("store unavailable".to_string()))
    }

    fn save(&self, _: &str, _: &str, _: &ColumnPreferences) -> Result<(), StoreError> {
        Err(StoreError::Io("store unavailable".to_string()))
    }
}

/// One JSON file per (user_id, grid_id), under the platform config dir.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Default location: `<config_dir>/tabula/preferences`.
    pub fn new() -> Self {
        let root = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabula")
            .join("preferences");
        Self { root }
    }

    /// Explicit root (tests, portable installs).
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Hash the key pair into a filename. IDs are opaque and may contain
    /// path-hostile characters, so never embed them directly.
    fn file_for(&self, user_id: &str, grid_id: &str) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        grid_id.hash(&mut hasher);
        self.root.join(format!("{:016x}.json", hasher.finish()))
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for JsonFileStore {
    fn load(
        &self,
        user_id: &str,
        grid_id: &str,
    ) -> Result<Option<ColumnPreferences>, StoreError> {
        let path = self.file_for(user_id, grid_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| StoreError::Io(e.to_string()))?;
        let prefs =
            serde_json::from_str(&content).map_err(|e| StoreError::Serde(e.to_string()))?;
        Ok(Some(prefs))
    }

    fn save(
        &self,
        user_id: &str,
        grid_id: &str,
        prefs: &ColumnPreferences,
    ) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::Io(e.to_string()))?;
        let json =
            serde_json::to_string_pretty(prefs).map_err(|e| StoreError::Serde(e.to_string()))?;
        fs::write(self.file_for(user_id, grid_id), json)
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::PinSide;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load("u1", "g1").unwrap().is_none());

        let mut prefs = ColumnPreferences::default();
        prefs.column_order = vec!["a".to_string(), "b".to_string()];
        store.save("u1", "g1", &prefs).unwrap();

        let loaded = store.load("u1", "g1").unwrap().unwrap();
        assert_eq!(loaded, prefs);
        // Different grid id is a different entry
        assert!(store.load("u1", "g2").unwrap().is_none());
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::with_root(dir.path().to_path_buf());

        assert!(store.load("u1", "orders").unwrap().is_none());

        let mut prefs = ColumnPreferences::default();
        prefs.column_order = vec!["id".to_string()];
        prefs.pinned_columns.insert("id".to_string(), PinSide::Left);
        store.save("u1", "orders", &prefs).unwrap();

        let loaded = store.load("u1", "orders").unwrap().unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn test_json_file_store_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::with_root(dir.path().to_path_buf());

        let mut a = ColumnPreferences::default();
        a.column_order = vec!["a".to_string()];
        let mut b = ColumnPreferences::default();
        b.column_order = vec!["b".to_string()];

        store.save("u1", "trips", &a).unwrap();
        store.save("u1", "billing", &b).unwrap();

        assert_eq!(store.load("u1", "trips").unwrap().unwrap(), a);
        assert_eq!(store.load("u1", "billing").unwrap().unwrap(), b);
    }

    #[test]
    fn test_failing_store_reports_error() {
        let store = FailingStore;
        assert!(store.load("u1", "g1").is_err());
        assert!(store.save("u1", "g1", &ColumnPreferences::default()).is_err());
    }
}
