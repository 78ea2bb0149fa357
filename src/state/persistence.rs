use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{PersistenceError, PersistenceResult};
use crate::snapshot::Snapshot;

/// Durable string key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()>;
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Stores every key in one JSON object on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> PersistenceResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        // An unreadable file is replaced rather than blocking every later save.
        let mut entries = self.read_all().unwrap_or_else(|e| {
            log::warn!("Replacing unreadable store {}: {}", self.path.display(), e);
            HashMap::new()
        });
        entries.insert(key.to_owned(), value.to_owned());

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string(&entries)?)?;
        Ok(())
    }
}

/// The browser's `localStorage`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn storage() -> PersistenceResult<web_sys::Storage> {
        web_sys::window()
            .ok_or_else(|| PersistenceError::Unavailable("no window".to_owned()))?
            .local_storage()
            .map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| PersistenceError::Unavailable("localStorage disabled".to_owned()))
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| PersistenceError::Unavailable(format!("{e:?}")))
    }

    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| PersistenceError::WriteRejected(format!("{e:?}")))
    }
}

/// Single-slot snapshot persistence over a key-value store.
///
/// Holds no state besides the store handle and the fixed key; each save
/// overwrites the previous one.
pub struct PersistenceBridge {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl PersistenceBridge {
    pub fn new(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(&mut self, snapshot: &Snapshot) -> PersistenceResult<()> {
        self.store.set(&self.key, &snapshot.to_data_url())
    }

    pub fn load(&self) -> PersistenceResult<Option<Snapshot>> {
        let Some(payload) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        Snapshot::from_data_url(&payload)
            .map(Some)
            .map_err(|e| PersistenceError::InvalidPayload(e.to_string()))
    }
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceBridge")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn snapshot() -> Snapshot {
        Snapshot::encode(&RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]))).unwrap()
    }

    #[test]
    fn test_save_overwrites_single_slot() {
        let store = MemoryStore::new();
        let mut bridge = PersistenceBridge::new(Box::new(store.clone()), "slot");
        assert!(bridge.load().unwrap().is_none());

        bridge.save(&snapshot()).unwrap();
        let second = Snapshot::encode(&RgbaImage::from_pixel(5, 5, Rgba([9, 9, 9, 255]))).unwrap();
        bridge.save(&second).unwrap();

        assert_eq!(store.len(), 1);
        assert!(bridge.load().unwrap().unwrap().same_image(&second));
    }

    #[test]
    fn test_corrupt_payload_is_reported() {
        let mut store = MemoryStore::new();
        store.set("slot", "not an image").unwrap();
        let bridge = PersistenceBridge::new(Box::new(store), "slot");
        assert!(matches!(bridge.load(), Err(PersistenceError::InvalidPayload(_))));
    }

    #[test]
    fn test_json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut bridge = PersistenceBridge::new(Box::new(JsonFileStore::new(&path)), "slot");
        let saved = snapshot();
        bridge.save(&saved).unwrap();

        let reopened = PersistenceBridge::new(Box::new(JsonFileStore::new(&path)), "slot");
        assert!(reopened.load().unwrap().unwrap().same_image(&saved));
    }

    #[test]
    fn test_json_file_store_replaces_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(store.get("slot").is_err());
        store.set("slot", "value").unwrap();
        assert_eq!(store.get("slot").unwrap().as_deref(), Some("value"));
    }
}
