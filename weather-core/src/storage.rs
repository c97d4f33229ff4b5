//! Small persistent key-value capability for the credential and subscriber list.

use directories::ProjectDirs;
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::error::StorageError;

/// Key under which the provider API key is stored.
pub const API_KEY_STORAGE_KEY: &str = "weather_api_key";

/// Key under which the JSON array of subscribed email addresses is stored.
pub const SUBSCRIBERS_STORAGE_KEY: &str = "subscribedEmails";

pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Treat the value under `key` as a JSON string array and add `item` unless present.
    ///
    /// Returns `true` when the item was inserted.
    ///
    /// The default reads then writes; stores shared between threads override it
    /// so the whole update happens under one lock.
    fn append(&self, key: &str, item: &str) -> Result<bool, StorageError> {
        match push_unique(self.get(key)?.as_deref(), item)? {
            Some(updated) => {
                self.set(key, &updated)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// New serialized list with `item` appended, or `None` when it is already present.
fn push_unique(raw: Option<&str>, item: &str) -> Result<Option<String>, StorageError> {
    let mut items: Vec<String> = match raw {
        Some(raw) => serde_json::from_str(raw)?,
        None => Vec::new(),
    };
    if items.iter().any(|existing| existing == item) {
        return Ok(None);
    }

    items.push(item.to_string());
    Ok(Some(serde_json::to_string(&items)?))
}

/// Read a JSON string array stored under `key`; absent means empty.
pub fn read_list<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<Vec<String>, StorageError> {
    match store.get(key)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// JSON object on disk, re-read on every call.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Held across each load/save pair, including the whole of `append`.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Store in the platform data directory.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn default_path() -> Result<PathBuf, StorageError> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli").ok_or_else(|| {
            StorageError::Unavailable("could not determine platform data directory".into())
        })?;

        Ok(dirs.data_dir().join("store.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Readers never see a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "store written");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn append(&self, key: &str, item: &str) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = self.load()?;
        let Some(updated) = push_unique(entries.get(key).map(String::as_str), item)? else {
            return Ok(false);
        };

        entries.insert(key.to_string(), updated);
        self.save(&entries)?;
        Ok(true)
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn append(&self, key: &str, item: &str) -> Result<bool, StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(updated) = push_unique(entries.get(key).map(String::as_str), item)? else {
            return Ok(false);
        };

        entries.insert(key.to_string(), updated);
        Ok(true)
    }
}
