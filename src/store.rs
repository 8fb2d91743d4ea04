//! Persistence - city list in a durable key-value store

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::city::City;

/// Storage key holding the JSON-encoded city list
pub const CITIES_KEY: &str = "weather.cities";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data is corrupted: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// String-valued key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// All keys in one JSON object file. Writes keep unrelated keys.
///
/// A write runs to completion on the blocking pool even if the caller is
/// dropped, and replaces the file with a rename, so readers never see a
/// partial file and writes land in the order they took the lock.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }
}

fn parse_entries(json: &str) -> Result<BTreeMap<String, String>, StoreError> {
    if json.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(json)?)
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(json) => parse_entries(&json),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_entry(path: &Path, key: String, value: String) -> Result<(), StoreError> {
    let mut entries = match read_entries(path) {
        Ok(entries) => entries,
        Err(StoreError::Corrupt(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "overwriting unreadable storage file");
            BTreeMap::new()
        }
        Err(e) => return Err(e),
    };
    entries.insert(key, value);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(&entries)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => Ok(parse_entries(&json)?.remove(key)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // The guard moves into the blocking task and is released when the write ends
        let guard = Arc::clone(&self.lock).lock_owned().await;
        let path = self.path.clone();
        let (key, value) = (key.to_string(), value.to_string());
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            write_entry(&path, key, value)
        })
        .await
        .map_err(std::io::Error::other)?
    }
}

/// In-process storage, lost on exit
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn encode_cities(cities: &[City]) -> Result<String, StoreError> {
    Ok(serde_json::to_string(cities)?)
}

pub fn decode_cities(json: &str) -> Result<Vec<City>, StoreError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and writes the city list under [`CITIES_KEY`]
#[derive(Clone)]
pub struct CityStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CityStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// `None` when nothing has been stored yet
    pub async fn load(&self) -> Result<Option<Vec<City>>, StoreError> {
        match self.backend.get(CITIES_KEY).await? {
            Some(json) => Ok(Some(decode_cities(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn save(&self, cities: &[City]) -> Result<(), StoreError> {
        let json = encode_cities(cities)?;
        self.backend.set(CITIES_KEY, &json).await?;
        tracing::debug!(count = cities.len(), "saved cities");
        Ok(())
    }
}
