//! Key-value store persisted as one JSON object on disk.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use serde_json::Value;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError, StorageChange, StoredRecord};

use super::atomic_io::replace_file;
use super::{change_channel, notify};

/// File holding the record inside the storage directory.
pub const STORAGE_FILE_NAME: &str = "storage.json";

/// Key-value store backed by `storage.json` in a directory.
///
/// Writes within one process are serialised and each replaces the file
/// atomically. Change events reach subscribers of this instance only.
pub struct JsonFileKeyValueStore {
    dir: Arc<Dir>,
    file: Utf8PathBuf,
    write_lock: Mutex<()>,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonFileKeyValueStore {
    /// Open (creating if needed) the storage directory at `path`.
    ///
    /// # Errors
    ///
    /// [`KeyValueStoreError::Unavailable`] if the directory cannot be
    /// created or opened.
    pub fn open(path: &Utf8Path) -> Result<Self, KeyValueStoreError> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .map_err(|err| KeyValueStoreError::unavailable(format!("{path}: {err}")))?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(|err| KeyValueStoreError::unavailable(format!("{path}: {err}")))?;
        debug!(%path, "opened JSON file store");
        Ok(Self::from_dir(dir))
    }

    /// Use an already opened directory capability.
    pub fn from_dir(dir: Dir) -> Self {
        Self {
            dir: Arc::new(dir),
            file: Utf8PathBuf::from(STORAGE_FILE_NAME),
            write_lock: Mutex::new(()),
            changes: change_channel(),
        }
    }

    async fn read_all(&self) -> Result<StoredRecord, KeyValueStoreError> {
        let dir = Arc::clone(&self.dir);
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || read_record(&dir, &file))
            .await
            .map_err(|err| KeyValueStoreError::unavailable(err.to_string()))?
    }

    async fn write_all(&self, record: StoredRecord) -> Result<(), KeyValueStoreError> {
        let contents = serde_json::to_string_pretty(&Value::Object(record))
            .map_err(|err| KeyValueStoreError::write(err.to_string()))?;
        let dir = Arc::clone(&self.dir);
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || replace_file(&dir, &file, &contents))
            .await
            .map_err(|err| KeyValueStoreError::unavailable(err.to_string()))?
    }
}

fn read_record(dir: &Dir, file: &Utf8Path) -> Result<StoredRecord, KeyValueStoreError> {
    let text = match dir.read_to_string(file) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(StoredRecord::new()),
        Err(err) => return Err(KeyValueStoreError::read(format!("{file}: {err}"))),
    };
    match serde_json::from_str(&text) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(KeyValueStoreError::read(format!(
            "{file}: top-level value is not an object"
        ))),
        Err(err) => Err(KeyValueStoreError::read(format!("{file}: {err}"))),
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKeyValueStore {
    async fn get(&self, keys: &[&str]) -> Result<StoredRecord, KeyValueStoreError> {
        let mut record = self.read_all().await?;
        Ok(keys
            .iter()
            .filter_map(|&key| record.remove(key).map(|value| (key.to_owned(), value)))
            .collect())
    }

    async fn set(&self, items: StoredRecord) -> Result<(), KeyValueStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_all().await?;
        let changed: Vec<String> = items.keys().cloned().collect();
        record.extend(items);
        self.write_all(record).await?;
        notify(&self.changes, changed);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), KeyValueStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut record = self.read_all().await?;
        let removed: Vec<String> = keys
            .iter()
            .filter(|&&key| record.remove(key).is_some())
            .map(|&key| key.to_owned())
            .collect();
        if removed.is_empty() {
            return Ok(());
        }
        self.write_all(record).await?;
        notify(&self.changes, removed);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
