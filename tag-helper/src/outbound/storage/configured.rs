//! Runtime choice between the store adapters.

use async_trait::async_trait;
use camino::Utf8Path;
use tokio::sync::broadcast;

use crate::config::ExtensionSettings;
use crate::domain::ports::{KeyValueStore, KeyValueStoreError, StorageChange, StoredRecord};

use super::{InMemoryKeyValueStore, JsonFileKeyValueStore};

/// The store selected by [`ExtensionSettings::storage_dir`].
pub enum ConfiguredStore {
    /// No storage directory configured.
    Memory(InMemoryKeyValueStore),
    /// Persisted under the configured directory.
    JsonFile(JsonFileKeyValueStore),
}

impl ConfiguredStore {
    /// Build the store the settings ask for.
    ///
    /// # Errors
    ///
    /// [`KeyValueStoreError::Unavailable`] if the directory cannot be opened.
    pub fn from_settings(settings: &ExtensionSettings) -> Result<Self, KeyValueStoreError> {
        match settings.storage_dir.as_deref() {
            Some(path) => {
                let utf8 = Utf8Path::from_path(path).ok_or_else(|| {
                    KeyValueStoreError::unavailable(format!(
                        "storage directory {} is not valid UTF-8",
                        path.display()
                    ))
                })?;
                JsonFileKeyValueStore::open(utf8).map(Self::JsonFile)
            }
            None => Ok(Self::Memory(InMemoryKeyValueStore::default())),
        }
    }

    fn inner(&self) -> &dyn KeyValueStore {
        match self {
            Self::Memory(store) => store,
            Self::JsonFile(store) => store,
        }
    }
}

#[async_trait]
impl KeyValueStore for ConfiguredStore {
    async fn get(&self, keys: &[&str]) -> Result<StoredRecord, KeyValueStoreError> {
        self.inner().get(keys).await
    }

    async fn set(&self, items: StoredRecord) -> Result<(), KeyValueStoreError> {
        self.inner().set(items).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), KeyValueStoreError> {
        self.inner().remove(keys).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner().subscribe()
    }
}
