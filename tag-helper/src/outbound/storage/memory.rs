//! Process-local key-value store.

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};

use crate::domain::ports::{KeyValueStore, KeyValueStoreError, StorageChange, StoredRecord};

use super::{change_channel, notify};

/// Key-value store held in memory.
///
/// Every [`crate::ExtensionContext`] built over the same `Arc` shares the
/// data and receives the change events, which is how tests model the popup
/// and page contexts of one browser profile.
pub struct InMemoryKeyValueStore {
    entries: RwLock<StoredRecord>,
    changes: broadcast::Sender<StorageChange>,
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::with_record(StoredRecord::new())
    }
}

impl InMemoryKeyValueStore {
    /// A store pre-populated with `record`.
    pub fn with_record(record: StoredRecord) -> Self {
        Self {
            entries: RwLock::new(record),
            changes: change_channel(),
        }
    }

    /// Copy of everything stored.
    pub async fn snapshot(&self) -> StoredRecord {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, keys: &[&str]) -> Result<StoredRecord, KeyValueStoreError> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|&key| {
                entries
                    .get(key)
                    .map(|value| (key.to_owned(), value.clone()))
            })
            .collect())
    }

    async fn set(&self, items: StoredRecord) -> Result<(), KeyValueStoreError> {
        let changed: Vec<String> = items.keys().cloned().collect();
        self.entries.write().await.extend(items);
        notify(&self.changes, changed);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), KeyValueStoreError> {
        let mut entries = self.entries.write().await;
        let removed: Vec<String> = keys
            .iter()
            .filter(|&&key| entries.remove(key).is_some())
            .map(|&key| key.to_owned())
            .collect();
        drop(entries);
        notify(&self.changes, removed);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
