//! Port for the browser's local key-value storage area.
//!
//! The store holds JSON values under string keys, offers no transactions,
//! and emits a [`StorageChange`] to every subscriber after each write,
//! including writes made by the subscriber's own context.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::define_port_error;

/// A set of keys and their JSON values, as read from or written to the store.
pub type StoredRecord = Map<String, Value>;

define_port_error! {
    /// Errors raised by key-value store adapters.
    pub enum KeyValueStoreError {
        /// The storage area could not be reached.
        Unavailable { message: String } => "key-value store unavailable: {message}",
            notice: "Could not save changes. Please try again.",
        /// Reading keys failed.
        Read { message: String } => "key-value store read failed: {message}",
            notice: "Could not save changes. Please try again.",
        /// Writing or removing keys failed.
        Write { message: String } => "key-value store write failed: {message}",
            notice: "Could not save changes. Please try again.",
    }
}

/// Notification that one or more keys changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Keys written or removed by the change.
    pub changed_keys: Vec<String>,
}

impl StorageChange {
    /// Build a change event for the given keys.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            changed_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `key` is among the changed keys.
    pub fn touches(&self, key: &str) -> bool {
        self.changed_keys.iter().any(|changed| changed == key)
    }
}

/// Local key-value storage shared by every execution context.
///
/// Every call suspends until the underlying I/O completes. There is no
/// read-modify-write atomicity: callers read, modify in memory, and write
/// whole values back, so concurrent writers from different contexts race and
/// the last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the given keys. Absent keys are simply missing from the result.
    async fn get(&self, keys: &[&str]) -> Result<StoredRecord, KeyValueStoreError>;

    /// Write every entry of `items` as one call, then notify subscribers.
    async fn set(&self, items: StoredRecord) -> Result<(), KeyValueStoreError>;

    /// Delete the given keys, then notify subscribers.
    async fn remove(&self, keys: &[&str]) -> Result<(), KeyValueStoreError>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}
