//! Key-value store adapters.

mod atomic_io;
mod configured;
mod json_file;
mod memory;

pub use configured::ConfiguredStore;
pub use json_file::{JsonFileKeyValueStore, STORAGE_FILE_NAME};
pub use memory::InMemoryKeyValueStore;

use tokio::sync::broadcast;

use crate::domain::ports::StorageChange;

/// Buffered change events per subscriber before the slowest one lags.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

pub(crate) fn change_channel() -> broadcast::Sender<StorageChange> {
    broadcast::channel(CHANGE_CHANNEL_CAPACITY).0
}

/// Publish a change. Having no subscribers is not an error.
pub(crate) fn notify(sender: &broadcast::Sender<StorageChange>, keys: Vec<String>) {
    if keys.is_empty() {
        return;
    }
    if sender.send(StorageChange { changed_keys: keys }).is_err() {
        tracing::trace!("storage change had no subscribers");
    }
}
