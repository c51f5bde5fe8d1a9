//! Shared test doubles for unit and behaviour tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use tokio::sync::broadcast;

use crate::domain::Entity;
use crate::domain::ports::{
    EntityExtractionError, EntitySource, KeyValueStore, KeyValueStoreError, MentionEditor,
    MentionEditorError, StorageChange, StoredRecord,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock frozen at a fixed instant.
pub struct FixtureClock {
    now: DateTime<Utc>,
}

impl FixtureClock {
    /// A clock frozen at `now`.
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Default for FixtureClock {
    fn default() -> Self {
        let now = Utc
            .with_ymd_and_hms(2025, 3, 1, 9, 30, 0)
            .single()
            .unwrap_or_default();
        Self::new(now)
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Store wrapper whose reads or writes can be switched to fail.
pub struct FailingKeyValueStore {
    inner: Arc<dyn KeyValueStore>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingKeyValueStore {
    /// Wrap `inner`; nothing fails until asked to.
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make subsequent reads fail or succeed.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes and removals fail or succeed.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FailingKeyValueStore {
    async fn get(&self, keys: &[&str]) -> Result<StoredRecord, KeyValueStoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KeyValueStoreError::read("injected read failure"));
        }
        self.inner.get(keys).await
    }

    async fn set(&self, items: StoredRecord) -> Result<(), KeyValueStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KeyValueStoreError::write("injected write failure"));
        }
        self.inner.set(items).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), KeyValueStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KeyValueStoreError::write("injected write failure"));
        }
        self.inner.remove(keys).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.subscribe()
    }
}

/// Editor that records appended markup.
pub struct RecordingEditor {
    open: AtomicBool,
    appended: Mutex<Vec<String>>,
}

impl Default for RecordingEditor {
    fn default() -> Self {
        Self {
            open: AtomicBool::new(true),
            appended: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingEditor {
    /// Simulate the post editor being open or closed.
    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }

    /// Everything appended so far, in order.
    pub fn appended(&self) -> Vec<String> {
        lock(&self.appended).clone()
    }
}

#[async_trait]
impl MentionEditor for RecordingEditor {
    async fn append_mentions(&self, markup: &str) -> Result<(), MentionEditorError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(MentionEditorError::editor_not_found());
        }
        lock(&self.appended).push(markup.to_owned());
        Ok(())
    }
}

/// Page that shows a fixed entity, or nothing extractable.
#[derive(Default)]
pub struct StubEntitySource {
    entity: Mutex<Option<Entity>>,
}

impl StubEntitySource {
    /// Show `entity` on the page, or clear the page.
    pub fn show(&self, entity: Option<Entity>) {
        *lock(&self.entity) = entity;
    }
}

#[async_trait]
impl EntitySource for StubEntitySource {
    async fn current_entity(&self) -> Result<Entity, EntityExtractionError> {
        lock(&self.entity)
            .clone()
            .ok_or_else(|| EntityExtractionError::missing_field("display name"))
    }
}
