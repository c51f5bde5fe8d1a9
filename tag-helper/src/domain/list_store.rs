//! Cached accessor over the persisted record.
//!
//! Each execution context owns one [`ListStore`]. It migrates the record the
//! first time it is loaded, keeps the last loaded [`StorageRoot`] in memory,
//! and drops that copy whenever it writes or hears that another context
//! wrote.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mockable::Clock;
use tracing::{debug, info, warn};

use super::error::TagListError;
use super::migration::{MIGRATION_KEYS, MigrationPlan, plan_migration};
use super::ports::{KeyValueStore, StorageChange, StoredRecord};
use super::storage_root::{StorageRoot, keys};

/// Read-through cache of the persisted [`StorageRoot`].
///
/// ## Invariants
/// - The record is migrated at most once per `ListStore`, and only counts as
///   migrated after the migration write succeeded.
/// - Loads are serialised, so no caller observes a half-migrated record.
/// - A load that overlaps [`ListStore::invalidate`] returns its result but
///   does not cache it.
pub struct ListStore<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    cache: Mutex<Option<StorageRoot>>,
    generation: AtomicU64,
    migrated: AtomicBool,
    load_gate: tokio::sync::Mutex<()>,
}

impl<S> ListStore<S> {
    /// Create an accessor with an empty cache.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cache: Mutex::new(None),
            generation: AtomicU64::new(0),
            migrated: AtomicBool::new(false),
            load_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Synchronous peek at the cache.
    pub fn cached(&self) -> Option<StorageRoot> {
        self.lock_cache().clone()
    }

    /// Drop the cached root. The next [`ListStore::get`] reloads.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if self.lock_cache().take().is_some() {
            debug!("list cache invalidated");
        }
    }

    /// React to a change notification from the store.
    ///
    /// Returns whether the cache was invalidated.
    pub fn apply_change(&self, change: &StorageChange) -> bool {
        let relevant = keys::CURRENT
            .iter()
            .chain([&keys::LEGACY_USERS])
            .any(|key| change.touches(key));
        if relevant {
            debug!(keys = ?change.changed_keys, "storage changed");
            self.invalidate();
        }
        relevant
    }

    /// Whether this accessor has completed the legacy migration.
    pub fn is_migrated(&self) -> bool {
        self.migrated.load(Ordering::Acquire)
    }

    fn lock_cache(&self) -> MutexGuard<'_, Option<StorageRoot>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: KeyValueStore> ListStore<S> {
    /// Migrate if needed, read the full record, and cache it.
    ///
    /// # Errors
    ///
    /// Store failures and malformed records surface as [`TagListError`];
    /// nothing is cached in that case.
    pub async fn load(&self) -> Result<StorageRoot, TagListError> {
        let _gate = self.load_gate.lock().await;
        let generation = self.generation.load(Ordering::Acquire);

        self.ensure_migrated().await?;
        let record = self.store.get(&keys::CURRENT).await?;
        let root = StorageRoot::from_record(&record, self.clock.utc())?;

        if self.generation.load(Ordering::Acquire) == generation {
            *self.lock_cache() = Some(root.clone());
            debug!(lists = root.lists.len(), "list cache populated");
        } else {
            debug!("load overlapped an invalidation; result not cached");
        }
        Ok(root)
    }

    /// The cached root, loading it first if necessary.
    ///
    /// # Errors
    ///
    /// As for [`ListStore::load`].
    pub async fn get(&self) -> Result<StorageRoot, TagListError> {
        if let Some(root) = self.cached() {
            return Ok(root);
        }
        self.load().await
    }

    /// Write the named keys of `root` in one store call.
    ///
    /// The cache is invalidated whether or not the write succeeds.
    ///
    /// # Errors
    ///
    /// [`TagListError::Store`] when the write fails.
    pub async fn persist(&self, root: &StorageRoot, fields: &[&str]) -> Result<(), TagListError> {
        let items = root.to_record(fields)?;
        self.write(items).await
    }

    async fn write(&self, items: StoredRecord) -> Result<(), TagListError> {
        let result = self.store.set(items).await;
        self.invalidate();
        result.map_err(TagListError::from)
    }

    async fn ensure_migrated(&self) -> Result<(), TagListError> {
        if self.is_migrated() {
            return Ok(());
        }

        let record = self.store.get(&MIGRATION_KEYS).await?;
        let plan = plan_migration(&record, self.clock.utc())?;

        if let Some(writes) = plan.writes() {
            self.store.set(writes.clone()).await?;
        }
        match &plan {
            MigrationPlan::Current { .. } => {}
            MigrationPlan::Seed { .. } => info!("seeded empty default list"),
            MigrationPlan::UpgradeLegacy {
                migrated,
                skipped,
                duplicates,
                ..
            } => info!(
                migrated,
                skipped,
                duplicates,
                "migrated legacy users into the default list"
            ),
        }

        if plan.removes_legacy_users() {
            // `lists` is already written, so a leftover `users` key is
            // cleaned up by the next context that loads.
            if let Err(err) = self.store.remove(&[keys::LEGACY_USERS]).await {
                warn!(error = %err, "failed to remove legacy users key");
            }
        }

        self.migrated.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::storage::InMemoryKeyValueStore;
    use crate::test_support::{FailingKeyValueStore, FixtureClock};
    use rstest::{fixture, rstest};
    use serde_json::json;

    type MemoryLists = ListStore<InMemoryKeyValueStore>;

    fn record(value: serde_json::Value) -> StoredRecord {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[fixture]
    fn memory() -> Arc<InMemoryKeyValueStore> {
        Arc::new(InMemoryKeyValueStore::default())
    }

    fn accessor(store: &Arc<InMemoryKeyValueStore>) -> MemoryLists {
        ListStore::new(Arc::clone(store), Arc::new(FixtureClock::default()))
    }

    #[rstest]
    #[tokio::test]
    async fn first_load_seeds_an_empty_store(memory: Arc<InMemoryKeyValueStore>) {
        let lists = accessor(&memory);

        let root = lists.load().await.expect("load");

        assert_eq!(root.lists.len(), 1);
        assert!(root.selected_list_id.is_default());
        assert!(lists.is_migrated());
        let stored = memory.snapshot().await;
        assert!(stored.contains_key(keys::LISTS));
    }

    #[rstest]
    #[tokio::test]
    async fn legacy_users_are_removed_after_upgrade(memory: Arc<InMemoryKeyValueStore>) {
        memory
            .set(record(json!({
                "users": [{"entityUrn": "u1", "memberId": "1", "displayName": "Ada Byron"}]
            })))
            .await
            .expect("seed legacy");
        let lists = accessor(&memory);

        let root = lists.load().await.expect("load");

        assert_eq!(root.selected_list().map(|list| list.len()), Some(1));
        assert!(!memory.snapshot().await.contains_key(keys::LEGACY_USERS));
    }

    #[rstest]
    #[tokio::test]
    async fn get_serves_from_cache_until_invalidated(memory: Arc<InMemoryKeyValueStore>) {
        let lists = accessor(&memory);
        lists.load().await.expect("load");
        assert!(lists.cached().is_some());

        lists.invalidate();
        assert!(lists.cached().is_none());

        lists.get().await.expect("reload");
        assert!(lists.cached().is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn persist_invalidates_cache(memory: Arc<InMemoryKeyValueStore>) {
        let lists = accessor(&memory);
        let mut root = lists.load().await.expect("load");
        root.settings.name_word_limit = 2;

        lists
            .persist(&root, &[keys::SETTINGS])
            .await
            .expect("persist");

        assert!(lists.cached().is_none());
        let reloaded = lists.get().await.expect("reload");
        assert_eq!(reloaded.settings.name_word_limit, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_migration_write_is_retried(memory: Arc<InMemoryKeyValueStore>) {
        let failing = Arc::new(FailingKeyValueStore::new(memory.clone()));
        failing.fail_writes(true);
        let lists = ListStore::new(Arc::clone(&failing), Arc::new(FixtureClock::default()));

        let error = lists.load().await.expect_err("write fails");
        assert!(matches!(error, TagListError::Store(_)));
        assert!(!lists.is_migrated());
        assert!(lists.cached().is_none());

        failing.fail_writes(false);
        let root = lists.load().await.expect("retry succeeds");
        assert!(lists.is_migrated());
        assert_eq!(root.lists.len(), 1);
    }

    #[rstest]
    #[case(&["lists"], true)]
    #[case(&["selectedListId", "lists"], true)]
    #[case(&["settings"], true)]
    #[case(&["unrelated"], false)]
    #[tokio::test]
    async fn change_notifications_invalidate_relevant_keys(
        memory: Arc<InMemoryKeyValueStore>,
        #[case] changed: &[&str],
        #[case] expected: bool,
    ) {
        let lists = accessor(&memory);
        lists.load().await.expect("load");

        let invalidated = lists.apply_change(&StorageChange::new(changed.iter().copied()));

        assert_eq!(invalidated, expected);
        assert_eq!(lists.cached().is_none(), expected);
    }
}
