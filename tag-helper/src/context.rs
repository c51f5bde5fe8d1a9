//! Composition of one execution context.
//!
//! The popup and every page context each build an [`ExtensionContext`] over
//! the shared store. The context owns its list cache and a listener task
//! that drops the cache whenever the store reports a relevant change,
//! whichever context made it.

use std::sync::{Arc, Weak};
use std::time::Duration;

use mockable::{Clock, DefaultClock};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::ExtensionSettings;
use crate::domain::ports::{
    EntitySource, KeyValueStore, KeyValueStoreError, MentionEditor, PageMessenger, StorageChange,
};
use crate::domain::{ListStore, TagListService};
use crate::inbound::page::PageController;
use crate::inbound::popup::PopupController;
use crate::outbound::storage::ConfiguredStore;

/// Store handle, list cache, and services of one execution context.
///
/// Must be created inside a tokio runtime. Dropping the context stops its
/// change listener.
pub struct ExtensionContext<S> {
    store: Arc<S>,
    service: TagListService<S>,
    notice_ttl: Duration,
    listener: JoinHandle<()>,
}

impl<S: KeyValueStore + 'static> ExtensionContext<S> {
    /// Build a context over `store`.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, notice_ttl: Duration) -> Self {
        let changes = store.subscribe();
        let lists = Arc::new(ListStore::new(Arc::clone(&store), Arc::clone(&clock)));
        let listener = spawn_invalidation(Arc::downgrade(&lists), changes);
        Self {
            store,
            service: TagListService::new(lists, clock),
            notice_ttl,
            listener,
        }
    }

    /// The shared store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// This context's list cache.
    pub fn lists(&self) -> &Arc<ListStore<S>> {
        self.service.list_store()
    }

    /// List mutations.
    pub fn service(&self) -> &TagListService<S> {
        &self.service
    }

    /// How long notices from this context stay visible.
    pub const fn notice_ttl(&self) -> Duration {
        self.notice_ttl
    }

    /// Popup controller talking to pages through `messenger`.
    pub fn popup(&self, messenger: Arc<dyn PageMessenger>) -> PopupController<S> {
        PopupController::new(self.service.clone(), messenger, self.notice_ttl)
    }

    /// Page controller for a page with the given editor and entity source.
    pub fn page(
        &self,
        editor: Arc<dyn MentionEditor>,
        source: Arc<dyn EntitySource>,
    ) -> PageController<S> {
        PageController::new(self.service.clone(), editor, source, self.notice_ttl)
    }
}

impl ExtensionContext<ConfiguredStore> {
    /// Build a context over the store `settings` select, with the system
    /// clock.
    ///
    /// # Errors
    ///
    /// [`KeyValueStoreError::Unavailable`] if the storage directory cannot
    /// be opened.
    pub fn from_settings(settings: &ExtensionSettings) -> Result<Self, KeyValueStoreError> {
        let store = Arc::new(ConfiguredStore::from_settings(settings)?);
        Ok(Self::new(store, Arc::new(DefaultClock), settings.notice_ttl()))
    }
}

impl<S> Drop for ExtensionContext<S> {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn spawn_invalidation<S>(
    lists: Weak<ListStore<S>>,
    mut changes: broadcast::Receiver<StorageChange>,
) -> JoinHandle<()>
where
    S: Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            let received = changes.recv().await;
            let Some(lists) = lists.upgrade() else {
                break;
            };
            match received {
                Ok(change) => {
                    lists.apply_change(&change);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "missed storage changes; dropping cache");
                    lists.invalidate();
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("storage change listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entity, LinkedInUser, ListId};
    use crate::outbound::storage::InMemoryKeyValueStore;
    use crate::test_support::FixtureClock;
    use rstest::rstest;

    async fn eventually(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("condition reached in time");
    }

    fn context(store: &Arc<InMemoryKeyValueStore>) -> ExtensionContext<InMemoryKeyValueStore> {
        ExtensionContext::new(
            Arc::clone(store),
            Arc::new(FixtureClock::default()),
            Duration::from_secs(3),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn writes_in_one_context_invalidate_the_other() {
        let store = Arc::new(InMemoryKeyValueStore::default());
        let popup = context(&store);
        let page = context(&store);
        page.lists().load().await.expect("page load");
        // Let both listeners see the seeding write before caching again.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        page.lists().load().await.expect("page reload");
        assert!(page.lists().cached().is_some());

        popup
            .service()
            .add_entity(
                &ListId::default_list(),
                Entity::User(LinkedInUser {
                    entity_urn: "urn:li:fsd_profile:ada".into(),
                    member_id: "1".into(),
                    display_name: "Ada".into(),
                }),
            )
            .await
            .expect("add");

        eventually(|| page.lists().cached().is_none()).await;
        let root = page.lists().get().await.expect("reload");
        assert_eq!(root.selected_list().map(|list| list.len()), Some(1));
    }

    #[rstest]
    #[tokio::test]
    async fn listener_does_not_keep_cache_alive() {
        let store = Arc::new(InMemoryKeyValueStore::default());
        let ctx = context(&store);
        let lists = Arc::clone(ctx.lists());
        drop(ctx);

        assert_eq!(Arc::strong_count(&lists), 1);
    }
}
