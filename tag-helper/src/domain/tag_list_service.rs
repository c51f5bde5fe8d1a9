//! List mutation operations.
//!
//! Every operation reads the full record through the [`ListStore`],
//! modifies it in memory, and writes the touched keys back in a single
//! store call. Failed validation never writes.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info};

use super::entity::Entity;
use super::error::TagListError;
use super::list_store::ListStore;
use super::ports::KeyValueStore;
use super::settings::Settings;
use super::storage_root::{StorageRoot, keys};
use super::tag_list::{ListId, TagList};

/// Result of placing an entity into a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The entity was appended.
    Added {
        /// Display name of the entity.
        entity_name: String,
        /// Name of the receiving list.
        list_name: String,
    },
    /// The list already held an entity with the same dedupe key.
    AlreadyPresent {
        /// Display name of the entity.
        entity_name: String,
        /// Name of the list that already holds it.
        list_name: String,
    },
}

impl AddOutcome {
    /// Whether anything was written.
    pub const fn is_added(&self) -> bool {
        matches!(self, Self::Added { .. })
    }

    fn added(entity: &Entity, list: &TagList) -> Self {
        Self::Added {
            entity_name: entity.display_name().to_owned(),
            list_name: list.name.clone(),
        }
    }

    fn already_present(entity: &Entity, list: &TagList) -> Self {
        Self::AlreadyPresent {
            entity_name: entity.display_name().to_owned(),
            list_name: list.name.clone(),
        }
    }
}

/// Mutations over the persisted lists of one execution context.
pub struct TagListService<S> {
    lists: Arc<ListStore<S>>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for TagListService<S> {
    fn clone(&self) -> Self {
        Self {
            lists: Arc::clone(&self.lists),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S> TagListService<S> {
    /// Create a service writing through `lists`.
    pub fn new(lists: Arc<ListStore<S>>, clock: Arc<dyn Clock>) -> Self {
        Self { lists, clock }
    }

    /// The accessor this service writes through.
    pub fn list_store(&self) -> &Arc<ListStore<S>> {
        &self.lists
    }
}

impl<S: KeyValueStore> TagListService<S> {
    /// Current state, from the cache when possible.
    ///
    /// # Errors
    ///
    /// As for [`ListStore::get`].
    pub async fn snapshot(&self) -> Result<StorageRoot, TagListError> {
        self.lists.get().await
    }

    /// Append `entity` to a list unless its dedupe key is already there.
    ///
    /// # Errors
    ///
    /// [`TagListError::ListNotFound`] for an unknown list, or a store error.
    pub async fn add_entity(
        &self,
        list_id: &ListId,
        entity: Entity,
    ) -> Result<AddOutcome, TagListError> {
        let mut root = self.lists.load().await?;
        let list = root.require_list_mut(list_id)?;

        let outcome = if list.contains(&entity.dedupe_key()) {
            AddOutcome::already_present(&entity, list)
        } else {
            let outcome = AddOutcome::added(&entity, list);
            list.try_push(entity);
            outcome
        };

        if outcome.is_added() {
            self.lists.persist(&root, &[keys::LISTS]).await?;
        }
        debug!(list = %list_id, ?outcome, "add entity");
        Ok(outcome)
    }

    /// Remove the entity at `index`. Out-of-range indices change nothing.
    ///
    /// # Errors
    ///
    /// [`TagListError::ListNotFound`] for an unknown list, or a store error.
    pub async fn remove_entity(
        &self,
        list_id: &ListId,
        index: usize,
    ) -> Result<Option<Entity>, TagListError> {
        let mut root = self.lists.load().await?;
        let removed = root.require_list_mut(list_id)?.remove_at(index);

        if removed.is_some() {
            self.lists.persist(&root, &[keys::LISTS]).await?;
            debug!(list = %list_id, index, "removed entity");
        }
        Ok(removed)
    }

    /// Copy the entity at `index` of `source` into `target`.
    ///
    /// Returns `None` when `index` is out of range. Copying into the list
    /// the entity already sits in reports [`AddOutcome::AlreadyPresent`].
    ///
    /// # Errors
    ///
    /// [`TagListError::ListNotFound`] if either list is unknown, or a store
    /// error.
    pub async fn copy_entity(
        &self,
        source: &ListId,
        index: usize,
        target: &ListId,
    ) -> Result<Option<AddOutcome>, TagListError> {
        let mut root = self.lists.load().await?;
        let Some(entity) = root.require_list(source)?.get(index).cloned() else {
            return Ok(None);
        };
        let destination = root.require_list_mut(target)?;

        if destination.contains(&entity.dedupe_key()) {
            return Ok(Some(AddOutcome::already_present(&entity, destination)));
        }
        let outcome = AddOutcome::added(&entity, destination);
        destination.try_push(entity);

        self.lists.persist(&root, &[keys::LISTS]).await?;
        debug!(%source, %target, index, "copied entity");
        Ok(Some(outcome))
    }

    /// Move the entity at `index` of `source` into `target`.
    ///
    /// All or nothing: when `target` already holds the entity, `source` is
    /// left untouched and nothing is written.
    ///
    /// # Errors
    ///
    /// [`TagListError::ListNotFound`] if either list is unknown, or a store
    /// error.
    pub async fn move_entity(
        &self,
        source: &ListId,
        index: usize,
        target: &ListId,
    ) -> Result<Option<AddOutcome>, TagListError> {
        let mut root = self.lists.load().await?;
        let Some(entity) = root.require_list(source)?.get(index).cloned() else {
            return Ok(None);
        };
        let destination = root.require_list(target)?;

        if destination.contains(&entity.dedupe_key()) {
            return Ok(Some(AddOutcome::already_present(&entity, destination)));
        }
        let outcome = AddOutcome::added(&entity, destination);

        root.require_list_mut(source)?.remove_at(index);
        root.require_list_mut(target)?.try_push(entity);

        self.lists.persist(&root, &[keys::LISTS]).await?;
        debug!(%source, %target, index, "moved entity");
        Ok(Some(outcome))
    }

    /// Move the entity at `from` to position `to` within one list.
    ///
    /// Returns whether the order changed; equal or out-of-range indices are
    /// a no-op.
    ///
    /// # Errors
    ///
    /// [`TagListError::ListNotFound`] for an unknown list, or a store error.
    pub async fn reorder_entities(
        &self,
        list_id: &ListId,
        from: usize,
        to: usize,
    ) -> Result<bool, TagListError> {
        let mut root = self.lists.load().await?;
        let changed = root.require_list_mut(list_id)?.reorder(from, to);

        if changed {
            self.lists.persist(&root, &[keys::LISTS]).await?;
            debug!(list = %list_id, from, to, "reordered entities");
        }
        Ok(changed)
    }

    /// Empty a list. Returns how many entities were removed.
    ///
    /// # Errors
    ///
    /// [`TagListError::ListNotFound`] for an unknown list, or a store error.
    pub async fn clear_list(&self, list_id: &ListId) -> Result<usize, TagListError> {
        let mut root = self.lists.load().await?;
        let list = root.require_list_mut(list_id)?;
        let removed = list.len();
        list.clear();

        self.lists.persist(&root, &[keys::LISTS]).await?;
        info!(list = %list_id, removed, "cleared list");
        Ok(removed)
    }

    /// Create a list named `name` (trimmed), select it, and return its id.
    ///
    /// The new list and the selection are written together.
    ///
    /// # Errors
    ///
    /// [`TagListError::EmptyListName`] for a blank name, or a store error.
    pub async fn create_list(&self, name: &str) -> Result<ListId, TagListError> {
        let name = validate_name(name)?;
        let mut root = self.lists.load().await?;

        let id = ListId::generate();
        root.lists
            .push(TagList::new(id.clone(), name, self.clock.utc()));
        root.selected_list_id = id.clone();

        self.lists
            .persist(&root, &[keys::LISTS, keys::SELECTED_LIST_ID])
            .await?;
        info!(list = %id, name, "created list");
        Ok(id)
    }

    /// Rename a list. The name is trimmed.
    ///
    /// # Errors
    ///
    /// [`TagListError::EmptyListName`] for a blank name,
    /// [`TagListError::ListNotFound`] for an unknown list, or a store error.
    pub async fn rename_list(&self, list_id: &ListId, name: &str) -> Result<(), TagListError> {
        let name = validate_name(name)?;
        let mut root = self.lists.load().await?;
        root.require_list_mut(list_id)?.name = name.to_owned();

        self.lists.persist(&root, &[keys::LISTS]).await?;
        info!(list = %list_id, name, "renamed list");
        Ok(())
    }

    /// Delete a list. If it was selected, the default list becomes selected.
    ///
    /// # Errors
    ///
    /// [`TagListError::DefaultListProtected`] for the default list,
    /// [`TagListError::ListNotFound`] for an unknown list, or a store error.
    pub async fn delete_list(&self, list_id: &ListId) -> Result<(), TagListError> {
        if list_id.is_default() {
            return Err(TagListError::DefaultListProtected);
        }
        let mut root = self.lists.load().await?;
        root.require_list(list_id)?;
        root.lists.retain(|list| &list.id != list_id);

        let mut fields = vec![keys::LISTS];
        if &root.selected_list_id == list_id {
            root.selected_list_id = ListId::default_list();
            fields.push(keys::SELECTED_LIST_ID);
        }

        self.lists.persist(&root, &fields).await?;
        info!(list = %list_id, "deleted list");
        Ok(())
    }

    /// Make `list_id` the selected list.
    ///
    /// # Errors
    ///
    /// [`TagListError::ListNotFound`] for an unknown list, or a store error.
    pub async fn select_list(&self, list_id: &ListId) -> Result<(), TagListError> {
        let mut root = self.lists.load().await?;
        root.require_list(list_id)?;
        root.selected_list_id = list_id.clone();

        self.lists
            .persist(&root, &[keys::SELECTED_LIST_ID])
            .await?;
        debug!(list = %list_id, "selected list");
        Ok(())
    }

    /// Persist new display settings.
    ///
    /// # Errors
    ///
    /// A store error.
    pub async fn update_settings(&self, settings: Settings) -> Result<(), TagListError> {
        let mut root = self.lists.load().await?;
        root.settings = settings;

        self.lists.persist(&root, &[keys::SETTINGS]).await?;
        debug!(?settings, "updated settings");
        Ok(())
    }

    /// Names of every list holding an entity with `entity`'s dedupe key.
    ///
    /// # Errors
    ///
    /// As for [`ListStore::get`].
    pub async fn lists_containing(&self, entity: &Entity) -> Result<Vec<String>, TagListError> {
        let root = self.lists.get().await?;
        Ok(lists_containing(&root, entity))
    }
}

/// Names of the lists in `root` that hold `entity`.
pub fn lists_containing(root: &StorageRoot, entity: &Entity) -> Vec<String> {
    let key = entity.dedupe_key();
    root.lists
        .iter()
        .filter(|list| list.contains(&key))
        .map(|list| list.name.clone())
        .collect()
}

fn validate_name(name: &str) -> Result<&str, TagListError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TagListError::EmptyListName);
    }
    Ok(trimmed)
}
