//! Named, ordered collections of entities.
//!
//! A [`TagList`] owns its entities privately so that the per-list
//! uniqueness invariant can only be changed through methods that honour it.
//! The legacy `users` field is not stored on the struct at all: it is
//! derived from the entities whenever a list is serialised.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use super::entity::{DedupeKey, Entity, LinkedInUser, tagged_users};

/// Reserved id of the list that always exists and cannot be deleted.
pub const DEFAULT_LIST_ID: &str = "default";

/// Name given to the default list when it is seeded.
pub const DEFAULT_LIST_NAME: &str = "General";

/// Stable list identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved default list id.
    pub fn default_list() -> Self {
        Self(DEFAULT_LIST_ID.to_owned())
    }

    /// Generate a fresh id for a user-created list.
    pub fn generate() -> Self {
        Self(format!("list_{}", Uuid::new_v4().simple()))
    }

    /// Whether this is the reserved default id.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_LIST_ID
    }
}

impl AsRef<str> for ListId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<&str> for ListId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A named, ordered collection of entities.
///
/// ## Invariants
/// - No two entities share a [`DedupeKey`].
/// - Entity order is the bulk-insertion order.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use tag_helper::domain::{Entity, LinkedInOrg, ListId, TagList};
///
/// let mut list = TagList::new(ListId::generate(), "Partners", Utc::now());
/// let acme = Entity::Org(LinkedInOrg {
///     company_id: "9".to_owned(),
///     universal_name: "acme".to_owned(),
///     display_name: "Acme Inc".to_owned(),
/// });
///
/// assert!(list.try_push(acme.clone()));
/// assert!(!list.try_push(acme));
/// assert_eq!(list.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TagListRecord", into = "TagListRecord")]
pub struct TagList {
    /// Stable identifier.
    pub id: ListId,
    /// Free-text name shown in selectors.
    pub name: String,
    /// Creation time, persisted as epoch milliseconds.
    pub created_at: DateTime<Utc>,
    entities: Vec<Entity>,
}

impl TagList {
    /// Create an empty list.
    pub fn new(id: ListId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
            entities: Vec::new(),
        }
    }

    /// The seeded default list.
    pub fn default_list(created_at: DateTime<Utc>) -> Self {
        Self::new(ListId::default_list(), DEFAULT_LIST_NAME, created_at)
    }

    /// Replace the entities, keeping the first occurrence of each dedupe key.
    #[must_use]
    pub fn with_entities(mut self, entities: impl IntoIterator<Item = Entity>) -> Self {
        self.entities.clear();
        for entity in entities {
            self.try_push(entity);
        }
        self
    }

    /// Entities in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of entities in the list.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the list holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.entities.get(index)
    }

    /// Whether an entity with this dedupe key is present.
    pub fn contains(&self, key: &DedupeKey) -> bool {
        self.entities.iter().any(|entity| &entity.dedupe_key() == key)
    }

    /// Append `entity` unless its dedupe key is already present.
    ///
    /// Returns `true` when the entity was appended.
    pub fn try_push(&mut self, entity: Entity) -> bool {
        if self.contains(&entity.dedupe_key()) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    /// Remove and return the entity at `index`; out-of-range is a no-op.
    pub fn remove_at(&mut self, index: usize) -> Option<Entity> {
        (index < self.entities.len()).then(|| self.entities.remove(index))
    }

    /// Move the entity at `from` so that it ends up at `to`.
    ///
    /// Returns `false` without changing anything when `from == to` or either
    /// index is out of range.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.entities.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let entity = self.entities.remove(from);
        self.entities.insert(to, entity);
        true
    }

    /// Drop every entity.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// User entities only, as written to the legacy `users` field.
    pub fn legacy_users(&self) -> Vec<LinkedInUser> {
        self.entities
            .iter()
            .filter_map(Entity::as_user)
            .cloned()
            .collect()
    }

    /// Dedupe keys of all entities.
    pub fn dedupe_keys(&self) -> HashSet<DedupeKey> {
        self.entities.iter().map(Entity::dedupe_key).collect()
    }
}

/// Persisted shape of a [`TagList`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagListRecord {
    id: ListId,
    name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(default, with = "tagged_users")]
    users: Vec<LinkedInUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entities: Option<Vec<Entity>>,
}

impl From<TagList> for TagListRecord {
    fn from(value: TagList) -> Self {
        let users = value.legacy_users();
        Self {
            id: value.id,
            name: value.name,
            created_at: value.created_at,
            users,
            entities: Some(value.entities),
        }
    }
}

impl From<TagListRecord> for TagList {
    fn from(value: TagListRecord) -> Self {
        let TagListRecord {
            id,
            name,
            created_at,
            users,
            entities,
        } = value;

        // Records written before orgs existed only carry `users`.
        let entities = match entities {
            Some(entities) if !entities.is_empty() => entities,
            _ => users.into_iter().map(Entity::User).collect(),
        };

        Self::new(id, name, created_at).with_entities(entities)
    }
}

/// Stored list read without trusting its entries.
///
/// Entries are kept as raw values and decoded one by one so a single entry
/// this build does not understand costs only that entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTagList {
    id: ListId,
    name: String,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    users: Vec<Value>,
    #[serde(default)]
    entities: Option<Vec<Value>>,
}

impl StoredTagList {
    fn into_list(self, now: DateTime<Utc>) -> TagList {
        let Self {
            id,
            name,
            created_at,
            users,
            entities,
        } = self;

        let entities: Vec<Entity> = match entities {
            Some(items) if !items.is_empty() => decode_entries(&id, &items),
            _ => decode_entries::<LinkedInUser>(&id, &users)
                .into_iter()
                .map(Entity::User)
                .collect(),
        };

        TagList::new(id, name, created_at.unwrap_or(now)).with_entities(entities)
    }
}

/// Decode the stored `lists` array, dropping what cannot be read.
///
/// A list without a usable `id` or `name` is skipped. Inside a list, each
/// entity that fails to decode is skipped. A missing `createdAt` becomes
/// `now`. Every skip is logged.
pub(crate) fn decode_stored_lists(items: &[Value], now: DateTime<Utc>) -> Vec<TagList> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match StoredTagList::deserialize(item) {
            Ok(stored) => Some(stored.into_list(now)),
            Err(err) => {
                warn!(index, error = %err, "skipping unreadable tag list");
                None
            }
        })
        .collect()
}

fn decode_entries<T: DeserializeOwned>(list_id: &ListId, items: &[Value]) -> Vec<T> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(list = %list_id, index, error = %err, "skipping unreadable list entry");
                None
            }
        })
        .collect()
}
