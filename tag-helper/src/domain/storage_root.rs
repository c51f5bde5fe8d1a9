//! The full persisted state: every list, the selection, and the settings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::TagListError;
use super::ports::StoredRecord;
use super::settings::Settings;
use super::tag_list::{ListId, TagList, decode_stored_lists};

/// Keys of the persisted record.
pub mod keys {
    /// Ordered array of tag lists.
    pub const LISTS: &str = "lists";
    /// Id of the list new collections land in.
    pub const SELECTED_LIST_ID: &str = "selectedListId";
    /// Global display settings.
    pub const SETTINGS: &str = "settings";
    /// Pre-list flat array of users; read once by migration, then removed.
    pub const LEGACY_USERS: &str = "users";

    /// Keys read when loading the current state.
    pub const CURRENT: [&str; 3] = [LISTS, SELECTED_LIST_ID, SETTINGS];
}

/// Process-wide persisted state.
///
/// ## Invariants
/// - `lists` contains the default list.
/// - `selected_list_id` names a list in `lists`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    /// Lists in display order.
    pub lists: Vec<TagList>,
    /// List new collections land in and bulk insert offers.
    pub selected_list_id: ListId,
    /// Global display settings.
    pub settings: Settings,
}

impl StorageRoot {
    /// A fresh root holding only the empty default list.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self {
            lists: vec![TagList::default_list(now)],
            selected_list_id: ListId::default_list(),
            settings: Settings::default(),
        }
    }

    /// Build the root from a raw record read from the store.
    ///
    /// Missing keys fall back to defaults. Lists and entities that cannot be
    /// decoded are skipped rather than failing the whole record. A record
    /// without the default list gets one prepended, and a selection that
    /// does not resolve falls back to the default id.
    ///
    /// # Errors
    ///
    /// Returns [`TagListError::CorruptRecord`] when a present key holds a
    /// value of the wrong shape, such as a `lists` value that is not an
    /// array.
    pub fn from_record(record: &StoredRecord, now: DateTime<Utc>) -> Result<Self, TagListError> {
        let mut lists = read_lists(record, now)?;
        let selected: Option<ListId> = read_key(record, keys::SELECTED_LIST_ID)?;
        let settings: Settings = read_key(record, keys::SETTINGS)?.unwrap_or_default();

        if !lists.iter().any(|list| list.id.is_default()) {
            lists.insert(0, TagList::default_list(now));
        }

        let selected_list_id = selected
            .filter(|id| lists.iter().any(|list| &list.id == id))
            .unwrap_or_else(ListId::default_list);

        Ok(Self {
            lists,
            selected_list_id,
            settings,
        })
    }

    /// Look up a list by id.
    pub fn list(&self, id: &ListId) -> Option<&TagList> {
        self.lists.iter().find(|list| &list.id == id)
    }

    /// Mutable lookup by id.
    pub fn list_mut(&mut self, id: &ListId) -> Option<&mut TagList> {
        self.lists.iter_mut().find(|list| &list.id == id)
    }

    /// Look up a list by id or report it missing.
    ///
    /// # Errors
    ///
    /// [`TagListError::ListNotFound`] when no list has this id.
    pub fn require_list(&self, id: &ListId) -> Result<&TagList, TagListError> {
        self.list(id).ok_or_else(|| TagListError::list_not_found(id.clone()))
    }

    /// Mutable variant of [`StorageRoot::require_list`].
    ///
    /// # Errors
    ///
    /// [`TagListError::ListNotFound`] when no list has this id.
    pub fn require_list_mut(&mut self, id: &ListId) -> Result<&mut TagList, TagListError> {
        self.list_mut(id)
            .ok_or_else(|| TagListError::list_not_found(id.clone()))
    }

    /// The currently selected list.
    pub fn selected_list(&self) -> Option<&TagList> {
        self.list(&self.selected_list_id)
    }

    /// Encode the named keys for a single store write.
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// [`TagListError::CorruptRecord`] if a value cannot be serialised.
    pub fn to_record(&self, fields: &[&str]) -> Result<StoredRecord, TagListError> {
        let mut record = StoredRecord::new();
        for &key in fields {
            let value = match key {
                keys::LISTS => to_record_value(key, &self.lists)?,
                keys::SELECTED_LIST_ID => to_record_value(key, &self.selected_list_id)?,
                keys::SETTINGS => to_record_value(key, &self.settings)?,
                _ => continue,
            };
            record.insert(key.to_owned(), value);
        }
        Ok(record)
    }
}

/// Serialise a value for a store write.
///
/// # Errors
///
/// [`TagListError::CorruptRecord`] if serialisation fails.
pub(crate) fn to_record_value<T: Serialize>(key: &str, value: &T) -> Result<Value, TagListError> {
    serde_json::to_value(value).map_err(|err| TagListError::corrupt_record(key, err.to_string()))
}

fn read_lists(record: &StoredRecord, now: DateTime<Utc>) -> Result<Vec<TagList>, TagListError> {
    match record.get(keys::LISTS) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(decode_stored_lists(items, now)),
        Some(_) => Err(TagListError::corrupt_record(
            keys::LISTS,
            "expected an array of lists",
        )),
    }
}

fn read_key<T: DeserializeOwned>(record: &StoredRecord, key: &str) -> Result<Option<T>, TagListError> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|err| TagListError::corrupt_record(key, err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
            .single()
            .expect("valid fixed time")
    }

    fn record(value: Value) -> StoredRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[rstest]
    fn empty_record_reads_as_seeded_root(now: DateTime<Utc>) {
        let root = StorageRoot::from_record(&StoredRecord::new(), now).expect("root");
        assert_eq!(root, StorageRoot::seeded(now));
    }

    #[rstest]
    fn unresolvable_selection_falls_back_to_default(now: DateTime<Utc>) {
        let raw = record(json!({
            "lists": [
                {"id": "default", "name": "General", "createdAt": 1, "users": []},
                {"id": "list_b", "name": "B", "createdAt": 2, "users": []}
            ],
            "selectedListId": "list_gone"
        }));

        let root = StorageRoot::from_record(&raw, now).expect("root");
        assert!(root.selected_list_id.is_default());
        assert_eq!(root.lists.len(), 2);
    }

    #[rstest]
    fn missing_default_list_is_prepended(now: DateTime<Utc>) {
        let raw = record(json!({
            "lists": [{"id": "list_b", "name": "B", "createdAt": 2, "users": []}],
            "selectedListId": "list_b"
        }));

        let root = StorageRoot::from_record(&raw, now).expect("root");
        let ids: Vec<&str> = root.lists.iter().map(|list| list.id.as_ref()).collect();
        assert_eq!(ids, ["default", "list_b"]);
        assert_eq!(root.selected_list_id.as_ref(), "list_b");
    }

    #[rstest]
    fn malformed_lists_are_reported(now: DateTime<Utc>) {
        let raw = record(json!({ "lists": "not-an-array" }));
        let error = StorageRoot::from_record(&raw, now).expect_err("corrupt");
        assert!(matches!(error, TagListError::CorruptRecord { ref key, .. } if key == "lists"));
    }

    #[rstest]
    fn unreadable_entity_does_not_hide_other_lists(now: DateTime<Utc>) {
        let raw = record(json!({
            "lists": [
                {
                    "id": "default",
                    "name": "General",
                    "createdAt": 1,
                    "entities": [
                        {"type": "user", "entityUrn": "u1", "memberId": "1", "displayName": "Ada"}
                    ]
                },
                {"id": "list_b", "name": "B", "createdAt": 2, "entities": [{"type": "group"}]}
            ],
            "selectedListId": "list_b"
        }));

        let root = StorageRoot::from_record(&raw, now).expect("root");

        let lengths: Vec<(&str, usize)> = root
            .lists
            .iter()
            .map(|list| (list.id.as_ref(), list.len()))
            .collect();
        assert_eq!(lengths, [("default", 1), ("list_b", 0)]);
        assert_eq!(root.selected_list_id.as_ref(), "list_b");
    }

    #[rstest]
    fn settings_are_read_when_present(now: DateTime<Utc>) {
        let raw = record(json!({ "settings": {"nameWordLimit": 1} }));
        let root = StorageRoot::from_record(&raw, now).expect("root");
        assert_eq!(root.settings.name_word_limit, 1);
    }

    #[rstest]
    fn to_record_writes_only_requested_keys(now: DateTime<Utc>) {
        let root = StorageRoot::seeded(now);
        let written = root
            .to_record(&[keys::LISTS, keys::SELECTED_LIST_ID])
            .expect("encode");

        assert!(written.contains_key(keys::LISTS));
        assert_eq!(written[keys::SELECTED_LIST_ID], json!("default"));
        assert!(!written.contains_key(keys::SETTINGS));
    }
}
