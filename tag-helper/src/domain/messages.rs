//! Messages exchanged between the popup and page contexts.
//!
//! Every message is a JSON object with a `type` discriminator. Replies carry
//! no discriminator; their shape depends on the request.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, LinkedInUser, tagged_users};
use super::storage_root::StorageRoot;
use super::tag_list::{ListId, TagList};

/// A request sent from one context to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExtensionMessage {
    /// Insert mentions for the given entities into the post editor.
    InsertTags(InsertTagsMessage),
    /// A user was collected into a list.
    UserAdded(UserAddedMessage),
    /// Ask for the current lists and selection.
    GetLists,
}

/// Payload of [`ExtensionMessage::InsertTags`].
///
/// Older senders only populate `users`, so both fields travel together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InsertTagsMessage {
    /// User-only subset of `entities`, in the same order.
    #[serde(default, with = "tagged_users")]
    pub users: Vec<LinkedInUser>,
    /// Entities to insert, in insertion order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
}

impl InsertTagsMessage {
    /// Build the payload for `entities`, filling the legacy `users` field.
    pub fn from_entities(entities: &[Entity]) -> Self {
        Self {
            users: entities
                .iter()
                .filter_map(Entity::as_user)
                .cloned()
                .collect(),
            entities: Some(entities.to_vec()),
        }
    }

    /// Entities to insert: `entities` when non-empty, otherwise the legacy
    /// `users` tagged as users.
    pub fn into_entities(self) -> Vec<Entity> {
        match self.entities {
            Some(entities) if !entities.is_empty() => entities,
            _ => self.users.into_iter().map(Entity::User).collect(),
        }
    }
}

/// Payload of [`ExtensionMessage::UserAdded`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAddedMessage {
    /// The collected user.
    pub user: LinkedInUser,
    /// List the user landed in.
    pub list_id: ListId,
}

/// Reply to an [`ExtensionMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageResponse {
    /// Reply to [`ExtensionMessage::GetLists`].
    Lists(ListsResponse),
    /// Plain acknowledgement.
    Ack(Ack),
}

impl MessageResponse {
    /// A successful acknowledgement.
    pub const fn ack() -> Self {
        Self::Ack(Ack { success: true })
    }

    /// Whether the receiver reported success. List replies always do.
    pub const fn is_success(&self) -> bool {
        match self {
            Self::Lists(_) => true,
            Self::Ack(ack) => ack.success,
        }
    }
}

/// `{ "success": bool }` reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Whether the request was handled.
    pub success: bool,
}

/// Lists and selection, as returned for `getLists`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListsResponse {
    /// Every list in display order.
    pub lists: Vec<TagList>,
    /// Currently selected list.
    pub selected_list_id: ListId,
}

impl From<StorageRoot> for ListsResponse {
    fn from(root: StorageRoot) -> Self {
        Self {
            lists: root.lists,
            selected_list_id: root.selected_list_id,
        }
    }
}
