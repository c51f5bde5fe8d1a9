//! Domain model and services.
//!
//! Purpose: define the entity model, the persisted schema and its legacy
//! migration, the cached list accessor, and the list mutations shared by
//! the popup and page contexts.
//!
//! Public surface:
//! - Entity, LinkedInUser, LinkedInOrg: what gets collected and mentioned.
//! - TagList, ListId, StorageRoot, Settings: the persisted record.
//! - ListStore: per-context read-through cache over a `KeyValueStore`.
//! - TagListService: add/remove/copy/move/reorder/clear entities and
//!   create/rename/delete/select lists.
//! - Notice: transient feedback built from outcomes and errors.

pub mod entity;
pub mod error;
pub mod insertion;
pub mod list_store;
pub mod messages;
pub mod migration;
pub mod notice;
pub mod ports;
pub mod settings;
pub mod storage_root;
pub mod tag_list;
pub mod tag_list_service;

pub use self::entity::{DedupeKey, Entity, LinkedInOrg, LinkedInUser};
pub use self::error::TagListError;
pub use self::insertion::{mention_name, render_mentions};
pub use self::list_store::ListStore;
pub use self::messages::{
    Ack, ExtensionMessage, InsertTagsMessage, ListsResponse, MessageResponse, UserAddedMessage,
};
pub use self::migration::{MIGRATION_KEYS, MigrationPlan, plan_migration};
pub use self::notice::{DEFAULT_NOTICE_TTL, Notice, NoticeKind, Placement};
pub use self::settings::Settings;
pub use self::storage_root::{StorageRoot, keys};
pub use self::tag_list::{DEFAULT_LIST_ID, DEFAULT_LIST_NAME, ListId, TagList};
pub use self::tag_list_service::{AddOutcome, TagListService, lists_containing};
