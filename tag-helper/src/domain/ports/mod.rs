//! Domain ports for the hexagonal boundary.
//!
//! The storage area, the cross-context messenger, the post editor, and the
//! page scraper are all external collaborators; the core reaches them only
//! through these traits.

mod macros;
pub(crate) use macros::define_port_error;

mod entity_source;
mod key_value_store;
mod mention_editor;
mod page_messenger;

#[cfg(test)]
pub use entity_source::MockEntitySource;
pub use entity_source::{EntityExtractionError, EntitySource};
pub use key_value_store::{KeyValueStore, KeyValueStoreError, StorageChange, StoredRecord};
#[cfg(test)]
pub use mention_editor::MockMentionEditor;
pub use mention_editor::{MentionEditor, MentionEditorError};
#[cfg(test)]
pub use page_messenger::MockPageMessenger;
pub use page_messenger::{
    ActiveTab, PageInbox, PageMessenger, PageMessengerError, PageRequest, TabId,
};
