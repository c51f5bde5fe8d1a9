//! Popup controller.
//!
//! The popup edits lists directly through the [`TagListService`] and asks
//! the page context in the active tab to insert mentions. Every failure
//! comes back as a [`Notice`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::ports::{KeyValueStore, PageMessenger, TabId};
use crate::domain::{
    ExtensionMessage, InsertTagsMessage, ListId, Notice, Placement, TagListError,
    TagListService,
};

const NO_ACTIVE_TAB: &str = "Could not find active tab";
const NOT_LINKEDIN: &str = "Please open LinkedIn first";
const INSERT_FAILED: &str = "Could not insert tags. Make sure the post editor is open.";

/// Result of asking the page to insert the selected list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupInsert {
    /// The page acknowledged the request; the popup may close.
    Delivered {
        /// Number of entities sent.
        count: usize,
    },
    /// The selected list is empty; nothing was sent.
    EmptyList,
    /// Nothing was inserted.
    Failed(Notice),
}

/// Actions available from the popup.
pub struct PopupController<S> {
    service: TagListService<S>,
    messenger: Arc<dyn PageMessenger>,
    notice_ttl: Duration,
}

impl<S: KeyValueStore> PopupController<S> {
    /// Create a controller.
    pub fn new(
        service: TagListService<S>,
        messenger: Arc<dyn PageMessenger>,
        notice_ttl: Duration,
    ) -> Self {
        Self {
            service,
            messenger,
            notice_ttl,
        }
    }

    /// Send the selected list to the page in the active tab for insertion.
    pub async fn insert_selected(&self) -> PopupInsert {
        let entities = match self.service.snapshot().await {
            Ok(root) => root
                .selected_list()
                .map(|list| list.entities().to_vec())
                .unwrap_or_default(),
            Err(err) => return PopupInsert::Failed(self.error_notice(&err)),
        };
        if entities.is_empty() {
            return PopupInsert::EmptyList;
        }

        let tab = match self.linkedin_tab().await {
            Ok(tab) => tab,
            Err(notice) => return PopupInsert::Failed(notice),
        };

        let message = ExtensionMessage::InsertTags(InsertTagsMessage::from_entities(&entities));
        match self.messenger.send(tab, message).await {
            Ok(response) if response.is_success() => {
                debug!(count = entities.len(), tab = tab.0, "insert request delivered");
                PopupInsert::Delivered {
                    count: entities.len(),
                }
            }
            Ok(_) => PopupInsert::Failed(self.notice(Notice::error(INSERT_FAILED))),
            Err(err) => {
                warn!(error = %err, "insert request not delivered");
                PopupInsert::Failed(self.notice(Notice::from(&err)))
            }
        }
    }

    /// Copy the entity at `index` of the selected list into `target`.
    ///
    /// Returns `None` when `index` is out of range.
    pub async fn copy_to(&self, index: usize, target: &ListId) -> Option<Notice> {
        self.transfer(Placement::Copy, index, target).await
    }

    /// Move the entity at `index` of the selected list into `target`.
    ///
    /// Returns `None` when `index` is out of range.
    pub async fn move_to(&self, index: usize, target: &ListId) -> Option<Notice> {
        self.transfer(Placement::Move, index, target).await
    }

    /// Create and select a new list.
    ///
    /// # Errors
    ///
    /// A notice explaining why the list was not created.
    pub async fn create_list(&self, name: &str) -> Result<ListId, Notice> {
        self.service
            .create_list(name)
            .await
            .map_err(|err| self.error_notice(&err))
    }

    /// Rename a list.
    ///
    /// # Errors
    ///
    /// A notice explaining why the list was not renamed.
    pub async fn rename_list(&self, list_id: &ListId, name: &str) -> Result<(), Notice> {
        self.service
            .rename_list(list_id, name)
            .await
            .map_err(|err| self.error_notice(&err))
    }

    /// Delete a list.
    ///
    /// # Errors
    ///
    /// A notice explaining why the list was kept.
    pub async fn delete_list(&self, list_id: &ListId) -> Result<(), Notice> {
        self.service
            .delete_list(list_id)
            .await
            .map_err(|err| self.error_notice(&err))
    }

    async fn transfer(&self, placement: Placement, index: usize, target: &ListId) -> Option<Notice> {
        let source = match self.service.snapshot().await {
            Ok(root) => root.selected_list_id,
            Err(err) => return Some(self.error_notice(&err)),
        };
        let result = match placement {
            Placement::Move => self.service.move_entity(&source, index, target).await,
            Placement::Add | Placement::Copy => {
                self.service.copy_entity(&source, index, target).await
            }
        };
        match result {
            Ok(outcome) => outcome
                .map(|outcome| self.notice(Notice::for_placement(placement, &outcome))),
            Err(err) => Some(self.error_notice(&err)),
        }
    }

    async fn linkedin_tab(&self) -> Result<TabId, Notice> {
        let tab = match self.messenger.active_tab().await {
            Ok(tab) => tab,
            Err(err) => {
                warn!(error = %err, "active tab lookup failed");
                return Err(self.notice(Notice::from(&err)));
            }
        };
        let Some((id, tab)) = tab.and_then(|tab| tab.id.map(|id| (id, tab))) else {
            return Err(self.notice(Notice::error(NO_ACTIVE_TAB)));
        };
        if !tab.is_linkedin() {
            return Err(self.notice(Notice::error(NOT_LINKEDIN)));
        }
        Ok(id)
    }

    fn error_notice(&self, error: &TagListError) -> Notice {
        warn!(%error, "list operation failed");
        self.notice(Notice::from(error))
    }

    fn notice(&self, notice: Notice) -> Notice {
        notice.with_ttl(self.notice_ttl)
    }
}
