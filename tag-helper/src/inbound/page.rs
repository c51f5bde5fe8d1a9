//! Page controller.
//!
//! Runs in the LinkedIn page context: collects the profile or company being
//! viewed, answers cross-context messages, and writes mentions into the
//! post editor. The latest notice is published on a watch channel the page
//! renders as a toast; a newer notice replaces the older one.

use std::sync::Arc;
use std::time::Duration;

use mention_format::MentionStyle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    EntitySource, KeyValueStore, MentionEditor, MentionEditorError, PageInbox,
};
use crate::domain::{
    Ack, DEFAULT_LIST_NAME, Entity, ExtensionMessage, ListId, ListsResponse, MessageResponse, Notice,
    Placement, Settings, StorageRoot, TagListService, lists_containing, render_mentions,
};

const LIST_EMPTY: &str = "No tags in this list";

/// What the collect button on a profile or company page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectButton {
    /// The entity is in no list yet; collecting adds it to `list_name`.
    Collect {
        /// Name of the selected list.
        list_name: String,
    },
    /// The entity already sits in these lists.
    Added {
        /// Names of every list holding the entity.
        list_names: Vec<String>,
    },
}

impl CollectButton {
    /// Button caption.
    ///
    /// # Examples
    /// ```
    /// use tag_helper::inbound::page::CollectButton;
    ///
    /// let button = CollectButton::Added { list_names: vec!["General".into(), "Partners".into()] };
    /// assert_eq!(button.label(), "Added (2)");
    /// ```
    pub fn label(&self) -> String {
        match self {
            Self::Collect { list_name } => format!("+ Tag {list_name}"),
            Self::Added { list_names } => format!("Added ({})", list_names.len()),
        }
    }
}

/// Controller for one page context.
pub struct PageController<S> {
    service: TagListService<S>,
    editor: Arc<dyn MentionEditor>,
    source: Arc<dyn EntitySource>,
    notice_ttl: Duration,
    toast: watch::Sender<Option<Notice>>,
}

impl<S> PageController<S> {
    /// Create a controller.
    pub fn new(
        service: TagListService<S>,
        editor: Arc<dyn MentionEditor>,
        source: Arc<dyn EntitySource>,
        notice_ttl: Duration,
    ) -> Self {
        Self {
            service,
            editor,
            source,
            notice_ttl,
            toast: watch::channel(None).0,
        }
    }

    /// Follow the notices this page shows.
    pub fn notices(&self) -> watch::Receiver<Option<Notice>> {
        self.toast.subscribe()
    }

    /// The collect button for `entity`, computed from the cache without
    /// suspending. Before the first load it offers the default list.
    pub fn collect_button(&self, entity: Option<&Entity>) -> CollectButton {
        let Some(root) = self.service.list_store().cached() else {
            return CollectButton::Collect {
                list_name: DEFAULT_LIST_NAME.to_owned(),
            };
        };
        let holders = entity
            .map(|entity| lists_containing(&root, entity))
            .unwrap_or_default();
        if holders.is_empty() {
            CollectButton::Collect {
                list_name: selected_name(&root),
            }
        } else {
            CollectButton::Added {
                list_names: holders,
            }
        }
    }

    fn show(&self, notice: Notice) -> Notice {
        let notice = notice.with_ttl(self.notice_ttl);
        self.toast.send_replace(Some(notice.clone()));
        notice
    }
}

impl<S: KeyValueStore> PageController<S> {
    /// Answer one cross-context message.
    pub async fn handle_message(&self, message: ExtensionMessage) -> MessageResponse {
        match message {
            ExtensionMessage::InsertTags(payload) => {
                self.insert_entities(&payload.into_entities()).await;
                MessageResponse::ack()
            }
            ExtensionMessage::GetLists => match self.service.snapshot().await {
                Ok(root) => MessageResponse::Lists(ListsResponse::from(root)),
                Err(err) => {
                    warn!(error = %err, "could not read lists for getLists");
                    MessageResponse::Ack(Ack { success: false })
                }
            },
            ExtensionMessage::UserAdded(added) => {
                debug!(member = %added.user.member_id, list = %added.list_id, "user added elsewhere");
                MessageResponse::ack()
            }
        }
    }

    /// Answer messages from `inbox` until the messenger goes away.
    pub async fn serve(&self, mut inbox: PageInbox) {
        debug!(tab = inbox.tab().0, "page listening for messages");
        while let Some(request) = inbox.next().await {
            let response = self.handle_message(request.message.clone()).await;
            request.respond(response);
        }
        debug!(tab = inbox.tab().0, "page stopped listening");
    }

    /// Add the entity on the current page to `list_id`.
    pub async fn collect_current(&self, list_id: &ListId) -> Notice {
        let entity = match self.source.current_entity().await {
            Ok(entity) => entity,
            Err(err) => {
                warn!(error = %err, "entity extraction failed");
                return self.show(Notice::from(&err));
            }
        };
        match self.service.add_entity(list_id, entity).await {
            Ok(outcome) => {
                if outcome.is_added() {
                    // Reload so the collect button reflects the write.
                    if let Err(err) = self.service.list_store().load().await {
                        warn!(error = %err, "cache refresh after collect failed");
                    }
                }
                self.show(Notice::for_placement(Placement::Add, &outcome))
            }
            Err(err) => self.show(Notice::from(&err)),
        }
    }

    /// Insert every entity of `list_id` into the editor.
    pub async fn insert_list(&self, list_id: &ListId) -> Notice {
        let root = match self.service.snapshot().await {
            Ok(root) => root,
            Err(err) => return self.show(Notice::from(&err)),
        };
        match root.require_list(list_id) {
            Ok(list) if list.is_empty() => self.show(Notice::error(LIST_EMPTY)),
            Ok(list) => self.insert_with(list.entities(), &root.settings).await,
            Err(err) => self.show(Notice::from(&err)),
        }
    }

    /// Render `entities` as editor mentions and append them to the post.
    ///
    /// An empty payload leaves the editor and the toast alone and returns
    /// `None`.
    pub async fn insert_entities(&self, entities: &[Entity]) -> Option<Notice> {
        if entities.is_empty() {
            debug!("insert request carried no entities");
            return None;
        }
        let settings = match self.service.snapshot().await {
            Ok(root) => root.settings,
            Err(err) => {
                warn!(error = %err, "using default settings for insertion");
                Settings::default()
            }
        };
        Some(self.insert_with(entities, &settings).await)
    }

    async fn insert_with(&self, entities: &[Entity], settings: &Settings) -> Notice {
        let markup = render_mentions(entities, settings, MentionStyle::Strong);
        match self.editor.append_mentions(&markup).await {
            Ok(()) => {
                info!(count = entities.len(), "inserted mentions");
                self.show(Notice::inserted(entities.len()))
            }
            Err(err) => {
                if matches!(err, MentionEditorError::Rejected { .. }) {
                    warn!(error = %err, "editor rejected mentions");
                }
                self.show(Notice::from(&err))
            }
        }
    }
}

fn selected_name(root: &StorageRoot) -> String {
    root.selected_list()
        .map_or_else(|| DEFAULT_LIST_NAME.to_owned(), |list| list.name.clone())
}
