//! In-process cross-context messaging.
//!
//! [`InProcessMessenger`] plays the browser's tab registry and message
//! channel: the popup side sends through the [`PageMessenger`] port, and a
//! page context receives requests from the [`PageInbox`] it attached.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::messages::{ExtensionMessage, MessageResponse};
use crate::domain::ports::{
    ActiveTab, PageInbox, PageMessenger, PageMessengerError, PageRequest, TabId,
};

/// Requests queued per page before senders wait.
const INBOX_CAPACITY: usize = 16;

/// Tab registry and message channel for one browser window.
#[derive(Default)]
pub struct InProcessMessenger {
    active_tab: Mutex<Option<ActiveTab>>,
    listeners: Mutex<HashMap<TabId, mpsc::Sender<PageRequest>>>,
}

impl InProcessMessenger {
    /// Make `tab` the window's active tab, or clear it.
    pub fn set_active_tab(&self, tab: Option<ActiveTab>) {
        *lock(&self.active_tab) = tab;
    }

    /// Start listening for messages sent to `tab`, replacing any earlier
    /// listener.
    pub fn attach(&self, tab: TabId) -> PageInbox {
        let (sender, receiver) = mpsc::channel(INBOX_CAPACITY);
        lock(&self.listeners).insert(tab, sender);
        PageInbox::new(tab, receiver)
    }

    /// Stop delivering to `tab`, as when the page navigates away.
    pub fn detach(&self, tab: TabId) {
        lock(&self.listeners).remove(&tab);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl PageMessenger for InProcessMessenger {
    async fn active_tab(&self) -> Result<Option<ActiveTab>, PageMessengerError> {
        Ok(lock(&self.active_tab).clone())
    }

    async fn send(
        &self,
        tab: TabId,
        message: ExtensionMessage,
    ) -> Result<MessageResponse, PageMessengerError> {
        let listener = lock(&self.listeners).get(&tab).cloned().ok_or_else(|| {
            PageMessengerError::delivery(format!("no page context is listening in tab {}", tab.0))
        })?;

        let (request, response) = PageRequest::new(message);
        listener
            .send(request)
            .await
            .map_err(|_| PageMessengerError::delivery("page context closed"))?;
        response
            .await
            .map_err(|_| PageMessengerError::delivery("page context dropped the message"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn messenger() -> InProcessMessenger {
        InProcessMessenger::default()
    }

    #[rstest]
    #[tokio::test]
    async fn unattached_tab_fails_immediately(messenger: InProcessMessenger) {
        let error = messenger
            .send(TabId(3), ExtensionMessage::GetLists)
            .await
            .expect_err("nobody listening");
        assert!(matches!(error, PageMessengerError::Delivery { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn attached_page_replies(messenger: InProcessMessenger) {
        let mut inbox = messenger.attach(TabId(1));
        let page = tokio::spawn(async move {
            let request = inbox.next().await.expect("request");
            assert_eq!(request.message, ExtensionMessage::GetLists);
            request.respond(MessageResponse::ack());
        });

        let response = messenger
            .send(TabId(1), ExtensionMessage::GetLists)
            .await
            .expect("reply");

        assert!(response.is_success());
        page.await.expect("page task");
    }

    #[rstest]
    #[tokio::test]
    async fn dropped_inbox_is_a_delivery_error(messenger: InProcessMessenger) {
        drop(messenger.attach(TabId(2)));

        let error = messenger
            .send(TabId(2), ExtensionMessage::GetLists)
            .await
            .expect_err("inbox dropped");
        assert!(matches!(error, PageMessengerError::Delivery { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn active_tab_is_reported(messenger: InProcessMessenger) {
        assert_eq!(messenger.active_tab().await.expect("query"), None);

        let tab = ActiveTab {
            id: Some(TabId(4)),
            url: Some("https://www.linkedin.com/feed/".into()),
        };
        messenger.set_active_tab(Some(tab.clone()));

        assert_eq!(messenger.active_tab().await.expect("query"), Some(tab));
    }
}
