//! Port for sending messages from the popup context to the page context.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::domain::messages::{ExtensionMessage, MessageResponse};

use super::define_port_error;

define_port_error! {
    /// Errors raised while locating or messaging the page context.
    pub enum PageMessengerError {
        /// The active tab could not be queried.
        TabQuery { message: String } => "active tab lookup failed: {message}",
            notice: "Could not find active tab",
        /// No listener received the message, e.g. the content script is not loaded.
        Delivery { message: String } => "message could not be delivered: {message}",
            notice: "Could not insert tags. Make sure the post editor is open.",
    }
}

/// Browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub u32);

/// The tab the user is looking at when the popup acts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTab {
    /// Tab id; absent for special pages that cannot receive messages.
    pub id: Option<TabId>,
    /// Current URL, when the extension may read it.
    pub url: Option<String>,
}

impl ActiveTab {
    /// Whether the tab shows a LinkedIn page.
    pub fn is_linkedin(&self) -> bool {
        self.url
            .as_deref()
            .is_some_and(|url| url.contains("linkedin.com"))
    }
}

/// A message awaiting the page context's reply.
#[derive(Debug)]
pub struct PageRequest {
    /// The request body.
    pub message: ExtensionMessage,
    reply: oneshot::Sender<MessageResponse>,
}

impl PageRequest {
    /// Wrap `message`, returning the request and the receiver its reply
    /// arrives on.
    pub fn new(message: ExtensionMessage) -> (Self, oneshot::Receiver<MessageResponse>) {
        let (reply, response) = oneshot::channel();
        (Self { message, reply }, response)
    }

    /// Send the reply. A sender that stopped waiting is ignored.
    pub fn respond(self, response: MessageResponse) {
        if self.reply.send(response).is_err() {
            debug!("sender stopped waiting for the reply");
        }
    }
}

/// Receiving end held by a page context.
#[derive(Debug)]
pub struct PageInbox {
    tab: TabId,
    receiver: mpsc::Receiver<PageRequest>,
}

impl PageInbox {
    /// Inbox for `tab` fed by `receiver`.
    pub const fn new(tab: TabId, receiver: mpsc::Receiver<PageRequest>) -> Self {
        Self { tab, receiver }
    }

    /// Tab this inbox listens on.
    pub const fn tab(&self) -> TabId {
        self.tab
    }

    /// Next request, or `None` once the messenger is gone.
    pub async fn next(&mut self) -> Option<PageRequest> {
        self.receiver.recv().await
    }
}

/// Cross-context messaging as seen from the popup.
///
/// A send to a tab with no listening page context fails immediately with
/// [`PageMessengerError::Delivery`]; there is no timeout to wait out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageMessenger: Send + Sync {
    /// The active tab of the current window, if any.
    async fn active_tab(&self) -> Result<Option<ActiveTab>, PageMessengerError>;

    /// Send `message` to the page context in `tab` and await its reply.
    async fn send(
        &self,
        tab: TabId,
        message: ExtensionMessage,
    ) -> Result<MessageResponse, PageMessengerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("https://www.linkedin.com/feed/"), true)]
    #[case(Some("https://example.com/"), false)]
    #[case(None, false)]
    fn linkedin_detection_uses_url(#[case] url: Option<&str>, #[case] expected: bool) {
        let tab = ActiveTab {
            id: Some(TabId(7)),
            url: url.map(str::to_owned),
        };
        assert_eq!(tab.is_linkedin(), expected);
    }
}
