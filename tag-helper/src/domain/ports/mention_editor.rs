//! Port for the post composer on the page.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by editor adapters.
    pub enum MentionEditorError {
        /// No open post editor was found on the page.
        EditorNotFound => "post editor not found",
            notice: "Could not find post editor. Please open a new post first.",
        /// The editor refused the content.
        Rejected { message: String } => "editor rejected the mentions: {message}",
            notice: "Could not insert tags. The post editor refused them.",
    }
}

/// Rich-text post composer that mentions are appended to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MentionEditor: Send + Sync {
    /// Append already-rendered mention markup to the current paragraph.
    async fn append_mentions(&self, markup: &str) -> Result<(), MentionEditorError>;
}
