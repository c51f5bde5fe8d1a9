//! Transient user-facing messages produced by the controllers.

use std::time::Duration;

use super::error::TagListError;
use super::tag_list_service::AddOutcome;

/// How long a notice stays visible unless configured otherwise.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(3000);

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The action completed.
    Success,
    /// The action failed.
    Error,
    /// Nothing went wrong but nothing changed either.
    Info,
}

/// Which kind of placement produced an [`AddOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Collected from the page.
    Add,
    /// Copied from another list.
    Copy,
    /// Moved from another list.
    Move,
}

impl Placement {
    const fn verb(self) -> &'static str {
        match self {
            Self::Add => "Added",
            Self::Copy => "Copied",
            Self::Move => "Moved",
        }
    }
}

/// An auto-dismissing message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Text shown to the user.
    pub message: String,
    /// Time until the notice dismisses itself.
    pub ttl: Duration,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            ttl: DEFAULT_NOTICE_TTL,
        }
    }

    /// A success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    /// An error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    /// An informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message)
    }

    /// Replace the display time.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Notice for the result of adding, copying, or moving an entity.
    ///
    /// # Examples
    /// ```
    /// use tag_helper::domain::{AddOutcome, Notice, NoticeKind, Placement};
    ///
    /// let outcome = AddOutcome::Added {
    ///     entity_name: "Ada Byron".into(),
    ///     list_name: "Partners".into(),
    /// };
    /// let notice = Notice::for_placement(Placement::Add, &outcome);
    /// assert_eq!(notice.kind, NoticeKind::Success);
    /// assert_eq!(notice.message, r#"Added Ada Byron to "Partners""#);
    /// ```
    pub fn for_placement(placement: Placement, outcome: &AddOutcome) -> Self {
        match outcome {
            AddOutcome::Added {
                entity_name,
                list_name,
            } => Self::success(format!(
                "{} {entity_name} to \"{list_name}\"",
                placement.verb()
            )),
            AddOutcome::AlreadyPresent {
                entity_name,
                list_name,
            } => Self::info(format!("{entity_name} is already in \"{list_name}\"")),
        }
    }

    /// Notice after mentions were written into the editor.
    pub fn inserted(count: usize) -> Self {
        Self::success(format!("Inserted {count} tag(s)"))
    }
}

impl From<&TagListError> for Notice {
    fn from(error: &TagListError) -> Self {
        match error {
            TagListError::ListNotFound { .. } => Self::error("List not found"),
            TagListError::DefaultListProtected => Self::error("The default list cannot be deleted"),
            TagListError::EmptyListName => Self::error("Please enter a list name"),
            TagListError::CorruptRecord { .. } => {
                Self::error("Could not save changes. Please try again.")
            }
            TagListError::Store(err) => Self::from(err),
        }
    }
}
