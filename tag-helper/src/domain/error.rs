//! Errors raised by the list store and the mutation service.
//!
//! Duplicates are not errors: adding an entity that is already in a list is
//! reported through [`crate::domain::AddOutcome::AlreadyPresent`].

use thiserror::Error;

use super::ports::KeyValueStoreError;
use super::tag_list::ListId;

/// Failure of a list store read or a list mutation.
///
/// In every case the persisted state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagListError {
    /// No list has the requested id.
    #[error("list '{list_id}' was not found")]
    ListNotFound {
        /// Id that failed to resolve.
        list_id: ListId,
    },

    /// The default list can be renamed or cleared but never deleted.
    #[error("the default list cannot be deleted")]
    DefaultListProtected,

    /// List names must contain something other than whitespace.
    #[error("list name must not be blank")]
    EmptyListName,

    /// A stored key holds a value of the wrong shape.
    #[error("stored value under '{key}' is malformed: {message}")]
    CorruptRecord {
        /// Offending key.
        key: String,
        /// Parser message.
        message: String,
    },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] KeyValueStoreError),
}

impl TagListError {
    /// Convenience constructor for [`TagListError::ListNotFound`].
    pub fn list_not_found(list_id: ListId) -> Self {
        Self::ListNotFound { list_id }
    }

    /// Convenience constructor for [`TagListError::CorruptRecord`].
    pub fn corrupt_record(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        TagListError::list_not_found(ListId::new("list_x")),
        "list 'list_x' was not found"
    )]
    #[case(TagListError::DefaultListProtected, "the default list cannot be deleted")]
    #[case(TagListError::EmptyListName, "list name must not be blank")]
    #[case(
        TagListError::corrupt_record("lists", "expected a sequence"),
        "stored value under 'lists' is malformed: expected a sequence"
    )]
    #[case(
        TagListError::from(KeyValueStoreError::write("disk full")),
        "key-value store write failed: disk full"
    )]
    fn errors_format_for_logs(#[case] error: TagListError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
