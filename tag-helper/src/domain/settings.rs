//! Global display settings persisted under the `settings` key.

use serde::{Deserialize, Serialize};

/// How mentions are shortened when inserted into a post.
///
/// Missing fields fall back to their defaults so records written by older
/// builds, which only knew `nameWordLimit`, still load.
///
/// # Examples
/// ```
/// use tag_helper::domain::Settings;
///
/// let settings: Settings = serde_json::from_str(r#"{"nameWordLimit": 2}"#).expect("valid settings");
/// assert_eq!(settings.name_word_limit, 2);
/// assert!(settings.truncate_org_names);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Number of words kept from each display name; `0` keeps the full name.
    pub name_word_limit: u32,
    /// Whether the word limit also applies to organisation names.
    ///
    /// Defaults to `true`, so a stored record without the field shortens
    /// organisation names like member names. Builds that predate the field
    /// never shortened them; set it to `false` to keep that behaviour.
    pub truncate_org_names: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name_word_limit: 0,
            truncate_org_names: true,
        }
    }
}

impl Settings {
    /// Word limit to apply to user display names.
    pub fn user_word_limit(&self) -> usize {
        usize::try_from(self.name_word_limit).unwrap_or(usize::MAX)
    }

    /// Word limit to apply to organisation display names.
    pub fn org_word_limit(&self) -> usize {
        if self.truncate_org_names {
            self.user_word_limit()
        } else {
            0
        }
    }
}
