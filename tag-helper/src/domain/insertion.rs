//! Turns a list's entities into insertable mention text.

use mention_format::{MentionStyle, join_mentions, render_mention, truncate_words};

use super::entity::Entity;
use super::settings::Settings;

/// The name used for `entity` once the word limit is applied.
///
/// Organisation names are only shortened when
/// [`Settings::truncate_org_names`] is set.
pub fn mention_name(entity: &Entity, settings: &Settings) -> String {
    let limit = match entity {
        Entity::User(_) => settings.user_word_limit(),
        Entity::Org(_) => settings.org_word_limit(),
    };
    truncate_words(entity.display_name(), limit).into_owned()
}

/// Render every entity in order and join the mentions with `", "`.
///
/// # Examples
/// ```
/// use mention_format::MentionStyle;
/// use tag_helper::domain::{Entity, LinkedInUser, Settings, render_mentions};
///
/// let ada = Entity::User(LinkedInUser {
///     entity_urn: "urn:li:fsd_profile:ada".into(),
///     member_id: "1".into(),
///     display_name: "Ada Lovelace Byron".into(),
/// });
/// let settings = Settings { name_word_limit: 1, ..Settings::default() };
///
/// assert_eq!(render_mentions(&[ada], &settings, MentionStyle::PlainText), "Ada");
/// ```
pub fn render_mentions(entities: &[Entity], settings: &Settings, style: MentionStyle) -> String {
    join_mentions(
        entities
            .iter()
            .map(|entity| render_mention(&mention_name(entity, settings), style)),
    )
}
