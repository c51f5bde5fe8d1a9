//! LinkedIn references that can be collected into tag lists.
//!
//! An [`Entity`] is either a member profile ([`LinkedInUser`]) or a company
//! page ([`LinkedInOrg`]). Persisted and wire forms carry a `type`
//! discriminator (`"user"` / `"org"`) next to camelCase fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A LinkedIn member profile.
///
/// Legacy records were stored without a `type` tag, so this struct also
/// deserialises on its own and ignores a stray `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInUser {
    /// Opaque profile token, e.g. `ACoAAC3QO04B_cj1GBS_KpigIvRd-45ynFE6eHM`.
    pub entity_urn: String,
    /// Stable numeric member identifier; source of the dedupe key.
    pub member_id: String,
    /// Name shown on the profile.
    pub display_name: String,
}

/// A LinkedIn company page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInOrg {
    /// Stable numeric company identifier; source of the dedupe key.
    pub company_id: String,
    /// URL slug from `/company/<slug>/`.
    pub universal_name: String,
    /// Name shown on the company page.
    pub display_name: String,
}

/// A collectible reference.
///
/// # Examples
/// ```
/// use tag_helper::domain::{Entity, LinkedInUser};
///
/// let entity = Entity::User(LinkedInUser {
///     entity_urn: "ACoAAA".to_owned(),
///     member_id: "42".to_owned(),
///     display_name: "Ada Byron".to_owned(),
/// });
/// assert_eq!(entity.dedupe_key().as_ref(), "user:42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    /// Member profile.
    User(LinkedInUser),
    /// Company page.
    Org(LinkedInOrg),
}

impl Entity {
    /// Key used to enforce per-list uniqueness.
    pub fn dedupe_key(&self) -> DedupeKey {
        match self {
            Self::User(user) => DedupeKey(format!("user:{}", user.member_id)),
            Self::Org(org) => DedupeKey(format!("org:{}", org.company_id)),
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &str {
        match self {
            Self::User(user) => user.display_name.as_str(),
            Self::Org(org) => org.display_name.as_str(),
        }
    }

    /// Identifier shown beside the name in list views: the member id for
    /// users and the URL slug for organisations.
    pub fn display_id(&self) -> &str {
        match self {
            Self::User(user) => user.member_id.as_str(),
            Self::Org(org) => org.universal_name.as_str(),
        }
    }

    /// Short label for the variant.
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::User(_) => "User",
            Self::Org(_) => "Org",
        }
    }

    /// Borrow the user payload when this is a [`Entity::User`].
    pub const fn as_user(&self) -> Option<&LinkedInUser> {
        match self {
            Self::User(user) => Some(user),
            Self::Org(_) => None,
        }
    }
}

impl From<LinkedInUser> for Entity {
    fn from(value: LinkedInUser) -> Self {
        Self::User(value)
    }
}

impl From<LinkedInOrg> for Entity {
    fn from(value: LinkedInOrg) -> Self {
        Self::Org(value)
    }
}

/// Uniqueness key of an entity within one list: `user:<memberId>` or
/// `org:<companyId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupeKey(String);

impl AsRef<str> for DedupeKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Serde helpers for the legacy `users` arrays.
///
/// Entries are written with a `"type": "user"` tag so that readers expecting
/// either shape accept them, and read back whether or not the tag is there.
pub(crate) mod tagged_users {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::LinkedInUser;

    #[derive(Serialize)]
    struct TaggedUser<'a> {
        #[serde(rename = "type")]
        kind: &'static str,
        #[serde(flatten)]
        user: &'a LinkedInUser,
    }

    pub(crate) fn serialize<S>(users: &[LinkedInUser], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(users.len()))?;
        for user in users {
            seq.serialize_element(&TaggedUser { kind: "user", user })?;
        }
        seq.end()
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<LinkedInUser>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Vec::<LinkedInUser>::deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn ada() -> Entity {
        Entity::User(LinkedInUser {
            entity_urn: "ACoAAC3QO04B".to_owned(),
            member_id: "1".to_owned(),
            display_name: "Ada Byron".to_owned(),
        })
    }

    fn acme() -> Entity {
        Entity::Org(LinkedInOrg {
            company_id: "9".to_owned(),
            universal_name: "acme".to_owned(),
            display_name: "Acme Inc".to_owned(),
        })
    }

    #[rstest]
    #[case(ada(), "user:1")]
    #[case(acme(), "org:9")]
    fn dedupe_key_is_prefixed_by_variant(#[case] entity: Entity, #[case] expected: &str) {
        assert_eq!(entity.dedupe_key().to_string(), expected);
    }

    #[rstest]
    fn user_and_org_with_same_number_do_not_collide() {
        let org = Entity::Org(LinkedInOrg {
            company_id: "1".to_owned(),
            universal_name: "one".to_owned(),
            display_name: "One".to_owned(),
        });
        assert_ne!(ada().dedupe_key(), org.dedupe_key());
    }

    #[rstest]
    #[case(ada(), "1", "User")]
    #[case(acme(), "acme", "Org")]
    fn display_metadata_follows_variant(
        #[case] entity: Entity,
        #[case] display_id: &str,
        #[case] label: &str,
    ) {
        assert_eq!(entity.display_id(), display_id);
        assert_eq!(entity.type_label(), label);
    }

    #[rstest]
    fn entity_serialises_with_type_tag_and_camel_case() {
        let value = serde_json::to_value(acme()).expect("serialise org");
        assert_eq!(
            value,
            json!({
                "type": "org",
                "companyId": "9",
                "universalName": "acme",
                "displayName": "Acme Inc",
            })
        );
    }

    #[rstest]
    fn untagged_legacy_user_deserialises_as_user() {
        let user: LinkedInUser = serde_json::from_value(json!({
            "entityUrn": "ACoAAC3QO04B",
            "memberId": "1",
            "displayName": "Ada Byron",
        }))
        .expect("legacy user parses");
        assert_eq!(Entity::from(user), ada());
    }

    #[rstest]
    fn unknown_entity_type_is_rejected() {
        let result = serde_json::from_value::<Entity>(json!({
            "type": "group",
            "displayName": "Rustaceans",
        }));
        assert!(result.is_err());
    }
}
