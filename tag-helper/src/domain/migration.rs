//! Upgrade of the persisted record from the legacy flat `users` array.
//!
//! Planning is pure: [`plan_migration`] inspects a raw record and decides
//! what has to be written. [`crate::domain::ListStore`] executes the plan
//! once per execution context and only remembers the migration as done
//! after the write succeeded.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use super::entity::{Entity, LinkedInUser};
use super::error::TagListError;
use super::ports::StoredRecord;
use super::storage_root::{keys, to_record_value};
use super::tag_list::{ListId, TagList};

/// Keys inspected to decide whether a migration is needed.
pub const MIGRATION_KEYS: [&str; 2] = [keys::LISTS, keys::LEGACY_USERS];

/// What has to happen to bring a record up to the list-based schema.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationPlan {
    /// `lists` already present; nothing to write.
    Current {
        /// A `users` key survived an earlier migration whose removal failed.
        stale_legacy_users: bool,
    },
    /// Nothing stored yet: seed the empty default list.
    Seed {
        /// Single write creating the default list and selecting it.
        writes: StoredRecord,
    },
    /// Legacy users found: wrap them into the default list.
    UpgradeLegacy {
        /// Single write creating the populated default list and selecting it.
        writes: StoredRecord,
        /// Number of users that landed in the default list.
        migrated: usize,
        /// Legacy entries dropped because they were not valid user records.
        skipped: usize,
        /// Valid legacy entries dropped because an earlier entry had the
        /// same member id.
        duplicates: usize,
    },
}

impl MigrationPlan {
    /// Entries to write, if any.
    pub fn writes(&self) -> Option<&StoredRecord> {
        match self {
            Self::Current { .. } => None,
            Self::Seed { writes } | Self::UpgradeLegacy { writes, .. } => Some(writes),
        }
    }

    /// Whether the legacy `users` key must be removed once writes succeed.
    pub fn removes_legacy_users(&self) -> bool {
        match self {
            Self::Current { stale_legacy_users } => *stale_legacy_users,
            Self::Seed { .. } => false,
            Self::UpgradeLegacy { .. } => true,
        }
    }
}

/// Decide how to migrate `record`.
///
/// - `lists` present: [`MigrationPlan::Current`].
/// - `users` holds an array: [`MigrationPlan::UpgradeLegacy`] with every
///   valid entry tagged as a user in a default list named `General`. Only
///   the first entry per member id is kept.
/// - otherwise: [`MigrationPlan::Seed`].
///
/// # Errors
///
/// [`TagListError::CorruptRecord`] if the new lists cannot be serialised.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use tag_helper::domain::ports::StoredRecord;
/// use tag_helper::domain::{MigrationPlan, plan_migration};
///
/// let plan = plan_migration(&StoredRecord::new(), Utc::now()).expect("plan");
/// assert!(matches!(plan, MigrationPlan::Seed { .. }));
/// ```
pub fn plan_migration(
    record: &StoredRecord,
    now: DateTime<Utc>,
) -> Result<MigrationPlan, TagListError> {
    let legacy = record.get(keys::LEGACY_USERS).filter(|value| !value.is_null());

    if record.get(keys::LISTS).is_some_and(|value| !value.is_null()) {
        return Ok(MigrationPlan::Current {
            stale_legacy_users: legacy.is_some(),
        });
    }

    let Some(Value::Array(entries)) = legacy else {
        let writes = default_list_writes(TagList::default_list(now))?;
        return Ok(MigrationPlan::Seed { writes });
    };

    let mut skipped = 0_usize;
    let users: Vec<Entity> = entries
        .iter()
        .enumerate()
        .filter_map(
            |(index, entry)| match serde_json::from_value::<LinkedInUser>(entry.clone()) {
                Ok(user) => Some(Entity::User(user)),
                Err(err) => {
                    warn!(index, error = %err, "skipping malformed legacy user");
                    skipped += 1;
                    None
                }
            },
        )
        .collect();
    let valid = users.len();

    let general = TagList::default_list(now).with_entities(users);
    let migrated = general.len();
    let duplicates = valid - migrated;
    if duplicates > 0 {
        warn!(duplicates, "dropping legacy users with repeated member ids");
    }

    let writes = default_list_writes(general)?;
    Ok(MigrationPlan::UpgradeLegacy {
        writes,
        migrated,
        skipped,
        duplicates,
    })
}

fn default_list_writes(list: TagList) -> Result<StoredRecord, TagListError> {
    let mut writes = StoredRecord::new();
    writes.insert(keys::LISTS.to_owned(), to_record_value(keys::LISTS, &[list])?);
    writes.insert(
        keys::SELECTED_LIST_ID.to_owned(),
        to_record_value(keys::SELECTED_LIST_ID, &ListId::default_list())?,
    );
    Ok(writes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StorageRoot;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0)
            .single()
            .expect("valid fixed time")
    }

    fn record(value: Value) -> StoredRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn root_after(plan: &MigrationPlan, now: DateTime<Utc>) -> StorageRoot {
        let writes = plan.writes().expect("plan writes");
        StorageRoot::from_record(writes, now).expect("root from writes")
    }

    #[rstest]
    fn current_record_is_left_alone(now: DateTime<Utc>) {
        let plan = plan_migration(&record(json!({ "lists": [] })), now).expect("plan");
        assert_eq!(
            plan,
            MigrationPlan::Current {
                stale_legacy_users: false
            }
        );
        assert!(plan.writes().is_none());
        assert!(!plan.removes_legacy_users());
    }

    #[rstest]
    fn stale_users_next_to_lists_are_scheduled_for_removal(now: DateTime<Utc>) {
        let plan = plan_migration(&record(json!({ "lists": [], "users": [] })), now)
            .expect("plan");
        assert!(plan.writes().is_none());
        assert!(plan.removes_legacy_users());
    }

    #[rstest]
    fn empty_record_seeds_default_list(now: DateTime<Utc>) {
        let plan = plan_migration(&StoredRecord::new(), now).expect("plan");
        assert!(matches!(plan, MigrationPlan::Seed { .. }));
        assert!(!plan.removes_legacy_users());

        let root = root_after(&plan, now);
        assert_eq!(root.lists.len(), 1);
        assert!(root.selected_list_id.is_default());
        assert!(root.lists.first().is_some_and(TagList::is_empty));
    }

    #[rstest]
    fn legacy_users_are_tagged_into_general(now: DateTime<Utc>) {
        let raw = record(json!({
            "users": [
                {"entityUrn": "u1", "memberId": "1", "displayName": "Ada Byron"},
                {"entityUrn": "u2", "memberId": "2", "displayName": "Grace Hopper"},
                {"entityUrn": "u3", "memberId": "3", "displayName": "Edsger Dijkstra"}
            ]
        }));

        let plan = plan_migration(&raw, now).expect("plan");
        assert!(matches!(
            plan,
            MigrationPlan::UpgradeLegacy {
                migrated: 3,
                skipped: 0,
                duplicates: 0,
                ..
            }
        ));
        assert!(plan.removes_legacy_users());

        let root = root_after(&plan, now);
        let general = root.selected_list().expect("default list selected");
        assert_eq!(general.name, "General");
        assert_eq!(general.len(), 3);
        assert!(
            general
                .entities()
                .iter()
                .all(|entity| matches!(entity, Entity::User(_)))
        );
    }

    #[rstest]
    fn malformed_legacy_entries_are_skipped(now: DateTime<Utc>) {
        let raw = record(json!({
            "users": [
                {"entityUrn": "u1", "memberId": "1", "displayName": "Ada Byron"},
                {"memberId": 5},
                "nonsense"
            ]
        }));

        let plan = plan_migration(&raw, now).expect("plan");
        assert!(matches!(
            plan,
            MigrationPlan::UpgradeLegacy {
                migrated: 1,
                skipped: 2,
                duplicates: 0,
                ..
            }
        ));
    }

    #[rstest]
    fn repeated_member_ids_are_counted_as_duplicates(now: DateTime<Utc>) {
        let raw = record(json!({
            "users": [
                {"entityUrn": "u1", "memberId": "1", "displayName": "Ada Byron"},
                {"entityUrn": "u2", "memberId": "2", "displayName": "Grace Hopper"},
                {"entityUrn": "u1b", "memberId": "1", "displayName": "Ada Lovelace"}
            ]
        }));

        let plan = plan_migration(&raw, now).expect("plan");
        assert!(matches!(
            plan,
            MigrationPlan::UpgradeLegacy {
                migrated: 2,
                skipped: 0,
                duplicates: 1,
                ..
            }
        ));

        let general = root_after(&plan, now)
            .selected_list()
            .cloned()
            .expect("default list selected");
        assert_eq!(general.len(), 2);
        let names: Vec<&str> = general.entities().iter().map(Entity::display_name).collect();
        assert_eq!(names, ["Ada Byron", "Grace Hopper"]);
    }

    #[rstest]
    fn planning_reads_only_the_keys_it_inspects() {
        assert_eq!(MIGRATION_KEYS, [keys::LISTS, keys::LEGACY_USERS]);
    }

    #[rstest]
    fn non_array_users_counts_as_absent(now: DateTime<Utc>) {
        let plan = plan_migration(&record(json!({ "users": "legacy" })), now).expect("plan");
        assert!(matches!(plan, MigrationPlan::Seed { .. }));
    }
}
