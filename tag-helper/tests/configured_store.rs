//! File-backed contexts built from settings keep lists across restarts.

use std::fs;
use std::time::Duration;

use rstest::rstest;
use serde_json::json;
use tag_helper::ExtensionContext;
use tag_helper::config::ExtensionSettings;
use tag_helper::domain::{Entity, LinkedInUser, ListId, keys};
use tag_helper::outbound::storage::STORAGE_FILE_NAME;
use tempfile::TempDir;

fn settings(dir: &TempDir) -> ExtensionSettings {
    ExtensionSettings {
        storage_dir: Some(dir.path().join("store")),
        notice_ttl_ms: Some(1500),
        json_logs: false,
    }
}

#[rstest]
#[tokio::test]
async fn lists_survive_reopening_the_store() {
    let dir = TempDir::new().expect("tempdir");
    let settings = settings(&dir);

    let partners = {
        let context = ExtensionContext::from_settings(&settings).expect("open store");
        assert_eq!(context.notice_ttl(), Duration::from_millis(1500));
        let service = context.service();
        let partners = service.create_list("Partners").await.expect("create");
        service
            .add_entity(
                &partners,
                Entity::User(LinkedInUser {
                    entity_urn: "urn:li:fsd_profile:ada".to_owned(),
                    member_id: "1".to_owned(),
                    display_name: "Ada Byron".to_owned(),
                }),
            )
            .await
            .expect("add");
        partners
    };

    let reopened = ExtensionContext::from_settings(&settings).expect("reopen store");
    let root = reopened.service().snapshot().await.expect("snapshot");
    assert_eq!(root.selected_list_id, partners);
    assert_eq!(root.list(&partners).map(|list| list.len()), Some(1));
}

#[rstest]
#[tokio::test]
async fn legacy_file_is_migrated_in_place() {
    let dir = TempDir::new().expect("tempdir");
    let settings = settings(&dir);
    let store_dir = dir.path().join("store");
    fs::create_dir_all(&store_dir).expect("store dir");
    let legacy = json!({
        "users": [
            { "entityUrn": "urn:li:fsd_profile:1", "memberId": "1", "displayName": "Ada Byron" },
            { "memberId": "2" }
        ]
    });
    fs::write(store_dir.join(STORAGE_FILE_NAME), legacy.to_string()).expect("write legacy");

    let context = ExtensionContext::from_settings(&settings).expect("open store");
    let root = context.service().snapshot().await.expect("snapshot");
    let general = root.list(&ListId::default_list()).expect("general list");
    assert_eq!(general.len(), 1);

    let on_disk: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(store_dir.join(STORAGE_FILE_NAME)).expect("read store"),
    )
    .expect("parse store");
    assert!(on_disk.get(keys::LEGACY_USERS).is_none());
    assert!(on_disk.get(keys::LISTS).is_some());
}
