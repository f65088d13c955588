//! Export layouts, determinism and file name clashes.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use sync_core::{ChangeType, EventGate, HandlerMeta, Progress};
use sync_store::{Entity, EntityStore, entity_handler};
use sync_test_utils::{Site, SyncFixture};
use uuid::Uuid;

#[rstest]
#[case::flat_alias(false, true, &["about.config", "contact.config", "home.config", "post.config"])]
#[case::tree_alias(false, false, &["contact.config", "home.config", "blog/post.config", "home/about.config"])]
fn export_follows_layout(#[case] guid_names: bool, #[case] flat: bool, #[case] expected: &[&str]) {
    let fixture = SyncFixture::with_layout(guid_names, flat);
    Site::seed(&fixture.store);

    let actions = fixture.export_all();

    assert!(actions.iter().all(|a| a.success && a.change == ChangeType::Export));
    assert_eq!(fixture.document_files(), expected);
}

#[test]
fn flat_guid_layout_names_files_by_key() {
    let fixture = SyncFixture::with_layout(true, true);
    Site::seed(&fixture.store);

    fixture.export_all();

    fixture.assert_file_exists(&format!("{}.config", Site::HOME));
    fixture.assert_file_exists(&format!("{}.config", Site::POST));
    assert_eq!(fixture.document_files().len(), 4);
}

#[test]
fn export_walks_containers_then_items_depth_first() {
    let (fixture, _site) = SyncFixture::seeded();

    let names: Vec<_> = fixture.export_all().into_iter().map(|a| a.name).collect();

    assert_eq!(names, ["First post", "Home", "About us", "Contact"]);
}

#[test]
fn export_is_deterministic() {
    let (fixture, _site) = SyncFixture::seeded();
    fixture.export_all();
    let first = std::fs::read_to_string(fixture.path("post.config").to_native()).unwrap();

    fixture.export_all();
    let second = std::fs::read_to_string(fixture.path("post.config").to_native()).unwrap();

    assert_eq!(first, second);
    assert!(first.ends_with('\n'));
}

#[test]
fn export_never_removes_files() {
    let (fixture, _site) = SyncFixture::seeded();
    fixture.export_all();
    fixture.store.delete(Site::CONTACT).unwrap();

    fixture.export_all();

    fixture.assert_file_exists("contact.config");
}

#[test]
fn clashing_aliases_get_key_suffix() {
    let fixture = SyncFixture::new();
    let first = Uuid::parse_str("aaaaaaaa-0000-4000-8000-000000000001").unwrap();
    let second = Uuid::parse_str("bbbbbbbb-0000-4000-8000-000000000002").unwrap();
    fixture.store.save(&Entity::new("Entity", "dup").with_key(first)).unwrap();
    fixture.store.save(&Entity::new("Entity", "dup").with_key(second)).unwrap();

    fixture.export_all();

    assert_eq!(fixture.document_files(), ["dup.config", "dup_bbbbbbbb.config"]);
    assert_eq!(fixture.read_doc("dup.config").key(), first);
    assert_eq!(fixture.read_doc("dup_bbbbbbbb.config").key(), second);

    // re-export keeps both files where they are
    fixture.export_all();
    assert_eq!(fixture.document_files().len(), 2);
}

#[test]
fn export_key_reports_missing_items() {
    let fixture = SyncFixture::new();

    let action = fixture.handler.export_key(Uuid::new_v4(), &fixture.folder());

    assert!(!action.success);
    assert_eq!(action.change, ChangeType::Fail);
    assert_eq!(action.message.as_deref(), Some("Item not found"));
}

#[test]
fn export_key_writes_one_document() {
    let (fixture, _site) = SyncFixture::seeded();

    let action = fixture.handler.export_key(Site::ABOUT, &fixture.folder());

    assert_eq!(action.change, ChangeType::Export);
    assert_eq!(action.key, Some(Site::ABOUT));
    assert_eq!(fixture.document_files(), ["about.config"]);
}

#[test]
fn export_filter_skips_items() {
    let store = Arc::new(EntityStore::in_memory());
    Site::seed(&store);
    let meta = HandlerMeta::new("entityHandler", "Entities", "entities", "Entity");
    let handler = entity_handler(store, meta, true, Arc::new(EventGate::new()))
        .unwrap()
        .with_export_filter(|item: &Entity, _| item.alias != "contact");
    let temp = tempfile::TempDir::new().unwrap();
    let folder = sync_fs::NormalizedPath::new(temp.path());

    let actions = handler.export_all(&folder, &mut Progress::none());

    let contact = actions.iter().find(|a| a.name == "Contact").unwrap();
    assert_eq!(contact.message.as_deref(), Some("Not exported (based on config)"));
    assert!(!folder.join("contact.config").exists());
}
