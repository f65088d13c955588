//! Classification of documents against live state, through `report_file`.

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use sync_core::{ChangeType, ContentDocument, Document, MarkerDocument, Serializer, SyncActionType};
use sync_test_utils::{Site, SyncFixture};
use uuid::Uuid;

enum Incoming {
    Unchanged,
    Renamed,
    Unknown,
    DeleteExisting,
    DeleteMissing,
    Rename,
    Clean,
}

fn document(fixture: &SyncFixture, incoming: Incoming) -> Document {
    let home = fixture.read_doc("home.config");
    match incoming {
        Incoming::Unchanged => home,
        Incoming::Renamed => {
            let mut content = home.as_content().cloned().unwrap();
            content.body["Info"]["Name"] = json!("Home sweet home");
            content.into()
        }
        Incoming::Unknown => ContentDocument::new("Entity", Uuid::new_v4(), "brand-new", 0).into(),
        Incoming::DeleteExisting => MarkerDocument::new(Site::CONTACT, "contact", SyncActionType::Delete).into(),
        Incoming::DeleteMissing => MarkerDocument::new(Uuid::new_v4(), "gone", SyncActionType::Delete).into(),
        Incoming::Rename => MarkerDocument::new(Site::HOME, "old-home", SyncActionType::Rename).into(),
        Incoming::Clean => MarkerDocument::new(Uuid::nil(), "", SyncActionType::Clean).into(),
    }
}

#[rstest]
#[case::unchanged(Incoming::Unchanged, ChangeType::NoChange)]
#[case::changed(Incoming::Renamed, ChangeType::Update)]
#[case::unknown(Incoming::Unknown, ChangeType::Create)]
#[case::delete_existing(Incoming::DeleteExisting, ChangeType::Delete)]
#[case::delete_missing(Incoming::DeleteMissing, ChangeType::NoChange)]
#[case::rename_marker(Incoming::Rename, ChangeType::NoChange)]
#[case::clean_marker(Incoming::Clean, ChangeType::Delete)]
fn report_classifies_documents(#[case] incoming: Incoming, #[case] expected: ChangeType) {
    let (fixture, _site) = SyncFixture::seeded();
    fixture.export_all();
    let doc = document(&fixture, incoming);
    let file = fixture.write_doc("incoming/document.config", &doc);

    let actions = fixture.handler.report_file(&file);

    assert_eq!(actions[0].change, expected);
    assert!(actions[0].success);
}

#[test]
fn classification_never_writes() {
    let (fixture, site) = SyncFixture::seeded();
    fixture.export_all();
    let mut content = fixture.read_doc("home.config").as_content().cloned().unwrap();
    content.body["Properties"]["title"] = json!("Changed");
    fixture.write_doc("home.config", &content.into());
    fixture.store.reset_counters();

    let actions = fixture.report();

    assert!(actions.iter().any(|a| a.change == ChangeType::Update));
    assert_eq!(fixture.store.save_count(), 0);
    assert_eq!(fixture.store.get(Site::HOME).unwrap(), site.home);
}

#[test]
fn report_carries_change_details() {
    let (fixture, _site) = SyncFixture::seeded();
    fixture.export_all();
    let mut content = fixture.read_doc("home.config").as_content().cloned().unwrap();
    content.body["Properties"]["title"] = json!("Changed");
    let file = fixture.write_doc("home.config", &content.into());

    let actions = fixture.handler.report_file(&file);

    let detail = &actions[0].details[0];
    assert_eq!(detail.path, "Body.Properties.title");
    assert_eq!(detail.old_value.as_deref(), Some("Welcome"));
    assert_eq!(detail.new_value.as_deref(), Some("Changed"));
}

#[test]
fn internal_id_differences_are_not_changes() {
    let (fixture, _site) = SyncFixture::seeded();
    fixture.export_all();
    let mut content = fixture.read_doc("home.config").as_content().cloned().unwrap();
    content.body["Info"]["InternalId"] = json!(4242);
    let doc: Document = content.into();

    assert_eq!(
        fixture.handler.serializer().is_current(Some(&doc)).unwrap(),
        ChangeType::NoChange
    );
}

#[test]
fn wrong_type_is_reported_as_failure() {
    let (fixture, _site) = SyncFixture::seeded();
    let doc: Document = ContentDocument::new("Media", Uuid::new_v4(), "logo", 0).into();
    let file = fixture.write_doc("logo.config", &doc);

    let actions = fixture.handler.report_file(&file);

    assert!(!actions[0].success);
    assert_eq!(actions[0].change, ChangeType::Fail);
}

#[rstest]
#[case::delete_marker(Incoming::DeleteExisting, "Change details not calculated")]
#[case::new_item(Incoming::Unknown, "Create")]
fn changes_without_details_say_so_unless_created(#[case] incoming: Incoming, #[case] expected: &str) {
    let (fixture, _site) = SyncFixture::seeded();
    fixture.export_all();
    let doc = document(&fixture, incoming);
    let file = fixture.write_doc("incoming/document.config", &doc);

    let actions = fixture.handler.report_file(&file);

    assert_eq!(actions[0].message.as_deref(), Some(expected));
}
