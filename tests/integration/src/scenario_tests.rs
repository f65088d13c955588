//! End-to-end scenarios between a source store that exports and a target
//! store that imports the same document folder.

use pretty_assertions::assert_eq;
use sync_core::{ChangeType, Progress, SyncAction};
use sync_store::Entity;
use sync_test_utils::{Site, SyncFixture};
use uuid::Uuid;

const A: Uuid = Uuid::from_u128(0xa);
const B: Uuid = Uuid::from_u128(0xb);

fn changes(actions: &[SyncAction]) -> Vec<(&str, ChangeType)> {
    actions.iter().map(|a| (a.name.as_str(), a.change)).collect()
}

fn remove(fixture: &SyncFixture, relative: &str) {
    std::fs::remove_file(fixture.path(relative).to_native()).unwrap();
}

#[test]
fn forward_reference_resolves_and_second_import_is_quiet() {
    let fixture = SyncFixture::new();
    fixture
        .store
        .save(&Entity::new("Entity", "b").with_key(B))
        .unwrap();
    fixture
        .store
        .save(&Entity::new("Entity", "a").with_key(A).with_link("next", B))
        .unwrap();
    fixture.export_all();
    let (target, handler) = fixture.sibling();

    let first = handler.import_all(&fixture.folder(), false, &mut Progress::none());

    assert!(first.iter().all(|a| a.success), "{first:#?}");
    assert_eq!(changes(&first), vec![("a", ChangeType::Create), ("b", ChangeType::Create)]);
    assert_eq!(target.get(A).unwrap().links["next"], B);

    let second = handler.import_all(&fixture.folder(), false, &mut Progress::none());

    assert_eq!(changes(&second), vec![("a", ChangeType::NoChange), ("b", ChangeType::NoChange)]);
}

#[test]
fn clean_marker_removes_children_without_documents() {
    let fixture = SyncFixture::with_layout(false, false);
    let parent = fixture.store.save(&Entity::new("Entity", "p")).unwrap();
    let x = fixture
        .store
        .save(&Entity::new("Entity", "x").with_parent(parent.key))
        .unwrap();
    let y = fixture
        .store
        .save(&Entity::new("Entity", "y").with_parent(parent.key))
        .unwrap();
    fixture.export_all();
    remove(&fixture, "p/x.config");
    fixture
        .handler
        .write_clean_marker(parent.key, &fixture.folder())
        .unwrap();

    let report = fixture.report();

    let pending = report
        .iter()
        .find(|a| a.key == Some(x.key))
        .expect("x is reported");
    assert_eq!(pending.change, ChangeType::Delete);
    assert_eq!(pending.message.as_deref(), Some("Will be removed by clean"));
    assert!(fixture.store.get(x.key).is_some());

    let imported = fixture.import_all(false);

    assert!(imported.iter().all(|a| a.success), "{imported:#?}");
    assert!(fixture.store.get(x.key).is_none());
    assert!(fixture.store.get(y.key).is_some());
    assert!(fixture.store.get(parent.key).is_some());
}

#[test]
fn deletes_travel_as_markers() {
    let (source, site) = SyncFixture::seeded();
    source.export_all();
    let (target, handler) = source.sibling();
    handler.import_all(&source.folder(), false, &mut Progress::none());
    assert!(target.get(Site::CONTACT).is_some());

    source.store.delete(Site::CONTACT).unwrap();
    source.handler.on_deleted(&[site.contact.clone()], &source.folder());
    let actions = handler.import_all(&source.folder(), false, &mut Progress::none());

    let delete = actions.iter().find(|a| a.name == "contact").unwrap();
    assert_eq!(delete.change, ChangeType::Delete);
    assert!(delete.success);
    assert!(target.get(Site::CONTACT).is_none());
    assert!(target.get(Site::HOME).is_some());
}

#[test]
fn renames_travel_with_a_marker_left_behind() {
    let (source, site) = SyncFixture::seeded();
    source.export_all();
    let (target, handler) = source.sibling();
    handler.import_all(&source.folder(), false, &mut Progress::none());

    let mut renamed = site.home.clone();
    renamed.alias = "start".into();
    let renamed = source.store.save(&renamed).unwrap();
    source.handler.on_saved(&[renamed], &source.folder());
    let actions = handler.import_all(&source.folder(), false, &mut Progress::none());

    assert!(actions.iter().all(|a| a.success), "{actions:#?}");
    assert_eq!(target.get(Site::HOME).unwrap().alias, "start");
    assert_eq!(target.get(Site::ABOUT).unwrap().parent, Some(Site::HOME));
}

#[test]
fn tree_layout_round_trips_between_stores() {
    let source = SyncFixture::with_layout(false, false);
    Site::seed(&source.store);
    source.export_all();
    let (target, handler) = source.sibling();

    let actions = handler.import_all(&source.folder(), false, &mut Progress::none());

    assert_eq!(
        actions.iter().filter(|a| a.change == ChangeType::Create).count(),
        4,
        "{actions:#?}"
    );
    let post = target.get(Site::POST).unwrap();
    let blog = target.get(post.parent.unwrap()).unwrap();
    assert!(blog.is_container());
    assert_eq!(blog.name, "blog");

    let again = handler.report(&source.folder(), &mut Progress::none());
    assert!(again.iter().all(|a| a.change == ChangeType::NoChange), "{again:#?}");
}
