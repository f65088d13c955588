//! A settings file drives two handlers over file-backed stores.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use sync_core::{ActionSummary, ChangeType, EventGate, Progress, SyncService, SyncSettings};
use sync_fs::NormalizedPath;
use sync_store::{Entity, EntityStore, StoreConfig};
use sync_test_utils::Site;
use tempfile::TempDir;
use uuid::Uuid;

const LOGO: Uuid = Uuid::from_u128(0x3000);

const SYNC_TOML: &str = r#"
batch_save = true

[[handlers]]
alias = "entityHandler"
name = "Entities"
folder = "entities"
entity_type = "Entity"
priority = 100

[[handlers]]
alias = "mediaHandler"
name = "Media"
folder = "media"
entity_type = "Media"
priority = 10
"#;

struct SyncRoot {
    temp: TempDir,
    config: NormalizedPath,
}

impl SyncRoot {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config = NormalizedPath::new(temp.path()).join("sync.toml");
        std::fs::write(config.to_native(), SYNC_TOML).unwrap();
        Self { temp, config }
    }

    fn root(&self) -> NormalizedPath {
        NormalizedPath::new(self.temp.path())
    }

    fn open(&self, store_file: &str) -> (Arc<EntityStore>, SyncService) {
        let settings = SyncSettings::load(&self.config).unwrap();
        let store = Arc::new(EntityStore::open(self.root().join(store_file)).unwrap());
        let gate = Arc::new(EventGate::new());
        let registry = StoreConfig::load(&self.config)
            .unwrap()
            .build_registry(store.clone(), &settings, gate.clone())
            .unwrap();
        let service = SyncService::new(self.root().join(&settings.root_folder), registry, gate);
        (store, service)
    }
}

#[test]
fn media_first_then_entities_between_file_stores() {
    let sync_root = SyncRoot::new();
    {
        let (store, service) = sync_root.open("source.json");
        Site::seed(&store);
        store
            .save(&Entity::new("Media", "logo").with_key(LOGO).with_property("width", json!(120)))
            .unwrap();
        let mut home = store.get(Site::HOME).unwrap();
        home.links.insert("logo".into(), LOGO);
        store.save(&home).unwrap();

        let exported = service.export_all(None, &mut Progress::none()).unwrap();
        assert_eq!(exported[0].name, "logo");
        assert_eq!(ActionSummary::of(&exported).count(ChangeType::Export), 5);
    }

    let (store, service) = sync_root.open("target.json");
    let imported = service.import_all(None, false, &mut Progress::none()).unwrap();

    let summary = ActionSummary::of(&imported);
    assert!(!summary.has_failures(), "{imported:#?}");
    assert_eq!(summary.count(ChangeType::Create), 5);
    assert!(store.bulk_save_count() > 0);
    // the post's container is the only single save
    assert_eq!(store.save_count(), 1);

    let reopened = EntityStore::open(sync_root.root().join("target.json")).unwrap();
    assert_eq!(reopened.get(Site::HOME).unwrap().links["logo"], LOGO);
    assert_eq!(reopened.get(Site::POST).unwrap().links["related"], Site::ABOUT);
    assert_eq!(reopened.get(LOGO).unwrap().properties["width"], json!(120));
}

#[test]
fn report_only_handler_is_left_out_of_imports() {
    let sync_root = SyncRoot::new();
    std::fs::write(
        sync_root.config.to_native(),
        format!("{SYNC_TOML}\n[handler_sets.default.handlers.mediaHandler]\nactions = [\"Report\"]\n"),
    )
    .unwrap();
    {
        let (store, service) = sync_root.open("source.json");
        store.save(&Entity::new("Media", "logo").with_key(LOGO)).unwrap();
        let exported = service.export_all(None, &mut Progress::none()).unwrap();
        assert!(exported.is_empty());
    }

    let (store, service) = sync_root.open("target.json");
    let exported = service.export_all(Some("Media"), &mut Progress::none()).unwrap();
    assert!(exported.is_empty());
    let imported = service.import_all(None, false, &mut Progress::none()).unwrap();

    assert!(imported.is_empty());
    assert!(store.is_empty());
}
