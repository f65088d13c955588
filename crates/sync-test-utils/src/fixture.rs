//! [`SyncFixture`] builder for handler test scenarios.

use std::sync::Arc;

use sync_core::{Document, EventGate, HandlerMeta, HandlerSettings, Progress, SyncAction};
use sync_fs::NormalizedPath;
use sync_store::{EntityHandler, EntityStore, entity_handler};
use tempfile::TempDir;

use crate::site::{ENTITY_TYPE, Site};

/// A temporary sync root with a store-backed handler and helper methods for
/// test setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use sync_test_utils::SyncFixture;
///
/// let (fixture, _site) = SyncFixture::seeded();
/// fixture.export_all();
/// fixture.assert_file_exists("home.config");
/// ```
pub struct SyncFixture {
    temp_dir: TempDir,
    pub store: Arc<EntityStore>,
    pub gate: Arc<EventGate>,
    pub handler: EntityHandler,
}

impl Default for SyncFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncFixture {
    pub const ALIAS: &'static str = "entityHandler";
    pub const FOLDER: &'static str = "entities";

    /// Empty store, flat alias-named layout, two-pass codec.
    pub fn new() -> Self {
        Self::with_layout(false, true)
    }

    pub fn with_layout(guid_names: bool, flat_structure: bool) -> Self {
        let temp_dir = TempDir::new().expect("SyncFixture: failed to create temp dir");
        let store = Arc::new(EntityStore::in_memory());
        let gate = Arc::new(EventGate::new());
        let handler = Self::build_handler(store.clone(), gate.clone());
        let fixture = Self {
            temp_dir,
            store,
            gate,
            handler,
        };
        fixture.update_settings(|s| {
            s.guid_names = guid_names;
            s.flat_structure = flat_structure;
        });
        fixture
    }

    /// Flat alias-named fixture seeded with [`Site`].
    pub fn seeded() -> (Self, Site) {
        let fixture = Self::new();
        let site = Site::seed(&fixture.store);
        (fixture, site)
    }

    fn build_handler(store: Arc<EntityStore>, gate: Arc<EventGate>) -> EntityHandler {
        let meta = HandlerMeta::new(Self::ALIAS, "Entities", Self::FOLDER, ENTITY_TYPE).with_priority(100);
        entity_handler(store, meta, true, gate).expect("SyncFixture: failed to build handler")
    }

    /// Handler over a fresh empty store with this fixture's settings, for
    /// importing what this fixture exported.
    pub fn sibling(&self) -> (Arc<EntityStore>, EntityHandler) {
        let store = Arc::new(EntityStore::in_memory());
        let handler = Self::build_handler(store.clone(), Arc::new(EventGate::new()));
        handler.set_settings(self.handler.settings());
        (store, handler)
    }

    pub fn update_settings(&self, update: impl FnOnce(&mut HandlerSettings)) {
        let mut settings = self.handler.settings();
        update(&mut settings);
        self.handler.set_settings(settings);
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> NormalizedPath {
        NormalizedPath::new(self.temp_dir.path())
    }

    /// The handler's document folder.
    pub fn folder(&self) -> NormalizedPath {
        self.root().join("usync").join(Self::FOLDER)
    }

    /// Path of `relative` inside the handler folder.
    pub fn path(&self, relative: &str) -> NormalizedPath {
        self.folder().join(relative)
    }

    pub fn export_all(&self) -> Vec<SyncAction> {
        self.handler.export_all(&self.folder(), &mut Progress::none())
    }

    pub fn import_all(&self, force: bool) -> Vec<SyncAction> {
        self.handler.import_all(&self.folder(), force, &mut Progress::none())
    }

    pub fn report(&self) -> Vec<SyncAction> {
        self.handler.report(&self.folder(), &mut Progress::none())
    }

    /// Write `doc` at `relative` inside the handler folder.
    pub fn write_doc(&self, relative: &str, doc: &Document) -> NormalizedPath {
        let path = self.path(relative);
        doc.save(&path)
            .unwrap_or_else(|e| panic!("Could not write document {path}: {e}"));
        path
    }

    /// Write raw text at `relative` inside the handler folder.
    pub fn write_raw(&self, relative: &str, content: &str) -> NormalizedPath {
        let path = self.path(relative);
        sync_fs::io::write_text(&path, content)
            .unwrap_or_else(|e| panic!("Could not write file {path}: {e}"));
        path
    }

    pub fn read_doc(&self, relative: &str) -> Document {
        let path = self.path(relative);
        Document::load(&path).unwrap_or_else(|e| panic!("Could not read document {path}: {e}"))
    }

    /// Every document file under the handler folder, relative to it, in
    /// walk order.
    pub fn document_files(&self) -> Vec<String> {
        let folder = self.folder();
        sync_fs::io::list_files_recursive(&folder, "config")
            .expect("SyncFixture: failed to list documents")
            .iter()
            .map(|file| {
                file.as_str()
                    .strip_prefix(folder.as_str())
                    .unwrap_or(file.as_str())
                    .trim_start_matches('/')
                    .to_string()
            })
            .collect()
    }

    /// Assert that `relative` exists inside the handler folder.
    ///
    /// # Panics
    /// Panics with a descriptive message if the file does not exist.
    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(
            path.exists(),
            "Expected file to exist: {path}\nFiles: {:?}",
            self.document_files()
        );
    }

    /// Assert that `relative` does **not** exist inside the handler folder.
    ///
    /// # Panics
    /// Panics with a descriptive message if the file exists.
    pub fn assert_file_not_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(!path.exists(), "Expected file NOT to exist: {path}");
    }
}
