//! Handler orchestrator
//!
//! A [`Handler`] binds one [`Serializer`] and one [`EntitySource`] to a
//! folder of documents. It walks that folder depth-first in sorted order,
//! drives classification and the two-pass import over every file, and
//! turns every outcome, including errors, into a [`SyncAction`]. No single
//! file can abort a walk.

mod clean;
mod events;
mod export;
mod import;
mod report;

use std::sync::{Arc, RwLock};

use sync_fs::NormalizedPath;
use uuid::Uuid;

use crate::action::SyncAction;
use crate::change::ChangeType;
use crate::dependency::{Dependency, DependencyChecker, DependencyFlags, DependencyOrder, dedupe_and_order};
use crate::document::Document;
use crate::events::EventGate;
use crate::paths;
use crate::serializer::Serializer;
use crate::settings::HandlerSettings;
use crate::tracker::{ChangeTracker, DiffTracker};
use crate::{Error, Result};

pub use import::FolderImport;

/// Live-tree access for one item type.
pub trait EntitySource {
    type Item;

    /// Item by key; `None` for unknown keys and for containers.
    fn get(&self, key: Uuid) -> Result<Option<Self::Item>>;

    /// Items directly under `parent` (`None` for the root), sorted.
    fn children(&self, parent: Option<Uuid>) -> Result<Vec<Self::Item>>;

    /// Container keys directly under `parent`, for item types organised
    /// in folders.
    fn containers(&self, _parent: Option<Uuid>) -> Result<Vec<Uuid>> {
        Ok(Vec::new())
    }

    fn delete(&self, item: &Self::Item) -> Result<()>;

    /// Relative document path of an item, without extension.
    fn item_path(&self, item: &Self::Item, use_guid: bool, flat: bool) -> Result<String>;

    /// Display name used in reported actions.
    fn item_name(&self, item: &Self::Item) -> String;
}

/// Static description of a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMeta {
    pub alias: String,
    pub name: String,
    /// Folder under the sync root holding this handler's documents
    pub default_folder: String,
    /// Lower priorities run first
    pub priority: i32,
    pub icon: String,
    pub group: String,
    /// Type tag of the documents this handler reads and writes
    pub entity_type: String,
}

impl HandlerMeta {
    pub fn new(
        alias: impl Into<String>,
        name: impl Into<String>,
        default_folder: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            name: name.into(),
            default_folder: default_folder.into(),
            priority: 1000,
            icon: String::new(),
            group: String::new(),
            entity_type: entity_type.into(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Fails when a field the handler cannot run without is empty.
    pub fn validate(&self) -> Result<()> {
        let missing = [
            ("alias", &self.alias),
            ("default folder", &self.default_folder),
            ("entity type", &self.entity_type),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());

        match missing {
            Some((field, _)) => Err(Error::HandlerInit {
                message: format!("handler '{}' has no {field}", self.name),
            }),
            None => Ok(()),
        }
    }
}

type ImportFilter = Box<dyn Fn(&Document, &HandlerSettings) -> bool>;
type ExportFilter<T> = Box<dyn Fn(&T, &HandlerSettings) -> bool>;

/// Per-item-type orchestrator over a folder of documents.
pub struct Handler<S, E>
where
    S: Serializer,
    E: EntitySource<Item = S::Item>,
{
    meta: HandlerMeta,
    serializer: S,
    source: E,
    gate: Arc<EventGate>,
    settings: RwLock<HandlerSettings>,
    tracker: Box<dyn ChangeTracker>,
    dependency_checker: Option<Box<dyn DependencyChecker<S::Item>>>,
    import_filter: Option<ImportFilter>,
    export_filter: Option<ExportFilter<S::Item>>,
}

impl<S, E> Handler<S, E>
where
    S: Serializer,
    E: EntitySource<Item = S::Item>,
{
    /// Create a handler with default settings for its alias.
    ///
    /// # Errors
    ///
    /// Returns `Error::HandlerInit` when the metadata is incomplete or the
    /// serializer writes a different type tag than the metadata declares.
    pub fn new(meta: HandlerMeta, serializer: S, source: E, gate: Arc<EventGate>) -> Result<Self> {
        meta.validate()?;
        if serializer.item_type() != meta.entity_type {
            return Err(Error::HandlerInit {
                message: format!(
                    "handler '{}' declares {} but its serializer writes {}",
                    meta.alias,
                    meta.entity_type,
                    serializer.item_type()
                ),
            });
        }

        let settings = HandlerSettings::defaults(&meta.alias);
        tracing::debug!(alias = %meta.alias, "handler created");
        Ok(Self {
            meta,
            serializer,
            source,
            gate,
            settings: RwLock::new(settings),
            tracker: Box::new(DiffTracker),
            dependency_checker: None,
            import_filter: None,
            export_filter: None,
        })
    }

    pub fn with_tracker(mut self, tracker: impl ChangeTracker + 'static) -> Self {
        self.tracker = Box::new(tracker);
        self
    }

    pub fn with_dependency_checker(
        mut self,
        checker: impl DependencyChecker<S::Item> + 'static,
    ) -> Self {
        self.dependency_checker = Some(Box::new(checker));
        self
    }

    pub fn with_settings(self, settings: HandlerSettings) -> Self {
        self.set_settings(settings);
        self
    }

    /// Documents rejected by `filter` are reported as not imported.
    pub fn with_import_filter(
        mut self,
        filter: impl Fn(&Document, &HandlerSettings) -> bool + 'static,
    ) -> Self {
        self.import_filter = Some(Box::new(filter));
        self
    }

    /// Items rejected by `filter` are reported as not exported.
    pub fn with_export_filter(
        mut self,
        filter: impl Fn(&S::Item, &HandlerSettings) -> bool + 'static,
    ) -> Self {
        self.export_filter = Some(Box::new(filter));
        self
    }

    pub fn meta(&self) -> &HandlerMeta {
        &self.meta
    }

    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    pub fn source(&self) -> &E {
        &self.source
    }

    pub fn gate(&self) -> &Arc<EventGate> {
        &self.gate
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> HandlerSettings {
        self.settings
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Replace the settings used by subsequent runs.
    pub fn set_settings(&self, settings: HandlerSettings) {
        match self.settings.write() {
            Ok(mut guard) => *guard = settings,
            Err(poisoned) => *poisoned.into_inner() = settings,
        }
    }

    /// This handler's folder under a sync root.
    pub fn folder_in(&self, root: &NormalizedPath) -> NormalizedPath {
        root.join(&self.meta.default_folder)
    }

    /// Document path of `item` under `folder` for the current settings.
    pub fn item_file(&self, item: &S::Item, folder: &NormalizedPath) -> Result<NormalizedPath> {
        let settings = self.settings();
        let item_path = self
            .source
            .item_path(item, settings.guid_names, settings.flat_structure)?;
        paths::get_path(
            folder,
            &item_path,
            self.serializer.item_key(item),
            settings.guid_names,
            settings.flat_structure,
        )
    }

    /// Dependencies of the item with `key`, or of everything under the
    /// container with `key` when no such item exists.
    pub fn dependencies(&self, key: Uuid, flags: &DependencyFlags) -> Result<Vec<Dependency>> {
        match self.source.get(key)? {
            Some(item) => Ok(dedupe_and_order(self.item_dependencies(&item, flags)?)),
            None => self.container_dependencies(Some(key), flags),
        }
    }

    /// Union of the dependencies of every item under `parent`, recursing
    /// through sub-containers and child items.
    pub fn container_dependencies(
        &self,
        parent: Option<Uuid>,
        flags: &DependencyFlags,
    ) -> Result<Vec<Dependency>> {
        let mut all = Vec::new();
        for container in self.source.containers(parent)? {
            all.extend(self.container_dependencies(Some(container), flags)?);
        }
        for item in self.source.children(parent)? {
            all.extend(self.item_dependencies(&item, flags)?);
            let key = self.serializer.item_key(&item);
            all.extend(self.container_dependencies(Some(key), flags)?);
        }
        Ok(dedupe_and_order(all))
    }

    fn item_dependencies(&self, item: &S::Item, flags: &DependencyFlags) -> Result<Vec<Dependency>> {
        let own = Dependency::new(
            self.serializer.item_key(item),
            self.source.item_name(item),
            DependencyOrder::Item,
            self.serializer.item_type(),
        );
        match &self.dependency_checker {
            Some(checker) if !flags.no_dependencies => checker.dependencies(item, flags),
            _ => Ok(vec![own]),
        }
    }

    fn failed_action(&self, file: &NormalizedPath, error: &Error) -> SyncAction {
        let name = file.file_stem().unwrap_or(file.as_str());
        tracing::debug!(%file, %error, "file failed");
        SyncAction::failed(
            &self.meta.alias,
            &self.meta.entity_type,
            name,
            file,
            error.to_string(),
        )
    }

    fn action(&self, success: bool, change: ChangeType, name: impl Into<String>) -> SyncAction {
        SyncAction::new(success, &self.meta.alias, &self.meta.entity_type, change, name)
    }
}
