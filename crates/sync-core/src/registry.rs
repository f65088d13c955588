//! Handler registry and sync service
//!
//! Handlers are registered once at startup as [`SyncHandler`] trait objects
//! and resolved by alias or by the entity type they handle. The
//! [`SyncService`] runs an operation across every handler enabled for it,
//! each against its own folder under the sync root.

use std::sync::Arc;

use sync_fs::NormalizedPath;
use uuid::Uuid;

use crate::action::SyncAction;
use crate::dependency::{Dependency, DependencyFlags};
use crate::events::EventGate;
use crate::handler::{EntitySource, Handler, HandlerMeta};
use crate::progress::Progress;
use crate::serializer::Serializer;
use crate::settings::{HandlerAction, HandlerSettings, SyncSettings};
use crate::{Error, Result};

/// Type-erased view of a [`Handler`].
pub trait SyncHandler {
    fn meta(&self) -> &HandlerMeta;

    fn settings(&self) -> HandlerSettings;

    /// Pick up new settings between runs.
    fn reload(&self, settings: &SyncSettings);

    fn import_all(&self, folder: &NormalizedPath, force: bool, progress: &mut Progress<'_>) -> Vec<SyncAction>;

    fn import_file(&self, file: &NormalizedPath, force: bool) -> Vec<SyncAction>;

    fn export_all(&self, folder: &NormalizedPath, progress: &mut Progress<'_>) -> Vec<SyncAction>;

    fn export_key(&self, key: Uuid, folder: &NormalizedPath) -> SyncAction;

    fn report(&self, folder: &NormalizedPath, progress: &mut Progress<'_>) -> Vec<SyncAction>;

    fn report_file(&self, file: &NormalizedPath) -> Vec<SyncAction>;

    fn dependencies(&self, key: Uuid, flags: &DependencyFlags) -> Result<Vec<Dependency>>;

    fn write_clean_marker(&self, parent_key: Uuid, folder: &NormalizedPath) -> Result<NormalizedPath>;
}

impl<S, E> SyncHandler for Handler<S, E>
where
    S: Serializer,
    E: EntitySource<Item = S::Item>,
{
    fn meta(&self) -> &HandlerMeta {
        Handler::meta(self)
    }

    fn settings(&self) -> HandlerSettings {
        Handler::settings(self)
    }

    fn reload(&self, settings: &SyncSettings) {
        let alias = Handler::meta(self).alias.clone();
        self.set_settings(settings.handler_settings(&alias));
        tracing::debug!(%alias, "handler settings reloaded");
    }

    fn import_all(&self, folder: &NormalizedPath, force: bool, progress: &mut Progress<'_>) -> Vec<SyncAction> {
        Handler::import_all(self, folder, force, progress)
    }

    fn import_file(&self, file: &NormalizedPath, force: bool) -> Vec<SyncAction> {
        Handler::import_file(self, file, force)
    }

    fn export_all(&self, folder: &NormalizedPath, progress: &mut Progress<'_>) -> Vec<SyncAction> {
        Handler::export_all(self, folder, progress)
    }

    fn export_key(&self, key: Uuid, folder: &NormalizedPath) -> SyncAction {
        Handler::export_key(self, key, folder)
    }

    fn report(&self, folder: &NormalizedPath, progress: &mut Progress<'_>) -> Vec<SyncAction> {
        Handler::report(self, folder, progress)
    }

    fn report_file(&self, file: &NormalizedPath) -> Vec<SyncAction> {
        Handler::report_file(self, file)
    }

    fn dependencies(&self, key: Uuid, flags: &DependencyFlags) -> Result<Vec<Dependency>> {
        Handler::dependencies(self, key, flags)
    }

    fn write_clean_marker(&self, parent_key: Uuid, folder: &NormalizedPath) -> Result<NormalizedPath> {
        Handler::write_clean_marker(self, parent_key, folder)
    }
}

/// Registered handlers, kept ordered by priority then alias.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn SyncHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler.
    ///
    /// # Errors
    ///
    /// Returns `Error::HandlerInit` if the alias is already registered.
    pub fn register(&mut self, handler: Box<dyn SyncHandler>) -> Result<()> {
        let alias = handler.meta().alias.clone();
        if self.handlers.iter().any(|h| h.meta().alias == alias) {
            return Err(Error::HandlerInit {
                message: format!("handler '{alias}' is already registered"),
            });
        }
        self.handlers.push(handler);
        self.handlers.sort_by(|a, b| {
            (a.meta().priority, &a.meta().alias).cmp(&(b.meta().priority, &b.meta().alias))
        });
        tracing::debug!(%alias, "handler registered");
        Ok(())
    }

    pub fn get(&self, alias: &str) -> Result<&dyn SyncHandler> {
        self.handlers
            .iter()
            .find(|h| h.meta().alias == alias)
            .map(|h| h.as_ref())
            .ok_or_else(|| Error::UnknownHandler {
                name: alias.to_string(),
            })
    }

    pub fn by_entity_type(&self, entity_type: &str) -> Result<&dyn SyncHandler> {
        self.handlers
            .iter()
            .find(|h| h.meta().entity_type.eq_ignore_ascii_case(entity_type))
            .map(|h| h.as_ref())
            .ok_or_else(|| Error::UnknownHandler {
                name: entity_type.to_string(),
            })
    }

    /// Resolve by alias first, then by entity type.
    pub fn resolve(&self, name: &str) -> Result<&dyn SyncHandler> {
        self.get(name).or_else(|_| self.by_entity_type(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SyncHandler> {
        self.handlers.iter().map(|h| h.as_ref())
    }

    /// Handlers enabled for `action`, in run order.
    pub fn enabled_for(&self, action: HandlerAction) -> impl Iterator<Item = &dyn SyncHandler> {
        self.iter().filter(move |h| h.settings().is_enabled_for(action))
    }

    pub fn aliases(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.meta().alias.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Runs handler operations against a sync root.
pub struct SyncService {
    root: NormalizedPath,
    registry: HandlerRegistry,
    gate: Arc<EventGate>,
}

impl SyncService {
    pub fn new(root: impl Into<NormalizedPath>, registry: HandlerRegistry, gate: Arc<EventGate>) -> Self {
        Self {
            root: root.into(),
            registry,
            gate,
        }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &Arc<EventGate> {
        &self.gate
    }

    /// Folder a handler reads and writes under the sync root.
    pub fn handler_folder(&self, handler: &dyn SyncHandler) -> NormalizedPath {
        self.root.join(&handler.meta().default_folder)
    }

    /// Handlers to run: the named one, or every handler enabled for `action`.
    ///
    /// A named handler that is disabled for `action` is skipped.
    fn selected(&self, handler: Option<&str>, action: HandlerAction) -> Result<Vec<&dyn SyncHandler>> {
        match handler {
            Some(name) => {
                let handler = self.registry.resolve(name)?;
                if handler.settings().is_enabled_for(action) {
                    Ok(vec![handler])
                } else {
                    tracing::info!(alias = %handler.meta().alias, ?action, "handler disabled for action");
                    Ok(Vec::new())
                }
            }
            None => Ok(self.registry.enabled_for(action).collect()),
        }
    }

    pub fn report(&self, handler: Option<&str>, progress: &mut Progress<'_>) -> Result<Vec<SyncAction>> {
        let mut actions = Vec::new();
        for handler in self.selected(handler, HandlerAction::Report)? {
            actions.extend(handler.report(&self.handler_folder(handler), progress));
        }
        Ok(actions)
    }

    pub fn import_all(
        &self,
        handler: Option<&str>,
        force: bool,
        progress: &mut Progress<'_>,
    ) -> Result<Vec<SyncAction>> {
        let _paused = self.gate.pause();
        let mut actions = Vec::new();
        for handler in self.selected(handler, HandlerAction::Import)? {
            actions.extend(handler.import_all(&self.handler_folder(handler), force, progress));
        }
        Ok(actions)
    }

    pub fn export_all(&self, handler: Option<&str>, progress: &mut Progress<'_>) -> Result<Vec<SyncAction>> {
        let _paused = self.gate.pause();
        let mut actions = Vec::new();
        for handler in self.selected(handler, HandlerAction::Export)? {
            actions.extend(handler.export_all(&self.handler_folder(handler), progress));
        }
        Ok(actions)
    }

    pub fn export_key(&self, handler: &str, key: Uuid) -> Result<SyncAction> {
        let handler = self.registry.resolve(handler)?;
        Ok(handler.export_key(key, &self.handler_folder(handler)))
    }

    pub fn dependencies(&self, handler: &str, key: Uuid, flags: &DependencyFlags) -> Result<Vec<Dependency>> {
        self.registry.resolve(handler)?.dependencies(key, flags)
    }

    pub fn write_clean_marker(&self, handler: &str, parent_key: Uuid) -> Result<NormalizedPath> {
        let handler = self.registry.resolve(handler)?;
        handler.write_clean_marker(parent_key, &self.handler_folder(handler))
    }

    /// Push new settings to every handler.
    pub fn reload(&self, settings: &SyncSettings) {
        for handler in self.registry.iter() {
            handler.reload(settings);
        }
    }
}
