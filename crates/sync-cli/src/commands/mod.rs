//! Command implementations for sync-cli

pub mod deps;
pub mod handlers;
pub mod output;
pub mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use sync_core::{EventGate, SyncService, SyncSettings};
use sync_fs::NormalizedPath;
use sync_store::{EntityStore, StoreConfig};

use crate::error::{CliError, Result};

pub use deps::run_deps;
pub use handlers::run_handlers;
pub use sync::{run_clean_marker, run_export, run_export_item, run_import, run_report};

/// Where the store, settings and documents live
#[derive(Debug, Clone)]
pub struct Location {
    pub root: PathBuf,
    pub store: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// An opened store with a service over its sync folder
pub struct Workspace {
    pub store: Arc<EntityStore>,
    pub service: SyncService,
    handler: Option<String>,
}

impl Workspace {
    /// Open the store and build one handler per configured definition.
    ///
    /// Handlers read and write below `<root>/<root_folder>`.
    pub fn open(location: &Location, handler: Option<String>) -> Result<Self> {
        let root = NormalizedPath::new(&location.root);
        let config = location
            .config
            .as_ref()
            .map(NormalizedPath::new)
            .unwrap_or_else(|| root.join("sync.toml"));
        let store_path = location
            .store
            .as_ref()
            .map(NormalizedPath::new)
            .unwrap_or_else(|| root.join("store.json"));

        let settings = SyncSettings::load(&config)?;
        let definitions = StoreConfig::load(&config)?;
        let store = Arc::new(EntityStore::open(store_path)?);
        let gate = Arc::new(EventGate::new());
        let registry = definitions.build_registry(store.clone(), &settings, gate.clone())?;

        tracing::debug!(
            root = %root,
            config = %config,
            entities = store.len(),
            handlers = registry.len(),
            "workspace opened"
        );

        Ok(Self {
            store,
            service: SyncService::new(root.join(&settings.root_folder), registry, gate),
            handler,
        })
    }

    /// Handler filter for whole-folder runs.
    pub fn handler_filter(&self) -> Option<&str> {
        self.handler.as_deref()
    }

    /// Handler for single-entity commands: the selected one, or the only
    /// configured one.
    pub fn single_handler(&self) -> Result<String> {
        if let Some(handler) = &self.handler {
            return Ok(handler.clone());
        }
        match self.service.registry().aliases().as_slice() {
            [only] => Ok((*only).to_string()),
            aliases => Err(CliError::user(format!(
                "Several handlers are configured ({}); pick one with --handler",
                aliases.join(", ")
            ))),
        }
    }
}
