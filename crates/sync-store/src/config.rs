//! Handler definitions
//!
//! Which entity types get a handler is read from the `[[handlers]]` tables of
//! `sync.toml`, next to the sync settings:
//!
//! ```toml
//! [[handlers]]
//! alias = "pageHandler"
//! name = "Pages"
//! folder = "pages"
//! entity_type = "Page"
//! priority = 100
//! two_pass = true
//! ```
//!
//! Without any `[[handlers]]` table a single handler for `Entity` is used.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sync_core::{EventGate, HandlerMeta, HandlerRegistry, SyncHandler, SyncSettings};
use sync_fs::{ConfigStore, NormalizedPath};

use crate::handler::entity_handler;
use crate::store::EntityStore;

/// One configured handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerDefinition {
    pub alias: String,
    pub name: String,
    pub folder: String,
    pub entity_type: String,

    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Resolve links after every document in the folder is imported
    #[serde(default = "default_true")]
    pub two_pass: bool,

    #[serde(default)]
    pub icon: String,

    #[serde(default)]
    pub group: String,
}

fn default_priority() -> i32 {
    1000
}

fn default_true() -> bool {
    true
}

impl HandlerDefinition {
    pub fn meta(&self) -> HandlerMeta {
        HandlerMeta::new(&self.alias, &self.name, &self.folder, &self.entity_type)
            .with_priority(self.priority)
            .with_icon(&self.icon)
            .with_group(&self.group)
    }
}

impl Default for HandlerDefinition {
    fn default() -> Self {
        Self {
            alias: "entityHandler".into(),
            name: "Entities".into(),
            folder: "entities".into(),
            entity_type: "Entity".into(),
            priority: 100,
            two_pass: true,
            icon: String::new(),
            group: String::new(),
        }
    }
}

/// Handler section of `sync.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub handlers: Vec<HandlerDefinition>,
}

impl StoreConfig {
    /// Load handler definitions, or none when the file does not exist.
    pub fn load(path: &NormalizedPath) -> sync_core::Result<Self> {
        Ok(ConfigStore::new().load_or_default(path)?)
    }

    /// Configured definitions, or the single default one.
    pub fn definitions(&self) -> Vec<HandlerDefinition> {
        if self.handlers.is_empty() {
            vec![HandlerDefinition::default()]
        } else {
            self.handlers.clone()
        }
    }

    /// Registry with one handler per definition, each loaded with its
    /// settings from `settings`.
    ///
    /// # Errors
    ///
    /// Fails on an incomplete definition or a duplicate alias.
    pub fn build_registry(
        &self,
        store: Arc<EntityStore>,
        settings: &SyncSettings,
        gate: Arc<EventGate>,
    ) -> sync_core::Result<HandlerRegistry> {
        let mut registry = HandlerRegistry::new();
        for definition in self.definitions() {
            let handler = entity_handler(store.clone(), definition.meta(), definition.two_pass, gate.clone())?;
            handler.reload(settings);
            registry.register(Box::new(handler))?;
        }
        tracing::debug!(handlers = registry.len(), "registry built");
        Ok(registry)
    }
}
