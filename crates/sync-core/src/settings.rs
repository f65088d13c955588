//! Sync settings parsed from `sync.toml`
//!
//! Global values apply to every handler. A handler set overrides them per
//! handler alias; [`SyncSettings::handler_settings`] resolves the two into
//! the flat [`HandlerSettings`] a handler runs with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sync_fs::{ConfigStore, NormalizedPath};

use crate::Result;

fn default_root_folder() -> String {
    "usync".to_string()
}

fn default_set() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_actions() -> Vec<HandlerAction> {
    vec![HandlerAction::All]
}

/// Operation a handler can be enabled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerAction {
    Report,
    Import,
    Export,
    /// Live-system save/move/delete events
    Save,
    All,
}

/// Per-handler entries of a handler set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerOverrides {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_actions")]
    pub actions: Vec<HandlerAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid_names: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_structure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_save: Option<bool>,
}

impl Default for HandlerOverrides {
    fn default() -> Self {
        Self {
            enabled: true,
            actions: default_actions(),
            guid_names: None,
            flat_structure: None,
            batch_save: None,
        }
    }
}

/// A named group of handler overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerSet {
    #[serde(default)]
    pub handlers: BTreeMap<String, HandlerOverrides>,
}

/// Contents of `sync.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Folder under which every handler's default folder lives
    #[serde(default = "default_root_folder")]
    pub root_folder: String,

    /// Name files by key instead of alias
    #[serde(default)]
    pub guid_names: bool,

    /// One folder level per handler instead of mirroring containers
    #[serde(default = "default_true")]
    pub flat_structure: bool,

    /// Defer saves to one bulk save per folder
    #[serde(default)]
    pub batch_save: bool,

    #[serde(default = "default_set")]
    pub default_set: String,

    #[serde(default)]
    pub handler_sets: BTreeMap<String, HandlerSet>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            root_folder: default_root_folder(),
            guid_names: false,
            flat_structure: true,
            batch_save: false,
            default_set: default_set(),
            handler_sets: BTreeMap::new(),
        }
    }
}

impl SyncSettings {
    /// Parse settings from TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        let settings: SyncSettings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Load settings from `path` (toml, json or yaml), or defaults when the
    /// file does not exist.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load_or_default(path)?)
    }

    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        Ok(ConfigStore::new().save(path, self)?)
    }

    /// Resolved settings for `alias` in the default handler set.
    pub fn handler_settings(&self, alias: &str) -> HandlerSettings {
        self.handler_settings_in(&self.default_set, alias)
    }

    /// Resolved settings for `alias` in `set`.
    ///
    /// A handler the set does not mention runs enabled for every action
    /// with the global values.
    pub fn handler_settings_in(&self, set: &str, alias: &str) -> HandlerSettings {
        let overrides = self
            .handler_sets
            .get(set)
            .and_then(|s| s.handlers.get(alias))
            .cloned()
            .unwrap_or_else(|| {
                tracing::debug!(set, alias, "handler not in set, using global settings");
                HandlerOverrides::default()
            });

        HandlerSettings {
            alias: alias.to_string(),
            enabled: overrides.enabled,
            actions: overrides.actions,
            guid_names: overrides.guid_names.unwrap_or(self.guid_names),
            flat_structure: overrides.flat_structure.unwrap_or(self.flat_structure),
            batch_save: overrides.batch_save.unwrap_or(self.batch_save),
        }
    }
}

/// Settings one handler runs with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerSettings {
    pub alias: String,
    pub enabled: bool,
    pub actions: Vec<HandlerAction>,
    pub guid_names: bool,
    pub flat_structure: bool,
    pub batch_save: bool,
}

impl HandlerSettings {
    /// Global defaults for a handler.
    pub fn defaults(alias: &str) -> Self {
        SyncSettings::default().handler_settings(alias)
    }

    pub fn is_enabled_for(&self, action: HandlerAction) -> bool {
        self.enabled
            && self
                .actions
                .iter()
                .any(|a| *a == HandlerAction::All || *a == action)
    }
}
