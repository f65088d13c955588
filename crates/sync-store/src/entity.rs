//! Stored entities

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Whether an entity holds content or only groups other entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[default]
    Item,
    /// Folder-like grouping with no content of its own
    Container,
}

/// One entity in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub key: Uuid,
    pub alias: String,
    pub name: String,
    pub entity_type: String,

    #[serde(default)]
    pub kind: EntityKind,

    /// Parent item or container; `None` at the root
    #[serde(default)]
    pub parent: Option<Uuid>,

    #[serde(default)]
    pub sort_order: i32,

    #[serde(default)]
    pub properties: BTreeMap<String, Value>,

    /// Named references to other entities
    #[serde(default)]
    pub links: BTreeMap<String, Uuid>,

    /// Store-assigned row id. Differs between stores holding the same
    /// entity, so it never takes part in change detection.
    #[serde(default)]
    pub internal_id: u64,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            key: Uuid::new_v4(),
            name: alias.clone(),
            alias,
            entity_type: entity_type.into(),
            kind: EntityKind::Item,
            parent: None,
            sort_order: 0,
            properties: BTreeMap::new(),
            links: BTreeMap::new(),
            internal_id: 0,
        }
    }

    pub fn container(entity_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Container,
            ..Self::new(entity_type, name)
        }
    }

    pub fn with_key(mut self, key: Uuid) -> Self {
        self.key = key;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_parent(mut self, parent: Uuid) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_link(mut self, name: impl Into<String>, target: Uuid) -> Self {
        self.links.insert(name.into(), target);
        self
    }

    pub fn is_container(&self) -> bool {
        self.kind == EntityKind::Container
    }
}
