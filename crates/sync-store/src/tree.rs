//! Live tree view of one entity type

use std::sync::Arc;

use sync_core::paths::safe_alias;
use sync_core::{EntitySource, Result};
use uuid::Uuid;

use crate::entity::{Entity, EntityKind};
use crate::store::EntityStore;

/// [`EntitySource`] over the items of one type in an [`EntityStore`]
#[derive(Debug, Clone)]
pub struct EntityTree {
    store: Arc<EntityStore>,
    entity_type: String,
}

impl EntityTree {
    pub fn new(store: Arc<EntityStore>, entity_type: impl Into<String>) -> Self {
        Self {
            store,
            entity_type: entity_type.into(),
        }
    }

    fn segment(entity: &Entity, use_guid: bool) -> String {
        if entity.is_container() {
            safe_alias(&entity.name)
        } else if use_guid {
            entity.key.to_string()
        } else {
            safe_alias(&entity.alias)
        }
    }
}

impl EntitySource for EntityTree {
    type Item = Entity;

    fn get(&self, key: Uuid) -> Result<Option<Entity>> {
        Ok(self
            .store
            .get(key)
            .filter(|e| e.kind == EntityKind::Item && e.entity_type == self.entity_type))
    }

    fn children(&self, parent: Option<Uuid>) -> Result<Vec<Entity>> {
        Ok(self.store.children(&self.entity_type, parent, EntityKind::Item))
    }

    fn containers(&self, parent: Option<Uuid>) -> Result<Vec<Uuid>> {
        Ok(self
            .store
            .children(&self.entity_type, parent, EntityKind::Container)
            .into_iter()
            .map(|c| c.key)
            .collect())
    }

    fn delete(&self, item: &Entity) -> Result<()> {
        self.store.delete(item.key)?;
        Ok(())
    }

    /// Flat layouts use the item's own segment. Tree layouts prefix it with
    /// one folder per ancestor, containers by name and items by alias or key.
    fn item_path(&self, item: &Entity, use_guid: bool, flat: bool) -> Result<String> {
        let own = Self::segment(item, use_guid);
        if flat {
            return Ok(own);
        }
        let mut segments: Vec<String> = self
            .store
            .ancestors(item.key)
            .iter()
            .map(|a| Self::segment(a, use_guid))
            .collect();
        segments.push(own);
        Ok(segments.join("/"))
    }

    fn item_name(&self, item: &Entity) -> String {
        item.name.clone()
    }
}
