//! JSON-file entity store
//!
//! The whole store is one JSON document, rewritten atomically after every
//! mutation. An in-memory store behaves identically but never touches disk.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use sync_fs::NormalizedPath;
use uuid::Uuid;

use crate::entity::{Entity, EntityKind};
use crate::{Error, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    entities: BTreeMap<Uuid, Entity>,
}

/// Entity system of record backed by a JSON file
#[derive(Debug, Default)]
pub struct EntityStore {
    path: Option<NormalizedPath>,
    state: RwLock<StoreState>,
    saves: AtomicUsize,
    bulk_saves: AtomicUsize,
}

impl EntityStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store at `path`, starting empty when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::Corrupt` if the file exists but is not a valid store.
    pub fn open(path: impl Into<NormalizedPath>) -> Result<Self> {
        let path = path.into();
        let state = if path.is_file() {
            let content = sync_fs::io::read_text(&path)?;
            serde_json::from_str(&content).map_err(|e| Error::Corrupt {
                path: path.to_native(),
                message: e.to_string(),
            })?
        } else {
            tracing::debug!(%path, "store file not found, starting empty");
            StoreState::default()
        };

        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
            ..Self::default()
        })
    }

    pub fn path(&self) -> Option<&NormalizedPath> {
        self.path.as_ref()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &StoreState) -> Result<()> {
        if let Some(path) = &self.path {
            let content = serde_json::to_string_pretty(state)?;
            sync_fs::io::write_atomic(path, content.as_bytes())?;
        }
        Ok(())
    }

    pub fn get(&self, key: Uuid) -> Option<Entity> {
        self.read().entities.get(&key).cloned()
    }

    /// First item of `entity_type` whose alias matches, ignoring ASCII case.
    pub fn find_by_alias(&self, entity_type: &str, alias: &str) -> Option<Entity> {
        self.read()
            .entities
            .values()
            .find(|e| {
                e.kind == EntityKind::Item
                    && e.entity_type == entity_type
                    && e.alias.eq_ignore_ascii_case(alias)
            })
            .cloned()
    }

    /// Entities of one type and kind directly under `parent`, ordered by
    /// sort order then alias.
    pub fn children(&self, entity_type: &str, parent: Option<Uuid>, kind: EntityKind) -> Vec<Entity> {
        let mut children: Vec<Entity> = self
            .read()
            .entities
            .values()
            .filter(|e| e.entity_type == entity_type && e.parent == parent && e.kind == kind)
            .cloned()
            .collect();
        children.sort_by(|a, b| (a.sort_order, &a.alias).cmp(&(b.sort_order, &b.alias)));
        children
    }

    /// Every entity of `entity_type`, in key order.
    pub fn entities(&self, entity_type: &str) -> Vec<Entity> {
        self.read()
            .entities
            .values()
            .filter(|e| e.entity_type == entity_type)
            .cloned()
            .collect()
    }

    pub fn entity_types(&self) -> BTreeSet<String> {
        self.read()
            .entities
            .values()
            .map(|e| e.entity_type.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entities.is_empty()
    }

    /// Ancestors of `key`, root first. Stops at a missing parent.
    pub fn ancestors(&self, key: Uuid) -> Vec<Entity> {
        let state = self.read();
        let mut chain = Vec::new();
        let mut current = state.entities.get(&key).and_then(|e| e.parent);
        while let Some(parent_key) = current {
            let Some(parent) = state.entities.get(&parent_key) else {
                break;
            };
            if chain.iter().any(|e: &Entity| e.key == parent.key) {
                break;
            }
            chain.push(parent.clone());
            current = parent.parent;
        }
        chain.reverse();
        chain
    }

    fn assign_id(state: &mut StoreState, entity: &mut Entity) {
        if entity.internal_id == 0 {
            entity.internal_id = match state.entities.get(&entity.key) {
                Some(existing) if existing.internal_id != 0 => existing.internal_id,
                _ => {
                    state.next_id += 1;
                    state.next_id
                }
            };
        }
    }

    /// Insert or replace one entity.
    pub fn save(&self, entity: &Entity) -> Result<Entity> {
        let mut state = self.write();
        let mut entity = entity.clone();
        Self::assign_id(&mut state, &mut entity);
        state.entities.insert(entity.key, entity.clone());
        self.persist(&state)?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(key = %entity.key, alias = %entity.alias, "entity saved");
        Ok(entity)
    }

    /// Insert or replace many entities with a single write.
    pub fn save_all(&self, entities: &[Entity]) -> Result<()> {
        let mut state = self.write();
        for entity in entities {
            let mut entity = entity.clone();
            Self::assign_id(&mut state, &mut entity);
            state.entities.insert(entity.key, entity);
        }
        self.persist(&state)?;
        self.bulk_saves.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(count = entities.len(), "entities bulk saved");
        Ok(())
    }

    /// Remove an entity and everything below it. Returns false when the
    /// entity was already gone.
    pub fn delete(&self, key: Uuid) -> Result<bool> {
        let mut state = self.write();
        if !state.entities.contains_key(&key) {
            return Ok(false);
        }

        let mut doomed = vec![key];
        let mut index = 0;
        while index < doomed.len() {
            let parent = doomed[index];
            doomed.extend(
                state
                    .entities
                    .values()
                    .filter(|e| e.parent == Some(parent))
                    .map(|e| e.key),
            );
            index += 1;
        }
        for key in &doomed {
            state.entities.remove(key);
        }

        self.persist(&state)?;
        tracing::debug!(%key, removed = doomed.len(), "entity deleted");
        Ok(true)
    }

    /// Container named `name` under `parent`, created when missing.
    pub fn ensure_container(&self, entity_type: &str, parent: Option<Uuid>, name: &str) -> Result<Entity> {
        let existing = self
            .children(entity_type, parent, EntityKind::Container)
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name));
        if let Some(container) = existing {
            return Ok(container);
        }

        let mut container = Entity::container(entity_type, name);
        container.parent = parent;
        tracing::debug!(%name, "creating container");
        self.save(&container)
    }

    /// Entity with `key`, or `EntityNotFound`.
    pub fn require(&self, key: Uuid) -> Result<Entity> {
        self.get(key).ok_or(Error::EntityNotFound { key })
    }

    /// Rewrite the store file.
    pub fn flush(&self) -> Result<()> {
        self.persist(&self.read())
    }

    /// Number of single-entity saves since creation or the last reset.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of bulk saves since creation or the last reset.
    pub fn bulk_save_count(&self) -> usize {
        self.bulk_saves.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.saves.store(0, Ordering::SeqCst);
        self.bulk_saves.store(0, Ordering::SeqCst);
    }
}
