//! Generic codec for stored entities
//!
//! Document body layout:
//!
//! ```text
//! "Body": {
//!   "Info": {
//!     "Name": "Home", "SortOrder": 0, "InternalId": 12,
//!     "Parent": { "Key": "<uuid>", "Alias": "root" },   // nearest item ancestor
//!     "Folder": "blog/2024"                            // containers below it
//!   },
//!   "Properties": { ... },
//!   "Links": { "related": { "Key": "<uuid>", "Alias": "about" } }
//! }
//! ```
//!
//! `InternalId` is store specific and is stripped before hashing. Links are
//! resolved in the second pass when the codec is two-pass, so an import can
//! reference items that appear later in the folder.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use sync_core::{
    ChangeDetail, ChangeType, ContentDocument, Document, Error, Result, Serializer, SerializerFlags,
    SyncAttempt,
};
use uuid::Uuid;

use crate::entity::{Entity, EntityKind};
use crate::store::EntityStore;

const INFO: &str = "Info";
const PROPERTIES: &str = "Properties";
const LINKS: &str = "Links";

/// Folder segments in `Info.Folder` are joined with this separator.
pub const FOLDER_SEPARATOR: &str = "/";

/// Serializer for one entity type held in an [`EntityStore`]
#[derive(Debug, Clone)]
pub struct EntitySerializer {
    store: Arc<EntityStore>,
    item_type: String,
    two_pass: bool,
}

impl EntitySerializer {
    pub fn new(store: Arc<EntityStore>, item_type: impl Into<String>) -> Self {
        Self {
            store,
            item_type: item_type.into(),
            two_pass: false,
        }
    }

    /// Resolve links in a second pass instead of during the first.
    pub fn two_pass(mut self, two_pass: bool) -> Self {
        self.two_pass = two_pass;
        self
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    fn is_own_item(&self, entity: &Entity) -> bool {
        entity.kind == EntityKind::Item && entity.entity_type == self.item_type
    }

    /// Nearest item ancestor and the container names between it and the item.
    fn placement(&self, entity: &Entity) -> (Option<Entity>, Vec<String>) {
        let mut folders = Vec::new();
        for ancestor in self.store.ancestors(entity.key).into_iter().rev() {
            if ancestor.is_container() {
                folders.push(ancestor.name);
            } else {
                folders.reverse();
                return (Some(ancestor), folders);
            }
        }
        folders.reverse();
        (None, folders)
    }

    fn reference(&self, key: Uuid) -> Value {
        let alias = self.store.get(key).map(|e| e.alias).unwrap_or_default();
        json!({ "Key": key.to_string(), "Alias": alias })
    }

    /// Find a referenced entity by key, falling back to alias within
    /// `entity_type` when the key is unknown.
    fn resolve_reference(&self, reference: &Value, entity_type: Option<&str>) -> Option<Entity> {
        let key = reference
            .get("Key")
            .and_then(Value::as_str)
            .and_then(|k| Uuid::parse_str(k).ok());
        if let Some(key) = key
            && let Some(found) = self.store.get(key)
        {
            return Some(found);
        }

        let alias = reference.get("Alias").and_then(Value::as_str)?;
        if alias.is_empty() {
            return None;
        }
        match entity_type {
            Some(entity_type) => self.store.find_by_alias(entity_type, alias),
            None => self
                .store
                .entity_types()
                .iter()
                .find_map(|t| self.store.find_by_alias(t, alias)),
        }
    }

    /// Link targets named in the document. Fails on the first reference
    /// that cannot be found.
    fn resolve_links(&self, doc: &ContentDocument) -> Result<BTreeMap<String, Uuid>> {
        let mut links = BTreeMap::new();
        let Some(Value::Object(section)) = doc.section(LINKS) else {
            return Ok(links);
        };
        for (name, reference) in section {
            let target = self.resolve_reference(reference, None).ok_or_else(|| {
                Error::not_found(format!("link '{name}' of '{}'", doc.alias))
            })?;
            links.insert(name.clone(), target.key);
        }
        Ok(links)
    }

    fn link_details(current: &BTreeMap<String, Uuid>, resolved: &BTreeMap<String, Uuid>) -> Vec<ChangeDetail> {
        let mut details = Vec::new();
        for (name, key) in resolved {
            let path = format!("{LINKS}.{name}");
            match current.get(name) {
                None => details.push(ChangeDetail::created(&path, key.to_string())),
                Some(old) if old != key => {
                    details.push(ChangeDetail::updated(&path, old.to_string(), key.to_string()))
                }
                Some(_) => {}
            }
        }
        for (name, old) in current {
            if !resolved.contains_key(name) {
                details.push(ChangeDetail::deleted(format!("{LINKS}.{name}"), old.to_string()));
            }
        }
        details
    }
}

impl Serializer for EntitySerializer {
    type Item = Entity;

    fn item_type(&self) -> &str {
        &self.item_type
    }

    fn serialize(&self, item: &Entity) -> Result<ContentDocument> {
        let (parent, folders) = self.placement(item);
        let level = i32::try_from(self.store.ancestors(item.key).len())
            .map_err(|_| Error::format(format!("'{}' is nested too deeply", item.alias)))?;

        let mut info = Map::new();
        info.insert("Name".into(), Value::String(item.name.clone()));
        info.insert("SortOrder".into(), Value::from(item.sort_order));
        info.insert("InternalId".into(), Value::from(item.internal_id));
        if let Some(parent) = parent {
            info.insert("Parent".into(), self.reference(parent.key));
        }
        if !folders.is_empty() {
            info.insert(
                "Folder".into(),
                Value::String(folders.join(FOLDER_SEPARATOR)),
            );
        }

        let properties: Map<String, Value> = item
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let links: Map<String, Value> = item
            .links
            .iter()
            .map(|(name, key)| (name.clone(), self.reference(*key)))
            .collect();

        let mut body = Map::new();
        body.insert(INFO.into(), Value::Object(info));
        body.insert(PROPERTIES.into(), Value::Object(properties));
        body.insert(LINKS.into(), Value::Object(links));

        Ok(ContentDocument::new(&self.item_type, item.key, &item.alias, level).with_body(Value::Object(body)))
    }

    fn deserialize_core(&self, doc: &ContentDocument, _flags: &SerializerFlags) -> Result<SyncAttempt<Entity>> {
        let name = doc.alias.clone();
        let info = doc.section(INFO).cloned().unwrap_or(Value::Object(Map::new()));

        let mut entity = self
            .find_item(doc.key, &doc.alias)?
            .unwrap_or_else(|| Entity::new(&self.item_type, &doc.alias).with_key(doc.key));
        entity.alias = doc.alias.clone();
        entity.name = info
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or(&doc.alias)
            .to_string();
        entity.sort_order = info
            .get("SortOrder")
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(0);

        let mut parent = match info.get("Parent") {
            Some(reference) => match self.resolve_reference(reference, Some(&self.item_type)) {
                Some(found) if self.is_own_item(&found) => Some(found.key),
                _ => {
                    tracing::debug!(alias = %doc.alias, "parent not found");
                    return Ok(SyncAttempt::fail(
                        name,
                        ChangeType::ParentMissing,
                        "Parent item not found",
                    ));
                }
            },
            None => None,
        };
        if let Some(folder) = info.get("Folder").and_then(Value::as_str) {
            for segment in folder.split(FOLDER_SEPARATOR).filter(|s| !s.is_empty()) {
                let container = self.store.ensure_container(&self.item_type, parent, segment)?;
                parent = Some(container.key);
            }
        }
        entity.parent = parent;

        entity.properties = match doc.section(PROPERTIES) {
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => BTreeMap::new(),
        };

        if !self.two_pass {
            match self.resolve_links(doc) {
                Ok(links) => entity.links = links,
                Err(e) => return Ok(SyncAttempt::fail_with_error(name, ChangeType::Fail, &e)),
            }
        }

        Ok(SyncAttempt::succeed_with(name, entity, ChangeType::Import))
    }

    fn find_by_key(&self, key: Uuid) -> Result<Option<Entity>> {
        Ok(self.store.get(key).filter(|e| self.is_own_item(e)))
    }

    fn find_by_alias(&self, alias: &str) -> Result<Option<Entity>> {
        Ok(self.store.find_by_alias(&self.item_type, alias))
    }

    fn save(&self, item: &Entity) -> Result<()> {
        self.store.save(item)?;
        Ok(())
    }

    fn save_all(&self, items: &[Entity]) -> Result<()> {
        self.store.save_all(items)?;
        Ok(())
    }

    fn delete(&self, item: &Entity) -> Result<()> {
        self.store.delete(item.key)?;
        Ok(())
    }

    fn item_key(&self, item: &Entity) -> Uuid {
        item.key
    }

    fn item_alias(&self, item: &Entity) -> String {
        item.alias.clone()
    }

    fn is_two_pass(&self) -> bool {
        self.two_pass
    }

    fn deserialize_second_pass(
        &self,
        mut item: Entity,
        doc: &ContentDocument,
        flags: &SerializerFlags,
    ) -> Result<SyncAttempt<Entity>> {
        let resolved = self.resolve_links(doc)?;
        let details = Self::link_details(&item.links, &resolved);
        if details.is_empty() {
            return Ok(SyncAttempt::succeed_with(doc.alias.clone(), item, ChangeType::NoChange));
        }

        item.links = resolved;
        if !flags.do_not_save {
            self.save(&item)?;
        }
        tracing::debug!(alias = %doc.alias, links = details.len(), "links resolved");
        Ok(SyncAttempt::succeed_with(doc.alias.clone(), item, ChangeType::Update).with_details(details))
    }

    fn cleanse(&self, doc: Document) -> Document {
        match doc {
            Document::Content(mut content) => {
                if let Some(Value::Object(info)) = content.body.get_mut(INFO) {
                    info.remove("InternalId");
                }
                Document::Content(content)
            }
            marker => marker,
        }
    }
}
