//! Handler wiring for stored entities

use std::sync::Arc;

use sync_core::{EventGate, Handler, HandlerMeta, Result};

use crate::dependency::StoreDependencyChecker;
use crate::serializer::EntitySerializer;
use crate::store::EntityStore;
use crate::tree::EntityTree;

/// Handler for one entity type held in an [`EntityStore`]
pub type EntityHandler = Handler<EntitySerializer, EntityTree>;

/// Build a handler for `meta.entity_type` backed by `store`.
pub fn entity_handler(
    store: Arc<EntityStore>,
    meta: HandlerMeta,
    two_pass: bool,
    gate: Arc<EventGate>,
) -> Result<EntityHandler> {
    let serializer = EntitySerializer::new(store.clone(), &meta.entity_type).two_pass(two_pass);
    let tree = EntityTree::new(store.clone(), &meta.entity_type);
    Ok(Handler::new(meta, serializer, tree, gate)?.with_dependency_checker(StoreDependencyChecker::new(store)))
}
