//! Reference system of record for entity-sync
//!
//! A small JSON-file entity store with everything the sync engine needs to
//! run against it:
//!
//! - [`EntityStore`]: entities (items and containers) persisted as one JSON file
//! - [`EntitySerializer`]: a generic two-pass document codec for any entity type
//! - [`EntityTree`]: the live tree view handlers walk for export and clean
//! - [`StoreDependencyChecker`]: containers, links, ancestors and descendants
//! - [`StoreConfig`]: `[[handlers]]` definitions turned into a registry

pub mod config;
pub mod dependency;
pub mod entity;
pub mod error;
pub mod handler;
pub mod serializer;
pub mod store;
pub mod tree;

pub use config::{HandlerDefinition, StoreConfig};
pub use dependency::StoreDependencyChecker;
pub use entity::{Entity, EntityKind};
pub use error::{Error, Result};
pub use handler::{EntityHandler, entity_handler};
pub use serializer::EntitySerializer;
pub use store::EntityStore;
pub use tree::EntityTree;
