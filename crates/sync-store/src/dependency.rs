//! Dependency checking for stored entities

use std::sync::Arc;

use sync_core::{Dependency, DependencyChecker, DependencyFlags, DependencyOrder, Result};

use crate::entity::{Entity, EntityKind};
use crate::store::EntityStore;

/// Collects an entity's containers, linked entities and, on request, its
/// ancestors and descendants.
///
/// Ancestors are raised by their distance from the item so that the root
/// comes first once the list is ordered.
#[derive(Debug, Clone)]
pub struct StoreDependencyChecker {
    store: Arc<EntityStore>,
}

impl StoreDependencyChecker {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    fn record(entity: &Entity, order: DependencyOrder) -> Dependency {
        Dependency::new(entity.key, &entity.name, order, &entity.entity_type)
    }

    fn descendants(&self, entity: &Entity, into: &mut Vec<Dependency>) {
        for kind in [EntityKind::Container, EntityKind::Item] {
            for child in self.store.children(&entity.entity_type, Some(entity.key), kind) {
                if kind == EntityKind::Item {
                    into.push(Self::record(&child, DependencyOrder::Item));
                }
                self.descendants(&child, into);
            }
        }
    }
}

impl DependencyChecker<Entity> for StoreDependencyChecker {
    fn dependencies(&self, item: &Entity, flags: &DependencyFlags) -> Result<Vec<Dependency>> {
        let mut dependencies = vec![Self::record(item, DependencyOrder::Item)];
        if flags.no_dependencies {
            return Ok(dependencies);
        }

        let ancestors = self.store.ancestors(item.key);
        let count = ancestors.len();
        for (index, ancestor) in ancestors.iter().enumerate() {
            let distance = i32::try_from(count - index).unwrap_or(i32::MAX);
            if ancestor.is_container() {
                dependencies.push(Self::record(ancestor, DependencyOrder::Container).raised(distance));
            } else if flags.include_ancestors {
                dependencies.push(Self::record(ancestor, DependencyOrder::Parent).raised(distance));
            }
        }

        for (name, target) in &item.links {
            match self.store.get(*target) {
                Some(linked) => dependencies.push(Self::record(&linked, DependencyOrder::Relation)),
                None => tracing::debug!(alias = %item.alias, link = %name, "link target missing"),
            }
        }

        if flags.include_children {
            self.descendants(item, &mut dependencies);
        }

        Ok(dependencies)
    }
}
