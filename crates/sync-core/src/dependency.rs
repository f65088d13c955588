//! Dependency records and ordering
//!
//! Export-with-dependencies callers consume a flat list of [`Dependency`]
//! records. Each record carries an integer order taken from the central
//! [`DependencyOrder`] table; prerequisites rank higher, and
//! [`dedupe_and_order`] sorts descending so they come first.
//!
//! # Example
//!
//! ```
//! use sync_core::dependency::{Dependency, DependencyOrder, dedupe_and_order};
//! use uuid::Uuid;
//!
//! let definition = Uuid::new_v4();
//! let item = Uuid::new_v4();
//! let ordered = dedupe_and_order(vec![
//!     Dependency::new(item, "page", DependencyOrder::Item, "Entity"),
//!     Dependency::new(definition, "page-type", DependencyOrder::Definition, "Entity"),
//!     Dependency::new(item, "page", DependencyOrder::Item, "Entity"),
//! ]);
//!
//! assert_eq!(ordered.len(), 2);
//! assert_eq!(ordered[0].key, definition);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Category ranks. Higher ranks are resolved first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DependencyOrder {
    /// Link from one item to another
    Relation,
    /// The item itself
    Item,
    /// A parent item in the tree
    Parent,
    /// A type or schema the item is built from
    Definition,
    /// A folder holding items
    Container,
}

impl DependencyOrder {
    pub fn rank(self) -> i32 {
        match self {
            DependencyOrder::Relation => 100,
            DependencyOrder::Item => 200,
            DependencyOrder::Parent => 300,
            DependencyOrder::Definition => 400,
            DependencyOrder::Container => 500,
        }
    }
}

/// One entity an export depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub key: Uuid,
    pub name: String,
    pub order: i32,
    pub item_type: String,
}

impl Dependency {
    pub fn new(
        key: Uuid,
        name: impl Into<String>,
        order: DependencyOrder,
        item_type: impl Into<String>,
    ) -> Self {
        Self {
            key,
            name: name.into(),
            order: order.rank(),
            item_type: item_type.into(),
        }
    }

    /// Same record, ranked `levels` above its category. Ancestors use this
    /// so that a grandparent sorts before a parent.
    pub fn raised(mut self, levels: i32) -> Self {
        self.order += levels;
        self
    }
}

/// Options for dependency collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyFlags {
    /// Only the item itself
    pub no_dependencies: bool,
    pub include_ancestors: bool,
    pub include_children: bool,
}

/// Computes the dependencies of one item.
pub trait DependencyChecker<Item> {
    fn dependencies(&self, item: &Item, flags: &DependencyFlags) -> Result<Vec<Dependency>>;
}

/// Remove duplicate keys (first occurrence wins), then stable-sort by
/// descending order.
pub fn dedupe_and_order(dependencies: impl IntoIterator<Item = Dependency>) -> Vec<Dependency> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Dependency> = dependencies
        .into_iter()
        .filter(|dep| seen.insert(dep.key))
        .collect();
    unique.sort_by(|a, b| b.order.cmp(&a.order));
    unique
}
