//! A small seeded entity tree.
//!
//! ```text
//! home                (item)
//! ├── about           (item)
//! blog                (container)
//! └── post            (item, links "related" -> about)
//! contact             (item)
//! ```
//!
//! Keys are fixed so that tests can name files and compare keys directly.

use serde_json::json;
use sync_store::{Entity, EntityStore};
use uuid::Uuid;

/// Type tag of every seeded entity.
pub const ENTITY_TYPE: &str = "Entity";

/// Handles to the seeded entities, as stored.
#[derive(Debug, Clone)]
pub struct Site {
    pub home: Entity,
    pub about: Entity,
    pub contact: Entity,
    pub blog: Entity,
    pub post: Entity,
}

impl Site {
    pub const HOME: Uuid = Uuid::from_u128(0x1000);
    pub const ABOUT: Uuid = Uuid::from_u128(0x1001);
    pub const CONTACT: Uuid = Uuid::from_u128(0x1002);
    pub const BLOG: Uuid = Uuid::from_u128(0x2000);
    pub const POST: Uuid = Uuid::from_u128(0x2001);

    /// Seed the tree into `store`.
    pub fn seed(store: &EntityStore) -> Self {
        let home = store
            .save(
                &Entity::new(ENTITY_TYPE, "home")
                    .with_key(Self::HOME)
                    .with_name("Home")
                    .with_property("title", json!("Welcome")),
            )
            .expect("seed home");
        let about = store
            .save(
                &Entity::new(ENTITY_TYPE, "about")
                    .with_key(Self::ABOUT)
                    .with_name("About us")
                    .with_parent(Self::HOME)
                    .with_property("body", json!("Line one\nLine two")),
            )
            .expect("seed about");
        let contact = store
            .save(
                &Entity::new(ENTITY_TYPE, "contact")
                    .with_key(Self::CONTACT)
                    .with_name("Contact")
                    .with_sort_order(2),
            )
            .expect("seed contact");
        let blog = store
            .save(
                &Entity::container(ENTITY_TYPE, "blog")
                    .with_key(Self::BLOG)
                    .with_sort_order(1),
            )
            .expect("seed blog");
        let post = store
            .save(
                &Entity::new(ENTITY_TYPE, "post")
                    .with_key(Self::POST)
                    .with_name("First post")
                    .with_parent(Self::BLOG)
                    .with_property("tags", json!(["news", "launch"]))
                    .with_link("related", Self::ABOUT),
            )
            .expect("seed post");

        Self {
            home,
            about,
            contact,
            blog,
            post,
        }
    }

    /// Every seeded item, without the container.
    pub fn items(&self) -> Vec<&Entity> {
        vec![&self.home, &self.about, &self.contact, &self.post]
    }
}
