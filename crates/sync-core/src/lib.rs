//! Serialization and handler reconciliation engine for entity-sync
//!
//! This crate keeps a system of record and a tree of document files in
//! step. It provides:
//!
//! - **Documents**: content and marker documents with a canonical JSON form
//! - **Serializer**: the per-item-type codec trait, with change
//!   classification (`is_current`), hashing and import routing built in
//! - **Handler**: folder walking, two-pass import, reporting, export,
//!   clean-by-absence and live event mirroring for one item type
//! - **Registry**: type-erased handlers resolved by alias or entity type,
//!   and a service that runs them against a sync root
//!
//! # Architecture
//!
//! ```text
//!                 sync-cli
//!                    |
//!        SyncService / HandlerRegistry
//!                    |
//!      Handler<S: Serializer, E: EntitySource>
//!          |                  |
//!     documents, paths    system of record (sync-store, or a host)
//!          |
//!       sync-fs
//! ```

pub mod action;
pub mod attempt;
pub mod change;
pub mod dependency;
pub mod document;
pub mod error;
pub mod events;
pub mod handler;
pub mod paths;
pub mod progress;
pub mod registry;
pub mod serializer;
pub mod settings;
pub mod tracker;

pub use action::{ActionSummary, ChangeDetail, DetailChange, SyncAction};
pub use attempt::SyncAttempt;
pub use change::ChangeType;
pub use dependency::{Dependency, DependencyChecker, DependencyFlags, DependencyOrder};
pub use document::{ContentDocument, Document, MarkerDocument, SyncActionType};
pub use error::{Error, Result};
pub use events::{EventGate, PauseGuard};
pub use handler::{EntitySource, FolderImport, Handler, HandlerMeta};
pub use progress::Progress;
pub use registry::{HandlerRegistry, SyncHandler, SyncService};
pub use serializer::{Serializer, SerializerFlags};
pub use settings::{HandlerAction, HandlerSettings, SyncSettings};
pub use tracker::{ChangeTracker, DiffTracker};
