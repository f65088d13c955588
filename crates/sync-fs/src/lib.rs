//! Filesystem layer for entity-sync
//!
//! Provides forward-slash normalized paths, atomic document writes,
//! deterministic folder walking and content checksums. Everything above
//! this crate treats the document tree through these helpers only.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::Checksum;
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::NormalizedPath;
