//! Error types for sync-store

use std::path::PathBuf;

/// Result type for sync-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sync-store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Store file {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Entity {key} not found")]
    EntityNotFound { key: uuid::Uuid },

    #[error(transparent)]
    Fs(#[from] sync_fs::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<Error> for sync_core::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::EntityNotFound { key } => sync_core::Error::not_found(format!("entity {key}")),
            other => sync_core::Error::persistence(other.to_string()),
        }
    }
}
