//! Error types for sync-core

use std::path::PathBuf;

/// Result type for sync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sync-core operations
///
/// None of these abort a folder walk: the handler converts each one into a
/// failed action for the file that raised it and moves on to the next.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Document is malformed or not valid for the handler's item type
    #[error("Format error: {message}")]
    Format { message: String },

    /// A referenced entity or file does not exist
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Document file does not exist
    #[error("File not found {path}")]
    FileNotFound { path: PathBuf },

    /// Codec rejected the document content (business rule violation)
    #[error("Deserialize failed for {name}: {message}")]
    Deserialize { name: String, message: String },

    /// The system of record rejected a save or delete
    #[error("Persistence failed: {message}")]
    Persistence { message: String },

    /// Reference resolution failed during the second import pass
    #[error("Second pass failed for {name}: {message}")]
    SecondPass { name: String, message: String },

    /// Handler is missing required metadata or is registered twice
    #[error("Handler initialization failed: {message}")]
    HandlerInit { message: String },

    /// No handler registered for the alias or entity type
    #[error("Unknown handler: {name}")]
    UnknownHandler { name: String },

    /// Filesystem error from sync-fs
    #[error(transparent)]
    Fs(#[from] sync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML settings parse error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// True for errors caused by a missing document file.
    pub fn is_file_not_found(&self) -> bool {
        match self {
            Self::FileNotFound { .. } => true,
            Self::Fs(e) => e.is_not_found(),
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
