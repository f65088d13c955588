//! SHA-256 content checksums
//!
//! A single canonical format (`sha256:<hex>`) is used for document hashes,
//! so "no material change" is plain string equality on two checksums.

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// A canonical `sha256:<hex>` checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// Checksum of a string's UTF-8 bytes.
    pub fn of_str(content: &str) -> Self {
        Self::of_bytes(content.as_bytes())
    }

    pub fn of_bytes(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        Self(format!("{}{:x}", PREFIX, hasher.finalize()))
    }

    /// Checksum of a file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        Ok(Self::of_bytes(&content))
    }

    /// Parse a string already in canonical form.
    pub fn parse(value: &str) -> Option<Self> {
        let hex = value.strip_prefix(PREFIX)?;
        let valid = hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit());
        valid.then(|| Self(value.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex digest without the `sha256:` prefix.
    pub fn hex(&self) -> &str {
        &self.0[PREFIX.len()..]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Checksum> for String {
    fn from(value: Checksum) -> Self {
        value.0
    }
}
