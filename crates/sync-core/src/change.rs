//! Change classification
//!
//! `ChangeType` is both the result code of every processed file and a
//! severity signal: variants are declared best-first so the derived `Ord`
//! gives `AlreadyExists < Clean < ... < NoChange < Create < ... < Fail`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of comparing a document against live state, or of applying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    /// Create-only import found the entity already present
    AlreadyExists,
    /// Clean marker: delete children missing from the folder
    Clean,
    /// Marker document produced (entity removed from disk representation)
    Removed,
    NoChange,
    Create,
    Import,
    Export,
    Update,
    Delete,
    WillChange,
    Information,
    Rolledback,
    ParentMissing,
    Mismatch,
    ImportFail,
    Fail,
}

impl ChangeType {
    /// True when applying the document would alter live state.
    pub fn has_changes(self) -> bool {
        self > ChangeType::NoChange
    }

    /// Failure classes; `Rolledback` and `Information` are informational.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            ChangeType::ParentMissing
                | ChangeType::Mismatch
                | ChangeType::ImportFail
                | ChangeType::Fail
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::AlreadyExists => "AlreadyExists",
            ChangeType::Clean => "Clean",
            ChangeType::Removed => "Removed",
            ChangeType::NoChange => "NoChange",
            ChangeType::Create => "Create",
            ChangeType::Import => "Import",
            ChangeType::Export => "Export",
            ChangeType::Update => "Update",
            ChangeType::Delete => "Delete",
            ChangeType::WillChange => "WillChange",
            ChangeType::Information => "Information",
            ChangeType::Rolledback => "Rolledback",
            ChangeType::ParentMissing => "ParentMissing",
            ChangeType::Mismatch => "Mismatch",
            ChangeType::ImportFail => "ImportFail",
            ChangeType::Fail => "Fail",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
