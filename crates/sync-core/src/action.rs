//! Reported actions
//!
//! A [`SyncAction`] is produced for every processed file or item. Handlers
//! return them as ordered sequences; nothing is ever deduplicated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sync_fs::NormalizedPath;
use uuid::Uuid;

use crate::attempt::SyncAttempt;
use crate::change::ChangeType;

/// Kind of an attribute-level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailChange {
    Create,
    Update,
    Delete,
}

/// One attribute-level difference between a document and live state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetail {
    /// Display name of the changed attribute
    pub name: String,
    /// Location of the attribute within the document body
    pub path: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change: DetailChange,
}

impl ChangeDetail {
    pub fn created(path: impl Into<String>, value: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: display_name(&path),
            path,
            old_value: None,
            new_value: Some(value.into()),
            change: DetailChange::Create,
        }
    }

    pub fn updated(
        path: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self {
            name: display_name(&path),
            path,
            old_value: Some(old_value.into()),
            new_value: Some(new_value.into()),
            change: DetailChange::Update,
        }
    }

    pub fn deleted(path: impl Into<String>, value: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: display_name(&path),
            path,
            old_value: Some(value.into()),
            new_value: None,
            change: DetailChange::Delete,
        }
    }
}

fn display_name(path: &str) -> String {
    path.rsplit('.').next().unwrap_or(path).to_string()
}

/// Result of processing one file or item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAction {
    pub success: bool,
    /// Alias of the handler that produced the action
    pub handler: String,
    pub item_type: String,
    pub change: ChangeType,
    pub name: String,
    pub message: Option<String>,
    /// Document file the action refers to
    pub file: Option<String>,
    pub key: Option<Uuid>,
    pub details: Vec<ChangeDetail>,
}

impl SyncAction {
    pub fn new(
        success: bool,
        handler: impl Into<String>,
        item_type: impl Into<String>,
        change: ChangeType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            success,
            handler: handler.into(),
            item_type: item_type.into(),
            change,
            name: name.into(),
            message: None,
            file: None,
            key: None,
            details: Vec::new(),
        }
    }

    /// Failed action with a message, for errors raised while processing `file`.
    pub fn failed(
        handler: impl Into<String>,
        item_type: impl Into<String>,
        name: impl Into<String>,
        file: &NormalizedPath,
        message: impl Into<String>,
    ) -> Self {
        Self::new(false, handler, item_type, ChangeType::Fail, name)
            .with_file(file)
            .with_message(message)
    }

    /// Report form of a codec attempt.
    pub fn from_attempt<T>(
        handler: impl Into<String>,
        item_type: impl Into<String>,
        attempt: &SyncAttempt<T>,
        file: Option<&NormalizedPath>,
    ) -> Self {
        let action = Self {
            success: attempt.success,
            handler: handler.into(),
            item_type: item_type.into(),
            change: attempt.change,
            name: attempt.name.clone(),
            message: attempt.message.clone(),
            file: None,
            key: None,
            details: attempt.details.clone(),
        };
        match file {
            Some(file) => action.with_file(file),
            None => action,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_file(mut self, file: &NormalizedPath) -> Self {
        self.file = Some(file.as_str().to_string());
        self
    }

    pub fn with_key(mut self, key: Uuid) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_details(mut self, details: Vec<ChangeDetail>) -> Self {
        self.details = details;
        self
    }
}

/// Counts over a sequence of actions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Actions whose change is above `NoChange`
    pub changed: usize,
    pub by_change: BTreeMap<ChangeType, usize>,
}

impl ActionSummary {
    pub fn of(actions: &[SyncAction]) -> Self {
        let mut summary = Self::default();
        for action in actions {
            summary.total += 1;
            if action.success {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            if action.change.has_changes() {
                summary.changed += 1;
            }
            *summary.by_change.entry(action.change).or_default() += 1;
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn count(&self, change: ChangeType) -> usize {
        self.by_change.get(&change).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_name_is_last_path_segment() {
        let detail = ChangeDetail::updated("Body.Properties.title", "a", "b");
        assert_eq!(detail.name, "title");
        assert_eq!(detail.change, DetailChange::Update);
    }

    #[test]
    fn from_attempt_copies_outcome() {
        let attempt: SyncAttempt<()> =
            SyncAttempt::fail("home", ChangeType::ImportFail, "parent missing");
        let file = NormalizedPath::new("usync/entities/home.config");
        let action = SyncAction::from_attempt("entityHandler", "Entity", &attempt, Some(&file));

        assert!(!action.success);
        assert_eq!(action.change, ChangeType::ImportFail);
        assert_eq!(action.message.as_deref(), Some("parent missing"));
        assert_eq!(action.file.as_deref(), Some("usync/entities/home.config"));
    }

    #[test]
    fn summary_counts() {
        let actions = vec![
            SyncAction::new(true, "h", "Entity", ChangeType::Create, "a"),
            SyncAction::new(true, "h", "Entity", ChangeType::NoChange, "b"),
            SyncAction::new(false, "h", "Entity", ChangeType::Fail, "c"),
            SyncAction::new(true, "h", "Entity", ChangeType::Create, "d"),
        ];
        let summary = ActionSummary::of(&actions);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.changed, 3);
        assert_eq!(summary.count(ChangeType::Create), 2);
        assert_eq!(summary.count(ChangeType::Delete), 0);
        assert!(summary.has_failures());
    }
}
