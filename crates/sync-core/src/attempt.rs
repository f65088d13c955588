//! Result of one codec operation

use crate::Error;
use crate::action::ChangeDetail;
use crate::change::ChangeType;

/// Outcome of serializing or deserializing a single item.
///
/// Unlike [`crate::SyncAction`], an attempt may own the item it produced so
/// the handler can stash it for the second pass or a batched save.
#[derive(Debug, Clone)]
pub struct SyncAttempt<T> {
    pub success: bool,
    pub name: String,
    pub item: Option<T>,
    pub change: ChangeType,
    pub message: Option<String>,
    pub details: Vec<ChangeDetail>,
    pub error: Option<String>,
}

impl<T> SyncAttempt<T> {
    /// Successful attempt that produced no item.
    pub fn succeed(name: impl Into<String>, change: ChangeType) -> Self {
        Self {
            success: true,
            name: name.into(),
            item: None,
            change,
            message: None,
            details: Vec::new(),
            error: None,
        }
    }

    pub fn succeed_with(name: impl Into<String>, item: T, change: ChangeType) -> Self {
        Self {
            item: Some(item),
            ..Self::succeed(name, change)
        }
    }

    pub fn fail(name: impl Into<String>, change: ChangeType, message: impl Into<String>) -> Self {
        Self {
            success: false,
            name: name.into(),
            item: None,
            change,
            message: Some(message.into()),
            details: Vec::new(),
            error: None,
        }
    }

    /// Failed attempt carrying the error text as both message and error.
    pub fn fail_with_error(name: impl Into<String>, change: ChangeType, error: &Error) -> Self {
        let text = error.to_string();
        Self {
            error: Some(text.clone()),
            ..Self::fail(name, change, text)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_details(mut self, details: Vec<ChangeDetail>) -> Self {
        self.details = details;
        self
    }

    /// Map the carried item, keeping the outcome.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SyncAttempt<U> {
        SyncAttempt {
            success: self.success,
            name: self.name,
            item: self.item.map(f),
            change: self.change,
            message: self.message,
            details: self.details,
            error: self.error,
        }
    }
}
