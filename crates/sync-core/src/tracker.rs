//! Attribute-level change tracking for reports

use serde_json::{Map, Value};
use similar::{ChangeTag, TextDiff};

use crate::action::ChangeDetail;
use crate::document::Document;

/// Maximum recursion depth for diff operations
const MAX_DIFF_DEPTH: usize = 128;

/// Computes the details shown for a changed item in a report.
pub trait ChangeTracker {
    /// Differences from `current` (live state, `None` when the item does not
    /// exist yet) to `incoming` (the document on disk).
    fn changes(&self, current: Option<&Document>, incoming: &Document) -> Vec<ChangeDetail>;
}

/// Structural diff over the canonical JSON form of two documents.
///
/// Multi-line string attributes are compared line by line.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffTracker;

impl ChangeTracker for DiffTracker {
    fn changes(&self, current: Option<&Document>, incoming: &Document) -> Vec<ChangeDetail> {
        let old = current
            .map(Document::to_value)
            .unwrap_or_else(|| Value::Object(Map::new()));
        let new = incoming.to_value();

        let mut details = Vec::new();
        diff_values(&old, &new, String::new(), &mut details, 0);
        details
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn diff_values(
    old: &Value,
    new: &Value,
    path: String,
    details: &mut Vec<ChangeDetail>,
    depth: usize,
) {
    if depth > MAX_DIFF_DEPTH {
        if old != new {
            details.push(ChangeDetail::updated(path, render(old), render(new)));
        }
        return;
    }

    match (old, new) {
        (Value::Object(old_obj), Value::Object(new_obj)) => {
            for (key, old_value) in old_obj {
                let child = child_path(&path, key);
                match new_obj.get(key) {
                    Some(new_value) => diff_values(old_value, new_value, child, details, depth + 1),
                    None => details.push(ChangeDetail::deleted(child, render(old_value))),
                }
            }
            for (key, new_value) in new_obj {
                if !old_obj.contains_key(key) {
                    details.push(ChangeDetail::created(child_path(&path, key), render(new_value)));
                }
            }
        }

        (Value::Array(old_arr), Value::Array(new_arr)) => {
            for i in 0..old_arr.len().max(new_arr.len()) {
                let child = format!("{path}[{i}]");
                match (old_arr.get(i), new_arr.get(i)) {
                    (Some(o), Some(n)) => diff_values(o, n, child, details, depth + 1),
                    (Some(o), None) => details.push(ChangeDetail::deleted(child, render(o))),
                    (None, Some(n)) => details.push(ChangeDetail::created(child, render(n))),
                    (None, None) => {}
                }
            }
        }

        (Value::String(old_text), Value::String(new_text))
            if old_text != new_text && (old_text.contains('\n') || new_text.contains('\n')) =>
        {
            diff_lines(old_text, new_text, &path, details);
        }

        _ => {
            if old != new {
                details.push(ChangeDetail::updated(path, render(old), render(new)));
            }
        }
    }
}

fn diff_lines(old: &str, new: &str, path: &str, details: &mut Vec<ChangeDetail>) {
    let text_diff = TextDiff::from_lines(old, new);
    for change in text_diff.iter_all_changes() {
        let line = change.value().trim_end_matches('\n');
        match change.tag() {
            ChangeTag::Delete => details.push(ChangeDetail::deleted(path, line)),
            ChangeTag::Insert => details.push(ChangeDetail::created(path, line)),
            ChangeTag::Equal => {}
        }
    }
}
