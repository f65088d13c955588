//! Serialized documents
//!
//! A document is either entity content or a marker. Markers carry no entity
//! payload; they propagate a delete, rename or clean signal through the file
//! tree after the content file itself has gone.
//!
//! On disk a document is a JSON object with sorted keys:
//!
//! ```text
//! { "Alias": "home", "Body": { ... }, "Key": "<uuid>", "Level": 1, "Type": "Entity" }
//! { "Action": "Delete", "Alias": "home", "Key": "<uuid>", "Type": "Empty" }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sync_fs::NormalizedPath;
use uuid::Uuid;

use crate::{Error, Result};

/// Reserved type tag for marker documents.
pub const MARKER_TYPE: &str = "Empty";

/// Extension of every document file.
pub const DOCUMENT_EXTENSION: &str = "config";

/// Stem suffix of clean marker files; a root marker is just `_clean.config`.
pub const CLEAN_MARKER_SUFFIX: &str = "_clean";

/// Action carried by a marker document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SyncActionType {
    Delete,
    Rename,
    Clean,
    #[default]
    None,
}

impl SyncActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncActionType::Delete => "Delete",
            SyncActionType::Rename => "Rename",
            SyncActionType::Clean => "Clean",
            SyncActionType::None => "None",
        }
    }
}

impl FromStr for SyncActionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "delete" => Ok(SyncActionType::Delete),
            "rename" => Ok(SyncActionType::Rename),
            "clean" => Ok(SyncActionType::Clean),
            "none" | "" => Ok(SyncActionType::None),
            other => Err(Error::format(format!("unknown marker action '{other}'"))),
        }
    }
}

impl fmt::Display for SyncActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full or partial representation of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    pub item_type: String,
    pub key: Uuid,
    pub alias: String,
    /// Container depth, used for ordering
    pub level: i32,
    /// Type-specific payload; always a JSON object
    pub body: Value,
}

impl ContentDocument {
    pub fn new(item_type: impl Into<String>, key: Uuid, alias: impl Into<String>, level: i32) -> Self {
        Self {
            item_type: item_type.into(),
            key,
            alias: alias.into(),
            level,
            body: Value::Object(Map::new()),
        }
    }

    /// Builder-style body replacement.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Look up a top-level body section.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// Set a top-level body section, converting a non-object body first.
    pub fn set_section(&mut self, name: &str, value: Value) {
        if !self.body.is_object() {
            self.body = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.body {
            map.insert(name.to_string(), value);
        }
    }
}

/// Empty-payload document carrying a delete, rename or clean signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerDocument {
    pub key: Uuid,
    pub alias: String,
    pub action: SyncActionType,
}

impl MarkerDocument {
    pub fn new(key: Uuid, alias: impl Into<String>, action: SyncActionType) -> Self {
        Self {
            key,
            alias: alias.into(),
            action,
        }
    }
}

/// A parsed document file.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Content(ContentDocument),
    Marker(MarkerDocument),
}

impl Document {
    pub fn key(&self) -> Uuid {
        match self {
            Document::Content(doc) => doc.key,
            Document::Marker(marker) => marker.key,
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            Document::Content(doc) => &doc.alias,
            Document::Marker(marker) => &marker.alias,
        }
    }

    /// Type tag; markers report the reserved tag.
    pub fn item_type(&self) -> &str {
        match self {
            Document::Content(doc) => &doc.item_type,
            Document::Marker(_) => MARKER_TYPE,
        }
    }

    /// Container depth; markers sort with the root level.
    pub fn level(&self) -> i32 {
        match self {
            Document::Content(doc) => doc.level,
            Document::Marker(_) => 0,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Document::Marker(_))
    }

    pub fn as_content(&self) -> Option<&ContentDocument> {
        match self {
            Document::Content(doc) => Some(doc),
            Document::Marker(_) => None,
        }
    }

    pub fn as_marker(&self) -> Option<&MarkerDocument> {
        match self {
            Document::Marker(marker) => Some(marker),
            Document::Content(_) => None,
        }
    }

    /// Marker action, `None` for content documents.
    pub fn marker_action(&self) -> Option<SyncActionType> {
        self.as_marker().map(|m| m.action)
    }

    /// Valid-or-empty check. Markers always pass; content must carry
    /// `item_type` as its tag, a non-nil key and a non-empty alias.
    pub fn validate(&self, item_type: &str) -> Result<()> {
        let Document::Content(doc) = self else {
            return Ok(());
        };
        if doc.item_type != item_type {
            return Err(Error::format(format!(
                "expected {item_type} document, found {}",
                doc.item_type
            )));
        }
        if doc.key.is_nil() {
            return Err(Error::format(format!("{item_type} document has no Key")));
        }
        if doc.alias.is_empty() {
            return Err(Error::format(format!("{item_type} document has no Alias")));
        }
        Ok(())
    }

    /// Canonical JSON value. Object keys are ordered, so equal documents
    /// always produce identical values and identical text.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        match self {
            Document::Content(doc) => {
                map.insert("Type".into(), Value::String(doc.item_type.clone()));
                map.insert("Key".into(), Value::String(doc.key.to_string()));
                map.insert("Alias".into(), Value::String(doc.alias.clone()));
                map.insert("Level".into(), Value::from(doc.level));
                map.insert("Body".into(), doc.body.clone());
            }
            Document::Marker(marker) => {
                map.insert("Type".into(), Value::String(MARKER_TYPE.into()));
                map.insert("Key".into(), Value::String(marker.key.to_string()));
                map.insert("Alias".into(), Value::String(marker.alias.clone()));
                map.insert("Action".into(), Value::String(marker.action.to_string()));
            }
        }
        Value::Object(map)
    }

    /// Pretty-printed file text.
    pub fn to_text(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.to_value())?;
        text.push('\n');
        Ok(text)
    }

    /// Build a document from a parsed JSON value.
    ///
    /// Missing or unparseable `Key`/`Alias`/`Level` fall back to nil / empty /
    /// zero so that validity is decided later by the codec. A value that is
    /// not an object or has no `Type` is a format error.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::format("document root must be an object"));
        };

        let item_type = match map.remove("Type") {
            Some(Value::String(tag)) if !tag.is_empty() => tag,
            _ => return Err(Error::format("document has no Type")),
        };

        let key = map
            .get("Key")
            .and_then(Value::as_str)
            .and_then(|k| Uuid::parse_str(k).ok())
            .unwrap_or(Uuid::nil());
        let alias = map
            .get("Alias")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if item_type == MARKER_TYPE {
            let action = map
                .get("Action")
                .and_then(Value::as_str)
                .map(str::parse)
                .transpose()?
                .unwrap_or_default();
            return Ok(Document::Marker(MarkerDocument { key, alias, action }));
        }

        let level = map
            .get("Level")
            .and_then(Value::as_i64)
            .and_then(|l| i32::try_from(l).ok())
            .unwrap_or(0);
        let body = match map.remove("Body") {
            Some(body @ Value::Object(_)) => body,
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(_) => return Err(Error::format("document Body must be an object")),
        };

        Ok(Document::Content(ContentDocument {
            item_type,
            key,
            alias,
            level,
            body,
        }))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::format(format!("invalid document: {e}")))?;
        Self::from_value(value)
    }

    /// Read and parse a document file.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let text = sync_fs::io::read_text(path).map_err(|e| {
            if e.is_not_found() {
                Error::FileNotFound {
                    path: path.to_native(),
                }
            } else {
                Error::Fs(e)
            }
        })?;
        Self::parse(&text)
    }

    /// Atomically write this document to `path`.
    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        sync_fs::io::write_text(path, &self.to_text()?)?;
        Ok(())
    }
}

impl From<ContentDocument> for Document {
    fn from(doc: ContentDocument) -> Self {
        Document::Content(doc)
    }
}

impl From<MarkerDocument> for Document {
    fn from(marker: MarkerDocument) -> Self {
        Document::Marker(marker)
    }
}
