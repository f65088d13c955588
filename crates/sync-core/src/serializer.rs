//! Per-entity-type document codec
//!
//! [`Serializer`] is the plugin seam between the engine and a system of
//! record. Implementors supply the required methods; change classification,
//! hashing, marker handling and the import routing are provided on top.

use sync_fs::Checksum;
use uuid::Uuid;

use crate::attempt::SyncAttempt;
use crate::change::ChangeType;
use crate::document::{ContentDocument, Document, MarkerDocument, SyncActionType};
use crate::{Error, Result};

/// Options controlling a single deserialize call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializerFlags {
    /// Apply the document even when it matches live state
    pub force: bool,
    /// Build or mutate the item but leave persistence to a batched save
    pub do_not_save: bool,
    /// Run the second pass immediately after the first
    pub one_pass: bool,
    /// Never touch an item that already exists
    pub create_only: bool,
}

impl SerializerFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn do_not_save(mut self, do_not_save: bool) -> Self {
        self.do_not_save = do_not_save;
        self
    }

    pub fn one_pass(mut self, one_pass: bool) -> Self {
        self.one_pass = one_pass;
        self
    }

    pub fn create_only(mut self, create_only: bool) -> Self {
        self.create_only = create_only;
        self
    }
}

/// Serializes one item type to documents and back.
pub trait Serializer {
    type Item: Clone;

    /// Type tag written into every content document.
    fn item_type(&self) -> &str;

    /// Build the document for an item. Must be deterministic.
    fn serialize(&self, item: &Self::Item) -> Result<ContentDocument>;

    /// Create or update an item from a validated content document.
    ///
    /// Implementations look up the existing item through
    /// [`Serializer::find_item`] and mutate it rather than creating a
    /// duplicate. Persistence is left to [`Serializer::deserialize`].
    fn deserialize_core(
        &self,
        doc: &ContentDocument,
        flags: &SerializerFlags,
    ) -> Result<SyncAttempt<Self::Item>>;

    fn find_by_key(&self, key: Uuid) -> Result<Option<Self::Item>>;

    fn find_by_alias(&self, alias: &str) -> Result<Option<Self::Item>>;

    /// Persist an item. Saving an unchanged item is not an error.
    fn save(&self, item: &Self::Item) -> Result<()>;

    /// Remove an item. Deleting an absent item is not an error.
    fn delete(&self, item: &Self::Item) -> Result<()>;

    fn item_key(&self, item: &Self::Item) -> Uuid;

    fn item_alias(&self, item: &Self::Item) -> String;

    /// Whether references are resolved in a second pass.
    fn is_two_pass(&self) -> bool {
        false
    }

    /// Resolve references once every first-pass item exists.
    ///
    /// Implementations persist the item themselves unless
    /// `flags.do_not_save` is set.
    fn deserialize_second_pass(
        &self,
        item: Self::Item,
        doc: &ContentDocument,
        _flags: &SerializerFlags,
    ) -> Result<SyncAttempt<Self::Item>> {
        Ok(SyncAttempt::succeed_with(
            doc.alias.clone(),
            item,
            ChangeType::NoChange,
        ))
    }

    /// Bulk persistence used by batched imports.
    fn save_all(&self, items: &[Self::Item]) -> Result<()> {
        for item in items {
            self.save(item)?;
        }
        Ok(())
    }

    /// Strip volatile attributes before hashing.
    fn cleanse(&self, doc: Document) -> Document {
        doc
    }

    fn is_valid(&self, doc: &ContentDocument) -> bool {
        doc.item_type == self.item_type() && !doc.key.is_nil() && !doc.alias.is_empty()
    }

    /// Key lookup first, alias as fallback.
    fn find_item(&self, key: Uuid, alias: &str) -> Result<Option<Self::Item>> {
        if !key.is_nil()
            && let Some(item) = self.find_by_key(key)?
        {
            return Ok(Some(item));
        }
        if alias.is_empty() {
            return Ok(None);
        }
        self.find_by_alias(alias)
    }

    /// `sha256:<hex>` over the cleansed document's canonical JSON.
    fn make_hash(&self, doc: &Document) -> Result<String> {
        let cleansed = self.cleanse(doc.clone());
        let canonical = serde_json::to_string(&cleansed.to_value())?;
        Ok(Checksum::of_str(&canonical).into())
    }

    /// Classify a document against live state. Never writes.
    fn is_current(&self, doc: Option<&Document>) -> Result<ChangeType> {
        let Some(doc) = doc else {
            return Ok(ChangeType::Update);
        };
        doc.validate(self.item_type())?;

        let Some(item) = self.find_item(doc.key(), doc.alias())? else {
            return Ok(match doc.marker_action() {
                Some(SyncActionType::Clean) => ChangeType::Clean,
                Some(_) => ChangeType::NoChange,
                None => ChangeType::Create,
            });
        };

        if let Document::Marker(marker) = doc {
            return Ok(match marker.action {
                SyncActionType::Delete => ChangeType::Delete,
                SyncActionType::Clean => ChangeType::Clean,
                SyncActionType::Rename | SyncActionType::None => ChangeType::NoChange,
            });
        }

        let current = match self.serialize(&item) {
            Ok(current) => Document::Content(current),
            Err(e) => {
                tracing::debug!(alias = doc.alias(), error = %e, "live item failed to serialize");
                return Ok(ChangeType::Create);
            }
        };

        let current_hash = self.make_hash(&current)?;
        if current_hash.is_empty() {
            return Ok(ChangeType::Update);
        }
        if self.make_hash(doc)? == current_hash {
            Ok(ChangeType::NoChange)
        } else {
            Ok(ChangeType::Update)
        }
    }

    /// Apply a document to live state.
    ///
    /// Markers are routed to [`Serializer::process_action`]. Content is
    /// applied when forced or when it differs from live state; the returned
    /// change is the classification, or `Import` for a forced apply of an
    /// unchanged document.
    fn deserialize(&self, doc: &Document, flags: &SerializerFlags) -> Result<SyncAttempt<Self::Item>> {
        let content = match doc {
            Document::Marker(marker) => return self.process_action(marker, flags),
            Document::Content(content) => content,
        };

        if !self.is_valid(content) {
            doc.validate(self.item_type())?;
            return Err(Error::format(format!(
                "invalid {} document for '{}'",
                self.item_type(),
                content.alias
            )));
        }

        if flags.create_only && self.find_item(content.key, &content.alias)?.is_some() {
            tracing::debug!(alias = %content.alias, "create only: item already exists");
            return Ok(SyncAttempt::succeed(
                content.alias.clone(),
                ChangeType::AlreadyExists,
            ));
        }

        let classification = self.is_current(Some(doc))?;
        if !flags.force && !classification.has_changes() {
            return Ok(SyncAttempt::succeed(
                content.alias.clone(),
                ChangeType::NoChange,
            ));
        }

        let mut attempt = self.deserialize_core(content, flags)?;
        if !attempt.success {
            return Ok(attempt);
        }
        attempt.change = if classification.has_changes() {
            classification
        } else {
            ChangeType::Import
        };

        if !flags.do_not_save
            && let Some(item) = &attempt.item
        {
            self.save(item)?;
        }

        if flags.one_pass
            && self.is_two_pass()
            && let Some(item) = attempt.item.take()
        {
            let second = self.deserialize_second_pass(item, content, flags)?;
            if !second.success {
                return Ok(second);
            }
            attempt.item = second.item;
            attempt.details.extend(second.details);
        }

        Ok(attempt)
    }

    /// Apply a marker document.
    fn process_action(
        &self,
        marker: &MarkerDocument,
        _flags: &SerializerFlags,
    ) -> Result<SyncAttempt<Self::Item>> {
        let name = if marker.alias.is_empty() {
            marker.key.to_string()
        } else {
            marker.alias.clone()
        };

        match marker.action {
            SyncActionType::Delete => match self.find_item(marker.key, &marker.alias)? {
                Some(item) => {
                    self.delete(&item)?;
                    tracing::debug!(%name, "deleted by marker");
                    Ok(SyncAttempt::succeed(name, ChangeType::Delete))
                }
                None => Ok(SyncAttempt::succeed(name, ChangeType::NoChange)),
            },
            SyncActionType::Clean => Ok(SyncAttempt::succeed(name, ChangeType::Clean)),
            SyncActionType::Rename | SyncActionType::None => {
                Ok(SyncAttempt::succeed(name, ChangeType::NoChange))
            }
        }
    }

    fn serialize_empty(&self, key: Uuid, action: SyncActionType, alias: &str) -> MarkerDocument {
        MarkerDocument::new(key, alias, action)
    }

    /// Marker for an item; the alias defaults to the item's own.
    fn serialize_empty_for(
        &self,
        item: &Self::Item,
        action: SyncActionType,
        alias: Option<&str>,
    ) -> MarkerDocument {
        let alias = alias
            .map(str::to_string)
            .unwrap_or_else(|| self.item_alias(item));
        self.serialize_empty(self.item_key(item), action, &alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        key: Uuid,
        alias: String,
        title: String,
    }

    #[derive(Default)]
    struct NoteSerializer {
        notes: RefCell<BTreeMap<Uuid, Note>>,
        saves: RefCell<usize>,
    }

    impl NoteSerializer {
        fn with(notes: &[Note]) -> Self {
            let serializer = Self::default();
            for note in notes {
                serializer.notes.borrow_mut().insert(note.key, note.clone());
            }
            serializer
        }
    }

    impl Serializer for NoteSerializer {
        type Item = Note;

        fn item_type(&self) -> &str {
            "Note"
        }

        fn serialize(&self, item: &Note) -> Result<ContentDocument> {
            Ok(ContentDocument::new("Note", item.key, &item.alias, 0)
                .with_body(json!({ "Title": item.title })))
        }

        fn deserialize_core(
            &self,
            doc: &ContentDocument,
            _flags: &SerializerFlags,
        ) -> Result<SyncAttempt<Note>> {
            let mut note = self.find_item(doc.key, &doc.alias)?.unwrap_or(Note {
                key: doc.key,
                alias: doc.alias.clone(),
                title: String::new(),
            });
            note.alias = doc.alias.clone();
            note.title = doc
                .section("Title")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            Ok(SyncAttempt::succeed_with(doc.alias.clone(), note, ChangeType::Import))
        }

        fn find_by_key(&self, key: Uuid) -> Result<Option<Note>> {
            Ok(self.notes.borrow().get(&key).cloned())
        }

        fn find_by_alias(&self, alias: &str) -> Result<Option<Note>> {
            Ok(self.notes.borrow().values().find(|n| n.alias == alias).cloned())
        }

        fn save(&self, item: &Note) -> Result<()> {
            *self.saves.borrow_mut() += 1;
            self.notes.borrow_mut().insert(item.key, item.clone());
            Ok(())
        }

        fn delete(&self, item: &Note) -> Result<()> {
            self.notes.borrow_mut().remove(&item.key);
            Ok(())
        }

        fn item_key(&self, item: &Note) -> Uuid {
            item.key
        }

        fn item_alias(&self, item: &Note) -> String {
            item.alias.clone()
        }
    }

    fn note(title: &str) -> Note {
        Note {
            key: Uuid::new_v4(),
            alias: "welcome".into(),
            title: title.into(),
        }
    }

    fn doc_for(serializer: &NoteSerializer, note: &Note) -> Document {
        Document::Content(serializer.serialize(note).unwrap())
    }

    #[test]
    fn absent_document_is_update() {
        let serializer = NoteSerializer::default();
        assert_eq!(serializer.is_current(None).unwrap(), ChangeType::Update);
    }

    #[test]
    fn unknown_item_is_create_and_matching_item_is_no_change() {
        let existing = note("Hello");
        let serializer = NoteSerializer::with(std::slice::from_ref(&existing));

        let same = doc_for(&serializer, &existing);
        assert_eq!(serializer.is_current(Some(&same)).unwrap(), ChangeType::NoChange);

        let fresh = doc_for(&serializer, &note("Other"));
        let fresh = match fresh {
            Document::Content(mut c) => {
                c.alias = "fresh".into();
                Document::Content(c)
            }
            marker => marker,
        };
        assert_eq!(serializer.is_current(Some(&fresh)).unwrap(), ChangeType::Create);
    }

    #[test]
    fn alias_lookup_is_used_when_key_misses() {
        let existing = note("Hello");
        let serializer = NoteSerializer::with(std::slice::from_ref(&existing));

        let mut moved = existing.clone();
        moved.key = Uuid::new_v4();
        let doc = doc_for(&serializer, &moved);
        assert_eq!(serializer.is_current(Some(&doc)).unwrap(), ChangeType::Update);
    }

    #[test]
    fn invalid_content_is_format_error() {
        let serializer = NoteSerializer::default();
        let doc = Document::Content(ContentDocument::new("Note", Uuid::nil(), "x", 0));
        assert!(matches!(
            serializer.is_current(Some(&doc)),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn deserialize_creates_then_reports_no_change() {
        let serializer = NoteSerializer::default();
        let doc = doc_for(&serializer, &note("Hello"));

        let first = serializer.deserialize(&doc, &SerializerFlags::new()).unwrap();
        assert_eq!(first.change, ChangeType::Create);
        assert_eq!(*serializer.saves.borrow(), 1);

        let second = serializer.deserialize(&doc, &SerializerFlags::new()).unwrap();
        assert_eq!(second.change, ChangeType::NoChange);
        assert!(second.item.is_none());
        assert_eq!(*serializer.saves.borrow(), 1);
    }

    #[test]
    fn forced_unchanged_document_is_import() {
        let existing = note("Hello");
        let serializer = NoteSerializer::with(std::slice::from_ref(&existing));
        let doc = doc_for(&serializer, &existing);

        let attempt = serializer
            .deserialize(&doc, &SerializerFlags::new().force(true))
            .unwrap();
        assert_eq!(attempt.change, ChangeType::Import);
    }

    #[test]
    fn do_not_save_defers_persistence() {
        let serializer = NoteSerializer::default();
        let doc = doc_for(&serializer, &note("Hello"));

        let attempt = serializer
            .deserialize(&doc, &SerializerFlags::new().do_not_save(true))
            .unwrap();
        assert!(attempt.item.is_some());
        assert_eq!(*serializer.saves.borrow(), 0);
    }

    #[test]
    fn create_only_leaves_existing_item() {
        let existing = note("Hello");
        let serializer = NoteSerializer::with(std::slice::from_ref(&existing));
        let mut changed = existing.clone();
        changed.title = "Changed".into();
        let doc = doc_for(&serializer, &changed);

        let attempt = serializer
            .deserialize(&doc, &SerializerFlags::new().create_only(true))
            .unwrap();
        assert_eq!(attempt.change, ChangeType::AlreadyExists);
        assert_eq!(serializer.find_by_key(existing.key).unwrap(), Some(existing));
    }

    #[test]
    fn delete_marker_removes_item_once() {
        let existing = note("Hello");
        let serializer = NoteSerializer::with(std::slice::from_ref(&existing));
        let marker = Document::Marker(serializer.serialize_empty_for(
            &existing,
            SyncActionType::Delete,
            None,
        ));

        assert_eq!(serializer.is_current(Some(&marker)).unwrap(), ChangeType::Delete);
        let attempt = serializer.deserialize(&marker, &SerializerFlags::new()).unwrap();
        assert_eq!(attempt.change, ChangeType::Delete);
        assert!(serializer.find_by_key(existing.key).unwrap().is_none());

        let again = serializer.deserialize(&marker, &SerializerFlags::new()).unwrap();
        assert_eq!(again.change, ChangeType::NoChange);
        assert_eq!(serializer.is_current(Some(&marker)).unwrap(), ChangeType::NoChange);
    }

    #[test]
    fn clean_marker_classifies_as_clean_either_way() {
        let existing = note("Hello");
        let serializer = NoteSerializer::with(std::slice::from_ref(&existing));

        let found = Document::Marker(MarkerDocument::new(existing.key, "", SyncActionType::Clean));
        let missing = Document::Marker(MarkerDocument::new(Uuid::new_v4(), "", SyncActionType::Clean));
        assert_eq!(serializer.is_current(Some(&found)).unwrap(), ChangeType::Clean);
        assert_eq!(serializer.is_current(Some(&missing)).unwrap(), ChangeType::Clean);
    }

    #[test]
    fn hash_ignores_body_key_order() {
        let serializer = NoteSerializer::default();
        let key = Uuid::new_v4();
        let a: Document = ContentDocument::new("Note", key, "a", 0)
            .with_body(serde_json::from_str(r#"{"x": 1, "y": {"b": 2, "a": 1}}"#).unwrap())
            .into();
        let b: Document = ContentDocument::new("Note", key, "a", 0)
            .with_body(serde_json::from_str(r#"{"y": {"a": 1, "b": 2}, "x": 1}"#).unwrap())
            .into();
        assert_eq!(serializer.make_hash(&a).unwrap(), serializer.make_hash(&b).unwrap());
    }
}
