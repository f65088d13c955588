//! Deletion by absence, driven by clean markers

use std::collections::HashSet;

use sync_fs::NormalizedPath;
use uuid::Uuid;

use super::{EntitySource, Handler};
use crate::action::SyncAction;
use crate::change::ChangeType;
use crate::document::{DOCUMENT_EXTENSION, Document, SyncActionType};
use crate::paths;
use crate::serializer::Serializer;
use crate::{Error, Result};

impl<S, E> Handler<S, E>
where
    S: Serializer,
    E: EntitySource<Item = S::Item>,
{
    /// Delete (or with `report_only`, just report) every live child of the
    /// marker's parent whose key appears in no content document anywhere
    /// under the marker's folder.
    ///
    /// Items inside containers under the parent count as its children;
    /// containers themselves are never removed. A candidate with a
    /// descendant that still has a document is reported as a failure and
    /// left in place.
    ///
    /// A marker with a nil key refers to the root. A parent that no longer
    /// exists has no children and yields no actions.
    pub fn clean_folder(&self, marker_file: &NormalizedPath, report_only: bool) -> Vec<SyncAction> {
        match self.clean_candidates(marker_file) {
            Ok(candidates) => candidates
                .iter()
                .map(|(item, kept)| match kept {
                    Some(kept) => self.kept_by_descendant(item, kept),
                    None => self.clean_item(item, report_only),
                })
                .collect(),
            Err(e) => vec![self.failed_action(marker_file, &e)],
        }
    }

    /// Children without a document, each paired with the first descendant
    /// that still has one.
    fn clean_candidates(&self, marker_file: &NormalizedPath) -> Result<Vec<(S::Item, Option<S::Item>)>> {
        let parent = Document::load(marker_file)?.key();
        let folder = marker_file
            .parent()
            .ok_or_else(|| Error::not_found(format!("folder of {marker_file}")))?;

        let parent = (!parent.is_nil()).then_some(parent);

        let keys = folder_keys(&folder)?;
        let mut candidates = Vec::new();
        for child in self.items_under(parent)? {
            let key = self.serializer.item_key(&child);
            if keys.contains(&key) {
                continue;
            }
            let kept = self.documented_descendant(key, &keys)?;
            candidates.push((child, kept));
        }

        tracing::debug!(
            %folder,
            referenced = keys.len(),
            candidates = candidates.len(),
            "clean candidates computed"
        );
        Ok(candidates)
    }

    /// Items directly under `parent`, plus those inside its containers at
    /// any depth.
    fn items_under(&self, parent: Option<Uuid>) -> Result<Vec<S::Item>> {
        let mut items = self.source.children(parent)?;
        for container in self.source.containers(parent)? {
            items.extend(self.items_under(Some(container))?);
        }
        Ok(items)
    }

    fn documented_descendant(&self, key: Uuid, keys: &HashSet<Uuid>) -> Result<Option<S::Item>> {
        for child in self.items_under(Some(key))? {
            let child_key = self.serializer.item_key(&child);
            if keys.contains(&child_key) {
                return Ok(Some(child));
            }
            if let Some(found) = self.documented_descendant(child_key, keys)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn kept_by_descendant(&self, item: &S::Item, kept: &S::Item) -> SyncAction {
        let key = self.serializer.item_key(item);
        tracing::warn!(%key, kept = %self.serializer.item_key(kept), "not cleaned, descendant still has a document");
        self.action(false, ChangeType::Fail, self.source.item_name(item))
            .with_key(key)
            .with_message(format!(
                "Not removed by clean: '{}' below it still has a document",
                self.source.item_name(kept)
            ))
    }

    fn clean_item(&self, item: &S::Item, report_only: bool) -> SyncAction {
        let name = self.source.item_name(item);
        let key = self.serializer.item_key(item);
        let action = self.action(true, ChangeType::Delete, name).with_key(key);

        if report_only {
            return action.with_message("Will be removed by clean");
        }
        match self.source.delete(item) {
            Ok(()) => {
                tracing::debug!(%key, "removed by clean");
                action.with_message("Removed by clean")
            }
            Err(e) => SyncAction {
                success: false,
                change: ChangeType::Fail,
                ..action
            }
            .with_message(e.to_string()),
        }
    }

    /// Write a clean marker for the children of `parent_key` (nil for the
    /// root) into the folder holding those children's documents.
    ///
    /// In a flat layout every parent's marker shares the handler folder, so
    /// the file name carries the parent's alias (or key when files are
    /// key-named). In a tree layout the marker sits in the parent's own
    /// folder.
    pub fn write_clean_marker(&self, parent_key: Uuid, folder: &NormalizedPath) -> Result<NormalizedPath> {
        let settings = self.settings();
        let (target, prefix, alias) = if parent_key.is_nil() {
            (folder.clone(), String::new(), String::new())
        } else {
            let parent = self
                .source
                .get(parent_key)?
                .ok_or_else(|| Error::not_found(format!("item {parent_key}")))?;
            let alias = self.serializer.item_alias(&parent);
            if settings.flat_structure {
                let prefix = if settings.guid_names {
                    parent_key.to_string()
                } else {
                    paths::safe_alias(&alias)
                };
                (folder.clone(), prefix, alias)
            } else {
                let target = folder.join(&self.source.item_path(&parent, settings.guid_names, false)?);
                (target, String::new(), alias)
            }
        };

        let marker = self
            .serializer
            .serialize_empty(parent_key, SyncActionType::Clean, &alias);
        let file = target.join(&paths::clean_marker_name(&prefix));
        Document::Marker(marker).save(&file)?;
        tracing::info!(%file, "clean marker written");
        Ok(file)
    }
}

/// Keys of every content document under `folder`, recursively. An
/// unreadable document fails the whole clean.
fn folder_keys(folder: &NormalizedPath) -> Result<HashSet<Uuid>> {
    let mut keys = HashSet::new();
    for file in sync_fs::io::list_files_recursive(folder, DOCUMENT_EXTENSION)? {
        if let Document::Content(doc) = Document::load(&file)? {
            keys.insert(doc.key);
        }
    }
    Ok(keys)
}
