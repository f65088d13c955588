//! Live-system event handling
//!
//! Saves, moves and deletes in the system of record are mirrored to disk as
//! they happen. Every handler method here is a no-op while the event gate is
//! paused or when the handler is not enabled for `Save`.

use sync_fs::NormalizedPath;

use super::{EntitySource, Handler};
use crate::action::SyncAction;
use crate::change::ChangeType;
use crate::document::{Document, SyncActionType};
use crate::paths;
use crate::serializer::Serializer;
use crate::settings::HandlerAction;

impl<S, E> Handler<S, E>
where
    S: Serializer,
    E: EntitySource<Item = S::Item>,
{
    fn events_enabled(&self) -> bool {
        if self.gate.is_paused() {
            tracing::trace!(alias = %self.meta.alias, "events paused, ignoring");
            return false;
        }
        self.settings().is_enabled_for(HandlerAction::Save)
    }

    /// Re-export saved items into `folder`, rewriting stale copies left by
    /// renames unless files are key-named in a flat layout.
    pub fn on_saved(&self, items: &[S::Item], folder: &NormalizedPath) -> Vec<SyncAction> {
        if !self.events_enabled() {
            return Vec::new();
        }

        let settings = self.settings();
        let needs_cleanup = !(settings.guid_names && settings.flat_structure);
        let mut actions = Vec::new();
        for item in items {
            let action = self.export(item, folder);
            if action.success
                && needs_cleanup
                && let Some(file) = action.file.as_deref()
            {
                let file = NormalizedPath::new(file);
                if let Err(e) = paths::clean_up(self.serializer.item_key(item), &file, folder) {
                    tracing::warn!(%file, error = %e, "rename cleanup failed");
                }
            }
            actions.push(action);
        }
        actions
    }

    /// Moves are handled like saves: the item's path has changed, so the
    /// export lands in a new file and the old one becomes a rename marker.
    pub fn on_moved(&self, items: &[S::Item], folder: &NormalizedPath) -> Vec<SyncAction> {
        self.on_saved(items, folder)
    }

    /// Replace each deleted item's document with a delete marker.
    ///
    /// The item is already gone from the system of record, so its computed
    /// path may no longer match where its document lives. The marker
    /// overwrites the document found by key, and only falls back to the
    /// computed path when no document exists.
    pub fn on_deleted(&self, items: &[S::Item], folder: &NormalizedPath) -> Vec<SyncAction> {
        if !self.events_enabled() {
            return Vec::new();
        }

        items
            .iter()
            .map(|item| {
                let name = self.source.item_name(item);
                let key = self.serializer.item_key(item);
                let marker = self
                    .serializer
                    .serialize_empty_for(item, SyncActionType::Delete, None);

                let written = paths::find_document(key, folder)
                    .and_then(|found| match found {
                        Some(file) => Ok(file),
                        None => self.item_file(item, folder),
                    })
                    .and_then(|file| Document::Marker(marker).save(&file).map(|()| file));
                match written {
                    Ok(file) => {
                        tracing::debug!(%file, %name, "delete marker written");
                        self.action(true, ChangeType::Removed, name)
                            .with_key(key)
                            .with_file(&file)
                    }
                    Err(e) => self
                        .action(false, ChangeType::Fail, name)
                        .with_key(key)
                        .with_message(e.to_string()),
                }
            })
            .collect()
    }
}
