//! Export of live items to documents

use sync_fs::NormalizedPath;
use uuid::Uuid;

use super::{EntitySource, Handler};
use crate::Result;
use crate::action::SyncAction;
use crate::change::ChangeType;
use crate::document::Document;
use crate::progress::Progress;
use crate::serializer::Serializer;

impl<S, E> Handler<S, E>
where
    S: Serializer,
    E: EntitySource<Item = S::Item>,
{
    /// Export every item, walking containers and item children depth-first
    /// from the root. Never removes anything from `folder`.
    pub fn export_all(&self, folder: &NormalizedPath, progress: &mut Progress<'_>) -> Vec<SyncAction> {
        let mut items = Vec::new();
        if let Err(e) = self.collect_items(None, &mut items) {
            tracing::warn!(alias = %self.meta.alias, error = %e, "failed to walk live items");
            return vec![self
                .action(false, ChangeType::Fail, &self.meta.name)
                .with_message(e.to_string())];
        }

        tracing::info!(alias = %self.meta.alias, %folder, items = items.len(), "export started");
        let total = items.len();
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                progress.report(&self.source.item_name(item), index + 1, total);
                self.export(item, folder)
            })
            .collect()
    }

    fn collect_items(&self, parent: Option<Uuid>, items: &mut Vec<S::Item>) -> Result<()> {
        for container in self.source.containers(parent)? {
            self.collect_items(Some(container), items)?;
        }
        for item in self.source.children(parent)? {
            let key = self.serializer.item_key(&item);
            items.push(item);
            self.collect_items(Some(key), items)?;
        }
        Ok(())
    }

    /// Write one item's document under `folder`.
    pub fn export(&self, item: &S::Item, folder: &NormalizedPath) -> SyncAction {
        let name = self.source.item_name(item);
        let key = self.serializer.item_key(item);

        if let Some(filter) = &self.export_filter
            && !filter(item, &self.settings())
        {
            return self
                .action(true, ChangeType::NoChange, name)
                .with_key(key)
                .with_message("Not exported (based on config)");
        }

        match self.write_item(item, folder) {
            Ok(file) => {
                tracing::debug!(%file, %name, "exported");
                self.action(true, ChangeType::Export, name)
                    .with_key(key)
                    .with_file(&file)
            }
            Err(e) => self
                .action(false, ChangeType::Fail, name)
                .with_key(key)
                .with_message(e.to_string()),
        }
    }

    fn write_item(&self, item: &S::Item, folder: &NormalizedPath) -> Result<NormalizedPath> {
        let doc = Document::Content(self.serializer.serialize(item)?);
        let file = self.item_file(item, folder)?;
        doc.save(&file)?;
        Ok(file)
    }

    /// Export the item with `key`.
    pub fn export_key(&self, key: Uuid, folder: &NormalizedPath) -> SyncAction {
        match self.source.get(key) {
            Ok(Some(item)) => self.export(&item, folder),
            Ok(None) => self
                .action(false, ChangeType::Fail, key.to_string())
                .with_key(key)
                .with_message("Item not found"),
            Err(e) => self
                .action(false, ChangeType::Fail, key.to_string())
                .with_key(key)
                .with_message(e.to_string()),
        }
    }

    /// The document an export of `key` would write, without writing it.
    pub fn get_element(&self, key: Uuid) -> Result<Option<Document>> {
        match self.source.get(key)? {
            Some(item) => Ok(Some(Document::Content(self.serializer.serialize(&item)?))),
            None => Ok(None),
        }
    }
}
