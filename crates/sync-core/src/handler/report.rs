//! Read-only comparison of a folder against live state

use sync_fs::NormalizedPath;

use super::{EntitySource, Handler};
use crate::action::{ChangeDetail, SyncAction};
use crate::change::ChangeType;
use crate::document::{DOCUMENT_EXTENSION, Document};
use crate::progress::Progress;
use crate::serializer::Serializer;
use crate::{Error, Result};

impl<S, E> Handler<S, E>
where
    S: Serializer,
    E: EntitySource<Item = S::Item>,
{
    /// Classify every document under `folder` without writing anything.
    pub fn report(&self, folder: &NormalizedPath, progress: &mut Progress<'_>) -> Vec<SyncAction> {
        let files = match sync_fs::io::list_files_recursive(folder, DOCUMENT_EXTENSION) {
            Ok(files) => files,
            Err(e) => return vec![self.failed_action(folder, &Error::from(e))],
        };

        let total = files.len();
        let mut actions = Vec::new();
        for (index, file) in files.iter().enumerate() {
            progress.report(file.file_stem().unwrap_or_default(), index + 1, total);
            actions.extend(self.report_file(file));
        }
        actions
    }

    /// Report on a single document file.
    ///
    /// A clean marker yields the deletes a clean would perform in its place.
    pub fn report_file(&self, file: &NormalizedPath) -> Vec<SyncAction> {
        match self.report_document(file) {
            Ok(actions) => actions,
            Err(e) => vec![self.failed_action(file, &e)],
        }
    }

    fn report_document(&self, file: &NormalizedPath) -> Result<Vec<SyncAction>> {
        let doc = Document::load(file)?;
        let change = self.serializer.is_current(Some(&doc))?;
        if change == ChangeType::Clean {
            return Ok(self.clean_folder(file, true));
        }

        let mut action = self
            .action(true, change, doc.alias())
            .with_file(file)
            .with_key(doc.key());

        if change.has_changes() {
            let details = self.change_details(&doc)?;
            let message = if details.is_empty() && change != ChangeType::Create {
                "Change details not calculated".to_string()
            } else {
                change.to_string()
            };
            action = action.with_details(details).with_message(message);
        }
        Ok(vec![action])
    }

    fn change_details(&self, doc: &Document) -> Result<Vec<ChangeDetail>> {
        if doc.is_marker() {
            return Ok(Vec::new());
        }
        let current = match self.serializer.find_item(doc.key(), doc.alias())? {
            Some(item) => self
                .serializer
                .serialize(&item)
                .ok()
                .map(|c| self.serializer.cleanse(Document::Content(c))),
            None => None,
        };
        let incoming = self.serializer.cleanse(doc.clone());
        Ok(self.tracker.changes(current.as_ref(), &incoming))
    }
}
