//! Two-pass folder import

use sync_fs::NormalizedPath;

use super::{EntitySource, Handler};
use crate::action::SyncAction;
use crate::attempt::SyncAttempt;
use crate::change::ChangeType;
use crate::document::{DOCUMENT_EXTENSION, Document};
use crate::progress::Progress;
use crate::serializer::{Serializer, SerializerFlags};
use crate::{Error, Result};

/// Result of the first pass over one folder and everything below it.
///
/// Each recursive call returns its own value and the caller merges it, so
/// batch-save and clean boundaries stay per folder.
#[derive(Debug)]
pub struct FolderImport<T> {
    pub actions: Vec<SyncAction>,
    /// Items produced by the first pass, with the file they came from
    pub stashed: Vec<(NormalizedPath, T)>,
}

impl<T> Default for FolderImport<T> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            stashed: Vec::new(),
        }
    }
}

impl<T> FolderImport<T> {
    /// True when every action in this folder and below succeeded.
    pub fn success(&self) -> bool {
        self.actions.iter().all(|a| a.success)
    }

    pub fn merge(&mut self, other: FolderImport<T>) {
        self.actions.extend(other.actions);
        self.stashed.extend(other.stashed);
    }
}

impl<S, E> Handler<S, E>
where
    S: Serializer,
    E: EntitySource<Item = S::Item>,
{
    /// Import every document under `folder`, then run the second pass over
    /// every item the first pass produced anywhere in the tree.
    ///
    /// Events stay paused for the whole run.
    pub fn import_all(
        &self,
        folder: &NormalizedPath,
        force: bool,
        progress: &mut Progress<'_>,
    ) -> Vec<SyncAction> {
        let _paused = self.gate.pause();
        let settings = self.settings();
        let flags = SerializerFlags::new()
            .force(force)
            .do_not_save(settings.batch_save);

        tracing::info!(alias = %self.meta.alias, %folder, force, "import started");
        let first = self.import_folder(folder, &flags, progress);
        let mut actions = first.actions;
        actions.extend(self.import_second_pass(&first.stashed, &flags, progress));

        tracing::info!(
            alias = %self.meta.alias,
            actions = actions.len(),
            failed = actions.iter().filter(|a| !a.success).count(),
            "import finished"
        );
        actions
    }

    /// First pass over one folder.
    ///
    /// Files are processed by level, then name, then sub-folders. With
    /// `do_not_save` the items produced by each level of this folder's files
    /// are saved in one bulk call before the next level starts. Clean markers
    /// found here are only acted on when every action in this folder and
    /// below succeeded.
    pub fn import_folder(
        &self,
        folder: &NormalizedPath,
        flags: &SerializerFlags,
        progress: &mut Progress<'_>,
    ) -> FolderImport<S::Item> {
        let mut result = FolderImport::default();

        let files = match sync_fs::io::list_files(folder, DOCUMENT_EXTENSION) {
            Ok(files) => files,
            Err(e) => {
                result.actions.push(self.failed_action(folder, &Error::from(e)));
                return result;
            }
        };

        // Parents before children: stable sort of the name-ordered files by level.
        let mut loaded: Vec<(NormalizedPath, Result<Document>)> = files
            .into_iter()
            .map(|file| {
                let doc = Document::load(&file);
                (file, doc)
            })
            .collect();
        loaded.sort_by_key(|(_, doc)| doc.as_ref().map(Document::level).unwrap_or(0));

        let total = loaded.len();
        let mut clean_markers = Vec::new();
        let mut batch: Vec<S::Item> = Vec::new();
        let mut batch_level = None;
        for (index, (file, doc)) in loaded.iter().enumerate() {
            progress.report(file.file_stem().unwrap_or_default(), index + 1, total);

            let doc = match doc {
                Ok(doc) => doc,
                Err(e) => {
                    result.actions.push(self.failed_action(file, e));
                    continue;
                }
            };

            // Deeper levels resolve their parents from the store, so the
            // previous level's batch must be saved first.
            if flags.do_not_save && batch_level.is_some_and(|level| level != doc.level()) {
                self.save_batch(folder, &mut batch, &mut result.actions);
            }
            batch_level = Some(doc.level());
            match self.import_document_attempt(doc, flags) {
                Ok(attempt) => {
                    let mut action = SyncAction::from_attempt(
                        &self.meta.alias,
                        &self.meta.entity_type,
                        &attempt,
                        Some(file),
                    );
                    if let Some(item) = &attempt.item {
                        action = action.with_key(self.serializer.item_key(item));
                    }
                    if attempt.success && attempt.change == ChangeType::Clean {
                        clean_markers.push(file.clone());
                    } else if attempt.success
                        && let Some(item) = attempt.item
                    {
                        if flags.do_not_save {
                            batch.push(item.clone());
                        }
                        result.stashed.push((file.clone(), item));
                    }
                    result.actions.push(action);
                }
                Err(e) => result.actions.push(self.failed_action(file, &e)),
            }
        }

        self.save_batch(folder, &mut batch, &mut result.actions);

        match sync_fs::io::list_dirs(folder) {
            Ok(dirs) => {
                for dir in dirs {
                    result.merge(self.import_folder(&dir, flags, progress));
                }
            }
            Err(e) => result.actions.push(self.failed_action(folder, &Error::from(e))),
        }

        if !clean_markers.is_empty() {
            self.resolve_clean_markers(&mut result, &clean_markers);
        }
        result
    }

    /// Bulk save the pending items of one folder level.
    fn save_batch(&self, folder: &NormalizedPath, batch: &mut Vec<S::Item>, actions: &mut Vec<SyncAction>) {
        if batch.is_empty() {
            return;
        }
        tracing::debug!(%folder, count = batch.len(), "batch saving folder level");
        if let Err(e) = self.serializer.save_all(batch) {
            let error = Error::persistence(format!("batch save failed: {e}"));
            actions.push(self.failed_action(folder, &error));
        }
        batch.clear();
    }

    fn resolve_clean_markers(&self, result: &mut FolderImport<S::Item>, markers: &[NormalizedPath]) {
        let is_marker_action = |action: &SyncAction| {
            action.change == ChangeType::Clean
                && action
                    .file
                    .as_deref()
                    .is_some_and(|f| markers.iter().any(|m| m.as_str() == f))
        };

        if result.success() {
            result.actions.retain(|a| !is_marker_action(a));
            for marker in markers {
                let deletes = self.clean_folder(marker, false);
                result.actions.extend(deletes);
            }
        } else {
            tracing::warn!(
                alias = %self.meta.alias,
                markers = markers.len(),
                "import had failures, clean skipped"
            );
            for action in result.actions.iter_mut().filter(|a| is_marker_action(&**a)) {
                action.message = Some("Clean skipped: folder import had failures".into());
            }
        }
    }

    /// Second pass over stashed items. Only failures are reported.
    pub fn import_second_pass(
        &self,
        stashed: &[(NormalizedPath, S::Item)],
        flags: &SerializerFlags,
        progress: &mut Progress<'_>,
    ) -> Vec<SyncAction> {
        if !self.serializer.is_two_pass() || stashed.is_empty() {
            return Vec::new();
        }

        let mut actions = Vec::new();
        let mut updated = Vec::new();
        for (index, (file, item)) in stashed.iter().enumerate() {
            progress.report(file.file_stem().unwrap_or_default(), index + 1, stashed.len());

            match self.second_pass_file(file, item.clone(), flags) {
                Ok(attempt) if !attempt.success => {
                    actions.push(SyncAction::from_attempt(
                        &self.meta.alias,
                        &self.meta.entity_type,
                        &attempt,
                        Some(file),
                    ));
                }
                Ok(attempt) => {
                    if flags.do_not_save
                        && attempt.change.has_changes()
                        && let Some(item) = attempt.item
                    {
                        updated.push(item);
                    }
                }
                Err(e) => {
                    tracing::warn!(%file, error = %e, "second pass failed");
                    actions.push(self.failed_action(file, &e));
                }
            }
        }

        if !updated.is_empty()
            && let Err(e) = self.serializer.save_all(&updated)
        {
            tracing::warn!(error = %e, "second pass batch save failed");
            let error = Error::persistence(format!("batch save failed: {e}"));
            actions.push(SyncAction::new(
                false,
                &self.meta.alias,
                &self.meta.entity_type,
                ChangeType::Fail,
                "second pass",
            )
            .with_message(error.to_string()));
        }
        actions
    }

    fn second_pass_file(
        &self,
        file: &NormalizedPath,
        item: S::Item,
        flags: &SerializerFlags,
    ) -> Result<SyncAttempt<S::Item>> {
        let name = self.source.item_name(&item);
        let second_pass_error = |e: Error| Error::SecondPass {
            name: name.clone(),
            message: e.to_string(),
        };

        let doc = Document::load(file).map_err(second_pass_error)?;
        let Document::Content(content) = doc else {
            return Ok(SyncAttempt::succeed_with(name, item, ChangeType::NoChange));
        };
        self.serializer
            .deserialize_second_pass(item, &content, flags)
            .map_err(second_pass_error)
    }

    /// Import one file with both passes run immediately.
    ///
    /// A clean marker is resolved straight away into the deletes it causes.
    pub fn import_file(&self, file: &NormalizedPath, force: bool) -> Vec<SyncAction> {
        let _paused = self.gate.pause();
        let flags = SerializerFlags::new().force(force).one_pass(true);

        match self.import_file_attempt(file, &flags) {
            Ok(attempt) if attempt.success && attempt.change == ChangeType::Clean => {
                self.clean_folder(file, false)
            }
            Ok(attempt) => vec![SyncAction::from_attempt(
                &self.meta.alias,
                &self.meta.entity_type,
                &attempt,
                Some(file),
            )],
            Err(e) => vec![self.failed_action(file, &e)],
        }
    }

    /// Import an in-memory document with both passes run immediately.
    pub fn import_document(&self, doc: &Document, force: bool) -> SyncAction {
        let _paused = self.gate.pause();
        let flags = SerializerFlags::new().force(force).one_pass(true);

        match self.import_document_attempt(doc, &flags) {
            Ok(attempt) => {
                SyncAction::from_attempt(&self.meta.alias, &self.meta.entity_type, &attempt, None)
                    .with_key(doc.key())
            }
            Err(e) => self
                .action(false, ChangeType::Fail, doc.alias())
                .with_key(doc.key())
                .with_message(e.to_string()),
        }
    }

    fn import_file_attempt(
        &self,
        file: &NormalizedPath,
        flags: &SerializerFlags,
    ) -> Result<SyncAttempt<S::Item>> {
        let doc = Document::load(file)?;
        self.import_document_attempt(&doc, flags)
    }

    fn import_document_attempt(
        &self,
        doc: &Document,
        flags: &SerializerFlags,
    ) -> Result<SyncAttempt<S::Item>> {
        if let Some(filter) = &self.import_filter
            && !filter(doc, &self.settings())
        {
            return Ok(SyncAttempt::succeed(doc.alias(), ChangeType::NoChange)
                .with_message("Not imported (based on config)"));
        }
        self.serializer.deserialize(doc, flags)
    }
}
