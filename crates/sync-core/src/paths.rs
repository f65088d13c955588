//! Mapping between item identity and document file location

use sync_fs::NormalizedPath;
use uuid::Uuid;

use crate::Result;
use crate::document::{CLEAN_MARKER_SUFFIX, DOCUMENT_EXTENSION, Document, MarkerDocument, SyncActionType};

/// Length of the key suffix used to disambiguate clashing file names.
pub const SHORT_KEY_LENGTH: usize = 8;

/// First `length` hex characters of the dash-free key.
pub fn short_key(key: Uuid, length: usize) -> String {
    let simple = key.simple().to_string();
    simple[..length.min(simple.len())].to_string()
}

/// File-name-safe form of an alias.
///
/// Alphanumerics are kept, every other run of characters becomes a single
/// `-`. Case is preserved.
pub fn safe_alias(alias: &str) -> String {
    let mut slug = String::with_capacity(alias.len());
    let mut pending_dash = false;
    for ch in alias.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

/// File name of a clean marker, prefixed by `parent` (empty for the root or
/// for a parent with its own folder).
pub fn clean_marker_name(parent: &str) -> String {
    format!("{parent}{CLEAN_MARKER_SUFFIX}.{DOCUMENT_EXTENSION}")
}

/// Document path for an item.
///
/// `item_path` is the item's relative path without extension as computed by
/// the entity source for the current naming and layout. Flat key-named
/// layouts cannot clash. Flat alias-named layouts check the target for a
/// document with a different key and, if one is there, append
/// `_{short key}` to the file name.
pub fn get_path(
    folder: &NormalizedPath,
    item_path: &str,
    key: Uuid,
    use_guid: bool,
    flat: bool,
) -> Result<NormalizedPath> {
    if flat && use_guid {
        return Ok(folder.join(&format!("{key}.{DOCUMENT_EXTENSION}")));
    }

    let path = folder.join(&format!("{item_path}.{DOCUMENT_EXTENSION}"));
    if flat && !use_guid {
        return check_and_fix_clash(path, item_path, key);
    }
    Ok(path)
}

fn check_and_fix_clash(path: NormalizedPath, item_path: &str, key: Uuid) -> Result<NormalizedPath> {
    if !path.is_file() {
        return Ok(path);
    }

    let existing = Document::load(&path)?.key();
    if existing == key || existing.is_nil() {
        return Ok(path);
    }

    let stem = item_path.rsplit('/').next().unwrap_or(item_path);
    let renamed = path.with_file_name(&format!(
        "{stem}_{}.{DOCUMENT_EXTENSION}",
        short_key(key, SHORT_KEY_LENGTH)
    ));
    tracing::debug!(%path, %renamed, "file name clash, using key suffix");
    Ok(renamed)
}

/// First content document under `folder` (recursively) carrying `key`.
pub fn find_document(key: Uuid, folder: &NormalizedPath) -> Result<Option<NormalizedPath>> {
    for file in sync_fs::io::list_files_recursive(folder, DOCUMENT_EXTENSION)? {
        match Document::load(&file) {
            Ok(Document::Content(doc)) if doc.key == key => return Ok(Some(file)),
            Ok(_) => {}
            Err(e) => tracing::debug!(%file, error = %e, "skipping unreadable document during lookup"),
        }
    }
    Ok(None)
}

/// Rewrite stale documents for a renamed or moved item.
///
/// Every content document under `folder` (recursively) other than
/// `new_file` that carries `key` becomes a `Rename` marker keeping that
/// file's alias. Returns the rewritten files.
pub fn clean_up(key: Uuid, new_file: &NormalizedPath, folder: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
    let mut rewritten = Vec::new();
    for file in sync_fs::io::list_files_recursive(folder, DOCUMENT_EXTENSION)? {
        if file.eq_ignore_case(new_file) {
            continue;
        }
        let doc = match Document::load(&file) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(%file, error = %e, "skipping unreadable document during cleanup");
                continue;
            }
        };
        if doc.is_marker() || doc.key() != key {
            continue;
        }

        let marker = MarkerDocument::new(key, doc.alias(), SyncActionType::Rename);
        Document::Marker(marker).save(&file)?;
        tracing::debug!(%file, "stale document rewritten as rename marker");
        rewritten.push(file);
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ContentDocument;
    use tempfile::TempDir;

    fn key(s: &str) -> Uuid {
        Uuid::parse_str(s).unwrap()
    }

    #[test]
    fn short_key_uses_simple_form() {
        let k = key("6f1c1a3e-8a57-4b5e-9d3c-0c5b7d3f2a11");
        assert_eq!(short_key(k, 8), "6f1c1a3e");
        assert_eq!(short_key(k, 12), "6f1c1a3e8a57");
        assert_eq!(short_key(k, 99).len(), 32);
    }

    #[test]
    fn safe_alias_collapses_separators() {
        assert_eq!(safe_alias("Home Page!"), "Home-Page");
        assert_eq!(safe_alias("  a  / b "), "a-b");
        assert_eq!(safe_alias("???"), "item");
        assert_eq!(safe_alias("übersicht"), "übersicht");
    }

    #[test]
    fn flat_guid_path_is_key_named() {
        let folder = NormalizedPath::new("usync/entities");
        let k = key("6f1c1a3e-8a57-4b5e-9d3c-0c5b7d3f2a11");
        let path = get_path(&folder, "home", k, true, true).unwrap();
        assert_eq!(path.as_str(), "usync/entities/6f1c1a3e-8a57-4b5e-9d3c-0c5b7d3f2a11.config");
    }

    #[test]
    fn tree_path_mirrors_item_path() {
        let folder = NormalizedPath::new("usync/entities");
        let path = get_path(&folder, "home/about", Uuid::new_v4(), false, false).unwrap();
        assert_eq!(path.as_str(), "usync/entities/home/about.config");
    }

    #[test]
    fn clashing_alias_gets_key_suffix() {
        let temp = TempDir::new().unwrap();
        let folder = NormalizedPath::new(temp.path());
        let first = key("11111111-1111-4111-8111-111111111111");
        let second = key("22222222-2222-4222-8222-222222222222");

        let first_path = get_path(&folder, "home", first, false, true).unwrap();
        Document::from(ContentDocument::new("Entity", first, "home", 0))
            .save(&first_path)
            .unwrap();

        assert_eq!(get_path(&folder, "home", first, false, true).unwrap(), first_path);
        let second_path = get_path(&folder, "home", second, false, true).unwrap();
        assert_eq!(second_path, folder.join("home_22222222.config"));
    }

    #[test]
    fn clean_marker_names_carry_the_parent() {
        assert_eq!(clean_marker_name(""), "_clean.config");
        assert_eq!(clean_marker_name("home"), "home_clean.config");
    }

    #[test]
    fn find_document_skips_markers_and_other_keys() {
        let temp = TempDir::new().unwrap();
        let folder = NormalizedPath::new(temp.path());
        let k = Uuid::new_v4();

        assert_eq!(find_document(k, &folder).unwrap(), None);

        Document::Marker(MarkerDocument::new(k, "about", SyncActionType::Rename))
            .save(&folder.join("about.config"))
            .unwrap();
        Document::from(ContentDocument::new("Entity", Uuid::new_v4(), "other", 0))
            .save(&folder.join("other.config"))
            .unwrap();
        let nested = folder.join("home/about.config");
        Document::from(ContentDocument::new("Entity", k, "about", 0)).save(&nested).unwrap();

        assert_eq!(find_document(k, &folder).unwrap(), Some(nested));
    }

    #[test]
    fn clean_up_rewrites_stale_copies_as_rename_markers() {
        let temp = TempDir::new().unwrap();
        let folder = NormalizedPath::new(temp.path());
        let k = Uuid::new_v4();
        let other = Uuid::new_v4();

        let old_file = folder.join("old/home.config");
        let new_file = folder.join("new/start.config");
        let unrelated = folder.join("old/other.config");
        Document::from(ContentDocument::new("Entity", k, "home", 0)).save(&old_file).unwrap();
        Document::from(ContentDocument::new("Entity", k, "start", 0)).save(&new_file).unwrap();
        Document::from(ContentDocument::new("Entity", other, "other", 0))
            .save(&unrelated)
            .unwrap();

        let rewritten = clean_up(k, &new_file, &folder).unwrap();

        assert_eq!(rewritten, vec![old_file.clone()]);
        assert_eq!(
            Document::load(&old_file).unwrap(),
            Document::Marker(MarkerDocument::new(k, "home", SyncActionType::Rename))
        );
        assert!(!Document::load(&new_file).unwrap().is_marker());
        assert!(!Document::load(&unrelated).unwrap().is_marker());
    }
}
