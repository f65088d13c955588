//! Document tree I/O: atomic writes and deterministic folder walking
//!
//! Every listing function returns entries sorted by path so that folder
//! walks, and therefore reported actions, are reproducible run to run.

use std::fs::{self, OpenOptions};
use std::io::Write;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file with locking.
///
/// Writes to a temp file in the same directory, holds an exclusive advisory
/// lock while writing, then renames over the target.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;

    tracing::trace!(path = %path, bytes = content.len(), "wrote file");
    Ok(())
}

pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Remove a file; a file that is already gone is not an error.
pub fn remove_file(path: &NormalizedPath) -> Result<()> {
    match fs::remove_file(path.to_native()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path.to_native(), e)),
    }
}

/// Files directly inside `dir` with the given extension, sorted.
///
/// A missing directory yields an empty list. Temp files left by
/// [`write_atomic`] (dot-prefixed) are skipped.
pub fn list_files(dir: &NormalizedPath, extension: &str) -> Result<Vec<NormalizedPath>> {
    let mut files = Vec::new();
    for entry in read_dir_sorted(dir)? {
        if !entry.is_file() {
            continue;
        }
        let hidden = entry.file_name().is_some_and(|n| n.starts_with('.'));
        let matches = entry
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && !hidden {
            files.push(entry);
        }
    }
    Ok(files)
}

/// Sub-directories directly inside `dir`, sorted.
pub fn list_dirs(dir: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
    Ok(read_dir_sorted(dir)?
        .into_iter()
        .filter(|p| p.is_dir())
        .collect())
}

/// Every file with the given extension anywhere under `dir`, depth-first
/// (a folder's own files before its sub-folders).
pub fn list_files_recursive(dir: &NormalizedPath, extension: &str) -> Result<Vec<NormalizedPath>> {
    let mut files = list_files(dir, extension)?;
    for child in list_dirs(dir)? {
        files.extend(list_files_recursive(&child, extension)?);
    }
    Ok(files)
}

fn read_dir_sorted(dir: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
    let native = dir.to_native();
    let entries = match fs::read_dir(&native) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(&native, e)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&native, e))?;
        paths.push(NormalizedPath::new(entry.path()));
    }
    paths.sort();
    Ok(paths)
}
