//! Reading and writing third-party JSON config documents.
//!
//! Reads are forgiving: anything that is not a readable JSON object is treated
//! as absent. Writes are atomic per file (temp file in the same directory,
//! then rename) and always end with a newline.

use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Read `path` as a JSON object.
///
/// Returns `None` when the file is missing, unreadable, not valid JSON, or
/// has a non-object top level.
pub fn read_document(path: &Path) -> Option<Value> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            trace!(path = %path.display(), error = %err, "config document not readable");
            return None;
        }
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(doc @ Value::Object(_)) => Some(doc),
        Ok(_) => {
            debug!(path = %path.display(), "config document is not a JSON object");
            None
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "config document is not valid JSON");
            None
        }
    }
}

/// Pretty-printed serialization with a trailing newline.
pub fn render_document(doc: &Value) -> Result<String, StoreError> {
    let mut text = serde_json::to_string_pretty(doc)?;
    text.push('\n');
    Ok(text)
}

/// Atomically replace `path` with `doc`, creating parent directories.
///
/// A symlinked `path` is followed, so the link survives and its target is
/// updated. An existing file keeps its permissions; a new one is created
/// `0644` on unix.
pub fn write_document(doc: &Value, path: &Path) -> Result<(), StoreError> {
    let text = render_document(doc)?;
    let target = resolve_target(path);

    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
    if let Some(permissions) = target_permissions(&target) {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| StoreError::io(tmp.path(), e))?;
    }
    tmp.write_all(text.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(&target).map_err(|e| StoreError::Persist {
        path: target.clone(),
        source: e.error,
    })?;

    debug!(path = %target.display(), bytes = text.len(), "wrote config document");
    Ok(())
}

/// The file a write to `path` should land in: the symlink target when
/// `path` is a live symlink, otherwise `path` itself.
fn resolve_target(path: &Path) -> PathBuf {
    let is_symlink = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if !is_symlink {
        return path.to_path_buf();
    }
    match fs::canonicalize(path) {
        Ok(resolved) => {
            trace!(link = %path.display(), target = %resolved.display(), "following symlink");
            resolved
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "dangling symlink, replacing it");
            path.to_path_buf()
        }
    }
}

fn target_permissions(target: &Path) -> Option<fs::Permissions> {
    match fs::metadata(target) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

/// Path of the backup for `path`: the full file name with `.bak` appended.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Copy `path` to its backup path, overwriting any previous backup.
///
/// Best-effort: failures are logged and yield `None`.
pub fn backup(path: &Path) -> Option<PathBuf> {
    let dest = backup_path(path);
    match fs::copy(path, &dest) {
        Ok(_) => {
            debug!(from = %path.display(), to = %dest.display(), "backed up config document");
            Some(dest)
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "backup skipped");
            None
        }
    }
}

/// Remove `path`. A missing file counts as success.
pub fn delete_document(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "deleted config document");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StoreError::io(path, err)),
    }
}
