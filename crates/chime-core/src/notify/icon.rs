//! Notification icon lookup.

use std::path::{Path, PathBuf};
use tracing::trace;

/// Directories searched for icon files, in order.
///
/// `$CHIME_ICON_DIR`, then `icons/` next to the executable, then
/// `<data dir>/chime/icons`.
pub fn icon_search_dirs() -> Vec<PathBuf> {
    let mut dirs_out = Vec::new();
    if let Some(dir) = std::env::var_os("CHIME_ICON_DIR").filter(|d| !d.is_empty()) {
        dirs_out.push(PathBuf::from(dir));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs_out.push(exe_dir.join("icons"));
    }
    if let Some(data) = dirs::data_dir() {
        dirs_out.push(data.join("chime").join("icons"));
    }
    dirs_out
}

/// Resolve `name` using the standard search directories.
pub fn resolve_icon(name: &str) -> Option<PathBuf> {
    resolve_icon_in(name, &icon_search_dirs())
}

/// Resolve `name` to an existing file.
///
/// Absolute paths are returned if they exist. Relative names are looked up in
/// each of `search_dirs`.
pub fn resolve_icon_in(name: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    let path = Path::new(name);
    if path.is_absolute() {
        return path.is_file().then(|| path.to_path_buf());
    }
    let found = search_dirs
        .iter()
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.is_file());
    trace!(icon = name, found = ?found, "icon lookup");
    found
}
