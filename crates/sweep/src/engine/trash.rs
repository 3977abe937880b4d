use crate::error::{Result, SweepError};
use std::path::{Path, PathBuf};

/// Platform trash folder: `~/.Trash` on macOS, the freedesktop
/// `$XDG_DATA_HOME/Trash/files` elsewhere.
#[cfg(target_os = "macos")]
pub fn discover_trash_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".Trash"))
        .ok_or_else(|| SweepError::TrashUnavailable("HOME is not set".to_string()))
}

#[cfg(not(target_os = "macos"))]
pub fn discover_trash_dir() -> Result<PathBuf> {
    let xdg = xdg::BaseDirectories::new()
        .map_err(|e| SweepError::TrashUnavailable(format!("Failed to locate data home: {}", e)))?;
    Ok(xdg.get_data_home().join("Trash").join("files"))
}

/// Creates the trash folder if needed and confirms it is a directory.
pub fn ensure_trash_dir(path: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(path).map_err(|e| {
        SweepError::TrashUnavailable(format!("{}: {}", path.display(), e))
    })?;
    if !path.is_dir() {
        return Err(SweepError::TrashUnavailable(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}
