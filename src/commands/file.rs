// File commands - open, save and recent files

use std::fs;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{display_name_for, OpenedFile, RecentFile};
use crate::storage::{absolute_path, Storage};

/// Read a file and record it as recently opened
pub fn read_file_by_path(storage: &Storage, path: &Path) -> Result<OpenedFile> {
    tracing::debug!(path = %path.display(), "read_file_by_path");

    let path = absolute_path(path);
    if path.is_dir() {
        return Err(AppError::NotAFile(path));
    }
    let content = fs::read_to_string(&path)?;

    if let Err(e) = storage.add_recent_file(&path) {
        tracing::warn!(error = %e, "failed to update recent files");
    }

    Ok(OpenedFile {
        name: display_name_for(&path),
        path,
        content,
    })
}

/// Write `content` to `path`, creating parent directories as needed
pub fn save_file(storage: &Storage, path: &Path, content: &str) -> Result<()> {
    tracing::debug!(path = %path.display(), bytes = content.len(), "save_file");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    if let Err(e) = storage.add_recent_file(path) {
        tracing::warn!(error = %e, "failed to update recent files");
    }
    Ok(())
}

pub fn get_recent_files(storage: &Storage) -> Vec<RecentFile> {
    let recent = storage.recent_files();
    tracing::debug!(count = recent.len(), "get_recent_files");
    recent
}

pub fn clear_recent_files(storage: &Storage) -> Result<()> {
    tracing::debug!("clear_recent_files");
    storage.clear_recent_files()
}
