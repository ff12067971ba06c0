// Error type shared by storage, bridge commands and the watcher
// Session and search operations never fail and do not use it

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
    #[error("failed to decode base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid image data: {0}")]
    InvalidImageData(String),
    #[error("no config directory available")]
    NoConfigDir,
    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("{} is open with unsaved changes", .0.display())]
    UnsavedChanges(PathBuf),
}

pub type Result<T> = std::result::Result<T, AppError>;
