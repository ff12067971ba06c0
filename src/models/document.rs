// Document model for the tab session
// UUID for stable ID, optional backing path for saved files

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Placeholder name for documents that have never been saved
pub const UNTITLED_NAME: &str = "Untitled";

/// Opaque tab identifier, unique for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One open editable buffer (a tab)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub display_name: String,
    pub source_path: Option<PathBuf>, // None for unsaved documents
    pub text: String,
    pub dirty: bool, // Modified since load or last save
}

impl Document {
    pub fn new(display_name: impl Into<String>, source_path: Option<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            display_name: display_name.into(),
            source_path,
            text: text.into(),
            dirty: false,
        }
    }

    /// True when this document is backed by `path`
    pub fn is_backed_by(&self, path: &Path) -> bool {
        self.source_path.as_deref() == Some(path)
    }
}

/// Display name derived from the last path component
pub fn display_name_for(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
