// Folder tree model for the sidebar file browser

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A directory or markdown file in an opened folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    pub fn file(name: String, path: PathBuf) -> Self {
        Self { name, path, is_directory: false, children: Vec::new() }
    }

    pub fn directory(name: String, path: PathBuf) -> Self {
        Self { name, path, is_directory: true, children: Vec::new() }
    }
}
