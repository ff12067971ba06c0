// Common types exchanged with the front end
// All fields use camelCase on the wire

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Entry in the recent files list (stored in recent.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFile {
    pub path: PathBuf,
    pub name: String,
    pub accessed_at: DateTime<Utc>,
}

/// Result of reading a file from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenedFile {
    pub content: String,
    pub path: PathBuf,
    pub name: String,
}
