// Models module for MarkView
// Wire-facing structs serialize with camelCase keys for the front end

pub mod common;
pub mod config;
pub mod document;
pub mod folder;

pub use common::{OpenedFile, RecentFile};
pub use config::{Settings, SettingsUpdate, Theme};
pub use document::{display_name_for, Document, DocumentId, UNTITLED_NAME};
pub use folder::FileNode;
