// Filesystem-based storage layer for MarkView
// Settings and the recent files list are JSON files in the user config directory

use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{AppError, Result};
use crate::models::{display_name_for, RecentFile, Settings, SettingsUpdate};

pub const APP_DIR_NAME: &str = "markview";
pub const MAX_RECENT_FILES: usize = 10;

// ============================================
// PATH HELPERS
// ============================================

/// Default config directory (e.g. ~/.config/markview/)
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(AppError::NoConfigDir)
}

/// Settings file path
pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.json")
}

/// Recent files list path
pub fn recent_files_path(config_dir: &Path) -> PathBuf {
    config_dir.join("recent.json")
}

/// Absolute form of `path`, or `path` itself when it cannot be resolved
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

// ============================================
// STORAGE STATE
// ============================================

/// Persisted configuration shared by the app and the bridge commands
pub struct Storage {
    config_dir: PathBuf,
    settings: RwLock<Settings>,
    recent_files: RwLock<Vec<RecentFile>>,
    settings_tx: watch::Sender<Settings>,
}

impl Storage {
    /// Load settings and recent files from `config_dir`, falling back to defaults
    pub fn open(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        tracing::info!(dir = %config_dir.display(), "initializing storage");

        let settings = load_settings(&settings_path(&config_dir));
        let recent_files = load_recent_files(&recent_files_path(&config_dir));
        tracing::debug!(recent = recent_files.len(), "storage loaded");

        let (settings_tx, _) = watch::channel(settings.clone());
        Self {
            config_dir,
            settings: RwLock::new(settings),
            recent_files: RwLock::new(recent_files),
            settings_tx,
        }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::open(default_config_dir()?))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    // ----- settings -----

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Receiver that observes every settings change
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.settings_tx.subscribe()
    }

    /// Apply a partial update, persist it and notify subscribers
    pub fn update_settings(&self, update: &SettingsUpdate) -> Result<Settings> {
        let updated = {
            let mut settings = self.settings.write();
            *settings = settings.with_update(update).normalized();
            settings.clone()
        };
        self.publish(updated)
    }

    /// Replace all settings (used by reset)
    pub fn replace_settings(&self, settings: Settings) -> Result<Settings> {
        *self.settings.write() = settings.clone();
        self.publish(settings)
    }

    fn publish(&self, settings: Settings) -> Result<Settings> {
        self.save_settings()?;
        self.settings_tx.send_replace(settings.clone());
        Ok(settings)
    }

    pub fn save_settings(&self) -> Result<()> {
        let settings = self.settings.read().clone();
        write_json(&settings_path(&self.config_dir), &settings)
    }

    // ----- recent files -----

    /// Recent files that still exist on disk, most recent first
    pub fn recent_files(&self) -> Vec<RecentFile> {
        self.recent_files
            .read()
            .iter()
            .filter(|rf| rf.path.exists())
            .cloned()
            .collect()
    }

    /// Move `path` to the front of the recent list
    pub fn add_recent_file(&self, path: &Path) -> Result<()> {
        let path = absolute_path(path);
        {
            let mut recent = self.recent_files.write();
            recent.retain(|rf| rf.path != path);
            recent.insert(0, RecentFile {
                name: display_name_for(&path),
                path,
                accessed_at: chrono::Utc::now(),
            });
            recent.truncate(MAX_RECENT_FILES);
        }
        self.save_recent_files()
    }

    pub fn clear_recent_files(&self) -> Result<()> {
        self.recent_files.write().clear();
        self.save_recent_files()
    }

    fn save_recent_files(&self) -> Result<()> {
        let recent = self.recent_files.read().clone();
        write_json(&recent_files_path(&self.config_dir), &recent)
    }
}

pub type StorageState = Arc<Storage>;

// ============================================
// JSON FILES
// ============================================

fn load_settings(path: &Path) -> Settings {
    let Ok(content) = fs::read_to_string(path) else {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return Settings::default();
    };
    match serde_json::from_str::<Settings>(&content) {
        Ok(settings) => settings.normalized(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse settings, using defaults");
            Settings::default()
        }
    }
}

fn load_recent_files(path: &Path) -> Vec<RecentFile> {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = TempDir::new().expect("temp dir");
        let storage = Storage::open(temp.path().join("cfg"));
        assert_eq!(storage.settings(), Settings::default());
        assert!(storage.recent_files().is_empty());
    }

    #[test]
    fn test_settings_update_persists_and_reloads() {
        let temp = TempDir::new().expect("temp dir");
        let storage = Storage::open(temp.path());

        let update = SettingsUpdate {
            theme: Some(Theme::Dark),
            auto_save_delay: Some(500),
            ..Default::default()
        };
        let saved = storage.update_settings(&update).expect("update");
        assert_eq!(saved.theme, Theme::Dark);

        let reopened = Storage::open(temp.path());
        assert_eq!(reopened.settings().theme, Theme::Dark);
        assert_eq!(reopened.settings().auto_save_delay, 500);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let temp = TempDir::new().expect("temp dir");
        fs::write(settings_path(temp.path()), "{ not json").expect("write");
        let storage = Storage::open(temp.path());
        assert_eq!(storage.settings(), Settings::default());
    }

    #[test]
    fn test_subscribers_see_updates() {
        let temp = TempDir::new().expect("temp dir");
        let storage = Storage::open(temp.path());
        let mut rx = storage.subscribe();

        storage
            .update_settings(&SettingsUpdate { auto_reload: Some(false), ..Default::default() })
            .expect("update");

        assert!(rx.has_changed().expect("sender alive"));
        assert!(!rx.borrow_and_update().auto_reload);
    }

    #[test]
    fn test_recent_files_dedupe_order_and_cap() {
        let temp = TempDir::new().expect("temp dir");
        let storage = Storage::open(temp.path().join("cfg"));

        let mut paths = Vec::new();
        for i in 0..12 {
            let path = temp.path().join(format!("doc{i}.md"));
            fs::write(&path, "x").expect("write");
            storage.add_recent_file(&path).expect("add");
            paths.push(path);
        }
        storage.add_recent_file(&paths[5]).expect("add again");

        let recent = storage.recent_files();
        assert_eq!(recent.len(), MAX_RECENT_FILES);
        assert_eq!(recent[0].path, paths[5]);
        assert_eq!(recent[0].name, "doc5.md");
        assert_eq!(recent.iter().filter(|rf| rf.path == paths[5]).count(), 1);

        let reopened = Storage::open(temp.path().join("cfg"));
        assert_eq!(reopened.recent_files()[0].path, paths[5]);
    }

    #[test]
    fn test_recent_files_skip_deleted_and_clear() {
        let temp = TempDir::new().expect("temp dir");
        let storage = Storage::open(temp.path().join("cfg"));
        let kept = temp.path().join("kept.md");
        let gone = temp.path().join("gone.md");
        fs::write(&kept, "k").expect("write");
        fs::write(&gone, "g").expect("write");
        storage.add_recent_file(&kept).expect("add");
        storage.add_recent_file(&gone).expect("add");
        fs::remove_file(&gone).expect("remove");

        let recent = storage.recent_files();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].path, kept);

        storage.clear_recent_files().expect("clear");
        assert!(storage.recent_files().is_empty());
    }
}
