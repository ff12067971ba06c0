// Settings commands

use crate::error::Result;
use crate::models::{Settings, SettingsUpdate};
use crate::storage::Storage;

pub fn get_settings(storage: &Storage) -> Settings {
    let settings = storage.settings();
    tracing::debug!(theme = ?settings.theme, auto_save = settings.auto_save, "get_settings");
    settings
}

/// Apply the fields present in `input`, persist, and return the result
pub fn update_settings(storage: &Storage, input: &SettingsUpdate) -> Result<Settings> {
    tracing::debug!(?input, "update_settings");
    let settings = storage.update_settings(input)?;
    tracing::info!("settings updated");
    Ok(settings)
}

pub fn reset_settings(storage: &Storage) -> Result<Settings> {
    tracing::debug!("reset_settings");
    storage.replace_settings(Settings::default())
}
