// Configuration models for MarkView
// Persisted user settings and partial updates coming from the settings UI

use serde::{Deserialize, Serialize};

/// Color scheme selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// All user settings (stored in settings.json)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub font_size: u32,
    pub font_family: String,
    pub line_height: f64,
    pub editor_theme: String,
    pub preview_theme: String,
    pub sidebar_width: u32,
    pub show_line_numbers: bool,
    pub word_wrap: bool,
    pub auto_save: bool,
    pub auto_save_delay: u64, // milliseconds
    pub auto_reload: bool,
    pub sync_scroll: bool,
    pub spell_check: bool,
    pub open_in_new_tab: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            font_size: 14,
            font_family: "JetBrains Mono, Consolas, monospace".to_string(),
            line_height: 1.6,
            editor_theme: "default".to_string(),
            preview_theme: "github".to_string(),
            sidebar_width: 280,
            show_line_numbers: true,
            word_wrap: true,
            auto_save: true,
            auto_save_delay: 3000,
            auto_reload: true,
            sync_scroll: true,
            spell_check: false,
            open_in_new_tab: true,
        }
    }
}

impl Settings {
    /// Replace zero or empty values left by older config files with defaults
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.font_size == 0 {
            self.font_size = defaults.font_size;
        }
        if self.font_family.trim().is_empty() {
            self.font_family = defaults.font_family;
        }
        if self.line_height <= 0.0 {
            self.line_height = defaults.line_height;
        }
        if self.editor_theme.is_empty() {
            self.editor_theme = defaults.editor_theme;
        }
        if self.preview_theme.is_empty() {
            self.preview_theme = defaults.preview_theme;
        }
        if self.sidebar_width == 0 {
            self.sidebar_width = defaults.sidebar_width;
        }
        if self.auto_save_delay == 0 {
            self.auto_save_delay = defaults.auto_save_delay;
        }
        self
    }

    /// Merge with a partial update
    pub fn with_update(&self, update: &SettingsUpdate) -> Self {
        Self {
            theme: update.theme.unwrap_or(self.theme),
            font_size: update.font_size.unwrap_or(self.font_size),
            font_family: update.font_family.clone().unwrap_or_else(|| self.font_family.clone()),
            line_height: update.line_height.unwrap_or(self.line_height),
            editor_theme: update.editor_theme.clone().unwrap_or_else(|| self.editor_theme.clone()),
            preview_theme: update.preview_theme.clone().unwrap_or_else(|| self.preview_theme.clone()),
            sidebar_width: update.sidebar_width.unwrap_or(self.sidebar_width),
            show_line_numbers: update.show_line_numbers.unwrap_or(self.show_line_numbers),
            word_wrap: update.word_wrap.unwrap_or(self.word_wrap),
            auto_save: update.auto_save.unwrap_or(self.auto_save),
            auto_save_delay: update.auto_save_delay.unwrap_or(self.auto_save_delay),
            auto_reload: update.auto_reload.unwrap_or(self.auto_reload),
            sync_scroll: update.sync_scroll.unwrap_or(self.sync_scroll),
            spell_check: update.spell_check.unwrap_or(self.spell_check),
            open_in_new_tab: update.open_in_new_tab.unwrap_or(self.open_in_new_tab),
        }
    }
}

/// Partial settings (all fields optional)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor_theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sidebar_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_line_numbers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_wrap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_save_delay: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_reload: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_scroll: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spell_check: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_in_new_tab: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_json_uses_camel_case() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["theme"], "system");
        assert_eq!(json["autoSave"], true);
        assert_eq!(json["autoReload"], true);
        assert_eq!(json["autoSaveDelay"], 3000);
        assert_eq!(json["openInNewTab"], true);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let parsed: Settings = serde_json::from_str(r#"{"theme":"dark","fontSize":0}"#).unwrap();
        let settings = parsed.normalized();
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.font_size, 14);
        assert!(settings.auto_reload);
    }

    #[test]
    fn test_with_update_only_touches_given_fields() {
        let update = SettingsUpdate {
            auto_save: Some(false),
            font_size: Some(18),
            ..Default::default()
        };
        let merged = Settings::default().with_update(&update);
        assert!(!merged.auto_save);
        assert_eq!(merged.font_size, 18);
        assert_eq!(merged.auto_save_delay, 3000);
        assert_eq!(merged.theme, Theme::System);
    }
}
