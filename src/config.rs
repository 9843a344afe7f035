use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::parse_date;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Level for the log file; RUST_LOG takes precedence when set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Pre-filled due date of the add-ticket form (YYYY-MM-DD)
    #[serde(default = "default_due_date")]
    pub default_due_date: String,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default = "default_current_theme")]
    pub current_theme: String,
    #[serde(default)]
    pub themes: HashMap<String, Theme>,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_toggle_delete")]
    pub toggle_delete: String,
    #[serde(default = "default_apply_deletes")]
    pub apply_deletes: String,
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default = "default_refresh")]
    pub refresh: String,
    #[serde(default = "default_copy_id")]
    pub copy_id: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_column_left")]
    pub column_left: String,
    #[serde(default = "default_column_right")]
    pub column_right: String,
    #[serde(default = "default_move_left")]
    pub move_left: String,
    #[serde(default = "default_move_right")]
    pub move_right: String,
    #[serde(default = "default_next_tab")]
    pub next_tab: String,
    #[serde(default = "default_tab_1")]
    pub tab_1: String,
    #[serde(default = "default_tab_2")]
    pub tab_2: String,
    #[serde(default = "default_tab_3")]
    pub tab_3: String,
    #[serde(default = "default_help")]
    pub help: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_highlight_fg")]
    pub highlight_fg: String,
    #[serde(default = "default_tab_bg")]
    pub tab_bg: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_level: default_log_level(),
            default_due_date: default_due_date(),
            key_bindings: KeyBindings::default(),
            current_theme: default_current_theme(),
            themes: HashMap::new(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            edit: default_edit(),
            save: default_save(),
            toggle_delete: default_toggle_delete(),
            apply_deletes: default_apply_deletes(),
            filter: default_filter(),
            refresh: default_refresh(),
            copy_id: default_copy_id(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            column_left: default_column_left(),
            column_right: default_column_right(),
            move_left: default_move_left(),
            move_right: default_move_right(),
            next_tab: default_next_tab(),
            tab_1: default_tab_1(),
            tab_2: default_tab_2(),
            tab_3: default_tab_3(),
            help: default_help(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: default_highlight_fg(),
            tab_bg: default_tab_bg(),
        }
    }
}

impl Theme {
    /// Preset themes that are always available
    pub fn get_preset_themes() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();

        themes.insert("default".to_string(), Theme::default());

        themes.insert("dark".to_string(), Theme {
            fg: "white".to_string(),
            bg: "black".to_string(),
            highlight_bg: "cyan".to_string(),
            highlight_fg: "black".to_string(),
            tab_bg: "darkgray".to_string(),
        });

        themes.insert("light".to_string(), Theme {
            fg: "black".to_string(),
            bg: "white".to_string(),
            highlight_bg: "blue".to_string(),
            highlight_fg: "white".to_string(),
            tab_bg: "gray".to_string(),
        });

        themes
    }
}

// Default value functions
fn default_database_path() -> String {
    // Fallback only; the profile decides the real path at load time
    Config::default_database_path_for_profile(utils::Profile::Prod)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_due_date() -> String {
    "2025-08-15".to_string()
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_edit() -> String {
    "Enter".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_toggle_delete() -> String {
    "x".to_string()
}

fn default_apply_deletes() -> String {
    "D".to_string()
}

fn default_filter() -> String {
    "f".to_string()
}

fn default_refresh() -> String {
    "r".to_string()
}

fn default_copy_id() -> String {
    "y".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_column_left() -> String {
    "h".to_string()
}

fn default_column_right() -> String {
    "l".to_string()
}

fn default_move_left() -> String {
    "H".to_string()
}

fn default_move_right() -> String {
    "L".to_string()
}

fn default_next_tab() -> String {
    "Tab".to_string()
}

fn default_tab_1() -> String {
    "1".to_string()
}

fn default_tab_2() -> String {
    "2".to_string()
}

fn default_tab_3() -> String {
    "3".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_current_theme() -> String {
    "default".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_highlight_fg() -> String {
    "white".to_string()
}

fn default_tab_bg() -> String {
    "gray".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid default_due_date '{0}' (expected YYYY-MM-DD)")]
    InvalidDueDate(String),
}

impl Config {
    /// Load configuration for a profile, creating the default file if missing.
    /// `custom_path` (from `--config`) replaces the profile's config file.
    /// The database path is taken from the file as written.
    pub fn load(profile: utils::Profile, custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match custom_path {
            Some(path) => path.to_path_buf(),
            None => Self::get_config_path(profile)?,
        };

        let config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;
            config.resolve_database_path(profile);
            config
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            config.save_to(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// An empty path, or the other profile's default path, falls back to this
    /// profile's default so dev never writes to the prod database.
    fn resolve_database_path(&mut self, profile: utils::Profile) {
        let other = match profile {
            utils::Profile::Dev => utils::Profile::Prod,
            utils::Profile::Prod => utils::Profile::Dev,
        };
        let path = self.database_path.trim();
        if path.is_empty() || path == Self::default_database_path_for_profile(other) {
            self.database_path = Self::default_database_path_for_profile(profile);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        parse_date(&self.default_due_date)
            .map_err(|_| ConfigError::InvalidDueDate(self.default_due_date.clone()))?;
        Ok(())
    }

    /// Write the configuration as pretty TOML, creating parent directories
    pub fn save_to(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("tickets.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/tickets-dev/tickets.db".to_string(),
                utils::Profile::Prod => "~/.local/share/tickets/tickets.db".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Log file sits next to the database
    pub fn get_log_path(&self) -> PathBuf {
        let db_path = self.get_database_path();
        db_path
            .parent()
            .map(|dir| dir.join("tickets.log"))
            .unwrap_or_else(|| PathBuf::from("tickets.log"))
    }

    pub fn default_due_date(&self) -> NaiveDate {
        parse_date(&self.default_due_date).unwrap_or_else(|_| crate::seed::seed_due_date())
    }

    /// Currently active theme: user-defined first, then presets, then the default.
    /// An empty highlight_fg is derived from highlight_bg.
    pub fn get_active_theme(&self) -> Theme {
        use crate::tui::widgets::color::{format_color_for_display, get_contrast_text_color, parse_color};

        let mut theme = self
            .themes
            .get(&self.current_theme)
            .cloned()
            .or_else(|| Theme::get_preset_themes().get(&self.current_theme).cloned())
            .unwrap_or_default();

        if theme.highlight_fg.is_empty() {
            let calculated_fg = get_contrast_text_color(parse_color(&theme.highlight_bg));
            theme.highlight_fg = format_color_for_display(&calculated_fg);
        }

        theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            database_path = "/tmp/t.db"
            [key_bindings]
            quit = "Q"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, "/tmp/t.db");
        assert_eq!(config.key_bindings.quit, "Q");
        assert_eq!(config.key_bindings.new, "n");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_due_date(), NaiveDate::from_ymd_opt(2025, 8, 15).unwrap());
    }

    #[test]
    fn test_load_custom_path_creates_and_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load(utils::Profile::Dev, Some(&path)).unwrap();
        assert!(path.exists());

        let reloaded = Config::load(utils::Profile::Dev, Some(&path)).unwrap();
        assert_eq!(reloaded.database_path, created.database_path);
        assert_eq!(reloaded.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn test_database_path_from_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "database_path = \"/srv/tickets/team.db\"\n").unwrap();

        let config = Config::load(utils::Profile::Prod, Some(&path)).unwrap();
        assert_eq!(config.get_database_path(), PathBuf::from("/srv/tickets/team.db"));
    }

    #[test]
    fn test_database_path_falls_back_to_profile_default() {
        let dev_default = Config::default_database_path_for_profile(utils::Profile::Dev);
        let prod_default = Config::default_database_path_for_profile(utils::Profile::Prod);

        let mut config = Config::default();
        config.database_path = prod_default.clone();
        config.resolve_database_path(utils::Profile::Dev);
        assert_eq!(config.database_path, dev_default);

        config.database_path = "  ".to_string();
        config.resolve_database_path(utils::Profile::Prod);
        assert_eq!(config.database_path, prod_default);

        config.database_path = "/srv/tickets/team.db".to_string();
        config.resolve_database_path(utils::Profile::Dev);
        assert_eq!(config.database_path, "/srv/tickets/team.db");
    }

    #[test]
    fn test_invalid_default_due_date_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_due_date = \"soon\"\n").unwrap();

        let result = Config::load(utils::Profile::Dev, Some(&path));
        assert!(matches!(result, Err(ConfigError::InvalidDueDate(_))));
    }

    #[test]
    fn test_active_theme_falls_back_to_default() {
        let mut config = Config::default();
        config.current_theme = "missing".to_string();
        assert_eq!(config.get_active_theme().highlight_bg, "blue");

        config.current_theme = "light".to_string();
        assert_eq!(config.get_active_theme().bg, "white");
    }

    #[test]
    fn test_log_path_next_to_database() {
        let mut config = Config::default();
        config.database_path = "/var/lib/tickets/tickets.db".to_string();
        assert_eq!(config.get_log_path(), PathBuf::from("/var/lib/tickets/tickets.log"));
    }
}
