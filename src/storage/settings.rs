//! Settings storage
//!
//! Persists the last-used launch configuration, UI preferences, and the
//! per-field input history between runs.

use crate::launch::params::LaunchParams;
use crate::storage::{get_data_dir, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Maximum remembered values per field.
const HISTORY_CAP: usize = 5;

/// Recently used values per input field, most-recent-first, de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldHistory {
    entries: HashMap<String, Vec<String>>,
}

impl FieldHistory {
    /// Record a value for a field. An existing equal entry moves to the
    /// front instead of duplicating; the list is capped at five.
    pub fn remember(&mut self, field: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let list = self.entries.entry(field.to_string()).or_default();
        list.retain(|v| v != value);
        list.insert(0, value.to_string());
        list.truncate(HISTORY_CAP);
    }

    /// Remembered values for a field, most recent first, with the built-in
    /// suggestion appended when not already present.
    pub fn suggestions(&self, field: &str, builtin: &str) -> Vec<String> {
        let mut list = self.entries.get(field).cloned().unwrap_or_default();
        if !builtin.is_empty() && !list.iter().any(|v| v == builtin) {
            list.push(builtin.to_string());
        }
        list
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Last-used launch configuration, restored on startup.
    pub params: LaunchParams,
    /// UI theme: "dark" or "light"
    pub theme: String,
    /// Follow the log tail as lines arrive
    #[serde(default = "default_auto_scroll")]
    pub auto_scroll: bool,
    #[serde(default)]
    pub history: FieldHistory,
}

fn default_auto_scroll() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            params: LaunchParams::default(),
            theme: "dark".to_string(),
            auto_scroll: true,
            history: FieldHistory::default(),
        }
    }
}

impl AppSettings {
    /// Validate settings values
    pub fn validate(&mut self) {
        self.params.validate();
        if self.theme != "dark" && self.theme != "light" {
            self.theme = "dark".to_string();
        }
    }

    /// Record the remembered fields of the current configuration. Called
    /// when a launch is triggered.
    pub fn remember_fields(&mut self) {
        let p = self.params.clone();
        self.history.remember("server_path", &p.server_path);
        self.history.remember("threads", &p.threads.to_string());
        self.history.remember("gpu_layers", &p.gpu_layers.to_string());
        self.history.remember("ctx_size", &p.ctx_size.to_string());
        self.history.remember("port", &p.port.to_string());
        self.history.remember("host", &p.host);
    }
}

/// Get the settings file path
fn get_settings_path() -> Result<PathBuf, StorageError> {
    Ok(get_data_dir()?.join("settings.json"))
}

/// Load settings from disk
///
/// Returns default settings if the file doesn't exist or is corrupted
pub fn load_settings() -> AppSettings {
    match load_settings_internal() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
            AppSettings::default()
        }
    }
}

/// Internal settings loading with error propagation
fn load_settings_internal() -> Result<AppSettings, StorageError> {
    let path = get_settings_path()?;

    if !path.exists() {
        tracing::info!("Settings file not found, using defaults");
        return Ok(AppSettings::default());
    }

    let json = fs::read_to_string(&path)?;
    let mut settings: AppSettings = serde_json::from_str(&json)?;
    settings.validate();

    tracing::debug!("Loaded settings from disk");
    Ok(settings)
}

/// Save settings to disk
pub fn save_settings(settings: &AppSettings) -> Result<(), StorageError> {
    let path = get_settings_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;

    tracing::debug!("Saved settings to disk");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.theme, "dark");
        assert!(settings.auto_scroll);
        assert_eq!(settings.params.port, 8080);
    }

    #[test]
    fn test_history_most_recent_first() {
        let mut history = FieldHistory::default();
        history.remember("port", "8080");
        history.remember("port", "8081");
        history.remember("port", "8082");
        assert_eq!(history.suggestions("port", ""), vec!["8082", "8081", "8080"]);
    }

    #[test]
    fn test_history_dedupes_by_moving_to_front() {
        let mut history = FieldHistory::default();
        history.remember("host", "127.0.0.1");
        history.remember("host", "0.0.0.0");
        history.remember("host", "127.0.0.1");
        assert_eq!(history.suggestions("host", ""), vec!["127.0.0.1", "0.0.0.0"]);
    }

    #[test]
    fn test_history_capped_at_five() {
        let mut history = FieldHistory::default();
        for port in 8080..8090 {
            history.remember("port", &port.to_string());
        }
        let list = history.suggestions("port", "");
        assert_eq!(list.len(), 5);
        assert_eq!(list[0], "8089");
        assert_eq!(list[4], "8085");
    }

    #[test]
    fn test_history_ignores_empty_values() {
        let mut history = FieldHistory::default();
        history.remember("server_path", "  ");
        assert!(history.suggestions("server_path", "").is_empty());
    }

    #[test]
    fn test_suggestions_append_builtin_default() {
        let mut history = FieldHistory::default();
        history.remember("threads", "12");
        assert_eq!(history.suggestions("threads", "8"), vec!["12", "8"]);
        // Already-remembered defaults are not duplicated.
        history.remember("threads", "8");
        assert_eq!(history.suggestions("threads", "8"), vec!["8", "12"]);
    }

    #[test]
    fn test_settings_serialization_round_trip() {
        let mut settings = AppSettings::default();
        settings.params.model = "/models/a.gguf".to_string();
        settings.history.remember("port", "8081");

        let json = serde_json::to_string_pretty(&settings).unwrap();
        let mut loaded: AppSettings = serde_json::from_str(&json).unwrap();
        loaded.validate();

        assert_eq!(settings.params, loaded.params);
        assert_eq!(settings.history, loaded.history);
    }

    #[test]
    fn test_validation_repairs_bad_values() {
        let mut settings = AppSettings::default();
        settings.theme = "solarized".to_string();
        settings.params.threads = 0;
        settings.validate();
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.params.threads, 8);
    }

    #[test]
    fn test_remember_fields_captures_launch_inputs() {
        let mut settings = AppSettings::default();
        settings.params.port = 8123;
        settings.params.server_path = "/opt/llama/llama-server".to_string();
        settings.remember_fields();
        assert_eq!(settings.history.suggestions("port", "")[0], "8123");
        assert_eq!(
            settings.history.suggestions("server_path", "")[0],
            "/opt/llama/llama-server"
        );
    }
}
