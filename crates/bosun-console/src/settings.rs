//! Persistent settings blob (`bosun.json`).
//!
//! A flat JSON object of string keys to string values, read once at
//! startup and written back at shutdown. A missing file is an empty blob.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConsoleError;

/// Default settings file name.
pub const SETTINGS_FILE: &str = "bosun.json";

/// Key holding the last system seen in the previous session.
pub const LAST_SYSTEM_KEY: &str = "lastsystem";

/// String key/value settings backed by a JSON file.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Load settings from `path`, or start empty if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConsoleError> {
        let values = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| settings_error(path, &e))?;
            serde_json::from_str(&contents).map_err(|e| settings_error(path, &e))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Value for `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set `key` to `value`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_owned(), value.into());
    }

    /// Write the settings back to their file.
    pub fn save(&self) -> Result<(), ConsoleError> {
        let contents =
            serde_json::to_string_pretty(&self.values).map_err(|e| settings_error(&self.path, &e))?;
        std::fs::write(&self.path, contents).map_err(|e| settings_error(&self.path, &e))
    }
}

fn settings_error(path: &Path, e: &dyn std::fmt::Display) -> ConsoleError {
    ConsoleError::Settings {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::load(&tmp.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings.get(LAST_SYSTEM_KEY), None);
    }

    #[test]
    fn values_survive_a_save() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);

        let mut settings = Settings::load(&path).unwrap();
        settings.set(LAST_SYSTEM_KEY, "Shinrarta Dezhra");
        settings.save().unwrap();

        let reloaded = Settings::load(&path).unwrap();
        assert_eq!(reloaded.get(LAST_SYSTEM_KEY), Some("Shinrarta Dezhra"));
    }

    #[test]
    fn last_system_is_read_from_lastsystem_key() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"lastsystem":"Lave"}"#).unwrap();

        let mut settings = Settings::load(&path).unwrap();
        assert_eq!(settings.get(LAST_SYSTEM_KEY), Some("Lave"));

        settings.set(LAST_SYSTEM_KEY, "Diso");
        settings.save().unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, serde_json::json!({ "lastsystem": "Diso" }));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = Settings::load(&path).unwrap_err();
        assert!(matches!(err, ConsoleError::Settings { .. }));
    }
}
