//! The Settings Store: atomic read/write of the naming templates file.
//!
//! Writes go through a `.tmp` sibling file followed by a rename, the same
//! pattern used elsewhere in this codebase for crash-safe state
//! persistence, so readers never observe a partially written file.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::domain::templates::NamingTemplates;
use crate::error::{Error, Result};

const SETTINGS_FILE_NAME: &str = "settings.json";
const NAMING_TEMPLATES_KEY: &str = "namingTemplates";

/// Reads and writes the naming-templates file relative to a base
/// directory (normally the process's working directory).
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            path: base_dir.as_ref().join(SETTINGS_FILE_NAME),
        }
    }

    /// Load the naming templates. Falls back to defaults if the file is
    /// missing entirely, or if the file exists but lacks the
    /// `namingTemplates` key.
    pub async fn load_naming_templates(&self) -> Result<NamingTemplates> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("settings file not found at {:?}, using defaults", self.path);
                return Ok(NamingTemplates::default());
            }
            Err(e) => return Err(Error::SettingsIo(e.to_string())),
        };

        let mut document: Value = serde_json::from_str(&raw).map_err(Error::Serialization)?;

        match document.get_mut(NAMING_TEMPLATES_KEY) {
            Some(value) => {
                serde_json::from_value(value.take()).map_err(Error::Serialization)
            }
            None => Ok(NamingTemplates::default()),
        }
    }

    /// Persist `templates`, merging it into whatever else the settings
    /// file already holds so unrelated keys survive the write.
    pub async fn save_naming_templates(&self, templates: &NamingTemplates) -> Result<()> {
        let mut document = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|_| Value::Object(Default::default())),
            Err(_) => Value::Object(Default::default()),
        };

        let templates_value = serde_json::to_value(templates).map_err(Error::Serialization)?;
        if let Value::Object(map) = &mut document {
            map.insert(NAMING_TEMPLATES_KEY.to_string(), templates_value);
        } else {
            document = serde_json::json!({ NAMING_TEMPLATES_KEY: templates_value });
        }

        self.write_atomically(&document).await
    }

    async fn write_atomically(&self, document: &Value) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::SettingsIo(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(document).map_err(Error::Serialization)?;
        let temp_path = self.path.with_extension("tmp");

        tokio::fs::write(&temp_path, &json)
            .await
            .map_err(|e| Error::SettingsIo(e.to_string()))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::SettingsIo(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let templates = store.load_naming_templates().await.unwrap();
        assert_eq!(templates, NamingTemplates::default());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path());

        let mut templates = NamingTemplates::default();
        templates.single.video = "<title>".to_string();

        store.save_naming_templates(&templates).await.unwrap();
        let loaded = store.load_naming_templates().await.unwrap();
        assert_eq!(loaded, templates);
    }

    #[tokio::test]
    async fn missing_naming_templates_key_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(SETTINGS_FILE_NAME), r#"{"other": 1}"#)
            .await
            .unwrap();

        let store = SettingsStore::new(dir.path());
        let templates = store.load_naming_templates().await.unwrap();
        assert_eq!(templates, NamingTemplates::default());
    }

    #[tokio::test]
    async fn save_preserves_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(SETTINGS_FILE_NAME), r#"{"other": 42}"#)
            .await
            .unwrap();

        let store = SettingsStore::new(dir.path());
        store
            .save_naming_templates(&NamingTemplates::default())
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(dir.path().join(SETTINGS_FILE_NAME))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["other"], 42);
    }
}
