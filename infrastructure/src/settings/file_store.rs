//! Settings persisted as a local JSON file.

use async_trait::async_trait;
use council_application::{SettingsStore, SettingsStoreError};
use council_domain::Settings;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// JSON-file settings store with an in-memory cache.
///
/// A missing or unparsable file reads as `defaults`; fields absent from the
/// file are filled from the defaults too.
pub struct FileSettingsStore {
    path: PathBuf,
    defaults: Settings,
    cache: Mutex<Option<Settings>>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, defaults: Settings) -> Self {
        Self {
            path: path.into(),
            defaults,
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cached(&self) -> Option<Settings> {
        self.cache.lock().ok().and_then(|c| c.clone())
    }

    fn remember(&self, settings: &Settings) {
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(settings.clone());
        }
    }

    async fn read(&self) -> Settings {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No settings file at {}: {}", self.path.display(), e);
                return self.defaults.clone();
            }
        };
        match serde_json::from_str::<Settings>(&raw) {
            Ok(stored) => Settings {
                council_models: if stored.council_models.is_empty() {
                    self.defaults.council_models.clone()
                } else {
                    stored.council_models
                },
                chairman_model: if stored.chairman_model.trim().is_empty() {
                    self.defaults.chairman_model.clone()
                } else {
                    stored.chairman_model
                },
            },
            Err(e) => {
                warn!("Ignoring unreadable settings file {}: {}", self.path.display(), e);
                self.defaults.clone()
            }
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self) -> Result<Settings, SettingsStoreError> {
        if let Some(settings) = self.cached() {
            return Ok(settings);
        }
        let settings = self.read().await;
        self.remember(&settings);
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<Settings, SettingsStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SettingsStoreError::Storage(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| SettingsStoreError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| SettingsStoreError::Storage(e.to_string()))?;

        self.remember(settings);
        Ok(settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom() -> Settings {
        Settings::new(vec!["a/one".to_string(), "b/two".to_string()], "b/two")
    }

    #[tokio::test]
    async fn missing_file_reads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"), custom());
        assert_eq!(store.get().await.unwrap(), custom());
    }

    #[tokio::test]
    async fn save_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("settings.json");
        let store = FileSettingsStore::new(&path, Settings::default());

        store.save(&custom()).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"council_models\""));

        let reopened = FileSettingsStore::new(&path, Settings::default());
        assert_eq!(reopened.get().await.unwrap(), custom());
    }

    #[tokio::test]
    async fn unparsable_file_reads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileSettingsStore::new(&path, Settings::default());
        assert_eq!(store.get().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"chairman_model": "x-ai/grok-4"}"#).unwrap();

        let store = FileSettingsStore::new(&path, Settings::default());
        let settings = store.get().await.unwrap();
        assert_eq!(settings.chairman_model, "x-ai/grok-4");
        assert_eq!(settings.council_models, Settings::default().council_models);
    }

    #[tokio::test]
    async fn get_is_cached_after_first_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::new(&path, Settings::default());
        store.get().await.unwrap();

        std::fs::write(&path, serde_json::to_string(&custom()).unwrap()).unwrap();
        assert_eq!(store.get().await.unwrap(), Settings::default());
    }
}
