//! Settings persistence port

use async_trait::async_trait;
use council_domain::Settings;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsStoreError {
    #[error("Settings rejected: {0}")]
    Rejected(String),

    #[error("Settings storage error: {0}")]
    Storage(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<Settings, SettingsStoreError>;

    /// Persist `settings`, returning what the store actually saved.
    async fn save(&self, settings: &Settings) -> Result<Settings, SettingsStoreError>;
}
