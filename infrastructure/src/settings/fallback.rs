//! Backend settings with a local mirror for when the backend is down.

use async_trait::async_trait;
use council_application::{SettingsStore, SettingsStoreError};
use council_domain::Settings;
use std::sync::Arc;
use tracing::warn;

/// Reads and writes `primary`, mirroring successful results into `local`.
///
/// When `primary` is unreachable, reads come from `local`. A rejection by
/// `primary` is final and never falls through.
pub struct MirroredSettingsStore<P: SettingsStore, L: SettingsStore> {
    primary: Arc<P>,
    local: Arc<L>,
}

impl<P: SettingsStore, L: SettingsStore> MirroredSettingsStore<P, L> {
    pub fn new(primary: Arc<P>, local: Arc<L>) -> Self {
        Self { primary, local }
    }

    async fn mirror(&self, settings: &Settings) {
        if let Err(e) = self.local.save(settings).await {
            warn!("Failed to mirror settings locally: {}", e);
        }
    }
}

#[async_trait]
impl<P: SettingsStore, L: SettingsStore> SettingsStore for MirroredSettingsStore<P, L> {
    async fn get(&self) -> Result<Settings, SettingsStoreError> {
        match self.primary.get().await {
            Ok(settings) => {
                self.mirror(&settings).await;
                Ok(settings)
            }
            Err(SettingsStoreError::Connection(e)) => {
                warn!("Backend settings unavailable ({}), using local copy", e);
                self.local.get().await
            }
            Err(e) => Err(e),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<Settings, SettingsStoreError> {
        let saved = self.primary.save(settings).await?;
        self.mirror(&saved).await;
        Ok(saved)
    }
}
