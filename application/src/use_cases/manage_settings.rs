//! Settings use cases: load, save, reset, and the model catalog.

use crate::ports::model_catalog::ModelCatalog;
use crate::ports::settings_store::{SettingsStore, SettingsStoreError};
use crate::state::AppState;
use council_domain::{ModelCatalogSnapshot, ModelDescriptor, Settings, SettingsError, model_options};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Notice shown when startup loading fell back to defaults.
pub const LOAD_FALLBACK_NOTICE: &str = "Failed to load settings or models. Using defaults.";

#[derive(Error, Debug)]
pub enum SettingsServiceError {
    #[error("Invalid settings: {0}")]
    Invalid(#[from] SettingsError),

    #[error(transparent)]
    Store(#[from] SettingsStoreError),
}

/// Result of [`SettingsService::load`].
#[derive(Debug, Clone)]
pub struct SettingsLoad {
    pub settings: Settings,
    pub catalog: ModelCatalogSnapshot,
    /// Set when either source failed and defaults are in use.
    pub notice: Option<String>,
}

/// Reads and writes the council settings, keeping [`AppState`] current.
pub struct SettingsService<S: SettingsStore + 'static, C: ModelCatalog + 'static> {
    store: Arc<S>,
    catalog: Arc<C>,
    state: Arc<AppState>,
}

impl<S: SettingsStore + 'static, C: ModelCatalog + 'static> SettingsService<S, C> {
    pub fn new(store: Arc<S>, catalog: Arc<C>, state: Arc<AppState>) -> Self {
        Self {
            store,
            catalog,
            state,
        }
    }

    /// Fetch settings and the model catalog together.
    ///
    /// Each side falls back on its own: settings to the defaults, models to
    /// an empty catalog (free-text entry).
    pub async fn load(&self) -> SettingsLoad {
        let (settings, catalog) = tokio::join!(self.store.get(), self.catalog.list_models(false));

        let mut failed = false;
        let settings = match settings {
            Ok(settings) => settings.or_defaults(),
            Err(e) => {
                warn!("Failed to load settings: {}", e);
                failed = true;
                Settings::default()
            }
        };
        let catalog = match catalog {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Failed to load models: {}", e);
                failed = true;
                ModelCatalogSnapshot::empty()
            }
        };

        self.state.set_settings(settings.clone());
        self.state.set_catalog(catalog.clone());
        SettingsLoad {
            settings,
            catalog,
            notice: failed.then(|| LOAD_FALLBACK_NOTICE.to_string()),
        }
    }

    /// The active settings.
    pub fn get(&self) -> Settings {
        self.state.settings()
    }

    /// Normalize, validate and store `settings`.
    ///
    /// On any failure the previously active settings stay in effect.
    pub async fn save(&self, settings: Settings) -> Result<Settings, SettingsServiceError> {
        let previous = self.state.settings();
        let candidate = settings.normalized(Some(&previous.chairman_model));
        candidate.validate()?;

        let saved = self.store.save(&candidate).await.inspect_err(|e| {
            warn!("Failed to save settings: {}", e);
        })?;
        info!(
            "Saved settings: {} council models, chairman {}",
            saved.council_models.len(),
            saved.chairman_model
        );
        self.state.set_settings(saved.clone());
        Ok(saved)
    }

    /// Restore and store the default settings.
    pub async fn reset(&self) -> Result<Settings, SettingsServiceError> {
        self.save(Settings::default()).await
    }

    /// List available models. Failures yield an empty catalog.
    pub async fn list_models(&self, force_refresh: bool) -> ModelCatalogSnapshot {
        let catalog = match self.catalog.list_models(force_refresh).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Failed to list models: {}", e);
                ModelCatalogSnapshot::empty()
            }
        };
        self.state.set_catalog(catalog.clone());
        catalog
    }

    /// Catalog entries plus configured models missing from it, by label.
    pub fn model_options(&self) -> Vec<ModelDescriptor> {
        let models = self.state.catalog().map(|c| c.models).unwrap_or_default();
        model_options(&models, &self.state.settings())
    }
}
