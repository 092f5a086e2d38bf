//! TTL-cached model catalog with an offline snapshot.
//!
//! Resolution order for [`ModelCatalog::list_models`]:
//!
//! 1. fresh in-memory cache (unless forced) → `cache`
//! 2. live listing → the source the live catalog reports (`live` when it
//!    reports none), and the snapshot file is rewritten
//! 3. stale in-memory cache → `cache`
//! 4. snapshot file → `fallback` (empty when missing or unreadable)
//!
//! An empty listing is never cached, so the next call asks the live catalog again.

use async_trait::async_trait;
use council_application::{CatalogError, ModelCatalog};
use council_domain::{CatalogSource, ModelCatalogSnapshot, ModelDescriptor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// On-disk snapshot layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    data: Vec<ModelDescriptor>,
}

struct CacheEntry {
    models: Vec<ModelDescriptor>,
    expires_at: Instant,
}

pub struct CachedModelCatalog<C: ModelCatalog> {
    live: Arc<C>,
    ttl: Duration,
    snapshot_path: Option<PathBuf>,
    cache: Mutex<Option<CacheEntry>>,
}

impl<C: ModelCatalog> CachedModelCatalog<C> {
    pub fn new(live: Arc<C>, ttl: Duration) -> Self {
        Self {
            live,
            ttl,
            snapshot_path: None,
            cache: Mutex::new(None),
        }
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Cached models, if any; `fresh_only` ignores expired entries.
    fn cached(&self, fresh_only: bool) -> Option<Vec<ModelDescriptor>> {
        let cache = self.cache.lock().ok()?;
        let entry = cache.as_ref()?;
        if entry.models.is_empty() || (fresh_only && entry.expires_at <= Instant::now()) {
            return None;
        }
        Some(entry.models.clone())
    }

    fn store(&self, models: &[ModelDescriptor]) {
        if models.is_empty() {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            *cache = Some(CacheEntry {
                models: models.to_vec(),
                expires_at: Instant::now() + self.ttl,
            });
        }
    }

    async fn persist(&self, models: &[ModelDescriptor]) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let snapshot = SnapshotFile {
            data: models.to_vec(),
        };
        if let Err(e) = write_snapshot(path, &snapshot).await {
            warn!("Failed to write model snapshot {}: {}", path.display(), e);
        }
    }

    async fn load_snapshot(&self) -> Vec<ModelDescriptor> {
        let Some(path) = &self.snapshot_path else {
            return Vec::new();
        };
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No model snapshot at {}: {}", path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<SnapshotFile>(&raw) {
            Ok(snapshot) => snapshot
                .data
                .into_iter()
                .filter(|m| !m.id.is_empty())
                .collect(),
            Err(e) => {
                warn!("Ignoring unreadable model snapshot {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

async fn write_snapshot(path: &Path, snapshot: &SnapshotFile) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    tokio::fs::write(path, json).await
}

#[async_trait]
impl<C: ModelCatalog> ModelCatalog for CachedModelCatalog<C> {
    async fn list_models(&self, force_refresh: bool) -> Result<ModelCatalogSnapshot, CatalogError> {
        if !force_refresh && let Some(models) = self.cached(true) {
            return Ok(ModelCatalogSnapshot::new(models, CatalogSource::Cache));
        }

        match self.live.list_models(force_refresh).await {
            Ok(snapshot) if !snapshot.models.is_empty() => {
                info!("Fetched {} models", snapshot.models.len());
                self.store(&snapshot.models);
                self.persist(&snapshot.models).await;
                let source = snapshot.source.unwrap_or(CatalogSource::Live);
                return Ok(ModelCatalogSnapshot::new(snapshot.models, source));
            }
            Ok(_) => debug!("Live catalog is empty"),
            Err(e) => warn!("Live model catalog unavailable: {}", e),
        }

        if let Some(models) = self.cached(false) {
            return Ok(ModelCatalogSnapshot::new(models, CatalogSource::Cache));
        }

        let models = self.load_snapshot().await;
        self.store(&models);
        Ok(ModelCatalogSnapshot::new(models, CatalogSource::Fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockLive {
        models: Mutex<Option<Vec<ModelDescriptor>>>,
        source: Option<CatalogSource>,
        calls: Mutex<usize>,
    }

    impl MockLive {
        fn new(models: Option<Vec<ModelDescriptor>>) -> Arc<Self> {
            Self::reporting(models, Some(CatalogSource::Live))
        }

        fn reporting(
            models: Option<Vec<ModelDescriptor>>,
            source: Option<CatalogSource>,
        ) -> Arc<Self> {
            Arc::new(Self {
                models: Mutex::new(models),
                source,
                calls: Mutex::new(0),
            })
        }

        fn go_offline(&self) {
            *self.models.lock().unwrap() = None;
        }

        fn go_online(&self, models: Vec<ModelDescriptor>) {
            *self.models.lock().unwrap() = Some(models);
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ModelCatalog for MockLive {
        async fn list_models(&self, _force: bool) -> Result<ModelCatalogSnapshot, CatalogError> {
            *self.calls.lock().unwrap() += 1;
            self.models
                .lock()
                .unwrap()
                .clone()
                .map(|models| ModelCatalogSnapshot {
                    models,
                    source: self.source,
                })
                .ok_or_else(|| CatalogError::Unavailable("offline".to_string()))
        }
    }

    fn models() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::bare("openai/gpt-5.1"),
            ModelDescriptor::bare("x-ai/grok-4"),
        ]
    }

    const TTL: Duration = Duration::from_secs(600);

    #[tokio::test(start_paused = true)]
    async fn fresh_cache_is_served_without_live_call() {
        let live = MockLive::new(Some(models()));
        let catalog = CachedModelCatalog::new(Arc::clone(&live), TTL);

        assert_eq!(catalog.list_models(false).await.unwrap().source, Some(CatalogSource::Live));
        let cached = catalog.list_models(false).await.unwrap();
        assert_eq!(cached.source, Some(CatalogSource::Cache));
        assert_eq!(cached.models.len(), 2);
        assert_eq!(live.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn force_refresh_bypasses_fresh_cache() {
        let live = MockLive::new(Some(models()));
        let catalog = CachedModelCatalog::new(Arc::clone(&live), TTL);

        catalog.list_models(false).await.unwrap();
        let refreshed = catalog.list_models(true).await.unwrap();
        assert_eq!(refreshed.source, Some(CatalogSource::Live));
        assert_eq!(live.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_cache_refetches() {
        let live = MockLive::new(Some(models()));
        let catalog = CachedModelCatalog::new(Arc::clone(&live), TTL);

        catalog.list_models(false).await.unwrap();
        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        assert_eq!(catalog.list_models(false).await.unwrap().source, Some(CatalogSource::Live));
        assert_eq!(live.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_cache_covers_live_failure() {
        let live = MockLive::new(Some(models()));
        let catalog = CachedModelCatalog::new(Arc::clone(&live), TTL);

        catalog.list_models(false).await.unwrap();
        live.go_offline();
        tokio::time::advance(TTL * 2).await;

        let stale = catalog.list_models(false).await.unwrap();
        assert_eq!(stale.source, Some(CatalogSource::Cache));
        assert_eq!(stale.models.len(), 2);
    }

    #[tokio::test]
    async fn snapshot_written_and_used_offline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("availablemodels").join("models.json");

        let online = CachedModelCatalog::new(MockLive::new(Some(models())), TTL).with_snapshot(&path);
        online.list_models(false).await.unwrap();
        assert!(path.exists());

        let offline = CachedModelCatalog::new(MockLive::new(None), TTL).with_snapshot(&path);
        let fallback = offline.list_models(false).await.unwrap();
        assert_eq!(fallback.source, Some(CatalogSource::Fallback));
        assert_eq!(fallback.models, models());
    }

    #[tokio::test]
    async fn missing_snapshot_means_free_text() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CachedModelCatalog::new(MockLive::new(None), TTL)
            .with_snapshot(dir.path().join("missing.json"));

        let fallback = catalog.list_models(false).await.unwrap();
        assert_eq!(fallback.source, Some(CatalogSource::Fallback));
        assert!(fallback.is_free_text());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_fallback_is_not_cached() {
        let live = MockLive::new(None);
        let catalog = CachedModelCatalog::new(Arc::clone(&live), TTL);

        let first = catalog.list_models(false).await.unwrap();
        assert_eq!(first.source, Some(CatalogSource::Fallback));
        assert!(first.is_free_text());

        live.go_online(models());
        let second = catalog.list_models(false).await.unwrap();
        assert_eq!(second.source, Some(CatalogSource::Live));
        assert_eq!(second.models.len(), 2);
        assert_eq!(live.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_reported_source_is_kept() {
        let cached_upstream = MockLive::reporting(Some(models()), Some(CatalogSource::Cache));
        let catalog = CachedModelCatalog::new(cached_upstream, TTL);
        assert_eq!(
            catalog.list_models(true).await.unwrap().source,
            Some(CatalogSource::Cache)
        );

        let unlabelled = MockLive::reporting(Some(models()), None);
        let catalog = CachedModelCatalog::new(unlabelled, TTL);
        assert_eq!(
            catalog.list_models(true).await.unwrap().source,
            Some(CatalogSource::Live)
        );
    }
}
