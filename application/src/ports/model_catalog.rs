//! Model catalog port

use async_trait::async_trait;
use council_domain::ModelCatalogSnapshot;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid catalog data: {0}")]
    InvalidData(String),
}

/// Lists the models the council can be configured with.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// `force_refresh` bypasses any cache the implementation keeps.
    async fn list_models(&self, force_refresh: bool) -> Result<ModelCatalogSnapshot, CatalogError>;
}
