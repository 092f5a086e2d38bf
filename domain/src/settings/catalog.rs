//! Model catalog value objects

use super::entities::Settings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Per-token pricing as reported by the provider (decimal strings).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPricing {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub completion: Option<String>,
}

/// A model the council can be configured with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub context_length: Option<u64>,
    #[serde(default)]
    pub max_completion_tokens: Option<u64>,
    #[serde(default)]
    pub is_moderated: Option<bool>,
    #[serde(default)]
    pub pricing: ModelPricing,
}

impl ModelDescriptor {
    /// A descriptor known only by id.
    pub fn bare(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            context_length: None,
            max_completion_tokens: None,
            is_moderated: None,
            pricing: ModelPricing::default(),
        }
    }
}

/// Where a catalog listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Fetched from the provider just now
    Live,
    /// Served from the in-memory cache
    Cache,
    /// Read from the local snapshot file
    Fallback,
}

impl CatalogSource {
    pub fn as_str(&self) -> &str {
        match self {
            CatalogSource::Live => "live",
            CatalogSource::Cache => "cache",
            CatalogSource::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog listing. An empty listing means model ids are entered as free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalogSnapshot {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
    #[serde(default)]
    pub source: Option<CatalogSource>,
}

impl ModelCatalogSnapshot {
    pub fn new(models: Vec<ModelDescriptor>, source: CatalogSource) -> Self {
        Self {
            models,
            source: Some(source),
        }
    }

    pub fn empty() -> Self {
        Self {
            models: Vec::new(),
            source: None,
        }
    }

    pub fn is_free_text(&self) -> bool {
        self.models.is_empty()
    }
}

/// Selectable models: the catalog plus any configured id the catalog does
/// not list, sorted by label.
pub fn model_options(models: &[ModelDescriptor], settings: &Settings) -> Vec<ModelDescriptor> {
    let mut options: Vec<ModelDescriptor> = models.to_vec();
    let mut known: HashSet<String> = options.iter().map(|m| m.id.clone()).collect();

    let configured = settings
        .council_models
        .iter()
        .chain(std::iter::once(&settings.chairman_model))
        .filter(|id| !id.is_empty());
    for id in configured {
        if known.insert(id.clone()) {
            options.push(ModelDescriptor::bare(id.clone()));
        }
    }

    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}
