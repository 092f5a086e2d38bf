//! Infrastructure layer for llm-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod catalog;
pub mod config;
pub mod http;
pub mod logging;
pub mod settings;

// Re-export commonly used types
pub use catalog::CachedModelCatalog;
pub use config::{
    ConfigLoader, ConfigValidationError, FileBackendConfig, FileBehaviorConfig, FileCatalogConfig,
    FileConfig, FileCouncilConfig, FileLoggingConfig, FileOutputConfig, FileOutputFormat,
    FileReplConfig,
};
pub use http::{HttpCouncilClient, HttpError, SseDecoder, SseFrame};
pub use logging::JsonlConversationLogger;
pub use settings::{FileSettingsStore, MirroredSettingsStore};
