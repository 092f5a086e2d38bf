//! Application layer for llm-council
//!
//! This crate contains use cases, port definitions, the application state
//! and application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod state;
pub mod use_cases;

// Re-export commonly used types
pub use config::TurnPolicy;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    conversation_repository::{ConversationRepository, RepositoryError},
    model_catalog::{CatalogError, ModelCatalog},
    settings_store::{SettingsStore, SettingsStoreError},
    stream_client::{StreamClient, StreamError, StreamHandle, StreamItem},
    turn_notifier::{NoTurnNotifier, TurnNotifier},
};
pub use state::{AppState, TurnGuard};
pub use use_cases::conversations::ConversationService;
pub use use_cases::manage_settings::{
    LOAD_FALLBACK_NOTICE, SettingsLoad, SettingsService, SettingsServiceError,
};
pub use use_cases::send_message::{TurnController, TurnError, TurnOutcome};
