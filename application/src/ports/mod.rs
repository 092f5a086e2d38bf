//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure and presentation adapters
//! implement.

pub mod conversation_logger;
pub mod conversation_repository;
pub mod model_catalog;
pub mod settings_store;
pub mod stream_client;
pub mod turn_notifier;
