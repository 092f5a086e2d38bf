//! Domain layer for llm-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council turn
//!
//! A user message triggers three backend stages: independent answers from
//! every council member, anonymized peer ranking, and a chairman synthesis.
//! Each stage reports its lifecycle as a [`CouncilEvent`].
//!
//! ## Stage update reducer
//!
//! [`council::apply`] folds each event into the assistant message of the
//! turn, addressed by [`MessageId`], producing a new immutable
//! [`Conversation`] snapshot per event.

pub mod config;
pub mod conversation;
pub mod core;
pub mod council;
pub mod settings;

// Re-export commonly used types
pub use config::OutputFormat;
pub use conversation::{
    assistant::{AssistantMessage, StageLoading},
    entities::{Conversation, ConversationId, ConversationSummary, Message, MessageBody, MessageId},
};
pub use core::{error::DomainError, text::preview};
pub use council::{
    AggregateRank, ChairmanAnswer, CouncilAnswer, CouncilEvent, DecodeError, PeerRanking,
    RankingMetadata, ReduceError, Stage,
};
pub use settings::{
    catalog::{CatalogSource, ModelCatalogSnapshot, ModelDescriptor, ModelPricing, model_options},
    entities::{DEFAULT_CHAIRMAN_MODEL, DEFAULT_COUNCIL_MODELS, Settings, SettingsError},
};
