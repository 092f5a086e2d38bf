//! Conversation domain.
//!
//! - [`entities::Conversation`] - a conversation and its message history
//! - [`entities::Message`] - a user question or a staged assistant reply
//! - [`assistant::AssistantMessage`] - the reply the reducer rewrites per event

pub mod assistant;
pub mod entities;
