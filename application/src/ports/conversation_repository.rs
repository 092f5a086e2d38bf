//! Conversation repository port
//!
//! Backend-owned conversation storage: creation, the summary list, and full
//! conversation loads.

use async_trait::async_trait;
use council_domain::{Conversation, ConversationId, ConversationSummary};
use thiserror::Error;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Create an empty conversation; the repository assigns its id.
    async fn create(&self) -> Result<Conversation, RepositoryError>;

    /// Summaries of every conversation, newest first.
    async fn list(&self) -> Result<Vec<ConversationSummary>, RepositoryError>;

    /// Full conversation with its message history.
    async fn load(&self, id: &ConversationId) -> Result<Conversation, RepositoryError>;
}
