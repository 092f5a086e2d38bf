//! Domain error types

use crate::council::event::DecodeError;
use crate::council::reducer::ReduceError;
use crate::settings::entities::SettingsError;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No conversation selected")]
    NoConversationSelected,

    #[error("Message content cannot be empty")]
    EmptyMessage,

    #[error("Invalid stream event: {0}")]
    InvalidEvent(#[from] DecodeError),

    #[error("Stage update failed: {0}")]
    Reduce(#[from] ReduceError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),
}

impl DomainError {
    /// Programming errors: the caller broke a precondition rather than
    /// hitting a runtime condition.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            DomainError::NoConversationSelected | DomainError::EmptyMessage | DomainError::Reduce(_)
        )
    }
}
