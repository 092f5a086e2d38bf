//! Stream client port
//!
//! Opens a council turn on the backend and yields its events in order.

use async_trait::async_trait;
use council_domain::{ConversationId, CouncilEvent, DecodeError};
use thiserror::Error;
use tokio::sync::mpsc;

/// Transport-level failures. Any of these ends a turn as a transport failure.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Failed to open stream: {0}")]
    Open(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid event: {0}")]
    Decode(#[from] DecodeError),

    #[error("Timeout")]
    Timeout,

    #[error("Stream closed before completion")]
    Closed,
}

/// One item of a turn stream.
pub type StreamItem = Result<CouncilEvent, StreamError>;

/// Handle for receiving the events of one turn.
///
/// Wraps an `mpsc::Receiver`; dropping the handle aborts the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamItem>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamItem>) -> Self {
        Self { receiver }
    }

    /// A handle that replays `items` and then closes.
    pub fn from_items(items: Vec<StreamItem>) -> Self {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // Capacity covers every item.
            let _ = tx.try_send(item);
        }
        Self::new(rx)
    }

    /// Next item, or `None` once the sender side is gone.
    pub async fn next(&mut self) -> Option<StreamItem> {
        self.receiver.recv().await
    }
}

/// Opens the lazy, ordered event sequence for one user message.
#[async_trait]
pub trait StreamClient: Send + Sync {
    async fn open(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<StreamHandle, StreamError>;
}
