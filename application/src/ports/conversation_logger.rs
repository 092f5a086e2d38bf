//! Port for the structured turn transcript.
//!
//! Separate from `tracing` diagnostics: this port records what happened in
//! each turn (events received, outcome, rollback) in a machine-readable form.

use serde_json::Value;

/// A transcript entry: a type tag plus event-specific JSON fields.
pub struct ConversationEvent {
    /// Entry type (e.g. "turn_started", "stream_event", "turn_failed").
    pub event_type: &'static str,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Records transcript entries.
///
/// `log` is synchronous and infallible: a transcript write failure must
/// never affect the turn.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Logger used when no transcript is configured.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
