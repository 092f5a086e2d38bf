//! Turn progress notification port
//!
//! [`TurnNotifier`] is an output port the presentation layer implements to
//! show a turn as it streams. All methods default to no-ops.

use crate::use_cases::send_message::TurnError;
use council_domain::{AssistantMessage, ConversationId, Stage};

pub trait TurnNotifier: Send + Sync {
    /// The optimistic messages were appended and the stream is opening.
    fn on_turn_start(&self, _conversation_id: &ConversationId, _content: &str) {}

    /// The backend started a stage.
    fn on_stage_start(&self, _stage: Stage) {}

    /// A stage finished; `message` is the assistant message after the update.
    fn on_stage_complete(&self, _stage: Stage, _message: &AssistantMessage) {}

    /// The conversation got a generated title.
    fn on_title_updated(&self, _title: Option<&str>) {}

    /// The turn ended successfully; `message` is the final assistant message.
    fn on_turn_complete(&self, _message: &AssistantMessage) {}

    /// The turn failed. `rolled_back` tells whether the optimistic messages
    /// were removed.
    fn on_turn_failed(&self, _error: &TurnError, _rolled_back: bool) {}

    /// The turn was cancelled by the caller.
    fn on_turn_cancelled(&self) {}
}

/// No-op notifier for when progress reporting is not needed
pub struct NoTurnNotifier;

impl TurnNotifier for NoTurnNotifier {}
