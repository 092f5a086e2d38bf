//! Send Message use case
//!
//! Runs one turn: optimistic append of the user/assistant pair, streaming
//! stage events into the assistant message, and the terminal handling
//! (completion, protocol error, transport failure with rollback, or
//! cancellation).
//!
//! ```text
//! send_message ──▶ append pair ──▶ open stream ──▶ reduce each event
//!                                                    │
//!          ┌─────────────────┬──────────────────────┼───────────────┐
//!          ▼                 ▼                      ▼               ▼
//!      complete            error            transport failure   cancelled
//!   (refresh list)   (keep partial data)   (remove the pair)  (keep state)
//! ```

use crate::config::TurnPolicy;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::conversation_repository::{ConversationRepository, RepositoryError};
use crate::ports::stream_client::{StreamClient, StreamError};
use crate::ports::turn_notifier::TurnNotifier;
use crate::state::{AppState, TurnGuard};
use crate::use_cases::conversations::ConversationService;
use council_domain::{
    AssistantMessage, Conversation, ConversationId, CouncilEvent, DomainError, Message, MessageId,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Why a turn did not complete.
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("A turn is already in progress for conversation {0}")]
    Busy(ConversationId),

    #[error("Failed to load conversation: {0}")]
    Load(#[from] RepositoryError),

    #[error("Transport failure: {0}")]
    Transport(#[from] StreamError),

    #[error("Council error: {0}")]
    Protocol(String),
}

impl TurnError {
    pub fn is_transport(&self) -> bool {
        matches!(self, TurnError::Transport(_))
    }
}

/// How a call to [`TurnController::send_message`] ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The stream reached `complete`.
    Completed {
        conversation_id: ConversationId,
        assistant_id: MessageId,
        events_processed: usize,
    },
    /// The backend reported an error or the transport failed.
    Failed {
        conversation_id: ConversationId,
        assistant_id: MessageId,
        error: TurnError,
        events_processed: usize,
        rolled_back: bool,
    },
    /// The caller cancelled; whatever was applied stays.
    Cancelled {
        conversation_id: ConversationId,
        events_processed: usize,
    },
    /// Nothing was appended: the conversation is busy or could not be loaded.
    Rejected(TurnError),
    /// No-op: no conversation selected or nothing to send.
    Skipped(DomainError),
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }

    pub fn error(&self) -> Option<&TurnError> {
        match self {
            TurnOutcome::Failed { error, .. } | TurnOutcome::Rejected(error) => Some(error),
            _ => None,
        }
    }
}

/// Identity of one turn, bound at start so late events land in the right
/// conversation.
struct Turn {
    conversation_id: ConversationId,
    user_id: MessageId,
    assistant_id: MessageId,
}

enum TurnEnd {
    Completed,
    Protocol(String),
    Transport(StreamError),
    Cancelled,
}

/// Use case for sending a message through the council.
pub struct TurnController<S: StreamClient + 'static, R: ConversationRepository + 'static> {
    stream: Arc<S>,
    conversations: ConversationService<R>,
    state: Arc<AppState>,
    policy: TurnPolicy,
    logger: Arc<dyn ConversationLogger>,
}

impl<S: StreamClient + 'static, R: ConversationRepository + 'static> TurnController<S, R> {
    pub fn new(stream: Arc<S>, conversations: ConversationService<R>, policy: TurnPolicy) -> Self {
        let state = Arc::clone(conversations.state());
        Self {
            stream,
            conversations,
            state,
            policy,
            logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn policy(&self) -> TurnPolicy {
        self.policy
    }

    /// Send `content` to conversation `conversation_id`.
    ///
    /// Never returns an error: every path ends in a [`TurnOutcome`] plus a
    /// notifier call and a log line.
    pub async fn send_message(
        &self,
        conversation_id: Option<&ConversationId>,
        content: &str,
        notifier: &dyn TurnNotifier,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let Some(id) = conversation_id.filter(|id| !id.is_empty()) else {
            debug!("No conversation selected, ignoring message");
            return TurnOutcome::Skipped(DomainError::NoConversationSelected);
        };
        if content.trim().is_empty() {
            debug!("Empty message for {}, ignoring", id);
            return TurnOutcome::Skipped(DomainError::EmptyMessage);
        }

        let Some(_guard) = TurnGuard::acquire(&self.state, id, self.policy.serialize_turns) else {
            warn!("Turn already in flight for {}, rejecting message", id);
            let error = TurnError::Busy(id.clone());
            notifier.on_turn_failed(&error, false);
            return TurnOutcome::Rejected(error);
        };

        if self.state.snapshot(id).is_none()
            && let Err(e) = self.conversations.load(id).await
        {
            let error = TurnError::Load(e);
            notifier.on_turn_failed(&error, false);
            return TurnOutcome::Rejected(error);
        }

        let user = Message::user(content);
        let assistant = Message::assistant_placeholder();
        let turn = Turn {
            conversation_id: id.clone(),
            user_id: user.id,
            assistant_id: assistant.id,
        };
        if !self.state.append_messages(id, vec![user, assistant]) {
            debug!("Conversation {} has no snapshot, ignoring message", id);
            return TurnOutcome::Skipped(DomainError::NoConversationSelected);
        }

        info!("Turn started on conversation {}", id);
        self.logger.log(ConversationEvent::new(
            "turn_started",
            json!({
                "conversation_id": id.as_str(),
                "assistant_id": turn.assistant_id.to_string(),
                "content": content,
            }),
        ));
        notifier.on_turn_start(id, content);

        let (end, events_processed) = self.stream_turn(&turn, content, notifier, cancel).await;
        self.finish(&turn, end, events_processed, notifier)
    }

    /// Open the stream and reduce events until a terminal condition.
    async fn stream_turn(
        &self,
        turn: &Turn,
        content: &str,
        notifier: &dyn TurnNotifier,
        cancel: &CancellationToken,
    ) -> (TurnEnd, usize) {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return (TurnEnd::Cancelled, 0),
            opened = self.stream.open(&turn.conversation_id, content) => opened,
        };
        let mut handle = match opened {
            Ok(handle) => handle,
            Err(e) => return (TurnEnd::Transport(e), 0),
        };

        let mut events_processed = 0;
        loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => return (TurnEnd::Cancelled, events_processed),
                item = handle.next() => item,
            };
            let event = match item {
                Some(Ok(event)) => event,
                Some(Err(e)) => return (TurnEnd::Transport(e), events_processed),
                None => return (TurnEnd::Transport(StreamError::Closed), events_processed),
            };
            events_processed += 1;

            debug!(
                "Event '{}' for conversation {}",
                event.event_type(),
                turn.conversation_id
            );
            self.logger.log(ConversationEvent::new(
                "stream_event",
                json!({
                    "conversation_id": turn.conversation_id.as_str(),
                    "event": event.event_type(),
                }),
            ));

            if let Err(e) =
                self.state
                    .apply_event(&turn.conversation_id, &turn.assistant_id, &event)
            {
                error!(
                    "Failed to apply '{}' to conversation {}: {}",
                    event.event_type(),
                    turn.conversation_id,
                    e
                );
                if cfg!(debug_assertions) {
                    panic!("stage update precondition violated: {e}");
                }
            }

            match &event {
                CouncilEvent::Stage1Start | CouncilEvent::Stage2Start | CouncilEvent::Stage3Start => {
                    if let Some(stage) = event.stage() {
                        notifier.on_stage_start(stage);
                    }
                }
                CouncilEvent::Stage1Complete { .. }
                | CouncilEvent::Stage2Complete { .. }
                | CouncilEvent::Stage3Complete { .. } => {
                    if let (Some(stage), Some(message)) = (event.stage(), self.assistant(turn)) {
                        notifier.on_stage_complete(stage, &message);
                    }
                }
                CouncilEvent::TitleComplete { title } => {
                    if let Some(title) = title {
                        self.state.update_snapshot(&turn.conversation_id, |c| Conversation {
                            title: Some(title.clone()),
                            ..c.clone()
                        });
                    }
                    notifier.on_title_updated(title.as_deref());
                    self.spawn_refresh();
                }
                CouncilEvent::Complete => {
                    self.spawn_refresh();
                    return (TurnEnd::Completed, events_processed);
                }
                CouncilEvent::Error { message } => {
                    return (TurnEnd::Protocol(message.clone()), events_processed);
                }
                CouncilEvent::Unrecognized { event_type } => {
                    warn!("Ignoring unrecognized event type '{}'", event_type);
                }
            }
        }
    }

    fn finish(
        &self,
        turn: &Turn,
        end: TurnEnd,
        events_processed: usize,
        notifier: &dyn TurnNotifier,
    ) -> TurnOutcome {
        let conversation_id = turn.conversation_id.clone();
        match end {
            TurnEnd::Completed => {
                info!(
                    "Turn completed on conversation {} ({} events)",
                    conversation_id, events_processed
                );
                self.logger.log(ConversationEvent::new(
                    "turn_completed",
                    json!({
                        "conversation_id": conversation_id.as_str(),
                        "events": events_processed,
                    }),
                ));
                notifier.on_turn_complete(&self.assistant(turn).unwrap_or_default());
                TurnOutcome::Completed {
                    conversation_id,
                    assistant_id: turn.assistant_id,
                    events_processed,
                }
            }
            TurnEnd::Protocol(message) => {
                warn!("Council reported an error on {}: {}", conversation_id, message);
                let error = TurnError::Protocol(message);
                self.log_failure(turn, &error, events_processed, false);
                notifier.on_turn_failed(&error, false);
                TurnOutcome::Failed {
                    conversation_id,
                    assistant_id: turn.assistant_id,
                    error,
                    events_processed,
                    rolled_back: false,
                }
            }
            TurnEnd::Transport(e) => {
                warn!("Transport failure on {}: {}", conversation_id, e);
                let rolled_back = self.policy.rollback_on_transport_failure && self.rollback(turn);
                let error = TurnError::Transport(e);
                self.log_failure(turn, &error, events_processed, rolled_back);
                notifier.on_turn_failed(&error, rolled_back);
                TurnOutcome::Failed {
                    conversation_id,
                    assistant_id: turn.assistant_id,
                    error,
                    events_processed,
                    rolled_back,
                }
            }
            TurnEnd::Cancelled => {
                info!(
                    "Turn cancelled on conversation {} after {} events",
                    conversation_id, events_processed
                );
                self.logger.log(ConversationEvent::new(
                    "turn_cancelled",
                    json!({
                        "conversation_id": conversation_id.as_str(),
                        "events": events_processed,
                    }),
                ));
                notifier.on_turn_cancelled();
                TurnOutcome::Cancelled {
                    conversation_id,
                    events_processed,
                }
            }
        }
    }

    /// Remove the turn's optimistic pair. Returns whether anything was removed.
    fn rollback(&self, turn: &Turn) -> bool {
        let removed = self
            .state
            .remove_messages(&turn.conversation_id, &[turn.user_id, turn.assistant_id]);
        if removed > 0 {
            info!(
                "Rolled back {} optimistic messages on {}",
                removed, turn.conversation_id
            );
            self.logger.log(ConversationEvent::new(
                "turn_rolled_back",
                json!({
                    "conversation_id": turn.conversation_id.as_str(),
                    "removed": removed,
                }),
            ));
        }
        removed > 0
    }

    fn log_failure(&self, turn: &Turn, error: &TurnError, events: usize, rolled_back: bool) {
        self.logger.log(ConversationEvent::new(
            "turn_failed",
            json!({
                "conversation_id": turn.conversation_id.as_str(),
                "kind": if error.is_transport() { "transport" } else { "protocol" },
                "error": error.to_string(),
                "events": events,
                "rolled_back": rolled_back,
            }),
        ));
    }

    fn assistant(&self, turn: &Turn) -> Option<AssistantMessage> {
        self.state
            .snapshot(&turn.conversation_id)?
            .message(&turn.assistant_id)?
            .as_assistant()
            .cloned()
    }

    fn spawn_refresh(&self) {
        let conversations = self.conversations.clone();
        tokio::spawn(async move {
            conversations.refresh().await;
        });
    }
}
