//! Stage update reducer.
//!
//! Projects council events onto conversation snapshots. Each call produces a
//! new [`Conversation`] and leaves its input untouched; only the addressed
//! assistant message is rebuilt, every other message keeps its `Arc`.
//!
//! | Event | Effect on the addressed assistant message |
//! |---|---|
//! | `Stage1Start` | `loading.stage1 = true` |
//! | `Stage1Complete` | `stage1 = data`, `loading.stage1 = false` |
//! | `Stage2Start` | `loading.stage2 = true` |
//! | `Stage2Complete` | `stage2 = data`, `metadata = metadata`, `loading.stage2 = false` |
//! | `Stage3Start` | `loading.stage3 = true` |
//! | `Stage3Complete` | `stage3 = data`, `loading.stage3 = false` |
//! | `TitleComplete`, `Complete`, `Error`, `Unrecognized` | none |

use super::event::CouncilEvent;
use super::stage::Stage;
use crate::conversation::assistant::AssistantMessage;
use crate::conversation::entities::{Conversation, Message, MessageBody, MessageId};
use std::sync::Arc;
use thiserror::Error;

/// Precondition violations. These indicate a bug in the caller, not a
/// runtime condition to recover from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReduceError {
    #[error("message {0} not found in conversation")]
    MessageNotFound(MessageId),

    #[error("message {0} is not an assistant message")]
    NotAssistant(MessageId),
}

/// Apply one event to the assistant message `target`.
pub fn apply(
    conversation: &Conversation,
    target: &MessageId,
    event: &CouncilEvent,
) -> Result<Conversation, ReduceError> {
    let index = conversation
        .position(target)
        .ok_or(ReduceError::MessageNotFound(*target))?;
    let current = match &conversation.messages[index].body {
        MessageBody::Assistant(assistant) => assistant,
        MessageBody::User { .. } => return Err(ReduceError::NotAssistant(*target)),
    };

    let Some(updated) = transition(current, event) else {
        return Ok(conversation.clone());
    };

    let mut next = conversation.clone();
    next.messages[index] = Arc::new(Message {
        id: *target,
        body: MessageBody::Assistant(updated),
    });
    Ok(next)
}

/// Left-fold a sequence of events onto `conversation`.
pub fn fold<'a>(
    conversation: &Conversation,
    target: &MessageId,
    events: impl IntoIterator<Item = &'a CouncilEvent>,
) -> Result<Conversation, ReduceError> {
    events
        .into_iter()
        .try_fold(conversation.clone(), |state, event| {
            apply(&state, target, event)
        })
}

/// The new assistant message for `event`, or `None` when the event does not
/// touch message content.
fn transition(current: &AssistantMessage, event: &CouncilEvent) -> Option<AssistantMessage> {
    let mut next = current.clone();
    match event {
        CouncilEvent::Stage1Start => next.loading.set(Stage::Council, true),
        CouncilEvent::Stage1Complete { data } => {
            next.stage1 = Some(data.clone());
            next.loading.set(Stage::Council, false);
        }
        CouncilEvent::Stage2Start => next.loading.set(Stage::Ranking, true),
        CouncilEvent::Stage2Complete { data, metadata } => {
            next.stage2 = Some(data.clone());
            next.metadata = Some(metadata.clone());
            next.loading.set(Stage::Ranking, false);
        }
        CouncilEvent::Stage3Start => next.loading.set(Stage::Synthesis, true),
        CouncilEvent::Stage3Complete { data } => {
            next.stage3 = Some(data.clone());
            next.loading.set(Stage::Synthesis, false);
        }
        CouncilEvent::TitleComplete { .. }
        | CouncilEvent::Complete
        | CouncilEvent::Error { .. }
        | CouncilEvent::Unrecognized { .. } => return None,
    }
    Some(next)
}
