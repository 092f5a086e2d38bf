//! Conversation domain entities

use super::assistant::AssistantMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Backend-assigned conversation identifier (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty id never names a conversation.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Client-side message identifier.
///
/// Generated when a message is appended optimistically, or when a message
/// is decoded from the backend (which does not assign ids). The reducer
/// addresses the in-flight assistant message through this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role-specific message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum MessageBody {
    User { content: String },
    Assistant(AssistantMessage),
}

/// A message in a conversation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing)]
    pub id: MessageId,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            body: MessageBody::User {
                content: content.into(),
            },
        }
    }

    /// An empty assistant placeholder: no stage data, nothing loading.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::new(),
            body: MessageBody::Assistant(AssistantMessage::default()),
        }
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match &self.body {
            MessageBody::Assistant(a) => Some(a),
            MessageBody::User { .. } => None,
        }
    }

    pub fn user_content(&self) -> Option<&str> {
        match &self.body {
            MessageBody::User { content } => Some(content),
            MessageBody::Assistant(_) => None,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.body, MessageBody::User { .. })
    }
}

/// A conversation and its message history (Entity)
///
/// Snapshots are immutable values: producing a new state clones the
/// conversation, which only clones the `Arc` handles of its messages.
/// Messages that did not change stay pointer-equal across snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(deserialize_with = "crate::core::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub messages: Vec<Arc<Message>>,
}

impl Conversation {
    pub fn new(id: impl Into<ConversationId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            title: None,
            messages: Vec::new(),
        }
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id).map(|m| m.as_ref())
    }

    pub fn position(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|m| &m.id == id)
    }

    /// New snapshot with `messages` appended in order.
    pub fn with_appended(&self, messages: impl IntoIterator<Item = Message>) -> Self {
        let mut next = self.clone();
        next.messages.extend(messages.into_iter().map(Arc::new));
        next
    }

    /// New snapshot without the messages whose ids are listed.
    pub fn without(&self, ids: &[MessageId]) -> Self {
        let mut next = self.clone();
        next.messages.retain(|m| !ids.contains(&m.id));
        next
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            created_at: self.created_at,
            title: self.title.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// Entry in the conversation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    #[serde(deserialize_with = "crate::core::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message_count: usize,
}

impl ConversationSummary {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("New Conversation")
    }
}
