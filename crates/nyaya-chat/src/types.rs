//! Message model for the conversation transcript.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nyaya_client::{Answer, Provenance};

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque, stable identifier of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for MessageId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Message
// =============================================================================

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// Only set on assistant answers; absent on error replies.
    pub provenance: Option<Provenance>,
    /// Creation time of the current content.
    pub timestamp: DateTime<Utc>,
    /// The user message an assistant message answers.
    pub replies_to: Option<MessageId>,
    /// A user message whose answer has not arrived yet.
    pub awaiting_reply: bool,
}

impl Message {
    /// A freshly submitted question, waiting for its answer.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
            provenance: None,
            timestamp: Utc::now(),
            replies_to: None,
            awaiting_reply: true,
        }
    }

    /// An answer to `question`.
    pub fn answer(question: MessageId, answer: &Answer) -> Self {
        Self::assistant(question, Revision::from_answer(answer))
    }

    /// An error reply to `question`, carrying no provenance.
    pub fn error_reply(question: MessageId, text: impl Into<String>) -> Self {
        Self::assistant(question, Revision::error(text))
    }

    fn assistant(question: MessageId, revision: Revision) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: revision.content,
            provenance: revision.provenance,
            timestamp: revision.timestamp,
            replies_to: Some(question),
            awaiting_reply: false,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// The mutable part of an assistant message, swapped in by regeneration.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub content: String,
    pub provenance: Option<Provenance>,
    pub timestamp: DateTime<Utc>,
}

impl Revision {
    pub fn from_answer(answer: &Answer) -> Self {
        Self {
            content: answer.content.clone(),
            provenance: Some(answer.provenance),
            timestamp: Utc::now(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
            provenance: None,
            timestamp: Utc::now(),
        }
    }
}
