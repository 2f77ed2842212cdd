//! Ordered conversation transcript.
//!
//! Insertion order is display order. Messages are appended, answers can be
//! rewritten in place, and nothing is ever removed.

use crate::error::ChatError;
use crate::types::{Message, MessageId, Revision, Role};

/// The transcript of a single chat session.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message to the end of the transcript.
    ///
    /// Ids are random, so a collision means a caller reused a message.
    pub fn append(&mut self, message: Message) -> Result<(), ChatError> {
        if self.position(message.id).is_some() {
            tracing::error!(message_id = %message.id, "Refusing to append duplicate message id");
            return Err(ChatError::DuplicateMessage(message.id));
        }
        self.messages.push(message);
        Ok(())
    }

    /// Rewrite the content, provenance and timestamp of message `id`.
    ///
    /// `updater` sees the current message and returns the new revision; the
    /// id, role, pairing and position are left untouched.
    pub fn replace<F>(&mut self, id: MessageId, updater: F) -> Result<&Message, ChatError>
    where
        F: FnOnce(&Message) -> Revision,
    {
        let Some(index) = self.position(id) else {
            tracing::warn!(message_id = %id, "Cannot replace unknown message");
            return Err(ChatError::MessageNotFound(id));
        };

        let message = &mut self.messages[index];
        let revision = updater(message);
        message.content = revision.content;
        message.provenance = revision.provenance;
        message.timestamp = revision.timestamp;
        Ok(message)
    }

    /// The question that assistant message `assistant_id` answers.
    ///
    /// Fails with `PairingNotFound` unless `assistant_id` is an assistant
    /// message whose `replies_to` resolves to an earlier user message.
    pub fn find_preceding_user_message(
        &self,
        assistant_id: MessageId,
    ) -> Result<&Message, ChatError> {
        let not_found = || ChatError::PairingNotFound(assistant_id);

        let answer_pos = self.position(assistant_id).ok_or_else(not_found)?;
        let answer = &self.messages[answer_pos];
        if answer.role != Role::Assistant {
            return Err(not_found());
        }

        let question_id = answer.replies_to.ok_or_else(not_found)?;
        let question_pos = self.position(question_id).ok_or_else(not_found)?;
        let question = &self.messages[question_pos];
        if question.role != Role::User || question_pos >= answer_pos {
            return Err(not_found());
        }
        Ok(question)
    }

    /// Clear the pending marker on a user message once it has a reply.
    pub fn mark_answered(&mut self, user_id: MessageId) -> bool {
        match self.messages.iter_mut().find(|m| m.id == user_id) {
            Some(message) => {
                message.awaiting_reply = false;
                true
            }
            None => false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Zero-based display position of message `id`.
    pub fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
