//! Error types for the conversation core.

use nyaya_core::error::NyayaError;

use crate::state::ControllerState;
use crate::types::MessageId;

/// Errors from the conversation store and session controller.
///
/// All of these are precondition failures: the action is refused and the
/// transcript is left as it was.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyInput,
    #[error("message exceeds maximum length of {0} characters")]
    QuestionTooLong(usize),
    #[error("a request is already in progress ({0})")]
    Busy(ControllerState),
    #[error("no question found to regenerate message {0}")]
    PairingNotFound(MessageId),
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),
    #[error("duplicate message id: {0}")]
    DuplicateMessage(MessageId),
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: ControllerState,
        to: ControllerState,
    },
}

impl From<ChatError> for NyayaError {
    fn from(err: ChatError) -> Self {
        NyayaError::Chat(err.to_string())
    }
}
