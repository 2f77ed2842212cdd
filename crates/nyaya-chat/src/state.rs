//! Session controller state machine.
//!
//! Valid transitions:
//! - Idle -> Submitting (question sent)
//! - Idle -> Regenerating (earlier answer re-asked)
//! - Submitting -> Idle (reply or error message appended)
//! - Regenerating -> Idle (answer replaced)

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::error::ChatError;
use crate::types::MessageId;

/// What the controller is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// Ready to accept a submission or a regeneration.
    Idle,
    /// Waiting on the answer to a new question.
    Submitting,
    /// Waiting on a fresh answer for the given assistant message.
    Regenerating(MessageId),
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Idle => write!(f, "Idle"),
            ControllerState::Submitting => write!(f, "Submitting"),
            ControllerState::Regenerating(id) => write!(f, "Regenerating({})", id),
        }
    }
}

impl ControllerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ControllerState::Idle)
    }

    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &ControllerState) -> bool {
        matches!(
            (self, target),
            (ControllerState::Idle, ControllerState::Submitting)
                | (ControllerState::Idle, ControllerState::Regenerating(_))
                | (ControllerState::Submitting, ControllerState::Idle)
                | (ControllerState::Regenerating(_), ControllerState::Idle)
        )
    }
}

/// Guarded holder of the controller state.
#[derive(Debug)]
pub struct StateMachine {
    state: Mutex<ControllerState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ControllerState::Idle),
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> ControllerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leave `Idle` for a busy state.
    ///
    /// Fails with `ChatError::Busy` if another flow is already running.
    pub fn begin(&self, target: ControllerState) -> Result<(), ChatError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.is_idle() {
            return Err(ChatError::Busy(*state));
        }
        if !state.can_transition_to(&target) {
            return Err(ChatError::InvalidTransition {
                from: *state,
                to: target,
            });
        }
        tracing::debug!("Controller state: {} -> {}", *state, target);
        *state = target;
        Ok(())
    }

    /// Force the state machine back to `Idle`.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.is_idle() {
            tracing::debug!("Controller state: {} -> Idle", *state);
        }
        *state = ControllerState::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================
