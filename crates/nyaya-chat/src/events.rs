//! Controller events and the observers that consume them.
//!
//! The controller emits one event per flow transition. Sinks implement
//! `ChatObserver`; `TracingObserver` forwards everything to `tracing`.

use serde::Serialize;

use nyaya_client::Provenance;

use crate::types::MessageId;

/// Which entry point an event or rejection belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Submit,
    Regenerate,
}

/// Transition points of the submit and regenerate flows.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A question was appended and sent to the answering service.
    SubmitStarted {
        question_id: MessageId,
        question_chars: usize,
    },
    /// The answer to a new question was appended.
    SubmitSucceeded {
        question_id: MessageId,
        reply_id: MessageId,
        provenance: Provenance,
    },
    /// The answering service failed; an error message was appended instead.
    SubmitFailed {
        question_id: MessageId,
        reply_id: MessageId,
        diagnostic: String,
    },
    /// An earlier answer is being asked for again.
    RegenerateStarted {
        target_id: MessageId,
        question_id: MessageId,
    },
    /// The earlier answer was replaced with a fresh one.
    RegenerateSucceeded {
        target_id: MessageId,
        provenance: Provenance,
    },
    /// The earlier answer was replaced with an error message.
    RegenerateFailed {
        target_id: MessageId,
        diagnostic: String,
    },
    /// A request was refused before touching the transcript.
    Rejected { action: ChatAction, reason: String },
}

impl ChatEvent {
    /// Short machine-readable name of the event.
    pub fn event_name(&self) -> &'static str {
        match self {
            ChatEvent::SubmitStarted { .. } => "submit_started",
            ChatEvent::SubmitSucceeded { .. } => "submit_succeeded",
            ChatEvent::SubmitFailed { .. } => "submit_failed",
            ChatEvent::RegenerateStarted { .. } => "regenerate_started",
            ChatEvent::RegenerateSucceeded { .. } => "regenerate_succeeded",
            ChatEvent::RegenerateFailed { .. } => "regenerate_failed",
            ChatEvent::Rejected { .. } => "rejected",
        }
    }
}

/// Receives controller events.
pub trait ChatObserver: Send + Sync {
    fn on_event(&self, event: &ChatEvent);
}

/// Observer that logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ChatObserver for TracingObserver {
    fn on_event(&self, event: &ChatEvent) {
        let name = event.event_name();
        match event {
            ChatEvent::SubmitStarted {
                question_id,
                question_chars,
            } => {
                tracing::info!(event = name, %question_id, question_chars, "Question submitted")
            }
            ChatEvent::SubmitSucceeded {
                question_id,
                reply_id,
                provenance,
            } => tracing::info!(
                event = name,
                %question_id,
                %reply_id,
                provenance = ?provenance,
                "Answer received"
            ),
            ChatEvent::SubmitFailed {
                question_id,
                reply_id,
                diagnostic,
            } => tracing::warn!(
                event = name,
                %question_id,
                %reply_id,
                diagnostic = %diagnostic,
                "Question failed"
            ),
            ChatEvent::RegenerateStarted {
                target_id,
                question_id,
            } => tracing::info!(event = name, %target_id, %question_id, "Regenerating answer"),
            ChatEvent::RegenerateSucceeded {
                target_id,
                provenance,
            } => tracing::info!(
                event = name,
                %target_id,
                provenance = ?provenance,
                "Answer regenerated"
            ),
            ChatEvent::RegenerateFailed {
                target_id,
                diagnostic,
            } => tracing::warn!(
                event = name,
                %target_id,
                diagnostic = %diagnostic,
                "Regeneration failed"
            ),
            ChatEvent::Rejected { action, reason } => {
                tracing::debug!(event = name, action = ?action, reason = %reason, "Request rejected")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name() {
        let id = MessageId::new();
        let cases = vec![
            (
                ChatEvent::SubmitStarted {
                    question_id: id,
                    question_chars: 3,
                },
                "submit_started",
            ),
            (
                ChatEvent::SubmitSucceeded {
                    question_id: id,
                    reply_id: id,
                    provenance: Provenance::KnowledgeBase,
                },
                "submit_succeeded",
            ),
            (
                ChatEvent::SubmitFailed {
                    question_id: id,
                    reply_id: id,
                    diagnostic: "down".into(),
                },
                "submit_failed",
            ),
            (
                ChatEvent::RegenerateStarted {
                    target_id: id,
                    question_id: id,
                },
                "regenerate_started",
            ),
            (
                ChatEvent::RegenerateSucceeded {
                    target_id: id,
                    provenance: Provenance::GeneralKnowledge,
                },
                "regenerate_succeeded",
            ),
            (
                ChatEvent::RegenerateFailed {
                    target_id: id,
                    diagnostic: "down".into(),
                },
                "regenerate_failed",
            ),
            (
                ChatEvent::Rejected {
                    action: ChatAction::Submit,
                    reason: "empty".into(),
                },
                "rejected",
            ),
        ];
        for (event, expected) in cases {
            assert_eq!(event.event_name(), expected);
        }
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = ChatEvent::RegenerateSucceeded {
            target_id: MessageId::new(),
            provenance: Provenance::KnowledgeBase,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "regenerate_succeeded");
        assert_eq!(json["provenance"], "knowledge_base");
    }

    #[test]
    fn test_tracing_observer_accepts_every_event() {
        let observer = TracingObserver;
        observer.on_event(&ChatEvent::Rejected {
            action: ChatAction::Regenerate,
            reason: "busy".into(),
        });
        observer.on_event(&ChatEvent::SubmitFailed {
            question_id: MessageId::new(),
            reply_id: MessageId::new(),
            diagnostic: "HTTP error: status 500".into(),
        });
    }
}
