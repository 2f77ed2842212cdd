//! Session controller: runs the submit and regenerate flows.
//!
//! Questions are appended before the network call so the user sees them
//! immediately. Replies (or error messages) are appended once the call
//! settles, and regeneration rewrites an existing answer in place.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nyaya_client::AnsweringService;
use nyaya_core::config::ChatConfig;

use crate::error::ChatError;
use crate::events::{ChatAction, ChatEvent, ChatObserver, TracingObserver};
use crate::state::{ControllerState, StateMachine};
use crate::store::ConversationStore;
use crate::types::{Message, MessageId, Revision};

/// Busy and typing flags for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indicators {
    /// An answer to a new question is on its way.
    pub typing: bool,
    /// Submissions and regenerations are currently refused.
    pub busy: bool,
    /// The assistant message being regenerated, if any.
    pub regenerating: Option<MessageId>,
}

/// Owns one conversation and drives it against an answering service.
pub struct SessionController {
    client: Arc<dyn AnsweringService>,
    store: Mutex<ConversationStore>,
    machine: StateMachine,
    typing: AtomicBool,
    input: Mutex<String>,
    observers: Vec<Arc<dyn ChatObserver>>,
    config: ChatConfig,
}

impl SessionController {
    /// Create a controller with an empty transcript and a `TracingObserver`.
    pub fn new(client: Arc<dyn AnsweringService>, config: ChatConfig) -> Self {
        Self {
            client,
            store: Mutex::new(ConversationStore::new()),
            machine: StateMachine::new(),
            typing: AtomicBool::new(false),
            input: Mutex::new(String::new()),
            observers: vec![Arc::new(TracingObserver)],
            config,
        }
    }

    /// Register an additional event sink.
    pub fn with_observer(mut self, observer: Arc<dyn ChatObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    // -- Read side --

    pub fn state(&self) -> ControllerState {
        self.machine.current()
    }

    pub fn indicators(&self) -> Indicators {
        let state = self.state();
        Indicators {
            typing: self.typing.load(Ordering::SeqCst),
            busy: !state.is_idle(),
            regenerating: match state {
                ControllerState::Regenerating(id) => Some(id),
                _ => None,
            },
        }
    }

    /// Snapshot of the transcript in display order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock_store().messages().to_vec()
    }

    pub fn message(&self, id: MessageId) -> Option<Message> {
        self.lock_store().get(id).cloned()
    }

    /// Run `f` against the transcript without copying it.
    pub fn with_store<R>(&self, f: impl FnOnce(&ConversationStore) -> R) -> R {
        f(&self.lock_store())
    }

    /// Current composer draft.
    pub fn input(&self) -> String {
        self.lock_input().clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        *self.lock_input() = text.into();
    }

    // -- Flows --

    /// Submit the composer draft.
    pub async fn submit_input(&self) -> Result<MessageId, ChatError> {
        let text = self.input();
        self.submit(&text).await
    }

    /// Ask a new question.
    ///
    /// Returns the id of the assistant message appended for it. A failed
    /// call still returns `Ok`: the failure is in the transcript as an
    /// error message. `Err` means nothing was appended.
    pub async fn submit(&self, text: &str) -> Result<MessageId, ChatError> {
        let question = text.trim();
        if question.is_empty() {
            return Err(self.reject(ChatAction::Submit, ChatError::EmptyInput));
        }
        if let Some(limit) = self.config.max_question_chars {
            if question.chars().count() > limit {
                return Err(self.reject(ChatAction::Submit, ChatError::QuestionTooLong(limit)));
            }
        }
        if let Err(e) = self.machine.begin(ControllerState::Submitting) {
            return Err(self.reject(ChatAction::Submit, e));
        }
        let mut guard = FlowGuard::new(self);

        let message = Message::user(question);
        let question_id = message.id;
        self.lock_store().append(message)?;
        guard.question_id = Some(question_id);

        self.lock_input().clear();
        self.typing.store(true, Ordering::SeqCst);
        self.emit(ChatEvent::SubmitStarted {
            question_id,
            question_chars: question.chars().count(),
        });

        let result = self.client.ask(question).await;
        self.pause().await;

        let (reply, event) = match result {
            Ok(answer) => {
                let reply = Message::answer(question_id, &answer);
                let event = ChatEvent::SubmitSucceeded {
                    question_id,
                    reply_id: reply.id,
                    provenance: answer.provenance,
                };
                (reply, event)
            }
            Err(err) => {
                let diagnostic = err.to_string();
                let reply = Message::error_reply(question_id, submit_failure_text(&diagnostic));
                let event = ChatEvent::SubmitFailed {
                    question_id,
                    reply_id: reply.id,
                    diagnostic,
                };
                (reply, event)
            }
        };

        let reply_id = reply.id;
        self.lock_store().append(reply)?;
        self.emit(event);
        Ok(reply_id)
    }

    /// Ask the question behind assistant message `id` again and overwrite
    /// that message with the result.
    pub async fn regenerate(&self, id: MessageId) -> Result<(), ChatError> {
        let state = self.state();
        if !state.is_idle() {
            return Err(self.reject(ChatAction::Regenerate, ChatError::Busy(state)));
        }

        let paired = self
            .lock_store()
            .find_preceding_user_message(id)
            .map(|q| (q.id, q.content.clone()));
        let (question_id, question) = match paired {
            Ok(pair) => pair,
            Err(e) => return Err(self.reject(ChatAction::Regenerate, e)),
        };

        if let Err(e) = self.machine.begin(ControllerState::Regenerating(id)) {
            return Err(self.reject(ChatAction::Regenerate, e));
        }
        let _guard = FlowGuard::new(self);

        self.emit(ChatEvent::RegenerateStarted {
            target_id: id,
            question_id,
        });

        let event = match self.client.ask(&question).await {
            Ok(answer) => {
                self.lock_store()
                    .replace(id, |_| Revision::from_answer(&answer))?;
                ChatEvent::RegenerateSucceeded {
                    target_id: id,
                    provenance: answer.provenance,
                }
            }
            Err(err) => {
                let diagnostic = err.to_string();
                let text = regenerate_failure_text(&diagnostic);
                self.lock_store().replace(id, |_| Revision::error(text))?;
                ChatEvent::RegenerateFailed {
                    target_id: id,
                    diagnostic,
                }
            }
        };

        self.emit(event);
        Ok(())
    }

    // -- Private helpers --

    async fn pause(&self) {
        let delay = self.config.reply_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn reject(&self, action: ChatAction, err: ChatError) -> ChatError {
        self.emit(ChatEvent::Rejected {
            action,
            reason: err.to_string(),
        });
        err
    }

    fn emit(&self, event: ChatEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, ConversationStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_input(&self) -> MutexGuard<'_, String> {
        self.input.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the controller to `Idle` when a flow ends, however it ends.
struct FlowGuard<'a> {
    controller: &'a SessionController,
    question_id: Option<MessageId>,
}

impl<'a> FlowGuard<'a> {
    fn new(controller: &'a SessionController) -> Self {
        Self {
            controller,
            question_id: None,
        }
    }
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.question_id {
            self.controller.lock_store().mark_answered(id);
        }
        self.controller.typing.store(false, Ordering::SeqCst);
        self.controller.machine.reset();
    }
}

fn submit_failure_text(diagnostic: &str) -> String {
    format!(
        "I apologize, but I encountered an error while processing your legal inquiry. \
         Error: {}. Please make sure the answering service is reachable and try again.",
        diagnostic
    )
}

fn regenerate_failure_text(diagnostic: &str) -> String {
    format!(
        "I apologize, but I encountered an error while regenerating the response. \
         Error: {}. Please try again.",
        diagnostic
    )
}

// =============================================================================
// Tests
// =============================================================================
