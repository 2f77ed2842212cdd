//! End-to-end submit and regenerate scenarios against a scripted service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nyaya_chat::{
    Answer, AnsweringService, AskError, ChatError, ControllerState, Provenance, Role,
    SessionController,
};
use nyaya_core::config::ChatConfig;
use tokio::sync::Notify;

// =============================================================================
// Helpers
// =============================================================================

/// Replays canned outcomes in order. An optional gate holds each call
/// until the test releases it.
struct ScriptedService {
    replies: Mutex<VecDeque<Result<Answer, AskError>>>,
    questions: Mutex<Vec<String>>,
    gate: Option<Notify>,
}

impl ScriptedService {
    fn new(replies: Vec<Result<Answer, AskError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            questions: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    fn gated(replies: Vec<Result<Answer, AskError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            questions: Mutex::new(Vec::new()),
            gate: Some(Notify::new()),
        })
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnsweringService for ScriptedService {
    async fn ask(&self, question: &str) -> Result<Answer, AskError> {
        self.questions.lock().unwrap().push(question.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(AskError::NetworkUnreachable("no scripted reply".into())))
    }
}

fn kb(text: &str) -> Result<Answer, AskError> {
    Ok(Answer {
        content: text.to_string(),
        provenance: Provenance::KnowledgeBase,
    })
}

fn general(text: &str) -> Result<Answer, AskError> {
    Ok(Answer {
        content: text.to_string(),
        provenance: Provenance::GeneralKnowledge,
    })
}

fn refused() -> Result<Answer, AskError> {
    Err(AskError::NetworkUnreachable("connection refused".into()))
}

fn controller(service: Arc<ScriptedService>) -> SessionController {
    SessionController::new(service, ChatConfig::default())
}

// =============================================================================
// Submit
// =============================================================================

#[tokio::test]
async fn submit_appends_question_and_knowledge_base_answer() {
    let service = ScriptedService::new(vec![kb("Section 420 IPC deals with cheating.")]);
    let ctl = controller(service.clone());

    ctl.submit("What is Section 420 IPC?").await.unwrap();

    let messages = ctl.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "What is Section 420 IPC?");
    assert!(messages[0].provenance.is_none());
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Section 420 IPC deals with cheating.");
    assert_eq!(messages[1].provenance, Some(Provenance::KnowledgeBase));
    assert_eq!(messages[1].replies_to, Some(messages[0].id));
    assert!(ctl.state().is_idle());
}

#[tokio::test]
async fn submit_records_general_knowledge_provenance() {
    let ctl = controller(ScriptedService::new(vec![general("Generally, yes.")]));
    let reply_id = ctl.submit("Can a tenant be evicted without notice?").await.unwrap();
    assert_eq!(
        ctl.message(reply_id).unwrap().provenance,
        Some(Provenance::GeneralKnowledge)
    );
}

#[tokio::test]
async fn unreachable_service_leaves_error_message_in_transcript() {
    let ctl = controller(ScriptedService::new(vec![refused()]));

    let result = ctl.submit("Hello").await;
    assert!(result.is_ok());

    let messages = ctl.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert!(messages[1].provenance.is_none());
    assert!(messages[1].content.contains("error"));
    assert!(messages[1].content.contains("connection refused"));
    assert!(ctl.state().is_idle());
    assert!(!ctl.indicators().typing);
}

#[tokio::test]
async fn whitespace_question_changes_nothing() {
    let service = ScriptedService::new(vec![kb("unused")]);
    let ctl = controller(service.clone());

    let err = ctl.submit("   ").await.unwrap_err();
    assert!(matches!(err, ChatError::EmptyInput));
    assert!(ctl.messages().is_empty());
    assert!(service.questions().is_empty());
}

#[tokio::test]
async fn question_is_visible_before_answer_arrives() {
    let service = ScriptedService::gated(vec![kb("Eventually.")]);
    let ctl = controller(service.clone());

    let submit = ctl.submit("What is the FIR procedure?");
    let probe = async {
        tokio::task::yield_now().await;

        let messages = ctl.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "What is the FIR procedure?");
        assert!(messages[0].awaiting_reply);
        assert_eq!(ctl.state(), ControllerState::Submitting);
        assert!(ctl.indicators().typing);

        let err = ctl.submit("Another question").await.unwrap_err();
        assert!(matches!(err, ChatError::Busy(ControllerState::Submitting)));
        assert_eq!(ctl.messages().len(), 1);

        service.release();
    };

    let (result, ()) = tokio::join!(submit, probe);
    result.unwrap();

    let messages = ctl.messages();
    assert_eq!(messages.len(), 2);
    assert!(!messages[0].awaiting_reply);
    assert_eq!(service.questions(), vec!["What is the FIR procedure?"]);
}

// =============================================================================
// Regenerate
// =============================================================================

#[tokio::test]
async fn regenerate_replaces_answer_in_place() {
    let service = ScriptedService::new(vec![kb("A1"), kb("A2"), general("B1")]);
    let ctl = controller(service.clone());

    ctl.submit("Q1").await.unwrap();
    ctl.submit("Q2").await.unwrap();
    let first_answer = ctl.messages()[1].clone();
    assert_eq!(first_answer.content, "A1");

    ctl.regenerate(first_answer.id).await.unwrap();

    let after = ctl.messages();
    assert_eq!(after.len(), 4);
    assert_eq!(after[1].id, first_answer.id);
    assert_eq!(after[1].content, "B1");
    assert_eq!(after[1].provenance, Some(Provenance::GeneralKnowledge));
    assert_eq!(after[1].role, Role::Assistant);
    assert!(after[1].timestamp >= first_answer.timestamp);
    assert_eq!(after[0].content, "Q1");
    assert_eq!(after[2].content, "Q2");
    assert_eq!(after[3].content, "A2");
    assert_eq!(service.questions(), vec!["Q1", "Q2", "Q1"]);
}

#[tokio::test]
async fn regenerate_failure_overwrites_answer_with_error() {
    let ctl = controller(ScriptedService::new(vec![kb("A1"), refused()]));
    let reply_id = ctl.submit("Q1").await.unwrap();

    ctl.regenerate(reply_id).await.unwrap();

    let messages = ctl.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].id, reply_id);
    assert!(messages[1].content.contains("error"));
    assert!(messages[1].provenance.is_none());
    assert!(ctl.state().is_idle());
}

#[tokio::test]
async fn regenerate_error_message_can_recover() {
    let ctl = controller(ScriptedService::new(vec![refused(), kb("Recovered.")]));
    let reply_id = ctl.submit("Q1").await.unwrap();
    assert!(ctl.message(reply_id).unwrap().provenance.is_none());

    ctl.regenerate(reply_id).await.unwrap();

    let reply = ctl.message(reply_id).unwrap();
    assert_eq!(reply.content, "Recovered.");
    assert_eq!(reply.provenance, Some(Provenance::KnowledgeBase));
}

#[tokio::test]
async fn regenerate_without_question_is_rejected() {
    let service = ScriptedService::new(vec![kb("A1")]);
    let ctl = controller(service.clone());
    ctl.submit("Q1").await.unwrap();
    let snapshot = ctl.messages();

    let question_id = snapshot[0].id;
    let err = ctl.regenerate(question_id).await.unwrap_err();
    assert!(matches!(err, ChatError::PairingNotFound(_)));

    let unknown = nyaya_chat::MessageId::new();
    let err = ctl.regenerate(unknown).await.unwrap_err();
    assert!(matches!(err, ChatError::PairingNotFound(_)));

    assert_eq!(ctl.messages(), snapshot);
    assert_eq!(service.questions().len(), 1);
    assert!(ctl.state().is_idle());
}

#[tokio::test]
async fn regenerate_refuses_new_work_until_done() {
    let service = ScriptedService::gated(vec![kb("A1"), kb("A1 again")]);
    let ctl = controller(service.clone());

    let first = ctl.submit("Q1");
    let open = async {
        tokio::task::yield_now().await;
        service.release();
    };
    let (reply_id, ()) = tokio::join!(first, open);
    let reply_id = reply_id.unwrap();

    let regen = ctl.regenerate(reply_id);
    let probe = async {
        tokio::task::yield_now().await;

        assert_eq!(ctl.state(), ControllerState::Regenerating(reply_id));
        assert!(matches!(
            ctl.submit("Q2").await,
            Err(ChatError::Busy(ControllerState::Regenerating(_)))
        ));
        assert!(matches!(
            ctl.regenerate(reply_id).await,
            Err(ChatError::Busy(_))
        ));
        assert_eq!(ctl.messages().len(), 2);

        service.release();
    };
    let (result, ()) = tokio::join!(regen, probe);
    result.unwrap();

    assert_eq!(ctl.message(reply_id).unwrap().content, "A1 again");
    assert!(ctl.state().is_idle());
}

// =============================================================================
// Transcript properties
// =============================================================================

#[tokio::test]
async fn answers_always_follow_their_questions() {
    let service = ScriptedService::new(vec![kb("A1"), refused(), general("A3"), kb("A1'")]);
    let ctl = controller(service);

    let mut replies = Vec::new();
    for q in ["Q1", "Q2", "Q3"] {
        replies.push(ctl.submit(q).await.unwrap());
    }
    ctl.regenerate(replies[0]).await.unwrap();

    let messages = ctl.messages();
    assert_eq!(messages.len(), 6);
    for (i, message) in messages.iter().enumerate() {
        match message.role {
            Role::User => {
                assert!(message.provenance.is_none());
                assert!(!message.awaiting_reply);
            }
            Role::Assistant => {
                let question = message.replies_to.expect("assistant message is paired");
                let pos = messages.iter().position(|m| m.id == question).unwrap();
                assert!(pos < i);
                assert_eq!(messages[pos].role, Role::User);
            }
        }
    }
}

#[tokio::test]
async fn message_ids_are_unique() {
    let ctl = controller(ScriptedService::new(vec![kb("A"), kb("B"), kb("C")]));
    for q in ["one", "two", "three"] {
        ctl.submit(q).await.unwrap();
    }
    let mut ids: Vec<_> = ctl.messages().iter().map(|m| m.id).collect();
    let total = ids.len();
    ids.sort_by_key(|id| id.as_uuid());
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[tokio::test]
async fn sequential_regenerations_keep_the_last_result() {
    let ctl = controller(ScriptedService::new(vec![kb("A1"), general("A2"), kb("A3")]));
    let reply_id = ctl.submit("Q1").await.unwrap();

    ctl.regenerate(reply_id).await.unwrap();
    ctl.regenerate(reply_id).await.unwrap();

    let messages = ctl.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages.iter().filter(|m| m.id == reply_id).count(), 1);
    assert_eq!(messages[1].content, "A3");
    assert_eq!(messages[1].provenance, Some(Provenance::KnowledgeBase));
}

#[tokio::test]
async fn long_question_is_appended_by_default() {
    let service = ScriptedService::new(vec![kb("Received.")]);
    let ctl = controller(service.clone());
    let question = "a".repeat(4001);

    ctl.submit(&question).await.unwrap();

    let messages = ctl.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, question);
    assert_eq!(service.questions().len(), 1);
}
