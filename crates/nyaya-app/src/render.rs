//! Plain-text rendering of the transcript.

use chrono::{DateTime, Local, Utc};
use nyaya_chat::{Message, Provenance, Role};

/// Sample questions offered to first-time users.
pub const EXAMPLE_QUESTIONS: [&str; 4] = [
    "What is Section 498A IPC and what are the penalties?",
    "How do I file an FIR and what is the procedure?",
    "What are the grounds for divorce under the Hindu Marriage Act?",
    "How do I register intellectual property in India?",
];

pub fn provenance_badge(provenance: Option<Provenance>) -> Option<&'static str> {
    match provenance? {
        Provenance::KnowledgeBase => Some("Legal Database"),
        Provenance::GeneralKnowledge => Some("General AI Legal Knowledge"),
    }
}

/// `HH:MM` in the local time zone.
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// One transcript entry, headed by its 1-based position.
pub fn render_message(position: usize, message: &Message) -> String {
    let time = format_time(message.timestamp);
    let header = match message.role {
        Role::User => format!("[{}] You · {}", position, time),
        Role::Assistant => match provenance_badge(message.provenance) {
            Some(badge) => format!("[{}] Nyaya · {} · {}", position, badge, time),
            None => format!("[{}] Nyaya · {}", position, time),
        },
    };
    let mut out = header;
    for line in message.content.lines() {
        out.push_str("\n    ");
        out.push_str(line);
    }
    out
}

pub fn render_transcript(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "No messages yet. Type a question, or /examples for ideas.".to_string();
    }
    messages
        .iter()
        .enumerate()
        .map(|(i, m)| render_message(i + 1, m))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_examples() -> String {
    EXAMPLE_QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, q)| format!("  {}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn welcome(base_url: &str) -> String {
    format!(
        "Nyaya legal assistant (answering service: {})\n\
         Ask a question, or use /examples, /history, /regen <n>, /copy <n>, /quit.\n\
         Answers are general legal information, not legal advice.",
        base_url
    )
}
