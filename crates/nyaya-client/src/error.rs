//! Error types for the answering service client.

/// Why a question could not be answered.
#[derive(Debug, thiserror::Error)]
pub enum AskError {
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("network error: unable to reach the answering service: {0}")]
    NetworkUnreachable(String),
    #[error("HTTP error: status {status}, message: {body}")]
    Protocol { status: u16, body: String },
    #[error("invalid response format: {0}")]
    MalformedResponse(String),
}
