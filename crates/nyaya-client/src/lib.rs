//! Client for the remote legal answering service.
//!
//! Provides the `AnsweringService` trait the chat controller talks to, the
//! normalized `Answer` shape, and an HTTP implementation backed by `reqwest`.

pub mod error;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::AskError;
pub use http::{ClientConfig, HttpAnsweringClient};

/// Where an answer came from.
///
/// Always one of the two values; replies with an unknown or missing source
/// are treated as general knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Grounded in the curated statute corpus.
    KnowledgeBase,
    /// Produced by the model without corpus grounding.
    GeneralKnowledge,
}

impl Provenance {
    /// Source tag the service uses for corpus-grounded answers.
    pub const KNOWLEDGE_BASE_SOURCE: &'static str = "vector_db";

    /// Map the service's `source` field onto the closed provenance set.
    pub fn from_source(source: Option<&str>) -> Self {
        match source {
            Some(Self::KNOWLEDGE_BASE_SOURCE) => Provenance::KnowledgeBase,
            _ => Provenance::GeneralKnowledge,
        }
    }
}

/// A normalized reply from the answering service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub content: String,
    pub provenance: Provenance,
}

/// Something that can answer a legal question.
///
/// Implementations make a single attempt per call and never retry.
#[async_trait]
pub trait AnsweringService: Send + Sync {
    /// Ask `question` and return the normalized answer.
    async fn ask(&self, question: &str) -> Result<Answer, AskError>;
}
