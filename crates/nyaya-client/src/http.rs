//! HTTP implementation of the answering service.
//!
//! `POST {base_url}/chat` with `{"question": ...}`; the reply must carry an
//! `answer` string and may carry a `source` tag.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::AskError;
use crate::{Answer, AnsweringService, Provenance};

/// Connection settings for `HttpAnsweringClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Whole-request timeout. `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full URL of the chat endpoint.
    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
}

/// Answering service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAnsweringClient {
    client: Client,
    config: ClientConfig,
}

impl HttpAnsweringClient {
    pub fn new(config: ClientConfig) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl AnsweringService for HttpAnsweringClient {
    async fn ask(&self, question: &str) -> Result<Answer, AskError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let url = self.config.chat_url();
        tracing::debug!(url = %url, question_len = question.len(), "Sending question");

        let resp = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&ChatRequest { question })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "Answering service unreachable");
                AskError::NetworkUnreachable(format!("{} ({})", url, e))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Answering service returned an error");
            return Err(AskError::Protocol {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| AskError::NetworkUnreachable(format!("reply interrupted: {}", e)))?;

        let answer = parse_reply(&body)?;
        tracing::debug!(provenance = ?answer.provenance, "Answer received");
        Ok(answer)
    }
}

/// Validate and normalize a successful reply body.
pub(crate) fn parse_reply(body: &str) -> Result<Answer, AskError> {
    let reply: Value = serde_json::from_str(body)
        .map_err(|e| AskError::MalformedResponse(format!("reply is not valid JSON: {}", e)))?;

    let content = match reply.get("answer") {
        Some(Value::String(answer)) if !answer.is_empty() => answer.clone(),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            return Err(AskError::MalformedResponse(
                "missing answer field".to_string(),
            ))
        }
        Some(other) => {
            return Err(AskError::MalformedResponse(format!(
                "answer field is not a string: {}",
                other
            )))
        }
    };

    let source = reply.get("source").and_then(Value::as_str);
    Ok(Answer {
        content,
        provenance: Provenance::from_source(source),
    })
}
