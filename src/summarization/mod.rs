//! Abstractions over the paragraph summarization backend.
//!
//! The pipeline talks to a [`SummarizationClient`]; the concrete client is built once at startup
//! from configuration and shared for the life of the process. The Ollama client issues HTTP
//! requests directly to the runtime. The extractive client needs no model and is deterministic,
//! which makes it useful offline and in tests.

use crate::config::{Config, SummarizationProvider};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while attempting abstractive summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was unreachable.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// One paragraph handed to the summarization backend.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Paragraph text, already truncated to the input budget.
    pub text: String,
    /// Requested lower bound on summary length, in tokens.
    pub min_tokens: usize,
    /// Hard upper bound on summary length, in tokens.
    pub max_tokens: usize,
}

/// Interface implemented by summarization backends.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Condense one paragraph.
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

/// Build the summarization client selected by configuration.
pub fn get_summarization_client(
    config: &Config,
) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
    match config.summarization_provider {
        SummarizationProvider::Ollama => Ok(Arc::new(OllamaSummarizationClient::new(
            config.ollama_url.clone(),
            config.summarization_model.clone(),
            Duration::from_secs(config.summarization_timeout_secs),
        )?)),
        SummarizationProvider::Extractive => Ok(Arc::new(ExtractiveSummarizationClient)),
    }
}

/// Ollama-backed abstractive summarizer using `/api/generate`.
pub struct OllamaSummarizationClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaSummarizationClient {
    /// Construct a client for the given runtime URL and model; each request gives up after
    /// `timeout`.
    pub fn new(
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, SummarizationClientError> {
        let http = Client::builder()
            .user_agent(concat!("paper-podcast/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|error| SummarizationClientError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

fn build_prompt(request: &SummarizationRequest) -> String {
    format!(
        "Summarize the following passage from a research paper in plain prose suitable for \
         narration. Use between {min} and {max} tokens. Do not add facts that are not in the \
         passage. Output a single paragraph.\n\n{text}",
        min = request.min_tokens,
        max = request.max_tokens,
        text = request.text
    )
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl SummarizationClient for OllamaSummarizationClient {
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "model": self.model,
            "prompt": build_prompt(&request),
            "stream": false,
            "options": {
                "temperature": 0.1,
                "num_predict": request.max_tokens,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}

/// Deterministic summarizer that keeps the leading sentences of a paragraph.
///
/// Sentences are taken until `min_tokens` words are covered; the result never exceeds
/// `max_tokens` words. Words stand in for tokens.
pub struct ExtractiveSummarizationClient;

#[async_trait]
impl SummarizationClient for ExtractiveSummarizationClient {
    async fn summarize(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        Ok(leading_sentences(
            &request.text,
            request.min_tokens,
            request.max_tokens,
        ))
    }
}

pub(crate) fn leading_sentences(text: &str, min_words: usize, max_words: usize) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        if kept.len() >= max_words {
            break;
        }
        kept.push(word);
        let ends_sentence = word.ends_with(['.', '!', '?']);
        if ends_sentence && kept.len() >= min_words {
            break;
        }
    }
    kept.join(" ")
}
