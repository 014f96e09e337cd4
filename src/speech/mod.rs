//! Speech synthesis backends.
//!
//! Two wire protocols are supported:
//!
//! - `google`: the Google Translate `translate_tts` endpoint spoken by gTTS. It accepts at most
//!   100 characters per request, so text is split on whitespace and the MP3 segments returned
//!   for each part are concatenated (MP3 frames are self-delimiting).
//! - `openai`: any OpenAI-compatible `POST /audio/speech` endpoint returning MP3 bytes.

use crate::config::{Config, SpeechProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_GOOGLE_URL: &str = "https://translate.google.com";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const GOOGLE_MAX_CHARS: usize = 100;

/// Errors raised by speech backends.
#[derive(Debug, Error)]
pub enum SpeechClientError {
    /// HTTP layer failed before receiving a response.
    #[error("Speech request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Backend answered with a non-success status.
    #[error("Speech backend returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the backend.
        status: reqwest::StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Backend answered successfully but without audio.
    #[error("Speech backend returned no audio")]
    EmptyAudio,
}

/// Text to render and the language to speak it in.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    /// Text to narrate.
    pub text: String,
    /// Language code such as `en`.
    pub language: String,
}

/// Interface implemented by speech synthesis backends.
#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Render text to MP3 bytes.
    async fn synthesize_speech(&self, request: SpeechRequest)
    -> Result<Vec<u8>, SpeechClientError>;
}

/// Build the speech client selected by configuration.
pub fn get_speech_client(config: &Config) -> Result<Arc<dyn SpeechClient>, SpeechClientError> {
    let http = Client::builder()
        .user_agent(concat!("paper-podcast/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.speech_timeout_secs))
        .build()?;
    let client: Arc<dyn SpeechClient> = match config.speech_provider {
        SpeechProvider::Google => Arc::new(GoogleSpeechClient {
            http,
            base_url: config
                .speech_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GOOGLE_URL.into()),
        }),
        SpeechProvider::OpenAI => Arc::new(OpenAiSpeechClient {
            http,
            base_url: config
                .speech_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.into()),
            api_key: config.speech_api_key.clone(),
            model: config.speech_model.clone(),
            voice: config.speech_voice.clone(),
        }),
    };
    tracing::debug!(provider = ?config.speech_provider, "Initialized speech client");
    Ok(client)
}

async fn ensure_success(response: reqwest::Response) -> Result<Vec<u8>, SpeechClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SpeechClientError::UnexpectedStatus { status, body });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Client for the Google Translate text-to-speech endpoint.
pub struct GoogleSpeechClient {
    http: Client,
    base_url: String,
}

impl GoogleSpeechClient {
    fn endpoint(&self) -> String {
        format!("{}/translate_tts", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechClient for GoogleSpeechClient {
    async fn synthesize_speech(
        &self,
        request: SpeechRequest,
    ) -> Result<Vec<u8>, SpeechClientError> {
        let parts = split_for_speech(&request.text, GOOGLE_MAX_CHARS);
        let total = parts.len().to_string();
        let mut audio = Vec::new();

        for (idx, part) in parts.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = part.chars().count().to_string();
            let response = self
                .http
                .get(self.endpoint())
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", request.language.as_str()),
                    ("q", part.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await?;
            audio.extend(ensure_success(response).await?);
        }

        if audio.is_empty() {
            return Err(SpeechClientError::EmptyAudio);
        }
        Ok(audio)
    }
}

/// Client for OpenAI-compatible `/audio/speech` endpoints.
pub struct OpenAiSpeechClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    voice: String,
}

#[async_trait]
impl SpeechClient for OpenAiSpeechClient {
    async fn synthesize_speech(
        &self,
        request: SpeechRequest,
    ) -> Result<Vec<u8>, SpeechClientError> {
        let url = format!("{}/audio/speech", self.base_url.trim_end_matches('/'));
        let mut builder = self.http.post(url).json(&json!({
            "model": self.model,
            "voice": self.voice,
            "input": request.text,
            "response_format": "mp3",
        }));
        if let Some(key) = self.api_key.as_deref() {
            builder = builder.bearer_auth(key);
        }

        let audio = ensure_success(builder.send().await?).await?;
        if audio.is_empty() {
            return Err(SpeechClientError::EmptyAudio);
        }
        Ok(audio)
    }
}

/// Split text into parts of at most `max_chars` characters, breaking on whitespace.
///
/// Words longer than the limit are hard-split on character boundaries.
pub(crate) fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                parts.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };
        if needed > max_chars {
            parts.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
