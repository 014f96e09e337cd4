use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_OUTPUT_DIR: &str = "outputs";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_SUMMARIZATION_MODEL: &str = "llama3.2";
const DEFAULT_CROSSREF_URL: &str = "https://api.crossref.org";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the paper podcast server and CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Directory that receives uploaded PDFs.
    pub upload_dir: PathBuf,
    /// Directory that receives generated audio artifacts.
    pub output_dir: PathBuf,
    /// Maximum accepted request body size for batch uploads.
    pub max_upload_bytes: usize,
    /// Backend used to condense paragraphs.
    pub summarization_provider: SummarizationProvider,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// Model identifier passed to the summarization backend.
    pub summarization_model: String,
    /// Timeout applied to each summarization request.
    pub summarization_timeout_secs: u64,
    /// Lower bound on the length of each paragraph summary, in tokens.
    pub summary_min_tokens: usize,
    /// Upper bound on the length of each paragraph summary, in tokens.
    pub summary_max_tokens: usize,
    /// Paragraphs longer than this many tokens are truncated before summarization.
    pub summary_input_token_limit: usize,
    /// Tokenizer (model or encoding name) used to count input tokens.
    pub summary_tokenizer: String,
    /// Paragraphs at or below this character count are dropped as noise.
    pub min_paragraph_chars: usize,
    /// Base URL of the CrossRef REST API.
    pub crossref_url: String,
    /// Timeout applied to DOI and URL requests.
    pub fetch_timeout_secs: u64,
    /// User agent presented when fetching third-party pages.
    pub fetch_user_agent: String,
    /// Backend used to render speech.
    pub speech_provider: SpeechProvider,
    /// Optional override for the speech backend base URL.
    pub speech_url: Option<String>,
    /// Optional bearer token for OpenAI-compatible speech endpoints.
    pub speech_api_key: Option<String>,
    /// Speech model identifier (OpenAI-compatible backends).
    pub speech_model: String,
    /// Voice identifier (OpenAI-compatible backends).
    pub speech_voice: String,
    /// Language code for narration.
    pub speech_language: String,
    /// Timeout applied to each speech request.
    pub speech_timeout_secs: u64,
    /// Number of input items processed concurrently within one batch.
    pub pipeline_concurrency: usize,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Deterministic leading-sentence summaries; no model required.
    Extractive,
}

/// Supported speech synthesis backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechProvider {
    /// Google Translate text-to-speech endpoint (the gTTS protocol).
    Google,
    /// OpenAI-compatible `/audio/speech` endpoint.
    OpenAI,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            server_port: parse_optional(&get, "SERVER_PORT")?,
            upload_dir: get("UPLOAD_DIR")
                .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into())
                .into(),
            output_dir: get("OUTPUT_DIR")
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.into())
                .into(),
            max_upload_bytes: parse_optional(&get, "MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            summarization_provider: parse_optional(&get, "SUMMARIZATION_PROVIDER")?
                .unwrap_or(SummarizationProvider::Ollama),
            ollama_url: get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.into()),
            summarization_model: get("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_MODEL.into()),
            summarization_timeout_secs: parse_optional(&get, "SUMMARIZATION_TIMEOUT_SECS")?
                .unwrap_or(120),
            summary_min_tokens: parse_optional(&get, "SUMMARY_MIN_TOKENS")?.unwrap_or(50),
            summary_max_tokens: parse_optional(&get, "SUMMARY_MAX_TOKENS")?.unwrap_or(200),
            summary_input_token_limit: parse_optional(&get, "SUMMARY_INPUT_TOKEN_LIMIT")?
                .unwrap_or(1024),
            summary_tokenizer: get("SUMMARY_TOKENIZER").unwrap_or_else(|| "cl100k_base".into()),
            min_paragraph_chars: parse_optional(&get, "MIN_PARAGRAPH_CHARS")?.unwrap_or(100),
            crossref_url: get("CROSSREF_API_URL").unwrap_or_else(|| DEFAULT_CROSSREF_URL.into()),
            fetch_timeout_secs: parse_optional(&get, "FETCH_TIMEOUT_SECS")?.unwrap_or(10),
            fetch_user_agent: get("FETCH_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.into()),
            speech_provider: parse_optional(&get, "SPEECH_PROVIDER")?
                .unwrap_or(SpeechProvider::Google),
            speech_url: get("SPEECH_URL"),
            speech_api_key: get("SPEECH_API_KEY"),
            speech_model: get("SPEECH_MODEL").unwrap_or_else(|| "tts-1".into()),
            speech_voice: get("SPEECH_VOICE").unwrap_or_else(|| "alloy".into()),
            speech_language: get("SPEECH_LANGUAGE").unwrap_or_else(|| "en".into()),
            speech_timeout_secs: parse_optional(&get, "SPEECH_TIMEOUT_SECS")?.unwrap_or(60),
            pipeline_concurrency: parse_optional(&get, "PIPELINE_CONCURRENCY")?
                .unwrap_or(1)
                .max(1),
        })
    }
}

fn parse_optional<T, G>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "extractive" => Ok(Self::Extractive),
            _ => Err(()),
        }
    }
}

impl FromStr for SpeechProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" | "gtts" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        upload_dir = %config.upload_dir.display(),
        output_dir = %config.output_dir.display(),
        server_port = ?config.server_port,
        summarization_provider = ?config.summarization_provider,
        speech_provider = ?config.speech_provider,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]).expect("config");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.summarization_provider, SummarizationProvider::Ollama);
        assert_eq!(config.speech_provider, SpeechProvider::Google);
        assert_eq!(config.summary_min_tokens, 50);
        assert_eq!(config.summary_max_tokens, 200);
        assert_eq!(config.min_paragraph_chars, 100);
        assert_eq!(config.fetch_timeout_secs, 10);
        assert_eq!(config.summarization_timeout_secs, 120);
        assert_eq!(config.speech_timeout_secs, 60);
        assert_eq!(config.pipeline_concurrency, 1);
        assert!(config.server_port.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("SERVER_PORT", "8080"),
            ("SUMMARIZATION_PROVIDER", "Extractive"),
            ("SPEECH_PROVIDER", "openai"),
            ("PIPELINE_CONCURRENCY", "0"),
            ("OUTPUT_DIR", "/tmp/audio"),
        ])
        .expect("config");
        assert_eq!(config.server_port, Some(8080));
        assert_eq!(
            config.summarization_provider,
            SummarizationProvider::Extractive
        );
        assert_eq!(config.speech_provider, SpeechProvider::OpenAI);
        assert_eq!(config.pipeline_concurrency, 1);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/audio"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("SERVER_PORT", "  "), ("UPLOAD_DIR", "")]).expect("config");
        assert!(config.server_port.is_none());
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let error = config_from(&[("SPEECH_PROVIDER", "festival")]).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "SPEECH_PROVIDER"));

        let error = config_from(&[("FETCH_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue(key) if key == "FETCH_TIMEOUT_SECS"));
    }
}
