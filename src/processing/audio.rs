//! Audio artifact rendering for citations and the synthesis.

use crate::processing::sanitize::sanitize_base_name;
use crate::processing::types::is_usable_summary;
use crate::speech::{SpeechClient, SpeechRequest};
use std::path::PathBuf;
use std::sync::Arc;

/// File extension of every rendered artifact.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Renders text to speech and stores it under the output directory.
pub struct AudioSynthesizer {
    client: Arc<dyn SpeechClient>,
    output_dir: PathBuf,
    language: String,
}

impl AudioSynthesizer {
    /// Build a synthesizer writing into `output_dir`.
    pub fn new(client: Arc<dyn SpeechClient>, output_dir: PathBuf, language: String) -> Self {
        Self {
            client,
            output_dir,
            language,
        }
    }

    /// Deterministic artifact path for `base_name`.
    pub fn artifact_path(&self, base_name: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{AUDIO_EXTENSION}", sanitize_base_name(base_name)))
    }

    /// Render `text` to `{output_dir}/{sanitized base_name}.mp3`.
    ///
    /// Returns `None` without writing anything when the text is blank or the summary sentinel,
    /// and when the speech backend or the filesystem fails.
    pub async fn synthesize(&self, text: &str, base_name: &str) -> Option<PathBuf> {
        if !is_usable_summary(text) {
            tracing::info!(base_name, "Skipping audio for empty or unavailable summary");
            return None;
        }

        let path = self.artifact_path(base_name);
        let audio = match self
            .client
            .synthesize_speech(SpeechRequest {
                text: text.to_string(),
                language: self.language.clone(),
            })
            .await
        {
            Ok(audio) => audio,
            Err(error) => {
                tracing::warn!(base_name, error = %error, "Speech synthesis failed");
                return None;
            }
        };

        if let Err(error) = tokio::fs::create_dir_all(&self.output_dir).await {
            tracing::warn!(
                dir = %self.output_dir.display(),
                error = %error,
                "Failed to create output directory"
            );
            return None;
        }
        if let Err(error) = tokio::fs::write(&path, &audio).await {
            tracing::warn!(path = %path.display(), error = %error, "Failed to write audio file");
            return None;
        }

        tracing::info!(path = %path.display(), bytes = audio.len(), "Audio saved");
        Some(path)
    }
}
