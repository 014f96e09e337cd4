//! Core data types and error definitions for the podcast pipeline.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Topic reported when no topics were supplied or no usable summary was scored.
pub const UNSPECIFIED_TOPIC: &str = "Unspecified";

/// Summary reported when the summarization backend fails.
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

/// Base name of the cross-source synthesis audio artifact.
pub const SYNTHESIS_BASE_NAME: &str = "final_synthesis";

/// Errors raised while assembling the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// HTTP client for acquisition could not be built.
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    /// Summarization backend could not be initialized.
    #[error("Failed to initialize summarization client: {0}")]
    Summarization(#[from] crate::summarization::SummarizationClientError),
    /// Speech backend could not be initialized.
    #[error("Failed to initialize speech client: {0}")]
    Speech(#[from] crate::speech::SpeechClientError),
}

/// One source to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputItem {
    /// Local PDF file.
    Pdf(PathBuf),
    /// Digital Object Identifier resolved through the registry.
    Doi(String),
    /// Web page.
    Url(String),
}

impl InputItem {
    /// Identifier as supplied by the caller.
    pub fn source(&self) -> String {
        match self {
            Self::Pdf(path) => path.display().to_string(),
            Self::Doi(doi) => doi.clone(),
            Self::Url(url) => url.clone(),
        }
    }

    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pdf(_) => "pdf",
            Self::Doi(_) => "doi",
            Self::Url(_) => "url",
        }
    }

    /// Unsanitized name for this item's audio artifact.
    pub fn audio_base_name(&self) -> String {
        match self {
            Self::Pdf(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Doi(doi) => doi.clone(),
            Self::Url(url) => url
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .to_string(),
        }
    }
}

/// Inputs for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// PDF files already on local disk.
    pub pdfs: Vec<PathBuf>,
    /// DOI strings.
    pub dois: Vec<String>,
    /// Page URLs.
    pub urls: Vec<String>,
    /// Candidate topics for classification.
    pub topics: Vec<String>,
}

impl BatchRequest {
    /// Input items in processing order: PDFs, then DOIs, then URLs.
    pub fn items(&self) -> Vec<InputItem> {
        self.pdfs
            .iter()
            .cloned()
            .map(InputItem::Pdf)
            .chain(self.dois.iter().cloned().map(InputItem::Doi))
            .chain(self.urls.iter().cloned().map(InputItem::Url))
            .collect()
    }

    /// Whether the request names no sources at all.
    pub fn is_empty(&self) -> bool {
        self.pdfs.is_empty() && self.dois.is_empty() && self.urls.is_empty()
    }
}

/// Descriptive details about a citation's source, not part of the citation wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDetails {
    /// Title reported by the source.
    pub title: Option<String>,
    /// Authors reported by the source.
    pub authors: Vec<String>,
}

/// Result of processing one input item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    /// Identifier as supplied by the caller.
    pub source: String,
    /// Best-matching topic.
    pub topic: String,
    /// Rendered audio artifact, when one was produced.
    pub audio: Option<PathBuf>,
    /// Summary text, possibly empty or [`SUMMARY_UNAVAILABLE`].
    pub summary: String,
    /// Metadata surfaced by the source.
    #[serde(skip)]
    pub details: SourceDetails,
}

impl Citation {
    /// Whether the summary carries real content.
    pub fn has_summary(&self) -> bool {
        is_usable_summary(&self.summary)
    }
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisResult {
    /// Cross-source synthesis, empty when no item produced a summary.
    pub synthesis: String,
    /// Audio artifact for the synthesis.
    pub synthesis_audio: Option<PathBuf>,
    /// Citations in input order: PDFs, DOIs, URLs.
    pub citations: Vec<Citation>,
}

/// A summary is usable when it is non-blank and not the failure sentinel.
pub fn is_usable_summary(summary: &str) -> bool {
    let trimmed = summary.trim();
    !trimmed.is_empty() && trimmed != SUMMARY_UNAVAILABLE
}
