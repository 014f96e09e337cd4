//! Content acquisition: turning a PDF path, DOI, or URL into raw text.
//!
//! Each source kind has its own failure mode. PDFs fail with [`AcquisitionError::Extraction`],
//! DOIs with [`AcquisitionError::DoiNotFound`], and URLs with [`AcquisitionError::Fetch`]. The
//! pipeline decides what a failure means for the batch; this module only reports it.

mod doi;
mod pdf;
mod web;

pub use doi::{DoiMetadata, compose_doi_text, strip_jats_markup};
pub use pdf::extract_pdf_text;
pub use web::extract_main_content;

use crate::config::Config;
use crate::processing::InputItem;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while acquiring source text.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// PDF could not be opened or parsed.
    #[error("Failed to extract text from {path}: {reason}")]
    Extraction {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying parser or I/O message.
        reason: String,
    },
    /// Registry lookup missed, failed, or returned an unusable record.
    #[error("DOI {doi} could not be resolved: {reason}")]
    DoiNotFound {
        /// DOI as supplied by the caller.
        doi: String,
        /// Status or transport failure description.
        reason: String,
    },
    /// Page could not be fetched.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// URL as supplied by the caller.
        url: String,
        /// Status or transport failure description.
        reason: String,
    },
}

/// Raw text plus whatever descriptive metadata the source exposed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcquiredContent {
    /// Natural-language text handed to the summarizer.
    pub text: String,
    /// Title reported by the source, when known.
    pub title: Option<String>,
    /// Author names reported by the source.
    pub authors: Vec<String>,
}

impl AcquiredContent {
    /// Content consisting of text only.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Interface over content acquisition so the pipeline can run against fakes.
#[async_trait]
pub trait Acquire: Send + Sync {
    /// Produce raw text for a single input item.
    async fn acquire(&self, item: &InputItem) -> Result<AcquiredContent, AcquisitionError>;
}

/// Acquirer backed by the local filesystem, the CrossRef API, and plain HTTP fetches.
pub struct ContentAcquirer {
    http: Client,
    crossref_url: String,
}

impl ContentAcquirer {
    /// Build an acquirer with the configured timeout, user agent, and registry URL.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(config.fetch_user_agent.as_str())
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;
        tracing::debug!(
            crossref_url = %config.crossref_url,
            timeout_secs = config.fetch_timeout_secs,
            "Initialized content acquirer"
        );
        Ok(Self {
            http,
            crossref_url: config.crossref_url.clone(),
        })
    }
}

#[async_trait]
impl Acquire for ContentAcquirer {
    async fn acquire(&self, item: &InputItem) -> Result<AcquiredContent, AcquisitionError> {
        match item {
            InputItem::Pdf(path) => {
                let owned = path.clone();
                let text = tokio::task::spawn_blocking(move || extract_pdf_text(&owned))
                    .await
                    .map_err(|error| AcquisitionError::Extraction {
                        path: path.clone(),
                        reason: format!("extraction task failed: {error}"),
                    })??;
                Ok(AcquiredContent::from_text(text))
            }
            InputItem::Doi(doi) => {
                let metadata = doi::resolve_doi(&self.http, &self.crossref_url, doi).await?;
                Ok(AcquiredContent {
                    text: compose_doi_text(&metadata),
                    title: Some(metadata.title).filter(|title| !title.is_empty()),
                    authors: metadata.authors,
                })
            }
            InputItem::Url(url) => {
                let text = web::fetch_url_text(&self.http, url).await?;
                Ok(AcquiredContent::from_text(text))
            }
        }
    }
}
