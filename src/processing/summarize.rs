//! Paragraph-level summarization with a failure sentinel.

use crate::config::Config;
use crate::processing::chunking::{TokenBudget, split_paragraphs};
use crate::processing::types::SUMMARY_UNAVAILABLE;
use crate::summarization::{SummarizationClient, SummarizationRequest};
use std::sync::Arc;

/// Length bounds applied to every summarization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    /// Paragraphs at or below this many characters are skipped.
    pub min_paragraph_chars: usize,
    /// Lower bound on each paragraph summary, in tokens.
    pub min_tokens: usize,
    /// Upper bound on each paragraph summary, in tokens.
    pub max_tokens: usize,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        Self {
            min_paragraph_chars: 100,
            min_tokens: 50,
            max_tokens: 200,
        }
    }
}

/// Condenses text one paragraph at a time through an injected [`SummarizationClient`].
///
/// Built once per process; cheap to share behind an `Arc`.
pub struct Summarizer {
    client: Arc<dyn SummarizationClient>,
    budget: TokenBudget,
    bounds: SummaryBounds,
}

impl Summarizer {
    /// Build a summarizer from configuration around an existing client.
    pub fn from_config(client: Arc<dyn SummarizationClient>, config: &Config) -> Self {
        Self {
            client,
            budget: TokenBudget::new(&config.summary_tokenizer, config.summary_input_token_limit),
            bounds: SummaryBounds {
                min_paragraph_chars: config.min_paragraph_chars,
                min_tokens: config.summary_min_tokens,
                max_tokens: config.summary_max_tokens,
            },
        }
    }

    /// Build a summarizer that budgets input by whitespace words.
    pub fn new(
        client: Arc<dyn SummarizationClient>,
        bounds: SummaryBounds,
        input_word_limit: usize,
    ) -> Self {
        Self {
            client,
            budget: TokenBudget::whitespace(input_word_limit),
            bounds,
        }
    }

    /// Summarize `text`, returning an empty string when no paragraph qualifies and
    /// [`SUMMARY_UNAVAILABLE`] when the backend fails.
    pub async fn summarize(&self, text: &str) -> String {
        let paragraphs = split_paragraphs(text, self.bounds.min_paragraph_chars);
        if paragraphs.is_empty() {
            tracing::debug!("No paragraph long enough to summarize");
            return String::new();
        }

        let mut summaries = Vec::with_capacity(paragraphs.len());
        for (index, paragraph) in paragraphs.iter().enumerate() {
            let request = SummarizationRequest {
                text: self.budget.truncate(paragraph),
                min_tokens: self.bounds.min_tokens,
                max_tokens: self.bounds.max_tokens,
            };
            match self.client.summarize(request).await {
                Ok(summary) => summaries.push(summary),
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        paragraph = index,
                        paragraphs = paragraphs.len(),
                        "Summarization failed"
                    );
                    return SUMMARY_UNAVAILABLE.to_string();
                }
            }
        }

        tracing::debug!(paragraphs = paragraphs.len(), "Summarized text");
        summaries.join(" ")
    }
}
