//! Paragraph segmentation and input-budget truncation for the summarizer.
//!
//! - Paragraphs are separated by blank lines; anything at or below the minimum character count
//!   is treated as a header or noise and dropped.
//! - Token counting prefers `tiktoken-rs` (model name or encoding name); when the tokenizer cannot
//!   be loaded the budget falls back to whitespace-separated words.

use anyhow::Error as TokenizerError;
use std::sync::Arc;
use tiktoken_rs::{
    CoreBPE, cl100k_base, get_bpe_from_model, o200k_base, p50k_base, p50k_edit, r50k_base,
};

/// Split text on blank lines, keeping trimmed paragraphs longer than `min_chars` characters.
pub(crate) fn split_paragraphs(text: &str, min_chars: usize) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            push_paragraph(&mut paragraphs, &mut current, min_chars);
        } else {
            current.push(line);
        }
    }
    push_paragraph(&mut paragraphs, &mut current, min_chars);
    paragraphs
}

fn push_paragraph(paragraphs: &mut Vec<String>, lines: &mut Vec<&str>, min_chars: usize) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join("\n");
    lines.clear();
    let trimmed = joined.trim();
    if trimmed.chars().count() > min_chars {
        paragraphs.push(trimmed.to_string());
    }
}

/// Truncates text to a fixed token budget.
#[derive(Clone)]
pub(crate) struct TokenBudget {
    encoding: Option<Arc<CoreBPE>>,
    limit: usize,
}

impl TokenBudget {
    /// Build a budget using the named tokenizer, falling back to whitespace words.
    pub(crate) fn new(tokenizer: &str, limit: usize) -> Self {
        let encoding = match resolve_encoding(tokenizer) {
            Ok(encoding) => Some(Arc::new(encoding)),
            Err(error) => {
                tracing::warn!(
                    tokenizer,
                    error = %error,
                    "Tokenizer unavailable; falling back to whitespace word budget"
                );
                None
            }
        };
        Self { encoding, limit }
    }

    /// Budget that counts whitespace-separated words.
    pub(crate) fn whitespace(limit: usize) -> Self {
        Self {
            encoding: None,
            limit,
        }
    }

    /// Keep at most `limit` tokens from the start of `text`.
    pub(crate) fn truncate(&self, text: &str) -> String {
        if let Some(encoding) = self.encoding.as_ref() {
            let tokens = encoding.encode_ordinary(text);
            if tokens.len() <= self.limit {
                return text.to_string();
            }
            match encoding.decode(tokens[..self.limit].to_vec()) {
                Ok(head) => return head,
                Err(error) => {
                    tracing::debug!(%error, "Token decode failed; truncating by words");
                }
            }
        }
        truncate_words(text, self.limit)
    }
}

fn truncate_words(text: &str, limit: usize) -> String {
    if text.split_whitespace().count() <= limit {
        return text.to_string();
    }
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_encoding(name: &str) -> Result<CoreBPE, TokenizerError> {
    let normalized = name.trim();
    if let Some(candidate) = encoding_from_name(normalized) {
        return candidate;
    }
    match get_bpe_from_model(normalized) {
        Ok(encoding) => Ok(encoding),
        Err(model_err) => {
            tracing::debug!(
                tokenizer = normalized,
                error = %model_err,
                "Tokenizer lookup failed; using 'cl100k_base'"
            );
            cl100k_base()
        }
    }
}

fn encoding_from_name(name: &str) -> Option<Result<CoreBPE, TokenizerError>> {
    match name {
        "" | "cl100k_base" => Some(cl100k_base()),
        "o200k_base" => Some(o200k_base()),
        "p50k_base" => Some(p50k_base()),
        "p50k_edit" => Some(p50k_edit()),
        "r50k_base" | "gpt2" => Some(r50k_base()),
        _ => None,
    }
}
