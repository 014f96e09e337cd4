#![deny(missing_docs)]

//! Core library for the Paper Podcast server: research sources in, narrated summaries out.

/// Source text acquisition from PDFs, DOIs, and web pages.
pub mod acquisition;
/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline metrics helpers.
pub mod metrics;
/// Summarization, topic tagging, narration, and batch orchestration.
pub mod processing;
/// Speech synthesis client abstraction and adapters.
pub mod speech;
/// Summarization client abstraction and adapters.
pub mod summarization;
