//! Pipeline service coordinating acquisition, summarization, tagging, and narration.

use crate::{
    acquisition::{Acquire, AcquiredContent, ContentAcquirer},
    config::Config,
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        audio::AudioSynthesizer,
        classify::classify_topic,
        summarize::Summarizer,
        types::{
            BatchRequest, Citation, InputItem, PipelineError, SUMMARY_UNAVAILABLE,
            SYNTHESIS_BASE_NAME, SourceDetails, SynthesisResult, UNSPECIFIED_TOPIC,
        },
    },
    speech::get_speech_client,
    summarization::get_summarization_client,
};
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use std::sync::Arc;

/// Runs batches end to end: per-item acquisition, summarization, topic tagging, and audio,
/// followed by one cross-source synthesis.
///
/// The service owns long-lived handles to the acquirer, summarizer, and speech backend so every
/// request reuses them. Construct it once near process start and share it through an `Arc`.
pub struct PipelineService {
    acquirer: Arc<dyn Acquire>,
    summarizer: Summarizer,
    audio: AudioSynthesizer,
    metrics: Arc<PipelineMetrics>,
    concurrency: usize,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Process a whole batch and return its synthesis and citations.
    async fn run(&self, request: BatchRequest) -> SynthesisResult;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl PipelineService {
    /// Assemble the pipeline from explicit collaborators.
    pub fn new(
        acquirer: Arc<dyn Acquire>,
        summarizer: Summarizer,
        audio: AudioSynthesizer,
        concurrency: usize,
    ) -> Self {
        Self {
            acquirer,
            summarizer,
            audio,
            metrics: Arc::new(PipelineMetrics::new()),
            concurrency: concurrency.max(1),
        }
    }

    /// Build the production pipeline described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        tracing::info!("Initializing summarization client");
        let summarization = get_summarization_client(config)?;
        let speech = get_speech_client(config)?;
        let acquirer = ContentAcquirer::new(config)?;
        tracing::info!(
            provider = ?config.summarization_provider,
            model = %config.summarization_model,
            concurrency = config.pipeline_concurrency,
            "Pipeline initialized"
        );

        Ok(Self::new(
            Arc::new(acquirer),
            Summarizer::from_config(summarization, config),
            AudioSynthesizer::new(
                speech,
                config.output_dir.clone(),
                config.speech_language.clone(),
            ),
            config.pipeline_concurrency,
        ))
    }

    /// Process a batch.
    ///
    /// Citations come back in input order (PDFs, DOIs, URLs) regardless of the configured
    /// concurrency. The synthesis starts only after every item has finished.
    pub async fn run(&self, request: BatchRequest) -> SynthesisResult {
        let items = request.items();
        tracing::info!(
            pdfs = request.pdfs.len(),
            dois = request.dois.len(),
            urls = request.urls.len(),
            topics = request.topics.len(),
            "Processing batch"
        );

        let topics = request.topics.as_slice();
        let citations: Vec<Citation> = stream::iter(items)
            .map(|item| self.process_item(item, topics))
            .buffered(self.concurrency)
            .filter_map(|citation| async move { citation })
            .collect()
            .await;

        let summaries: Vec<&str> = citations
            .iter()
            .filter(|citation| citation.has_summary())
            .map(|citation| citation.summary.as_str())
            .collect();

        let (synthesis, synthesis_audio) = if summaries.is_empty() {
            tracing::info!("No successful summaries; skipping synthesis");
            (String::new(), None)
        } else {
            tracing::info!(
                summaries = summaries.len(),
                "Synthesizing across sources"
            );
            let synthesis = self.summarizer.summarize(&summaries.join(" ")).await;
            let audio = self.audio.synthesize(&synthesis, SYNTHESIS_BASE_NAME).await;
            (synthesis, audio)
        };

        let audio_files = citations
            .iter()
            .filter(|citation| citation.audio.is_some())
            .count()
            + usize::from(synthesis_audio.is_some());
        self.metrics.record_batch(
            citations.len() as u64,
            audio_files as u64,
            synthesis_audio.is_some(),
        );
        tracing::info!(
            citations = citations.len(),
            audio_files,
            podcast = synthesis_audio.is_some(),
            "Batch complete"
        );

        SynthesisResult {
            synthesis,
            synthesis_audio,
            citations,
        }
    }

    async fn process_item(&self, item: InputItem, topics: &[String]) -> Option<Citation> {
        let source = item.source();
        tracing::info!(kind = item.kind(), source = %source, "Processing item");

        let content = match self.acquirer.acquire(&item).await {
            Ok(content) => content,
            Err(error) => return self.acquisition_failed(&item, source, error),
        };

        if matches!(item, InputItem::Url(_)) && content.text.trim().is_empty() {
            tracing::warn!(source = %source, "URL yielded no content; skipping");
            return None;
        }

        let AcquiredContent {
            text,
            title,
            authors,
        } = content;
        let summary = self.summarizer.summarize(&text).await;
        let topic = if crate::processing::is_usable_summary(&summary) {
            classify_topic(&summary, topics)
        } else {
            UNSPECIFIED_TOPIC.to_string()
        };
        let audio = self
            .audio
            .synthesize(&summary, &item.audio_base_name())
            .await;

        Some(Citation {
            source,
            topic,
            audio,
            summary,
            details: SourceDetails { title, authors },
        })
    }

    fn acquisition_failed(
        &self,
        item: &InputItem,
        source: String,
        error: crate::acquisition::AcquisitionError,
    ) -> Option<Citation> {
        match item {
            InputItem::Pdf(_) => {
                tracing::warn!(source = %source, error = %error, "PDF extraction failed");
                Some(Citation {
                    source,
                    topic: UNSPECIFIED_TOPIC.to_string(),
                    audio: None,
                    summary: SUMMARY_UNAVAILABLE.to_string(),
                    details: SourceDetails::default(),
                })
            }
            InputItem::Doi(_) => {
                tracing::warn!(source = %source, error = %error, "DOI not resolved; dropping item");
                None
            }
            InputItem::Url(_) => {
                tracing::warn!(source = %source, error = %error, "URL fetch failed; skipping");
                None
            }
        }
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl PipelineApi for PipelineService {
    async fn run(&self, request: BatchRequest) -> SynthesisResult {
        PipelineService::run(self, request).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        PipelineService::metrics_snapshot(self)
    }
}
