use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Thread-safe counters describing pipeline activity since startup.
#[derive(Default)]
pub struct PipelineMetrics {
    batches_processed: AtomicU64,
    citations_produced: AtomicU64,
    audio_files_written: AtomicU64,
    podcasts_created: AtomicU64,
    last_batch_at: Mutex<Option<String>>,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed batch.
    pub fn record_batch(&self, citations: u64, audio_files: u64, podcast_created: bool) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.citations_produced
            .fetch_add(citations, Ordering::Relaxed);
        self.audio_files_written
            .fetch_add(audio_files, Ordering::Relaxed);
        if podcast_created {
            self.podcasts_created.fetch_add(1, Ordering::Relaxed);
        }
        let stamp = OffsetDateTime::now_utc().format(&Rfc3339).ok();
        if let Ok(mut guard) = self.last_batch_at.lock() {
            *guard = stamp;
        }
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_processed: self.batches_processed.load(Ordering::Relaxed),
            citations_produced: self.citations_produced.load(Ordering::Relaxed),
            audio_files_written: self.audio_files_written.load(Ordering::Relaxed),
            podcasts_created: self.podcasts_created.load(Ordering::Relaxed),
            last_batch_at: self
                .last_batch_at
                .lock()
                .ok()
                .and_then(|guard| guard.clone()),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of batches completed since startup.
    pub batches_processed: u64,
    /// Citations emitted across all batches.
    pub citations_produced: u64,
    /// Audio artifacts written, per-citation and synthesis combined.
    pub audio_files_written: u64,
    /// Batches that produced a synthesis podcast.
    pub podcasts_created: u64,
    /// RFC3339 completion time of the most recent batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_batch_at: Option<String>,
}
