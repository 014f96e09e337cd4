//! Research-to-podcast pipeline: summarization, topic tagging, narration, and orchestration.

pub mod audio;
mod chunking;
pub mod classify;
pub mod sanitize;
mod service;
pub mod summarize;
pub mod types;

pub use audio::{AUDIO_EXTENSION, AudioSynthesizer};
pub use classify::classify_topic;
pub use service::{PipelineApi, PipelineService};
pub use summarize::{Summarizer, SummaryBounds};
pub use types::{
    BatchRequest, Citation, InputItem, PipelineError, SUMMARY_UNAVAILABLE, SYNTHESIS_BASE_NAME,
    SourceDetails, SynthesisResult, UNSPECIFIED_TOPIC, is_usable_summary,
};
