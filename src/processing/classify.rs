//! Topic tagging by substring frequency.
//!
//! This is a naive heuristic, not semantic classification: each candidate topic is scored by how
//! many times it occurs (case-insensitively, non-overlapping) in the summary. The first-listed
//! topic wins ties, including the all-zero case.

use crate::processing::types::UNSPECIFIED_TOPIC;

/// Pick the topic that occurs most often in `summary`.
///
/// Returns [`UNSPECIFIED_TOPIC`] when `topics` is empty; otherwise always returns a member of
/// `topics`.
pub fn classify_topic(summary: &str, topics: &[String]) -> String {
    let haystack = summary.to_lowercase();
    let mut best: Option<(&String, usize)> = None;

    for topic in topics {
        let count = haystack.matches(topic.to_lowercase().as_str()).count();
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((topic, count));
        }
    }

    best.map(|(topic, _)| topic.clone())
        .unwrap_or_else(|| UNSPECIFIED_TOPIC.to_string())
}
