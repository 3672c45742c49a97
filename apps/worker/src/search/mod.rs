//! Two-stage melody search: histogram prefilter, DTW rerank, per-track dedupe

pub mod dedupe;
pub mod dtw;
pub mod matcher;
pub mod prefilter;
pub mod rerank;

pub use dedupe::dedupe;
pub use dtw::{dtw, stretch_penalty, weighted_dtw, Alignment};
pub use matcher::MelodyMatcher;
pub use prefilter::{prefilter, Candidate};
pub use rerank::rerank;

use serde::Serialize;

/// A ranked match of the query against one reference chunk
///
/// The prefilter produces matches with only `similarity` set; the reranker
/// fills in `distance` and `alignment`. Lower distance is better, higher
/// similarity is better. An infinite distance (failed alignment) serializes
/// as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub track_id: String,
    /// Chunk start offset within the reference track, in seconds
    pub start_time: f64,
    /// Transposition applied to the query, in resolution units
    pub shift: i32,
    pub similarity: f64,
    pub distance: Option<f64>,
    pub median_offset: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Vec<(usize, usize)>>,
}

impl Match {
    /// Partial match from a prefilter candidate
    pub fn from_candidate(candidate: &Candidate<'_>) -> Self {
        Self {
            track_id: candidate.chunk.track_id.clone(),
            start_time: candidate.chunk.start_time,
            shift: candidate.shift,
            similarity: candidate.similarity,
            distance: None,
            median_offset: candidate.median_offset,
            alignment: None,
        }
    }

    /// Distance used for ordering; a missing distance sorts last
    pub fn sort_distance(&self) -> f64 {
        self.distance.unwrap_or(f64::INFINITY)
    }

    pub fn timestamp(&self) -> String {
        format_timestamp(self.start_time)
    }
}

/// Format seconds as `MM:SS` (minutes are not wrapped at 60)
pub fn format_timestamp(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}
