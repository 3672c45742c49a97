//! Sliding-window chunking of reference tracks
//!
//! Windows start at multiples of the hop (`chunk_length - overlap`) and cover
//! the half-open interval `[start, start + chunk_length)`. Slicing is kept
//! separate from the minimum-note quality gate so it stays a pure function.

use serde::Serialize;

use super::sequence::PitchSequence;
use crate::error::{MatchError, MatchResult};

/// A fixed-duration window over one reference track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub track_id: String,
    /// Window start in seconds from the beginning of the track
    pub start_time: f64,
    pub pitches: Vec<f64>,
    pub times: Vec<f64>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }
}

/// Number of windows for a sequence whose last onset is at `duration`
///
/// Zero when the sequence is shorter than one window.
pub fn window_count(duration: f64, chunk_length: f64, overlap: f64) -> MatchResult<usize> {
    validate_window(chunk_length, overlap)?;
    if !duration.is_finite() || duration < chunk_length {
        return Ok(0);
    }
    let hop = chunk_length - overlap;
    Ok(((duration - chunk_length) / hop).floor() as usize + 1)
}

/// Slice a track into overlapping windows
///
/// Every window is returned, including empty ones; see [`filter_min_notes`]
/// for the quality gate.
pub fn chunk(
    track_id: &str,
    sequence: &PitchSequence,
    chunk_length: f64,
    overlap: f64,
) -> MatchResult<Vec<Chunk>> {
    let count = window_count(sequence.duration(), chunk_length, overlap)?;
    if sequence.is_empty() || count == 0 {
        return Ok(Vec::new());
    }

    let hop = chunk_length - overlap;
    let times = sequence.times();
    let pitches = sequence.pitches();

    let chunks = (0..count)
        .map(|i| {
            let start_time = i as f64 * hop;
            let end_time = start_time + chunk_length;
            // times are sorted, so each window is a contiguous index range
            let lo = times.partition_point(|&t| t < start_time);
            let hi = times.partition_point(|&t| t < end_time);
            Chunk {
                track_id: track_id.to_string(),
                start_time,
                pitches: pitches[lo..hi].to_vec(),
                times: times[lo..hi].to_vec(),
            }
        })
        .collect();

    Ok(chunks)
}

/// Drop windows with fewer than `min_notes` samples
pub fn filter_min_notes(chunks: Vec<Chunk>, min_notes: usize) -> Vec<Chunk> {
    chunks.into_iter().filter(|c| c.len() >= min_notes).collect()
}

/// Reject window parameters that leave the window count undefined
pub fn validate_window(chunk_length: f64, overlap: f64) -> MatchResult<()> {
    if !chunk_length.is_finite() || chunk_length <= 0.0 {
        return Err(MatchError::invalid_parameters(format!(
            "chunk length must be positive, got {}",
            chunk_length
        )));
    }
    if !overlap.is_finite() || overlap < 0.0 {
        return Err(MatchError::invalid_parameters(format!(
            "chunk overlap must be non-negative, got {}",
            overlap
        )));
    }
    if overlap >= chunk_length {
        return Err(MatchError::invalid_parameters(format!(
            "chunk overlap {} must be shorter than chunk length {}",
            overlap, chunk_length
        )));
    }
    Ok(())
}
