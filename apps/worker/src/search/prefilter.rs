//! Cosine-similarity prefilter over chunk histograms
//!
//! Scores every reference chunk at every shift in the prefilter range,
//! keeps each chunk's best shift and returns the `top_n` best chunks.

use cantus_shared_config::{Resolution, ShiftRange};
use rayon::prelude::*;

use crate::corpus::IndexedChunk;
use crate::melody::{cosine_similarity, histogram, median, Chunk};
use crate::pool::WorkerPool;

/// A chunk at its best-fitting prefilter shift
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub chunk: &'a Chunk,
    pub similarity: f64,
    pub shift: i32,
    /// `(chunk median - query median) mod octave`, diagnostic only
    pub median_offset: f64,
}

/// Rank chunks by histogram similarity to the query
///
/// Chunks are split into one contiguous partition per pool thread. Each
/// partition ranks its own chunks privately and keeps only its local
/// `top_n`; the partitions are then merged in order and re-ranked with a
/// stable sort, so ties keep corpus order.
#[tracing::instrument(skip_all, fields(chunks = chunks.len(), top_n = top_n))]
pub fn prefilter<'a>(
    query: &[f64],
    chunks: &'a [IndexedChunk],
    shift_range: ShiftRange,
    top_n: usize,
    resolution: Resolution,
    pool: &WorkerPool,
) -> Vec<Candidate<'a>> {
    if chunks.is_empty() || top_n == 0 {
        return Vec::new();
    }

    let query_hist = histogram(query, 0.0, resolution);
    let query_median = median(query).unwrap_or(0.0);
    let octave = resolution.octave();
    let partition_size = chunks.len().div_ceil(pool.partitions()).max(1);

    let partitions: Vec<Vec<Candidate<'a>>> = pool.install(|| {
        chunks
            .par_chunks(partition_size)
            .map(|partition| {
                let mut local: Vec<Candidate<'a>> = partition
                    .iter()
                    .map(|indexed| {
                        let (shift, similarity) = shift_range
                            .iter()
                            .map(|s| (s, cosine_similarity(&indexed.histogram.rotated(s), &query_hist)))
                            .fold((shift_range.min(), f64::NEG_INFINITY), |best, next| {
                                if next.1 > best.1 {
                                    next
                                } else {
                                    best
                                }
                            });
                        Candidate {
                            chunk: &indexed.chunk,
                            similarity,
                            shift,
                            median_offset: (indexed.median - query_median).rem_euclid(octave),
                        }
                    })
                    .collect();
                rank(&mut local, top_n);
                local
            })
            .collect()
    });

    let mut candidates: Vec<Candidate<'a>> = partitions.into_iter().flatten().collect();
    rank(&mut candidates, top_n);

    tracing::debug!(
        candidates = candidates.len(),
        best = candidates.first().map(|c| c.similarity),
        "Prefilter complete"
    );
    candidates
}

/// Stable descending sort by similarity, truncated to `top_n`
fn rank(candidates: &mut Vec<Candidate<'_>>, top_n: usize) {
    candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    candidates.truncate(top_n);
}
