//! DTW reranking of prefilter candidates

use cantus_shared_config::RerankConfig;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use super::dtw::{weighted_dtw, Alignment};
use super::{Candidate, Match};
use crate::error::{MatchError, MatchResult};
use crate::melody::median;
use crate::pool::WorkerPool;

/// Score every candidate with the stretch-penalized DTW and sort ascending
///
/// The query is median-normalized and shifted by each rerank shift; the
/// chunk is median-normalized at shift 0. Each candidate keeps its
/// lowest-distance shift (first shift wins ties). A candidate whose
/// alignment fails is kept with an infinite distance and sorts last.
///
/// The token is checked before each candidate; a cancelled query discards
/// its partial scores and returns [`MatchError::Cancelled`].
#[tracing::instrument(skip_all, fields(candidates = candidates.len()))]
pub fn rerank(
    query: &[f64],
    candidates: &[Candidate<'_>],
    config: &RerankConfig,
    pool: &WorkerPool,
    cancel: &CancellationToken,
) -> MatchResult<Vec<Match>> {
    let normalized_query = normalize(query);

    let scored: Vec<Option<Match>> = pool.install(|| {
        candidates
            .par_iter()
            .map(|candidate| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(score_candidate(&normalized_query, candidate, config))
            })
            .collect()
    });

    if cancel.is_cancelled() {
        return Err(MatchError::Cancelled(
            "query abandoned during rerank".to_string(),
        ));
    }

    let mut matches: Vec<Match> = scored.into_iter().flatten().collect();
    matches.sort_by(|a, b| a.sort_distance().total_cmp(&b.sort_distance()));

    tracing::debug!(
        matches = matches.len(),
        best = matches.first().and_then(|m| m.distance),
        "Rerank complete"
    );
    Ok(matches)
}

fn score_candidate(normalized_query: &[f64], candidate: &Candidate<'_>, config: &RerankConfig) -> Match {
    let reference = normalize(&candidate.chunk.pitches);

    let mut best: Option<(i32, Alignment)> = None;
    for shift in config.shift_range {
        let shifted: Vec<f64> = normalized_query.iter().map(|p| p + f64::from(shift)).collect();
        match weighted_dtw(
            &shifted,
            &reference,
            config.stretch_penalty_factor,
            config.stretch_edge_threshold,
        ) {
            Ok(alignment) => {
                let better = best
                    .as_ref()
                    .map_or(true, |(_, b)| alignment.distance() < b.distance());
                if better {
                    best = Some((shift, alignment));
                }
            }
            Err(e) => {
                tracing::debug!(
                    track_id = %candidate.chunk.track_id,
                    start_time = candidate.chunk.start_time,
                    error = %e,
                    "Alignment failed, scoring as infinite distance"
                );
            }
        }
    }

    let mut scored = Match::from_candidate(candidate);
    match best {
        Some((shift, alignment)) => {
            scored.shift = shift;
            scored.distance = Some(alignment.distance());
            scored.alignment = Some(alignment.path);
        }
        None => {
            scored.shift = config.shift_range.min();
            scored.distance = Some(f64::INFINITY);
        }
    }
    scored
}

fn normalize(pitches: &[f64]) -> Vec<f64> {
    let center = median(pitches).unwrap_or(0.0);
    pitches.iter().map(|p| p - center).collect()
}
