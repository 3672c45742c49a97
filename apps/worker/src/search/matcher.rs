//! End-to-end query pipeline

use std::time::Instant;

use cantus_shared_config::MatcherConfig;
use tokio_util::sync::CancellationToken;

use super::{dedupe, prefilter, rerank, Match};
use crate::corpus::Corpus;
use crate::error::{MatchError, MatchResult};
use crate::melody::PitchSequence;
use crate::pool::WorkerPool;

/// Runs prefilter, rerank and dedupe for one query against a corpus snapshot
#[derive(Debug)]
pub struct MelodyMatcher {
    config: MatcherConfig,
    pool: WorkerPool,
}

impl MelodyMatcher {
    /// Create a matcher, rejecting invalid configuration up front
    pub fn new(config: MatcherConfig, pool: WorkerPool) -> MatchResult<Self> {
        config.validate()?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Search without cancellation
    pub fn search(&self, query: &PitchSequence, corpus: &Corpus) -> MatchResult<Vec<Match>> {
        self.search_with_cancel(query, corpus, &CancellationToken::new())
    }

    /// Search, abandoning the query once `cancel` fires
    ///
    /// An empty query is a valid "no notes" input and returns no matches.
    #[tracing::instrument(skip_all, fields(query_notes = query.len(), corpus_chunks = corpus.len()))]
    pub fn search_with_cancel(
        &self,
        query: &PitchSequence,
        corpus: &Corpus,
        cancel: &CancellationToken,
    ) -> MatchResult<Vec<Match>> {
        if corpus.resolution() != self.config.resolution {
            return Err(MatchError::invalid_parameters(format!(
                "corpus indexed at {} resolution but matcher configured for {}",
                corpus.resolution(),
                self.config.resolution
            )));
        }
        if query.is_empty() {
            tracing::info!("Query has no notes, nothing to match");
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let candidates = prefilter(
            query.pitches(),
            corpus.chunks(),
            self.config.prefilter.shift_range,
            self.config.prefilter.top_n,
            self.config.resolution,
            &self.pool,
        );

        if cancel.is_cancelled() {
            return Err(MatchError::Cancelled(
                "query abandoned before rerank".to_string(),
            ));
        }

        let reranked = rerank(
            query.pitches(),
            &candidates,
            &self.config.rerank,
            &self.pool,
            cancel,
        )?;
        let matches = dedupe(reranked, self.config.rerank.final_top_n);

        tracing::info!(
            candidates = candidates.len(),
            matches = matches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query complete"
        );
        Ok(matches)
    }

    /// Prefilter stage only, as partial matches ordered by similarity
    pub fn prefilter_matches(&self, query: &PitchSequence, corpus: &Corpus) -> Vec<Match> {
        prefilter(
            query.pitches(),
            corpus.chunks(),
            self.config.prefilter.shift_range,
            self.config.prefilter.top_n,
            self.config.resolution,
            &self.pool,
        )
        .iter()
        .map(Match::from_candidate)
        .collect()
    }
}
