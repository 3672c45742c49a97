//! Weighted DTW reranking configuration types

use crate::{parse_env, ConfigError, ConfigResult, ShiftRange};

/// Alignment-based reranking configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RerankConfig {
    /// Small shift window searched around each candidate
    pub shift_range: ShiftRange,

    /// Multiplier applied to the squared length of every stretch run
    pub stretch_penalty_factor: f64,

    /// Number of path positions at either end that receive the lenient penalty
    pub stretch_edge_threshold: usize,

    /// Maximum number of tracks in the final result
    pub final_top_n: usize,
}

impl RerankConfig {
    /// Load reranking configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            shift_range: parse_env("RERANK_SHIFT_RANGE", ShiftRange::symmetric(1))?,
            stretch_penalty_factor: parse_env("STRETCH_PENALTY_FACTOR", 0.2)?,
            stretch_edge_threshold: parse_env("STRETCH_EDGE_THRESHOLD", 5)?,
            final_top_n: parse_env("FINAL_TOP_N", 10)?,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.stretch_penalty_factor.is_finite() || self.stretch_penalty_factor < 0.0 {
            return Err(ConfigError::invalid(
                "rerank",
                format!(
                    "stretch penalty factor must be a non-negative number, got {}",
                    self.stretch_penalty_factor
                ),
            ));
        }
        if self.final_top_n == 0 {
            return Err(ConfigError::invalid("rerank", "final top_n must be at least 1"));
        }
        Ok(())
    }
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            shift_range: ShiftRange::symmetric(1),
            stretch_penalty_factor: 0.2,
            stretch_edge_threshold: 5,
            final_top_n: 10,
        }
    }
}
