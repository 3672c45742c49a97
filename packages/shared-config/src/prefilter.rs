//! Histogram prefilter configuration types

use crate::{parse_env, ConfigError, ConfigResult, ShiftRange};

/// Cosine-similarity prefilter configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PrefilterConfig {
    /// Shifts tried against every reference chunk
    pub shift_range: ShiftRange,

    /// Number of candidates handed to the reranker
    pub top_n: usize,
}

impl PrefilterConfig {
    /// Load prefilter configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            shift_range: parse_env("PREFILTER_SHIFT_RANGE", ShiftRange::symmetric(2))?,
            top_n: parse_env("PREFILTER_TOP_N", 500)?,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.top_n == 0 {
            return Err(ConfigError::invalid("prefilter", "top_n must be at least 1"));
        }
        Ok(())
    }
}

impl Default for PrefilterConfig {
    fn default() -> Self {
        Self {
            shift_range: ShiftRange::symmetric(2),
            top_n: 500,
        }
    }
}
