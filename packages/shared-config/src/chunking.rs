//! Reference chunking configuration types

use crate::{parse_env, ConfigError, ConfigResult};

/// Sliding-window parameters for slicing reference tracks
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Window duration in seconds
    pub chunk_length_secs: f64,

    /// Overlap between consecutive windows in seconds
    pub overlap_secs: f64,

    /// Windows with fewer onsets than this are discarded as noise
    pub min_notes_per_chunk: usize,
}

impl ChunkingConfig {
    /// Load chunking configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            chunk_length_secs: parse_env("CHUNK_LENGTH_SECS", 20.0)?,
            overlap_secs: parse_env("CHUNK_OVERLAP_SECS", 18.5)?,
            min_notes_per_chunk: parse_env("MIN_NOTES_PER_CHUNK", 20)?,
        })
    }

    /// Distance between consecutive window starts
    pub fn hop_secs(&self) -> f64 {
        self.chunk_length_secs - self.overlap_secs
    }

    /// Reject window parameters that leave the window count undefined
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.chunk_length_secs.is_finite() || self.chunk_length_secs <= 0.0 {
            return Err(ConfigError::invalid(
                "chunking",
                format!(
                    "chunk length must be positive, got {}",
                    self.chunk_length_secs
                ),
            ));
        }
        if !self.overlap_secs.is_finite() || self.overlap_secs < 0.0 {
            return Err(ConfigError::invalid(
                "chunking",
                format!(
                    "chunk overlap must be non-negative, got {}",
                    self.overlap_secs
                ),
            ));
        }
        if self.overlap_secs >= self.chunk_length_secs {
            return Err(ConfigError::invalid(
                "chunking",
                format!(
                    "chunk overlap {} must be shorter than chunk length {}",
                    self.overlap_secs, self.chunk_length_secs
                ),
            ));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_length_secs: 20.0,
            overlap_secs: 18.5,
            min_notes_per_chunk: 20,
        }
    }
}
