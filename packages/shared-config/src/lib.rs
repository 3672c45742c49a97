//! Shared configuration types for the Cantus melody matcher
//!
//! This crate provides the explicit configuration threaded through every
//! public matching entry point. There is no ambient global state: callers
//! build a [`MatcherConfig`] (from the environment or by hand) and pass it in.

mod chunking;
mod error;
mod prefilter;
mod rerank;
mod resolution;
mod shift;

pub use chunking::ChunkingConfig;
pub use error::{ConfigError, ConfigResult};
pub use prefilter::PrefilterConfig;
pub use rerank::RerankConfig;
pub use resolution::Resolution;
pub use shift::ShiftRange;

use std::env;
use std::path::PathBuf;

/// Complete matcher configuration shared by the library and the worker binary
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    /// Reference chunking parameters
    pub chunking: ChunkingConfig,

    /// Histogram prefilter parameters
    pub prefilter: PrefilterConfig,

    /// DTW reranking parameters
    pub rerank: RerankConfig,

    /// Histogram resolution for the whole session
    pub resolution: Resolution,

    /// Directory holding the reference MIDI corpus
    pub corpus_path: PathBuf,

    /// Log level (from RUST_LOG or LOG_LEVEL)
    pub log_level: String,
}

impl MatcherConfig {
    /// Load matcher configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            chunking: ChunkingConfig::from_env()?,
            prefilter: PrefilterConfig::from_env()?,
            rerank: RerankConfig::from_env()?,
            resolution: parse_env("HISTOGRAM_RESOLUTION", Resolution::Semitone)?,
            corpus_path: PathBuf::from(get_env_or_default("CORPUS_PATH", "./data/midis")),
            log_level: env::var("RUST_LOG")
                .or_else(|_| env::var("LOG_LEVEL"))
                .unwrap_or_else(|_| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    ///
    /// Shift ranges may not span more than one octave of histogram bins.
    pub fn validate(&self) -> ConfigResult<()> {
        self.chunking.validate()?;
        self.prefilter.validate()?;
        self.rerank.validate()?;
        check_shift_span("prefilter", self.prefilter.shift_range, self.resolution)?;
        check_shift_span("rerank", self.rerank.shift_range, self.resolution)?;
        Ok(())
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            prefilter: PrefilterConfig::default(),
            rerank: RerankConfig::default(),
            resolution: Resolution::default(),
            corpus_path: PathBuf::from("./data/midis"),
            log_level: "info".to_string(),
        }
    }
}

fn check_shift_span(
    section: &'static str,
    range: ShiftRange,
    resolution: Resolution,
) -> ConfigResult<()> {
    let bins = resolution.bins_per_octave();
    if range.len() > bins {
        return Err(ConfigError::invalid(
            section,
            format!(
                "shift range {} covers {} shifts, more than the {} bins of a {} octave",
                range,
                range.len(),
                bins,
                resolution
            ),
        ));
    }
    Ok(())
}

/// Helper function to get an optional environment variable with a default
pub fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Helper function to parse an environment variable into a specific type
pub fn parse_env<T>(name: &str, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resolution, Resolution::Semitone);
    }

    #[test]
    fn test_from_env_reads_every_section() {
        temp_env::with_vars(
            [
                ("CHUNK_LENGTH_SECS", Some("20")),
                ("CHUNK_OVERLAP_SECS", Some("18")),
                ("PREFILTER_TOP_N", Some("250")),
                ("FINAL_TOP_N", Some("5")),
                ("HISTOGRAM_RESOLUTION", Some("quarter-tone")),
                ("CORPUS_PATH", Some("/srv/midis")),
            ],
            || {
                let config = MatcherConfig::from_env().unwrap();
                assert_eq!(config.chunking.overlap_secs, 18.0);
                assert_eq!(config.prefilter.top_n, 250);
                assert_eq!(config.rerank.final_top_n, 5);
                assert_eq!(config.resolution, Resolution::QuarterTone);
                assert_eq!(config.corpus_path, PathBuf::from("/srv/midis"));
            },
        );
    }

    #[test]
    fn test_from_env_rejects_invalid_overlap() {
        temp_env::with_vars(
            [
                ("CHUNK_LENGTH_SECS", Some("10")),
                ("CHUNK_OVERLAP_SECS", Some("12")),
            ],
            || {
                assert!(matches!(
                    MatcherConfig::from_env(),
                    Err(ConfigError::Invalid { section: "chunking", .. })
                ));
            },
        );
    }

    #[test]
    fn test_shift_range_wider_than_an_octave_rejected() {
        let mut config = MatcherConfig::default();
        config.prefilter.shift_range = ShiftRange::new(-6, 6).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { section: "prefilter", .. })
        ));

        // a full octave is allowed
        config.prefilter.shift_range = ShiftRange::new(-6, 5).unwrap();
        assert!(config.validate().is_ok());

        config.rerank.shift_range = ShiftRange::symmetric(11);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { section: "rerank", .. })
        ));

        // quarter tones double the octave
        config.resolution = Resolution::QuarterTone;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_rejects_wide_shift_range() {
        temp_env::with_var("RERANK_SHIFT_RANGE", Some("-20..20"), || {
            assert!(matches!(
                MatcherConfig::from_env(),
                Err(ConfigError::Invalid { section: "rerank", .. })
            ));
        });
    }

    #[test]
    fn test_parse_env_invalid_value() {
        temp_env::with_var("PREFILTER_TOP_N", Some("lots"), || {
            let result: ConfigResult<usize> = parse_env("PREFILTER_TOP_N", 500);
            assert!(matches!(result, Err(ConfigError::InvalidValue(_, _))));
        });
    }
}
