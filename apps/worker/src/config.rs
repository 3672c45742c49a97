//! Worker configuration loaded from environment variables
//!
//! Wraps the shared [`MatcherConfig`] with settings that only the worker
//! binary needs.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cantus_shared_config::{MatcherConfig, Resolution};
use tracing_subscriber::EnvFilter;

use crate::pool::default_threads;

/// Filter used when the configured log level does not parse
const FALLBACK_LOG_FILTER: &str = "cantus_worker=info";

/// Worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Matching parameters shared with library callers
    pub matcher: MatcherConfig,

    /// Threads in the scoring pool
    pub worker_threads: usize,

    /// Optional JSON scale catalog replacing the built-in maqams
    pub scale_catalog_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let matcher = MatcherConfig::from_env().context("Failed to load matcher config")?;

        let worker_threads: usize = match env::var("WORKER_THREADS") {
            Ok(value) => value.parse().context("Invalid WORKER_THREADS value")?,
            Err(_) => default_threads(),
        };
        if worker_threads == 0 {
            anyhow::bail!("WORKER_THREADS must be at least 1");
        }

        Ok(Self {
            matcher,
            worker_threads,
            scale_catalog_path: env::var("SCALE_CATALOG_PATH").ok().map(PathBuf::from),
        })
    }

    /// Get corpus directory
    pub fn corpus_path(&self) -> &PathBuf {
        &self.matcher.corpus_path
    }

    /// Get histogram resolution
    pub fn resolution(&self) -> Resolution {
        self.matcher.resolution
    }

    /// Tracing filter built from the configured log level
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.matcher.log_level)
            .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LOG_FILTER))
    }
}
