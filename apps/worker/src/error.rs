//! Error handling for the Cantus matching engine
//!
//! This module provides a unified error type hierarchy using thiserror.
//! Only genuine misuse and infrastructure failures are errors: an empty query
//! is a valid "no notes" result, an all-zero histogram scores 0, and a DTW
//! alignment failure is scored as infinite distance by the reranker.

use cantus_shared_config::ConfigError;
use serde::Serialize;
use thiserror::Error;

/// Main matcher error type
#[derive(Error, Debug)]
pub enum MatchError {
    // ========== Caller Errors ==========
    /// Parameters that leave an operation undefined (rejected before any work)
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Configuration could not be loaded or failed validation
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Scale catalog is malformed
    #[error("invalid scale catalog: {0}")]
    InvalidCatalog(String),

    // ========== Scoring Errors ==========
    /// DTW cannot be computed for this pair (e.g. an empty operand)
    #[error("alignment failed: {0}")]
    AlignmentFailure(String),

    /// Query was abandoned by the caller before ranking completed
    #[error("query cancelled: {0}")]
    Cancelled(String),

    // ========== Corpus Errors ==========
    /// Corpus directory not found or inaccessible
    #[error("corpus path not found: {0}")]
    CorpusNotFound(String),

    /// A MIDI file could not be decoded
    #[error("MIDI parsing failed for '{path}': {reason}")]
    MidiParse { path: String, reason: String },

    /// Raw MIDI decoding error
    #[error("MIDI decoding error: {0}")]
    Midi(#[from] midly::Error),

    /// File system access error
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ========== Internal Errors ==========
    /// Worker pool could not be created
    #[error("worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Internal matcher error (catch-all for unexpected errors)
    #[error("internal matcher error: {0}")]
    Internal(String),
}

impl MatchError {
    /// Whether the error was caused by the caller's input or configuration
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameters(_) | Self::Configuration(_) | Self::InvalidCatalog(_)
        )
    }

    /// Get a severity level for logging
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Misuse that should be fixed by whoever configured the matcher
            Self::InvalidParameters(_)
            | Self::Configuration(_)
            | Self::InvalidCatalog(_)
            | Self::ThreadPool(_) => ErrorSeverity::Critical,

            Self::CorpusNotFound(_) | Self::Filesystem(_) | Self::Internal(_) => {
                ErrorSeverity::Error
            }

            // A single track failing to load never sinks the query
            Self::MidiParse { .. }
            | Self::Midi(_)
            | Self::Serialization(_)
            | Self::Cancelled(_) => ErrorSeverity::Warning,

            Self::AlignmentFailure(_) => ErrorSeverity::Info,
        }
    }

    /// Get the pipeline stage this error is related to, if applicable
    pub fn stage_context(&self) -> Option<&'static str> {
        match self {
            Self::CorpusNotFound(_) | Self::MidiParse { .. } | Self::Midi(_) => Some("corpus"),
            Self::AlignmentFailure(_) => Some("rerank"),
            Self::InvalidCatalog(_) => Some("scale_classifier"),
            Self::Cancelled(_) => Some("query"),
            _ => None,
        }
    }

    /// Log the error with appropriate severity
    pub fn log(&self) {
        let context = self.stage_context().unwrap_or("general");
        match self.severity() {
            ErrorSeverity::Critical => {
                tracing::error!(
                    error = %self,
                    context = context,
                    caller_error = self.is_caller_error(),
                    "Critical matcher error"
                );
            }
            ErrorSeverity::Error => {
                tracing::error!(
                    error = %self,
                    context = context,
                    caller_error = self.is_caller_error(),
                    "Matcher error"
                );
            }
            ErrorSeverity::Warning => {
                tracing::warn!(
                    error = %self,
                    context = context,
                    caller_error = self.is_caller_error(),
                    "Matcher warning"
                );
            }
            ErrorSeverity::Info => {
                tracing::info!(
                    error = %self,
                    context = context,
                    caller_error = self.is_caller_error(),
                    "Matcher info"
                );
            }
        }
    }

    /// Create a MIDI parse error
    pub fn midi_parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MidiParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid parameters error
    pub fn invalid_parameters(reason: impl Into<String>) -> Self {
        Self::InvalidParameters(reason.into())
    }
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorSeverity {
    /// Configuration misuse, rejected synchronously
    Critical,
    /// Standard errors
    Error,
    /// Recoverable per-track or per-query failures
    Warning,
    /// Informational
    Info,
}

/// Result type alias for matcher operations
pub type MatchResult<T> = Result<T, MatchError>;

// ========== Conversion Implementations ==========

impl From<anyhow::Error> for MatchError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<MatchError>() {
            Ok(match_err) => match_err,
            Err(err) => Self::Internal(err.to_string()),
        }
    }
}
