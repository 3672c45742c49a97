//! Configuration errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// An environment variable is set but does not parse
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    /// A section holds values the matcher cannot run with
    #[error("invalid {section} configuration: {reason}")]
    Invalid {
        section: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(section: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            section,
            reason: reason.into(),
        }
    }

    /// Section that failed validation, if any
    pub fn section(&self) -> Option<&'static str> {
        match self {
            Self::InvalidValue(..) => None,
            Self::Invalid { section, .. } => Some(section),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
