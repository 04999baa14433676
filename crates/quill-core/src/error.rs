//! Error types for Quill Core
//!
//! Provides error handling for:
//! - Configuration loading
//! - Local writes refused by the store
//! - Approval commands refused by the gate
//! - Selection of sections that do not exist

use quill_approval::GateError;
use quill_state::StoreError;
use std::path::PathBuf;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for the schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid config value for '{field}': {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// What is wrong
        reason: String,
    },
}

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local write refused
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Approval command refused
    #[error("approval error: {0}")]
    Gate(#[from] GateError),

    /// Selected section does not exist
    #[error("unknown section: '{0}'")]
    UnknownSection(String),
}

impl SessionError {
    /// Check if the error leaves session state untouched
    ///
    /// Only a closed resume channel consumes anything (the approval round).
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !matches!(self, Self::Gate(GateError::ResumeChannelClosed))
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts() {
        let err: SessionError = StoreError::DuplicateSectionId { id: "s1".to_string() }.into();
        assert_eq!(err.to_string(), "store error: duplicate section id: 's1'");
        assert!(err.is_noop());
    }

    #[test]
    fn closed_channel_is_not_noop() {
        let err: SessionError = GateError::ResumeChannelClosed.into();
        assert!(!err.is_noop());
    }
}
