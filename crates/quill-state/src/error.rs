//! Error types for the state store
//!
//! Provides error handling for:
//! - Durable cache reads and writes
//! - Local writes that would break section identity

use std::path::PathBuf;

/// Errors during durable cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Slot name cannot be mapped to storage
    #[error("invalid cache slot: '{0}'")]
    InvalidSlot(String),

    /// IO error on the storage medium
    #[error("io error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stored value is not valid JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors during local writes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Write would leave two sections with the same id
    #[error("duplicate section id: '{id}'")]
    DuplicateSectionId {
        /// Offending id
        id: String,
    },
}

/// Result type alias for store writes
pub type StoreResult<T> = Result<T, StoreError>;
