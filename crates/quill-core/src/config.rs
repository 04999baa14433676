//! Session configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! cache_slot = "research"
//! cache_dir = ".quill-cache"
//! log_filter = "info,quill_stream=debug"
//!
//! [admission]
//! require_remarks_on_reject = true
//! ```

use crate::error::ConfigError;
use quill_approval::AdmissionPolicy;
use quill_state::{validate_slot, StoreConfig, DEFAULT_SLOT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Durable cache slot
    pub cache_slot: String,
    /// Directory for the file cache (in-memory cache when absent)
    pub cache_dir: Option<PathBuf>,
    /// Checks applied before an approval decision is sent
    pub admission: AdmissionPolicy,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache_slot: DEFAULT_SLOT.to_string(),
            cache_dir: None,
            admission: AdmissionPolicy::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl SessionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With cache slot
    #[inline]
    #[must_use]
    pub fn with_cache_slot(mut self, slot: impl Into<String>) -> Self {
        self.cache_slot = slot.into();
        self
    }

    /// With file cache directory
    #[inline]
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// With admission policy
    #[inline]
    #[must_use]
    pub fn with_admission(mut self, admission: AdmissionPolicy) -> Self {
        self.admission = admission;
        self
    }

    /// With log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns error if the text does not parse or fails validation
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or validated
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check field values
    ///
    /// # Errors
    /// Returns error for a cache slot no durable cache can store
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slot(&self.cache_slot).map_err(|_| ConfigError::Invalid {
            field: "cache_slot",
            reason: format!(
                "'{}' must be non-empty and use only ASCII letters, digits, '-' or '_'",
                self.cache_slot
            ),
        })
    }

    /// Store configuration derived from this config
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new().with_slot(self.cache_slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
    }

    #[test]
    fn toml_overrides() {
        let config = SessionConfig::from_toml_str(
            r#"
            cache_slot = "run-7"
            cache_dir = "/var/cache/quill"
            log_filter = "debug"

            [admission]
            require_remarks_on_reject = true
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            SessionConfig::new()
                .with_cache_slot("run-7")
                .with_cache_dir("/var/cache/quill")
                .with_log_filter("debug")
                .with_admission(AdmissionPolicy::new().with_remarks_on_reject(true))
        );
        assert_eq!(config.store_config().slot, "run-7");
    }

    #[test]
    fn unknown_field_rejected() {
        assert!(matches!(
            SessionConfig::from_toml_str("cache_slots = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn path_like_slot_rejected() {
        for slot in ["", "  ", "../x", "a.b", "my notes"] {
            let text = format!("cache_slot = \"{slot}\"");
            assert!(matches!(
                SessionConfig::from_toml_str(&text),
                Err(ConfigError::Invalid { field: "cache_slot", .. })
            ));
        }
    }

    #[test]
    fn slot_with_space_rejected_before_open() {
        let err = SessionConfig::new().with_cache_slot("my notes").validate().unwrap_err();
        assert!(err.to_string().contains("my notes"));
        assert!(SessionConfig::new().with_cache_slot("my_notes").validate().is_ok());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(&path, "cache_slot = \"saved\"\n").unwrap();

        assert_eq!(SessionConfig::from_file(&path).unwrap().cache_slot, "saved");
        assert!(matches!(
            SessionConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
