//! Streaming bag decoder
//!
//! Turns one flat remote state bag into zero or more [`SectionDelta`]s.
//! Pure: invalid entries are skipped, never raised.

use crate::key::{KeyError, StreamField, StreamKey};
use serde_json::{Map, Value};

/// One field-level update for an in-flight section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDelta {
    /// Decoded key
    pub key: StreamKey,

    /// New field value; `None` is the terminator signal
    pub value: Option<String>,
}

impl SectionDelta {
    /// Create delta carrying a value
    #[inline]
    #[must_use]
    pub fn new(key: StreamKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: Some(value.into()),
        }
    }

    /// Create terminator delta
    #[inline]
    #[must_use]
    pub fn terminator(key: StreamKey) -> Self {
        Self { key, value: None }
    }

    /// Field being updated
    #[inline]
    #[must_use]
    pub fn field(&self) -> StreamField {
        self.key.field
    }

    /// Section id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.key.id
    }

    /// Check for terminator
    #[inline]
    #[must_use]
    pub fn is_terminator(&self) -> bool {
        self.value.is_none()
    }
}

/// Result of decoding one bag entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Valid streaming entry
    Delta(SectionDelta),

    /// Streaming entry that cannot be decoded
    Skip(DecodeError),

    /// Entry outside the streaming namespace
    Foreign,
}

/// Reasons a streaming entry is skipped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Key is malformed
    #[error("malformed key: {0}")]
    Key(#[from] KeyError),

    /// Value is neither scalar nor null
    #[error("unsupported value for '{key}': expected scalar or null")]
    UnsupportedValue {
        /// Raw key
        key: String,
    },
}

/// Decode a single bag entry
#[must_use]
pub fn decode_entry(key: &str, value: &Value) -> Decoded {
    if !StreamKey::in_namespace(key) {
        return Decoded::Foreign;
    }

    let parsed = match StreamKey::parse(key) {
        Ok(parsed) => parsed,
        Err(e) => return Decoded::Skip(e.into()),
    };

    let value = match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => {
            return Decoded::Skip(DecodeError::UnsupportedValue {
                key: key.to_string(),
            })
        }
    };

    Decoded::Delta(SectionDelta { key: parsed, value })
}

/// Decode every streaming entry of a bag, in bag order
///
/// Skipped entries are logged and dropped; decoding continues.
#[must_use]
pub fn decode_bag(bag: &Map<String, Value>) -> Vec<SectionDelta> {
    bag.iter()
        .filter_map(|(key, value)| match decode_entry(key, value) {
            Decoded::Delta(delta) => Some(delta),
            Decoded::Skip(reason) => {
                tracing::debug!(key = %key, %reason, "skipping streaming entry");
                None
            }
            Decoded::Foreign => None,
        })
        .collect()
}
