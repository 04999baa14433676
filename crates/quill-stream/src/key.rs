//! Streaming keys
//!
//! Provides [`StreamKey`], the typed form of a namespaced streaming key:
//!
//! ```text
//! section_stream.<field>.<idx>.<id>.<title>
//! ```
//!
//! The title travels in every key of a section. Titles may contain the
//! delimiter; everything after the id segment is the title.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Namespace segment of every streaming key
pub const STREAM_NAMESPACE: &str = "section_stream";

/// Segment delimiter
pub const KEY_DELIMITER: char = '.';

/// Minimum number of segments in a streaming key
pub const MIN_SEGMENTS: usize = 5;

/// Section field a streaming key updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamField {
    /// Markdown body
    Content,
    /// References block
    Footer,
}

impl StreamField {
    /// Wire name of the field
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Footer => "footer",
        }
    }
}

impl Display for StreamField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamField {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content" => Ok(Self::Content),
            "footer" => Ok(Self::Footer),
            other => Err(KeyError::UnknownField(other.to_string())),
        }
    }
}

/// Parsed streaming key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamKey {
    /// Field being streamed
    pub field: StreamField,
    /// Intended display position
    pub idx: u32,
    /// Stable section identity
    pub id: String,
    /// Section title
    pub title: String,
}

impl StreamKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(field: StreamField, idx: u32, id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            field,
            idx,
            id: id.into(),
            title: title.into(),
        }
    }

    /// Parse key
    ///
    /// # Errors
    /// Returns error if the key is outside the namespace, has fewer than
    /// [`MIN_SEGMENTS`] segments, names an unknown field, carries a
    /// non-numeric index or an empty id
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        key.parse()
    }

    /// Check whether a raw key belongs to the streaming namespace
    #[inline]
    #[must_use]
    pub fn in_namespace(key: &str) -> bool {
        key.split(KEY_DELIMITER).next() == Some(STREAM_NAMESPACE)
    }
}

impl Display for StreamKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{STREAM_NAMESPACE}.{}.{}.{}.{}",
            self.field, self.idx, self.id, self.title
        )
    }
}

impl FromStr for StreamKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.splitn(MIN_SEGMENTS, KEY_DELIMITER);

        if segments.next() != Some(STREAM_NAMESPACE) {
            return Err(KeyError::NotStreamKey(s.to_string()));
        }

        let rest: Vec<&str> = segments.collect();
        if rest.len() < MIN_SEGMENTS - 1 {
            return Err(KeyError::TooFewSegments {
                found: rest.len() + 1,
            });
        }

        let field = rest[0].parse::<StreamField>()?;
        let idx = rest[1]
            .parse::<u32>()
            .map_err(|_| KeyError::InvalidIndex(rest[1].to_string()))?;
        let id = rest[2];
        if id.is_empty() {
            return Err(KeyError::EmptyId);
        }

        Ok(Self {
            field,
            idx,
            id: id.to_string(),
            title: rest[3].to_string(),
        })
    }
}

/// Streaming key parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Key is outside the streaming namespace
    #[error("not a streaming key: '{0}'")]
    NotStreamKey(String),

    /// Key has too few segments
    #[error("expected at least 5 segments, found {found}")]
    TooFewSegments {
        /// Number of segments present
        found: usize,
    },

    /// Field is not `content` or `footer`
    #[error("unknown stream field: '{0}'")]
    UnknownField(String),

    /// Index is not a non-negative integer
    #[error("invalid section index: '{0}'")]
    InvalidIndex(String),

    /// Id segment is empty
    #[error("empty section id")]
    EmptyId,
}
