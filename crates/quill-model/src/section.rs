//! Document sections
//!
//! Provides [`DocumentSection`], the unit the remote agent writes and the user edits.

use serde::{Deserialize, Serialize};

/// One section of the research document
///
/// Identity is `id`. `idx` is the intended display position and is only a
/// hint: it does not have to be contiguous across a document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentSection {
    /// Stable identity assigned by the remote agent
    pub id: String,

    /// Display position hint
    #[serde(default)]
    pub idx: u32,

    /// Section heading
    #[serde(default)]
    pub title: String,

    /// Markdown body
    #[serde(default)]
    pub content: String,

    /// References block rendered under the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl DocumentSection {
    /// Create section without footer
    #[inline]
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        idx: u32,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            idx,
            title: title.into(),
            content: content.into(),
            footer: None,
        }
    }

    /// Set footer
    #[inline]
    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Footer text, treating an empty footer as absent
    #[inline]
    #[must_use]
    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref().filter(|f| !f.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn section_builder() {
        let section = DocumentSection::new("s1", 0, "Intro", "Hello").with_footer("[1] src");
        assert_eq!(section.id, "s1");
        assert_eq!(section.footer(), Some("[1] src"));
    }

    #[test]
    fn empty_footer_reads_as_absent() {
        let section = DocumentSection::new("s1", 0, "Intro", "Hello").with_footer("");
        assert_eq!(section.footer(), None);
    }

    #[test]
    fn missing_fields_default() {
        let section: DocumentSection = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert_eq!(section.idx, 0);
        assert!(section.title.is_empty());
        assert!(section.footer.is_none());
    }

    #[test]
    fn footer_omitted_when_absent() {
        let value = serde_json::to_value(DocumentSection::new("s1", 2, "T", "C")).unwrap();
        assert_eq!(value, json!({"id": "s1", "idx": 2, "title": "T", "content": "C"}));
    }
}
