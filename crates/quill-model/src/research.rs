//! Research state aggregate
//!
//! Provides [`ResearchState`], the aggregate root the canonical store owns, and
//! the decoding of a flat remote key/value bag into it.

use crate::proposal::Proposal;
use crate::section::DocumentSection;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A research source gathered by the remote agent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    /// Page title
    pub title: String,
    /// Page URL
    pub url: String,
    /// Extracted content
    pub content: String,
    /// Publication date as reported by the search backend
    pub published_date: String,
    /// Relevance score
    pub score: f64,
}

/// One progress line emitted by the remote agent
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    /// Human-readable progress message
    pub message: String,
    /// Whether the step has finished
    pub done: bool,
}

impl LogEntry {
    /// Create a pending log entry
    #[inline]
    #[must_use]
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            done: false,
        }
    }

    /// Create a finished log entry
    #[inline]
    #[must_use]
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            done: true,
        }
    }
}

/// Aggregate research state
///
/// Every field defaults when absent, so [`ResearchState::default`] is the
/// explicit empty aggregate: empty strings, empty collections, no proposal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchState {
    /// Document title
    pub title: String,

    /// Outline produced by the agent (free-form)
    pub outline: Map<String, Value>,

    /// Introduction text
    pub intro: String,

    /// Pending or last structure proposal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal: Option<Proposal>,

    /// Settled sections (unique by id)
    pub sections: Vec<DocumentSection>,

    /// Conclusion text
    pub conclusion: String,

    /// Document-level footnotes
    pub footnotes: String,

    /// Sources keyed by source id
    pub sources: IndexMap<String, Source>,

    /// Source ids cited per section
    pub cited_sources: IndexMap<String, Vec<String>>,

    /// Name of the tool the agent is running
    pub tool: String,

    /// Opaque chat message records
    pub messages: Vec<Value>,

    /// Agent progress log
    pub logs: Vec<LogEntry>,
}

impl ResearchState {
    /// Create empty aggregate
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether this is the empty aggregate
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build the aggregate from a remote key/value bag
    ///
    /// Keys the aggregate does not model (streaming keys included) are
    /// ignored. Blank values (`null`, `""`, `{}`) fall back to the field
    /// default; a value with the wrong shape is dropped with a warning.
    #[must_use]
    pub fn from_bag(bag: &Map<String, Value>) -> Self {
        let mut state = Self::default();

        for (key, value) in bag {
            let result = match key.as_str() {
                "title" => assign(&mut state.title, value),
                "outline" => assign(&mut state.outline, value),
                "intro" => assign(&mut state.intro, value),
                "proposal" => assign(&mut state.proposal, value),
                "sections" => assign(&mut state.sections, value),
                "conclusion" => assign(&mut state.conclusion, value),
                "footnotes" => assign(&mut state.footnotes, value),
                "sources" => assign(&mut state.sources, value),
                "cited_sources" => assign(&mut state.cited_sources, value),
                "tool" => assign(&mut state.tool, value),
                "messages" => assign(&mut state.messages, value),
                "logs" => assign(&mut state.logs, value),
                _ => continue,
            };

            if let Err(e) = result {
                tracing::warn!(field = %key, error = %e, "dropping malformed state field");
            }
        }

        if state.has_duplicate_section_ids() {
            tracing::warn!(
                sections = state.sections.len(),
                "remote state carries duplicate section ids"
            );
        }

        state
    }

    /// Serialize into a key/value bag
    #[must_use]
    pub fn to_bag(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Sections sorted by display position
    ///
    /// Stable: sections sharing an `idx` keep their arrival order.
    #[must_use]
    pub fn ordered_sections(&self) -> Vec<&DocumentSection> {
        let mut sections: Vec<_> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.idx);
        sections
    }

    /// Find section by id
    #[inline]
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&DocumentSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// First section id that appears more than once
    #[must_use]
    pub fn duplicate_section_id(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.sections.len());
        self.sections
            .iter()
            .map(|s| s.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    /// Check whether two sections share an id
    #[inline]
    #[must_use]
    pub fn has_duplicate_section_ids(&self) -> bool {
        self.duplicate_section_id().is_some()
    }

    /// Approved proposal sections as `key → (title, description)`
    ///
    /// Empty when there is no proposal.
    #[must_use]
    pub fn approved_outline(&self) -> IndexMap<String, (String, String)> {
        self.proposal
            .as_ref()
            .map(|p| {
                p.sections
                    .items
                    .iter()
                    .filter(|(_, item)| item.approved)
                    .map(|(key, item)| {
                        (key.clone(), (item.title.clone(), item.description.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Index of the first unfinished log entry
    #[must_use]
    pub fn active_log(&self) -> Option<usize> {
        self.logs.iter().position(|log| !log.done)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn assign<T: DeserializeOwned + Default>(
    slot: &mut T,
    value: &Value,
) -> Result<(), serde_json::Error> {
    *slot = if is_blank(value) {
        T::default()
    } else {
        T::deserialize(value)?
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn bag(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn default_is_empty() {
        assert!(ResearchState::new().is_empty());
        let state = ResearchState {
            title: "X".to_string(),
            ..ResearchState::default()
        };
        assert!(!state.is_empty());
    }

    #[test]
    fn from_bag_ignores_foreign_keys() {
        let state = ResearchState::from_bag(&bag(json!({
            "title": "Y",
            "section_stream.content.0.s1.Intro": "Hel",
            "copilotkit": {"actions": []}
        })));
        assert_eq!(state.title, "Y");
        assert!(state.sections.is_empty());
    }

    #[test]
    fn from_bag_blank_values_default() {
        let state = ResearchState::from_bag(&bag(json!({
            "outline": "",
            "proposal": {},
            "footnotes": null,
            "cited_sources": null
        })));
        assert!(state.is_empty());
    }

    #[test]
    fn from_bag_drops_malformed_field() {
        let state = ResearchState::from_bag(&bag(json!({
            "title": "kept",
            "sections": "not a list",
            "logs": [{"message": "Searching", "done": false}]
        })));
        assert_eq!(state.title, "kept");
        assert!(state.sections.is_empty());
        assert_eq!(state.logs, vec![LogEntry::pending("Searching")]);
    }

    #[test]
    fn bag_roundtrip_keeps_sources() {
        let mut state = ResearchState::new();
        state.sources.insert(
            "https://a.example".to_string(),
            Source {
                title: "A".to_string(),
                url: "https://a.example".to_string(),
                score: 0.5,
                ..Source::default()
            },
        );
        let decoded = ResearchState::from_bag(&state.to_bag());
        assert_eq!(decoded, state);
    }

    #[test]
    fn duplicate_section_ids_detected() {
        let mut state = ResearchState::new();
        state.sections = vec![
            DocumentSection::new("a", 0, "A", ""),
            DocumentSection::new("a", 1, "A again", ""),
        ];
        assert!(state.has_duplicate_section_ids());
        assert_eq!(state.duplicate_section_id(), Some("a"));
    }

    #[test]
    fn ordered_sections_is_stable() {
        let mut state = ResearchState::new();
        state.sections = vec![
            DocumentSection::new("c", 5, "C", ""),
            DocumentSection::new("a", 1, "A", ""),
            DocumentSection::new("b", 1, "B", ""),
        ];
        let ids: Vec<_> = state.ordered_sections().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn active_log_points_at_first_pending() {
        let mut state = ResearchState::new();
        state.logs = vec![
            LogEntry::done("Searching"),
            LogEntry::pending("Writing"),
            LogEntry::pending("Reviewing"),
        ];
        assert_eq!(state.active_log(), Some(1));
    }
}
