//! Document view composer
//!
//! Pure projection of canonical state, the streaming preview and the current
//! selection into what a document pane shows.

use quill_model::{DocumentSection, LogEntry, ResearchState};
use quill_stream::PartialSection;
use serde::Serialize;

/// Hint shown when nothing is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderHint {
    /// No sections yet: start with a research question
    EmptyDocument,
    /// Sections exist but none is selected
    PickSection,
}

/// Section shown in the main pane
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Focus {
    /// Settled section chosen by the user (editable)
    Selected {
        /// Section
        section: DocumentSection,
    },
    /// Section the agent is writing (read-only)
    Streaming {
        /// Partial section
        section: PartialSection,
    },
    /// Nothing to show
    Placeholder {
        /// Hint
        hint: PlaceholderHint,
    },
}

impl Focus {
    /// Check whether the focused section may be edited
    #[inline]
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Selected { .. })
    }

    /// Id of the focused section
    #[must_use]
    pub fn section_id(&self) -> Option<&str> {
        match self {
            Self::Selected { section } => Some(&section.id),
            Self::Streaming { section } => Some(&section.id),
            Self::Placeholder { .. } => None,
        }
    }
}

/// Composed document view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView {
    /// Document title
    pub title: String,
    /// Settled sections in display order
    pub sections: Vec<DocumentSection>,
    /// Main pane content
    pub focus: Focus,
    /// Agent progress log
    pub logs: Vec<LogEntry>,
    /// First unfinished log entry
    pub active_log: Option<usize>,
}

/// Compose the view
///
/// Focus goes to the selected settled section, then the streaming preview,
/// then a placeholder. A selection naming no settled section is ignored.
#[must_use]
pub fn compose(
    state: &ResearchState,
    streaming: Option<&PartialSection>,
    selected: Option<&str>,
) -> DocumentView {
    let sections: Vec<DocumentSection> = state.ordered_sections().into_iter().cloned().collect();

    let focus = match (selected.and_then(|id| state.section(id)), streaming) {
        (Some(section), _) => Focus::Selected {
            section: section.clone(),
        },
        (None, Some(partial)) => Focus::Streaming {
            section: partial.clone(),
        },
        (None, None) => Focus::Placeholder {
            hint: if sections.is_empty() {
                PlaceholderHint::EmptyDocument
            } else {
                PlaceholderHint::PickSection
            },
        },
    };

    DocumentView {
        title: state.title.clone(),
        sections,
        focus,
        logs: state.logs.clone(),
        active_log: state.active_log(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state() -> ResearchState {
        ResearchState {
            title: "Doc".to_string(),
            sections: vec![
                DocumentSection::new("b", 2, "B", "beta"),
                DocumentSection::new("a", 1, "A", "alpha"),
            ],
            logs: vec![LogEntry::done("Searching"), LogEntry::pending("Writing")],
            ..ResearchState::default()
        }
    }

    fn partial() -> PartialSection {
        PartialSection {
            idx: 3,
            id: "c".to_string(),
            title: "C".to_string(),
            content: Some("gam".to_string()),
            footer: None,
        }
    }

    #[test]
    fn sections_in_display_order() {
        let view = compose(&state(), None, None);
        let ids: Vec<_> = view.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(view.active_log, Some(1));
    }

    #[test]
    fn selection_beats_streaming() {
        let streaming = partial();
        let view = compose(&state(), Some(&streaming), Some("b"));
        assert_eq!(view.focus.section_id(), Some("b"));
        assert!(view.focus.is_editable());
    }

    #[test]
    fn streaming_shown_read_only() {
        let streaming = partial();
        let view = compose(&state(), Some(&streaming), None);
        assert_eq!(view.focus, Focus::Streaming { section: streaming });
        assert!(!view.focus.is_editable());
    }

    #[test]
    fn stale_selection_falls_through() {
        let view = compose(&state(), None, Some("gone"));
        assert_eq!(
            view.focus,
            Focus::Placeholder {
                hint: PlaceholderHint::PickSection
            }
        );
    }

    #[test]
    fn empty_document_hint() {
        let view = compose(&ResearchState::default(), None, None);
        assert_eq!(
            view.focus,
            Focus::Placeholder {
                hint: PlaceholderHint::EmptyDocument
            }
        );
        assert_eq!(view.active_log, None);
    }

    #[test]
    fn focus_serializes_tagged() {
        let view = compose(&ResearchState::default(), None, None);
        let wire = serde_json::to_value(&view.focus).unwrap();
        assert_eq!(wire, serde_json::json!({"kind": "placeholder", "hint": "empty_document"}));
    }
}
