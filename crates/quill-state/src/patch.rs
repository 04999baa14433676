//! Partial aggregate for local writes

use indexmap::IndexMap;
use quill_model::{DocumentSection, LogEntry, Proposal, ResearchState, Source};
use serde_json::{Map, Value};

/// Partial [`ResearchState`]: every field optional
///
/// `proposal` is doubly optional so a patch can clear the proposal
/// (`Some(None)`) as well as leave it alone (`None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    /// New title
    pub title: Option<String>,
    /// New outline
    pub outline: Option<Map<String, Value>>,
    /// New introduction
    pub intro: Option<String>,
    /// New proposal (`Some(None)` clears it)
    pub proposal: Option<Option<Proposal>>,
    /// New section list
    pub sections: Option<Vec<DocumentSection>>,
    /// New conclusion
    pub conclusion: Option<String>,
    /// New footnotes
    pub footnotes: Option<String>,
    /// New source map
    pub sources: Option<IndexMap<String, Source>>,
    /// New citation map
    pub cited_sources: Option<IndexMap<String, Vec<String>>>,
    /// New tool name
    pub tool: Option<String>,
    /// New message list
    pub messages: Option<Vec<Value>>,
    /// New progress log
    pub logs: Option<Vec<LogEntry>>,
}

impl StatePatch {
    /// Create empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set proposal (or clear it with `None`)
    #[must_use]
    pub fn with_proposal(mut self, proposal: Option<Proposal>) -> Self {
        self.proposal = Some(proposal);
        self
    }

    /// Set sections
    #[must_use]
    pub fn with_sections(mut self, sections: Vec<DocumentSection>) -> Self {
        self.sections = Some(sections);
        self
    }

    /// Set sources
    #[must_use]
    pub fn with_sources(mut self, sources: IndexMap<String, Source>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Set logs
    #[must_use]
    pub fn with_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Check whether the patch sets nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply onto a state, overwriting every field the patch sets
    pub fn apply_to(self, state: &mut ResearchState) {
        macro_rules! overwrite {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    state.$field = value;
                })*
            };
        }

        overwrite!(
            title,
            outline,
            intro,
            proposal,
            sections,
            conclusion,
            footnotes,
            sources,
            cited_sources,
            tool,
            messages,
            logs,
        );
    }
}
