//! Structure proposals
//!
//! A [`Proposal`] is the document structure the remote agent asks the user to
//! review before it starts writing. Each group carries its own description
//! next to its items on the wire:
//!
//! ```text
//! { "sections": { "description": "...", "s1": { "title", "description", "approved" } },
//!   "timestamp": "...", "approved": false }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One proposed item (section, key point or document feature)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposalItem {
    /// Item title
    #[serde(default)]
    pub title: String,

    /// Item description
    #[serde(default)]
    pub description: String,

    /// Whether the item goes into the final structure
    #[serde(default)]
    pub approved: bool,
}

impl ProposalItem {
    /// Create item
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, approved: bool) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            approved,
        }
    }
}

/// Group of proposal items, keyed by item name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProposalGroup {
    /// What the items of this group are
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Items in proposal order
    #[serde(flatten)]
    pub items: IndexMap<String, ProposalItem>,
}

impl ProposalGroup {
    /// Build group from items
    #[must_use]
    pub fn from_items<K: Into<String>>(items: impl IntoIterator<Item = (K, ProposalItem)>) -> Self {
        Self {
            description: None,
            items: items.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Get item
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ProposalItem> {
        self.items.get(key)
    }

    /// Get mutable item
    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ProposalItem> {
        self.items.get_mut(key)
    }

    /// Number of approved items
    #[inline]
    #[must_use]
    pub fn approved_count(&self) -> usize {
        self.items.values().filter(|i| i.approved).count()
    }
}

/// Named proposal groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalGroupKind {
    /// Main document sections
    Sections,
    /// Key points to investigate
    KeyPoints,
    /// Structural features (footnotes, citations...)
    DocumentFeatures,
}

impl ProposalGroupKind {
    /// Wire name of the group
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sections => "sections",
            Self::KeyPoints => "key_points",
            Self::DocumentFeatures => "document_features",
        }
    }
}

impl Display for ProposalGroupKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structure proposal for one approval round
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposed sections
    pub sections: ProposalGroup,

    /// Proposed key points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_points: Option<ProposalGroup>,

    /// Proposed document features
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_features: Option<ProposalGroup>,

    /// When the proposal was produced
    #[serde(default)]
    pub timestamp: String,

    /// Overall decision
    #[serde(default)]
    pub approved: bool,

    /// Reviewer remarks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    /// Planner failure reported alongside a fallback proposal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Proposal {
    /// Create proposal with a sections group
    #[inline]
    #[must_use]
    pub fn new(sections: ProposalGroup, timestamp: impl Into<String>) -> Self {
        Self {
            sections,
            timestamp: timestamp.into(),
            ..Self::default()
        }
    }

    /// Get group by kind
    #[must_use]
    pub fn group(&self, kind: ProposalGroupKind) -> Option<&ProposalGroup> {
        match kind {
            ProposalGroupKind::Sections => Some(&self.sections),
            ProposalGroupKind::KeyPoints => self.key_points.as_ref(),
            ProposalGroupKind::DocumentFeatures => self.document_features.as_ref(),
        }
    }

    /// Get mutable group by kind
    pub fn group_mut(&mut self, kind: ProposalGroupKind) -> Option<&mut ProposalGroup> {
        match kind {
            ProposalGroupKind::Sections => Some(&mut self.sections),
            ProposalGroupKind::KeyPoints => self.key_points.as_mut(),
            ProposalGroupKind::DocumentFeatures => self.document_features.as_mut(),
        }
    }

    /// Remarks, treating blank text as absent
    #[inline]
    #[must_use]
    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref().filter(|r| !r.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn group_description_sits_next_to_items() {
        let wire = json!({
            "sections": {
                "description": "Main sections",
                "intro": {"title": "Intro", "description": "Opening", "approved": true},
                "body": {"title": "Body", "description": "Details", "approved": false}
            },
            "timestamp": "t",
            "approved": false
        });
        let proposal: Proposal = serde_json::from_value(wire.clone()).unwrap();

        assert_eq!(proposal.sections.description.as_deref(), Some("Main sections"));
        let keys: Vec<_> = proposal.sections.items.keys().cloned().collect();
        assert_eq!(keys, vec!["intro", "body"]);
        assert_eq!(proposal.sections.approved_count(), 1);

        assert_eq!(serde_json::to_value(&proposal).unwrap(), wire);
    }

    #[test]
    fn optional_groups_omitted() {
        let proposal = Proposal::new(
            ProposalGroup::from_items([("s1", ProposalItem::new("A", "d", false))]),
            "t",
        );
        let value = serde_json::to_value(&proposal).unwrap();
        assert_eq!(
            value,
            json!({
                "sections": {"s1": {"title": "A", "description": "d", "approved": false}},
                "timestamp": "t",
                "approved": false
            })
        );
    }

    #[test]
    fn group_lookup_by_kind() {
        let mut proposal = Proposal::default();
        assert!(proposal.group(ProposalGroupKind::KeyPoints).is_none());
        proposal.key_points = Some(ProposalGroup::default());
        assert!(proposal.group_mut(ProposalGroupKind::KeyPoints).is_some());
        assert_eq!(ProposalGroupKind::DocumentFeatures.to_string(), "document_features");
    }

    #[test]
    fn blank_remarks_are_absent() {
        let mut proposal = Proposal::default();
        proposal.remarks = Some("   ".to_string());
        assert_eq!(proposal.remarks(), None);
        proposal.remarks = Some("too short".to_string());
        assert_eq!(proposal.remarks(), Some("too short"));
    }
}
