//! Testing utilities for the Quill workspace
//!
//! Shared fixtures for remote bags, proposals and sessions.

#![allow(missing_docs)]

use quill_core::{ResearchSession, SessionConfig};
use quill_model::{DocumentSection, Proposal, ProposalGroup, ProposalItem, ResearchState};
use quill_state::{MemoryCache, Publications, DEFAULT_SLOT};
use quill_stream::{StreamField, StreamKey};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Builder for remote key/value bags
#[derive(Debug, Clone, Default)]
pub struct RemoteBag {
    entries: Map<String, Value>,
}

impl RemoteBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a full state
    pub fn from_state(state: &ResearchState) -> Self {
        Self {
            entries: state.to_bag(),
        }
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.entries.insert(key.to_string(), value);
        self
    }

    pub fn content(self, idx: u32, id: &str, title: &str, text: &str) -> Self {
        self.stream(StreamField::Content, idx, id, title, Value::from(text))
    }

    pub fn footer(self, idx: u32, id: &str, title: &str, text: &str) -> Self {
        self.stream(StreamField::Footer, idx, id, title, Value::from(text))
    }

    /// Null both stream keys of a section
    pub fn settle(self, idx: u32, id: &str, title: &str) -> Self {
        self.stream(StreamField::Content, idx, id, title, Value::Null)
            .stream(StreamField::Footer, idx, id, title, Value::Null)
    }

    fn stream(mut self, field: StreamField, idx: u32, id: &str, title: &str, value: Value) -> Self {
        let key = StreamKey::new(field, idx, id, title);
        self.entries.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Map<String, Value> {
        self.entries
    }
}

pub fn sample_sections() -> Vec<DocumentSection> {
    vec![
        DocumentSection::new("s1", 0, "Intro", "Hello"),
        DocumentSection::new("s2", 1, "Background", "Prior work").with_footer("[1] survey"),
        DocumentSection::new("s3", 2, "Findings", "Results"),
    ]
}

pub fn sample_proposal() -> Proposal {
    let mut proposal = Proposal::new(
        ProposalGroup::from_items([
            ("s1", ProposalItem::new("Intro", "Opening", false)),
            ("s2", ProposalItem::new("Background", "Context", true)),
        ]),
        "t",
    );
    proposal.key_points = Some(ProposalGroup::from_items([(
        "kp1",
        ProposalItem::new("Pricing", "How cost scales", true),
    )]));
    proposal
}

pub fn sample_state(title: &str) -> ResearchState {
    ResearchState {
        title: title.to_string(),
        sections: sample_sections(),
        ..ResearchState::default()
    }
}

/// In-memory cache seeded with a state in the default slot
pub async fn seeded_cache(state: &ResearchState) -> Arc<MemoryCache> {
    let value = serde_json::to_value(state).unwrap();
    Arc::new(MemoryCache::seeded(DEFAULT_SLOT, value).await)
}

pub async fn setup_session(cache: Arc<MemoryCache>) -> (ResearchSession, Publications) {
    ResearchSession::open(SessionConfig::new(), cache).await.unwrap()
}
