//! Section assembler
//!
//! Folds [`SectionDelta`]s into the single section currently being written.
//!
//! # Invariants
//! - At most one in-flight section at a time
//! - A delta for a different id discards the in-flight section, complete or not
//! - A terminator delta drops the in-flight section
//! - The canonical section collection is never touched

use crate::decode::{decode_bag, SectionDelta};
use crate::key::StreamField;
use quill_model::DocumentSection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Section being streamed, fields filled as they arrive
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartialSection {
    /// Intended display position
    pub idx: u32,
    /// Stable section identity
    pub id: String,
    /// Section title
    pub title: String,
    /// Body streamed so far
    pub content: Option<String>,
    /// Footer streamed so far
    pub footer: Option<String>,
}

impl PartialSection {
    /// Start a section from its first delta
    #[must_use]
    fn start(delta: &SectionDelta) -> Self {
        let mut section = Self {
            idx: delta.key.idx,
            id: delta.key.id.clone(),
            title: delta.key.title.clone(),
            content: None,
            footer: None,
        };
        section.set(delta.key.field, delta.value.clone());
        section
    }

    fn set(&mut self, field: StreamField, value: Option<String>) {
        match field {
            StreamField::Content => self.content = value,
            StreamField::Footer => self.footer = value,
        }
    }

    /// Convert into a document section (missing content reads as empty)
    #[must_use]
    pub fn into_section(self) -> DocumentSection {
        DocumentSection {
            id: self.id,
            idx: self.idx,
            title: self.title,
            content: self.content.unwrap_or_default(),
            footer: self.footer,
        }
    }
}

/// What one delta did to the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyStep {
    /// First section after an empty slot
    Started {
        /// New section id
        id: String,
    },

    /// New id arrived; the previous partial section was discarded
    Switched {
        /// Discarded section id
        abandoned: String,
        /// New section id
        id: String,
    },

    /// Field of the in-flight section overwritten
    Updated {
        /// Field written
        field: StreamField,
    },

    /// Terminator dropped the in-flight section
    Cleared,

    /// Terminator arrived with nothing in flight
    Idle,
}

/// Reducer holding the in-flight section
#[derive(Debug, Clone, Default)]
pub struct SectionAssembler {
    current: Option<PartialSection>,
}

impl SectionAssembler {
    /// Create empty assembler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one delta
    pub fn apply(&mut self, delta: &SectionDelta) -> AssemblyStep {
        if delta.is_terminator() {
            return match self.current.take() {
                Some(_) => AssemblyStep::Cleared,
                None => AssemblyStep::Idle,
            };
        }

        if let Some(current) = self.current.as_mut().filter(|c| c.id == delta.key.id) {
            // Remote sends growing strings; monotonicity is not enforced
            current.set(delta.key.field, delta.value.clone());
            return AssemblyStep::Updated {
                field: delta.key.field,
            };
        }

        let fresh = PartialSection::start(delta);
        let id = fresh.id.clone();
        match self.current.replace(fresh) {
            Some(abandoned) => {
                tracing::debug!(
                    abandoned = %abandoned.id,
                    id = %id,
                    "discarding partial section"
                );
                AssemblyStep::Switched {
                    abandoned: abandoned.id,
                    id,
                }
            }
            None => AssemblyStep::Started { id },
        }
    }

    /// Apply deltas in order, returning the last step
    pub fn apply_all<'a>(
        &mut self,
        deltas: impl IntoIterator<Item = &'a SectionDelta>,
    ) -> Option<AssemblyStep> {
        deltas.into_iter().fold(None, |_, delta| Some(self.apply(delta)))
    }

    /// Decode a remote bag and apply its streaming entries
    pub fn ingest(&mut self, bag: &Map<String, Value>) -> Option<AssemblyStep> {
        let deltas = decode_bag(bag);
        self.apply_all(&deltas)
    }

    /// Section currently being written
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<&PartialSection> {
        self.current.as_ref()
    }

    /// Take the in-flight section, leaving the slot empty
    #[inline]
    pub fn take(&mut self) -> Option<PartialSection> {
        self.current.take()
    }

    /// Drop the in-flight section
    #[inline]
    pub fn reset(&mut self) {
        self.current = None;
    }
}
