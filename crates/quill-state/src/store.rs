//! Canonical state store
//!
//! Single writer of [`ResearchState`]. Every change is tagged with its
//! [`Provenance`]; remote updates always win over the durable cache except
//! when the remote side has nothing, in which case the cache is adopted and
//! published back.

use crate::cache::DurableCache;
use crate::error::{StoreError, StoreResult};
use crate::patch::StatePatch;
use crate::writer::CacheWriter;
use quill_model::{DocumentSection, ResearchState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default durable cache slot
pub const DEFAULT_SLOT: &str = "research";

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Durable cache slot name
    pub slot: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            slot: DEFAULT_SLOT.to_string(),
        }
    }
}

impl StoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set slot name
    #[must_use]
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }
}

/// Where a state change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Remote agent push
    Remote,
    /// Local user edit
    Local,
    /// Durable cache adopted at bootstrap
    Cache,
}

/// State sent to the remote side
#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    /// Store revision after the change
    ///
    /// Adopting an unchanged cache again (an empty remote push after the
    /// cache was already adopted) republishes under the same revision.
    pub revision: u64,
    /// Origin of the change
    pub provenance: Provenance,
    /// Full state
    pub state: ResearchState,
}

/// Outbound publication stream
pub type Publications = mpsc::UnboundedReceiver<Publication>;

/// Outcome of reconciling a remote update with the durable cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Remote empty, cache adopted and published
    AdoptedCache,
    /// Cache empty, remote persisted
    PersistedRemote,
    /// Both present and different, cache overwritten with remote
    OverwroteCache,
    /// Nothing to reconcile
    Unchanged,
}

/// Outcome of a local write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// State changed
    Applied {
        /// New revision
        revision: u64,
    },
    /// Payload identical to current state
    Unchanged,
    /// Edited section id does not exist
    NoSuchSection,
}

impl WriteOutcome {
    /// Check whether the write changed state
    #[inline]
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Canonical research state store
#[derive(Debug)]
pub struct StateStore {
    state: ResearchState,
    mirror: ResearchState,
    revision: u64,
    provenance: Option<Provenance>,
    writer: CacheWriter,
    outbound: mpsc::UnboundedSender<Publication>,
    config: StoreConfig,
}

impl StateStore {
    /// Open the store, reading the durable slot once
    ///
    /// An unreadable or undecodable slot is logged and treated as empty.
    pub async fn open(cache: Arc<dyn DurableCache>, config: StoreConfig) -> (Self, Publications) {
        let mirror = read_slot(cache.as_ref(), &config.slot).await;
        let writer = CacheWriter::spawn(cache, config.slot.as_str());
        let (outbound, publications) = mpsc::unbounded_channel();

        tracing::info!(
            slot = %config.slot,
            cached = !mirror.is_empty(),
            "state store opened"
        );

        let store = Self {
            state: ResearchState::default(),
            mirror,
            revision: 0,
            provenance: None,
            writer,
            outbound,
            config,
        };
        (store, publications)
    }

    /// Reconcile against an empty remote (startup)
    pub fn bootstrap(&mut self) -> Reconciliation {
        self.apply_remote(ResearchState::default())
    }

    /// Reconcile a remote update with the durable cache
    pub fn apply_remote(&mut self, remote: ResearchState) -> Reconciliation {
        let remote_empty = remote.is_empty();
        let outcome = match (remote_empty, self.mirror.is_empty()) {
            (true, false) => Reconciliation::AdoptedCache,
            (false, true) => Reconciliation::PersistedRemote,
            (false, false) if remote != self.mirror => Reconciliation::OverwroteCache,
            _ => Reconciliation::Unchanged,
        };

        let next = match outcome {
            Reconciliation::AdoptedCache => {
                self.provenance = Some(Provenance::Cache);
                self.mirror.clone()
            }
            _ => {
                // A non-empty remote always owns the resulting state
                if !remote_empty {
                    self.provenance = Some(Provenance::Remote);
                }
                remote
            }
        };
        if next != self.state {
            self.state = next;
            self.revision += 1;
        }

        match outcome {
            Reconciliation::AdoptedCache => {
                tracing::info!(revision = self.revision, "adopting cached state");
                self.publish(Provenance::Cache);
            }
            Reconciliation::PersistedRemote | Reconciliation::OverwroteCache => {
                tracing::debug!(revision = self.revision, ?outcome, "persisting remote state");
                self.persist();
            }
            Reconciliation::Unchanged => {}
        }
        outcome
    }

    /// Apply a partial aggregate
    ///
    /// # Errors
    /// Returns error if the result would contain duplicate section ids
    pub fn write(&mut self, patch: StatePatch) -> StoreResult<WriteOutcome> {
        let mut next = self.state.clone();
        patch.apply_to(&mut next);
        self.commit(next)
    }

    /// Apply a pure transform of the current state
    ///
    /// # Errors
    /// Returns error if the result would contain duplicate section ids
    pub fn update<F>(&mut self, transform: F) -> StoreResult<WriteOutcome>
    where
        F: FnOnce(&ResearchState) -> ResearchState,
    {
        let next = transform(&self.state);
        self.commit(next)
    }

    /// Replace the state wholesale
    ///
    /// # Errors
    /// Returns error if `next` contains duplicate section ids
    pub fn replace(&mut self, next: ResearchState) -> StoreResult<WriteOutcome> {
        self.commit(next)
    }

    /// Replace the section with the same id
    ///
    /// Never creates a section: an unknown id is a no-op.
    ///
    /// # Errors
    /// Returns error if the result would contain duplicate section ids
    pub fn edit_section(&mut self, section: DocumentSection) -> StoreResult<WriteOutcome> {
        let Some(position) = self.state.sections.iter().position(|s| s.id == section.id) else {
            tracing::debug!(id = %section.id, "edit of unknown section ignored");
            return Ok(WriteOutcome::NoSuchSection);
        };

        self.update(|state| {
            let mut next = state.clone();
            next.sections[position] = section;
            next
        })
    }

    /// Remove a source (no-op when absent)
    ///
    /// # Errors
    /// Returns error if the current state already holds duplicate section ids
    pub fn remove_source(&mut self, id: &str) -> StoreResult<WriteOutcome> {
        if !self.state.sources.contains_key(id) {
            return Ok(WriteOutcome::Unchanged);
        }
        self.update(|state| {
            let mut next = state.clone();
            next.sources.shift_remove(id);
            next
        })
    }

    /// Clear the progress log
    ///
    /// # Errors
    /// Returns error if the current state already holds duplicate section ids
    pub fn clear_logs(&mut self) -> StoreResult<WriteOutcome> {
        self.write(StatePatch::new().with_logs(Vec::new()))
    }

    /// Wait until queued cache writes have been applied
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ResearchState {
        &self.state
    }

    /// Owned copy of the current state
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> ResearchState {
        self.state.clone()
    }

    /// What the durable cache holds (as last read or written)
    #[inline]
    #[must_use]
    pub fn mirror(&self) -> &ResearchState {
        &self.mirror
    }

    /// Current revision
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Origin of the current state (`None` until anything is applied)
    #[inline]
    #[must_use]
    pub fn provenance(&self) -> Option<Provenance> {
        self.provenance
    }

    /// Store configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn commit(&mut self, next: ResearchState) -> StoreResult<WriteOutcome> {
        if next == self.state {
            return Ok(WriteOutcome::Unchanged);
        }
        if let Some(id) = next.duplicate_section_id() {
            return Err(StoreError::DuplicateSectionId { id: id.to_string() });
        }

        self.state = next;
        self.revision += 1;
        self.provenance = Some(Provenance::Local);
        self.publish(Provenance::Local);
        self.persist();
        Ok(WriteOutcome::Applied {
            revision: self.revision,
        })
    }

    fn publish(&self, provenance: Provenance) {
        let publication = Publication {
            revision: self.revision,
            provenance,
            state: self.state.clone(),
        };
        if self.outbound.send(publication).is_err() {
            tracing::debug!(revision = self.revision, "no publication receiver");
        }
    }

    fn persist(&mut self) {
        self.mirror = self.state.clone();
        match serde_json::to_value(&self.state) {
            Ok(value) => self.writer.persist(value),
            Err(e) => tracing::warn!(error = %e, "state not serializable, cache write skipped"),
        }
    }
}

async fn read_slot(cache: &dyn DurableCache, slot: &str) -> ResearchState {
    match cache.load(slot).await {
        Ok(Some(Value::Object(bag))) => ResearchState::from_bag(&bag),
        Ok(Some(Value::Null) | None) => ResearchState::default(),
        Ok(Some(other)) => {
            tracing::warn!(slot, kind = %value_kind(&other), "cached state is not an object");
            ResearchState::default()
        }
        Err(e) => {
            tracing::warn!(slot, error = %e, "cached state unreadable");
            ResearchState::default()
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
