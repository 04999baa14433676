//! Research session
//!
//! Composition root owning the store, the section assembler and the approval
//! gate. Events are handled one at a time; there is no shared state and no
//! locking.

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::view::{compose, DocumentView};
use quill_approval::{ApprovalGate, Interrupt, ResumePayload};
use quill_model::{DocumentSection, ProposalGroupKind, ResearchState};
use quill_state::{
    DurableCache, Publications, Reconciliation, StatePatch, StateStore, WriteOutcome,
};
use quill_stream::{PartialSection, SectionAssembler};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Inbound session event
#[derive(Debug)]
pub enum SessionEvent {
    /// Remote agent pushed its state bag
    RemoteState(Map<String, Value>),
    /// Remote agent suspended for approval
    Interrupt(Interrupt),
    /// User edited a settled section
    EditSection(DocumentSection),
    /// User wrote a partial aggregate
    Write(StatePatch),
    /// User removed a source
    RemoveSource(String),
    /// User started a new chat message
    ClearLogs,
    /// User selected a section (or cleared the selection)
    Select(Option<String>),
    /// Reviewer toggled a proposed section
    ToggleSection {
        /// Section key
        key: String,
        /// Selected state
        approved: bool,
    },
    /// Reviewer toggled an item of any group
    ToggleItem {
        /// Group
        group: ProposalGroupKind,
        /// Item key
        key: String,
        /// Selected state
        approved: bool,
    },
    /// Reviewer typed remarks
    SetRemarks(String),
    /// Reviewer resolved the round
    Submit(bool),
}

impl SessionEvent {
    /// Short event name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemoteState(_) => "remote_state",
            Self::Interrupt(_) => "interrupt",
            Self::EditSection(_) => "edit_section",
            Self::Write(_) => "write",
            Self::RemoveSource(_) => "remove_source",
            Self::ClearLogs => "clear_logs",
            Self::Select(_) => "select",
            Self::ToggleSection { .. } => "toggle_section",
            Self::ToggleItem { .. } => "toggle_item",
            Self::SetRemarks(_) => "set_remarks",
            Self::Submit(_) => "submit",
        }
    }
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Remote state reconciled
    Reconciled(Reconciliation),
    /// Local write processed
    Written(WriteOutcome),
    /// Approval round opened
    Raised,
    /// Draft proposal edited
    Reviewed,
    /// Selection changed
    Selected,
    /// Approval round resolved
    Resumed(ResumePayload),
}

/// Research session
#[derive(Debug)]
pub struct ResearchSession {
    config: SessionConfig,
    store: StateStore,
    assembler: SectionAssembler,
    gate: ApprovalGate,
    selected: Option<String>,
}

impl ResearchSession {
    /// Open the session and bootstrap the store from the durable cache
    ///
    /// # Errors
    /// Returns error if the configuration is invalid
    pub async fn open(
        config: SessionConfig,
        cache: Arc<dyn DurableCache>,
    ) -> SessionResult<(Self, Publications)> {
        config.validate()?;

        let (mut store, publications) = StateStore::open(cache, config.store_config()).await;
        let outcome = store.bootstrap();
        tracing::info!(slot = %config.cache_slot, ?outcome, "research session opened");

        let session = Self {
            gate: ApprovalGate::with_policy(config.admission),
            config,
            store,
            assembler: SectionAssembler::new(),
            selected: None,
        };
        Ok((session, publications))
    }

    /// Handle one event
    ///
    /// # Errors
    /// Returns error if a local write or approval command is refused; the
    /// session is left as it was
    pub fn handle(&mut self, event: SessionEvent) -> SessionResult<SessionOutcome> {
        match event {
            SessionEvent::RemoteState(bag) => Ok(SessionOutcome::Reconciled(self.apply_remote(&bag))),
            SessionEvent::Interrupt(interrupt) => {
                self.gate
                    .raise(interrupt, self.store.state().proposal.as_ref())?;
                Ok(SessionOutcome::Raised)
            }
            SessionEvent::EditSection(section) => {
                Ok(SessionOutcome::Written(self.store.edit_section(section)?))
            }
            SessionEvent::Write(patch) => Ok(SessionOutcome::Written(self.store.write(patch)?)),
            SessionEvent::RemoveSource(id) => {
                Ok(SessionOutcome::Written(self.store.remove_source(&id)?))
            }
            SessionEvent::ClearLogs => Ok(SessionOutcome::Written(self.store.clear_logs()?)),
            SessionEvent::Select(id) => {
                self.select(id)?;
                Ok(SessionOutcome::Selected)
            }
            SessionEvent::ToggleSection { key, approved } => {
                self.gate.toggle_section(&key, approved)?;
                Ok(SessionOutcome::Reviewed)
            }
            SessionEvent::ToggleItem {
                group,
                key,
                approved,
            } => {
                self.gate.toggle_item(group, &key, approved)?;
                Ok(SessionOutcome::Reviewed)
            }
            SessionEvent::SetRemarks(remarks) => {
                self.gate.set_remarks(remarks)?;
                Ok(SessionOutcome::Reviewed)
            }
            SessionEvent::Submit(decision) => Ok(SessionOutcome::Resumed(self.gate.submit(decision)?)),
        }
    }

    /// Handle events until the channel closes
    ///
    /// Failed commands are logged and the loop continues. Queued cache
    /// writes are flushed before the session is handed back.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> Self {
        let mut handled = 0_u64;
        while let Some(event) = events.recv().await {
            let name = event.name();
            match self.handle(event) {
                Ok(outcome) => tracing::debug!(event = name, ?outcome, "event handled"),
                Err(e) => tracing::warn!(
                    event = name,
                    error = %e,
                    noop = e.is_noop(),
                    "event refused"
                ),
            }
            handled += 1;
        }

        self.store.flush().await;
        tracing::info!(handled, revision = self.store.revision(), "event channel closed");
        self
    }

    /// Compose the document view
    #[must_use]
    pub fn view(&self) -> DocumentView {
        compose(
            self.store.state(),
            self.assembler.current(),
            self.selected.as_deref(),
        )
    }

    /// Wait until queued cache writes have been applied
    pub async fn flush(&self) {
        self.store.flush().await;
    }

    /// Canonical state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ResearchState {
        self.store.state()
    }

    /// State store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Approval gate
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &ApprovalGate {
        &self.gate
    }

    /// Section being streamed
    #[inline]
    #[must_use]
    pub fn streaming(&self) -> Option<&PartialSection> {
        self.assembler.current()
    }

    /// Selected section id
    #[inline]
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn apply_remote(&mut self, bag: &Map<String, Value>) -> Reconciliation {
        if let Some(step) = self.assembler.ingest(bag) {
            tracing::trace!(?step, "streaming section updated");
        }

        let outcome = self.store.apply_remote(ResearchState::from_bag(bag));
        if self.store.state().proposal.is_none() && self.gate.reset() {
            tracing::debug!("remote cleared proposal, approval gate idle");
        }
        outcome
    }

    fn select(&mut self, id: Option<String>) -> SessionResult<()> {
        if let Some(id) = id.as_deref() {
            if self.store.state().section(id).is_none() {
                return Err(SessionError::UnknownSection(id.to_string()));
            }
        }
        self.selected = id;
        Ok(())
    }
}
