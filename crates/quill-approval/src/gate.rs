//! Approval gate
//!
//! Holds a draft copy of the proposal under review and the one-shot resume
//! handle of the interrupt that raised it. Edits touch only the draft; the
//! canonical proposal in the store is never modified from here.

use crate::error::{AdmissionError, GateError, GateResult};
use crate::phase::{validate_transition, ApprovalPhase};
use quill_model::{Proposal, ProposalGroupKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

/// Answer sent back to the remote agent
///
/// The body is the JSON text of the reviewed proposal with its overall
/// `approved` flag set to the decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumePayload {
    body: String,
}

impl ResumePayload {
    /// Serialize a reviewed proposal
    ///
    /// # Errors
    /// Returns error if the proposal cannot be serialized
    pub fn from_proposal(proposal: &Proposal) -> Result<Self, serde_json::Error> {
        Ok(Self {
            body: serde_json::to_string(proposal)?,
        })
    }

    /// JSON text
    #[inline]
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Take the JSON text
    #[inline]
    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }

    /// Parse the body as a JSON value
    ///
    /// # Errors
    /// Returns error if the body is not valid JSON
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Parse the body back into a proposal
    ///
    /// # Errors
    /// Returns error if the body does not decode as a proposal
    pub fn proposal(&self) -> Result<Proposal, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Suspension request from the remote agent
#[derive(Debug)]
pub struct Interrupt {
    /// Proposal JSON (`null` to review the canonical proposal)
    pub value: Value,
    resume: oneshot::Sender<ResumePayload>,
}

impl Interrupt {
    /// Create an interrupt and the receiver the remote side waits on
    #[must_use]
    pub fn new(value: Value) -> (Self, oneshot::Receiver<ResumePayload>) {
        let (resume, receiver) = oneshot::channel();
        (Self { value, resume }, receiver)
    }
}

/// Checks applied before a decision is sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionPolicy {
    /// Refuse rejections without remarks
    pub require_remarks_on_reject: bool,
    /// Refuse approvals with no section selected
    pub require_approved_section_on_approve: bool,
}

impl AdmissionPolicy {
    /// Create permissive policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set remarks requirement for rejections
    #[must_use]
    pub fn with_remarks_on_reject(mut self, required: bool) -> Self {
        self.require_remarks_on_reject = required;
        self
    }

    /// Set section requirement for approvals
    #[must_use]
    pub fn with_approved_section_on_approve(mut self, required: bool) -> Self {
        self.require_approved_section_on_approve = required;
        self
    }

    /// Check a decision against the reviewed proposal
    ///
    /// # Errors
    /// Returns the first requirement the decision fails
    pub fn check(&self, proposal: &Proposal, decision: bool) -> Result<(), AdmissionError> {
        if decision {
            if self.require_approved_section_on_approve && proposal.sections.approved_count() == 0 {
                return Err(AdmissionError::NoApprovedSection);
            }
        } else if self.require_remarks_on_reject && proposal.remarks().is_none() {
            return Err(AdmissionError::RemarksRequired);
        }
        Ok(())
    }
}

/// Human-in-the-loop approval gate
#[derive(Debug, Default)]
pub struct ApprovalGate {
    phase: ApprovalPhase,
    draft: Option<Proposal>,
    resume: Option<oneshot::Sender<ResumePayload>>,
    policy: AdmissionPolicy,
    rounds: u64,
}

impl ApprovalGate {
    /// Create idle gate with permissive policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create idle gate with policy
    #[must_use]
    pub fn with_policy(policy: AdmissionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Open an approval round
    ///
    /// The draft is decoded from the interrupt value; a `null` or empty value
    /// reviews `fallback` (the canonical proposal) instead. A pending round
    /// is superseded and its resume handle dropped.
    ///
    /// # Errors
    /// Returns error if no proposal can be decoded; the interrupt's resume
    /// handle is dropped and the gate keeps its previous round
    pub fn raise(&mut self, interrupt: Interrupt, fallback: Option<&Proposal>) -> GateResult<()> {
        let proposal = decode_proposal(&interrupt.value, fallback).map_err(|e| {
            tracing::warn!(error = %e, "interrupt refused");
            e
        })?;

        if self.phase.is_resolved() {
            self.transition(ApprovalPhase::Idle)?;
        }
        self.transition(ApprovalPhase::AwaitingApproval)?;

        if self.resume.take().is_some() {
            tracing::warn!(round = self.rounds, "superseding pending approval round");
        }

        self.rounds += 1;
        tracing::info!(
            round = self.rounds,
            sections = proposal.sections.items.len(),
            "approval requested"
        );
        self.draft = Some(proposal);
        self.resume = Some(interrupt.resume);
        Ok(())
    }

    /// Toggle a proposed section
    ///
    /// # Errors
    /// Returns error if no round is pending or the key is unknown
    pub fn toggle_section(&mut self, key: &str, approved: bool) -> GateResult<()> {
        self.toggle_item(ProposalGroupKind::Sections, key, approved)
    }

    /// Toggle an item of any group
    ///
    /// # Errors
    /// Returns error if no round is pending, the group is absent, or the key
    /// is unknown
    pub fn toggle_item(
        &mut self,
        group: ProposalGroupKind,
        key: &str,
        approved: bool,
    ) -> GateResult<()> {
        let draft = self.draft_mut()?;
        let items = draft
            .group_mut(group)
            .ok_or(GateError::MissingGroup(group))?;
        let item = items.get_mut(key).ok_or_else(|| GateError::UnknownItem {
            group,
            key: key.to_string(),
        })?;
        item.approved = approved;
        Ok(())
    }

    /// Set reviewer remarks
    ///
    /// # Errors
    /// Returns error if no round is pending
    pub fn set_remarks(&mut self, remarks: impl Into<String>) -> GateResult<()> {
        self.draft_mut()?.remarks = Some(remarks.into());
        Ok(())
    }

    /// Resolve the round and resume the remote agent
    ///
    /// The round is consumed even if the remote side has gone away.
    ///
    /// # Errors
    /// Returns error if no round is pending (panics with `strict-debug`),
    /// the admission policy refuses the decision (round stays pending), or
    /// the resume handle is closed
    pub fn submit(&mut self, decision: bool) -> GateResult<ResumePayload> {
        if self.phase != ApprovalPhase::AwaitingApproval {
            return Err(self.not_awaiting());
        }
        let Some(draft) = self.draft.as_mut() else {
            return Err(self.not_awaiting());
        };

        self.policy.check(draft, decision)?;
        draft.approved = decision;
        let payload = ResumePayload::from_proposal(draft)
            .map_err(|e| GateError::MalformedProposal(e.to_string()))?;

        let target = if decision {
            ApprovalPhase::Approved
        } else {
            ApprovalPhase::Rejected
        };
        self.transition(target)?;
        tracing::info!(round = self.rounds, approved = decision, "approval round resolved");

        let resume = self.resume.take().ok_or(GateError::ResumeChannelClosed)?;
        resume
            .send(payload.clone())
            .map_err(|_| GateError::ResumeChannelClosed)?;
        Ok(payload)
    }

    /// Return a resolved gate to idle
    ///
    /// # Returns
    /// `true` if the gate was resolved and is now idle
    pub fn reset(&mut self) -> bool {
        if !self.phase.is_resolved() {
            return false;
        }
        self.phase = ApprovalPhase::Idle;
        self.draft = None;
        tracing::debug!(round = self.rounds, "approval gate reset");
        true
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> ApprovalPhase {
        self.phase
    }

    /// Check whether a round is pending
    #[inline]
    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        self.phase == ApprovalPhase::AwaitingApproval
    }

    /// Proposal under review (or just resolved)
    #[inline]
    #[must_use]
    pub fn draft(&self) -> Option<&Proposal> {
        self.draft.as_ref()
    }

    /// Admission policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Number of rounds raised so far
    #[inline]
    #[must_use]
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    fn transition(&mut self, to: ApprovalPhase) -> GateResult<()> {
        validate_transition(self.phase, to)?;
        tracing::debug!(from = %self.phase, to = %to, "approval phase change");
        self.phase = to;
        Ok(())
    }

    fn draft_mut(&mut self) -> GateResult<&mut Proposal> {
        if self.phase != ApprovalPhase::AwaitingApproval {
            return Err(GateError::NotAwaiting { phase: self.phase });
        }
        self.draft.as_mut().ok_or(GateError::NotAwaiting { phase: self.phase })
    }

    fn not_awaiting(&self) -> GateError {
        #[cfg(feature = "strict-debug")]
        panic!("approval submitted while {}", self.phase);

        #[cfg(not(feature = "strict-debug"))]
        GateError::NotAwaiting { phase: self.phase }
    }
}

fn decode_proposal(value: &Value, fallback: Option<&Proposal>) -> GateResult<Proposal> {
    let blank = match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    };
    if blank {
        return fallback.cloned().ok_or(GateError::NoProposal);
    }

    let decoded = match value {
        Value::String(text) => serde_json::from_str(text),
        other => Proposal::deserialize(other),
    };
    decoded.map_err(|e| GateError::MalformedProposal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_model::{ProposalGroup, ProposalItem};
    use serde_json::json;

    fn proposal() -> Proposal {
        let mut proposal = Proposal::new(
            ProposalGroup::from_items([("s1", ProposalItem::new("Intro", "Opening", false))]),
            "t",
        );
        proposal.key_points = Some(ProposalGroup::from_items([(
            "kp1",
            ProposalItem::new("Cost", "Pricing", true),
        )]));
        proposal
    }

    fn raised(gate: &mut ApprovalGate) -> oneshot::Receiver<ResumePayload> {
        let (interrupt, receiver) = Interrupt::new(serde_json::to_value(proposal()).unwrap());
        gate.raise(interrupt, None).unwrap();
        receiver
    }

    #[test]
    fn approve_round_trip() {
        let mut gate = ApprovalGate::new();
        let mut receiver = raised(&mut gate);

        gate.toggle_section("s1", true).unwrap();
        let payload = gate.submit(true).unwrap();

        assert_eq!(
            payload.to_value().unwrap(),
            json!({
                "sections": {"s1": {"title": "Intro", "description": "Opening", "approved": true}},
                "key_points": {"kp1": {"title": "Cost", "description": "Pricing", "approved": true}},
                "timestamp": "t",
                "approved": true
            })
        );
        assert_eq!(receiver.try_recv().unwrap(), payload);
        assert_eq!(gate.phase(), ApprovalPhase::Approved);
    }

    #[test]
    fn edits_touch_only_draft() {
        let canonical = proposal();
        let mut gate = ApprovalGate::new();
        let (interrupt, _receiver) = Interrupt::new(Value::Null);
        gate.raise(interrupt, Some(&canonical)).unwrap();

        gate.toggle_section("s1", true).unwrap();
        assert!(!canonical.sections.get("s1").unwrap().approved);
        assert!(gate.draft().unwrap().sections.get("s1").unwrap().approved);
    }

    #[test]
    fn null_value_without_fallback_refused() {
        let mut gate = ApprovalGate::new();
        let (interrupt, mut receiver) = Interrupt::new(Value::Null);

        assert_eq!(gate.raise(interrupt, None), Err(GateError::NoProposal));
        assert_eq!(gate.phase(), ApprovalPhase::Idle);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn string_value_is_decoded() {
        let mut gate = ApprovalGate::new();
        let text = serde_json::to_string(&proposal()).unwrap();
        let (interrupt, _receiver) = Interrupt::new(Value::String(text));

        gate.raise(interrupt, None).unwrap();
        assert_eq!(gate.draft(), Some(&proposal()));
    }

    #[test]
    fn malformed_value_refused() {
        let mut gate = ApprovalGate::new();
        let (interrupt, _receiver) = Interrupt::new(json!({"sections": 3}));
        assert!(matches!(
            gate.raise(interrupt, None),
            Err(GateError::MalformedProposal(_))
        ));
    }

    #[test]
    fn toggle_unknown_item() {
        let mut gate = ApprovalGate::new();
        let _receiver = raised(&mut gate);

        assert_eq!(
            gate.toggle_section("nope", true),
            Err(GateError::UnknownItem {
                group: ProposalGroupKind::Sections,
                key: "nope".to_string()
            })
        );
        assert_eq!(
            gate.toggle_item(ProposalGroupKind::DocumentFeatures, "f1", true),
            Err(GateError::MissingGroup(ProposalGroupKind::DocumentFeatures))
        );
        gate.toggle_item(ProposalGroupKind::KeyPoints, "kp1", false).unwrap();
        assert!(!gate.draft().unwrap().key_points.as_ref().unwrap().get("kp1").unwrap().approved);
    }

    #[test]
    fn reject_carries_remarks() {
        let mut gate = ApprovalGate::new();
        let mut receiver = raised(&mut gate);

        gate.set_remarks("needs a methods section").unwrap();
        gate.submit(false).unwrap();

        let resumed = receiver.try_recv().unwrap().proposal().unwrap();
        assert!(!resumed.approved);
        assert_eq!(resumed.remarks(), Some("needs a methods section"));
        assert_eq!(gate.phase(), ApprovalPhase::Rejected);
    }

    #[test]
    fn admission_keeps_round_open() {
        let policy = AdmissionPolicy::new()
            .with_remarks_on_reject(true)
            .with_approved_section_on_approve(true);
        let mut gate = ApprovalGate::with_policy(policy);
        let _receiver = raised(&mut gate);

        assert_eq!(
            gate.submit(true),
            Err(GateError::Admission(AdmissionError::NoApprovedSection))
        );
        gate.set_remarks("   ").unwrap();
        assert_eq!(
            gate.submit(false),
            Err(GateError::Admission(AdmissionError::RemarksRequired))
        );
        assert!(gate.is_awaiting());

        gate.toggle_section("s1", true).unwrap();
        assert!(gate.submit(true).is_ok());
    }

    #[test]
    fn supersede_drops_previous_handle() {
        let mut gate = ApprovalGate::new();
        let mut first = raised(&mut gate);
        let mut second = raised(&mut gate);

        assert_eq!(gate.rounds(), 2);
        assert!(matches!(
            first.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));

        gate.submit(true).unwrap();
        assert!(second.try_recv().is_ok());
    }

    #[test]
    fn closed_channel_still_consumes_round() {
        let mut gate = ApprovalGate::new();
        drop(raised(&mut gate));

        assert_eq!(gate.submit(true), Err(GateError::ResumeChannelClosed));
        assert_eq!(gate.phase(), ApprovalPhase::Approved);
    }

    #[cfg(not(feature = "strict-debug"))]
    #[test]
    fn double_submit_is_not_awaiting() {
        let mut gate = ApprovalGate::new();
        let _receiver = raised(&mut gate);

        gate.submit(true).unwrap();
        assert_eq!(
            gate.submit(true),
            Err(GateError::NotAwaiting {
                phase: ApprovalPhase::Approved
            })
        );
    }

    #[test]
    fn reset_only_from_resolved() {
        let mut gate = ApprovalGate::new();
        assert!(!gate.reset());

        let _receiver = raised(&mut gate);
        assert!(!gate.reset());
        assert!(gate.is_awaiting());

        gate.submit(false).unwrap();
        assert!(gate.reset());
        assert_eq!(gate.phase(), ApprovalPhase::Idle);
        assert!(gate.draft().is_none());
    }

    #[test]
    fn raise_after_resolution_starts_new_round() {
        let mut gate = ApprovalGate::new();
        let _first = raised(&mut gate);
        gate.submit(false).unwrap();

        let _second = raised(&mut gate);
        assert!(gate.is_awaiting());
        assert!(!gate.draft().unwrap().approved);
    }
}
