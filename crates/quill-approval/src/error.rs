//! Error types for the approval gate

use crate::phase::ApprovalPhase;
use quill_model::ProposalGroupKind;

/// Submission refused by the admission policy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionError {
    /// Rejection without remarks
    #[error("rejection requires remarks")]
    RemarksRequired,

    /// Approval with every section deselected
    #[error("approval requires at least one approved section")]
    NoApprovedSection,
}

/// Errors during an approval round
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// Command requires a pending round
    #[error("no proposal awaiting approval (phase: {phase})")]
    NotAwaiting {
        /// Current phase
        phase: ApprovalPhase,
    },

    /// Phase change not permitted
    #[error("illegal approval transition: {from} -> {to}")]
    IllegalTransition {
        /// Current phase
        from: ApprovalPhase,
        /// Requested phase
        to: ApprovalPhase,
    },

    /// Interrupt carried no proposal and none was available to fall back on
    #[error("interrupt carries no proposal")]
    NoProposal,

    /// Interrupt value does not decode as a proposal
    #[error("malformed proposal: {0}")]
    MalformedProposal(String),

    /// Group absent from the proposal
    #[error("proposal has no '{0}' group")]
    MissingGroup(ProposalGroupKind),

    /// Item absent from its group
    #[error("unknown item '{key}' in '{group}'")]
    UnknownItem {
        /// Group searched
        group: ProposalGroupKind,
        /// Missing key
        key: String,
    },

    /// Admission policy refused the submission
    #[error("submission refused: {0}")]
    Admission(#[from] AdmissionError),

    /// Remote side dropped the resume handle; the round is consumed
    #[error("resume channel closed")]
    ResumeChannelClosed,
}

/// Result type alias for gate operations
pub type GateResult<T> = Result<T, GateError>;
