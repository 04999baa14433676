//! Approval round phases
//!
//! `Idle → AwaitingApproval → (Approved | Rejected) → Idle`. A new interrupt
//! may supersede a pending one (`AwaitingApproval → AwaitingApproval`).

use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Phase of the approval gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPhase {
    /// No proposal under review
    #[default]
    Idle,
    /// Proposal under review, resume handle held
    AwaitingApproval,
    /// Round resolved with approval
    Approved,
    /// Round resolved with rejection
    Rejected,
}

impl ApprovalPhase {
    /// All phases
    pub const ALL: [Self; 4] = [
        Self::Idle,
        Self::AwaitingApproval,
        Self::Approved,
        Self::Rejected,
    ];

    /// Check whether a round has been resolved
    #[inline]
    #[must_use]
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl Display for ApprovalPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Validates a phase transition
///
/// Returns an error for illegal transitions; panics instead with the
/// `strict-debug` feature.
///
/// # Errors
/// Returns [`GateError::IllegalTransition`] if `to` is not reachable from `from`
pub fn validate_transition(from: ApprovalPhase, to: ApprovalPhase) -> Result<(), GateError> {
    if allowed(from, to) {
        Ok(())
    } else {
        #[cfg(feature = "strict-debug")]
        panic!("Illegal approval transition attempted: {from:?} -> {to:?}");

        #[cfg(not(feature = "strict-debug"))]
        Err(GateError::IllegalTransition { from, to })
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: ApprovalPhase) -> Vec<ApprovalPhase> {
    use ApprovalPhase::{Approved, AwaitingApproval, Idle, Rejected};
    match from {
        Idle => vec![AwaitingApproval],
        AwaitingApproval => vec![AwaitingApproval, Approved, Rejected],
        Approved | Rejected => vec![Idle],
    }
}

fn allowed(from: ApprovalPhase, to: ApprovalPhase) -> bool {
    allowed_transitions(from).into_iter().any(|p| p == to)
}
