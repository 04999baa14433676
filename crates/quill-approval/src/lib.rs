//! Quill Approval
//!
//! Human-in-the-loop gate for structure proposals. The remote agent suspends
//! with an [`Interrupt`]; the reviewer edits a draft copy of the proposal and
//! resolves the round exactly once with a [`ResumePayload`].
//!
//! # Phases
//!
//! `Idle → AwaitingApproval → (Approved | Rejected) → Idle`, checked by
//! [`validate_transition`].
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_approval::{ApprovalGate, Interrupt};
//!
//! let mut gate = ApprovalGate::new();
//! let (interrupt, resumed) = Interrupt::new(proposal_json);
//! gate.raise(interrupt, None)?;
//! gate.toggle_section("intro", true)?;
//! gate.submit(true)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod error;
mod gate;
mod phase;

// Re-exports
pub use error::{AdmissionError, GateError, GateResult};
pub use gate::{AdmissionPolicy, ApprovalGate, Interrupt, ResumePayload};
pub use phase::{allowed_transitions, validate_transition, ApprovalPhase};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
