//! Quill Data Model
//!
//! Typed representation of the research document the remote agent produces.
//!
//! # Core Concepts
//!
//! - [`DocumentSection`]: One settled section of the document
//! - [`ResearchState`]: Aggregate root owned by the canonical state store
//! - [`Proposal`]: Structure proposal reviewed during an approval round
//! - [`Source`] / [`LogEntry`]: Research sources and agent progress lines
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_model::ResearchState;
//!
//! let state = ResearchState::from_bag(&bag);
//! for section in state.ordered_sections() {
//!     println!("{} {}", section.idx, section.title);
//! }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

// Core modules
mod proposal;
mod research;
mod section;

// Re-exports
pub use proposal::{Proposal, ProposalGroup, ProposalGroupKind, ProposalItem};
pub use research::{LogEntry, ResearchState, Source};
pub use section::DocumentSection;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
