//! Quill Core
//!
//! Research session tying the streaming decoder, the canonical state store
//! and the approval gate together behind a single event loop.
//!
//! # Architecture
//!
//! ```text
//! remote bag ──► SectionAssembler ──► streaming preview ─┐
//!      │                                                  ├─► compose ─► DocumentView
//!      └──────► StateStore (remote priority) ─────────────┘
//!                   │  ▲
//!        publications  └── local edits
//! interrupt ──► ApprovalGate ──► resume payload
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_core::{ResearchSession, SessionConfig, SessionEvent};
//! use quill_state::MemoryCache;
//! use std::sync::Arc;
//!
//! let (session, publications) =
//!     ResearchSession::open(SessionConfig::new(), Arc::new(MemoryCache::default())).await?;
//! let (events, inbox) = tokio::sync::mpsc::channel(64);
//! let handle = tokio::spawn(session.run(inbox));
//! events.send(SessionEvent::RemoteState(bag)).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod config;
mod error;
mod session;
mod view;

// Re-exports
pub use config::{SessionConfig, DEFAULT_LOG_FILTER};
pub use error::{ConfigError, SessionError, SessionResult};
pub use session::{ResearchSession, SessionEvent, SessionOutcome};
pub use view::{compose, DocumentView, Focus, PlaceholderHint};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
