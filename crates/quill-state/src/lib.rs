//! Quill State
//!
//! Canonical store for the research aggregate, reconciled against a durable
//! cache with remote priority.
//!
//! # Core Concepts
//!
//! - [`StateStore`]: single writer of [`quill_model::ResearchState`]
//! - [`DurableCache`]: named-slot storage owned by the host ([`MemoryCache`], [`FileCache`])
//! - [`Provenance`]: every change is tagged `Remote`, `Local` or `Cache`
//! - [`Publication`]: state sent back to the remote side
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_state::{MemoryCache, StateStore, StoreConfig};
//! use std::sync::Arc;
//!
//! let cache = Arc::new(MemoryCache::default());
//! let (mut store, mut publications) = StateStore::open(cache, StoreConfig::default()).await;
//! store.bootstrap();
//! store.apply_remote(remote_state);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod cache;
mod error;
mod patch;
mod store;
mod writer;

// Re-exports
pub use cache::{validate_slot, DurableCache, FileCache, MemoryCache};
pub use error::{CacheError, StoreError, StoreResult};
pub use patch::StatePatch;
pub use store::{
    Provenance, Publication, Publications, Reconciliation, StateStore, StoreConfig, WriteOutcome,
    DEFAULT_SLOT,
};
pub use writer::CacheWriter;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use quill_model::{DocumentSection, ResearchState};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn publications_follow_revisions() {
        let cache = Arc::new(MemoryCache::seeded(DEFAULT_SLOT, json!({"title": "cached"})).await);
        let (mut store, mut publications) = StateStore::open(cache, StoreConfig::default()).await;

        store.bootstrap();
        store
            .write(StatePatch::new().with_sections(vec![DocumentSection::new("s1", 0, "Intro", "")]))
            .unwrap();
        store.clear_logs().unwrap();

        let mut seen = Vec::new();
        while let Ok(publication) = publications.try_recv() {
            seen.push((publication.revision, publication.provenance));
        }
        assert_eq!(seen, vec![(1, Provenance::Cache), (2, Provenance::Local)]);
    }

    #[tokio::test]
    async fn remote_duplicates_are_kept() {
        let cache = Arc::new(MemoryCache::default());
        let (mut store, _publications) = StateStore::open(cache, StoreConfig::default()).await;

        let remote = ResearchState {
            sections: vec![
                DocumentSection::new("a", 0, "A", ""),
                DocumentSection::new("a", 1, "A", ""),
            ],
            ..ResearchState::default()
        };
        store.apply_remote(remote);
        assert_eq!(store.state().sections.len(), 2);
    }
}
