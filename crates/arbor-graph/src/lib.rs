//! Arbor Graph — the relationship graph engine and cache.
//!
//! This crate implements the in-memory folder / active-assembly
//! relationship cache: a pair of bidirectional adjacency indexes kept
//! current by incremental update/delete events and queried heavily for
//! path resolution, ancestor/descendant walks, and ordered child listings.
//!
//! # Modules
//!
//! - [`entry`]: The ordered adjacency entry value type
//! - [`graph`]: `RelationshipGraph`, the bidirectional adjacency index
//! - [`cache`]: `RelationshipCache`, the query/update engine and its
//!   locking discipline
//! - [`event`]: Relationship-changed notification payloads
//! - [`stats`]: Monitoring counters and load diagnostics
//!
//! # Features
//!
//! - `test-utils`: Exposes in-memory mock implementations of the external
//!   collaborators ([`mock`])

// Deny unwrap in library code to ensure proper error handling
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod cache;
pub mod entry;
pub mod event;
pub mod graph;
pub mod stats;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

// Re-export key types at crate root for convenience
pub use cache::RelationshipCache;
pub use entry::GraphEntry;
pub use event::RelationshipEvent;
pub use graph::RelationshipGraph;
pub use stats::{CacheStats, LoadSummary};
