//! Cache statistics and load diagnostics.
//!
//! Snapshot types exposed for monitoring. Both derive
//! `Serialize`/`Deserialize` so they can be reported over whatever
//! diagnostic transport the embedding application uses.

use serde::{Deserialize, Serialize};

/// Point-in-time counts over the cache's graphs and detail maps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Cached folder-category relationships.
    pub folder_relationship_count: usize,
    /// Cached dependency-category relationships.
    pub dependency_relationship_count: usize,
    /// Distinct parents in the folder graph.
    pub folder_parent_count: usize,
    /// Child entries in the folder graph.
    pub folder_child_count: usize,
    /// Distinct owners in the dependency graph.
    pub dependency_parent_count: usize,
    /// Dependent entries in the dependency graph.
    pub dependency_child_count: usize,
    /// Whether the initial bulk load has completed.
    pub started: bool,
}

/// Outcome of the startup bulk load, returned by
/// [`RelationshipCache::start`](crate::cache::RelationshipCache::start).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Folder rows inserted.
    pub folder_loaded: usize,
    /// Folder rows rejected by validation.
    pub folder_skipped: usize,
    /// Dependency rows inserted.
    pub dependency_loaded: usize,
    /// Dependency rows rejected by validation.
    pub dependency_skipped: usize,
    /// Edges removed by the orphan-cleanup pass.
    pub orphan_edges_removed: usize,
}
