//! Collaborator traits for the Arbor relationship cache.
//!
//! These traits are the seams to the two external systems the cache
//! depends on: the item directory (a read-only metadata oracle) and the
//! bulk relationship store queried once at startup. Embedding applications
//! implement them against their persistence layer; tests implement them
//! in memory.

use crate::error::Result;
use crate::types::{ContentId, ItemSummary, RelationshipData};

/// Read-only lookup from item id to lightweight item metadata.
///
/// The cache consults the directory when validating new edges, resolving
/// names for path rendering, and detecting stale edges. Implementations
/// must be independently synchronized; the cache never mutates through
/// this trait.
pub trait ItemDirectory: Send + Sync {
    /// Look up an item by id. `None` if the item does not exist (or no
    /// longer exists).
    fn item(&self, id: ContentId) -> Option<ItemSummary>;
}

/// Bulk query interface over the authoritative relationship store, used
/// once at startup to seed the cache.
pub trait RelationshipStore: Send + Sync {
    /// All persisted folder-category relationship rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store query fails.
    fn folder_relationships(&self) -> Result<Vec<RelationshipData>>;

    /// All persisted dependency-category relationship rows whose owner
    /// revision matches one of the owner item's current, tip, or public
    /// revisions. The contract places the revision join on the store side
    /// so historical rows never reach the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store query fails.
    fn dependency_relationships(&self) -> Result<Vec<RelationshipData>>;
}
