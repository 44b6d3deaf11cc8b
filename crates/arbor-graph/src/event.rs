//! Relationship change events.

use arbor_core::RelationshipData;
use serde::{Deserialize, Serialize};

/// One relationship-changed notification from the authoritative store.
///
/// The owning system delivers these one relationship at a time; the cache
/// applies them synchronously on the delivering thread via
/// [`RelationshipCache::apply`](crate::cache::RelationshipCache::apply).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipEvent {
    /// A relationship was created or modified.
    Updated(RelationshipData),
    /// A relationship was removed.
    Deleted(RelationshipData),
}

impl RelationshipEvent {
    /// The relationship record carried by the event.
    pub fn relationship(&self) -> &RelationshipData {
        match self {
            Self::Updated(data) | Self::Deleted(data) => data,
        }
    }
}
