//! Graph entry value type.

use std::cmp::Ordering;

use arbor_core::{Locator, RelationshipId};
use serde::{Deserialize, Serialize};

/// One directed adjacency record: a neighbor locator, the relationship it
/// came from, and an optional sort rank.
///
/// Ordering is by sort rank ascending, then by relationship id, so ordered
/// assembly children come back in their configured display order while
/// folder children (which carry no rank) fall back to relationship-id
/// order. An unset rank sorts as rank 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEntry {
    /// The neighbor node (child for parent-side entries, parent for
    /// child-side entries).
    pub neighbor: Locator,
    /// Originating relationship id.
    pub relationship_id: RelationshipId,
    /// Sort rank within the parent, if the relationship is ordered.
    pub sort_rank: Option<i32>,
}

impl GraphEntry {
    /// Create an entry.
    pub fn new(neighbor: Locator, relationship_id: RelationshipId, sort_rank: Option<i32>) -> Self {
        Self {
            neighbor,
            relationship_id,
            sort_rank,
        }
    }

    fn rank(&self) -> i32 {
        self.sort_rank.unwrap_or(0)
    }
}

impl Ord for GraphEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then(self.relationship_id.cmp(&other.relationship_id))
            .then(self.neighbor.cmp(&other.neighbor))
    }
}

impl PartialOrd for GraphEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
