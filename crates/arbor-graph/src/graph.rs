//! Bidirectional relationship adjacency index.
//!
//! `RelationshipGraph` maintains, for one relationship category, an edge
//! index in both directions: parent → children and child → parents. Every
//! edge appears exactly once in each index, keyed by its relationship id,
//! so updates replace rather than duplicate and removal is idempotent.
//!
//! One instance models folder-containment edges and a second models
//! ordered active-assembly dependency edges; the owning cache decides
//! which one an edge belongs in.

use std::collections::{HashMap, HashSet};

use arbor_core::{Locator, RelationshipId};

use crate::entry::GraphEntry;

/// Predicate over relationship ids used to filter path traversal.
///
/// Returning `false` prunes the branch — both for genuinely non-matching
/// relationship types and for ids whose detail record cannot be resolved
/// (stale edges).
pub type EdgePredicate<'a> = &'a dyn Fn(RelationshipId) -> bool;

/// A bidirectional adjacency index over node locators.
#[derive(Debug, Default)]
pub struct RelationshipGraph {
    /// parent → (relationship id → entry pointing at the child)
    children: HashMap<Locator, HashMap<RelationshipId, GraphEntry>>,
    /// child → (relationship id → entry pointing at the parent)
    parents: HashMap<Locator, HashMap<RelationshipId, GraphEntry>>,
}

impl RelationshipGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge between `parent` and `child`.
    ///
    /// Idempotent on the relationship id: re-adding under the same id
    /// replaces the stored entries (picking up a changed sort rank).
    /// Callers moving an edge to a different parent/child pair must remove
    /// the stale edge first.
    pub fn add_edge(
        &mut self,
        relationship_id: RelationshipId,
        parent: Locator,
        child: Locator,
        sort_rank: Option<i32>,
    ) {
        self.children
            .entry(parent)
            .or_default()
            .insert(relationship_id, GraphEntry::new(child, relationship_id, sort_rank));
        self.parents
            .entry(child)
            .or_default()
            .insert(relationship_id, GraphEntry::new(parent, relationship_id, sort_rank));
    }

    /// Remove the edge stored under `relationship_id` between `parent` and
    /// `child`. Silently does nothing if the edge is absent.
    pub fn remove_edge(&mut self, relationship_id: RelationshipId, parent: Locator, child: Locator) {
        if let Some(entries) = self.children.get_mut(&parent) {
            entries.remove(&relationship_id);
            if entries.is_empty() {
                self.children.remove(&parent);
            }
        }
        if let Some(entries) = self.parents.get_mut(&child) {
            entries.remove(&relationship_id);
            if entries.is_empty() {
                self.parents.remove(&child);
            }
        }
    }

    /// Sorted copy of the child entries of `parent`; empty if none.
    pub fn children_of(&self, parent: &Locator) -> Vec<GraphEntry> {
        self.sorted_entries(self.children.get(parent))
    }

    /// Sorted copy of the parent entries of `child` (usually a singleton);
    /// empty if none.
    pub fn parents_of(&self, child: &Locator) -> Vec<GraphEntry> {
        self.sorted_entries(self.parents.get(child))
    }

    /// Walk parent edges from `child` up to the root, keeping only edges
    /// accepted by `matches`.
    ///
    /// Returns one path per surviving parent branch, each ordered from the
    /// root down to the immediate parent of `child`. A branch ends where no
    /// parent edge matches; a rejected edge terminates the branch rather
    /// than being skipped, so a type mismatch one hop up truncates the
    /// path there. Multiple paths occur only under (transient)
    /// multi-parenting, which the traversal tolerates.
    pub fn paths_to_root(&self, child: &Locator, matches: EdgePredicate<'_>) -> Vec<Vec<GraphEntry>> {
        let mut visiting = HashSet::new();
        visiting.insert(*child);
        self.ascend(child, matches, &mut visiting)
            .into_iter()
            .filter(|path| !path.is_empty())
            .collect()
    }

    /// All locators that currently have at least one child edge.
    pub fn parent_keys(&self) -> Vec<Locator> {
        self.children.keys().copied().collect()
    }

    /// Number of distinct parents (diagnostic).
    pub fn parent_count(&self) -> usize {
        self.children.len()
    }

    /// Total number of child entries across all parents (diagnostic).
    pub fn child_count(&self) -> usize {
        self.children.values().map(HashMap::len).sum()
    }

    fn sorted_entries(&self, entries: Option<&HashMap<RelationshipId, GraphEntry>>) -> Vec<GraphEntry> {
        let mut entries: Vec<GraphEntry> = entries
            .map(|map| map.values().copied().collect())
            .unwrap_or_default();
        entries.sort();
        entries
    }

    fn ascend(
        &self,
        node: &Locator,
        matches: EdgePredicate<'_>,
        visiting: &mut HashSet<Locator>,
    ) -> Vec<Vec<GraphEntry>> {
        // Cycle guard: a parent already on the current walk ends the branch.
        let matched: Vec<GraphEntry> = self
            .parents_of(node)
            .into_iter()
            .filter(|entry| !visiting.contains(&entry.neighbor) && matches(entry.relationship_id))
            .collect();

        if matched.is_empty() {
            return vec![Vec::new()];
        }

        let mut paths = Vec::new();
        for entry in matched {
            visiting.insert(entry.neighbor);
            for mut path in self.ascend(&entry.neighbor, matches, visiting) {
                path.push(entry);
                paths.push(path);
            }
            visiting.remove(&entry.neighbor);
        }
        paths
    }
}
