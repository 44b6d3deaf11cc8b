//! The relationship cache engine.
//!
//! `RelationshipCache` is the single source of truth consumers query. It
//! owns two [`RelationshipGraph`] instances — one for folder containment,
//! one for ordered active-assembly dependencies — plus the relationship-id
//! → detail maps that back them, all guarded as a unit by one process-wide
//! readers-writer lock.
//!
//! # Lifecycle
//!
//! The cache is explicitly constructed and dependency-injected (no global
//! singleton): build it with [`RelationshipCache::new`], seed it once via
//! [`RelationshipCache::start`], then feed it relationship-changed events
//! through [`RelationshipCache::apply`]. All queries are valid before
//! `start` but return empty results.
//!
//! # Locking discipline
//!
//! Pure queries take the read lock for their duration; mutations take the
//! write lock. Self-healing (removing an edge whose endpoint vanished from
//! the item directory) is detected under the read lock, but the repair
//! drops the read lock first, re-checks under the write lock, and only
//! then deletes — the locks are never held together.
//!
//! # Failure semantics
//!
//! Data-quality problems inherited from the store (stale edges, orphan
//! subtrees, unresolvable items) never surface as errors: they are logged
//! and the affected entries are excluded or self-healed. `Error` is
//! returned only for invalid caller arguments and bulk-store failures.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arbor_core::{
    ConfigId, ConfigRegistry, ContentId, Error, ItemDirectory, Locator, RelationshipData,
    RelationshipId, RelationshipStore, Result,
};
use log::{debug, error, warn};
use parking_lot::RwLock;

use crate::entry::GraphEntry;
use crate::event::RelationshipEvent;
use crate::graph::RelationshipGraph;
use crate::stats::{CacheStats, LoadSummary};

/// Minimal projection kept for folder-category edges.
#[derive(Clone, Debug, PartialEq, Eq)]
struct FolderDetail {
    parent_id: ContentId,
    child_id: ContentId,
    config_id: ConfigId,
}

/// Everything guarded by the cache's readers-writer lock.
#[derive(Debug, Default)]
struct CacheState {
    folder_graph: RelationshipGraph,
    dependency_graph: RelationshipGraph,
    folder_details: HashMap<RelationshipId, FolderDetail>,
    dependency_details: HashMap<RelationshipId, RelationshipData>,
    /// Set once the initial bulk load has completed. Insert validation is
    /// skipped afterwards so that a move (new edge before old-edge delete)
    /// is not rejected mid-transition.
    started: bool,
}

/// Why an edge is being removed; drives the diagnostic log level.
#[derive(Clone, Copy, Debug)]
enum Deletion {
    /// Ordinary removal driven by a delete event or an update replacing
    /// the edge.
    Normal,
    /// Removal by the orphan-cleanup pass (parent unreachable from root).
    Invalid,
    /// Removal by self-healing (endpoint vanished from the directory).
    Stale,
}

/// Outcome of resolving a relationship id back into a full record.
enum Resolution {
    Found(RelationshipData),
    /// The edge is cached but its child/dependent no longer exists in the
    /// item directory.
    Stale,
    Unknown,
}

/// In-memory folder / active-assembly relationship cache.
///
/// Shared by arbitrarily many request-handling threads; read queries never
/// block each other, a writer blocks everything until it completes.
pub struct RelationshipCache {
    state: RwLock<CacheState>,
    directory: Arc<dyn ItemDirectory>,
    registry: ConfigRegistry,
    root: Locator,
}

impl RelationshipCache {
    /// Create an empty, not-yet-started cache.
    ///
    /// `root_id` identifies the well-known root folder everything else
    /// must be reachable from.
    pub fn new(directory: Arc<dyn ItemDirectory>, registry: ConfigRegistry, root_id: ContentId) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            directory,
            registry,
            root: Locator::head(root_id),
        }
    }

    /// The well-known root locator.
    pub fn root(&self) -> Locator {
        self.root
    }

    // ========================================================================
    // Startup
    // ========================================================================

    /// Bulk-load all persisted relationships of both categories, validate
    /// and insert each edge, then prune everything unreachable from the
    /// root.
    ///
    /// The write lock is held across the store reads: no readers exist yet
    /// in practice, but the lock keeps concurrent initialization attempts
    /// correct.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache was already started or a bulk-store
    /// query fails. Per-row validation failures do not abort the load;
    /// they are logged and counted in the returned summary.
    pub fn start(&self, store: &dyn RelationshipStore) -> Result<LoadSummary> {
        let mut state = self.state.write();
        if state.started {
            return Err(Error::invalid_argument("relationship cache is already started"));
        }

        let mut summary = LoadSummary::default();

        for row in store.folder_relationships()? {
            if self.insert_folder_edge(&mut state, &row) {
                summary.folder_loaded += 1;
            } else {
                summary.folder_skipped += 1;
            }
        }
        for row in store.dependency_relationships()? {
            if self.insert_dependency_edge(&mut state, &row) {
                summary.dependency_loaded += 1;
            } else {
                summary.dependency_skipped += 1;
            }
        }

        summary.orphan_edges_removed = self.cleanup_folders(&mut state);
        state.started = true;

        debug!(
            "relationship cache started: {} folder rows ({} skipped), {} dependency rows ({} skipped), {} orphan edges removed",
            summary.folder_loaded,
            summary.folder_skipped,
            summary.dependency_loaded,
            summary.dependency_skipped,
            summary.orphan_edges_removed
        );
        Ok(summary)
    }

    // ========================================================================
    // Incremental maintenance
    // ========================================================================

    /// Apply one relationship-changed event.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid event payloads (non-positive
    /// relationship id).
    pub fn apply(&self, event: &RelationshipEvent) -> Result<()> {
        match event {
            RelationshipEvent::Updated(data) => self.apply_update(data),
            RelationshipEvent::Deleted(data) => self.apply_delete(data),
        }
    }

    /// Apply an update (create-or-modify) for one relationship.
    ///
    /// If nothing is cached under the relationship id, the edge is
    /// inserted. If the cached detail differs in any tracked field, the
    /// old edge is deleted and the new one inserted — an edge's key fields
    /// are never mutated in place. If the detail is identical this is a
    /// no-op. Events for categories the cache does not track are ignored.
    ///
    /// A move arrives as an update against the new parent followed by a
    /// delete of the old relationship; between the two events a reader can
    /// observe the node with two parents. The cache tolerates that window
    /// (validation is off once started) rather than inventing an atomic
    /// move the notification feed cannot deliver.
    ///
    /// # Errors
    ///
    /// Returns an error if the relationship id is not positive.
    pub fn apply_update(&self, data: &RelationshipData) -> Result<()> {
        Self::check_relationship(data)?;
        let Some(category) = self.registry.category(data.config_id) else {
            debug!("ignoring update for relationship {} with unknown config {}", data.id, data.config_id);
            return Ok(());
        };

        let mut state = self.state.write();
        if category.is_folder_like() {
            let incoming = FolderDetail {
                parent_id: data.owner.id,
                child_id: data.dependent.id,
                config_id: data.config_id,
            };
            match state.folder_details.get(&data.id) {
                Some(existing) if *existing == incoming => {}
                Some(_) => {
                    Self::delete_folder_edge(&mut state, data.id, Deletion::Normal);
                    self.insert_folder_edge(&mut state, data);
                }
                None => {
                    self.insert_folder_edge(&mut state, data);
                }
            }
        } else {
            match state.dependency_details.get(&data.id) {
                Some(existing) if existing == data => {}
                Some(_) => {
                    Self::delete_dependency_edge(&mut state, data.id, Deletion::Normal);
                    self.insert_dependency_edge(&mut state, data);
                }
                None => {
                    self.insert_dependency_edge(&mut state, data);
                }
            }
        }
        Ok(())
    }

    /// Apply a delete for one relationship. Absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the relationship id is not positive.
    pub fn apply_delete(&self, data: &RelationshipData) -> Result<()> {
        Self::check_relationship(data)?;
        let Some(category) = self.registry.category(data.config_id) else {
            debug!("ignoring delete for relationship {} with unknown config {}", data.id, data.config_id);
            return Ok(());
        };

        let mut state = self.state.write();
        if category.is_folder_like() {
            Self::delete_folder_edge(&mut state, data.id, Deletion::Normal);
        } else {
            Self::delete_dependency_edge(&mut state, data.id, Deletion::Normal);
        }
        Ok(())
    }

    // ========================================================================
    // Folder queries
    // ========================================================================

    /// All ancestors of `locator` across all surviving branches, each
    /// branch ordered root-first, filtered by relationship-type name.
    ///
    /// # Errors
    ///
    /// Returns an error if `type_name` is blank.
    pub fn owner_locators(&self, locator: &Locator, type_name: &str) -> Result<Vec<Locator>> {
        let Some(config_id) = self.checked_config_id(type_name)? else {
            return Ok(Vec::new());
        };

        let state = self.state.read();
        let paths = self.typed_paths(&state, &self.start_locator(locator, config_id), config_id);
        Ok(paths.into_iter().flatten().map(|e| e.neighbor).collect())
    }

    /// Ancestor paths of `locator` rendered as `/`-joined item names, root
    /// first. A path with any unresolvable segment renders as the empty
    /// string rather than partially.
    ///
    /// # Errors
    ///
    /// Returns an error if `type_name` is blank.
    pub fn parent_paths(&self, locator: &Locator, type_name: &str) -> Result<Vec<String>> {
        let Some(config_id) = self.checked_config_id(type_name)? else {
            return Ok(Vec::new());
        };

        let state = self.state.read();
        let paths = self.typed_paths(&state, &self.start_locator(locator, config_id), config_id);
        Ok(paths.into_iter().map(|path| self.render_path(&path)).collect())
    }

    /// Locators of the immediate folder children of `parent`.
    pub fn child_locators(&self, parent: &Locator) -> Vec<Locator> {
        let state = self.state.read();
        state
            .folder_graph
            .children_of(&parent.normalized())
            .into_iter()
            .map(|e| e.neighbor)
            .collect()
    }

    /// Locators of the folder parents of `child` (at most one outside a
    /// transient move window).
    pub fn parent_locators(&self, child: &Locator) -> Vec<Locator> {
        let state = self.state.read();
        state
            .folder_graph
            .parents_of(&child.normalized())
            .into_iter()
            .map(|e| e.neighbor)
            .collect()
    }

    /// Ids of the immediate folder children of `parent_id`.
    pub fn child_ids(&self, parent_id: ContentId) -> Vec<ContentId> {
        self.child_locators(&Locator::head(parent_id))
            .into_iter()
            .map(|l| l.id)
            .collect()
    }

    /// First immediate child of `parent` whose content type matches one of
    /// `type_ids`, in child sort order.
    pub fn find_child_of_type(&self, parent: &Locator, type_ids: &[i32]) -> Option<Locator> {
        let state = self.state.read();
        state
            .folder_graph
            .children_of(&parent.normalized())
            .into_iter()
            .find(|entry| {
                self.directory
                    .item(entry.neighbor.id)
                    .is_some_and(|item| type_ids.contains(&item.object_type))
            })
            .map(|entry| entry.neighbor)
    }

    /// Resolve the full relationship records of the folder children of
    /// `parent`, optionally filtered by relationship-type name. Stale
    /// edges discovered along the way are excluded and self-healed.
    ///
    /// # Errors
    ///
    /// Returns an error if `filter` is present but blank.
    pub fn children(&self, parent: &Locator, filter: Option<&str>) -> Result<Vec<RelationshipData>> {
        let wanted = match filter {
            None => None,
            Some(name) => match self.checked_config_id(name)? {
                Some(id) => Some(id),
                None => return Ok(Vec::new()),
            },
        };

        let mut found = Vec::new();
        let mut stale = Vec::new();
        {
            let state = self.state.read();
            for entry in state.folder_graph.children_of(&parent.normalized()) {
                self.collect_resolved(&state, entry.relationship_id, wanted, &mut found, &mut stale);
            }
        }
        self.heal(stale);
        Ok(found)
    }

    /// Resolve the full relationship records of the folder parents of
    /// `child`. Stale edges are excluded and self-healed.
    pub fn parents(&self, child: &Locator) -> Vec<RelationshipData> {
        let mut found = Vec::new();
        let mut stale = Vec::new();
        {
            let state = self.state.read();
            for entry in state.folder_graph.parents_of(&child.normalized()) {
                self.collect_resolved(&state, entry.relationship_id, None, &mut found, &mut stale);
            }
        }
        self.heal(stale);
        found
    }

    /// Every folder descendant of `parent` in pre-order. Non-folder leaves
    /// are never included, and items missing from the directory are not
    /// descended into.
    pub fn folder_descendants(&self, parent: &Locator) -> Vec<Locator> {
        let state = self.state.read();
        let mut descendants = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![parent.normalized()];
        visited.insert(parent.normalized());

        while let Some(node) = stack.pop() {
            let children = state.folder_graph.children_of(&node);
            // Reverse push so the pre-order pops in child sort order.
            for entry in children.into_iter().rev() {
                if !visited.insert(entry.neighbor) {
                    continue;
                }
                if self
                    .directory
                    .item(entry.neighbor.id)
                    .is_some_and(|item| item.is_folder)
                {
                    stack.push(entry.neighbor);
                }
            }
            if node != parent.normalized() {
                descendants.push(node);
            }
        }
        descendants
    }

    /// Walk from the root matching each path segment's item name
    /// (case-insensitively) against children of the given relationship
    /// type. Returns the id of the last matched item, or -1 on the first
    /// unmatched segment.
    ///
    /// # Errors
    ///
    /// Returns an error if `type_name` is blank or `segments` is empty.
    pub fn id_by_path(&self, segments: &[&str], type_name: &str) -> Result<ContentId> {
        if segments.is_empty() {
            return Err(Error::invalid_argument("path segments may not be empty"));
        }
        let Some(config_id) = self.checked_config_id(type_name)? else {
            return Ok(-1);
        };

        let state = self.state.read();
        let mut current = self.root;
        for segment in segments {
            let next = state
                .folder_graph
                .children_of(&current)
                .into_iter()
                .find(|entry| {
                    state
                        .folder_details
                        .get(&entry.relationship_id)
                        .is_some_and(|d| d.config_id == config_id)
                        && self
                            .directory
                            .item(entry.neighbor.id)
                            .is_some_and(|item| item.name.to_lowercase() == segment.to_lowercase())
                });
            match next {
                Some(entry) => current = entry.neighbor,
                None => return Ok(-1),
            }
        }
        Ok(current.id)
    }

    // ========================================================================
    // Assembly (dependency) queries
    // ========================================================================

    /// Resolve the active-assembly children of `parent`, in sort-rank
    /// order, optionally filtered by slot id. Stale edges are excluded and
    /// self-healed.
    pub fn assembly_children(&self, parent: &Locator, slot_id: Option<i32>) -> Vec<RelationshipData> {
        let mut found = Vec::new();
        let mut stale = Vec::new();
        {
            let state = self.state.read();
            for entry in state.dependency_graph.children_of(parent) {
                self.collect_resolved(&state, entry.relationship_id, None, &mut found, &mut stale);
            }
        }
        self.heal(stale);
        match slot_id {
            Some(slot) => found.into_iter().filter(|d| d.slot_id == Some(slot)).collect(),
            None => found,
        }
    }

    /// Resolve the active-assembly relationships owning `dependent`,
    /// keeping only those whose owner revision matches one of the owner's
    /// current, tip, or public revisions. Stale edges are excluded and
    /// self-healed.
    pub fn assembly_parents(&self, dependent: &Locator) -> Vec<RelationshipData> {
        let mut found = Vec::new();
        let mut stale = Vec::new();
        {
            let state = self.state.read();
            for entry in state.dependency_graph.parents_of(dependent) {
                self.collect_resolved(&state, entry.relationship_id, None, &mut found, &mut stale);
            }
        }
        self.heal(stale);

        found
            .into_iter()
            .filter(|data| {
                let live = self
                    .directory
                    .item(data.owner.id)
                    .is_some_and(|owner| owner.is_live_revision(data.owner.revision));
                if !live {
                    debug!(
                        "excluding assembly relationship {}: owner {} is not a live revision",
                        data.id, data.owner
                    );
                }
                live
            })
            .collect()
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Snapshot of the cache's counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.read();
        CacheStats {
            folder_relationship_count: state.folder_details.len(),
            dependency_relationship_count: state.dependency_details.len(),
            folder_parent_count: state.folder_graph.parent_count(),
            folder_child_count: state.folder_graph.child_count(),
            dependency_parent_count: state.dependency_graph.parent_count(),
            dependency_child_count: state.dependency_graph.child_count(),
            started: state.started,
        }
    }

    // ========================================================================
    // Internals: insert & validation
    // ========================================================================

    fn check_relationship(data: &RelationshipData) -> Result<()> {
        if data.id <= 0 {
            return Err(Error::invalid_argument(format!(
                "relationship id must be positive, got {}",
                data.id
            )));
        }
        Ok(())
    }

    /// Insert a folder edge, validating only until the initial load has
    /// completed. Returns whether the edge was inserted.
    fn insert_folder_edge(&self, state: &mut CacheState, row: &RelationshipData) -> bool {
        if !state.started {
            if let Err(reason) = self.validate_folder_edge(state, row) {
                error!(
                    "rejecting folder relationship {} (parent {}, child {}): {}",
                    row.id, row.owner.id, row.dependent.id, reason
                );
                return false;
            }
        }
        state
            .folder_graph
            .add_edge(row.id, row.owner.normalized(), row.dependent.normalized(), None);
        state.folder_details.insert(
            row.id,
            FolderDetail {
                parent_id: row.owner.id,
                child_id: row.dependent.id,
                config_id: row.config_id,
            },
        );
        true
    }

    /// Insert a dependency edge, validating only until the initial load
    /// has completed. Returns whether the edge was inserted.
    fn insert_dependency_edge(&self, state: &mut CacheState, row: &RelationshipData) -> bool {
        if !state.started {
            if let Err(reason) = self.validate_dependency_edge(row) {
                error!(
                    "rejecting dependency relationship {} (owner {}, dependent {}): {}",
                    row.id, row.owner.id, row.dependent.id, reason
                );
                return false;
            }
        }
        state
            .dependency_graph
            .add_edge(row.id, row.owner, row.dependent, row.sort_rank);
        state.dependency_details.insert(row.id, row.clone());
        true
    }

    fn validate_folder_edge(&self, state: &CacheState, row: &RelationshipData) -> std::result::Result<(), String> {
        let parent = self
            .directory
            .item(row.owner.id)
            .ok_or_else(|| "parent does not exist in the item directory".to_string())?;
        if !parent.is_folder {
            return Err("parent is not a folder".to_string());
        }
        let child = self
            .directory
            .item(row.dependent.id)
            .ok_or_else(|| "child does not exist in the item directory".to_string())?;
        if row.dependent.id == self.root.id {
            return Err("the root folder cannot be a child".to_string());
        }
        if child.is_folder {
            let existing = state.folder_graph.parents_of(&row.dependent.normalized());
            if let Some(other) = existing.iter().find(|e| e.relationship_id != row.id) {
                return Err(format!("folder already has parent {}", other.neighbor.id));
            }
        }
        Ok(())
    }

    fn validate_dependency_edge(&self, row: &RelationshipData) -> std::result::Result<(), String> {
        let owner = self
            .directory
            .item(row.owner.id)
            .ok_or_else(|| "owner does not exist in the item directory".to_string())?;
        if owner.is_folder {
            return Err("owner must not be a folder".to_string());
        }
        if self.directory.item(row.dependent.id).is_none() {
            return Err("dependent does not exist in the item directory".to_string());
        }
        Ok(())
    }

    // ========================================================================
    // Internals: deletion, cleanup, self-healing
    // ========================================================================

    fn delete_folder_edge(state: &mut CacheState, id: RelationshipId, kind: Deletion) {
        if let Some(detail) = state.folder_details.remove(&id) {
            state
                .folder_graph
                .remove_edge(id, Locator::head(detail.parent_id), Locator::head(detail.child_id));
            match kind {
                Deletion::Normal => debug!("removed folder relationship {id}"),
                Deletion::Invalid => warn!(
                    "removed invalid folder relationship {} under unreachable parent {}",
                    id, detail.parent_id
                ),
                Deletion::Stale => warn!(
                    "removed stale folder relationship {}: child {} vanished from the item directory",
                    id, detail.child_id
                ),
            }
        }
    }

    fn delete_dependency_edge(state: &mut CacheState, id: RelationshipId, kind: Deletion) {
        if let Some(detail) = state.dependency_details.remove(&id) {
            state.dependency_graph.remove_edge(id, detail.owner, detail.dependent);
            match kind {
                Deletion::Normal => debug!("removed dependency relationship {id}"),
                Deletion::Invalid => warn!(
                    "removed invalid dependency relationship {} under unreachable owner {}",
                    id, detail.owner
                ),
                Deletion::Stale => warn!(
                    "removed stale dependency relationship {}: dependent {} vanished from the item directory",
                    id, detail.dependent
                ),
            }
        }
    }

    /// Prune every folder edge not reachable from the root, so the cached
    /// folder graph is always a forest rooted at the well-known root even
    /// if the store has cycles or disconnected fragments. Returns the
    /// number of edges removed.
    fn cleanup_folders(&self, state: &mut CacheState) -> usize {
        let mut visited = HashSet::new();
        let mut stack = vec![self.root];
        visited.insert(self.root);
        while let Some(node) = stack.pop() {
            for entry in state.folder_graph.children_of(&node) {
                if visited.insert(entry.neighbor) {
                    stack.push(entry.neighbor);
                }
            }
        }

        let invalid: Vec<Locator> = state
            .folder_graph
            .parent_keys()
            .into_iter()
            .filter(|key| !visited.contains(key))
            .collect();

        let mut removed = 0;
        for parent in invalid {
            for entry in state.folder_graph.children_of(&parent) {
                Self::delete_folder_edge(state, entry.relationship_id, Deletion::Invalid);
                removed += 1;
            }
        }
        removed
    }

    /// Reconstruct the full record behind a relationship id, detecting
    /// staleness against the item directory.
    fn resolve(&self, state: &CacheState, id: RelationshipId) -> Resolution {
        if let Some(detail) = state.folder_details.get(&id) {
            if self.directory.item(detail.child_id).is_none() {
                return Resolution::Stale;
            }
            return Resolution::Found(RelationshipData::new(
                id,
                detail.config_id,
                Locator::head(detail.parent_id),
                Locator::head(detail.child_id),
            ));
        }
        if let Some(detail) = state.dependency_details.get(&id) {
            if self.directory.item(detail.dependent.id).is_none() {
                return Resolution::Stale;
            }
            return Resolution::Found(detail.clone());
        }
        Resolution::Unknown
    }

    /// Resolve one adjacency entry into `found` (subject to the optional
    /// config filter) or record it in `stale` for healing.
    fn collect_resolved(
        &self,
        state: &CacheState,
        id: RelationshipId,
        wanted: Option<ConfigId>,
        found: &mut Vec<RelationshipData>,
        stale: &mut Vec<RelationshipId>,
    ) {
        match self.resolve(state, id) {
            Resolution::Found(data) => {
                if wanted.is_none_or(|w| data.config_id == w) {
                    found.push(data);
                }
            }
            Resolution::Stale => stale.push(id),
            Resolution::Unknown => debug!("adjacency entry for relationship {id} has no detail record"),
        }
    }

    /// Delete edges found stale during a read. Called with no lock held;
    /// re-checks staleness under the write lock so racing readers cannot
    /// double-delete or delete a concurrently re-inserted edge.
    fn heal(&self, stale: Vec<RelationshipId>) {
        if stale.is_empty() {
            return;
        }
        let mut state = self.state.write();
        for id in stale {
            if matches!(self.resolve(&state, id), Resolution::Stale) {
                if state.folder_details.contains_key(&id) {
                    Self::delete_folder_edge(&mut state, id, Deletion::Stale);
                } else {
                    Self::delete_dependency_edge(&mut state, id, Deletion::Stale);
                }
            }
        }
    }

    // ========================================================================
    // Internals: query helpers
    // ========================================================================

    /// Validate a relationship-type name and resolve it to a config id.
    /// Blank names are a caller error; unknown names resolve to `None`
    /// (queries degrade to empty results).
    fn checked_config_id(&self, type_name: &str) -> Result<Option<ConfigId>> {
        if type_name.trim().is_empty() {
            return Err(Error::invalid_argument("relationship type name may not be blank"));
        }
        let config_id = self.registry.config_id(type_name);
        if config_id.is_none() {
            debug!("unknown relationship type name: {type_name}");
        }
        Ok(config_id)
    }

    /// Which graph a typed traversal starts in, and with which input
    /// normalization: folder-like traversals are revision-independent.
    fn start_locator(&self, locator: &Locator, config_id: ConfigId) -> Locator {
        if self.is_folder_config(config_id) {
            locator.normalized()
        } else {
            *locator
        }
    }

    fn is_folder_config(&self, config_id: ConfigId) -> bool {
        self.registry
            .category(config_id)
            .is_some_and(|c| c.is_folder_like())
    }

    /// `paths_to_root` over the graph owning `config_id`, filtered to
    /// edges of exactly that configuration. Detail-lookup failures prune
    /// the branch; the cache self-heals such edges when a resolving read
    /// touches them.
    fn typed_paths(&self, state: &CacheState, start: &Locator, config_id: ConfigId) -> Vec<Vec<GraphEntry>> {
        if self.is_folder_config(config_id) {
            let matches = |id: RelationshipId| {
                state.folder_details.get(&id).map(|d| d.config_id) == Some(config_id)
            };
            state.folder_graph.paths_to_root(start, &matches)
        } else {
            let matches = |id: RelationshipId| {
                state.dependency_details.get(&id).map(|d| d.config_id) == Some(config_id)
            };
            state.dependency_graph.paths_to_root(start, &matches)
        }
    }

    fn render_path(&self, path: &[GraphEntry]) -> String {
        let mut names = Vec::with_capacity(path.len());
        for entry in path {
            match self.directory.item(entry.neighbor.id) {
                Some(item) => names.push(item.name),
                None => return String::new(),
            }
        }
        format!("/{}", names.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{
        self, MemoryItemDirectory, MemoryRelationshipStore, DEPENDENCY_CONFIG, FOLDER_CONFIG,
        RECYCLED_CONFIG,
    };

    const ROOT: ContentId = 1;
    const PAGE_TYPE: i32 = 311;

    fn folder_rel(id: RelationshipId, parent: ContentId, child: ContentId) -> RelationshipData {
        RelationshipData::new(id, FOLDER_CONFIG, Locator::head(parent), Locator::head(child))
    }

    fn create_directory() -> Arc<MemoryItemDirectory> {
        let directory = MemoryItemDirectory::new();
        directory.put_folder(1, "Root");
        directory.put_folder(2, "A");
        directory.put_folder(3, "B");
        directory.put_folder(4, "C");
        directory.put_item(10, "page", PAGE_TYPE);
        directory.put_item(11, "snippet-one", 312);
        directory.put_item(12, "snippet-two", 312);
        Arc::new(directory)
    }

    fn create_cache(directory: &Arc<MemoryItemDirectory>) -> RelationshipCache {
        RelationshipCache::new(directory.clone(), mock::standard_registry(), ROOT)
    }

    /// root -> A -> B -> C, relationship ids 101..103.
    fn chain_rows() -> Vec<RelationshipData> {
        vec![folder_rel(101, 1, 2), folder_rel(102, 2, 3), folder_rel(103, 3, 4)]
    }

    fn start_chain(cache: &RelationshipCache) -> LoadSummary {
        let store = MemoryRelationshipStore::with_rows(chain_rows(), Vec::new());
        cache.start(&store).unwrap()
    }

    #[test]
    fn test_start_loads_and_counts() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        let summary = start_chain(&cache);

        assert_eq!(summary.folder_loaded, 3);
        assert_eq!(summary.folder_skipped, 0);
        assert_eq!(summary.orphan_edges_removed, 0);

        let stats = cache.stats();
        assert!(stats.started);
        assert_eq!(stats.folder_relationship_count, 3);
        assert_eq!(stats.folder_parent_count, 3);
        assert_eq!(stats.folder_child_count, 3);
    }

    #[test]
    fn test_start_twice_fails() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        let store = MemoryRelationshipStore::new();
        assert!(matches!(cache.start(&store), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_queries_before_start_are_empty() {
        let directory = create_directory();
        let cache = create_cache(&directory);

        assert!(cache.child_locators(&Locator::head(1)).is_empty());
        assert!(cache.owner_locators(&Locator::head(4), "FolderContent").unwrap().is_empty());
        assert!(!cache.stats().started);
    }

    #[test]
    fn test_owner_locators_chain() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        let owners = cache.owner_locators(&Locator::head(4), "FolderContent").unwrap();
        assert_eq!(owners, vec![Locator::head(1), Locator::head(2), Locator::head(3)]);
    }

    #[test]
    fn test_root_has_no_parents() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        assert!(cache.parent_locators(&cache.root()).is_empty());
        assert!(cache.parents(&cache.root()).is_empty());
    }

    #[test]
    fn test_type_filter_truncates_not_skips() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        // A -> B uses the recycled config; root -> A and B -> C use folder.
        let rows = vec![
            folder_rel(101, 1, 2),
            RelationshipData::new(102, RECYCLED_CONFIG, Locator::head(2), Locator::head(3)),
            folder_rel(103, 3, 4),
        ];
        cache
            .start(&MemoryRelationshipStore::with_rows(rows, Vec::new()))
            .unwrap();

        // The mismatch one hop above B ends the branch; it is not skipped.
        let owners = cache.owner_locators(&Locator::head(4), "FolderContent").unwrap();
        assert_eq!(owners, vec![Locator::head(3)]);
    }

    #[test]
    fn test_id_by_path_end_to_end() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        assert_eq!(cache.id_by_path(&["A", "B", "C"], "FolderContent").unwrap(), 4);
        assert_eq!(cache.id_by_path(&["a", "b", "c"], "FolderContent").unwrap(), 4);
        assert_eq!(cache.id_by_path(&["A", "X"], "FolderContent").unwrap(), -1);

        // Deleting the middle link breaks both the path and the ancestry.
        cache.apply_delete(&folder_rel(102, 2, 3)).unwrap();
        assert_eq!(cache.id_by_path(&["A", "B", "C"], "FolderContent").unwrap(), -1);

        let owners = cache.owner_locators(&Locator::head(4), "FolderContent").unwrap();
        assert!(!owners.contains(&Locator::head(1)));
        assert!(!owners.contains(&Locator::head(2)));
        assert_eq!(owners, vec![Locator::head(3)]);
    }

    #[test]
    fn test_update_replaces_not_duplicates() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        // Move C from B to A.
        cache.apply_update(&folder_rel(103, 2, 4)).unwrap();

        assert_eq!(cache.parent_locators(&Locator::head(4)), vec![Locator::head(2)]);
        assert!(!cache.child_locators(&Locator::head(3)).contains(&Locator::head(4)));
        assert_eq!(cache.stats().folder_relationship_count, 3);
    }

    #[test]
    fn test_update_identical_is_noop() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);
        let before = cache.stats();

        cache.apply_update(&folder_rel(103, 3, 4)).unwrap();
        assert_eq!(cache.stats(), before);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        cache.apply_delete(&folder_rel(102, 2, 3)).unwrap();
        cache.apply_delete(&folder_rel(102, 2, 3)).unwrap();
        cache.apply_delete(&folder_rel(999, 2, 3)).unwrap();

        assert_eq!(cache.stats().folder_relationship_count, 2);
    }

    #[test]
    fn test_validation_rejects_multi_parent_folder() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        // Folder 3 would gain parents 1 and 2.
        let rows = vec![folder_rel(101, 1, 2), folder_rel(102, 1, 3), folder_rel(103, 2, 3)];
        let summary = cache
            .start(&MemoryRelationshipStore::with_rows(rows, Vec::new()))
            .unwrap();

        assert_eq!(summary.folder_loaded, 2);
        assert_eq!(summary.folder_skipped, 1);
        assert_eq!(cache.parent_locators(&Locator::head(3)), vec![Locator::head(1)]);
    }

    #[test]
    fn test_validation_rejects_bad_rows() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        let rows = vec![
            folder_rel(201, 10, 4), // parent is not a folder
            folder_rel(202, 2, 99), // child unknown to the directory
            folder_rel(203, 2, 1),  // root as a child
            folder_rel(204, 98, 4), // parent unknown to the directory
        ];
        let summary = cache
            .start(&MemoryRelationshipStore::with_rows(rows, Vec::new()))
            .unwrap();

        assert_eq!(summary.folder_loaded, 0);
        assert_eq!(summary.folder_skipped, 4);
    }

    #[test]
    fn test_validation_rejects_folder_dependency_owner() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        let dependency = vec![RelationshipData::new(
            301,
            DEPENDENCY_CONFIG,
            Locator::new(2, 1), // folder as owner
            Locator::head(11),
        )];
        let summary = cache
            .start(&MemoryRelationshipStore::with_rows(Vec::new(), dependency))
            .unwrap();

        assert_eq!(summary.dependency_loaded, 0);
        assert_eq!(summary.dependency_skipped, 1);
    }

    #[test]
    fn test_validation_skipped_after_start() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        // Mid-move: the new edge arrives before the old one is deleted.
        // C transiently has two parents; the cache tolerates it.
        cache.apply_update(&folder_rel(200, 2, 4)).unwrap();
        assert_eq!(cache.parent_locators(&Locator::head(4)).len(), 2);

        cache.apply_delete(&folder_rel(103, 3, 4)).unwrap();
        assert_eq!(cache.parent_locators(&Locator::head(4)), vec![Locator::head(2)]);
    }

    #[test]
    fn test_cleanup_prunes_orphan_subtree() {
        let directory = create_directory();
        directory.put_folder(50, "Lost");
        directory.put_folder(51, "Stranded");
        let cache = create_cache(&directory);

        let mut rows = chain_rows();
        rows.push(folder_rel(150, 50, 51)); // 50 is unreachable from root
        let summary = cache
            .start(&MemoryRelationshipStore::with_rows(rows, Vec::new()))
            .unwrap();

        assert_eq!(summary.folder_loaded, 4);
        assert_eq!(summary.orphan_edges_removed, 1);
        assert!(cache.child_locators(&Locator::head(50)).is_empty());
        assert_eq!(cache.stats().folder_relationship_count, 3);
    }

    #[test]
    fn test_self_healing_removes_stale_edge() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        // C vanishes from the directory behind the cache's back.
        directory.remove(4);

        let children = cache.children(&Locator::head(3), None).unwrap();
        assert!(children.is_empty());

        // The stale edge was deleted, not just filtered.
        assert!(cache.child_locators(&Locator::head(3)).is_empty());
        assert_eq!(cache.stats().folder_relationship_count, 2);
    }

    #[test]
    fn test_children_resolves_and_filters() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        let rows = vec![
            folder_rel(101, 1, 2),
            RelationshipData::new(110, RECYCLED_CONFIG, Locator::head(1), Locator::head(3)),
        ];
        cache
            .start(&MemoryRelationshipStore::with_rows(rows, Vec::new()))
            .unwrap();

        let all = cache.children(&Locator::head(1), None).unwrap();
        assert_eq!(all.len(), 2);

        let folders_only = cache.children(&Locator::head(1), Some("FolderContent")).unwrap();
        assert_eq!(folders_only.len(), 1);
        assert_eq!(folders_only[0].id, 101);
        assert_eq!(folders_only[0].dependent, Locator::head(2));

        let unknown = cache.children(&Locator::head(1), Some("NoSuchConfig")).unwrap();
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_assembly_children_order_and_slot_filter() {
        let directory = create_directory();
        directory.put_item(13, "snippet-three", 312);
        let cache = create_cache(&directory);
        let owner = Locator::new(10, 1);
        let dependency = vec![
            RelationshipData::new(301, DEPENDENCY_CONFIG, owner, Locator::head(11))
                .with_slot(501)
                .with_sort_rank(3),
            RelationshipData::new(302, DEPENDENCY_CONFIG, owner, Locator::head(12))
                .with_slot(501)
                .with_sort_rank(1),
            RelationshipData::new(303, DEPENDENCY_CONFIG, owner, Locator::head(13))
                .with_slot(502)
                .with_sort_rank(2),
        ];
        cache
            .start(&MemoryRelationshipStore::with_rows(Vec::new(), dependency))
            .unwrap();

        let children = cache.assembly_children(&owner, None);
        assert_eq!(children.iter().map(|d| d.id).collect::<Vec<_>>(), vec![302, 303, 301]);

        let slot = cache.assembly_children(&owner, Some(501));
        assert_eq!(slot.iter().map(|d| d.id).collect::<Vec<_>>(), vec![302, 301]);
    }

    #[test]
    fn test_assembly_parents_filters_dead_owner_revisions() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        let dependency = vec![
            // Owner revision 1 matches the item's current/tip revision.
            RelationshipData::new(301, DEPENDENCY_CONFIG, Locator::new(10, 1), Locator::head(11)),
            // Revision 5 matches nothing.
            RelationshipData::new(302, DEPENDENCY_CONFIG, Locator::new(10, 5), Locator::head(11)),
        ];
        cache
            .start(&MemoryRelationshipStore::with_rows(Vec::new(), dependency))
            .unwrap();

        let parents = cache.assembly_parents(&Locator::head(11));
        assert_eq!(parents.iter().map(|d| d.id).collect::<Vec<_>>(), vec![301]);
    }

    #[test]
    fn test_find_child_of_type() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        let rows = vec![
            folder_rel(101, 1, 2),
            folder_rel(102, 2, 10), // page item
            folder_rel(103, 2, 11), // snippet item
        ];
        cache
            .start(&MemoryRelationshipStore::with_rows(rows, Vec::new()))
            .unwrap();

        assert_eq!(
            cache.find_child_of_type(&Locator::head(2), &[PAGE_TYPE]),
            Some(Locator::head(10))
        );
        assert_eq!(cache.find_child_of_type(&Locator::head(2), &[999]), None);
    }

    #[test]
    fn test_folder_descendants_preorder_folders_only() {
        let directory = create_directory();
        directory.put_folder(5, "D");
        let cache = create_cache(&directory);
        let mut rows = chain_rows();
        rows.push(folder_rel(104, 3, 5)); // B -> D
        rows.push(folder_rel(105, 3, 10)); // B -> page (not a folder)
        cache
            .start(&MemoryRelationshipStore::with_rows(rows, Vec::new()))
            .unwrap();

        let descendants = cache.folder_descendants(&Locator::head(2));
        assert_eq!(
            descendants,
            vec![Locator::head(3), Locator::head(4), Locator::head(5)]
        );
    }

    #[test]
    fn test_parent_paths_renders_names() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        let paths = cache.parent_paths(&Locator::head(4), "FolderContent").unwrap();
        assert_eq!(paths, vec!["/Root/A/B".to_string()]);

        // A broken segment resets the whole path to empty.
        directory.remove(2);
        let paths = cache.parent_paths(&Locator::head(4), "FolderContent").unwrap();
        assert_eq!(paths, vec![String::new()]);
    }

    #[test]
    fn test_blank_type_name_rejected() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        assert!(matches!(
            cache.owner_locators(&Locator::head(4), "  "),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            cache.children(&Locator::head(1), Some("")),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            cache.id_by_path(&[], "FolderContent"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_type_name_degrades_to_empty() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        assert!(cache.owner_locators(&Locator::head(4), "NoSuch").unwrap().is_empty());
        assert_eq!(cache.id_by_path(&["A"], "NoSuch").unwrap(), -1);
    }

    #[test]
    fn test_invalid_relationship_id_rejected() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        assert!(matches!(
            cache.apply_update(&folder_rel(0, 1, 2)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            cache.apply_delete(&folder_rel(-3, 1, 2)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_config_ignored() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);
        let before = cache.stats();

        let foreign = RelationshipData::new(400, 77, Locator::head(2), Locator::head(4));
        cache.apply_update(&foreign).unwrap();
        cache.apply_delete(&foreign).unwrap();
        assert_eq!(cache.stats(), before);
    }

    #[test]
    fn test_apply_event_dispatch() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        let event = RelationshipEvent::Deleted(folder_rel(103, 3, 4));
        assert_eq!(event.relationship().id, 103);
        cache.apply(&event).unwrap();
        assert!(cache.parent_locators(&Locator::head(4)).is_empty());

        cache
            .apply(&RelationshipEvent::Updated(folder_rel(103, 3, 4)))
            .unwrap();
        assert_eq!(cache.parent_locators(&Locator::head(4)), vec![Locator::head(3)]);
    }

    #[test]
    fn test_stats_serialize() {
        let directory = create_directory();
        let cache = create_cache(&directory);
        start_chain(&cache);

        let value = serde_json::to_value(cache.stats()).unwrap();
        assert_eq!(value["folder_relationship_count"], 3);
        assert_eq!(value["started"], true);
    }

    #[test]
    fn test_concurrent_readers_with_writer() {
        let directory = create_directory();
        let cache = Arc::new(create_cache(&directory));
        start_chain(&cache);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for _ in 0..500 {
                    let owners = cache.owner_locators(&Locator::head(4), "FolderContent").unwrap();
                    // C always has a consistent ancestry ending at root.
                    if let Some(first) = owners.first() {
                        assert_eq!(*first, Locator::head(1));
                    }
                    let parents = cache.parent_locators(&Locator::head(4));
                    assert!(parents.len() <= 1);
                }
            }));
        }

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..200 {
                    let parent = if i % 2 == 0 { 2 } else { 3 };
                    cache.apply_update(&folder_rel(103, parent, 4)).unwrap();
                }
            })
        };

        for handle in handles {
            handle.join().unwrap();
        }
        writer.join().unwrap();

        // Last write moved C under B (odd final iteration).
        assert_eq!(cache.parent_locators(&Locator::head(4)), vec![Locator::head(3)]);
    }
}
