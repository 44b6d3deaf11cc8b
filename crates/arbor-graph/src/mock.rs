//! In-memory mock collaborators for testing.
//!
//! Available to downstream crates behind the `test-utils` feature so
//! embedding applications can exercise the cache without a database.

use std::collections::HashMap;

use arbor_core::{
    ConfigRegistry, ContentId, ItemDirectory, ItemSummary, RelationshipCategory,
    RelationshipConfig, RelationshipData, RelationshipStore, Result,
};
use parking_lot::RwLock;

/// Content-type id used for folders by the mock directory.
pub const FOLDER_OBJECT_TYPE: i32 = 101;

/// An in-memory, mutable [`ItemDirectory`].
///
/// Items can be removed mid-test to simulate endpoints vanishing from the
/// directory (the stale-edge self-healing scenario).
#[derive(Debug, Default)]
pub struct MemoryItemDirectory {
    items: RwLock<HashMap<ContentId, ItemSummary>>,
}

impl MemoryItemDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item.
    pub fn put(&self, item: ItemSummary) {
        self.items.write().insert(item.id, item);
    }

    /// Insert a folder with defaults for everything but id and name.
    pub fn put_folder(&self, id: ContentId, name: impl Into<String>) {
        self.put(folder_summary(id, name));
    }

    /// Insert a non-folder item with defaults.
    pub fn put_item(&self, id: ContentId, name: impl Into<String>, object_type: i32) {
        self.put(item_summary(id, name, object_type));
    }

    /// Remove an item, simulating deletion from the authoritative store.
    pub fn remove(&self, id: ContentId) {
        self.items.write().remove(&id);
    }
}

impl ItemDirectory for MemoryItemDirectory {
    fn item(&self, id: ContentId) -> Option<ItemSummary> {
        self.items.read().get(&id).cloned()
    }
}

/// Build a folder [`ItemSummary`] with test defaults.
pub fn folder_summary(id: ContentId, name: impl Into<String>) -> ItemSummary {
    ItemSummary {
        id,
        name: name.into(),
        is_folder: true,
        community_id: 10,
        object_type: FOLDER_OBJECT_TYPE,
        current_revision: 1,
        tip_revision: 1,
        public_revision: None,
    }
}

/// Build a non-folder [`ItemSummary`] with test defaults.
pub fn item_summary(id: ContentId, name: impl Into<String>, object_type: i32) -> ItemSummary {
    ItemSummary {
        id,
        name: name.into(),
        is_folder: false,
        community_id: 10,
        object_type,
        current_revision: 1,
        tip_revision: 1,
        public_revision: None,
    }
}

/// A canned [`RelationshipStore`] serving fixed row sets.
#[derive(Debug, Default)]
pub struct MemoryRelationshipStore {
    /// Folder-category rows.
    pub folder: Vec<RelationshipData>,
    /// Dependency-category rows.
    pub dependency: Vec<RelationshipData>,
}

impl MemoryRelationshipStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store serving the given folder and dependency rows.
    pub fn with_rows(folder: Vec<RelationshipData>, dependency: Vec<RelationshipData>) -> Self {
        Self { folder, dependency }
    }
}

impl RelationshipStore for MemoryRelationshipStore {
    fn folder_relationships(&self) -> Result<Vec<RelationshipData>> {
        Ok(self.folder.clone())
    }

    fn dependency_relationships(&self) -> Result<Vec<RelationshipData>> {
        Ok(self.dependency.clone())
    }
}

/// Config id of the standard folder configuration ("FolderContent").
pub const FOLDER_CONFIG: i32 = 3;
/// Config id of the standard recycled configuration ("RecycledContent").
pub const RECYCLED_CONFIG: i32 = 6;
/// Config id of the standard dependency configuration ("LocalContent").
pub const DEPENDENCY_CONFIG: i32 = 9;

/// The registry most tests use: one configuration per category.
pub fn standard_registry() -> ConfigRegistry {
    ConfigRegistry::new([
        RelationshipConfig::new(FOLDER_CONFIG, "FolderContent", RelationshipCategory::Folder),
        RelationshipConfig::new(RECYCLED_CONFIG, "RecycledContent", RelationshipCategory::Recycled),
        RelationshipConfig::new(DEPENDENCY_CONFIG, "LocalContent", RelationshipCategory::Dependency),
    ])
}
