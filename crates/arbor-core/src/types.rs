//! Shared value types for the Arbor relationship cache.
//!
//! These are plain data types: item locators, item summaries, relationship
//! configurations, and the full relationship detail record exchanged with
//! the authoritative store. All of them derive `Serialize`/`Deserialize`
//! for diagnostics and transport.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric identifier of a content item or folder.
pub type ContentId = i32;

/// Numeric identifier of a relationship configuration.
pub type ConfigId = i32;

/// Numeric identifier of one relationship instance in the authoritative
/// store. The join key between graph edges and detail records.
pub type RelationshipId = i32;

// ============================================================================
// Locator
// ============================================================================

/// Identifies one node of the relationship graphs: an item id plus a
/// revision.
///
/// Folder membership is revision-independent, so folder-graph edges use the
/// revision-less form (see [`Locator::head`]); active-assembly edges are
/// revision-sensitive and keep the actual revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator {
    /// Item id.
    pub id: ContentId,
    /// Item revision, or [`Locator::REVISION_NONE`].
    pub revision: i32,
}

impl Locator {
    /// Sentinel revision for revision-independent locators.
    pub const REVISION_NONE: i32 = -1;

    /// Create a locator with an explicit revision.
    pub fn new(id: ContentId, revision: i32) -> Self {
        Self { id, revision }
    }

    /// Create a revision-less locator for the given item.
    pub fn head(id: ContentId) -> Self {
        Self {
            id,
            revision: Self::REVISION_NONE,
        }
    }

    /// This locator with the revision normalized to the sentinel.
    pub fn normalized(self) -> Self {
        Self::head(self.id)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.revision)
    }
}

// ============================================================================
// Item summary
// ============================================================================

/// Lightweight item metadata returned by the item directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Item id.
    pub id: ContentId,
    /// Item (display) name.
    pub name: String,
    /// Whether the item is a folder.
    pub is_folder: bool,
    /// Owning community id.
    pub community_id: i32,
    /// Content-type id.
    pub object_type: i32,
    /// Current (editable) revision.
    pub current_revision: i32,
    /// Tip revision.
    pub tip_revision: i32,
    /// Last public revision, if the item was ever published.
    pub public_revision: Option<i32>,
}

impl ItemSummary {
    /// Whether `revision` matches one of the item's current, tip, or
    /// public revisions.
    pub fn is_live_revision(&self, revision: i32) -> bool {
        revision == self.current_revision
            || revision == self.tip_revision
            || self.public_revision == Some(revision)
    }
}

// ============================================================================
// Relationship configuration
// ============================================================================

/// Closed set of relationship categories the cache tracks.
///
/// Resolved once at registry construction so that hot-path dispatch is an
/// enum compare, never a string compare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipCategory {
    /// Folder containment.
    Folder,
    /// Folder containment of recycled items.
    Recycled,
    /// Ordered active-assembly dependency.
    Dependency,
}

impl RelationshipCategory {
    /// Whether relationships of this category live in the folder graph.
    pub fn is_folder_like(self) -> bool {
        matches!(self, Self::Folder | Self::Recycled)
    }
}

/// One relationship configuration row: the name/category pair behind a
/// config id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    /// Configuration id.
    pub id: ConfigId,
    /// External configuration name (e.g. `"FolderContent"`).
    pub name: String,
    /// Resolved category tag.
    pub category: RelationshipCategory,
}

impl RelationshipConfig {
    /// Create a configuration row.
    pub fn new(id: ConfigId, name: impl Into<String>, category: RelationshipCategory) -> Self {
        Self {
            id,
            name: name.into(),
            category,
        }
    }
}

/// Immutable id/name lookup over the known relationship configurations.
///
/// Built once from the configuration rows; shared read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct ConfigRegistry {
    by_id: HashMap<ConfigId, RelationshipConfig>,
    by_name: HashMap<String, ConfigId>,
}

impl ConfigRegistry {
    /// Build a registry from configuration rows. Later rows win on
    /// duplicate ids or names.
    pub fn new(configs: impl IntoIterator<Item = RelationshipConfig>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for config in configs {
            by_name.insert(config.name.clone(), config.id);
            by_id.insert(config.id, config);
        }
        Self { by_id, by_name }
    }

    /// Look up a configuration by id.
    pub fn config(&self, id: ConfigId) -> Option<&RelationshipConfig> {
        self.by_id.get(&id)
    }

    /// Look up a configuration id by name.
    pub fn config_id(&self, name: &str) -> Option<ConfigId> {
        self.by_name.get(name).copied()
    }

    /// Category of a configuration, if known.
    pub fn category(&self, id: ConfigId) -> Option<RelationshipCategory> {
        self.by_id.get(&id).map(|c| c.category)
    }

    /// Name of a configuration, if known.
    pub fn name(&self, id: ConfigId) -> Option<&str> {
        self.by_id.get(&id).map(|c| c.name.as_str())
    }

    /// Number of registered configurations.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

// ============================================================================
// Relationship detail record
// ============================================================================

/// The full detail record for one relationship, as delivered by bulk-load
/// rows and change events and as returned from resolved queries.
///
/// Folder relationships populate only the id, config, owner, and dependent
/// fields; active-assembly relationships additionally carry slot, sort
/// rank, variant, folder, site, and inline/widget metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipData {
    /// Relationship id.
    pub id: RelationshipId,
    /// Configuration id.
    pub config_id: ConfigId,
    /// Owner (parent) locator.
    pub owner: Locator,
    /// Dependent (child) locator.
    pub dependent: Locator,
    /// Slot id, for assembly relationships.
    pub slot_id: Option<i32>,
    /// Sort rank within the slot.
    pub sort_rank: Option<i32>,
    /// Variant (template) id.
    pub variant_id: Option<i32>,
    /// Folder context id.
    pub folder_id: Option<ContentId>,
    /// Site context id.
    pub site_id: Option<i32>,
    /// Whether the relationship is an inline link.
    pub inline_link: bool,
    /// Widget instance name, if any.
    pub widget_name: Option<String>,
    /// Whether the row is persisted in the authoritative store.
    pub persisted: bool,
}

impl RelationshipData {
    /// Create a minimal record; assembly metadata starts unset.
    pub fn new(id: RelationshipId, config_id: ConfigId, owner: Locator, dependent: Locator) -> Self {
        Self {
            id,
            config_id,
            owner,
            dependent,
            slot_id: None,
            sort_rank: None,
            variant_id: None,
            folder_id: None,
            site_id: None,
            inline_link: false,
            widget_name: None,
            persisted: true,
        }
    }

    /// Set the slot id.
    pub fn with_slot(mut self, slot_id: i32) -> Self {
        self.slot_id = Some(slot_id);
        self
    }

    /// Set the sort rank.
    pub fn with_sort_rank(mut self, sort_rank: i32) -> Self {
        self.sort_rank = Some(sort_rank);
        self
    }

    /// Set the variant (template) id.
    pub fn with_variant(mut self, variant_id: i32) -> Self {
        self.variant_id = Some(variant_id);
        self
    }

    /// Set the folder context id.
    pub fn with_folder(mut self, folder_id: ContentId) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Set the site context id.
    pub fn with_site(mut self, site_id: i32) -> Self {
        self.site_id = Some(site_id);
        self
    }

    /// Mark the relationship as an inline link.
    pub fn with_inline_link(mut self, inline_link: bool) -> Self {
        self.inline_link = inline_link;
        self
    }

    /// Set the widget instance name.
    pub fn with_widget(mut self, widget_name: impl Into<String>) -> Self {
        self.widget_name = Some(widget_name.into());
        self
    }
}
