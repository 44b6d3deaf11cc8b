//! Arbor Core — shared types, identifiers, errors, and collaborator traits.
//!
//! This crate provides the foundational types used by the Arbor relationship
//! cache. It has no internal Arbor dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`types`]: Locators, item summaries, relationship configurations and
//!   detail records
//! - [`traits`]: Seams to the item directory and the bulk relationship store

pub mod error;
pub mod traits;
pub mod types;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use traits::{ItemDirectory, RelationshipStore};
pub use types::{
    ConfigId, ConfigRegistry, ContentId, ItemSummary, Locator, RelationshipCategory,
    RelationshipConfig, RelationshipData, RelationshipId,
};
