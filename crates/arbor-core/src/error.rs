//! Error types for Arbor operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across the Arbor crates. Uses `thiserror` for derive macros.
//!
//! Data-quality problems inherited from the authoritative store (stale
//! edges, orphan subtrees, unresolvable items) are deliberately *not*
//! represented here: the cache degrades to empty results and logs a
//! diagnostic instead of failing the caller. `Error` covers caller
//! mistakes and bulk-store failures only.

use thiserror::Error;

/// Errors that can occur in Arbor operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument was missing, blank, or out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bulk relationship store failed.
    #[error("Store error: {0}")]
    Store(String),
}

impl Error {
    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

/// Result type alias using Arbor's Error type.
pub type Result<T> = std::result::Result<T, Error>;
