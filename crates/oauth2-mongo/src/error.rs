//! Error types for the OAuth stores.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use std::time::Duration;

use mongodb::error::{ErrorKind, WriteFailure};

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors returned by the client and token stores.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// No document with the given id
    #[error("{collection}: no document with id {id:?}")]
    NotFound {
        /// Collection that was searched
        collection: String,
        /// Missing id
        id: String,
    },

    /// Insert collided with an existing id
    #[error("{collection}: duplicate id {id:?}")]
    DuplicateKey {
        /// Collection the insert targeted
        collection: String,
        /// Colliding id
        id: String,
    },

    /// Transport, session or transaction fault from the driver
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Token record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation exceeded its deadline
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Token record cannot be stored as given
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl StoreError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a duplicate key error.
    #[must_use]
    pub fn duplicate_key(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateKey {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Classify a failed insert, turning unique index violations into [`StoreError::DuplicateKey`].
    #[must_use]
    pub fn from_insert(err: mongodb::error::Error, collection: &str, id: &str) -> Self {
        if is_duplicate_key(&err) {
            Self::duplicate_key(collection, id)
        } else {
            Self::Database(err)
        }
    }

    /// Returns true for lookup misses.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for insert collisions.
    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }

    /// Returns true for connectivity and transaction faults.
    #[must_use]
    pub const fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Timeout(_))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
