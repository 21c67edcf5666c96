//! Error types for the vexil engine
//!
//! Every engine operation returns [`VectorResult`]. The variants map onto a
//! small, closed taxonomy ([`ErrorKind`]) so that callers and adapters can
//! branch on the category without matching on message text.
//!
//! Per-item failures inside batch and bulk operations are NOT raised as
//! errors; they are carried as [`ItemFailure`] records in the operation
//! report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A named vector index
    Index,
    /// A vector entry inside an index
    Vector,
    /// A named collection of indexes
    Collection,
    /// A backup in the backup catalog
    Backup,
}

impl EntityKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Index => "index",
            EntityKind::Vector => "vector",
            EntityKind::Collection => "collection",
            EntityKind::Backup => "backup",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error category
///
/// | Kind | Meaning |
/// |------|---------|
/// | `InvalidArgument` | Missing/malformed input, caught before any mutation |
/// | `NotFound` | Unknown index, collection, vector or backup |
/// | `AlreadyExists` | Duplicate name or non-upsert duplicate id |
/// | `DimensionMismatch` | Vector length differs from the index dimension |
/// | `NotEmpty` | Delete blocked by remaining vectors or members |
/// | `BackendUnavailable` | Non-memory backend cannot serve the request |
/// | `Internal` | Serialization, I/O or integrity failure at a storage boundary |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed input
    InvalidArgument,
    /// Entity does not exist
    NotFound,
    /// Entity already exists
    AlreadyExists,
    /// Embedding length differs from index dimension
    DimensionMismatch,
    /// Delete blocked by remaining content
    NotEmpty,
    /// Backend cannot serve the request
    BackendUnavailable,
    /// Serialization, I/O or integrity failure
    Internal,
}

impl ErrorKind {
    /// Stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::DimensionMismatch => "dimension_mismatch",
            ErrorKind::NotEmpty => "not_empty",
            ErrorKind::BackendUnavailable => "backend_unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Errors returned by engine operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VectorError {
    /// Missing or malformed input
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// Why the input was rejected
        reason: String,
    },

    /// Entity was not found
    #[error("{kind} not found: {name}")]
    NotFound {
        /// Kind of entity
        kind: EntityKind,
        /// Entity name or id
        name: String,
    },

    /// Entity already exists
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// Kind of entity
        kind: EntityKind,
        /// Entity name or id
        name: String,
    },

    /// Embedding dimension doesn't match index configuration
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension of the index
        expected: usize,
        /// Length of the provided vector
        got: usize,
    },

    /// Delete refused because content remains
    #[error("{kind} '{name}' is not empty ({remaining} remaining)")]
    NotEmpty {
        /// Kind of entity being deleted
        kind: EntityKind,
        /// Entity name
        name: String,
        /// Vectors (for an index) or member indexes (for a collection) left
        remaining: usize,
    },

    /// External backend cannot serve the request
    #[error("Backend '{backend}' unavailable: {reason}")]
    BackendUnavailable {
        /// Backend tag
        backend: String,
        /// Reason reported by the backend
        reason: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error (backup files, bulk streams)
    #[error("IO error: {0}")]
    Io(String),

    /// Stored data failed an integrity check
    #[error("Corrupted data: {0}")]
    Corrupted(String),
}

impl VectorError {
    /// Shorthand for [`VectorError::InvalidArgument`]
    pub fn invalid(reason: impl Into<String>) -> Self {
        VectorError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`VectorError::NotFound`]
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        VectorError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for [`VectorError::AlreadyExists`]
    pub fn already_exists(kind: EntityKind, name: impl Into<String>) -> Self {
        VectorError::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Taxonomy category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VectorError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            VectorError::NotFound { .. } => ErrorKind::NotFound,
            VectorError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            VectorError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            VectorError::NotEmpty { .. } => ErrorKind::NotEmpty,
            VectorError::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            VectorError::Serialization(_) | VectorError::Io(_) | VectorError::Corrupted(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Check if this error indicates a missing entity
    pub fn is_not_found(&self) -> bool {
        matches!(self, VectorError::NotFound { .. })
    }

    /// Check if this error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            VectorError::InvalidArgument { .. } | VectorError::DimensionMismatch { .. }
        )
    }
}

impl From<std::io::Error> for VectorError {
    fn from(e: std::io::Error) -> Self {
        VectorError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(e: serde_json::Error) -> Self {
        VectorError::Serialization(e.to_string())
    }
}

/// Result type alias for engine operations
pub type VectorResult<T> = Result<T, VectorError>;

/// Failure of a single item inside a batch or bulk operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// Id of the vector the failure refers to (may be empty for unparsable records)
    pub id: String,
    /// Error category
    pub kind: ErrorKind,
    /// Rendered error message
    pub message: String,
}

impl ItemFailure {
    /// Build a failure record from an error
    pub fn new(id: impl Into<String>, error: &VectorError) -> Self {
        ItemFailure {
            id: id.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
