//! Error types for command execution.
//!
//! All errors from command execution are represented by the [`Error`] enum.
//! These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Serializable**: Can be converted to/from JSON
//! - **Lossless**: No error information is lost in conversion from engine errors

use serde::{Deserialize, Serialize};
use vexil_core::{ErrorKind, VectorError};

/// Command execution errors.
///
/// # Categories
///
/// | Category | Variants |
/// |----------|----------|
/// | Lookup | `NotFound`, `AlreadyExists` |
/// | Validation | `InvalidInput`, `DimensionMismatch` |
/// | State | `NotEmpty` |
/// | Backend | `BackendUnavailable` |
/// | System | `Io`, `Serialization`, `Corrupted`, `Internal` |
///
/// # Example
///
/// ```ignore
/// match executor.execute(cmd) {
///     Ok(output) => { /* handle success */ }
///     Err(Error::NotFound { kind, name }) => {
///         println!("{} '{}' not found", kind, name);
///     }
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum Error {
    // ==================== Lookup ====================
    /// Index, collection, vector or backup not found
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    /// Duplicate name or non-upsert duplicate id
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: String, name: String },

    // ==================== Validation ====================
    /// Missing or malformed input
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Vector length differs from the index dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // ==================== State ====================
    /// Delete blocked by remaining content
    #[error("{kind} '{name}' is not empty ({remaining} remaining)")]
    NotEmpty {
        kind: String,
        name: String,
        remaining: usize,
    },

    // ==================== Backend ====================
    /// Non-memory backend cannot serve the request
    #[error("backend '{backend}' unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    // ==================== System ====================
    /// I/O error
    #[error("I/O error: {reason}")]
    Io { reason: String },

    /// Serialization error
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// Backup blob failed an integrity check
    #[error("corrupted data: {reason}")]
    Corrupted { reason: String },

    /// Internal error (a batch task panicked)
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl Error {
    /// Taxonomy bucket of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Error::InvalidInput { .. } => ErrorKind::InvalidArgument,
            Error::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Error::NotEmpty { .. } => ErrorKind::NotEmpty,
            Error::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Error::Io { .. }
            | Error::Serialization { .. }
            | Error::Corrupted { .. }
            | Error::Internal { .. } => ErrorKind::Internal,
        }
    }
}

impl From<VectorError> for Error {
    fn from(e: VectorError) -> Self {
        match e {
            VectorError::InvalidArgument { reason } => Error::InvalidInput { reason },
            VectorError::NotFound { kind, name } => Error::NotFound {
                kind: kind.name().to_string(),
                name,
            },
            VectorError::AlreadyExists { kind, name } => Error::AlreadyExists {
                kind: kind.name().to_string(),
                name,
            },
            VectorError::DimensionMismatch { expected, got } => Error::DimensionMismatch {
                expected,
                actual: got,
            },
            VectorError::NotEmpty {
                kind,
                name,
                remaining,
            } => Error::NotEmpty {
                kind: kind.name().to_string(),
                name,
                remaining,
            },
            VectorError::BackendUnavailable { backend, reason } => {
                Error::BackendUnavailable { backend, reason }
            }
            VectorError::Serialization(reason) => Error::Serialization { reason },
            VectorError::Io(reason) => Error::Io { reason },
            VectorError::Corrupted(reason) => Error::Corrupted { reason },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization {
            reason: e.to_string(),
        }
    }
}
