//! Name, id and embedding validation
//!
//! Validation runs before any mutation. Whole-operation arguments (index or
//! collection names) fail the call; per-item arguments (vector ids and
//! embeddings) become per-item failures in batch reports.

use crate::error::{VectorError, VectorResult};

/// Maximum length of an index, collection or backup name
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length of a vector id
pub const MAX_VECTOR_ID_LENGTH: usize = 1024;

/// Hard upper bound on index dimension (the configured limit may be lower)
pub const MAX_DIMENSION: usize = 65_536;

fn validate_name(kind: &str, name: &str) -> VectorResult<()> {
    if name.is_empty() {
        return Err(VectorError::invalid(format!("{} name cannot be empty", kind)));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(VectorError::invalid(format!(
            "{} name cannot exceed {} characters",
            kind, MAX_NAME_LENGTH
        )));
    }

    // Forbidden characters that would break paths and key encodings
    if name.contains('/') {
        return Err(VectorError::invalid(format!(
            "{} name cannot contain '/'",
            kind
        )));
    }

    if name.contains('\0') {
        return Err(VectorError::invalid(format!(
            "{} name cannot contain null bytes",
            kind
        )));
    }

    // Reserved for internal use
    if name.starts_with('_') {
        return Err(VectorError::invalid(format!(
            "{} name cannot start with '_'",
            kind
        )));
    }

    Ok(())
}

/// Validate an index name
pub fn validate_index_name(name: &str) -> VectorResult<()> {
    validate_name("Index", name)
}

/// Validate a collection name
pub fn validate_collection_name(name: &str) -> VectorResult<()> {
    validate_name("Collection", name)
}

/// Validate a backup name
pub fn validate_backup_name(name: &str) -> VectorResult<()> {
    validate_name("Backup", name)
}

/// Validate a vector id
pub fn validate_vector_id(id: &str) -> VectorResult<()> {
    if id.is_empty() {
        return Err(VectorError::invalid("Vector id cannot be empty"));
    }

    if id.len() > MAX_VECTOR_ID_LENGTH {
        return Err(VectorError::invalid(format!(
            "Vector id cannot exceed {} characters",
            MAX_VECTOR_ID_LENGTH
        )));
    }

    if id.contains('\0') {
        return Err(VectorError::invalid("Vector id cannot contain null bytes"));
    }

    Ok(())
}

/// Validate an index dimension against a configured maximum
pub fn validate_dimension(dimension: usize, max: usize) -> VectorResult<()> {
    if dimension == 0 {
        return Err(VectorError::invalid("dimension must be greater than 0"));
    }
    let max = max.min(MAX_DIMENSION);
    if dimension > max {
        return Err(VectorError::invalid(format!(
            "dimension {} exceeds maximum {}",
            dimension, max
        )));
    }
    Ok(())
}

/// Validate an embedding against an index dimension
///
/// # Errors
/// - `DimensionMismatch` if the length differs from `dimension`
/// - `InvalidArgument` if any component is NaN or infinite
pub fn validate_embedding(embedding: &[f32], dimension: usize) -> VectorResult<()> {
    if embedding.len() != dimension {
        return Err(VectorError::DimensionMismatch {
            expected: dimension,
            got: embedding.len(),
        });
    }

    if let Some(pos) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(VectorError::invalid(format!(
            "embedding component {} is not finite",
            pos
        )));
    }

    Ok(())
}
