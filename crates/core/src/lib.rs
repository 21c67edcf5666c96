//! Core types for the vexil vector engine
//!
//! This crate defines the data model shared across the workspace:
//! - Error taxonomy: `VectorError`, `ErrorKind`, per-item `ItemFailure`
//! - Metadata values and filters: `MetadataValue`, `MetadataFilter`
//! - Index, vector and collection types
//! - Timestamps and name/embedding validation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod limits;
pub mod timestamp;
pub mod types;
pub mod value;

pub use error::{EntityKind, ErrorKind, ItemFailure, VectorError, VectorResult};
pub use filter::{matches_opt, FilterCondition, FilterOp, MetadataFilter};
pub use limits::{
    validate_backup_name, validate_collection_name, validate_dimension, validate_embedding,
    validate_index_name, validate_vector_id, MAX_DIMENSION, MAX_NAME_LENGTH,
    MAX_VECTOR_ID_LENGTH,
};
pub use timestamp::Timestamp;
pub use types::{
    BackendKind, CollectionInfo, CollectionStatus, DistanceMetric, IndexInfo, IndexSpec,
    IndexStatus, IndexType, NewVector, ReplicationConfig, ReplicationMode, ShardStrategy,
    ShardingConfig, TuningConfig, VectorEntry, VectorMatch, VectorUpdate,
};
pub use value::{metadata, Metadata, MetadataValue};
