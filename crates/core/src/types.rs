//! Index, vector and collection types
//!
//! These types define the data model shared by the engine and the
//! executor. Scoring and storage logic lives in `vexil-engine`.

use crate::timestamp::Timestamp;
use crate::value::{Metadata, MetadataValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque algorithm-tuning map (`m`, `ef_construction`, `nlist`, ...)
pub type TuningConfig = BTreeMap<String, MetadataValue>;

/// Distance metric for similarity calculation
///
/// All metrics are normalized to "higher = more similar" so that ranking
/// always sorts descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity: dot(a,b) / (||a|| * ||b||)
    /// Range: [-1, 1]
    #[default]
    Cosine,

    /// Negated L2 distance
    /// Range: (-inf, 0], 0 for identical vectors
    Euclidean,

    /// Raw dot product
    /// Range: unbounded
    DotProduct,
}

impl DistanceMetric {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot_product",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Some(DistanceMetric::Cosine),
            "euclidean" | "l2" => Some(DistanceMetric::Euclidean),
            "dot_product" | "dot" | "inner_product" => Some(DistanceMetric::DotProduct),
            _ => None,
        }
    }
}

/// Index structure hint
///
/// Informational only: every index is searched exactly. The value and the
/// tuning config are stored and reported so an approximate backend can
/// pick them up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    /// Hierarchical navigable small world graph
    #[default]
    Hnsw,
    /// Inverted file with coarse quantizer
    Ivf,
    /// Flat (exhaustive) index
    Flat,
}

impl IndexType {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            IndexType::Hnsw => "hnsw",
            IndexType::Ivf => "ivf",
            IndexType::Flat => "flat",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hnsw" => Some(IndexType::Hnsw),
            "ivf" => Some(IndexType::Ivf),
            "flat" => Some(IndexType::Flat),
            _ => None,
        }
    }
}

/// Storage backend tag
///
/// `memory` implements the full contract in-process. Any other tag names an
/// external backend (`pinecone`, `weaviate`, ...) that is recorded as
/// configuration and answers data operations with `BackendUnavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackendKind {
    /// In-process memory backend
    #[default]
    Memory,
    /// External backend identified by tag
    External(String),
}

impl BackendKind {
    /// Backend tag
    pub fn name(&self) -> &str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::External(tag) => tag,
        }
    }

    /// Parse a backend tag (case-insensitive)
    pub fn parse(s: &str) -> Self {
        let tag = s.trim().to_lowercase();
        if tag == "memory" {
            BackendKind::Memory
        } else {
            BackendKind::External(tag)
        }
    }
}

impl From<String> for BackendKind {
    fn from(s: String) -> Self {
        BackendKind::parse(&s)
    }
}

impl From<BackendKind> for String {
    fn from(kind: BackendKind) -> Self {
        kind.name().to_string()
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Index lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    /// Serving reads and writes
    #[default]
    Active,
    /// An optimize pass is running
    Optimizing,
    /// Dropped; handles still held by in-flight operations see this
    Deleted,
}

/// Replication mode for the replication descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationMode {
    /// Writes acknowledged after all replicas apply
    #[default]
    Sync,
    /// Writes acknowledged by the primary only
    Async,
}

/// Replication descriptor (configuration state only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Number of copies, including the primary
    pub factor: u32,
    /// Acknowledgement mode
    #[serde(default)]
    pub mode: ReplicationMode,
}

/// Shard placement strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardStrategy {
    /// Hash of the vector id
    #[default]
    Hash,
    /// Contiguous id ranges
    Range,
}

/// Sharding descriptor (configuration state only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardingConfig {
    /// Number of shards
    pub shard_count: u32,
    /// Placement strategy
    #[serde(default)]
    pub strategy: ShardStrategy,
}

/// Parameters for creating an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Unique, immutable name
    pub name: String,
    /// Embedding dimension (> 0, immutable)
    pub dimension: usize,
    /// Similarity metric
    #[serde(default)]
    pub metric: DistanceMetric,
    /// Structure hint
    #[serde(default)]
    pub index_type: IndexType,
    /// Backend tag
    #[serde(default)]
    pub backend: BackendKind,
    /// Algorithm tuning
    #[serde(default)]
    pub config: TuningConfig,
}

impl IndexSpec {
    /// Memory-backed HNSW-tagged index with empty tuning config
    pub fn new(name: impl Into<String>, dimension: usize, metric: DistanceMetric) -> Self {
        IndexSpec {
            name: name.into(),
            dimension,
            metric,
            index_type: IndexType::default(),
            backend: BackendKind::Memory,
            config: TuningConfig::new(),
        }
    }

    /// Builder: set index type
    pub fn with_index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }

    /// Builder: set backend
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Builder: set one tuning key
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Index summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Index name
    pub name: String,
    /// Embedding dimension
    pub dimension: usize,
    /// Similarity metric
    pub metric: DistanceMetric,
    /// Structure hint
    pub index_type: IndexType,
    /// Backend tag
    pub backend: BackendKind,
    /// Active tuning config
    pub config: TuningConfig,
    /// Tuning keys staged for the next reindex / full optimize
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pending_config: TuningConfig,
    /// Lifecycle status
    pub status: IndexStatus,
    /// Live vector count
    pub vector_count: usize,
    /// Owning collection, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Replication descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication: Option<ReplicationConfig>,
    /// Sharding descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharding: Option<ShardingConfig>,
    /// Creation time
    pub created_at: Timestamp,
    /// Last configuration or content change
    pub updated_at: Timestamp,
}

/// Vector entry stored in an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    /// User-provided id (unique within the index)
    pub id: String,
    /// Embedding (empty when a read asked to omit vectors)
    pub vector: Vec<f32>,
    /// Metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation time
    pub created_at: Timestamp,
    /// Last update time
    pub updated_at: Timestamp,
}

impl VectorEntry {
    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Vector to insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVector {
    /// User-provided id
    pub id: String,
    /// Embedding
    pub vector: Vec<f32>,
    /// Metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewVector {
    /// Create a vector without metadata
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        NewVector {
            id: id.into(),
            vector,
            metadata: Metadata::new(),
        }
    }

    /// Builder: attach metadata
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Full or partial update of an existing vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorUpdate {
    /// Id of the vector to update
    pub id: String,
    /// Replacement embedding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// Replacement (or merged) metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Merge metadata keys into the existing map instead of replacing it
    #[serde(default)]
    pub merge_metadata: bool,
}

/// Search result entry
///
/// Score is always "higher = more similar" regardless of the metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Vector id
    pub id: String,
    /// Similarity score
    pub score: f32,
    /// Embedding, if requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// Metadata, if requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl VectorMatch {
    /// Create a bare match (no vector, no metadata)
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        VectorMatch {
            id: id.into(),
            score,
            vector: None,
            metadata: None,
        }
    }
}

/// Collection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// Normal operation
    #[default]
    Active,
}

/// Collection summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Creation-time configuration
    #[serde(default)]
    pub config: TuningConfig,
    /// Status
    pub status: CollectionStatus,
    /// Member index names, sorted
    pub indexes: Vec<String>,
    /// Creation time
    pub created_at: Timestamp,
}
