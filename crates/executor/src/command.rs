//! Command enum defining all vexil operations.
//!
//! Commands are the "instruction set" of the engine. Every operation a
//! caller can perform is represented as a variant of this enum.
//!
//! Commands are:
//! - **Self-contained**: All parameters needed for execution are in the variant
//! - **Serializable**: JSON objects tagged by `"op"`
//! - **Pure data**: No closures, streams or file handles
//!
//! Bulk import/export and backup file transfer take streams or paths and are
//! called on [`VectorEngine`](vexil_engine::VectorEngine) directly.

use serde::{Deserialize, Serialize};
use vexil_core::{
    DistanceMetric, IndexType, MetadataFilter, NewVector, ReplicationConfig, ShardingConfig,
    TuningConfig, VectorUpdate,
};
use vexil_engine::{AggregateRequest, Compression, OptimizeKind};

fn default_true() -> bool {
    true
}

fn default_top_k() -> usize {
    10
}

fn default_list_limit() -> usize {
    100
}

/// A command is a self-contained, serializable operation.
///
/// # Command Categories
///
/// | Category | Count | Description |
/// |----------|-------|-------------|
/// | Index | 10 | Index lifecycle and configuration |
/// | Vector | 7 | Vector CRUD and batch writes |
/// | Search | 5 | Similarity, keyword, hybrid, filter, aggregate |
/// | Collection | 6 | Collection grouping |
/// | Backup | 5 | Backup catalog and restore |
/// | Monitor | 5 | Liveness and statistics |
///
/// # Example
///
/// ```ignore
/// use vexil_executor::Command;
///
/// let cmd: Command = serde_json::from_str(
///     r#"{"op": "search", "index": "docs", "vector": [0.1, 0.2], "top_k": 5}"#,
/// )?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    // ==================== Index (10) ====================
    /// Create an index.
    /// Returns: `Output::Index`
    CreateIndex {
        name: String,
        dimension: usize,
        #[serde(default)]
        metric: DistanceMetric,
        #[serde(default)]
        index_type: IndexType,
        /// Backend tag; the engine's `default_backend` when omitted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        backend: Option<String>,
        #[serde(default)]
        config: TuningConfig,
    },

    /// Delete an index.
    /// Returns: `Output::IndexDeleted`
    DeleteIndex {
        name: String,
        #[serde(default)]
        force: bool,
    },

    /// List indexes in name order.
    /// Returns: `Output::Indexes`
    ListIndexes {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        backend: Option<String>,
        #[serde(default)]
        include_stats: bool,
    },

    /// Describe one index.
    /// Returns: `Output::Index`
    DescribeIndex { name: String },

    /// Storage statistics for one index.
    /// Returns: `Output::IndexStats`
    IndexStats { name: String },

    /// Patch the tuning config.
    /// Returns: `Output::Configured`
    ConfigureIndex {
        name: String,
        config: TuningConfig,
        #[serde(default = "default_true")]
        apply_immediately: bool,
    },

    /// Record a replication descriptor.
    /// Returns: `Output::Index`
    ConfigureReplication {
        name: String,
        replication: ReplicationConfig,
    },

    /// Record a sharding descriptor.
    /// Returns: `Output::Index`
    ConfigureSharding {
        name: String,
        sharding: ShardingConfig,
    },

    /// Rebuild the storage partition.
    /// Returns: `Output::Reindexed`
    Reindex {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        config: Option<TuningConfig>,
        #[serde(default = "default_true")]
        preserve_data: bool,
    },

    /// Run an optimization pass.
    /// Returns: `Output::Optimized`
    OptimizeIndex {
        name: String,
        #[serde(default)]
        kind: OptimizeKind,
    },

    // ==================== Vector (7) ====================
    /// Insert vectors in batches.
    /// Returns: `Output::Written`
    InsertVectors {
        index: String,
        vectors: Vec<NewVector>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        batch_size: Option<usize>,
        #[serde(default)]
        upsert: bool,
    },

    /// Update existing vectors in batches.
    /// Returns: `Output::Written`
    UpdateVectors {
        index: String,
        updates: Vec<VectorUpdate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        batch_size: Option<usize>,
    },

    /// Delete by ids, by filter, or everything; exactly one mode.
    /// Returns: `Output::Written`
    DeleteVectors {
        index: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ids: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<MetadataFilter>,
        #[serde(default)]
        confirm_delete_all: bool,
    },

    /// Get one vector.
    /// Returns: `Output::Vector`
    GetVector {
        index: String,
        id: String,
        #[serde(default = "default_true")]
        include_vector: bool,
    },

    /// Check whether a vector exists.
    /// Returns: `Output::Bool`
    VectorExists { index: String, id: String },

    /// Page through vectors in insertion order.
    /// Returns: `Output::VectorPage`
    ListVectors {
        index: String,
        #[serde(default = "default_list_limit")]
        limit: usize,
        #[serde(default)]
        offset: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<MetadataFilter>,
        #[serde(default)]
        include_vectors: bool,
    },

    /// Count vectors, optionally matching a filter.
    /// Returns: `Output::Count`
    CountVectors {
        index: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<MetadataFilter>,
    },

    // ==================== Search (5) ====================
    /// Top-k similarity search.
    /// Returns: `Output::Matches`
    Search {
        index: String,
        vector: Vec<f32>,
        #[serde(default = "default_top_k")]
        top_k: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<MetadataFilter>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        score_threshold: Option<f32>,
        #[serde(default)]
        include_vectors: bool,
        #[serde(default = "default_true")]
        include_metadata: bool,
    },

    /// Keyword search over metadata text.
    /// Returns: `Output::Matches`
    KeywordSearch {
        index: String,
        text: String,
        #[serde(default = "default_top_k")]
        top_k: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<MetadataFilter>,
    },

    /// Weighted vector + keyword search.
    /// Returns: `Output::HybridMatches`
    HybridSearch {
        index: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vector: Option<Vec<f32>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default = "default_top_k")]
        top_k: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vector_weight: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text_weight: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<MetadataFilter>,
    },

    /// Entries matching a metadata filter.
    /// Returns: `Output::Entries`
    FilterVectors {
        index: String,
        filter: MetadataFilter,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<usize>,
        #[serde(default)]
        include_vectors: bool,
    },

    /// Centroid, stats or clustering over matching embeddings.
    /// Returns: `Output::Aggregate`
    AggregateVectors {
        index: String,
        aggregation: AggregateRequest,
    },

    // ==================== Collection (6) ====================
    /// Create a collection.
    /// Returns: `Output::Collection`
    CreateCollection {
        name: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        config: TuningConfig,
        #[serde(default)]
        indexes: Vec<String>,
    },

    /// Delete a collection.
    /// Returns: `Output::CollectionDeleted`
    DeleteCollection {
        name: String,
        #[serde(default)]
        delete_indexes: bool,
        #[serde(default)]
        force: bool,
    },

    /// List collections in name order.
    /// Returns: `Output::Collections`
    ListCollections,

    /// Describe one collection.
    /// Returns: `Output::Collection`
    DescribeCollection { name: String },

    /// Add an index to a collection.
    /// Returns: `Output::Collection`
    AddIndexToCollection { collection: String, index: String },

    /// Detach an index from a collection.
    /// Returns: `Output::Collection`
    RemoveIndexFromCollection { collection: String, index: String },

    // ==================== Backup (5) ====================
    /// Snapshot an index into the backup catalog.
    /// Returns: `Output::Backup`
    BackupIndex {
        index: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default = "default_true")]
        include_vectors: bool,
        #[serde(default)]
        compression: Compression,
    },

    /// Restore a backup into a new or existing index.
    /// Returns: `Output::Restored`
    RestoreIndex {
        backup: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        #[serde(default)]
        overwrite_existing: bool,
    },

    /// List backups in name order.
    /// Returns: `Output::Backups`
    ListBackups,

    /// Describe one backup.
    /// Returns: `Output::Backup`
    DescribeBackup { name: String },

    /// Drop a backup.
    /// Returns: `Output::Backup`
    DeleteBackup { name: String },

    // ==================== Monitor (5) ====================
    /// Liveness check.
    /// Returns: `Output::Pong`
    Ping,

    /// Aggregate operation statistics.
    /// Returns: `Output::OperationStats`
    OperationStats {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Most recent operation records.
    /// Returns: `Output::Operations`
    RecentOperations {
        #[serde(default = "default_list_limit")]
        limit: usize,
    },

    /// Drop retained operation records.
    /// Returns: `Output::Unit`
    ClearOperationStats,

    /// Engine-wide counts.
    /// Returns: `Output::EngineStats`
    EngineStats,
}

impl Command {
    /// Operation name, as it appears in the `"op"` tag
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateIndex { .. } => "create_index",
            Command::DeleteIndex { .. } => "delete_index",
            Command::ListIndexes { .. } => "list_indexes",
            Command::DescribeIndex { .. } => "describe_index",
            Command::IndexStats { .. } => "index_stats",
            Command::ConfigureIndex { .. } => "configure_index",
            Command::ConfigureReplication { .. } => "configure_replication",
            Command::ConfigureSharding { .. } => "configure_sharding",
            Command::Reindex { .. } => "reindex",
            Command::OptimizeIndex { .. } => "optimize_index",
            Command::InsertVectors { .. } => "insert_vectors",
            Command::UpdateVectors { .. } => "update_vectors",
            Command::DeleteVectors { .. } => "delete_vectors",
            Command::GetVector { .. } => "get_vector",
            Command::VectorExists { .. } => "vector_exists",
            Command::ListVectors { .. } => "list_vectors",
            Command::CountVectors { .. } => "count_vectors",
            Command::Search { .. } => "search",
            Command::KeywordSearch { .. } => "keyword_search",
            Command::HybridSearch { .. } => "hybrid_search",
            Command::FilterVectors { .. } => "filter_vectors",
            Command::AggregateVectors { .. } => "aggregate_vectors",
            Command::CreateCollection { .. } => "create_collection",
            Command::DeleteCollection { .. } => "delete_collection",
            Command::ListCollections => "list_collections",
            Command::DescribeCollection { .. } => "describe_collection",
            Command::AddIndexToCollection { .. } => "add_index_to_collection",
            Command::RemoveIndexFromCollection { .. } => "remove_index_from_collection",
            Command::BackupIndex { .. } => "backup_index",
            Command::RestoreIndex { .. } => "restore_index",
            Command::ListBackups => "list_backups",
            Command::DescribeBackup { .. } => "describe_backup",
            Command::DeleteBackup { .. } => "delete_backup",
            Command::Ping => "ping",
            Command::OperationStats { .. } => "operation_stats",
            Command::RecentOperations { .. } => "recent_operations",
            Command::ClearOperationStats => "clear_operation_stats",
            Command::EngineStats => "engine_stats",
        }
    }

    /// True for commands that never mutate engine state
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Command::ListIndexes { .. }
                | Command::DescribeIndex { .. }
                | Command::IndexStats { .. }
                | Command::GetVector { .. }
                | Command::VectorExists { .. }
                | Command::ListVectors { .. }
                | Command::CountVectors { .. }
                | Command::Search { .. }
                | Command::KeywordSearch { .. }
                | Command::HybridSearch { .. }
                | Command::FilterVectors { .. }
                | Command::AggregateVectors { .. }
                | Command::ListCollections
                | Command::DescribeCollection { .. }
                | Command::ListBackups
                | Command::DescribeBackup { .. }
                | Command::Ping
                | Command::OperationStats { .. }
                | Command::RecentOperations { .. }
                | Command::EngineStats
        )
    }
}
