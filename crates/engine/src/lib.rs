//! Embedded vector index engine for vexil
//!
//! This crate owns everything below the command surface:
//! - Vector heap and swappable index backends (memory, external)
//! - Index Manager: create/delete/configure/reindex/optimize
//! - Vector store operations and the batch pipeline
//! - Search: similarity, keyword, hybrid, filter, aggregation
//! - Bulk import/export with cooperative cancellation
//! - Collections and backup/restore
//! - Operation statistics and `vexil.toml` configuration
//!
//! All state lives in one [`VectorEngine`]; operations are methods on it,
//! implemented per concern in the modules below.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod backend;
pub mod backup;
pub mod bulk;
pub mod cancel;
pub mod clustering;
pub mod collection;
pub mod config;
pub mod distance;
pub mod engine;
pub mod heap;
pub mod index_ops;
pub mod search;
pub mod stats;
pub mod store;
pub mod vectors;

pub use aggregate::{
    AggregateGroup, AggregateKind, AggregateReport, AggregateRequest, AggregateResult, Cluster,
};
pub use backend::{
    BackendFactory, BackendStats, EntryRef, ExternalBackend, IndexBackend, PutOutcome,
};
pub use backup::{BackupInfo, BackupOptions, Compression, RestoreOptions, RestoreReport};
pub use bulk::{
    BulkOptions, BulkReport, ExportOptions, ExportReport, JsonLinesSink, JsonLinesSource,
    RecordSink, RecordSource, SourceRecord, VecSink, VecSource,
};
pub use cancel::{BulkProgress, CancellationToken, ProgressSnapshot};
pub use collection::{CollectionSpec, DeleteCollectionReport};
pub use config::{EngineConfig, CONFIG_FILE_NAME};
pub use engine::{IndexHandle, VectorEngine};
pub use index_ops::{
    ConfigFailure, ConfigureReport, DeleteIndexReport, IndexListing, IndexStats, OptimizeKind,
    OptimizeReport, PhaseReport, ReindexReport,
};
pub use search::{HybridMatch, HybridSearchRequest, SearchRequest};
pub use stats::{EngineStats, OperationStat, OperationSummary, StatsReport};
pub use store::MemoryBackend;
pub use vectors::{DeleteSelector, ListRequest, VectorPage, WriteReport};

// Re-export the shared types so callers need only this crate
pub use vexil_core::{
    metadata, BackendKind, CollectionInfo, DistanceMetric, ErrorKind, IndexInfo, IndexSpec,
    IndexStatus, IndexType, ItemFailure, Metadata, MetadataFilter, MetadataValue, NewVector,
    ReplicationConfig, ShardingConfig, Timestamp, TuningConfig, VectorEntry, VectorError,
    VectorMatch, VectorResult, VectorUpdate,
};
