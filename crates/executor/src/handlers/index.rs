//! Index command handlers.

use vexil_core::{
    BackendKind, DistanceMetric, IndexSpec, IndexType, ReplicationConfig, ShardingConfig,
    TuningConfig,
};
use vexil_engine::{OptimizeKind, VectorEngine};

use crate::{Output, Result};

/// Handle `CreateIndex`; a missing backend falls back to the engine default.
pub fn create_index(
    engine: &VectorEngine,
    name: String,
    dimension: usize,
    metric: DistanceMetric,
    index_type: IndexType,
    backend: Option<String>,
    config: TuningConfig,
) -> Result<Output> {
    let backend = backend
        .map(|tag| BackendKind::parse(&tag))
        .unwrap_or_else(|| engine.config().default_backend_kind());
    let mut spec = IndexSpec::new(name, dimension, metric)
        .with_index_type(index_type)
        .with_backend(backend);
    spec.config = config;
    Ok(Output::Index(engine.create_index(spec)?))
}

/// Handle `DeleteIndex`.
pub fn delete_index(engine: &VectorEngine, name: String, force: bool) -> Result<Output> {
    Ok(Output::IndexDeleted(engine.delete_index(&name, force)?))
}

/// Handle `ListIndexes`.
pub fn list_indexes(
    engine: &VectorEngine,
    backend: Option<String>,
    include_stats: bool,
) -> Result<Output> {
    let backend = backend.map(|tag| BackendKind::parse(&tag));
    Ok(Output::Indexes(
        engine.list_indexes(backend.as_ref(), include_stats)?,
    ))
}

/// Handle `DescribeIndex`.
pub fn describe_index(engine: &VectorEngine, name: String) -> Result<Output> {
    Ok(Output::Index(engine.describe_index(&name)?))
}

/// Handle `IndexStats`.
pub fn index_stats(engine: &VectorEngine, name: String) -> Result<Output> {
    Ok(Output::IndexStats(engine.index_stats(&name)?))
}

/// Handle `ConfigureIndex`.
pub fn configure_index(
    engine: &VectorEngine,
    name: String,
    config: TuningConfig,
    apply_immediately: bool,
) -> Result<Output> {
    Ok(Output::Configured(engine.configure_index(
        &name,
        config,
        apply_immediately,
    )?))
}

/// Handle `ConfigureReplication`.
pub fn configure_replication(
    engine: &VectorEngine,
    name: String,
    replication: ReplicationConfig,
) -> Result<Output> {
    Ok(Output::Index(engine.configure_replication(&name, replication)?))
}

/// Handle `ConfigureSharding`.
pub fn configure_sharding(
    engine: &VectorEngine,
    name: String,
    sharding: ShardingConfig,
) -> Result<Output> {
    Ok(Output::Index(engine.configure_sharding(&name, sharding)?))
}

/// Handle `Reindex`.
pub fn reindex(
    engine: &VectorEngine,
    name: String,
    config: Option<TuningConfig>,
    preserve_data: bool,
) -> Result<Output> {
    Ok(Output::Reindexed(engine.reindex(&name, config, preserve_data)?))
}

/// Handle `OptimizeIndex`.
pub fn optimize_index(engine: &VectorEngine, name: String, kind: OptimizeKind) -> Result<Output> {
    Ok(Output::Optimized(engine.optimize_index(&name, kind)?))
}
