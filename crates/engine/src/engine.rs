//! VectorEngine: process-wide registry of indexes
//!
//! Indexes live in an arena of [`IndexSlot`]s keyed by stable
//! [`IndexHandle`]s. A name registry maps index names to handles. Each slot
//! owns its storage partition behind one single-writer/multi-reader lock,
//! which is the unit of isolation: operations on unrelated indexes never
//! contend.
//!
//! # Lock order
//!
//! `collections` -> `registry` -> slot state. `backups` is never held
//! together with a slot lock. No lock is held across stream or file I/O.
//!
//! The operations themselves are implemented in sibling modules as
//! additional `impl VectorEngine` blocks.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;
use vexil_core::{
    BackendKind, CollectionInfo, CollectionStatus, DistanceMetric, EntityKind, IndexInfo,
    IndexStatus, IndexType, ReplicationConfig, ShardingConfig, Timestamp, TuningConfig,
    VectorError, VectorResult,
};
use vexil_search::OverlapScorer;

use crate::backend::{BackendFactory, IndexBackend};
use crate::backup::BackupRecord;
use crate::config::EngineConfig;
use crate::stats::{EngineStats, OperationStat, StatsLog, StatsReport};

/// Stable arena key for an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexHandle(u64);

impl IndexHandle {
    /// Raw handle value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Index configuration held under the slot lock
#[derive(Debug, Clone)]
pub(crate) struct IndexMeta {
    pub name: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub index_type: IndexType,
    pub backend: BackendKind,
    pub config: TuningConfig,
    pub pending_config: TuningConfig,
    pub status: IndexStatus,
    pub replication: Option<ReplicationConfig>,
    pub sharding: Option<ShardingConfig>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl IndexMeta {
    pub fn info(&self, vector_count: usize, collection: Option<String>) -> IndexInfo {
        IndexInfo {
            name: self.name.clone(),
            dimension: self.dimension,
            metric: self.metric,
            index_type: self.index_type,
            backend: self.backend.clone(),
            config: self.config.clone(),
            pending_config: self.pending_config.clone(),
            status: self.status,
            vector_count,
            collection,
            replication: self.replication.clone(),
            sharding: self.sharding.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Configuration plus storage partition of one index
pub(crate) struct IndexState {
    pub meta: IndexMeta,
    pub store: Box<dyn IndexBackend>,
}

impl IndexState {
    /// Fail with `NotFound` if the index was dropped after the caller
    /// resolved its handle
    pub fn ensure_live(&self) -> VectorResult<()> {
        if self.meta.status == IndexStatus::Deleted {
            return Err(VectorError::not_found(EntityKind::Index, &self.meta.name));
        }
        Ok(())
    }

    pub fn info(&self, collection: Option<String>) -> IndexInfo {
        self.meta.info(self.store.len(), collection)
    }
}

/// Arena entry
pub(crate) struct IndexSlot {
    pub handle: IndexHandle,
    pub state: RwLock<IndexState>,
}

/// Collection bookkeeping
#[derive(Debug, Clone)]
pub(crate) struct CollectionRecord {
    pub name: String,
    pub description: String,
    pub config: TuningConfig,
    pub status: CollectionStatus,
    pub members: BTreeSet<String>,
    pub created_at: Timestamp,
}

impl CollectionRecord {
    pub fn info(&self) -> CollectionInfo {
        CollectionInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            config: self.config.clone(),
            status: self.status,
            indexes: self.members.iter().cloned().collect(),
            created_at: self.created_at,
        }
    }
}

/// All collections plus the reverse index -> collection map
#[derive(Debug, Default)]
pub(crate) struct CollectionRegistry {
    pub collections: BTreeMap<String, CollectionRecord>,
    pub owners: HashMap<String, String>,
}

/// Embedded vector index and similarity-search engine
///
/// `VectorEngine` is `Send + Sync`; share it with `Arc` across threads.
pub struct VectorEngine {
    pub(crate) config: EngineConfig,
    pub(crate) factory: BackendFactory,
    pub(crate) registry: RwLock<BTreeMap<String, IndexHandle>>,
    pub(crate) arena: DashMap<IndexHandle, Arc<IndexSlot>>,
    next_handle: AtomicU64,
    pub(crate) collections: RwLock<CollectionRegistry>,
    pub(crate) backups: RwLock<BTreeMap<String, Arc<BackupRecord>>>,
    stats: StatsLog,
    pub(crate) scorer: OverlapScorer,
}

impl VectorEngine {
    /// Create an engine with the given configuration
    ///
    /// # Errors
    /// - `InvalidArgument` if the configuration fails validation
    pub fn new(config: EngineConfig) -> VectorResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create an engine from a `vexil.toml`, writing the default file first
    /// if it does not exist
    pub fn open_with_config_file(path: &Path) -> VectorResult<Self> {
        EngineConfig::write_default_if_missing(path)?;
        let config = EngineConfig::from_file(path)?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        VectorEngine {
            stats: StatsLog::new(config.stats_capacity),
            config,
            factory: BackendFactory,
            registry: RwLock::new(BTreeMap::new()),
            arena: DashMap::new(),
            next_handle: AtomicU64::new(1),
            collections: RwLock::new(CollectionRegistry::default()),
            backups: RwLock::new(BTreeMap::new()),
            scorer: OverlapScorer::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Internal plumbing
    // ========================================================================

    /// Run an operation and append its [`OperationStat`]
    pub(crate) fn track<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce() -> VectorResult<T>,
    ) -> VectorResult<T> {
        let timestamp = Timestamp::now();
        let start = Instant::now();
        let result = f();
        let duration_us = start.elapsed().as_micros() as u64;

        debug!(
            target: "vexil::engine",
            operation,
            duration_us,
            success = result.is_ok(),
            "operation completed"
        );

        self.stats.record(OperationStat {
            operation: operation.to_string(),
            timestamp,
            duration_us,
            success: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
        });
        result
    }

    pub(crate) fn allocate_handle(&self) -> IndexHandle {
        IndexHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a new slot; the caller holds the registry write lock and has
    /// checked the name is free
    pub(crate) fn install(
        &self,
        registry: &mut BTreeMap<String, IndexHandle>,
        meta: IndexMeta,
        store: Box<dyn IndexBackend>,
    ) -> Arc<IndexSlot> {
        let handle = self.allocate_handle();
        let name = meta.name.clone();
        let slot = Arc::new(IndexSlot {
            handle,
            state: RwLock::new(IndexState { meta, store }),
        });
        self.arena.insert(handle, Arc::clone(&slot));
        registry.insert(name, handle);
        slot
    }

    /// Resolve an index name to its slot
    pub(crate) fn slot(&self, name: &str) -> VectorResult<Arc<IndexSlot>> {
        let handle = self
            .registry
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| VectorError::not_found(EntityKind::Index, name))?;
        self.arena
            .get(&handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| VectorError::not_found(EntityKind::Index, name))
    }

    /// Run `f` under the index read lock
    pub(crate) fn read_index<T>(
        &self,
        name: &str,
        f: impl FnOnce(&IndexState) -> VectorResult<T>,
    ) -> VectorResult<T> {
        let slot = self.slot(name)?;
        let state = slot.state.read();
        state.ensure_live()?;
        f(&state)
    }

    /// Run `f` under the index write lock
    pub(crate) fn write_index<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut IndexState) -> VectorResult<T>,
    ) -> VectorResult<T> {
        let slot = self.slot(name)?;
        let mut state = slot.state.write();
        state.ensure_live()?;
        f(&mut state)
    }

    /// Collection owning an index, if any
    pub(crate) fn collection_of(&self, index: &str) -> Option<String> {
        self.collections.read().owners.get(index).cloned()
    }

    /// All live slots in name order
    pub(crate) fn slots_by_name(&self) -> Vec<(String, Arc<IndexSlot>)> {
        let registry = self.registry.read();
        registry
            .iter()
            .filter_map(|(name, handle)| {
                self.arena
                    .get(handle)
                    .map(|entry| (name.clone(), Arc::clone(entry.value())))
            })
            .collect()
    }

    // ========================================================================
    // Monitor
    // ========================================================================

    /// Aggregate operation statistics, optionally for one operation name
    pub fn operation_stats(&self, operation: Option<&str>) -> StatsReport {
        self.stats.report(operation)
    }

    /// Most recent operation records, newest first
    pub fn recent_operations(&self, limit: usize) -> Vec<OperationStat> {
        self.stats.recent(limit)
    }

    /// Drop all retained operation records
    pub fn clear_operation_stats(&self) {
        self.stats.clear();
    }

    /// Engine-wide counts
    pub fn engine_stats(&self) -> EngineStats {
        let collection_count = self.collections.read().collections.len();
        let slots = self.slots_by_name();
        let total_vectors = slots
            .iter()
            .map(|(_, slot)| {
                let state = slot.state.read();
                if state.meta.status == IndexStatus::Deleted {
                    0
                } else {
                    state.store.len()
                }
            })
            .sum();
        EngineStats {
            index_count: slots.len(),
            collection_count,
            backup_count: self.backups.read().len(),
            total_vectors,
        }
    }
}

impl Default for VectorEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

impl std::fmt::Debug for VectorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorEngine")
            .field("indexes", &self.registry.read().len())
            .field("config", &self.config)
            .finish()
    }
}
