//! Index Manager: index configuration lifecycle
//!
//! create / delete / list / describe / configure / reindex / optimize.
//! Reindex and optimize build the replacement storage while holding an
//! upgradable read lock (readers continue against the old state, writers
//! wait), then upgrade to the writer lock only for the swap.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{RwLockUpgradableReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vexil_core::{
    validate_dimension, validate_index_name, BackendKind, DistanceMetric, EntityKind, IndexInfo,
    IndexSpec, IndexStatus, IndexType, MetadataValue, ReplicationConfig, ShardingConfig,
    Timestamp, TuningConfig, VectorError, VectorResult,
};

use crate::backend::{BackendFactory, IndexBackend};
use crate::cancel::CancellationToken;
use crate::engine::{
    CollectionRegistry, IndexHandle, IndexMeta, IndexSlot, IndexState, VectorEngine,
};

/// Tuning keys that must be positive integers
const POSITIVE_INT_KEYS: &[&str] = &["m", "ef_construction", "ef_search", "nlist", "nprobe"];

/// Keys fixed at creation
const IMMUTABLE_KEYS: &[&str] = &["dimension", "metric"];

/// `NotEmpty` unless the index holds no vectors or `force` is set
pub(crate) fn ensure_deletable(state: &IndexState, force: bool) -> VectorResult<()> {
    let remaining = state.store.len();
    if remaining > 0 && !force {
        return Err(VectorError::NotEmpty {
            kind: EntityKind::Index,
            name: state.meta.name.clone(),
            remaining,
        });
    }
    Ok(())
}

/// Result of `delete_index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteIndexReport {
    /// Deleted index
    pub name: String,
    /// Vectors dropped with the index
    pub deleted_vector_count: usize,
}

/// Per-index storage statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Index name
    pub name: String,
    /// Live vector count
    pub vector_count: usize,
    /// Embedding dimension
    pub dimension: usize,
    /// Similarity metric
    pub metric: DistanceMetric,
    /// Structure hint
    pub index_type: IndexType,
    /// Backend tag
    pub backend: BackendKind,
    /// Live storage slots
    pub live_slots: usize,
    /// Deleted slots awaiting compaction
    pub free_slots: usize,
    /// Approximate memory footprint
    pub memory_bytes: usize,
    /// Tuning keys staged for the next reindex / full optimize
    pub pending_config_keys: Vec<String>,
}

/// Entry returned by `list_indexes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexListing {
    /// Summary
    #[serde(flatten)]
    pub info: IndexInfo,
    /// Storage statistics, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<IndexStats>,
}

/// A tuning key that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFailure {
    /// Key
    pub key: String,
    /// Why it was rejected
    pub reason: String,
}

/// Result of `configure_index`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigureReport {
    /// Tuning config before the call
    pub old_config: TuningConfig,
    /// Tuning config after the call
    pub new_config: TuningConfig,
    /// Keys applied to the active config
    pub applied_changes: Vec<String>,
    /// Keys staged for the next reindex / full optimize
    pub pending_changes: Vec<String>,
    /// Keys rejected and rolled back
    pub failed_changes: Vec<ConfigFailure>,
}

/// Result of `reindex`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexReport {
    /// Index name
    pub name: String,
    /// Vectors re-inserted into the new partition
    pub restored_vector_count: usize,
    /// Vectors discarded (`preserve_data = false`)
    pub dropped_vector_count: usize,
    /// Tuning config now active
    pub config: TuningConfig,
    /// Total duration in microseconds
    pub duration_us: u64,
}

/// Optimization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeKind {
    /// Compact + rebalance + rebuild, then apply pending config
    #[default]
    Full,
    /// Remove tombstoned slots
    Compact,
    /// Re-lay out storage for scan locality
    Rebalance,
}

impl OptimizeKind {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full" => Some(OptimizeKind::Full),
            "compact" => Some(OptimizeKind::Compact),
            "rebalance" => Some(OptimizeKind::Rebalance),
            _ => None,
        }
    }

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            OptimizeKind::Full => "full",
            OptimizeKind::Compact => "compact",
            OptimizeKind::Rebalance => "rebalance",
        }
    }

    fn phases(&self) -> &'static [Phase] {
        match self {
            OptimizeKind::Full => &[Phase::Compact, Phase::Rebalance, Phase::Rebuild],
            OptimizeKind::Compact => &[Phase::Compact],
            OptimizeKind::Rebalance => &[Phase::Rebalance],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Compact,
    Rebalance,
    Rebuild,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Compact => "compact",
            Phase::Rebalance => "rebalance",
            Phase::Rebuild => "rebuild",
        }
    }
}

/// Timing and effect of one optimize phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Phase name
    pub phase: String,
    /// Phase duration in microseconds
    pub duration_us: u64,
    /// Free slots removed by this phase
    pub reclaimed_slots: usize,
}

/// Result of `optimize_index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeReport {
    /// Index name
    pub name: String,
    /// Requested pass
    pub kind: OptimizeKind,
    /// Completed phases in order
    pub phases: Vec<PhaseReport>,
    /// Vector count (unchanged by optimization)
    pub vector_count: usize,
    /// Total duration in microseconds
    pub duration_us: u64,
    /// Whether cancellation stopped the pass early
    pub cancelled: bool,
}

/// Check one tuning key/value; `Err` carries the rejection reason
pub(crate) fn check_tuning_key(key: &str, value: &MetadataValue) -> Result<(), String> {
    if IMMUTABLE_KEYS.contains(&key) {
        return Err(format!("'{}' is immutable after creation", key));
    }
    if key.is_empty() {
        return Err("tuning key cannot be empty".to_string());
    }
    if POSITIVE_INT_KEYS.contains(&key) && *value != MetadataValue::Null {
        match value.as_u64() {
            Some(n) if n > 0 => {}
            _ => return Err(format!("'{}' must be a positive integer", key)),
        }
    }
    Ok(())
}

/// Validate a whole tuning map; the first bad key fails the call
pub(crate) fn validate_tuning(config: &TuningConfig) -> VectorResult<()> {
    for (key, value) in config {
        if *value == MetadataValue::Null {
            return Err(VectorError::invalid(format!(
                "tuning key '{}' cannot be null",
                key
            )));
        }
        check_tuning_key(key, value)
            .map_err(|reason| VectorError::invalid(format!("invalid tuning config: {}", reason)))?;
    }
    Ok(())
}

/// Apply staged keys; a null value removes the key
fn apply_pending(config: &mut TuningConfig, pending: &TuningConfig) {
    for (key, value) in pending {
        if *value == MetadataValue::Null {
            config.remove(key);
        } else {
            config.insert(key.clone(), value.clone());
        }
    }
}

/// Copy every entry of `source` (with timestamps) into `target`
pub(crate) fn copy_entries(
    source: &dyn IndexBackend,
    target: &mut dyn IndexBackend,
) -> VectorResult<usize> {
    let mut copied = 0;
    let mut failure = None;
    source.scan(0, &mut |entry| match target.load(entry.to_entry(true)) {
        Ok(()) => {
            copied += 1;
            ControlFlow::Continue(())
        }
        Err(e) => {
            failure = Some(e);
            ControlFlow::Break(())
        }
    })?;
    match failure {
        Some(e) => Err(e),
        None => Ok(copied),
    }
}

fn rebuild(
    factory: &BackendFactory,
    source: &dyn IndexBackend,
) -> VectorResult<Box<dyn IndexBackend>> {
    let mut target = factory.create(&source.kind(), source.dimension());
    copy_entries(source, target.as_mut())?;
    Ok(target)
}

impl VectorEngine {
    /// Create an index
    ///
    /// # Errors
    /// - `InvalidArgument` for a bad name, zero or oversized dimension, or a
    ///   bad tuning value
    /// - `AlreadyExists` if the name is taken
    pub fn create_index(&self, spec: IndexSpec) -> VectorResult<IndexInfo> {
        self.track("create_index", || {
            validate_index_name(&spec.name)?;
            validate_dimension(spec.dimension, self.config.max_dimension)?;
            validate_tuning(&spec.config)?;

            let mut registry = self.registry.write();
            if registry.contains_key(&spec.name) {
                return Err(VectorError::already_exists(EntityKind::Index, &spec.name));
            }

            let now = Timestamp::now();
            let store = self.factory.create(&spec.backend, spec.dimension);
            let meta = IndexMeta {
                name: spec.name.clone(),
                dimension: spec.dimension,
                metric: spec.metric,
                index_type: spec.index_type,
                backend: spec.backend,
                config: spec.config,
                pending_config: TuningConfig::new(),
                status: IndexStatus::Active,
                replication: None,
                sharding: None,
                created_at: now,
                updated_at: now,
            };
            let slot = self.install(&mut registry, meta, store);
            let state = slot.state.read();

            info!(
                target: "vexil::index",
                index = %state.meta.name,
                dimension = state.meta.dimension,
                metric = state.meta.metric.name(),
                backend = %state.meta.backend,
                "Index created"
            );
            Ok(state.info(None))
        })
    }

    /// Delete an index and drop its storage partition
    ///
    /// # Errors
    /// - `NotFound` if the index does not exist
    /// - `NotEmpty` if it holds vectors and `force` is false
    pub fn delete_index(&self, name: &str, force: bool) -> VectorResult<DeleteIndexReport> {
        self.track("delete_index", || {
            let mut collections = self.collections.write();
            let mut registry = self.registry.write();
            self.delete_index_locked(&mut collections, &mut registry, name, force)
        })
    }

    /// Resolve a slot through an already-locked registry
    pub(crate) fn slot_in(
        &self,
        registry: &BTreeMap<String, IndexHandle>,
        name: &str,
    ) -> VectorResult<Arc<IndexSlot>> {
        let handle = registry
            .get(name)
            .ok_or_else(|| VectorError::not_found(EntityKind::Index, name))?;
        self.arena
            .get(handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| VectorError::not_found(EntityKind::Index, name))
    }

    /// Delete with `collections` and `registry` already write-locked
    pub(crate) fn delete_index_locked(
        &self,
        collections: &mut CollectionRegistry,
        registry: &mut BTreeMap<String, IndexHandle>,
        name: &str,
        force: bool,
    ) -> VectorResult<DeleteIndexReport> {
        let slot = self.slot_in(registry, name)?;
        let mut state = slot.state.write();
        ensure_deletable(&state, force)?;
        Ok(self.retire_index(collections, registry, &slot, &mut state, force))
    }

    /// Drop an index whose slot the caller holds write-locked and has
    /// already checked with [`ensure_deletable`]
    pub(crate) fn retire_index(
        &self,
        collections: &mut CollectionRegistry,
        registry: &mut BTreeMap<String, IndexHandle>,
        slot: &IndexSlot,
        state: &mut IndexState,
        force: bool,
    ) -> DeleteIndexReport {
        let name = state.meta.name.clone();
        let deleted_vector_count = state.store.len();
        state.meta.status = IndexStatus::Deleted;

        registry.remove(&name);
        self.arena.remove(&slot.handle);
        if let Some(owner) = collections.owners.remove(&name) {
            if let Some(collection) = collections.collections.get_mut(&owner) {
                collection.members.remove(&name);
            }
        }

        info!(
            target: "vexil::index",
            index = %name,
            deleted_vector_count,
            force,
            "Index deleted"
        );
        DeleteIndexReport {
            name,
            deleted_vector_count,
        }
    }

    /// List indexes in name order, optionally filtered by backend
    pub fn list_indexes(
        &self,
        backend: Option<&BackendKind>,
        include_stats: bool,
    ) -> VectorResult<Vec<IndexListing>> {
        self.track("list_indexes", || {
            let owners = self.collections.read().owners.clone();
            let mut out = Vec::new();
            for (name, slot) in self.slots_by_name() {
                let state = slot.state.read();
                if state.meta.status == IndexStatus::Deleted {
                    continue;
                }
                if backend.map_or(false, |b| *b != state.meta.backend) {
                    continue;
                }
                let info = state.info(owners.get(&name).cloned());
                let stats = include_stats.then(|| stats_of(&state));
                out.push(IndexListing { info, stats });
            }
            Ok(out)
        })
    }

    /// Describe one index
    pub fn describe_index(&self, name: &str) -> VectorResult<IndexInfo> {
        self.track("describe_index", || {
            let collection = self.collection_of(name);
            self.read_index(name, |state| Ok(state.info(collection)))
        })
    }

    /// Storage statistics for one index
    pub fn index_stats(&self, name: &str) -> VectorResult<IndexStats> {
        self.track("index_stats", || {
            self.read_index(name, |state| Ok(stats_of(state)))
        })
    }

    /// Merge a patch into the tuning config
    ///
    /// Each key is validated on its own; a rejected key is rolled back while
    /// the others keep their new value. With `apply_immediately = false`
    /// accepted keys are staged in `pending_config` instead. A null value
    /// removes the key.
    pub fn configure_index(
        &self,
        name: &str,
        patch: TuningConfig,
        apply_immediately: bool,
    ) -> VectorResult<ConfigureReport> {
        self.track("configure_index", || {
            if patch.is_empty() {
                return Err(VectorError::invalid("config patch cannot be empty"));
            }
            self.write_index(name, |state| {
                let meta = &mut state.meta;
                let old_config = meta.config.clone();
                let mut applied_changes = Vec::new();
                let mut pending_changes = Vec::new();
                let mut failed_changes = Vec::new();

                for (key, value) in patch {
                    if let Err(reason) = check_tuning_key(&key, &value) {
                        failed_changes.push(ConfigFailure { key, reason });
                        continue;
                    }
                    if apply_immediately {
                        if value == MetadataValue::Null {
                            meta.config.remove(&key);
                        } else {
                            meta.config.insert(key.clone(), value);
                        }
                        meta.pending_config.remove(&key);
                        applied_changes.push(key);
                    } else {
                        meta.pending_config.insert(key.clone(), value);
                        pending_changes.push(key);
                    }
                }

                if !applied_changes.is_empty() || !pending_changes.is_empty() {
                    meta.updated_at = Timestamp::now();
                }
                if !failed_changes.is_empty() {
                    warn!(
                        target: "vexil::index",
                        index = %meta.name,
                        failed = failed_changes.len(),
                        "Config keys rolled back"
                    );
                }
                info!(
                    target: "vexil::index",
                    index = %meta.name,
                    applied = applied_changes.len(),
                    pending = pending_changes.len(),
                    "Index configured"
                );

                Ok(ConfigureReport {
                    old_config,
                    new_config: meta.config.clone(),
                    applied_changes,
                    pending_changes,
                    failed_changes,
                })
            })
        })
    }

    /// Set the replication descriptor (configuration only)
    pub fn configure_replication(
        &self,
        name: &str,
        replication: ReplicationConfig,
    ) -> VectorResult<IndexInfo> {
        self.track("configure_replication", || {
            if replication.factor == 0 {
                return Err(VectorError::invalid(
                    "replication factor must be at least 1",
                ));
            }
            let collection = self.collection_of(name);
            self.write_index(name, |state| {
                state.meta.replication = Some(replication);
                state.meta.updated_at = Timestamp::now();
                Ok(state.info(collection))
            })
        })
    }

    /// Set the sharding descriptor (configuration only)
    pub fn configure_sharding(
        &self,
        name: &str,
        sharding: ShardingConfig,
    ) -> VectorResult<IndexInfo> {
        self.track("configure_sharding", || {
            if sharding.shard_count == 0 {
                return Err(VectorError::invalid("shard_count must be at least 1"));
            }
            let collection = self.collection_of(name);
            self.write_index(name, |state| {
                state.meta.sharding = Some(sharding);
                state.meta.updated_at = Timestamp::now();
                Ok(state.info(collection))
            })
        })
    }

    /// Recreate the storage partition with a new tuning config
    ///
    /// `new_config` replaces the active config (pending keys are applied on
    /// top); `None` keeps the current config. With `preserve_data` every
    /// vector is copied into the new partition. Readers observe either the
    /// old or the new partition, never a mix.
    pub fn reindex(
        &self,
        name: &str,
        new_config: Option<TuningConfig>,
        preserve_data: bool,
    ) -> VectorResult<ReindexReport> {
        self.track("reindex", || {
            if let Some(config) = &new_config {
                validate_tuning(config)?;
            }
            let start = Instant::now();
            let slot = self.slot(name)?;
            let guard = slot.state.upgradable_read();
            guard.ensure_live()?;

            let mut config = new_config.unwrap_or_else(|| guard.meta.config.clone());
            apply_pending(&mut config, &guard.meta.pending_config);

            let mut store = self.factory.create(&guard.meta.backend, guard.meta.dimension);
            let previous = guard.store.len();
            let restored_vector_count = if preserve_data {
                copy_entries(guard.store.as_ref(), store.as_mut())?
            } else {
                0
            };

            let mut state = RwLockUpgradableReadGuard::upgrade(guard);
            state.store = store;
            state.meta.config = config.clone();
            state.meta.pending_config.clear();
            state.meta.updated_at = Timestamp::now();

            let duration_us = start.elapsed().as_micros() as u64;
            info!(
                target: "vexil::index",
                index = name,
                restored_vector_count,
                preserve_data,
                duration_us,
                "Index reindexed"
            );
            Ok(ReindexReport {
                name: name.to_string(),
                restored_vector_count,
                dropped_vector_count: previous - restored_vector_count,
                config,
                duration_us,
            })
        })
    }

    /// Run an optimization pass
    pub fn optimize_index(&self, name: &str, kind: OptimizeKind) -> VectorResult<OptimizeReport> {
        self.optimize_index_with_cancel(name, kind, &CancellationToken::new())
    }

    /// Run an optimization pass, checking `cancel` between phases
    ///
    /// A cancelled pass swaps in the result of the last completed phase, so
    /// the index is always in a consistent state. Status reads `optimizing`
    /// while the pass runs.
    pub fn optimize_index_with_cancel(
        &self,
        name: &str,
        kind: OptimizeKind,
        cancel: &CancellationToken,
    ) -> VectorResult<OptimizeReport> {
        self.track("optimize_index", || {
            let start = Instant::now();
            let slot = self.slot(name)?;
            let guard = slot.state.upgradable_read();
            guard.ensure_live()?;

            let mut marking = RwLockUpgradableReadGuard::upgrade(guard);
            marking.meta.status = IndexStatus::Optimizing;
            let guard = RwLockWriteGuard::downgrade_to_upgradable(marking);

            let built = self.build_optimized(&guard, kind, cancel);

            let mut state = RwLockUpgradableReadGuard::upgrade(guard);
            state.meta.status = IndexStatus::Active;
            let (store, phases, cancelled) = built?;
            if let Some(store) = store {
                state.store = store;
            }
            if kind == OptimizeKind::Full && !cancelled {
                let pending = std::mem::take(&mut state.meta.pending_config);
                apply_pending(&mut state.meta.config, &pending);
                state.meta.updated_at = Timestamp::now();
            }

            let duration_us = start.elapsed().as_micros() as u64;
            if cancelled {
                warn!(
                    target: "vexil::index",
                    index = name,
                    kind = kind.name(),
                    completed_phases = phases.len(),
                    "Optimize cancelled"
                );
            } else {
                info!(
                    target: "vexil::index",
                    index = name,
                    kind = kind.name(),
                    duration_us,
                    "Index optimized"
                );
            }
            Ok(OptimizeReport {
                name: name.to_string(),
                kind,
                phases,
                vector_count: state.store.len(),
                duration_us,
                cancelled,
            })
        })
    }

    #[allow(clippy::type_complexity)]
    fn build_optimized(
        &self,
        state: &IndexState,
        kind: OptimizeKind,
        cancel: &CancellationToken,
    ) -> VectorResult<(Option<Box<dyn IndexBackend>>, Vec<PhaseReport>, bool)> {
        let mut current: Option<Box<dyn IndexBackend>> = None;
        let mut phases = Vec::new();
        let mut cancelled = false;

        for phase in kind.phases() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let source: &dyn IndexBackend = current.as_deref().unwrap_or(state.store.as_ref());
            let free_before = source.stats().free_slots;
            let phase_start = Instant::now();
            let next = match phase {
                Phase::Compact => source.compacted()?,
                Phase::Rebalance => source.rebalanced()?,
                Phase::Rebuild => rebuild(&self.factory, source)?,
            };
            phases.push(PhaseReport {
                phase: phase.name().to_string(),
                duration_us: phase_start.elapsed().as_micros() as u64,
                reclaimed_slots: free_before.saturating_sub(next.stats().free_slots),
            });
            current = Some(next);
        }
        Ok((current, phases, cancelled))
    }
}

fn stats_of(state: &IndexState) -> IndexStats {
    let backend = state.store.stats();
    IndexStats {
        name: state.meta.name.clone(),
        vector_count: state.store.len(),
        dimension: state.meta.dimension,
        metric: state.meta.metric,
        index_type: state.meta.index_type,
        backend: state.meta.backend.clone(),
        live_slots: backend.live_slots,
        free_slots: backend.free_slots,
        memory_bytes: backend.memory_bytes,
        pending_config_keys: state.meta.pending_config.keys().cloned().collect(),
    }
}
