//! The Executor - single entry point to the vexil engine.
//!
//! The Executor is a stateless dispatcher that routes commands to the
//! matching engine operation and converts results to outputs.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};
use vexil_engine::VectorEngine;

use crate::batch::{BatchItem, BatchReport, BatchStatus};
use crate::handlers;
use crate::{Command, Error, Output, Result};

/// The command executor - single entry point to the engine.
///
/// The Executor is **stateless**: it holds a shared reference to the engine
/// but maintains no state of its own. Cloning is cheap.
///
/// # Thread Safety
///
/// Executor is `Send + Sync` and can be shared across threads.
///
/// # Example
///
/// ```ignore
/// use vexil_executor::{Command, Executor};
///
/// let executor = Executor::new(Arc::new(VectorEngine::default()));
///
/// executor.execute(Command::CreateIndex { name: "docs".into(), dimension: 3, .. })?;
///
/// let results = executor.execute_many(vec![
///     Command::DescribeIndex { name: "docs".into() },
///     Command::CountVectors { index: "docs".into(), filter: None },
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct Executor {
    engine: Arc<VectorEngine>,
}

impl Executor {
    /// Create a new executor wrapping an engine.
    pub fn new(engine: Arc<VectorEngine>) -> Self {
        Self { engine }
    }

    /// Execute a single command.
    ///
    /// Returns the command result or an error.
    pub fn execute(&self, cmd: Command) -> Result<Output> {
        let engine = self.engine.as_ref();
        match cmd {
            // Index commands
            Command::CreateIndex {
                name,
                dimension,
                metric,
                index_type,
                backend,
                config,
            } => handlers::index::create_index(
                engine, name, dimension, metric, index_type, backend, config,
            ),
            Command::DeleteIndex { name, force } => {
                handlers::index::delete_index(engine, name, force)
            }
            Command::ListIndexes {
                backend,
                include_stats,
            } => handlers::index::list_indexes(engine, backend, include_stats),
            Command::DescribeIndex { name } => handlers::index::describe_index(engine, name),
            Command::IndexStats { name } => handlers::index::index_stats(engine, name),
            Command::ConfigureIndex {
                name,
                config,
                apply_immediately,
            } => handlers::index::configure_index(engine, name, config, apply_immediately),
            Command::ConfigureReplication { name, replication } => {
                handlers::index::configure_replication(engine, name, replication)
            }
            Command::ConfigureSharding { name, sharding } => {
                handlers::index::configure_sharding(engine, name, sharding)
            }
            Command::Reindex {
                name,
                config,
                preserve_data,
            } => handlers::index::reindex(engine, name, config, preserve_data),
            Command::OptimizeIndex { name, kind } => {
                handlers::index::optimize_index(engine, name, kind)
            }

            // Vector commands
            Command::InsertVectors {
                index,
                vectors,
                batch_size,
                upsert,
            } => handlers::vector::insert_vectors(engine, index, vectors, batch_size, upsert),
            Command::UpdateVectors {
                index,
                updates,
                batch_size,
            } => handlers::vector::update_vectors(engine, index, updates, batch_size),
            Command::DeleteVectors {
                index,
                ids,
                filter,
                confirm_delete_all,
            } => handlers::vector::delete_vectors(engine, index, ids, filter, confirm_delete_all),
            Command::GetVector {
                index,
                id,
                include_vector,
            } => handlers::vector::get_vector(engine, index, id, include_vector),
            Command::VectorExists { index, id } => {
                handlers::vector::vector_exists(engine, index, id)
            }
            Command::ListVectors {
                index,
                limit,
                offset,
                filter,
                include_vectors,
            } => handlers::vector::list_vectors(
                engine,
                index,
                limit,
                offset,
                filter,
                include_vectors,
            ),
            Command::CountVectors { index, filter } => {
                handlers::vector::count_vectors(engine, index, filter)
            }

            // Search commands
            Command::Search {
                index,
                vector,
                top_k,
                filter,
                score_threshold,
                include_vectors,
                include_metadata,
            } => handlers::search::search(
                engine,
                index,
                vector,
                top_k,
                filter,
                score_threshold,
                include_vectors,
                include_metadata,
            ),
            Command::KeywordSearch {
                index,
                text,
                top_k,
                filter,
            } => handlers::search::keyword_search(engine, index, text, top_k, filter),
            Command::HybridSearch {
                index,
                vector,
                text,
                top_k,
                vector_weight,
                text_weight,
                filter,
            } => handlers::search::hybrid_search(
                engine,
                index,
                vector,
                text,
                top_k,
                vector_weight,
                text_weight,
                filter,
            ),
            Command::FilterVectors {
                index,
                filter,
                limit,
                include_vectors,
            } => handlers::search::filter_vectors(engine, index, filter, limit, include_vectors),
            Command::AggregateVectors { index, aggregation } => {
                handlers::search::aggregate_vectors(engine, index, aggregation)
            }

            // Collection commands
            Command::CreateCollection {
                name,
                description,
                config,
                indexes,
            } => handlers::collection::create_collection(
                engine,
                name,
                description,
                config,
                indexes,
            ),
            Command::DeleteCollection {
                name,
                delete_indexes,
                force,
            } => handlers::collection::delete_collection(engine, name, delete_indexes, force),
            Command::ListCollections => handlers::collection::list_collections(engine),
            Command::DescribeCollection { name } => {
                handlers::collection::describe_collection(engine, name)
            }
            Command::AddIndexToCollection { collection, index } => {
                handlers::collection::add_index(engine, collection, index)
            }
            Command::RemoveIndexFromCollection { collection, index } => {
                handlers::collection::remove_index(engine, collection, index)
            }

            // Backup commands
            Command::BackupIndex {
                index,
                name,
                include_vectors,
                compression,
            } => handlers::backup::backup_index(engine, index, name, include_vectors, compression),
            Command::RestoreIndex {
                backup,
                target,
                overwrite_existing,
            } => handlers::backup::restore_index(engine, backup, target, overwrite_existing),
            Command::ListBackups => handlers::backup::list_backups(engine),
            Command::DescribeBackup { name } => handlers::backup::describe_backup(engine, name),
            Command::DeleteBackup { name } => handlers::backup::delete_backup(engine, name),

            // Monitor commands
            Command::Ping => handlers::monitor::ping(),
            Command::OperationStats { operation } => {
                handlers::monitor::operation_stats(engine, operation)
            }
            Command::RecentOperations { limit } => {
                handlers::monitor::recent_operations(engine, limit)
            }
            Command::ClearOperationStats => handlers::monitor::clear_operation_stats(engine),
            Command::EngineStats => handlers::monitor::engine_stats(engine),
        }
    }

    /// Execute multiple commands sequentially.
    ///
    /// Returns all results in the same order as the input commands.
    /// Execution continues even if some commands fail.
    pub fn execute_many(&self, cmds: Vec<Command>) -> Vec<Result<Output>> {
        cmds.into_iter().map(|cmd| self.execute(cmd)).collect()
    }

    /// Execute a heterogeneous list of commands
    ///
    /// Sequential mode runs in input order; with `fail_fast` the first error
    /// stops the batch and the rest are reported `Skipped`.
    ///
    /// Parallel mode fans the commands out over the rayon pool, each taking
    /// its own engine locks. With `fail_fast` the first failure stops any
    /// command that has not started yet (reported `Skipped`); commands
    /// already running finish and keep their result.
    pub fn batch_operations(
        &self,
        cmds: Vec<Command>,
        parallel: bool,
        fail_fast: bool,
    ) -> BatchReport {
        let start = Instant::now();
        let mut items: Vec<BatchItem> = cmds
            .iter()
            .enumerate()
            .map(|(position, cmd)| BatchItem::new(position, cmd.name()))
            .collect();

        let stopped_early = if parallel {
            self.run_parallel(cmds, fail_fast, &mut items)
        } else {
            self.run_sequential(cmds, fail_fast, &mut items)
        };

        let report = BatchReport::from_items(
            items,
            parallel,
            fail_fast,
            start.elapsed().as_micros() as u64,
        );
        if stopped_early {
            warn!(
                target: "vexil::executor",
                failed = report.failed,
                skipped = report.skipped,
                "Batch stopped at first failure"
            );
        }
        info!(
            target: "vexil::executor",
            total = report.items.len(),
            succeeded = report.succeeded,
            failed = report.failed,
            parallel,
            duration_us = report.duration_us,
            "Batch completed"
        );
        report
    }

    /// Returns true if fail-fast stopped the batch
    fn run_sequential(
        &self,
        cmds: Vec<Command>,
        fail_fast: bool,
        items: &mut [BatchItem],
    ) -> bool {
        for (item, cmd) in items.iter_mut().zip(cmds) {
            let result = self.execute(cmd);
            let failed = result.is_err();
            item.set_result(result);
            if failed && fail_fast {
                return true;
            }
        }
        false
    }

    /// Returns true if fail-fast stopped the batch
    fn run_parallel(&self, cmds: Vec<Command>, fail_fast: bool, items: &mut [BatchItem]) -> bool {
        let stop = AtomicBool::new(false);
        let results: Vec<Option<Result<Output>>> = cmds
            .into_par_iter()
            .map(|cmd| {
                if stop.load(Ordering::Acquire) {
                    return None;
                }
                let result = self.execute_catching(cmd);
                if fail_fast && result.is_err() {
                    stop.store(true, Ordering::Release);
                }
                Some(result)
            })
            .collect();

        for (item, result) in items.iter_mut().zip(results) {
            if let Some(result) = result {
                item.set_result(result);
            }
        }
        stop.load(Ordering::Acquire)
    }

    /// `execute`, with a panic reported as `Error::Internal`
    fn execute_catching(&self, cmd: Command) -> Result<Output> {
        let op = cmd.name();
        panic::catch_unwind(AssertUnwindSafe(|| self.execute(cmd))).unwrap_or_else(|_| {
            Err(Error::Internal {
                reason: format!("operation '{}' panicked", op),
            })
        })
    }

    /// Get a reference to the underlying engine.
    ///
    /// This is an escape hatch for stream- and file-based operations
    /// (bulk import/export, backup files) that have no command form.
    pub fn engine(&self) -> &Arc<VectorEngine> {
        &self.engine
    }
}

impl From<VectorEngine> for Executor {
    fn from(engine: VectorEngine) -> Self {
        Executor::new(Arc::new(engine))
    }
}
