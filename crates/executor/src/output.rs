//! Output enum for command execution results.
//!
//! Every command produces exactly one output variant. This mapping is
//! deterministic: the same command always produces the same variant (though
//! the values depend on engine state).

use serde::{Deserialize, Serialize};
use vexil_core::{CollectionInfo, IndexInfo, VectorEntry, VectorMatch};
use vexil_engine::{
    AggregateReport, BackupInfo, ConfigureReport, DeleteCollectionReport, DeleteIndexReport,
    EngineStats, HybridMatch, IndexListing, IndexStats, OperationStat, OptimizeReport,
    ReindexReport, RestoreReport, StatsReport, VectorPage, WriteReport,
};

/// Successful command execution results.
///
/// Each [`Command`](crate::Command) variant maps to exactly one `Output`
/// variant, documented on the command.
///
/// # Example
///
/// ```text
/// match executor.execute(Command::CountVectors { index, filter: None })? {
///     Output::Count(n) => println!("{} vectors", n),
///     _ => unreachable!("CountVectors always returns Count"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Output {
    // ==================== Primitive Results ====================
    /// No return value
    Unit,

    /// Liveness reply
    Pong {
        /// Crate version
        version: String,
    },

    /// Boolean result
    Bool(bool),

    /// Count result
    Count(usize),

    // ==================== Index ====================
    /// Index descriptor
    Index(IndexInfo),

    /// Index listing
    Indexes(Vec<IndexListing>),

    /// Index storage statistics
    IndexStats(IndexStats),

    /// Index deletion result
    IndexDeleted(DeleteIndexReport),

    /// Config patch result
    Configured(ConfigureReport),

    /// Reindex result
    Reindexed(ReindexReport),

    /// Optimization result
    Optimized(OptimizeReport),

    // ==================== Vector ====================
    /// Batch write result
    Written(WriteReport),

    /// Single vector
    Vector(VectorEntry),

    /// Page of vectors
    VectorPage(VectorPage),

    /// Unranked entries (filter)
    Entries(Vec<VectorEntry>),

    // ==================== Search ====================
    /// Ranked matches
    Matches(Vec<VectorMatch>),

    /// Ranked hybrid matches
    HybridMatches(Vec<HybridMatch>),

    /// Aggregation result
    Aggregate(AggregateReport),

    // ==================== Collection ====================
    /// Collection descriptor
    Collection(CollectionInfo),

    /// Collection listing
    Collections(Vec<CollectionInfo>),

    /// Collection deletion result
    CollectionDeleted(DeleteCollectionReport),

    // ==================== Backup ====================
    /// Backup descriptor
    Backup(BackupInfo),

    /// Backup listing
    Backups(Vec<BackupInfo>),

    /// Restore result
    Restored(RestoreReport),

    // ==================== Monitor ====================
    /// Aggregate operation statistics
    OperationStats(StatsReport),

    /// Recent operation records
    Operations(Vec<OperationStat>),

    /// Engine-wide counts
    EngineStats(EngineStats),
}
