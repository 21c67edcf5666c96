//! Operation statistics
//!
//! Every public engine operation appends one [`OperationStat`]. Records are
//! never mutated after append; the log only prunes the oldest entries when
//! it reaches capacity.

use std::collections::{BTreeMap, VecDeque};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vexil_core::Timestamp;

/// One executed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStat {
    /// Operation name (`search`, `insert_vectors`, ...)
    pub operation: String,
    /// Start time
    pub timestamp: Timestamp,
    /// Wall-clock duration in microseconds
    pub duration_us: u64,
    /// Whether the operation returned Ok
    pub success: bool,
    /// Error message for failed operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregates for one operation name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationSummary {
    /// Executions
    pub count: usize,
    /// Failed executions
    pub failed: usize,
    /// Mean duration in microseconds
    pub avg_duration_us: f64,
    /// Longest duration in microseconds
    pub max_duration_us: u64,
}

/// Aggregated view over the retained log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Operations counted
    pub total: usize,
    /// Successful operations
    pub succeeded: usize,
    /// Failed operations
    pub failed: usize,
    /// `succeeded / total`, 0 when nothing was recorded
    pub success_rate: f64,
    /// Mean duration in microseconds
    pub avg_duration_us: f64,
    /// Longest duration in microseconds
    pub max_duration_us: u64,
    /// Breakdown by operation name
    pub per_operation: BTreeMap<String, OperationSummary>,
}

/// Engine-wide counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Live indexes
    pub index_count: usize,
    /// Collections
    pub collection_count: usize,
    /// Backups in the catalog
    pub backup_count: usize,
    /// Sum of vector counts over all indexes
    pub total_vectors: usize,
}

/// Bounded append-only log
#[derive(Debug)]
pub struct StatsLog {
    capacity: usize,
    entries: Mutex<VecDeque<OperationStat>>,
}

impl StatsLog {
    /// Create a log retaining at most `capacity` records
    pub fn new(capacity: usize) -> Self {
        StatsLog {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Append a record, pruning the oldest when full
    pub fn record(&self, stat: OperationStat) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(stat);
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if no records are retained
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every record
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Vec<OperationStat> {
        self.entries.lock().iter().rev().take(limit).cloned().collect()
    }

    /// Aggregate, optionally restricted to one operation name
    pub fn report(&self, operation: Option<&str>) -> StatsReport {
        let entries = self.entries.lock();
        let mut report = StatsReport::default();
        let mut total_us: u128 = 0;
        let mut per_op_us: BTreeMap<String, u128> = BTreeMap::new();

        for stat in entries
            .iter()
            .filter(|s| operation.map_or(true, |op| s.operation == op))
        {
            report.total += 1;
            if stat.success {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            total_us += u128::from(stat.duration_us);
            report.max_duration_us = report.max_duration_us.max(stat.duration_us);

            let summary = report
                .per_operation
                .entry(stat.operation.clone())
                .or_default();
            summary.count += 1;
            if !stat.success {
                summary.failed += 1;
            }
            summary.max_duration_us = summary.max_duration_us.max(stat.duration_us);
            *per_op_us.entry(stat.operation.clone()).or_default() += u128::from(stat.duration_us);
        }

        if report.total > 0 {
            report.success_rate = report.succeeded as f64 / report.total as f64;
            report.avg_duration_us = total_us as f64 / report.total as f64;
        }
        for (op, summary) in report.per_operation.iter_mut() {
            if let Some(us) = per_op_us.get(op) {
                summary.avg_duration_us = *us as f64 / summary.count as f64;
            }
        }
        report
    }
}
