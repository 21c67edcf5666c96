//! Cooperative cancellation and progress counters for long-running jobs
//!
//! Both types are cheap to clone and share one underlying state, so a
//! caller can keep a handle while the job runs on another thread.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Cancellation flag checked between batches
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Running counters for bulk import/export
#[derive(Debug, Clone, Default)]
pub struct BulkProgress {
    inner: Arc<ProgressCounters>,
}

#[derive(Debug, Default)]
struct ProgressCounters {
    processed: AtomicU64,
    inserted: AtomicU64,
    updated: AtomicU64,
    failed: AtomicU64,
    exported: AtomicU64,
    batches_processed: AtomicU64,
}

/// Point-in-time copy of [`BulkProgress`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Records read from the source (or scanned for export)
    pub processed: u64,
    /// Records inserted
    pub inserted: u64,
    /// Records that overwrote an existing id
    pub updated: u64,
    /// Records that failed
    pub failed: u64,
    /// Records written to the sink
    pub exported: u64,
    /// Completed batches
    pub batches_processed: u64,
}

impl BulkProgress {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all counters
    pub fn snapshot(&self) -> ProgressSnapshot {
        let c = &self.inner;
        ProgressSnapshot {
            processed: c.processed.load(Ordering::Relaxed),
            inserted: c.inserted.load(Ordering::Relaxed),
            updated: c.updated.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            exported: c.exported.load(Ordering::Relaxed),
            batches_processed: c.batches_processed.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add_processed(&self, n: u64) {
        self.inner.processed.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_inserted(&self, n: u64) {
        self.inner.inserted.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_updated(&self, n: u64) {
        self.inner.updated.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_failed(&self, n: u64) {
        self.inner.failed.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_exported(&self, n: u64) {
        self.inner.exported.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn finish_batch(&self) {
        self.inner.batches_processed.fetch_add(1, Ordering::Relaxed);
    }
}
