//! Index storage backend trait
//!
//! Every index owns one `Box<dyn IndexBackend>`. The engine holds the
//! per-index lock; backends are plain single-threaded data structures.
//!
//! - `MemoryBackend` implements the full contract in-process
//! - `ExternalBackend` is the extension point for remote stores; it keeps
//!   the index configuration and answers data calls with
//!   `BackendUnavailable`

use std::ops::ControlFlow;

use vexil_core::{BackendKind, Metadata, Timestamp, VectorEntry, VectorError, VectorResult};

use crate::heap::Seq;
use crate::store::MemoryBackend;

/// Borrowed view of one stored vector
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    /// Insertion sequence number (stable cursor)
    pub seq: Seq,
    /// Vector id
    pub id: &'a str,
    /// Embedding
    pub vector: &'a [f32],
    /// Metadata
    pub metadata: &'a Metadata,
    /// Creation time
    pub created_at: Timestamp,
    /// Last update time
    pub updated_at: Timestamp,
}

impl EntryRef<'_> {
    /// Materialize an owned entry (embedding omitted when `include_vector` is false)
    pub fn to_entry(&self, include_vector: bool) -> VectorEntry {
        VectorEntry {
            id: self.id.to_string(),
            vector: if include_vector {
                self.vector.to_vec()
            } else {
                Vec::new()
            },
            metadata: self.metadata.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Outcome of a single put
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// New id
    Inserted,
    /// Existing id, content changed
    Updated,
    /// Existing id, identical content; nothing was written
    Unchanged,
}

/// Storage-level statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Live vectors
    pub live_slots: usize,
    /// Deleted slots not yet compacted
    pub free_slots: usize,
    /// Approximate heap bytes
    pub memory_bytes: usize,
    /// Whether storage order already follows insertion order
    pub sequential: bool,
}

/// Trait for swappable index storage
///
/// Scans visit entries in insertion order (ascending [`Seq`]) so pagination
/// is deterministic. Maintenance methods return a NEW backend built from
/// `&self`; the engine swaps it in under the writer lock.
pub trait IndexBackend: Send + Sync {
    /// Backend tag
    fn kind(&self) -> BackendKind;

    /// Embedding dimension
    fn dimension(&self) -> usize;

    /// Number of live vectors
    fn len(&self) -> usize;

    /// Check if empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert, or overwrite when `upsert` is set
    ///
    /// # Errors
    /// - `AlreadyExists` if the id exists and `upsert` is false
    /// - `DimensionMismatch` if the embedding length is wrong
    fn put(
        &mut self,
        id: &str,
        vector: &[f32],
        metadata: Metadata,
        upsert: bool,
        now: Timestamp,
    ) -> VectorResult<PutOutcome>;

    /// Insert an entry with its original timestamps (restore, reindex)
    fn load(&mut self, entry: VectorEntry) -> VectorResult<()>;

    /// Get a vector by id
    fn get(&self, id: &str) -> VectorResult<Option<EntryRef<'_>>>;

    /// Check if a vector exists
    fn exists(&self, id: &str) -> VectorResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Delete a vector; returns true if it existed
    fn delete(&mut self, id: &str) -> VectorResult<bool>;

    /// Visit entries with `seq >= from` in insertion order until `visit` breaks
    fn scan(
        &self,
        from: Seq,
        visit: &mut dyn FnMut(EntryRef<'_>) -> ControlFlow<()>,
    ) -> VectorResult<()>;

    /// Copy with tombstoned slots removed
    fn compacted(&self) -> VectorResult<Box<dyn IndexBackend>>;

    /// Copy with storage re-laid out for scan locality
    fn rebalanced(&self) -> VectorResult<Box<dyn IndexBackend>>;

    /// Storage statistics
    fn stats(&self) -> BackendStats;
}

/// Factory for creating index backends
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendFactory;

impl BackendFactory {
    /// Create an empty backend for the given tag
    pub fn create(&self, kind: &BackendKind, dimension: usize) -> Box<dyn IndexBackend> {
        match kind {
            BackendKind::Memory => Box::new(MemoryBackend::new(dimension)),
            BackendKind::External(tag) => Box::new(ExternalBackend::new(tag, dimension)),
        }
    }
}

/// Placeholder for a remote backend
///
/// Holds only what the index configuration needs. A network-backed
/// implementation replaces this type and must surface its own timeouts as
/// `BackendUnavailable`.
#[derive(Debug, Clone)]
pub struct ExternalBackend {
    tag: String,
    dimension: usize,
}

impl ExternalBackend {
    /// Create a placeholder for the given tag
    pub fn new(tag: &str, dimension: usize) -> Self {
        ExternalBackend {
            tag: tag.to_string(),
            dimension,
        }
    }

    fn unavailable(&self) -> VectorError {
        VectorError::BackendUnavailable {
            backend: self.tag.clone(),
            reason: "no client is configured for this backend".to_string(),
        }
    }
}

impl IndexBackend for ExternalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::External(self.tag.clone())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        0
    }

    fn put(
        &mut self,
        _id: &str,
        _vector: &[f32],
        _metadata: Metadata,
        _upsert: bool,
        _now: Timestamp,
    ) -> VectorResult<PutOutcome> {
        Err(self.unavailable())
    }

    fn load(&mut self, _entry: VectorEntry) -> VectorResult<()> {
        Err(self.unavailable())
    }

    fn get(&self, _id: &str) -> VectorResult<Option<EntryRef<'_>>> {
        Err(self.unavailable())
    }

    fn delete(&mut self, _id: &str) -> VectorResult<bool> {
        Err(self.unavailable())
    }

    fn scan(
        &self,
        _from: Seq,
        _visit: &mut dyn FnMut(EntryRef<'_>) -> ControlFlow<()>,
    ) -> VectorResult<()> {
        Err(self.unavailable())
    }

    fn compacted(&self) -> VectorResult<Box<dyn IndexBackend>> {
        Err(self.unavailable())
    }

    fn rebalanced(&self) -> VectorResult<Box<dyn IndexBackend>> {
        Err(self.unavailable())
    }

    fn stats(&self) -> BackendStats {
        BackendStats::default()
    }
}
