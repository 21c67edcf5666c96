//! In-memory vector store
//!
//! `MemoryBackend` keeps embeddings in a [`VectorHeap`] and per-vector
//! records (id, metadata, timestamps) in a seq-ordered map. Every vector
//! gets a sequence number on first insert; updates keep it, so list order
//! is insertion order.

use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;

use vexil_core::{
    BackendKind, EntityKind, Metadata, Timestamp, VectorEntry, VectorError, VectorResult,
};

use crate::backend::{BackendStats, EntryRef, IndexBackend, PutOutcome};
use crate::heap::{Seq, VectorHeap};

#[derive(Debug, Clone)]
struct Record {
    id: String,
    metadata: Metadata,
    created_at: Timestamp,
    updated_at: Timestamp,
}

/// Memory backend: full storage contract, no persistence
pub struct MemoryBackend {
    heap: VectorHeap,
    ids: HashMap<String, Seq>,
    records: BTreeMap<Seq, Record>,
    /// Next seq to assign; never decremented
    next_seq: Seq,
}

impl MemoryBackend {
    /// Create an empty store
    pub fn new(dimension: usize) -> Self {
        MemoryBackend {
            heap: VectorHeap::new(dimension),
            ids: HashMap::new(),
            records: BTreeMap::new(),
            next_seq: 0,
        }
    }

    fn entry_ref<'a>(&'a self, seq: Seq, record: &'a Record) -> Option<EntryRef<'a>> {
        let vector = self.heap.get(seq)?;
        Some(EntryRef {
            seq,
            id: &record.id,
            vector,
            metadata: &record.metadata,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn with_heap(&self, heap: VectorHeap) -> MemoryBackend {
        MemoryBackend {
            heap,
            ids: self.ids.clone(),
            records: self.records.clone(),
            next_seq: self.next_seq,
        }
    }
}

impl IndexBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn dimension(&self) -> usize {
        self.heap.dimension()
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn put(
        &mut self,
        id: &str,
        vector: &[f32],
        metadata: Metadata,
        upsert: bool,
        now: Timestamp,
    ) -> VectorResult<PutOutcome> {
        if vector.len() != self.heap.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: self.heap.dimension(),
                got: vector.len(),
            });
        }

        if let Some(&seq) = self.ids.get(id) {
            if !upsert {
                return Err(VectorError::already_exists(EntityKind::Vector, id));
            }
            let unchanged = self.heap.get(seq) == Some(vector)
                && self.records.get(&seq).map(|r| &r.metadata) == Some(&metadata);
            if unchanged {
                return Ok(PutOutcome::Unchanged);
            }
            self.heap.upsert(seq, vector)?;
            if let Some(record) = self.records.get_mut(&seq) {
                record.metadata = metadata;
                record.updated_at = now;
            }
            return Ok(PutOutcome::Updated);
        }

        let seq = self.next_seq;
        self.heap.upsert(seq, vector)?;
        self.next_seq += 1;
        self.ids.insert(id.to_string(), seq);
        self.records.insert(
            seq,
            Record {
                id: id.to_string(),
                metadata,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(PutOutcome::Inserted)
    }

    fn load(&mut self, entry: VectorEntry) -> VectorResult<()> {
        let VectorEntry {
            id,
            vector,
            metadata,
            created_at,
            updated_at,
        } = entry;
        self.put(&id, &vector, metadata, true, updated_at)?;
        if let Some(record) = self.ids.get(&id).and_then(|seq| self.records.get_mut(seq)) {
            record.created_at = created_at;
            record.updated_at = updated_at;
        }
        Ok(())
    }

    fn get(&self, id: &str) -> VectorResult<Option<EntryRef<'_>>> {
        let found = self
            .ids
            .get(id)
            .and_then(|seq| self.records.get(seq).map(|r| (*seq, r)))
            .and_then(|(seq, record)| self.entry_ref(seq, record));
        Ok(found)
    }

    fn delete(&mut self, id: &str) -> VectorResult<bool> {
        match self.ids.remove(id) {
            Some(seq) => {
                self.records.remove(&seq);
                self.heap.delete(seq);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn scan(
        &self,
        from: Seq,
        visit: &mut dyn FnMut(EntryRef<'_>) -> ControlFlow<()>,
    ) -> VectorResult<()> {
        for (&seq, record) in self.records.range(from..) {
            if let Some(entry) = self.entry_ref(seq, record) {
                if visit(entry).is_break() {
                    break;
                }
            }
        }
        Ok(())
    }

    fn compacted(&self) -> VectorResult<Box<dyn IndexBackend>> {
        Ok(Box::new(self.with_heap(self.heap.compacted())))
    }

    fn rebalanced(&self) -> VectorResult<Box<dyn IndexBackend>> {
        let mut rebuilt = self.with_heap(self.heap.rebalanced());
        rebuilt.ids.shrink_to_fit();
        Ok(Box::new(rebuilt))
    }

    fn stats(&self) -> BackendStats {
        let record_bytes: usize = self
            .records
            .values()
            .map(|r| r.id.len() + std::mem::size_of::<Record>())
            .sum();
        BackendStats {
            live_slots: self.heap.len(),
            free_slots: self.heap.free_slot_count(),
            memory_bytes: self.heap.memory_bytes() + record_bytes,
            sequential: self.heap.is_sequential(),
        }
    }
}
