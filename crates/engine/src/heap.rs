//! Vector Heap - Contiguous embedding storage
//!
//! VectorHeap stores embeddings in a contiguous Vec<f32> for cache-friendly
//! similarity computation. Uses BTreeMap for deterministic iteration order.
//!
//! # Invariants
//!
//! - Sequence numbers are assigned by the owning store and never reused
//! - `seq_to_offset` is the sole source of truth for live embeddings
//! - Deleted slots are zeroed and kept on `free_slots` until compaction

use std::collections::BTreeMap;

use vexil_core::{VectorError, VectorResult};

/// Insertion sequence number (store-assigned, monotonically increasing)
pub type Seq = u64;

/// Per-index embedding heap
pub struct VectorHeap {
    dimension: usize,

    /// Contiguous embedding storage
    /// Layout: [v0_dim0, v0_dim1, ..., v0_dimN, v1_dim0, v1_dim1, ...]
    data: Vec<f32>,

    /// Seq -> offset in data (in floats, not bytes)
    ///
    /// BTreeMap so iteration follows insertion order.
    seq_to_offset: BTreeMap<Seq, usize>,

    /// Offsets of deleted slots available for reuse
    free_slots: Vec<usize>,
}

impl VectorHeap {
    /// Create an empty heap for the given dimension
    pub fn new(dimension: usize) -> Self {
        VectorHeap {
            dimension,
            data: Vec::new(),
            seq_to_offset: BTreeMap::new(),
            free_slots: Vec::new(),
        }
    }

    /// Get the dimension of vectors in this heap
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the number of live vectors
    pub fn len(&self) -> usize {
        self.seq_to_offset.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.seq_to_offset.is_empty()
    }

    /// Number of deleted slots awaiting reuse or compaction
    pub fn free_slot_count(&self) -> usize {
        self.free_slots.len()
    }

    /// Bytes held by the embedding buffer (live and free slots)
    pub fn memory_bytes(&self) -> usize {
        self.data.capacity() * std::mem::size_of::<f32>()
    }

    // ========================================================================
    // Write Operations
    // ========================================================================

    /// Insert or overwrite the embedding for `seq`
    ///
    /// New entries reuse a deleted slot when one is available.
    pub fn upsert(&mut self, seq: Seq, embedding: &[f32]) -> VectorResult<()> {
        if embedding.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                got: embedding.len(),
            });
        }

        if let Some(&offset) = self.seq_to_offset.get(&seq) {
            self.data[offset..offset + self.dimension].copy_from_slice(embedding);
        } else {
            let offset = if let Some(slot) = self.free_slots.pop() {
                self.data[slot..slot + self.dimension].copy_from_slice(embedding);
                slot
            } else {
                let offset = self.data.len();
                self.data.extend_from_slice(embedding);
                offset
            };
            self.seq_to_offset.insert(seq, offset);
        }
        Ok(())
    }

    /// Delete the embedding for `seq`
    ///
    /// Returns true if it existed. The slot is zeroed and queued for reuse.
    pub fn delete(&mut self, seq: Seq) -> bool {
        if let Some(offset) = self.seq_to_offset.remove(&seq) {
            self.data[offset..offset + self.dimension].fill(0.0);
            self.free_slots.push(offset);
            true
        } else {
            false
        }
    }

    /// Drop every embedding
    pub fn clear(&mut self) {
        self.data.clear();
        self.seq_to_offset.clear();
        self.free_slots.clear();
    }

    // ========================================================================
    // Read Operations
    // ========================================================================

    /// Get embedding by seq
    pub fn get(&self, seq: Seq) -> Option<&[f32]> {
        let offset = *self.seq_to_offset.get(&seq)?;
        Some(&self.data[offset..offset + self.dimension])
    }

    /// Check if a seq has a live embedding
    pub fn contains(&self, seq: Seq) -> bool {
        self.seq_to_offset.contains_key(&seq)
    }

    /// Iterate live embeddings in seq order
    pub fn iter(&self) -> impl Iterator<Item = (Seq, &[f32])> {
        self.seq_to_offset
            .iter()
            .map(move |(&seq, &offset)| (seq, &self.data[offset..offset + self.dimension]))
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Copy with free slots removed, keeping the current physical order
    pub fn compacted(&self) -> VectorHeap {
        let mut by_offset: Vec<(usize, Seq)> = self
            .seq_to_offset
            .iter()
            .map(|(&seq, &offset)| (offset, seq))
            .collect();
        by_offset.sort_unstable();
        self.rebuilt(by_offset.into_iter().map(|(_, seq)| seq))
    }

    /// Copy laid out in seq order, so scans walk memory sequentially
    pub fn rebalanced(&self) -> VectorHeap {
        self.rebuilt(self.seq_to_offset.keys().copied())
    }

    fn rebuilt(&self, order: impl Iterator<Item = Seq>) -> VectorHeap {
        let mut data = Vec::with_capacity(self.len() * self.dimension);
        let mut seq_to_offset = BTreeMap::new();
        for seq in order {
            if let Some(embedding) = self.get(seq) {
                seq_to_offset.insert(seq, data.len());
                data.extend_from_slice(embedding);
            }
        }
        VectorHeap {
            dimension: self.dimension,
            data,
            seq_to_offset,
            free_slots: Vec::new(),
        }
    }

    /// Whether the physical layout already follows seq order with no gaps
    pub fn is_sequential(&self) -> bool {
        self.free_slots.is_empty()
            && self
                .seq_to_offset
                .values()
                .enumerate()
                .all(|(i, &offset)| offset == i * self.dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_and_get() {
        let mut heap = VectorHeap::new(3);
        heap.upsert(1, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(heap.get(1), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(heap.len(), 1);

        heap.upsert(1, &[4.0, 5.0, 6.0]).unwrap();
        assert_eq!(heap.get(1), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut heap = VectorHeap::new(3);
        let err = heap.upsert(1, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            VectorError::DimensionMismatch {
                expected: 3,
                got: 2
            }
        ));
        assert!(heap.is_empty());
    }

    #[test]
    fn test_delete_zeroes_and_reuses_slot() {
        let mut heap = VectorHeap::new(2);
        heap.upsert(1, &[1.0, 1.0]).unwrap();
        heap.upsert(2, &[2.0, 2.0]).unwrap();

        assert!(heap.delete(1));
        assert!(!heap.delete(1));
        assert_eq!(heap.free_slot_count(), 1);
        assert!(!heap.contains(1));

        heap.upsert(3, &[3.0, 3.0]).unwrap();
        assert_eq!(heap.free_slot_count(), 0);
        assert_eq!(heap.get(3), Some(&[3.0, 3.0][..]));
        assert_eq!(heap.get(2), Some(&[2.0, 2.0][..]));
    }

    #[test]
    fn test_iter_in_seq_order() {
        let mut heap = VectorHeap::new(1);
        for seq in [5, 1, 3] {
            heap.upsert(seq, &[seq as f32]).unwrap();
        }
        let seqs: Vec<_> = heap.iter().map(|(s, _)| s).collect();
        assert_eq!(seqs, vec![1, 3, 5]);
    }

    #[test]
    fn test_compacted_drops_free_slots() {
        let mut heap = VectorHeap::new(2);
        for seq in 1..=4 {
            heap.upsert(seq, &[seq as f32, 0.0]).unwrap();
        }
        heap.delete(2);
        heap.delete(3);

        let compact = heap.compacted();
        assert_eq!(compact.len(), 2);
        assert_eq!(compact.free_slot_count(), 0);
        assert_eq!(compact.get(1), heap.get(1));
        assert_eq!(compact.get(4), heap.get(4));
    }

    #[test]
    fn test_rebalanced_is_sequential() {
        let mut heap = VectorHeap::new(1);
        heap.upsert(1, &[1.0]).unwrap();
        heap.upsert(2, &[2.0]).unwrap();
        heap.delete(1);
        heap.upsert(3, &[3.0]).unwrap(); // reuses slot 0, out of seq order
        assert!(!heap.is_sequential());

        let rebalanced = heap.rebalanced();
        assert!(rebalanced.is_sequential());
        let values: Vec<_> = rebalanced.iter().map(|(_, v)| v[0]).collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Upsert(Seq, f32),
            Delete(Seq),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u64..16, -10.0f32..10.0).prop_map(|(s, v)| Op::Upsert(s, v)),
                (0u64..16).prop_map(Op::Delete),
            ]
        }

        proptest! {
            #[test]
            fn heap_matches_model(ops in prop::collection::vec(op(), 0..64)) {
                let mut heap = VectorHeap::new(2);
                let mut model: BTreeMap<Seq, [f32; 2]> = BTreeMap::new();
                for op in ops {
                    match op {
                        Op::Upsert(seq, v) => {
                            heap.upsert(seq, &[v, -v]).unwrap();
                            model.insert(seq, [v, -v]);
                        }
                        Op::Delete(seq) => {
                            prop_assert_eq!(heap.delete(seq), model.remove(&seq).is_some());
                        }
                    }
                }

                prop_assert_eq!(heap.len(), model.len());
                for view in [heap.compacted(), heap.rebalanced()] {
                    prop_assert_eq!(view.free_slot_count(), 0);
                    let got: Vec<(Seq, Vec<f32>)> =
                        view.iter().map(|(s, v)| (s, v.to_vec())).collect();
                    let want: Vec<(Seq, Vec<f32>)> =
                        model.iter().map(|(s, v)| (*s, v.to_vec())).collect();
                    prop_assert_eq!(got, want);
                }
                prop_assert!(heap.rebalanced().is_sequential());
            }
        }
    }
}
