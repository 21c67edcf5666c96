//! Vector Store operations: insert, update, delete, get, list, count
//!
//! Batched writes take the index writer lock once per batch. A failing item
//! is recorded as an [`ItemFailure`] and never aborts its batch or the
//! batches after it; whole-operation problems (unknown index, bad batch
//! size, an unavailable backend) abort before anything is written.

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vexil_core::{
    matches_opt, validate_embedding, validate_vector_id, EntityKind, ItemFailure, Metadata,
    MetadataFilter, NewVector, Timestamp, VectorEntry, VectorError, VectorResult, VectorUpdate,
};

use crate::backend::{IndexBackend, PutOutcome};
use crate::engine::{IndexState, VectorEngine};

/// Aggregated outcome of a batched write
///
/// Every input item is accounted for exactly once in `inserted`,
/// `updated`, `deleted` or `failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteReport {
    /// New ids written
    pub inserted: usize,
    /// Existing ids overwritten (including identical no-op upserts)
    pub updated: usize,
    /// Ids removed
    pub deleted: usize,
    /// Items that failed
    pub failed: usize,
    /// One record per failed item
    pub failures: Vec<ItemFailure>,
    /// Batches applied
    pub batches: usize,
}

impl WriteReport {
    fn fail(&mut self, id: &str, error: &VectorError) {
        self.failed += 1;
        self.failures.push(ItemFailure::new(id, error));
    }

    fn merge(&mut self, other: WriteReport) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.failed += other.failed;
        self.failures.extend(other.failures);
        self.batches += other.batches;
    }
}

/// Which vectors `delete_vectors` removes
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteSelector {
    /// Explicit ids; absent ids are per-item `NotFound` failures
    Ids(Vec<String>),
    /// Every vector whose metadata matches (must not be empty)
    Filter(MetadataFilter),
    /// Every vector in the index
    All,
}

impl DeleteSelector {
    /// Build from the three request fields; exactly one must be set
    pub fn from_parts(
        ids: Option<Vec<String>>,
        filter: Option<MetadataFilter>,
        confirm_delete_all: bool,
    ) -> VectorResult<Self> {
        match (ids, filter, confirm_delete_all) {
            (Some(ids), None, false) => Ok(DeleteSelector::Ids(ids)),
            (None, Some(filter), false) => Ok(DeleteSelector::Filter(filter)),
            (None, None, true) => Ok(DeleteSelector::All),
            (None, None, false) => Err(VectorError::invalid(
                "one of ids, filter or confirm_delete_all is required",
            )),
            _ => Err(VectorError::invalid(
                "ids, filter and confirm_delete_all are mutually exclusive",
            )),
        }
    }
}

/// Parameters for `list_vectors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    /// Page size
    pub limit: usize,
    /// Matching entries to skip
    #[serde(default)]
    pub offset: usize,
    /// Optional metadata filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<MetadataFilter>,
    /// Include embeddings in the page
    #[serde(default)]
    pub include_vectors: bool,
}

impl ListRequest {
    /// Unfiltered page without embeddings
    pub fn new(limit: usize, offset: usize) -> Self {
        ListRequest {
            limit,
            offset,
            filter: None,
            include_vectors: false,
        }
    }

    /// Builder: restrict to matching metadata
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Builder: include embeddings
    pub fn with_vectors(mut self) -> Self {
        self.include_vectors = true;
        self
    }
}

/// One page of `list_vectors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorPage {
    /// Entries in insertion order
    pub entries: Vec<VectorEntry>,
    /// Matching entries across all pages
    pub total: usize,
    /// Offset of the next page, `None` on the last page
    pub next_offset: Option<usize>,
}

/// Resolve a caller batch size against the configured default
pub(crate) fn resolve_batch_size(requested: Option<usize>, default: usize) -> VectorResult<usize> {
    match requested {
        Some(0) => Err(VectorError::invalid("batch_size must be greater than 0")),
        Some(n) => Ok(n),
        None => Ok(default),
    }
}

/// Owned copies of every entry matching `filter`, in insertion order
pub(crate) fn collect_matching(
    store: &dyn IndexBackend,
    filter: Option<&MetadataFilter>,
    include_vectors: bool,
) -> VectorResult<Vec<VectorEntry>> {
    let mut out = Vec::new();
    store.scan(0, &mut |entry| {
        if matches_opt(filter, entry.metadata) {
            out.push(entry.to_entry(include_vectors));
        }
        ControlFlow::Continue(())
    })?;
    Ok(out)
}

fn matching_ids(
    store: &dyn IndexBackend,
    filter: Option<&MetadataFilter>,
) -> VectorResult<Vec<String>> {
    let mut ids = Vec::new();
    store.scan(0, &mut |entry| {
        if matches_opt(filter, entry.metadata) {
            ids.push(entry.id.to_string());
        }
        ControlFlow::Continue(())
    })?;
    Ok(ids)
}

/// Validate and put one vector, recording the outcome
///
/// Returns `Err` only for backend-level unavailability, which aborts the
/// whole operation.
pub(crate) fn apply_put(
    state: &mut IndexState,
    item: NewVector,
    upsert: bool,
    now: Timestamp,
    report: &mut WriteReport,
) -> VectorResult<()> {
    let NewVector {
        id,
        vector,
        metadata,
    } = item;
    let outcome = validate_vector_id(&id)
        .and_then(|_| validate_embedding(&vector, state.meta.dimension))
        .and_then(|_| state.store.put(&id, &vector, metadata, upsert, now));
    match outcome {
        Ok(PutOutcome::Inserted) => report.inserted += 1,
        Ok(PutOutcome::Updated) | Ok(PutOutcome::Unchanged) => report.updated += 1,
        Err(e @ VectorError::BackendUnavailable { .. }) => return Err(e),
        Err(e) => report.fail(&id, &e),
    }
    Ok(())
}

fn apply_update(
    state: &mut IndexState,
    update: VectorUpdate,
    now: Timestamp,
    report: &mut WriteReport,
) -> VectorResult<()> {
    let VectorUpdate {
        id,
        vector,
        metadata,
        merge_metadata,
    } = update;
    if let Err(e) = validate_vector_id(&id) {
        report.fail(&id, &e);
        return Ok(());
    }
    if vector.is_none() && metadata.is_none() {
        report.fail(
            &id,
            &VectorError::invalid("update requires a vector or metadata"),
        );
        return Ok(());
    }

    let (current_vector, current_metadata) = match state.store.get(&id)? {
        Some(entry) => (entry.vector.to_vec(), entry.metadata.clone()),
        None => {
            report.fail(&id, &VectorError::not_found(EntityKind::Vector, &id));
            return Ok(());
        }
    };

    let vector = vector.unwrap_or(current_vector);
    if let Err(e) = validate_embedding(&vector, state.meta.dimension) {
        report.fail(&id, &e);
        return Ok(());
    }
    let metadata = match metadata {
        Some(patch) if merge_metadata => merged(&current_metadata, &patch),
        Some(replacement) => replacement,
        None => current_metadata,
    };

    match state.store.put(&id, &vector, metadata, true, now) {
        Ok(_) => report.updated += 1,
        Err(e @ VectorError::BackendUnavailable { .. }) => return Err(e),
        Err(e) => report.fail(&id, &e),
    }
    Ok(())
}

fn apply_delete(state: &mut IndexState, id: &str, report: &mut WriteReport) -> VectorResult<()> {
    if let Err(e) = validate_vector_id(id) {
        report.fail(id, &e);
        return Ok(());
    }
    if state.store.delete(id)? {
        report.deleted += 1;
    } else {
        report.fail(id, &VectorError::not_found(EntityKind::Vector, id));
    }
    Ok(())
}

/// Items addressed by vector id
trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for NewVector {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for VectorUpdate {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for String {
    fn key(&self) -> &str {
        self
    }
}

impl VectorEngine {
    /// Run `apply` over `items` in batches, each under one writer lock
    ///
    /// If the index is dropped after some batches landed, the items not yet
    /// applied are reported as `NotFound` failures and the call succeeds, so
    /// the report still accounts for every item.
    fn write_batched<T: Keyed>(
        &self,
        index: &str,
        items: Vec<T>,
        batch_size: usize,
        mut apply: impl FnMut(&mut IndexState, T, Timestamp, &mut WriteReport) -> VectorResult<()>,
    ) -> VectorResult<WriteReport> {
        let slot = self.slot(index)?;
        slot.state.read().ensure_live()?;

        let mut report = WriteReport::default();
        let mut items = items.into_iter().peekable();
        while items.peek().is_some() {
            let mut batch = WriteReport {
                batches: 1,
                ..WriteReport::default()
            };
            {
                let mut state = slot.state.write();
                if let Err(e) = state.ensure_live() {
                    if report.batches == 0 {
                        return Err(e);
                    }
                    drop(state);
                    let remaining = items.len();
                    for item in items {
                        report.fail(item.key(), &e);
                    }
                    warn!(
                        target: "vexil::vector",
                        index,
                        applied_batches = report.batches,
                        remaining,
                        "Index dropped during batched write"
                    );
                    return Ok(report);
                }
                let now = Timestamp::now();
                for item in items.by_ref().take(batch_size) {
                    apply(&mut *state, item, now, &mut batch)?;
                }
            }
            if batch.failed > 0 {
                warn!(
                    target: "vexil::vector",
                    index,
                    batch = report.batches + 1,
                    failed = batch.failed,
                    "Batch completed with item failures"
                );
            }
            report.merge(batch);
        }
        Ok(report)
    }

    /// Insert vectors in batches
    ///
    /// With `upsert = false` an existing id is a per-item `AlreadyExists`
    /// failure. Dimension mismatches, bad ids and non-finite values are
    /// per-item failures.
    ///
    /// # Errors
    /// - `NotFound` if the index does not exist
    /// - `InvalidArgument` if `batch_size` is 0
    /// - `BackendUnavailable` for indexes on a non-memory backend
    pub fn insert_vectors(
        &self,
        index: &str,
        vectors: Vec<NewVector>,
        batch_size: Option<usize>,
        upsert: bool,
    ) -> VectorResult<WriteReport> {
        self.track("insert_vectors", || {
            let batch_size = resolve_batch_size(batch_size, self.config.default_batch_size)?;
            let total = vectors.len();
            let report = self.write_batched(index, vectors, batch_size, |state, item, now, report| {
                apply_put(state, item, upsert, now, report)
            })?;
            debug!(
                target: "vexil::vector",
                index,
                total,
                inserted = report.inserted,
                updated = report.updated,
                failed = report.failed,
                batches = report.batches,
                "Insert completed"
            );
            Ok(report)
        })
    }

    /// Apply full or partial updates to existing vectors
    pub fn update_vectors(
        &self,
        index: &str,
        updates: Vec<VectorUpdate>,
        batch_size: Option<usize>,
    ) -> VectorResult<WriteReport> {
        self.track("update_vectors", || {
            let batch_size = resolve_batch_size(batch_size, self.config.default_batch_size)?;
            let report = self.write_batched(index, updates, batch_size, apply_update)?;
            debug!(
                target: "vexil::vector",
                index,
                updated = report.updated,
                failed = report.failed,
                "Update completed"
            );
            Ok(report)
        })
    }

    /// Delete by ids, by filter, or everything
    ///
    /// Filter and delete-all modes select and remove under one writer lock,
    /// so a concurrent insert is either fully before or fully after.
    pub fn delete_vectors(
        &self,
        index: &str,
        selector: DeleteSelector,
    ) -> VectorResult<WriteReport> {
        self.track("delete_vectors", || {
            let report = match selector {
                DeleteSelector::Ids(ids) => self.write_batched(
                    index,
                    ids,
                    self.config.default_batch_size,
                    |state, id, _, report| apply_delete(state, &id, report),
                )?,
                DeleteSelector::Filter(filter) => {
                    if filter.is_empty() {
                        return Err(VectorError::invalid(
                            "delete filter cannot be empty; use confirm_delete_all",
                        ));
                    }
                    self.delete_matching(index, Some(&filter))?
                }
                DeleteSelector::All => self.delete_matching(index, None)?,
            };
            debug!(
                target: "vexil::vector",
                index,
                deleted = report.deleted,
                failed = report.failed,
                "Delete completed"
            );
            Ok(report)
        })
    }

    fn delete_matching(
        &self,
        index: &str,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<WriteReport> {
        self.write_index(index, |state| {
            let ids = matching_ids(state.store.as_ref(), filter)?;
            let mut report = WriteReport {
                batches: 1,
                ..WriteReport::default()
            };
            for id in &ids {
                if state.store.delete(id)? {
                    report.deleted += 1;
                }
            }
            Ok(report)
        })
    }

    /// Fetch one vector
    ///
    /// # Errors
    /// - `NotFound` if the index or the id does not exist
    pub fn get_vector(
        &self,
        index: &str,
        id: &str,
        include_vector: bool,
    ) -> VectorResult<VectorEntry> {
        self.track("get_vector", || {
            validate_vector_id(id)?;
            self.read_index(index, |state| {
                state
                    .store
                    .get(id)?
                    .map(|entry| entry.to_entry(include_vector))
                    .ok_or_else(|| VectorError::not_found(EntityKind::Vector, id))
            })
        })
    }

    /// Check whether an id is stored
    pub fn vector_exists(&self, index: &str, id: &str) -> VectorResult<bool> {
        self.track("vector_exists", || {
            self.read_index(index, |state| state.store.exists(id))
        })
    }

    /// Page through vectors in insertion order
    pub fn list_vectors(&self, index: &str, request: &ListRequest) -> VectorResult<VectorPage> {
        self.track("list_vectors", || {
            self.read_index(index, |state| {
                let end = request.offset.saturating_add(request.limit);
                let mut entries = Vec::new();
                let mut total = 0usize;
                state.store.scan(0, &mut |entry| {
                    if matches_opt(request.filter.as_ref(), entry.metadata) {
                        if total >= request.offset && total < end {
                            entries.push(entry.to_entry(request.include_vectors));
                        }
                        total += 1;
                    }
                    ControlFlow::Continue(())
                })?;
                let reached = request.offset.saturating_add(entries.len());
                let next_offset = (!entries.is_empty() && reached < total).then_some(reached);
                Ok(VectorPage {
                    entries,
                    total,
                    next_offset,
                })
            })
        })
    }

    /// Count vectors, optionally restricted by a filter
    pub fn count_vectors(
        &self,
        index: &str,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<usize> {
        self.track("count_vectors", || {
            self.read_index(index, |state| match filter {
                None => Ok(state.store.len()),
                Some(filter) => {
                    let mut count = 0;
                    state.store.scan(0, &mut |entry| {
                        if filter.matches(entry.metadata) {
                            count += 1;
                        }
                        ControlFlow::Continue(())
                    })?;
                    Ok(count)
                }
            })
        })
    }
}

/// `patch` keys written over a copy of `base`
pub(crate) fn merged(base: &Metadata, patch: &Metadata) -> Metadata {
    let mut out = base.clone();
    out.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexil_core::{metadata, BackendKind, DistanceMetric, ErrorKind, IndexSpec};

    fn engine(dim: usize) -> VectorEngine {
        let engine = VectorEngine::default();
        engine
            .create_index(IndexSpec::new("docs", dim, DistanceMetric::Cosine))
            .unwrap();
        engine
    }

    fn v(id: &str, vector: Vec<f32>) -> NewVector {
        NewVector::new(id, vector)
    }

    #[test]
    fn test_insert_150_with_batch_100() {
        let engine = engine(2);
        let vectors: Vec<_> = (0..150)
            .map(|i| v(&format!("id{:03}", i), vec![i as f32, 1.0]))
            .collect();
        let report = engine.insert_vectors("docs", vectors, Some(100), false).unwrap();
        assert_eq!(report.inserted, 150);
        assert_eq!(report.failed, 0);
        assert_eq!(report.batches, 2);

        let page = engine.list_vectors("docs", &ListRequest::new(50, 100)).unwrap();
        assert_eq!(page.entries.len(), 50);
        assert_eq!(page.entries[0].id, "id100");
        assert_eq!(page.entries[49].id, "id149");
        assert_eq!(page.total, 150);
        assert_eq!(page.next_offset, None);
    }

    #[test]
    fn test_bad_items_do_not_abort_batch() {
        let engine = engine(3);
        let report = engine
            .insert_vectors(
                "docs",
                vec![
                    v("a", vec![1.0, 0.0, 0.0]),
                    v("short", vec![1.0]),
                    v("nan", vec![f32::NAN, 0.0, 0.0]),
                    v("", vec![0.0, 0.0, 1.0]),
                    v("b", vec![0.0, 1.0, 0.0]),
                ],
                Some(2),
                false,
            )
            .unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 3);
        assert_eq!(report.batches, 3);
        let kinds: Vec<_> = report.failures.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::DimensionMismatch,
                ErrorKind::InvalidArgument,
                ErrorKind::InvalidArgument
            ]
        );
        assert_eq!(engine.count_vectors("docs", None).unwrap(), 2);
    }

    #[test]
    fn test_duplicate_without_upsert_is_item_failure() {
        let engine = engine(1);
        engine.insert_vectors("docs", vec![v("a", vec![1.0])], None, false).unwrap();
        let report = engine
            .insert_vectors("docs", vec![v("a", vec![2.0]), v("b", vec![3.0])], None, false)
            .unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.failures[0].kind, ErrorKind::AlreadyExists);

        let report = engine.insert_vectors("docs", vec![v("a", vec![2.0])], None, true).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(engine.get_vector("docs", "a", true).unwrap().vector, vec![2.0]);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let engine = engine(1);
        let err = engine
            .insert_vectors("docs", vec![v("a", vec![1.0])], Some(0), false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(engine.count_vectors("docs", None).unwrap(), 0);
    }

    #[test]
    fn test_unknown_index_aborts() {
        let engine = VectorEngine::default();
        let err = engine
            .insert_vectors("nope", vec![v("a", vec![1.0])], None, false)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_external_backend_rejects_writes() {
        let engine = VectorEngine::default();
        engine
            .create_index(
                IndexSpec::new("remote", 1, DistanceMetric::Cosine)
                    .with_backend(BackendKind::parse("qdrant")),
            )
            .unwrap();
        let err = engine
            .insert_vectors("remote", vec![v("a", vec![1.0])], None, false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }

    #[test]
    fn test_update_merge_and_replace() {
        let engine = engine(2);
        engine
            .insert_vectors(
                "docs",
                vec![v("a", vec![1.0, 0.0]).with_metadata(metadata([
                    ("lang", "rust".into()),
                    ("year", 2015.into()),
                ]))],
                None,
                false,
            )
            .unwrap();

        let report = engine
            .update_vectors(
                "docs",
                vec![
                    VectorUpdate {
                        id: "a".into(),
                        vector: None,
                        metadata: Some(metadata([("year", 2021.into())])),
                        merge_metadata: true,
                    },
                    VectorUpdate {
                        id: "missing".into(),
                        vector: Some(vec![0.0, 1.0]),
                        metadata: None,
                        merge_metadata: false,
                    },
                    VectorUpdate {
                        id: "a".into(),
                        vector: None,
                        metadata: None,
                        merge_metadata: false,
                    },
                ],
                None,
            )
            .unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.failures[0].kind, ErrorKind::NotFound);
        assert_eq!(report.failures[1].kind, ErrorKind::InvalidArgument);

        let a = engine.get_vector("docs", "a", true).unwrap();
        assert_eq!(a.vector, vec![1.0, 0.0]);
        assert_eq!(
            a.metadata,
            metadata([("lang", "rust".into()), ("year", 2021.into())])
        );

        engine
            .update_vectors(
                "docs",
                vec![VectorUpdate {
                    id: "a".into(),
                    vector: Some(vec![0.5, 0.5]),
                    metadata: Some(metadata([("tag", "x".into())])),
                    merge_metadata: false,
                }],
                None,
            )
            .unwrap();
        let a = engine.get_vector("docs", "a", true).unwrap();
        assert_eq!(a.vector, vec![0.5, 0.5]);
        assert_eq!(a.metadata, metadata([("tag", "x".into())]));
    }

    #[test]
    fn test_delete_selector_exclusive() {
        assert!(DeleteSelector::from_parts(None, None, false).is_err());
        assert!(DeleteSelector::from_parts(Some(vec![]), None, true).is_err());
        assert!(
            DeleteSelector::from_parts(Some(vec![]), Some(MetadataFilter::new()), false).is_err()
        );
        assert_eq!(
            DeleteSelector::from_parts(None, None, true).unwrap(),
            DeleteSelector::All
        );
    }

    #[test]
    fn test_delete_by_filter_then_filter_is_empty() {
        let engine = engine(1);
        let vectors = (0..6)
            .map(|i| {
                let colour = if i % 2 == 0 { "red" } else { "blue" };
                v(&format!("v{}", i), vec![i as f32])
                    .with_metadata(metadata([("colour", colour.into())]))
            })
            .collect();
        engine.insert_vectors("docs", vectors, None, false).unwrap();

        let red = MetadataFilter::new().eq("colour", "red");
        let report = engine
            .delete_vectors("docs", DeleteSelector::Filter(red.clone()))
            .unwrap();
        assert_eq!(report.deleted, 3);
        assert_eq!(engine.count_vectors("docs", Some(&red)).unwrap(), 0);
        assert_eq!(engine.count_vectors("docs", None).unwrap(), 3);

        let err = engine
            .delete_vectors("docs", DeleteSelector::Filter(MetadataFilter::new()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_delete_ids_and_all() {
        let engine = engine(1);
        engine
            .insert_vectors(
                "docs",
                vec![v("a", vec![1.0]), v("b", vec![2.0]), v("c", vec![3.0])],
                None,
                false,
            )
            .unwrap();
        let report = engine
            .delete_vectors("docs", DeleteSelector::Ids(vec!["a".into(), "zzz".into()]))
            .unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failures[0].kind, ErrorKind::NotFound);
        assert!(!engine.vector_exists("docs", "a").unwrap());

        let report = engine.delete_vectors("docs", DeleteSelector::All).unwrap();
        assert_eq!(report.deleted, 2);
        assert_eq!(engine.describe_index("docs").unwrap().vector_count, 0);
    }

    #[test]
    fn test_list_with_filter_pages() {
        let engine = engine(1);
        let vectors = (0..10)
            .map(|i| {
                v(&format!("v{}", i), vec![i as f32]).with_metadata(metadata([("n", i.into())]))
            })
            .collect();
        engine.insert_vectors("docs", vectors, None, false).unwrap();

        let request = ListRequest::new(2, 0).with_filter(MetadataFilter::new().gte("n", 5));
        let first = engine.list_vectors("docs", &request).unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.next_offset, Some(2));
        let ids: Vec<_> = first.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["v5", "v6"]);
        assert!(first.entries[0].vector.is_empty());

        let last = engine
            .list_vectors("docs", &ListRequest { offset: 4, ..request }.with_vectors())
            .unwrap();
        assert_eq!(last.entries.len(), 1);
        assert_eq!(last.entries[0].vector, vec![9.0]);
        assert_eq!(last.next_offset, None);
    }

    #[test]
    fn test_get_missing_vector() {
        let engine = engine(1);
        let err = engine.get_vector("docs", "ghost", false).unwrap_err();
        assert_eq!(err, VectorError::not_found(EntityKind::Vector, "ghost"));
    }

    #[test]
    fn test_merged_helper() {
        let base = metadata([("a", 1.into()), ("b", 2.into())]);
        let patch = metadata([("b", 3.into())]);
        assert_eq!(merged(&base, &patch), metadata([("a", 1.into()), ("b", 3.into())]));
    }

    #[test]
    fn test_index_dropped_between_batches_keeps_applied_counts() {
        let engine = engine(2);
        let vectors: Vec<_> = (0..5)
            .map(|i| v(&format!("id{}", i), vec![i as f32, 1.0]))
            .collect();

        let mut first = true;
        let report = engine
            .write_batched("docs", vectors, 2, |state, item, now, report| {
                apply_put(state, item, false, now, report)?;
                if std::mem::take(&mut first) {
                    // Same effect as a delete_index landing before the next batch
                    state.meta.status = vexil_core::IndexStatus::Deleted;
                }
                Ok(())
            })
            .unwrap();

        assert_eq!(report.batches, 1);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 3);
        let ids: Vec<_> = report.failures.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["id2", "id3", "id4"]);
        assert!(report.failures.iter().all(|f| f.kind == ErrorKind::NotFound));
    }

    #[test]
    fn test_write_to_dropped_index_fails_whole_call() {
        let engine = engine(2);
        engine
            .write_index("docs", |state| {
                state.meta.status = vexil_core::IndexStatus::Deleted;
                Ok(())
            })
            .unwrap();
        let err = engine
            .insert_vectors("docs", vec![v("a", vec![1.0, 0.0])], None, false)
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
