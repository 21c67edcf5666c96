//! Property tests: exact top-k and filter counts against brute force, and
//! the write pipeline against a map model

use std::collections::BTreeMap;

use proptest::prelude::*;
use vexil::keyword::compare_ranked;
use vexil::{
    distance, metadata, DeleteSelector, DistanceMetric, IndexSpec, ListRequest, MetadataFilter,
    MetadataValue, NewVector, SearchRequest, VectorEngine, VectorUpdate,
};

const DIM: usize = 4;

fn vectors(max: usize) -> impl Strategy<Value = Vec<(Vec<f32>, u8)>> {
    prop::collection::vec(
        (prop::collection::vec(-1.0f32..1.0, DIM), 0u8..4),
        1..max,
    )
}

fn load(metric: DistanceMetric, rows: &[(Vec<f32>, u8)]) -> VectorEngine {
    let engine = VectorEngine::default();
    engine
        .create_index(IndexSpec::new("prop", DIM, metric))
        .unwrap();
    let batch = rows
        .iter()
        .enumerate()
        .map(|(i, (v, bucket))| {
            NewVector::new(format!("v{:03}", i), v.clone())
                .with_metadata(metadata([("bucket", MetadataValue::from(*bucket as i64))]))
        })
        .collect();
    engine.insert_vectors("prop", batch, Some(7), false).unwrap();
    engine
}

#[derive(Debug, Clone)]
enum WriteOp {
    Insert { id: u8, vector: Vec<f32>, upsert: bool },
    Update { id: u8, vector: Vec<f32> },
    Delete { id: u8 },
}

fn embedding() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec((-3i8..=3).prop_map(f32::from), DIM)
}

fn write_op() -> impl Strategy<Value = WriteOp> {
    prop_oneof![
        (0u8..8, embedding(), any::<bool>())
            .prop_map(|(id, vector, upsert)| WriteOp::Insert { id, vector, upsert }),
        (0u8..8, embedding()).prop_map(|(id, vector)| WriteOp::Update { id, vector }),
        (0u8..8).prop_map(|id| WriteOp::Delete { id }),
    ]
}

fn key(id: u8) -> String {
    format!("k{}", id)
}

/// Live ids with their embedding and insertion sequence
#[derive(Default)]
struct Model {
    rows: BTreeMap<String, (Vec<f32>, u64)>,
    next_seq: u64,
}

impl Model {
    /// Returns whether the engine should report the item as failed
    fn apply(&mut self, op: &WriteOp) -> bool {
        match op {
            WriteOp::Insert { id, vector, upsert } => match self.rows.get_mut(&key(*id)) {
                Some(row) if *upsert => {
                    row.0 = vector.clone();
                    false
                }
                Some(_) => true,
                None => {
                    self.rows.insert(key(*id), (vector.clone(), self.next_seq));
                    self.next_seq += 1;
                    false
                }
            },
            WriteOp::Update { id, vector } => match self.rows.get_mut(&key(*id)) {
                Some(row) => {
                    row.0 = vector.clone();
                    false
                }
                None => true,
            },
            WriteOp::Delete { id } => self.rows.remove(&key(*id)).is_none(),
        }
    }

    fn ids_in_insertion_order(&self) -> Vec<String> {
        let mut ids: Vec<(&u64, &String)> =
            self.rows.iter().map(|(id, (_, seq))| (seq, id)).collect();
        ids.sort();
        ids.into_iter().map(|(_, id)| id.clone()).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn writes_match_map_model(ops in prop::collection::vec(write_op(), 1..60)) {
        let engine = VectorEngine::default();
        engine
            .create_index(IndexSpec::new("model", DIM, DistanceMetric::Euclidean))
            .unwrap();
        let mut model = Model::default();

        for op in &ops {
            let report = match op.clone() {
                WriteOp::Insert { id, vector, upsert } => engine
                    .insert_vectors("model", vec![NewVector::new(key(id), vector)], None, upsert)
                    .unwrap(),
                WriteOp::Update { id, vector } => {
                    let update = VectorUpdate {
                        id: key(id),
                        vector: Some(vector),
                        metadata: None,
                        merge_metadata: false,
                    };
                    engine.update_vectors("model", vec![update], None).unwrap()
                }
                WriteOp::Delete { id } => engine
                    .delete_vectors("model", DeleteSelector::Ids(vec![key(id)]))
                    .unwrap(),
            };
            let should_fail = model.apply(op);
            prop_assert_eq!(report.failed == 1, should_fail, "{:?}", op);
            prop_assert_eq!(engine.count_vectors("model", None).unwrap(), model.rows.len());
        }

        for id in 0..8u8 {
            let exists = engine.vector_exists("model", &key(id)).unwrap();
            prop_assert_eq!(exists, model.rows.contains_key(&key(id)));
            if let Some((vector, _)) = model.rows.get(&key(id)) {
                let entry = engine.get_vector("model", &key(id), true).unwrap();
                prop_assert_eq!(&entry.vector, vector);
            }
        }

        let page = engine
            .list_vectors("model", &ListRequest::new(100, 0))
            .unwrap();
        let listed: Vec<String> = page.entries.into_iter().map(|e| e.id).collect();
        prop_assert_eq!(page.total, model.rows.len());
        prop_assert_eq!(listed, model.ids_in_insertion_order());
    }

    #[test]
    fn repeated_upsert_is_idempotent(
        rows in vectors(40),
        query in prop::collection::vec(-1.0f32..1.0, DIM),
    ) {
        let engine = load(DistanceMetric::Euclidean, &rows);
        let request = SearchRequest::new(query, 10);
        let before_hits = engine.search("prop", &request).unwrap();
        let mut everything = ListRequest::new(100, 0);
        everything.include_vectors = true;
        let before_page = engine.list_vectors("prop", &everything).unwrap();

        let batch: Vec<NewVector> = before_page
            .entries
            .iter()
            .map(|e| {
                NewVector::new(e.id.clone(), e.vector.clone()).with_metadata(e.metadata.clone())
            })
            .collect();
        let report = engine.insert_vectors("prop", batch, Some(7), true).unwrap();
        prop_assert_eq!(report.inserted, 0);
        prop_assert_eq!(report.updated, rows.len());
        prop_assert_eq!(report.failed, 0);

        prop_assert_eq!(engine.count_vectors("prop", None).unwrap(), rows.len());
        prop_assert_eq!(engine.search("prop", &request).unwrap(), before_hits);
        prop_assert_eq!(engine.list_vectors("prop", &everything).unwrap(), before_page);
    }

    #[test]
    fn search_matches_brute_force(
        rows in vectors(60),
        query in prop::collection::vec(-1.0f32..1.0, DIM),
        k in 1usize..20,
        dot in any::<bool>(),
    ) {
        let metric = if dot { DistanceMetric::DotProduct } else { DistanceMetric::Euclidean };
        let engine = load(metric, &rows);

        let mut expected: Vec<(String, f32)> = rows
            .iter()
            .enumerate()
            .map(|(i, (v, _))| (format!("v{:03}", i), distance::score(metric, &query, v)))
            .collect();
        expected.sort_by(|a, b| compare_ranked(a.1, &a.0, b.1, &b.0));
        expected.truncate(k);

        let hits = engine
            .search("prop", &SearchRequest::new(query.clone(), k))
            .unwrap();
        let got: Vec<&str> = hits.iter().map(|m| m.id.as_str()).collect();
        let want: Vec<&str> = expected.iter().map(|(id, _)| id.as_str()).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn filtered_count_matches_brute_force(rows in vectors(80), bucket in 0u8..4) {
        let engine = load(DistanceMetric::Euclidean, &rows);
        let filter = MetadataFilter::new().eq("bucket", bucket as i64);

        let expected = rows.iter().filter(|(_, b)| *b == bucket).count();
        prop_assert_eq!(engine.count_vectors("prop", Some(&filter)).unwrap(), expected);

        let entries = engine.filter_vectors("prop", &filter, None, false).unwrap();
        prop_assert_eq!(entries.len(), expected);
        prop_assert!(entries.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn filter_json_round_trips(low in 0i64..50, span in 0i64..50, lang in "[a-z]{2}") {
        // Parsed conditions come back in field-name order
        let filter = MetadataFilter::new()
            .eq("lang", lang.as_str())
            .lte("score", low + span)
            .gte("year", low);
        let text = serde_json::to_string(&filter).unwrap();
        let back: MetadataFilter = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(back, filter);
    }
}
