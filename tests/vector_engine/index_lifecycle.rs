//! Index lifecycle: create, describe, configure, reindex, optimize, delete

use super::common::*;
use vexil::{
    BackendKind, DistanceMetric, ErrorKind, IndexSpec, IndexStatus, MetadataValue, NewVector,
    OptimizeKind, TuningConfig, VectorEngine,
};

fn patch(pairs: &[(&str, MetadataValue)]) -> TuningConfig {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn create_describe_list() {
    let engine = VectorEngine::default();
    engine
        .create_index(
            IndexSpec::new("b_index", 8, DistanceMetric::DotProduct).with_param("m", 16),
        )
        .unwrap();
    engine
        .create_index(IndexSpec::new("a_index", 4, DistanceMetric::Euclidean))
        .unwrap();

    let info = engine.describe_index("b_index").unwrap();
    assert_eq!(info.dimension, 8);
    assert_eq!(info.metric, DistanceMetric::DotProduct);
    assert_eq!(info.status, IndexStatus::Active);
    assert_eq!(info.config.get("m"), Some(&MetadataValue::from(16)));

    let names: Vec<_> = engine
        .list_indexes(None, false)
        .unwrap()
        .into_iter()
        .map(|l| l.info.name)
        .collect();
    assert_eq!(names, vec!["a_index", "b_index"]);
}

#[test]
fn create_rejects_bad_specs() {
    let engine = engine_with_index("docs", 4, DistanceMetric::Cosine);

    let dup = engine
        .create_index(IndexSpec::new("docs", 4, DistanceMetric::Cosine))
        .unwrap_err();
    assert_eq!(dup.kind(), ErrorKind::AlreadyExists);

    let zero = engine
        .create_index(IndexSpec::new("zero", 0, DistanceMetric::Cosine))
        .unwrap_err();
    assert_eq!(zero.kind(), ErrorKind::InvalidArgument);

    let blank = engine
        .create_index(IndexSpec::new("", 4, DistanceMetric::Cosine))
        .unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn list_filters_by_backend_and_attaches_stats() {
    let engine = loaded_engine();
    engine
        .create_index(
            IndexSpec::new("remote", 4, DistanceMetric::Cosine)
                .with_backend(BackendKind::parse("qdrant")),
        )
        .unwrap();

    let memory = engine
        .list_indexes(Some(&BackendKind::Memory), true)
        .unwrap();
    assert_eq!(memory.len(), 1);
    assert_eq!(memory[0].stats.as_ref().unwrap().vector_count, 8);

    let all = engine.list_indexes(None, false).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|l| l.stats.is_none()));
}

#[test]
fn delete_requires_force_when_not_empty() {
    let engine = loaded_engine();

    let err = engine.delete_index("docs", false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotEmpty);
    assert_eq!(engine.count_vectors("docs", None).unwrap(), 8);

    let report = engine.delete_index("docs", true).unwrap();
    assert_eq!(report.deleted_vector_count, 8);
    assert_eq!(
        engine.describe_index("docs").unwrap_err().kind(),
        ErrorKind::NotFound
    );

    // The name is free again
    engine
        .create_index(IndexSpec::new("docs", 2, DistanceMetric::Cosine))
        .unwrap();
    assert_eq!(engine.count_vectors("docs", None).unwrap(), 0);
}

#[test]
fn configure_applies_valid_keys_and_rolls_back_bad_ones() {
    let engine = engine_with_index("docs", 4, DistanceMetric::Cosine);

    let report = engine
        .configure_index(
            "docs",
            patch(&[
                ("ef_search", MetadataValue::from(64)),
                ("nprobe", MetadataValue::from(-3)),
                ("dimension", MetadataValue::from(8)),
            ]),
            true,
        )
        .unwrap();

    assert_eq!(report.applied_changes, vec!["ef_search"]);
    let failed: Vec<_> = report.failed_changes.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(failed, vec!["dimension", "nprobe"]);
    assert_eq!(
        report.new_config.get("ef_search"),
        Some(&MetadataValue::from(64))
    );
    assert!(!report.new_config.contains_key("nprobe"));
    assert_eq!(engine.describe_index("docs").unwrap().dimension, 4);
}

#[test]
fn staged_config_lands_on_reindex() {
    let engine = loaded_engine();

    let report = engine
        .configure_index("docs", patch(&[("nlist", MetadataValue::from(32))]), false)
        .unwrap();
    assert_eq!(report.pending_changes, vec!["nlist"]);
    let info = engine.describe_index("docs").unwrap();
    assert!(!info.config.contains_key("nlist"));
    assert!(info.pending_config.contains_key("nlist"));

    let reindexed = engine.reindex("docs", None, true).unwrap();
    assert_eq!(reindexed.restored_vector_count, 8);
    assert_eq!(reindexed.dropped_vector_count, 0);

    let info = engine.describe_index("docs").unwrap();
    assert_eq!(info.config.get("nlist"), Some(&MetadataValue::from(32)));
    assert!(info.pending_config.is_empty());
    assert_eq!(engine.count_vectors("docs", None).unwrap(), 8);
}

#[test]
fn reindex_without_preserving_data_empties_index() {
    let engine = loaded_engine();
    let report = engine.reindex("docs", None, false).unwrap();
    assert_eq!(report.restored_vector_count, 0);
    assert_eq!(report.dropped_vector_count, 8);
    assert_eq!(engine.count_vectors("docs", None).unwrap(), 0);
}

#[test]
fn optimize_keeps_contents_and_frees_slots() {
    let engine = loaded_engine();
    engine
        .delete_vectors(
            "docs",
            vexil::DeleteSelector::Ids(vec!["n0".into(), "b0".into()]),
        )
        .unwrap();

    let before = engine.index_stats("docs").unwrap();
    assert_eq!(before.vector_count, 6);

    let report = engine.optimize_index("docs", OptimizeKind::Full).unwrap();
    assert!(!report.cancelled);
    assert_eq!(report.vector_count, 6);
    assert_eq!(report.phases.len(), 3);

    let after = engine.index_stats("docs").unwrap();
    assert_eq!(after.free_slots, 0);
    assert_eq!(after.live_slots, 6);
    assert_eq!(
        engine.describe_index("docs").unwrap().status,
        IndexStatus::Active
    );
}

#[test]
fn external_backend_rejects_writes() {
    let engine = VectorEngine::default();
    engine
        .create_index(
            IndexSpec::new("remote", 2, DistanceMetric::Cosine)
                .with_backend(BackendKind::parse("pinecone")),
        )
        .unwrap();

    let err = engine
        .insert_vectors("remote", vec![NewVector::new("a", vec![1.0, 0.0])], None, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);

    // Deleting the empty index still works
    engine.delete_index("remote", false).unwrap();
}
