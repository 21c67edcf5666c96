//! Collections group indexes; membership is exclusive

use super::common::*;
use vexil::{
    BackupOptions, CollectionSpec, DistanceMetric, ErrorKind, IndexSpec, RestoreOptions,
};

#[test]
fn membership_shows_on_index_and_collection() {
    let engine = loaded_engine();
    engine
        .create_index(IndexSpec::new("images", 8, DistanceMetric::Cosine))
        .unwrap();

    let info = engine
        .create_collection(
            CollectionSpec::new("media")
                .with_description("all media")
                .with_index("images")
                .with_index("docs"),
        )
        .unwrap();
    assert_eq!(info.indexes, vec!["docs", "images"]);
    assert_eq!(
        engine.describe_index("docs").unwrap().collection.as_deref(),
        Some("media")
    );

    let err = engine
        .create_collection(CollectionSpec::new("other").with_index("docs"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let info = engine
        .remove_index_from_collection("media", "images")
        .unwrap();
    assert_eq!(info.indexes, vec!["docs"]);
    let err = engine
        .add_index_to_collection("missing", "images")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn delete_modes() {
    let engine = loaded_engine();
    engine
        .create_collection(CollectionSpec::new("media").with_index("docs"))
        .unwrap();

    let err = engine.delete_collection("media", false, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotEmpty);

    // Detach keeps the index
    let report = engine.delete_collection("media", false, true).unwrap();
    assert_eq!(report.detached_indexes, vec!["docs"]);
    assert!(engine.describe_index("docs").unwrap().collection.is_none());

    engine
        .create_collection(CollectionSpec::new("media").with_index("docs"))
        .unwrap();
    let report = engine.delete_collection("media", true, true).unwrap();
    assert_eq!(report.deleted_indexes, vec!["docs"]);
    assert_eq!(report.deleted_vector_count, 8);
    assert_eq!(
        engine.describe_index("docs").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(engine.list_collections().unwrap().is_empty());
}

#[test]
fn deleting_member_index_updates_collection() {
    let engine = loaded_engine();
    engine
        .create_collection(CollectionSpec::new("media").with_index("docs"))
        .unwrap();

    engine.delete_index("docs", true).unwrap();
    assert!(engine
        .describe_collection("media")
        .unwrap()
        .indexes
        .is_empty());
}

#[test]
fn restore_overwrite_keeps_membership() {
    let engine = loaded_engine();
    engine
        .create_collection(CollectionSpec::new("media").with_index("docs"))
        .unwrap();
    engine
        .backup_index("docs", &BackupOptions::default().named("snap"))
        .unwrap();
    engine
        .restore_index("snap", &RestoreOptions::default().overwrite())
        .unwrap();

    assert_eq!(
        engine.describe_index("docs").unwrap().collection.as_deref(),
        Some("media")
    );
}
