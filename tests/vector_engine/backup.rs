//! Backup catalog: snapshot, restore, file transfer between engines

use super::common::*;
use tempfile::TempDir;
use vexil::{
    BackupOptions, Compression, DeleteSelector, ErrorKind, MetadataValue, RestoreOptions,
    SearchRequest, VectorEngine,
};

#[test]
fn restore_overwrite_rolls_index_back() {
    let engine = loaded_engine();
    let info = engine
        .backup_index(
            "docs",
            &BackupOptions::default()
                .named("before")
                .with_compression(Compression::Zstd),
        )
        .unwrap();
    assert_eq!(info.vector_count, 8);
    assert_eq!(info.compression, Compression::Zstd);

    engine
        .delete_vectors("docs", DeleteSelector::All)
        .unwrap();
    assert_eq!(engine.count_vectors("docs", None).unwrap(), 0);

    let err = engine
        .restore_index("before", &RestoreOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let report = engine
        .restore_index("before", &RestoreOptions::default().overwrite())
        .unwrap();
    assert!(!report.created);
    assert_eq!(report.restored_vector_count, 8);

    let entry = engine.get_vector("docs", "n2", true).unwrap();
    assert_eq!(entry.vector, vec![1.0, 0.2, 0.0, 0.0]);
    assert_eq!(
        entry.metadata.get("category"),
        Some(&MetadataValue::from("news"))
    );
    let hits = engine
        .search("docs", &SearchRequest::new(vec![0.0, 0.0, 1.0, 0.0], 1))
        .unwrap();
    assert_eq!(hits[0].id, "b0");
}

#[test]
fn restore_into_new_index_leaves_source_alone() {
    let engine = loaded_engine();
    engine
        .backup_index("docs", &BackupOptions::default().named("snap"))
        .unwrap();

    let report = engine
        .restore_index("snap", &RestoreOptions::default().into_index("docs_copy"))
        .unwrap();
    assert!(report.created);

    engine
        .delete_vectors("docs_copy", DeleteSelector::Ids(vec!["n0".into()]))
        .unwrap();
    assert_eq!(engine.count_vectors("docs", None).unwrap(), 8);
    assert_eq!(engine.count_vectors("docs_copy", None).unwrap(), 7);
}

#[test]
fn schema_only_backup_restores_empty_index() {
    let engine = loaded_engine();
    let info = engine
        .backup_index(
            "docs",
            &BackupOptions::default().named("schema").without_vectors(),
        )
        .unwrap();
    assert_eq!(info.vector_count, 0);
    assert!(!info.include_vectors);

    engine
        .restore_index("schema", &RestoreOptions::default().into_index("empty"))
        .unwrap();
    let described = engine.describe_index("empty").unwrap();
    assert_eq!(described.dimension, 4);
    assert_eq!(engine.count_vectors("empty", None).unwrap(), 0);
}

#[test]
fn exported_file_imports_into_another_engine() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docs.vxbk");

    let source = loaded_engine();
    source
        .backup_index(
            "docs",
            &BackupOptions::default()
                .named("nightly")
                .with_compression(Compression::Zstd),
        )
        .unwrap();
    let exported = source.export_backup("nightly", &path).unwrap();

    let target = VectorEngine::default();
    let imported = target.import_backup(&path).unwrap();
    assert_eq!(imported.name, exported.name);
    assert_eq!(imported.id, exported.id);
    assert_eq!(imported.vector_count, 8);

    target
        .restore_index("nightly", &RestoreOptions::default())
        .unwrap();
    assert_eq!(target.count_vectors("docs", None).unwrap(), 8);

    // Same name again is a conflict
    let err = target.import_backup(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn catalog_listing_and_delete() {
    let engine = loaded_engine();
    for name in ["b", "a", "c"] {
        engine
            .backup_index("docs", &BackupOptions::default().named(name))
            .unwrap();
    }
    let names: Vec<_> = engine
        .list_backups()
        .unwrap()
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let dropped = engine.delete_backup("b").unwrap();
    assert_eq!(dropped.name, "b");
    assert_eq!(
        engine.describe_backup("b").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(engine.engine_stats().backup_count, 2);
}
