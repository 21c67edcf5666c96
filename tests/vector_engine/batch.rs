//! JSON command surface and batch execution through the facade

use std::sync::Arc;

use serde_json::json;
use vexil::{BatchStatus, Command, Error, Executor, Output, VectorEngine};

fn command(value: serde_json::Value) -> Command {
    serde_json::from_value(value).unwrap()
}

fn executor() -> Executor {
    super::common::init_tracing();
    Executor::new(Arc::new(VectorEngine::default()))
}

#[test]
fn json_script_runs_end_to_end() {
    let executor = executor();
    let script = vec![
        command(json!({"op": "create_index", "name": "docs", "dimension": 2})),
        command(json!({
            "op": "insert_vectors",
            "index": "docs",
            "vectors": [
                {"id": "a", "vector": [1.0, 0.0], "metadata": {"lang": "en"}},
                {"id": "b", "vector": [0.0, 1.0], "metadata": {"lang": "de"}}
            ]
        })),
        command(json!({
            "op": "search",
            "index": "docs",
            "vector": [1.0, 0.1],
            "top_k": 1,
            "filter": {"lang": {"$in": ["en", "fr"]}}
        })),
    ];

    let report = executor.batch_operations(script, false, true);
    assert!(report.all_succeeded());
    match &report.items[2].output {
        Some(Output::Matches(matches)) => {
            assert_eq!(matches.len(), 1);
            assert_eq!(matches[0].id, "a");
        }
        other => panic!("Expected Matches, got {:?}", other),
    }
}

#[test]
fn bad_filter_json_is_rejected_at_parse() {
    let parsed: Result<Command, _> = serde_json::from_value(json!({
        "op": "count_vectors",
        "index": "docs",
        "filter": {"lang": {"$in": "en"}}
    }));
    assert!(parsed.is_err());
}

#[test]
fn parallel_writes_to_distinct_indexes() {
    let executor = executor();
    let names: Vec<String> = (0..8).map(|i| format!("idx{}", i)).collect();
    for name in &names {
        executor
            .execute(command(json!({"op": "create_index", "name": name, "dimension": 2})))
            .unwrap();
    }

    let writes: Vec<Command> = names
        .iter()
        .map(|name| {
            let vectors: Vec<_> = (0..50)
                .map(|i| json!({"id": format!("v{}", i), "vector": [i as f32, 1.0]}))
                .collect();
            command(json!({"op": "insert_vectors", "index": name, "vectors": vectors}))
        })
        .collect();

    let report = executor.batch_operations(writes, true, false);
    assert_eq!(report.succeeded, 8);
    assert!(report
        .items
        .iter()
        .all(|item| item.status == BatchStatus::Succeeded));
    assert_eq!(executor.engine().engine_stats().total_vectors, 400);
}

#[test]
fn sequential_fail_fast_leaves_later_writes_unapplied() {
    let executor = executor();
    let report = executor.batch_operations(
        vec![
            command(json!({"op": "create_index", "name": "docs", "dimension": 2})),
            command(json!({"op": "create_index", "name": "docs", "dimension": 2})),
            command(json!({"op": "create_index", "name": "later", "dimension": 2})),
        ],
        false,
        true,
    );

    assert_eq!(report.items[1].status, BatchStatus::Failed);
    assert_eq!(report.items[2].status, BatchStatus::Skipped);
    assert!(matches!(
        report.first_error(),
        Some(Error::AlreadyExists { .. })
    ));
    assert!(executor
        .execute(command(json!({"op": "describe_index", "name": "later"})))
        .is_err());
}
