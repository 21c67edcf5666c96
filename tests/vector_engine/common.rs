//! Shared fixtures for the vector engine suite.

#![allow(dead_code)]

use std::sync::Once;

use vexil::{metadata, DistanceMetric, IndexSpec, MetadataValue, NewVector, VectorEngine};

static INIT_TRACING: Once = Once::new();

/// Route engine logs to the test writer; `RUST_LOG=vexil=debug` to see them
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fresh engine with one empty index
pub fn engine_with_index(name: &str, dimension: usize, metric: DistanceMetric) -> VectorEngine {
    init_tracing();
    let engine = VectorEngine::default();
    engine
        .create_index(IndexSpec::new(name, dimension, metric))
        .unwrap();
    engine
}

/// Small labelled corpus over 4 dimensions
///
/// Ids `n0..n3` are news, `b0..b3` are blog posts; titles share words so
/// keyword search has something to rank.
pub fn corpus() -> Vec<NewVector> {
    let mut out = Vec::new();
    for i in 0..4 {
        let x = i as f32 * 0.1;
        out.push(
            NewVector::new(format!("n{}", i), vec![1.0, x, 0.0, 0.0]).with_metadata(metadata([
                ("category", MetadataValue::from("news")),
                ("year", MetadataValue::from(2019 + i as i64)),
                ("title", MetadataValue::from(format!("rust release notes {}", i))),
            ])),
        );
        out.push(
            NewVector::new(format!("b{}", i), vec![0.0, x, 1.0, 0.0]).with_metadata(metadata([
                ("category", MetadataValue::from("blog")),
                ("year", MetadataValue::from(2019 + i as i64)),
                ("title", MetadataValue::from(format!("garden diary {}", i))),
            ])),
        );
    }
    out
}

/// Engine holding `corpus()` in a cosine index named `docs`
pub fn loaded_engine() -> VectorEngine {
    let engine = engine_with_index("docs", 4, DistanceMetric::Cosine);
    let report = engine.insert_vectors("docs", corpus(), None, false).unwrap();
    assert_eq!(report.inserted, 8);
    engine
}

/// Deterministic vector from a seed, components in [-1, 1]
pub fn seeded_vector(dimension: usize, seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_add(1);
    (0..dimension)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
        })
        .collect()
}
