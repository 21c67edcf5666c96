//! Test modules for the executor crate.


use std::sync::Arc;

use vexil_core::{metadata, MetadataValue, NewVector};
use vexil_engine::VectorEngine;

use crate::{Command, Executor};

/// Executor over a fresh engine
pub(crate) fn create_test_executor() -> Executor {
    Executor::new(Arc::new(VectorEngine::default()))
}

pub(crate) fn create_index(name: &str, dimension: usize) -> Command {
    Command::CreateIndex {
        name: name.to_string(),
        dimension,
        metric: Default::default(),
        index_type: Default::default(),
        backend: None,
        config: Default::default(),
    }
}

/// Three 3-d vectors tagged by category
pub(crate) fn insert_sample(index: &str) -> Command {
    let tagged = |id: &str, v: Vec<f32>, category: &str| {
        NewVector::new(id, v).with_metadata(metadata([(
            "category",
            MetadataValue::from(category),
        )]))
    };
    Command::InsertVectors {
        index: index.to_string(),
        vectors: vec![
            tagged("a", vec![1.0, 0.0, 0.0], "news"),
            tagged("b", vec![0.0, 1.0, 0.0], "blog"),
            tagged("c", vec![0.9, 0.1, 0.0], "news"),
        ],
        batch_size: None,
        upsert: false,
    }
}
