//! Vexil - embedded vector index and similarity-search engine
//!
//! Vexil manages named vector indexes, runs top-k similarity, keyword and
//! hybrid search over them, groups indexes into collections and snapshots
//! them into an in-process backup catalog.
//!
//! # Quick Start
//!
//! ```ignore
//! use vexil::{DistanceMetric, IndexSpec, NewVector, SearchRequest, VectorEngine};
//!
//! let engine = VectorEngine::default();
//! engine.create_index(IndexSpec::new("docs", 3, DistanceMetric::Cosine))?;
//! engine.insert_vectors("docs", vec![NewVector::new("a", vec![1.0, 0.0, 0.0])], None, false)?;
//!
//! let hits = engine.search("docs", &SearchRequest::new(vec![1.0, 0.0, 0.0], 5))?;
//! ```
//!
//! # Architecture
//!
//! [`VectorEngine`] is the typed API. The [`Executor`] wraps it in a
//! serializable [`Command`]/[`Output`] surface for SDKs and wire front ends.
//! Storage backends, distance kernels and keyword scoring live in the
//! member crates and are reached through the engine.

// Command surface
pub use vexil_executor::{
    BatchItem, BatchReport, BatchStatus, Command, Error, Executor, Output, Result,
};

// Typed engine API
pub use vexil_engine::*;

/// Keyword tokenizer and scorer used by keyword and hybrid search
pub use vexil_search as keyword;
