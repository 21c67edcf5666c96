//! Search command handlers.

use vexil_core::MetadataFilter;
use vexil_engine::{AggregateRequest, HybridSearchRequest, SearchRequest, VectorEngine};

use crate::{Output, Result};

/// Handle `Search`.
#[allow(clippy::too_many_arguments)]
pub fn search(
    engine: &VectorEngine,
    index: String,
    vector: Vec<f32>,
    top_k: usize,
    filter: Option<MetadataFilter>,
    score_threshold: Option<f32>,
    include_vectors: bool,
    include_metadata: bool,
) -> Result<Output> {
    let mut request = SearchRequest::new(vector, top_k);
    request.filter = filter;
    request.score_threshold = score_threshold;
    request.include_vectors = include_vectors;
    request.include_metadata = include_metadata;
    Ok(Output::Matches(engine.search(&index, &request)?))
}

/// Handle `KeywordSearch`.
pub fn keyword_search(
    engine: &VectorEngine,
    index: String,
    text: String,
    top_k: usize,
    filter: Option<MetadataFilter>,
) -> Result<Output> {
    Ok(Output::Matches(engine.keyword_search(
        &index,
        &text,
        top_k,
        filter.as_ref(),
    )?))
}

/// Handle `HybridSearch`; absent weights come from the engine config.
#[allow(clippy::too_many_arguments)]
pub fn hybrid_search(
    engine: &VectorEngine,
    index: String,
    vector: Option<Vec<f32>>,
    text: Option<String>,
    top_k: usize,
    vector_weight: Option<f32>,
    text_weight: Option<f32>,
    filter: Option<MetadataFilter>,
) -> Result<Output> {
    let mut request = HybridSearchRequest::new(top_k);
    request.vector = vector;
    request.text = text;
    request.vector_weight = vector_weight;
    request.text_weight = text_weight;
    request.filter = filter;
    Ok(Output::HybridMatches(engine.hybrid_search(&index, &request)?))
}

/// Handle `FilterVectors`.
pub fn filter_vectors(
    engine: &VectorEngine,
    index: String,
    filter: MetadataFilter,
    limit: Option<usize>,
    include_vectors: bool,
) -> Result<Output> {
    Ok(Output::Entries(engine.filter_vectors(
        &index,
        &filter,
        limit,
        include_vectors,
    )?))
}

/// Handle `AggregateVectors`.
pub fn aggregate_vectors(
    engine: &VectorEngine,
    index: String,
    aggregation: AggregateRequest,
) -> Result<Output> {
    Ok(Output::Aggregate(
        engine.aggregate_vectors(&index, &aggregation)?,
    ))
}
