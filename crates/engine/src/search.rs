//! Search Engine: vector, keyword and hybrid search plus metadata filtering
//!
//! All searches are exhaustive scans over one index under its read lock.
//! Scores are normalized so that higher is always better, and every result
//! list is ordered by score descending with ties broken by ascending id.

use std::ops::ControlFlow;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vexil_core::{
    matches_opt, validate_embedding, MetadataFilter, Metadata, VectorEntry, VectorError,
    VectorMatch, VectorResult,
};
use vexil_search::{rank, Fuser, KeywordQuery, ScoredId, Scorer, SearchDoc, WeightedFuser};

use crate::config::validate_weights;
use crate::distance;
use crate::engine::{IndexState, VectorEngine};

fn default_true() -> bool {
    true
}

/// Vector search parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query embedding
    pub vector: Vec<f32>,
    /// Maximum number of results
    pub top_k: usize,
    /// Optional metadata post-filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<MetadataFilter>,
    /// Drop results scoring below this value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
    /// Return embeddings
    #[serde(default)]
    pub include_vectors: bool,
    /// Return metadata
    #[serde(default = "default_true")]
    pub include_metadata: bool,
}

impl SearchRequest {
    /// Top-k search with metadata and no filter
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        SearchRequest {
            vector,
            top_k,
            filter: None,
            score_threshold: None,
            include_vectors: false,
            include_metadata: true,
        }
    }

    /// Builder: metadata post-filter
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Builder: minimum score
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.score_threshold = Some(threshold);
        self
    }

    /// Builder: include embeddings in results
    pub fn with_vectors(mut self) -> Self {
        self.include_vectors = true;
        self
    }
}

/// Hybrid search parameters; at least one of `vector` and `text` is required
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridSearchRequest {
    /// Query embedding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// Query text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Maximum number of results
    pub top_k: usize,
    /// Vector weight (engine default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_weight: Option<f32>,
    /// Keyword weight (engine default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_weight: Option<f32>,
    /// Filter applied to both sub-searches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<MetadataFilter>,
    /// Return metadata
    #[serde(default = "default_true")]
    pub include_metadata: bool,
}

impl HybridSearchRequest {
    /// Request with neither query set; add one with the builders
    pub fn new(top_k: usize) -> Self {
        HybridSearchRequest {
            vector: None,
            text: None,
            top_k,
            vector_weight: None,
            text_weight: None,
            filter: None,
            include_metadata: true,
        }
    }

    /// Builder: query embedding
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    /// Builder: query text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: fusion weights
    pub fn with_weights(mut self, vector_weight: f32, text_weight: f32) -> Self {
        self.vector_weight = Some(vector_weight);
        self.text_weight = Some(text_weight);
        self
    }

    /// Builder: filter for both sub-searches
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Hybrid search result with its sub-scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridMatch {
    /// Vector id
    pub id: String,
    /// Final score
    pub score: f32,
    /// Vector similarity, if the id was a vector candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_score: Option<f32>,
    /// Keyword overlap, if the id was a keyword candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_score: Option<f32>,
    /// Metadata, if requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Top `k` vector candidates, ranked
fn vector_candidates(
    state: &IndexState,
    query: &[f32],
    k: usize,
    filter: Option<&MetadataFilter>,
    threshold: Option<f32>,
) -> VectorResult<Vec<ScoredId>> {
    let metric = state.meta.metric;
    let mut hits = Vec::new();
    state.store.scan(0, &mut |entry| {
        if matches_opt(filter, entry.metadata) {
            let score = distance::score(metric, query, entry.vector);
            if threshold.map_or(true, |t| score >= t) {
                hits.push(ScoredId::new(entry.id, score));
            }
        }
        ControlFlow::Continue(())
    })?;
    rank(&mut hits, k);
    Ok(hits)
}

/// Top `k` keyword candidates with a positive overlap score, ranked
fn keyword_candidates(
    state: &IndexState,
    scorer: &dyn Scorer,
    query: &KeywordQuery,
    k: usize,
    filter: Option<&MetadataFilter>,
) -> VectorResult<Vec<ScoredId>> {
    let mut hits = Vec::new();
    if query.is_empty() {
        return Ok(hits);
    }
    state.store.scan(0, &mut |entry| {
        if matches_opt(filter, entry.metadata) {
            let score = scorer.score(&SearchDoc::from_metadata(entry.metadata), query);
            if score > 0.0 {
                hits.push(ScoredId::new(entry.id, score));
            }
        }
        ControlFlow::Continue(())
    })?;
    rank(&mut hits, k);
    Ok(hits)
}

fn parse_text_query(text: &str) -> VectorResult<KeywordQuery> {
    if text.trim().is_empty() {
        return Err(VectorError::invalid("query_text cannot be empty"));
    }
    Ok(KeywordQuery::parse(text))
}

/// Materialize ranked ids into matches under the same read lock
fn materialize(
    state: &IndexState,
    hits: Vec<ScoredId>,
    include_vectors: bool,
    include_metadata: bool,
) -> VectorResult<Vec<VectorMatch>> {
    let mut out = Vec::with_capacity(hits.len());
    for hit in hits {
        let mut m = VectorMatch::new(hit.id, hit.score);
        if include_vectors || include_metadata {
            if let Some(entry) = state.store.get(&m.id)? {
                m.vector = include_vectors.then(|| entry.vector.to_vec());
                m.metadata = include_metadata.then(|| entry.metadata.clone());
            }
        }
        out.push(m);
    }
    Ok(out)
}

impl VectorEngine {
    fn check_top_k(&self, top_k: usize) -> VectorResult<()> {
        if top_k > self.config.max_top_k {
            return Err(VectorError::invalid(format!(
                "top_k {} exceeds the maximum of {}",
                top_k, self.config.max_top_k
            )));
        }
        Ok(())
    }

    /// Top-k similarity search
    ///
    /// # Errors
    /// - `NotFound` if the index does not exist
    /// - `DimensionMismatch` if the query length differs from the index dimension
    /// - `InvalidArgument` for a non-finite query or threshold, or `top_k`
    ///   above `max_top_k`
    pub fn search(&self, index: &str, request: &SearchRequest) -> VectorResult<Vec<VectorMatch>> {
        self.track("search", || {
            let start = Instant::now();
            self.check_top_k(request.top_k)?;
            if request.score_threshold.map_or(false, |t| !t.is_finite()) {
                return Err(VectorError::invalid("score_threshold must be finite"));
            }
            let matches = self.read_index(index, |state| {
                validate_embedding(&request.vector, state.meta.dimension)?;
                if request.top_k == 0 {
                    return Ok(Vec::new());
                }
                let hits = vector_candidates(
                    state,
                    &request.vector,
                    request.top_k,
                    request.filter.as_ref(),
                    request.score_threshold,
                )?;
                materialize(state, hits, request.include_vectors, request.include_metadata)
            })?;
            debug!(
                target: "vexil::search",
                index,
                k = request.top_k,
                results = matches.len(),
                duration_us = start.elapsed().as_micros() as u64,
                "Vector search completed"
            );
            Ok(matches)
        })
    }

    /// Keyword search over metadata string values
    ///
    /// Scores are the fraction of unique query tokens found in the entry's
    /// metadata; entries scoring 0 are omitted.
    pub fn keyword_search(
        &self,
        index: &str,
        text: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<Vec<VectorMatch>> {
        self.track("keyword_search", || {
            self.check_top_k(top_k)?;
            let query = parse_text_query(text)?;
            self.read_index(index, |state| {
                let hits = keyword_candidates(state, &self.scorer, &query, top_k, filter)?;
                materialize(state, hits, false, true)
            })
        })
    }

    /// Weighted combination of vector and keyword search
    ///
    /// Each sub-search gathers `2 * top_k` candidates before fusion. With a
    /// single query kind its sub-search result is returned unweighted.
    pub fn hybrid_search(
        &self,
        index: &str,
        request: &HybridSearchRequest,
    ) -> VectorResult<Vec<HybridMatch>> {
        self.track("hybrid_search", || {
            let start = Instant::now();
            self.check_top_k(request.top_k)?;
            let query = request.text.as_deref().map(parse_text_query).transpose()?;
            if request.vector.is_none() && query.is_none() {
                return Err(VectorError::invalid(
                    "hybrid search requires query_vector or query_text",
                ));
            }
            let fuser = WeightedFuser::new(
                request.vector_weight.unwrap_or(self.config.hybrid_vector_weight),
                request.text_weight.unwrap_or(self.config.hybrid_text_weight),
            );
            validate_weights(fuser.vector_weight, fuser.text_weight)?;

            let filter = request.filter.as_ref();
            let matches = self.read_index(index, |state| {
                if let Some(vector) = &request.vector {
                    validate_embedding(vector, state.meta.dimension)?;
                }
                if request.top_k == 0 {
                    return Ok(Vec::new());
                }
                let pool = request.top_k.saturating_mul(2);

                let mut fused: Vec<HybridMatch> = match (&request.vector, &query) {
                    (Some(vector), None) => {
                        vector_candidates(state, vector, request.top_k, filter, None)?
                            .into_iter()
                            .map(|hit| HybridMatch {
                                id: hit.id,
                                score: hit.score,
                                vector_score: Some(hit.score),
                                text_score: None,
                                metadata: None,
                            })
                            .collect()
                    }
                    (None, Some(query)) => {
                        keyword_candidates(state, &self.scorer, query, request.top_k, filter)?
                            .into_iter()
                            .map(|hit| HybridMatch {
                                id: hit.id,
                                score: hit.score,
                                vector_score: None,
                                text_score: Some(hit.score),
                                metadata: None,
                            })
                            .collect()
                    }
                    (Some(vector), Some(query)) => {
                        let by_vector = vector_candidates(state, vector, pool, filter, None)?;
                        let by_text = keyword_candidates(state, &self.scorer, query, pool, filter)?;
                        fuser
                            .fuse(&by_vector, &by_text, request.top_k)
                            .hits
                            .into_iter()
                            .map(|hit| HybridMatch {
                                id: hit.id,
                                score: hit.score,
                                vector_score: hit.vector_score,
                                text_score: hit.text_score,
                                metadata: None,
                            })
                            .collect()
                    }
                    (None, None) => Vec::new(),
                };

                if request.include_metadata {
                    for hit in fused.iter_mut() {
                        hit.metadata = state.store.get(&hit.id)?.map(|e| e.metadata.clone());
                    }
                }
                Ok(fused)
            })?;
            debug!(
                target: "vexil::search",
                index,
                k = request.top_k,
                fuser = fuser.name(),
                results = matches.len(),
                duration_us = start.elapsed().as_micros() as u64,
                "Hybrid search completed"
            );
            Ok(matches)
        })
    }

    /// Entries whose metadata matches `filter`, in insertion order
    pub fn filter_vectors(
        &self,
        index: &str,
        filter: &MetadataFilter,
        limit: Option<usize>,
        include_vectors: bool,
    ) -> VectorResult<Vec<VectorEntry>> {
        self.track("filter_vectors", || {
            let limit = limit.unwrap_or(usize::MAX);
            self.read_index(index, |state| {
                let mut out = Vec::new();
                if limit == 0 {
                    return Ok(out);
                }
                state.store.scan(0, &mut |entry| {
                    if filter.matches(entry.metadata) {
                        out.push(entry.to_entry(include_vectors));
                        if out.len() >= limit {
                            return ControlFlow::Break(());
                        }
                    }
                    ControlFlow::Continue(())
                })?;
                Ok(out)
            })
        })
    }
}
