//! Fusion of vector and keyword result lists
//!
//! This module provides:
//! - `rank`: the shared deterministic ordering (score desc, id asc)
//! - `Fuser` trait for pluggable fusion algorithms
//! - `WeightedFuser`: linear combination of sub-scores (hybrid default)

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

// ============================================================================
// ScoredId / ranking
// ============================================================================

/// A candidate id with a sub-search score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredId {
    /// Vector id
    pub id: String,
    /// Score (higher = better)
    pub score: f32,
}

impl ScoredId {
    /// Create a new ScoredId
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        ScoredId {
            id: id.into(),
            score,
        }
    }
}

/// Deterministic result order: score descending, then id ascending
pub fn compare_ranked(a_score: f32, a_id: &str, b_score: f32, b_id: &str) -> Ordering {
    b_score
        .partial_cmp(&a_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_id.cmp(b_id))
}

/// Sort into result order and keep the first `k`
pub fn rank(hits: &mut Vec<ScoredId>, k: usize) {
    hits.sort_by(|a, b| compare_ranked(a.score, &a.id, b.score, &b.id));
    hits.truncate(k);
}

// ============================================================================
// FusedResult
// ============================================================================

/// One fused hit with its contributing sub-scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    /// Vector id
    pub id: String,
    /// Final score
    pub score: f32,
    /// Vector sub-score, if the id appeared in the vector list
    pub vector_score: Option<f32>,
    /// Keyword sub-score, if the id appeared in the keyword list
    pub text_score: Option<f32>,
}

/// Result of fusing two ranked lists
#[derive(Debug, Clone, Default)]
pub struct FusedResult {
    /// Final ranked list of hits
    pub hits: Vec<FusedHit>,
    /// Whether results were truncated
    pub truncated: bool,
}

// ============================================================================
// Fuser Trait
// ============================================================================

/// Pluggable fusion interface
///
/// Fusers must be Send + Sync for concurrent search operations.
pub trait Fuser: Send + Sync {
    /// Fuse a vector result list and a keyword result list into `k` hits
    fn fuse(&self, vector: &[ScoredId], text: &[ScoredId], k: usize) -> FusedResult;

    /// Name for debugging and logging
    fn name(&self) -> &str;
}

// ============================================================================
// WeightedFuser
// ============================================================================

/// `final = vector_weight * vector_score + text_weight * text_score`
///
/// A sub-score missing for an id counts as 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedFuser {
    /// Weight of the vector sub-score
    pub vector_weight: f32,
    /// Weight of the keyword sub-score
    pub text_weight: f32,
}

impl WeightedFuser {
    /// Create a fuser with the given weights
    pub fn new(vector_weight: f32, text_weight: f32) -> Self {
        WeightedFuser {
            vector_weight,
            text_weight,
        }
    }
}

impl Default for WeightedFuser {
    fn default() -> Self {
        WeightedFuser::new(0.7, 0.3)
    }
}

impl Fuser for WeightedFuser {
    fn fuse(&self, vector: &[ScoredId], text: &[ScoredId], k: usize) -> FusedResult {
        let mut merged: HashMap<&str, (Option<f32>, Option<f32>)> = HashMap::new();
        for hit in vector {
            merged.entry(hit.id.as_str()).or_default().0 = Some(hit.score);
        }
        for hit in text {
            merged.entry(hit.id.as_str()).or_default().1 = Some(hit.score);
        }

        let mut hits: Vec<FusedHit> = merged
            .into_iter()
            .map(|(id, (vector_score, text_score))| FusedHit {
                id: id.to_string(),
                score: self.vector_weight * vector_score.unwrap_or(0.0)
                    + self.text_weight * text_score.unwrap_or(0.0),
                vector_score,
                text_score,
            })
            .collect();

        hits.sort_by(|a, b| compare_ranked(a.score, &a.id, b.score, &b.id));
        let truncated = hits.len() > k;
        hits.truncate(k);
        FusedResult { hits, truncated }
    }

    fn name(&self) -> &str {
        "weighted"
    }
}

// ============================================================================
// Tests
// ============================================================================
