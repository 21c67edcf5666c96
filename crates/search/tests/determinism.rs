//! Determinism and Consistency Tests
//!
//! Keyword scoring and fusion must give the same ranking for the same
//! inputs, independent of candidate order and hash-map iteration.

use vexil_core::{metadata, MetadataValue};
use vexil_search::{
    rank, Fuser, KeywordQuery, OverlapScorer, ScoredId, Scorer, SearchDoc, WeightedFuser,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn ids(hits: &[ScoredId]) -> Vec<&str> {
    hits.iter().map(|h| h.id.as_str()).collect()
}

fn tied_candidates() -> Vec<ScoredId> {
    vec![
        ScoredId::new("doc_c", 0.5),
        ScoredId::new("doc_a", 0.5),
        ScoredId::new("doc_d", 0.9),
        ScoredId::new("doc_b", 0.5),
    ]
}

// ============================================================================
// Ranking
// ============================================================================

#[test]
fn test_rank_breaks_ties_by_id() {
    let mut hits = tied_candidates();
    rank(&mut hits, 10);
    assert_eq!(ids(&hits), vec!["doc_d", "doc_a", "doc_b", "doc_c"]);
}

#[test]
fn test_rank_independent_of_input_order() {
    let mut forward = tied_candidates();
    let mut backward: Vec<_> = tied_candidates().into_iter().rev().collect();
    rank(&mut forward, 3);
    rank(&mut backward, 3);
    assert_eq!(forward, backward);
}

// ============================================================================
// Fusion
// ============================================================================

#[test]
fn test_fusion_repeatable() {
    let fuser = WeightedFuser::default();
    let vector = vec![
        ScoredId::new("a", 0.9),
        ScoredId::new("b", 0.8),
        ScoredId::new("c", 0.1),
    ];
    let text = vec![ScoredId::new("c", 1.0), ScoredId::new("d", 0.5)];

    let first = fuser.fuse(&vector, &text, 4);
    for _ in 0..20 {
        let again = fuser.fuse(&vector, &text, 4);
        assert_eq!(again.hits, first.hits);
    }
}

#[test]
fn test_fusion_weights_and_missing_subscores() {
    let fuser = WeightedFuser::new(0.5, 0.5);
    let vector = vec![ScoredId::new("only_vector", 0.8)];
    let text = vec![ScoredId::new("only_text", 0.6)];

    let fused = fuser.fuse(&vector, &text, 10);
    assert_eq!(fused.hits[0].id, "only_vector");
    assert!((fused.hits[0].score - 0.4).abs() < 1e-6);
    assert_eq!(fused.hits[0].text_score, None);
    assert!((fused.hits[1].score - 0.3).abs() < 1e-6);
    assert_eq!(fused.hits[1].vector_score, None);
    assert!(!fused.truncated);
}

#[test]
fn test_fusion_truncates_to_k() {
    let fuser = WeightedFuser::default();
    let vector: Vec<_> = (0..10)
        .map(|i| ScoredId::new(format!("v{}", i), i as f32 / 10.0))
        .collect();
    let fused = fuser.fuse(&vector, &[], 3);
    assert_eq!(fused.hits.len(), 3);
    assert!(fused.truncated);
    assert_eq!(fused.hits[0].id, "v9");
}

// ============================================================================
// Scoring
// ============================================================================

#[test]
fn test_overlap_ignores_case_and_punctuation() {
    let scorer = OverlapScorer::new();
    let doc = SearchDoc::from_metadata(&metadata([
        ("title", MetadataValue::from("Rust: Release Notes")),
        ("year", MetadataValue::from(2024)),
    ]));

    let exact = scorer.score(&doc, &KeywordQuery::parse("rust release"));
    let shouty = scorer.score(&doc, &KeywordQuery::parse("RUST, release!"));
    assert_eq!(exact, shouty);
    assert!((exact - 1.0).abs() < 1e-6);

    // Numbers are not text terms
    let numeric = scorer.score(&doc, &KeywordQuery::parse("2024"));
    assert_eq!(numeric, 0.0);
}
