//! Similarity, keyword, hybrid search and aggregation over a small corpus

use super::common::*;
use vexil::{
    AggregateKind, AggregateRequest, AggregateResult, DistanceMetric, ErrorKind,
    HybridSearchRequest, MetadataFilter, NewVector, SearchRequest,
};

#[test]
fn similarity_ranks_nearest_first() {
    let engine = loaded_engine();
    let hits = engine
        .search("docs", &SearchRequest::new(vec![1.0, 0.0, 0.0, 0.0], 3))
        .unwrap();

    let ids: Vec<_> = hits.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["n0", "n1", "n2"]);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!((hits[0].score - 1.0).abs() < 1e-5);
}

#[test]
fn filter_and_threshold_narrow_results() {
    let engine = loaded_engine();
    let request = SearchRequest::new(vec![0.5, 0.0, 0.5, 0.0], 10)
        .with_filter(MetadataFilter::new().eq("category", "blog").gte("year", 2021));
    let hits = engine.search("docs", &request).unwrap();
    let ids: Vec<_> = hits.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(hits.len(), 2);
    assert!(ids.contains(&"b2") && ids.contains(&"b3"));

    let strict = SearchRequest::new(vec![1.0, 0.0, 0.0, 0.0], 10).with_threshold(0.99);
    let hits = engine.search("docs", &strict).unwrap();
    assert!(hits.iter().all(|m| m.score >= 0.99));
    assert!(hits.iter().all(|m| m.id.starts_with('n')));
}

#[test]
fn top_k_bounds() {
    let engine = loaded_engine();
    let empty = engine
        .search("docs", &SearchRequest::new(vec![1.0, 0.0, 0.0, 0.0], 0))
        .unwrap();
    assert!(empty.is_empty());

    let err = engine
        .search(
            "docs",
            &SearchRequest::new(vec![1.0, 0.0, 0.0, 0.0], engine.config().max_top_k + 1),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // More than stored returns everything
    let all = engine
        .search("docs", &SearchRequest::new(vec![1.0, 0.0, 0.0, 0.0], 100))
        .unwrap();
    assert_eq!(all.len(), 8);
}

#[test]
fn euclidean_scores_prefer_closer_points() {
    let engine = engine_with_index("points", 2, DistanceMetric::Euclidean);
    engine
        .insert_vectors(
            "points",
            vec![
                NewVector::new("near", vec![1.0, 1.0]),
                NewVector::new("far", vec![10.0, 10.0]),
            ],
            None,
            false,
        )
        .unwrap();

    let hits = engine
        .search("points", &SearchRequest::new(vec![0.0, 0.0], 2))
        .unwrap();
    assert_eq!(hits[0].id, "near");
    assert!(hits[0].score > hits[1].score);
}

#[test]
fn keyword_search_ranks_by_overlap() {
    let engine = loaded_engine();

    let hits = engine.keyword_search("docs", "garden diary", 3, None).unwrap();
    let ids: Vec<_> = hits.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["b0", "b1", "b2"]);
    assert!(hits.iter().all(|m| (m.score - 1.0).abs() < 1e-6));

    let half = engine.keyword_search("docs", "garden rust", 10, None).unwrap();
    assert_eq!(half.len(), 8);
    assert!(half.iter().all(|m| (m.score - 0.5).abs() < 1e-6));

    let err = engine.keyword_search("docs", "   ", 3, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn hybrid_search_fuses_both_signals() {
    let engine = loaded_engine();
    let request = HybridSearchRequest::new(3)
        .with_vector(vec![0.0, 0.0, 1.0, 0.0])
        .with_text("garden diary");
    let hits = engine.hybrid_search("docs", &request).unwrap();

    assert_eq!(hits[0].id, "b0");
    assert!(hits[0].vector_score.is_some());
    assert!(hits[0].text_score.is_some());
    assert!(hits.iter().all(|h| h.id.starts_with('b')));
    assert!(hits[0].metadata.is_some());

    let bad = HybridSearchRequest::new(3)
        .with_text("garden")
        .with_weights(-0.5, 1.0);
    let err = engine.hybrid_search("docs", &bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let neither = HybridSearchRequest::new(3);
    let err = engine.hybrid_search("docs", &neither).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn filter_vectors_returns_insertion_order() {
    let engine = loaded_engine();
    let entries = engine
        .filter_vectors(
            "docs",
            &MetadataFilter::new().is_in("year", [2019, 2020]),
            None,
            false,
        )
        .unwrap();
    let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["n0", "b0", "n1", "b1"]);
    assert!(entries.iter().all(|e| e.vector.is_empty()));
}

#[test]
fn centroid_grouped_by_category() {
    let engine = loaded_engine();
    let report = engine
        .aggregate_vectors(
            "docs",
            &AggregateRequest::new(AggregateKind::Centroid).group_by("category"),
        )
        .unwrap();

    assert_eq!(report.groups.len(), 2);
    for group in &report.groups {
        assert_eq!(group.count, 4);
        match &group.result {
            AggregateResult::Centroid { centroid } => {
                assert_eq!(centroid.len(), 4);
                assert!((centroid[1] - 0.15).abs() < 1e-5);
            }
            other => panic!("Expected Centroid, got {:?}", other),
        }
    }
}

#[test]
fn clustering_is_deterministic_for_a_seed() {
    let engine = loaded_engine();
    let request = AggregateRequest::new(AggregateKind::Clustering {
        num_clusters: 2,
        seed: Some(7),
    });

    let first = engine.aggregate_vectors("docs", &request).unwrap();
    let second = engine.aggregate_vectors("docs", &request).unwrap();
    assert_eq!(first, second);

    match &first.groups[0].result {
        AggregateResult::Clustering { clusters, .. } => {
            assert_eq!(clusters.len(), 2);
            let mut members: Vec<&str> = clusters
                .iter()
                .flat_map(|c| c.members.iter().map(String::as_str))
                .collect();
            members.sort_unstable();
            assert_eq!(members, vec!["b0", "b1", "b2", "b3", "n0", "n1", "n2", "n3"]);
        }
        other => panic!("Expected Clustering, got {:?}", other),
    }
}
