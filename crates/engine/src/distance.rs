//! Similarity scoring
//!
//! All scores are normalized to "higher = more similar" so the search
//! engine sorts descending regardless of metric. Vectors are used as-is;
//! nothing is normalized implicitly.

use vexil_core::DistanceMetric;

/// Compute similarity score between two vectors
///
/// Single-threaded and order-stable, so repeated calls on the same input
/// return bit-identical scores.
pub fn score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(
        a.len(),
        b.len(),
        "Dimension mismatch in similarity computation"
    );

    match metric {
        DistanceMetric::Cosine => cosine_similarity(a, b),
        DistanceMetric::Euclidean => -euclidean_distance(a, b),
        DistanceMetric::DotProduct => dot_product(a, b),
    }
}

/// Cosine similarity: dot(a,b) / (||a|| * ||b||)
///
/// Range: [-1, 1]. Returns 0.0 if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product(a, b) / (norm_a * norm_b)
    }
}

/// Dot product (inner product)
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// L2 norm (Euclidean length)
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Squared L2 distance, used where only ordering matters
pub fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Euclidean distance (L2 distance)
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    squared_distance(a, b).sqrt()
}
