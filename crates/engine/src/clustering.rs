//! Seeded k-means for the clustering aggregation
//!
//! k-means++ seeding followed by Lloyd iterations over squared Euclidean
//! distance. The RNG is a `StdRng` seeded by the caller and points are
//! visited in input order, so equal input and seed give equal output.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::distance::squared_distance;

/// Output of [`kmeans`]
#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    /// One centroid per cluster
    pub centroids: Vec<Vec<f32>>,
    /// Cluster index for each input point
    pub assignments: Vec<usize>,
    /// Lloyd iterations run
    pub iterations: usize,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
}

/// Partition `points` into at most `k` clusters
///
/// Fewer than `k` clusters are returned when there are fewer than `k`
/// distinct points. `points` must be non-empty and share one dimension.
pub fn kmeans(points: &[Vec<f32>], k: usize, max_iterations: usize, seed: u64) -> KMeans {
    if points.is_empty() || k == 0 {
        return KMeans {
            centroids: Vec::new(),
            assignments: Vec::new(),
            iterations: 0,
            inertia: 0.0,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = init_plus_plus(points, k.min(points.len()), &mut rng);
    let mut assignments = assign(points, &centroids);
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        update_centroids(points, &assignments, &mut centroids);
        let next = assign(points, &centroids);
        if next == assignments {
            break;
        }
        assignments = next;
    }

    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(p, &c)| f64::from(squared_distance(p, &centroids[c])))
        .sum();
    KMeans {
        centroids,
        assignments,
        iterations,
        inertia,
    }
}

fn init_plus_plus(points: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())].clone());

    while centroids.len() < k {
        let weights: Vec<f32> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| squared_distance(p, c))
                    .fold(f32::INFINITY, f32::min)
            })
            .collect();
        let total: f32 = weights.iter().sum();
        if total <= f32::EPSILON {
            break;
        }

        let mut target = rng.gen::<f32>() * total;
        let mut chosen = weights.iter().rposition(|w| *w > 0.0).unwrap_or(0);
        for (idx, weight) in weights.iter().enumerate() {
            target -= weight;
            if target <= 0.0 && *weight > 0.0 {
                chosen = idx;
                break;
            }
        }
        centroids.push(points[chosen].clone());
    }
    centroids
}

/// Nearest centroid per point; ties go to the lower index
fn assign(points: &[Vec<f32>], centroids: &[Vec<f32>]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0;
            let mut best_dist = f32::INFINITY;
            for (idx, c) in centroids.iter().enumerate() {
                let d = squared_distance(p, c);
                if d < best_dist {
                    best_dist = d;
                    best = idx;
                }
            }
            best
        })
        .collect()
}

/// Move each centroid to the mean of its members; empty clusters stay put
fn update_centroids(points: &[Vec<f32>], assignments: &[usize], centroids: &mut [Vec<f32>]) {
    let dim = centroids.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0f64; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];
    for (p, &c) in points.iter().zip(assignments) {
        counts[c] += 1;
        for (dst, &src) in sums[c].iter_mut().zip(p) {
            *dst += f64::from(src);
        }
    }
    for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
        if count == 0 {
            continue;
        }
        for (dst, s) in centroid.iter_mut().zip(sum) {
            *dst = (s / count as f64) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.1, 0.0],
            vec![0.0, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
            vec![10.0, 10.1],
        ]
    }

    #[test]
    fn test_separates_blobs() {
        let result = kmeans(&two_blobs(), 2, 25, 7);
        assert_eq!(result.centroids.len(), 2);
        let a = result.assignments[0];
        assert!(result.assignments[..3].iter().all(|&c| c == a));
        assert!(result.assignments[3..].iter().all(|&c| c != a));
        assert!(result.inertia < 0.1);
    }

    #[test]
    fn test_same_seed_same_result() {
        let points: Vec<Vec<f32>> = (0..40)
            .map(|i| vec![(i * 7 % 13) as f32, (i * 3 % 11) as f32])
            .collect();
        assert_eq!(kmeans(&points, 4, 25, 99), kmeans(&points, 4, 25, 99));
    }

    #[test]
    fn test_k_clamped_to_distinct_points() {
        let points = vec![vec![1.0, 1.0]; 5];
        let result = kmeans(&points, 3, 10, 1);
        assert_eq!(result.centroids.len(), 1);
        assert!(result.assignments.iter().all(|&c| c == 0));

        let result = kmeans(&two_blobs(), 10, 10, 1);
        assert_eq!(result.centroids.len(), 6);
    }

    #[test]
    fn test_empty_input() {
        let result = kmeans(&[], 3, 10, 1);
        assert!(result.centroids.is_empty());
        assert_eq!(result.iterations, 0);
    }
}
