//! Vector aggregation: centroid, per-dimension statistics, clustering
//!
//! Matching embeddings are copied out under the index read lock; the
//! arithmetic runs after the lock is released.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vexil_core::{MetadataFilter, VectorEntry, VectorError, VectorResult};

use crate::clustering::kmeans;
use crate::engine::VectorEngine;
use crate::vectors::collect_matching;

/// Seed used when a clustering request names none
pub const DEFAULT_CLUSTER_SEED: u64 = 0x5eed;

/// Aggregation to compute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateKind {
    /// Element-wise mean embedding
    Centroid,
    /// Count, mean and population variance per dimension
    Stats,
    /// Seeded k-means partition
    Clustering {
        /// Requested cluster count
        num_clusters: usize,
        /// RNG seed; equal seeds give equal partitions
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
}

impl AggregateKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Centroid => "centroid",
            AggregateKind::Stats => "stats",
            AggregateKind::Clustering { .. } => "clustering",
        }
    }
}

/// Parameters for `aggregate_vectors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRequest {
    /// Aggregation
    #[serde(flatten)]
    pub kind: AggregateKind,
    /// Restrict to matching metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<MetadataFilter>,
    /// Aggregate separately per distinct value of this metadata field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

impl AggregateRequest {
    /// Ungrouped, unfiltered aggregation
    pub fn new(kind: AggregateKind) -> Self {
        AggregateRequest {
            kind,
            filter: None,
            group_by: None,
        }
    }

    /// Builder: filter
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Builder: group by a metadata field
    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }
}

/// One cluster of a clustering aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Mean of the members
    pub centroid: Vec<f32>,
    /// Member ids in insertion order
    pub members: Vec<String>,
}

/// Computed aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateResult {
    /// Element-wise mean
    Centroid {
        /// Mean embedding
        centroid: Vec<f32>,
    },
    /// Per-dimension statistics
    Stats {
        /// Per-dimension mean
        mean: Vec<f32>,
        /// Per-dimension population variance
        variance: Vec<f32>,
        /// Per-dimension minimum
        min: Vec<f32>,
        /// Per-dimension maximum
        max: Vec<f32>,
    },
    /// k-means partition
    Clustering {
        /// Clusters in centroid-selection order
        clusters: Vec<Cluster>,
        /// Lloyd iterations run
        iterations: usize,
        /// Sum of squared distances to the assigned centroid
        inertia: f64,
    },
}

/// Aggregate over one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateGroup {
    /// Group value (canonical JSON of the field); `None` when ungrouped or
    /// the field is missing
    pub key: Option<String>,
    /// Embeddings in the group
    pub count: usize,
    /// Aggregate
    pub result: AggregateResult,
}

/// Result of `aggregate_vectors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Aggregation name
    pub kind: String,
    /// One entry per group, ordered by key; empty when nothing matched
    pub groups: Vec<AggregateGroup>,
}

fn centroid(points: &[Vec<f32>]) -> Vec<f32> {
    let dim = points.first().map_or(0, Vec::len);
    let mut sum = vec![0.0f64; dim];
    for p in points {
        for (dst, &v) in sum.iter_mut().zip(p) {
            *dst += f64::from(v);
        }
    }
    let n = points.len() as f64;
    sum.into_iter().map(|s| (s / n) as f32).collect()
}

fn stats(points: &[Vec<f32>]) -> AggregateResult {
    let mean = centroid(points);
    let dim = mean.len();
    let mut variance = vec![0.0f64; dim];
    let mut min = vec![f32::INFINITY; dim];
    let mut max = vec![f32::NEG_INFINITY; dim];
    for p in points {
        for d in 0..dim {
            let diff = f64::from(p[d]) - f64::from(mean[d]);
            variance[d] += diff * diff;
            min[d] = min[d].min(p[d]);
            max[d] = max[d].max(p[d]);
        }
    }
    let n = points.len() as f64;
    AggregateResult::Stats {
        mean,
        variance: variance.into_iter().map(|v| (v / n) as f32).collect(),
        min,
        max,
    }
}

impl VectorEngine {
    /// Aggregate the embeddings matching a filter, optionally per group
    ///
    /// # Errors
    /// - `NotFound` if the index does not exist
    /// - `InvalidArgument` if `num_clusters` is 0
    pub fn aggregate_vectors(
        &self,
        index: &str,
        request: &AggregateRequest,
    ) -> VectorResult<AggregateReport> {
        self.track("aggregate_vectors", || {
            if let AggregateKind::Clustering { num_clusters: 0, .. } = request.kind {
                return Err(VectorError::invalid("num_clusters must be greater than 0"));
            }
            let start = Instant::now();
            let entries = self.read_index(index, |state| {
                collect_matching(state.store.as_ref(), request.filter.as_ref(), true)
            })?;

            let mut groups: BTreeMap<Option<String>, Vec<VectorEntry>> = BTreeMap::new();
            for entry in entries {
                let key = request.group_by.as_ref().and_then(|field| {
                    entry.metadata.get(field).map(|value| value.canonical_key())
                });
                groups.entry(key).or_default().push(entry);
            }

            let groups: Vec<AggregateGroup> = groups
                .into_iter()
                .map(|(key, members)| self.aggregate_group(key, members, &request.kind))
                .collect();

            debug!(
                target: "vexil::search",
                index,
                kind = request.kind.name(),
                groups = groups.len(),
                duration_us = start.elapsed().as_micros() as u64,
                "Aggregation completed"
            );
            Ok(AggregateReport {
                kind: request.kind.name().to_string(),
                groups,
            })
        })
    }

    fn aggregate_group(
        &self,
        key: Option<String>,
        members: Vec<VectorEntry>,
        kind: &AggregateKind,
    ) -> AggregateGroup {
        let count = members.len();
        let (ids, points): (Vec<String>, Vec<Vec<f32>>) =
            members.into_iter().map(|e| (e.id, e.vector)).unzip();
        let result = match kind {
            AggregateKind::Centroid => AggregateResult::Centroid {
                centroid: centroid(&points),
            },
            AggregateKind::Stats => stats(&points),
            AggregateKind::Clustering { num_clusters, seed } => {
                let km = kmeans(
                    &points,
                    *num_clusters,
                    self.config.clustering_max_iterations,
                    seed.unwrap_or(DEFAULT_CLUSTER_SEED),
                );
                let mut clusters: Vec<Cluster> = km
                    .centroids
                    .into_iter()
                    .map(|centroid| Cluster {
                        centroid,
                        members: Vec::new(),
                    })
                    .collect();
                for (id, &c) in ids.into_iter().zip(&km.assignments) {
                    clusters[c].members.push(id);
                }
                AggregateResult::Clustering {
                    clusters,
                    iterations: km.iterations,
                    inertia: km.inertia,
                }
            }
        };
        AggregateGroup { key, count, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexil_core::{metadata, DistanceMetric, IndexSpec, NewVector};

    fn engine() -> VectorEngine {
        let engine = VectorEngine::default();
        engine
            .create_index(IndexSpec::new("pts", 2, DistanceMetric::Euclidean))
            .unwrap();
        let rows = [
            ("a", [0.0, 0.0], "left"),
            ("b", [2.0, 0.0], "left"),
            ("c", [10.0, 10.0], "right"),
            ("d", [12.0, 10.0], "right"),
        ];
        let vectors = rows
            .iter()
            .map(|(id, v, side)| {
                NewVector::new(*id, v.to_vec()).with_metadata(metadata([("side", (*side).into())]))
            })
            .collect();
        engine.insert_vectors("pts", vectors, None, false).unwrap();
        engine
    }

    #[test]
    fn test_centroid() {
        let report = engine()
            .aggregate_vectors("pts", &AggregateRequest::new(AggregateKind::Centroid))
            .unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].count, 4);
        assert_eq!(
            report.groups[0].result,
            AggregateResult::Centroid {
                centroid: vec![6.0, 5.0]
            }
        );
    }

    #[test]
    fn test_stats_population_variance() {
        let report = engine()
            .aggregate_vectors(
                "pts",
                &AggregateRequest::new(AggregateKind::Stats)
                    .with_filter(MetadataFilter::new().eq("side", "left")),
            )
            .unwrap();
        match &report.groups[0].result {
            AggregateResult::Stats {
                mean,
                variance,
                min,
                max,
            } => {
                assert_eq!(mean, &vec![1.0, 0.0]);
                assert_eq!(variance, &vec![1.0, 0.0]);
                assert_eq!(min, &vec![0.0, 0.0]);
                assert_eq!(max, &vec![2.0, 0.0]);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_group_by_runs_per_value() {
        let report = engine()
            .aggregate_vectors(
                "pts",
                &AggregateRequest::new(AggregateKind::Centroid).group_by("side"),
            )
            .unwrap();
        let keys: Vec<_> = report.groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(
            keys,
            vec![Some("\"left\"".to_string()), Some("\"right\"".to_string())]
        );
        assert_eq!(
            report.groups[1].result,
            AggregateResult::Centroid {
                centroid: vec![11.0, 10.0]
            }
        );
    }

    #[test]
    fn test_clustering_is_deterministic() {
        let engine = engine();
        let request = AggregateRequest::new(AggregateKind::Clustering {
            num_clusters: 2,
            seed: Some(3),
        });
        let first = engine.aggregate_vectors("pts", &request).unwrap();
        let second = engine.aggregate_vectors("pts", &request).unwrap();
        assert_eq!(first, second);

        match &first.groups[0].result {
            AggregateResult::Clustering { clusters, .. } => {
                let mut members: Vec<_> = clusters.iter().map(|c| c.members.clone()).collect();
                members.sort();
                assert_eq!(members, vec![vec!["a", "b"], vec!["c", "d"]]);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_zero_clusters_rejected() {
        let err = engine()
            .aggregate_vectors(
                "pts",
                &AggregateRequest::new(AggregateKind::Clustering {
                    num_clusters: 0,
                    seed: None,
                }),
            )
            .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_no_matches_gives_no_groups() {
        let report = engine()
            .aggregate_vectors(
                "pts",
                &AggregateRequest::new(AggregateKind::Stats)
                    .with_filter(MetadataFilter::new().eq("side", "up")),
            )
            .unwrap();
        assert!(report.groups.is_empty());
    }
}
