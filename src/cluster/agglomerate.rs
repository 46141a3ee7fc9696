//! Ward agglomeration down to a target count, with an optional size ceiling.
//!
//! Bottom-up: every item starts as its own cluster and the closest pair is
//! merged until `target` clusters remain. With a ceiling, a pair whose merge
//! would exceed it is excluded for the rest of the run instead of merged;
//! either side may still merge with a third cluster. When every remaining pair
//! is excluded the run stalls above the target and returns what it has.
//!
//! Cost is O(n²) memory and O(n³) time in the worst case (a full scan per
//! merge or exclusion). Fine for batches of a few hundred items.

use super::distance::DistanceMatrix;
use super::vector::Cluster;

/// How an agglomeration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgglomerationOutcome {
    /// Reached the target count.
    Converged,
    /// No mergeable pair left while still above the target.
    Stalled,
}

/// A single merge, as it happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Position of the first cluster at merge time.
    pub left: usize,
    /// Position of the second cluster at merge time.
    pub right: usize,
    /// Ward distance at which they merged.
    pub distance: f32,
    /// Size of the resulting cluster.
    pub size: usize,
}

/// Result of one agglomeration run.
#[derive(Debug, Clone)]
pub struct Agglomeration {
    /// Surviving clusters, in position order.
    pub clusters: Vec<Cluster>,
    /// Merge history.
    pub merges: Vec<Merge>,
    /// Pairs excluded by the size ceiling.
    pub exclusions: usize,
    /// Why the run stopped.
    pub outcome: AgglomerationOutcome,
}

impl Agglomeration {
    /// Merge heights in order.
    pub fn distances(&self) -> Vec<f32> {
        self.merges.iter().map(|m| m.distance).collect()
    }
}

/// Agglomerative Ward clustering to a fixed number of clusters.
#[derive(Debug, Clone)]
pub struct Agglomerator {
    target: usize,
    max_size: Option<usize>,
}

impl Agglomerator {
    /// Merge until `target` clusters remain.
    pub fn new(target: usize) -> Self {
        Self {
            target,
            max_size: None,
        }
    }

    /// Refuse merges that would produce a cluster larger than `max_size`.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Target cluster count.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Cluster every vector.
    pub fn run(&self, vectors: &[Vec<f32>]) -> Agglomeration {
        let clusters = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| Cluster::singleton(i, v))
            .collect();
        self.run_clusters(clusters)
    }

    /// Cluster only the listed items; members keep their original indices.
    pub fn run_on(&self, vectors: &[Vec<f32>], items: &[usize]) -> Agglomeration {
        let clusters = items
            .iter()
            .map(|&i| Cluster::singleton(i, &vectors[i]))
            .collect();
        self.run_clusters(clusters)
    }

    fn run_clusters(&self, clusters: Vec<Cluster>) -> Agglomeration {
        let mut matrix = DistanceMatrix::new(clusters);
        let mut merges = Vec::with_capacity(matrix.len().saturating_sub(self.target));
        let mut exclusions = 0;
        let outcome = loop {
            if matrix.len() <= self.target {
                break AgglomerationOutcome::Converged;
            }

            let Some(pair) = matrix.closest_pair() else {
                tracing::debug!(
                    live = matrix.len(),
                    k = self.target,
                    exclusions,
                    "agglomeration stalled"
                );
                break AgglomerationOutcome::Stalled;
            };

            let size = matrix.cluster(pair.left).size() + matrix.cluster(pair.right).size();
            if self.max_size.is_some_and(|max| size > max) {
                tracing::trace!(
                    left = pair.left,
                    right = pair.right,
                    size,
                    "pair excluded by size ceiling"
                );
                matrix.exclude(pair.left, pair.right);
                exclusions += 1;
                continue;
            }

            matrix.merge(pair.left, pair.right);
            tracing::trace!(
                left = pair.left,
                right = pair.right,
                distance = pair.distance,
                size,
                "merged clusters"
            );
            merges.push(Merge {
                left: pair.left,
                right: pair.right,
                distance: pair.distance,
                size,
            });
        };

        Agglomeration {
            clusters: matrix.into_clusters(),
            merges,
            exclusions,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![10.0, 10.0],
            vec![0.1, 0.1],
            vec![10.1, 10.1],
            vec![0.2, 0.0],
            vec![10.0, 10.2],
        ]
    }

    fn sorted_members(a: &Agglomeration) -> Vec<Vec<usize>> {
        let mut out: Vec<Vec<usize>> = a
            .clusters
            .iter()
            .map(|c| {
                let mut m = c.members().to_vec();
                m.sort_unstable();
                m
            })
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_agglomerate_two_blobs() {
        let result = Agglomerator::new(2).run(&two_blobs());
        assert_eq!(result.outcome, AgglomerationOutcome::Converged);
        assert_eq!(result.merges.len(), 4);
        assert_eq!(sorted_members(&result), vec![vec![0, 2, 4], vec![1, 3, 5]]);
    }

    #[test]
    fn test_merge_heights_non_decreasing() {
        // Ward is a reducible linkage, so greedy merge heights never drop.
        let result = Agglomerator::new(1).run(&two_blobs());
        let heights = result.distances();
        assert_eq!(heights.len(), 5);
        for w in heights.windows(2) {
            assert!(w[0] <= w[1] + 1e-4, "{heights:?}");
        }
        assert_eq!(result.merges.last().unwrap().size, 6);
    }

    #[test]
    fn test_ceiling_is_respected() {
        let result = Agglomerator::new(1).with_max_size(2).run(&two_blobs());
        assert!(result.clusters.iter().all(|c| c.size() <= 2));
        assert_eq!(result.outcome, AgglomerationOutcome::Stalled);
        assert_eq!(result.clusters.len(), 3);
        assert!(result.exclusions > 0);
    }

    #[test]
    fn test_excluded_pair_can_merge_with_third_cluster() {
        // 0 and 1 are closest, but after pairing {0,1} a third item at the
        // edge cannot join them under max 2; it pairs with the far item.
        let data = vec![vec![0.0], vec![0.1], vec![0.3], vec![5.0]];
        let result = Agglomerator::new(2).with_max_size(2).run(&data);
        assert_eq!(result.outcome, AgglomerationOutcome::Converged);
        assert_eq!(sorted_members(&result), vec![vec![0, 1], vec![2, 3]]);
        assert!(result.exclusions >= 1);
    }

    #[test]
    fn test_run_on_subset_keeps_original_indices() {
        let data = two_blobs();
        let result = Agglomerator::new(1).run_on(&data, &[1, 3, 5]);
        assert_eq!(result.clusters.len(), 1);
        let mut members = result.clusters[0].members().to_vec();
        members.sort_unstable();
        assert_eq!(members, vec![1, 3, 5]);
    }

    #[test]
    fn test_target_at_or_above_n_is_noop() {
        let result = Agglomerator::new(10).run(&two_blobs());
        assert_eq!(result.outcome, AgglomerationOutcome::Converged);
        assert_eq!(result.clusters.len(), 6);
        assert!(result.merges.is_empty());
    }

    #[test]
    fn test_identical_vectors_deterministic() {
        let data = vec![vec![1.0, 2.0, 3.0]; 9];
        let a = Agglomerator::new(3).with_max_size(4).run(&data);
        let b = Agglomerator::new(3).with_max_size(4).run(&data);
        let members_a: Vec<_> = a.clusters.iter().map(|c| c.members().to_vec()).collect();
        let members_b: Vec<_> = b.clusters.iter().map(|c| c.members().to_vec()).collect();
        assert_eq!(members_a, members_b);
        assert_eq!(a.merges, b.merges);
    }

    #[test]
    #[should_panic(expected = "vector dimensions differ")]
    fn test_ragged_input_fails_fast() {
        Agglomerator::new(1).run(&[vec![0.0, 5.0], vec![1.0]]);
    }

    #[test]
    fn test_overflowing_distance_still_merges() {
        let result = Agglomerator::new(1).run(&[vec![0.0], vec![1e20]]);
        assert_eq!(result.outcome, AgglomerationOutcome::Converged);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.merges[0].distance, f32::INFINITY);
    }
}
