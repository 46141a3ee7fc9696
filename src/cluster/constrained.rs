//! Size-constrained Ward clustering.
//!
//! The full run for one batch:
//!
//! 1. Estimate the target cluster count from the item count and bounds
//! 2. Agglomerate with Ward linkage down to that count
//! 3. Split any cluster still above the maximum
//! 4. Validate sizes and map indices to item identifiers
//!
//! Each run is a pure function of its inputs: no state is kept between
//! calls, so independent batches can be clustered in parallel.

use super::agglomerate::{AgglomerationOutcome, Agglomerator};
use super::assemble::{assemble, Partition, UndersizedPolicy};
use super::estimate::{candidates, estimate};
use super::split::Splitter;
use super::traits::Clustering;
use crate::error::{Error, Result};
use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Label given by [`Clustering::fit_predict`] to items left out of every cluster.
pub const UNASSIGNED: usize = usize::MAX;

/// How the target cluster count is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TargetCount {
    /// Midpoint of the feasible range only.
    #[default]
    Midpoint,
    /// Midpoint first, then every other feasible count by distance from it,
    /// until one yields a valid partition.
    Sweep,
}

/// When the maximum size is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MergeCeiling {
    /// Pairs that would exceed the maximum are never merged.
    #[default]
    DuringMerge,
    /// Merge freely, then split oversized clusters.
    SplitAfter,
}

/// Size bounds and policies for a clustering run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConstraintConfig {
    /// Smallest allowed cluster.
    pub min_cluster_size: usize,
    /// Largest allowed cluster.
    pub max_cluster_size: usize,
    /// Handling of clusters below the minimum.
    #[cfg_attr(feature = "serde", serde(default))]
    pub undersized: UndersizedPolicy,
    /// Target count strategy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub target: TargetCount,
    /// When the maximum is enforced.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ceiling: MergeCeiling,
}

impl ConstraintConfig {
    /// Bounds with default policies.
    pub fn new(min_cluster_size: usize, max_cluster_size: usize) -> Self {
        Self {
            min_cluster_size,
            max_cluster_size,
            undersized: UndersizedPolicy::default(),
            target: TargetCount::default(),
            ceiling: MergeCeiling::default(),
        }
    }

    /// Set the undersized-cluster policy.
    pub fn with_undersized(mut self, policy: UndersizedPolicy) -> Self {
        self.undersized = policy;
        self
    }

    /// Set the target count strategy.
    pub fn with_target(mut self, target: TargetCount) -> Self {
        self.target = target;
        self
    }

    /// Set when the maximum is enforced.
    pub fn with_ceiling(mut self, ceiling: MergeCeiling) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Check the bounds themselves, independent of any input.
    pub fn validate(&self) -> Result<()> {
        if self.min_cluster_size == 0 {
            return Err(Error::InvalidParameter {
                name: "min_cluster_size",
                message: "must be at least 1",
            });
        }
        if self.max_cluster_size < self.min_cluster_size {
            return Err(Error::InvalidParameter {
                name: "max_cluster_size",
                message: "must not be smaller than min_cluster_size",
            });
        }
        Ok(())
    }
}

/// Ward clustering whose output clusters all fall within size bounds.
#[derive(Debug, Clone)]
pub struct ConstrainedWard {
    config: ConstraintConfig,
}

impl ConstrainedWard {
    /// Cluster with sizes in `[min_cluster_size, max_cluster_size]`.
    pub fn new(min_cluster_size: usize, max_cluster_size: usize) -> Self {
        Self::with_config(ConstraintConfig::new(min_cluster_size, max_cluster_size))
    }

    /// Cluster with a full configuration.
    pub fn with_config(config: ConstraintConfig) -> Self {
        Self { config }
    }

    /// Set the undersized-cluster policy.
    pub fn with_undersized(mut self, policy: UndersizedPolicy) -> Self {
        self.config.undersized = policy;
        self
    }

    /// Set the target count strategy.
    pub fn with_target(mut self, target: TargetCount) -> Self {
        self.config.target = target;
        self
    }

    /// Set when the maximum is enforced.
    pub fn with_ceiling(mut self, ceiling: MergeCeiling) -> Self {
        self.config.ceiling = ceiling;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ConstraintConfig {
        &self.config
    }

    /// Partition `ids` by their `vectors`.
    ///
    /// On success every identifier appears in exactly one cluster, or in
    /// [`Partition::dropped`] under [`UndersizedPolicy::Drop`].
    pub fn fit<S: AsRef<str>>(&self, vectors: &[Vec<f32>], ids: &[S]) -> Result<Partition> {
        self.config.validate()?;
        check_inputs(vectors, ids)?;

        let n = vectors.len();
        let (min, max) = (self.config.min_cluster_size, self.config.max_cluster_size);
        let targets = match self.config.target {
            TargetCount::Midpoint => vec![estimate(n, min, max)?],
            TargetCount::Sweep => candidates(n, min, max)?,
        };

        tracing::info!(
            n_items = n,
            min_size = min,
            max_size = max,
            k = targets[0],
            "starting constrained clustering"
        );

        let mut first_err = None;
        for &k in &targets {
            match self.run_once(vectors, ids, k) {
                Ok(partition) => {
                    tracing::info!(
                        k,
                        clusters = partition.len(),
                        dropped = partition.dropped.len(),
                        "clustering succeeded"
                    );
                    return Ok(partition);
                }
                Err(e) => {
                    tracing::debug!(k, error = %e, "target count rejected");
                    first_err.get_or_insert(e);
                }
            }
        }

        Err(first_err.unwrap_or(Error::Infeasible {
            n_items: n,
            min_size: min,
            max_size: max,
            reason: "no cluster count satisfies both bounds",
        }))
    }

    fn run_once<S: AsRef<str>>(&self, vectors: &[Vec<f32>], ids: &[S], k: usize) -> Result<Partition> {
        let max = self.config.max_cluster_size;
        let agglomerator = match self.config.ceiling {
            MergeCeiling::DuringMerge => Agglomerator::new(k).with_max_size(max),
            MergeCeiling::SplitAfter => Agglomerator::new(k),
        };

        let result = agglomerator.run(vectors);
        if result.outcome == AgglomerationOutcome::Stalled {
            tracing::debug!(
                k,
                clusters = result.clusters.len(),
                "stalled above target; leaving sizes to validation"
            );
        }

        let clusters = Splitter::new(max).split_all(vectors, result.clusters)?;
        assemble(
            clusters,
            ids,
            self.config.min_cluster_size,
            max,
            self.config.undersized,
        )
    }
}

/// The cluster count is not configured up front; it is derived from the item
/// count and size bounds on each call, so [`Clustering::n_clusters`] reports 0.
impl Clustering for ConstrainedWard {
    /// Labels per point, with [`UNASSIGNED`] for dropped points.
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        let ids: Vec<String> = (0..data.len()).map(|i| i.to_string()).collect();
        let partition = self.fit(data, &ids)?;
        Ok(partition
            .labels(&ids)
            .into_iter()
            .map(|l| l.unwrap_or(UNASSIGNED))
            .collect())
    }

    fn n_clusters(&self) -> usize {
        0
    }
}

/// Partition `ids` by `vectors` under the given bounds.
pub fn cluster_with_constraints<S: AsRef<str>>(
    vectors: &[Vec<f32>],
    ids: &[S],
    config: &ConstraintConfig,
) -> Result<Partition> {
    ConstrainedWard::with_config(config.clone()).fit(vectors, ids)
}

fn check_inputs<S: AsRef<str>>(vectors: &[Vec<f32>], ids: &[S]) -> Result<()> {
    if vectors.len() != ids.len() {
        return Err(Error::LengthMismatch {
            vectors: vectors.len(),
            ids: ids.len(),
        });
    }

    if let Some(first) = vectors.first() {
        let d = first.len();
        for (item, v) in vectors.iter().enumerate() {
            if v.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: v.len(),
                });
            }
            if let Some(dim) = v.iter().position(|x| !x.is_finite()) {
                return Err(Error::NonFiniteValue { item, dim });
            }
        }
    }

    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_ref()) {
            return Err(Error::DuplicateId(id.as_ref().to_string()));
        }
    }
    Ok(())
}
