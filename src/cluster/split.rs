//! Forced splitting of clusters above the size ceiling.
//!
//! An oversized cluster is re-clustered on its own members with the minimum
//! relaxed to 1, since the outer minimum cannot be enforced on a forced split.
//! The sub-run always enforces the ceiling during merging, so every
//! sub-cluster comes back at most `max_size`; that is still checked.

use super::agglomerate::Agglomerator;
use super::estimate::estimate;
use super::vector::Cluster;
use crate::error::{Error, Result};

/// Replaces clusters larger than `max_size` with valid-sized sub-clusters.
#[derive(Debug, Clone, Copy)]
pub struct Splitter {
    max_size: usize,
}

impl Splitter {
    /// Create a splitter for the given ceiling.
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Split one cluster into parts of at most `max_size`.
    ///
    /// Clusters already within the ceiling come back unchanged.
    pub fn split(&self, vectors: &[Vec<f32>], cluster: Cluster) -> Result<Vec<Cluster>> {
        let size = cluster.size();
        if size <= self.max_size {
            return Ok(vec![cluster]);
        }

        let failure = Error::SplitFailure {
            size,
            max_size: self.max_size,
        };
        let target = estimate(size, 1, self.max_size).map_err(|_| failure.clone())?;

        let parts = Agglomerator::new(target)
            .with_max_size(self.max_size)
            .run_on(vectors, cluster.members());

        tracing::debug!(
            size,
            k = target,
            parts = parts.clusters.len(),
            outcome = ?parts.outcome,
            "split oversized cluster"
        );

        if parts.clusters.iter().any(|c| c.size() > self.max_size) {
            return Err(failure);
        }
        Ok(parts.clusters)
    }

    /// Split every oversized cluster, splicing the parts in its place.
    pub fn split_all(&self, vectors: &[Vec<f32>], clusters: Vec<Cluster>) -> Result<Vec<Cluster>> {
        let mut out = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            out.extend(self.split(vectors, cluster)?);
        }
        Ok(out)
    }
}
