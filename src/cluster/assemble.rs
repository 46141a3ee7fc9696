//! Turning internal clusters into the caller-facing partition.

use super::validate::{validate_partition, IssueKind, Severity};
use super::vector::Cluster;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What to do with clusters below the minimum size after clustering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UndersizedPolicy {
    /// Fail the whole run with [`Error::ConstraintViolation`].
    #[default]
    Fail,
    /// Leave the cluster out and list its items in [`Partition::dropped`].
    Drop,
}

/// Item identifiers grouped by cluster.
///
/// Cluster ids are sequential from 0 in internal order; the order carries no
/// meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Partition {
    /// Cluster id to member identifiers, in merge order.
    pub clusters: BTreeMap<usize, Vec<String>>,
    /// Items left out under [`UndersizedPolicy::Drop`].
    pub dropped: Vec<String>,
}

impl Partition {
    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True when there are no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Members of a cluster.
    pub fn get(&self, cluster: usize) -> Option<&[String]> {
        self.clusters.get(&cluster).map(Vec::as_slice)
    }

    /// Iterate over `(cluster id, members)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.clusters.iter().map(|(&k, v)| (k, v.as_slice()))
    }

    /// Cluster sizes by id.
    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.values().map(Vec::len).collect()
    }

    /// Cluster holding `id`, if any.
    pub fn cluster_of(&self, id: &str) -> Option<usize> {
        self.clusters
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == id))
            .map(|(&k, _)| k)
    }

    /// Cluster of each identifier in `ids`, in the same order.
    pub fn labels<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Option<usize>> {
        let lookup: HashMap<&str, usize> = self
            .clusters
            .iter()
            .flat_map(|(&k, members)| members.iter().map(move |m| (m.as_str(), k)))
            .collect();
        ids.iter()
            .map(|id| lookup.get(id.as_ref()).copied())
            .collect()
    }
}

/// Validate final clusters and map member indices to identifiers.
///
/// Every index in `0..ids.len()` must appear in exactly one cluster;
/// otherwise [`Error::InconsistentPartition`] is returned before any size
/// check.
pub fn assemble<S: AsRef<str>>(
    clusters: Vec<Cluster>,
    ids: &[S],
    min_size: usize,
    max_size: usize,
    policy: UndersizedPolicy,
) -> Result<Partition> {
    let members: Vec<Vec<usize>> = clusters.into_iter().map(Cluster::into_members).collect();
    let report = validate_partition(&members, ids.len(), min_size, max_size);
    if let Some(issue) = report
        .issues
        .iter()
        .find(|i| i.severity == Severity::Critical)
    {
        return Err(Error::InconsistentPartition(issue.to_string()));
    }

    let violation = |pos: usize| Error::ConstraintViolation {
        cluster: pos,
        size: members[pos].len(),
        min_size,
        max_size,
    };

    if let Some(pos) = report.of_kind(IssueKind::Oversized).find_map(|i| i.cluster) {
        return Err(violation(pos));
    }

    let undersized = report.undersized();
    if policy == UndersizedPolicy::Fail {
        if let Some(&pos) = undersized.first() {
            return Err(violation(pos));
        }
    }

    let mut partition = Partition::default();
    for (pos, cluster) in members.iter().enumerate() {
        let names = cluster.iter().map(|&i| ids[i].as_ref().to_string());
        if undersized.contains(&pos) {
            tracing::warn!(
                cluster = pos,
                size = cluster.len(),
                min_size,
                "dropping undersized cluster"
            );
            partition.dropped.extend(names);
        } else {
            let id = partition.clusters.len();
            partition.clusters.insert(id, names.collect());
        }
    }

    Ok(partition)
}
