//! Size-constrained agglomerative clustering.
//!
//! Groups items (one embedding each) into clusters whose sizes all fall in
//! `[min, max]`. Plain agglomerative clustering gives no size guarantees:
//! Ward linkage tends toward balanced clusters, but nothing stops one group
//! from swallowing half the batch. This module layers three things on top:
//!
//! | Stage | Module | Role |
//! |-------|--------|------|
//! | Target count | [`estimate`] | Pick K inside `[⌈n/max⌉, ⌊n/min⌋]` |
//! | Agglomeration | [`Agglomerator`] | Ward merges to K, refusing merges above max |
//! | Repair | [`Splitter`] | Re-cluster anything still above max |
//! | Assembly | [`assemble`] | Enforce `[min, max]`, map indices to ids |
//!
//! ## Ward linkage
//!
//! ```text
//! Δ(A,B) = (nₐ × nᵦ)/(nₐ + nᵦ) × ||μₐ - μᵦ||²
//! ```
//!
//! The increase in within-cluster variance caused by the merge. Centroids are
//! updated incrementally on every merge, so no step rescans member vectors.
//!
//! ## Determinism
//!
//! The closest pair is found by scanning the upper triangle row by row and
//! keeping the first minimum. Equal inputs give equal partitions, including
//! degenerate batches where every distance ties.
//!
//! ## Usage
//!
//! ```rust
//! use bounded_ward::cluster::ConstrainedWard;
//!
//! let vectors = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//! let ids = ["a", "b", "c", "d"];
//!
//! let partition = ConstrainedWard::new(2, 2).fit(&vectors, &ids).unwrap();
//! assert_eq!(partition.len(), 2);
//! assert_eq!(partition.cluster_of("a"), partition.cluster_of("b"));
//! assert_ne!(partition.cluster_of("a"), partition.cluster_of("c"));
//! ```

mod agglomerate;
mod assemble;
mod constrained;
mod distance;
mod estimate;
mod split;
mod traits;
mod validate;
mod vector;

pub use agglomerate::{Agglomeration, AgglomerationOutcome, Agglomerator, Merge};
pub use assemble::{assemble, Partition, UndersizedPolicy};
pub use constrained::{
    cluster_with_constraints, ConstrainedWard, ConstraintConfig, MergeCeiling, TargetCount,
    UNASSIGNED,
};
pub use distance::{ClosestPair, DistanceMatrix};
pub use estimate::{candidates, count_bounds, estimate};
pub use split::Splitter;
pub use traits::Clustering;
pub use validate::{validate_partition, IssueKind, Severity, ValidationIssue, ValidationReport};
pub use vector::{squared_euclidean, Cluster};
