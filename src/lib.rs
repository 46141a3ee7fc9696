//! # bounded-ward
//!
//! Agglomerative Ward clustering with minimum and maximum cluster sizes.
//!
//! Built for a batch pipeline stage: an upstream model produces one embedding
//! per item, this crate partitions the batch into groups of acceptable size,
//! and downstream code pools each group's labels for captioning.
//!
//! Every run is a pure, single-threaded computation over an immutable batch.
//! Worst-case cost is O(n³), so callers wanting bounded latency should bound
//! the batch size before calling in.

pub mod cluster;
/// Error types used across `bounded-ward`.
pub mod error;
pub mod summarize;


pub use cluster::{
    cluster_with_constraints, Clustering, ConstrainedWard, ConstraintConfig, MergeCeiling,
    Partition, TargetCount, UndersizedPolicy,
};
pub use error::{Error, Result};
pub use summarize::{cluster_details, ClusterDetails, ItemMeta, LabelSummarizer, Summarizer};
