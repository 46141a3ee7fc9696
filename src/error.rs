/// Result alias for `bounded_ward`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the constrained clustering engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// No cluster count can satisfy the size bounds for this many items.
    #[error("infeasible constraints for {n_items} items with sizes [{min_size}, {max_size}]: {reason}")]
    Infeasible {
        /// Number of items in the batch.
        n_items: usize,
        /// Requested minimum cluster size.
        min_size: usize,
        /// Requested maximum cluster size.
        max_size: usize,
        /// Which check failed.
        reason: &'static str,
    },

    /// The final partition contains a cluster outside the size bounds.
    #[error("cluster {cluster} has size {size}, outside [{min_size}, {max_size}]")]
    ConstraintViolation {
        /// Position of the offending cluster in the final list.
        cluster: usize,
        /// Its size.
        size: usize,
        /// Requested minimum cluster size.
        min_size: usize,
        /// Requested maximum cluster size.
        max_size: usize,
    },

    /// A forced split of an oversized cluster did not produce valid sub-clusters.
    #[error("could not split cluster of size {size} into parts of at most {max_size}")]
    SplitFailure {
        /// Size of the cluster being split.
        size: usize,
        /// Maximum allowed size.
        max_size: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// `vectors` and `ids` differ in length.
    #[error("got {vectors} vectors but {ids} identifiers")]
    LengthMismatch {
        /// Number of vectors.
        vectors: usize,
        /// Number of identifiers.
        ids: usize,
    },

    /// Vector dimension mismatch.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("item {item} has a non-finite value at dimension {dim}")]
    NonFiniteValue {
        /// Item position.
        item: usize,
        /// Offending dimension.
        dim: usize,
    },

    /// The same identifier was supplied for two items.
    #[error("duplicate item identifier '{0}'")]
    DuplicateId(String),

    /// Clusters lost, duplicated or invented item indices.
    #[error("inconsistent partition: {0}")]
    InconsistentPartition(String),
}

impl Error {
    /// True for failures that no clustering could avoid given the item count.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Error::Infeasible { .. })
    }

    /// True when the engine ran but could not produce a compliant partition.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Error::ConstraintViolation { .. } | Error::SplitFailure { .. }
        )
    }
}
