//! Target cluster count under size bounds.
//!
//! With `n` items and every cluster in `[min, max]`, the feasible counts are
//!
//! ```text
//! k_min = ⌈n / max⌉      (fewest clusters, none above max)
//! k_max = ⌊n / min⌋      (most clusters, none below min)
//! ```
//!
//! The midpoint of that range is a heuristic, not an optimum. It leans toward
//! fewer, larger clusters and says nothing about whether agglomeration will
//! actually land on a compliant size distribution; splitting and final
//! validation exist for that.

use crate::error::{Error, Result};

/// Feasible range `[k_min, k_max]` of cluster counts.
pub fn count_bounds(n: usize, min_size: usize, max_size: usize) -> Result<(usize, usize)> {
    if min_size == 0 {
        return Err(Error::InvalidParameter {
            name: "min_cluster_size",
            message: "must be at least 1",
        });
    }
    if max_size < min_size {
        return Err(Error::InvalidParameter {
            name: "max_cluster_size",
            message: "must not be smaller than min_cluster_size",
        });
    }

    let infeasible = |reason| Error::Infeasible {
        n_items: n,
        min_size,
        max_size,
        reason,
    };

    if n < min_size {
        return Err(infeasible("too few items"));
    }

    let k_min = n.div_ceil(max_size);
    let k_max = n / min_size;
    if k_min > k_max {
        return Err(infeasible("no cluster count satisfies both bounds"));
    }

    Ok((k_min, k_max))
}

/// Number of clusters to agglomerate down to.
pub fn estimate(n: usize, min_size: usize, max_size: usize) -> Result<usize> {
    let (k_min, k_max) = count_bounds(n, min_size, max_size)?;
    Ok(midpoint(k_min, k_max))
}

/// Every feasible count, midpoint first, then by distance from it.
///
/// Ties prefer the smaller count.
pub fn candidates(n: usize, min_size: usize, max_size: usize) -> Result<Vec<usize>> {
    let (k_min, k_max) = count_bounds(n, min_size, max_size)?;
    let mid = midpoint(k_min, k_max);
    let mut ks: Vec<usize> = (k_min..=k_max).collect();
    ks.sort_by_key(|&k| (k.abs_diff(mid), k));
    Ok(ks)
}

#[inline]
fn midpoint(k_min: usize, k_max: usize) -> usize {
    if k_min == k_max {
        k_min
    } else {
        (k_min + k_max) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_estimate_examples() {
        // k_min = 2, k_max = 3
        assert_eq!(estimate(10, 3, 6).unwrap(), 2);
        assert_eq!(estimate(6, 6, 6).unwrap(), 1);
        // k_min = 3, k_max = 9
        assert_eq!(estimate(9, 1, 3).unwrap(), 6);
    }

    #[test]
    fn test_estimate_infeasible() {
        let err = estimate(5, 3, 3).unwrap_err();
        assert!(err.is_infeasible());
        assert!(err.to_string().contains("both bounds"));

        let err = estimate(7, 3, 3).unwrap_err();
        assert!(err.is_infeasible());

        let err = estimate(2, 3, 5).unwrap_err();
        assert!(err.to_string().contains("too few items"));

        assert!(estimate(0, 1, 4).unwrap_err().is_infeasible());
    }

    #[test]
    fn test_estimate_invalid_parameters() {
        assert!(matches!(
            estimate(10, 0, 4),
            Err(Error::InvalidParameter { name: "min_cluster_size", .. })
        ));
        assert!(matches!(
            estimate(10, 5, 4),
            Err(Error::InvalidParameter { name: "max_cluster_size", .. })
        ));
    }

    #[test]
    fn test_candidates_order() {
        // k_min = 2, k_max = 6, midpoint 4
        assert_eq!(candidates(12, 2, 6).unwrap(), vec![4, 3, 5, 2, 6]);
        assert_eq!(candidates(6, 6, 6).unwrap(), vec![1]);
    }

    proptest! {
        #[test]
        fn estimate_within_feasible_range(
            n in 1usize..500,
            min_size in 1usize..50,
            extra in 0usize..50,
        ) {
            let max_size = min_size + extra;
            if let Ok(k) = estimate(n, min_size, max_size) {
                prop_assert!(n.div_ceil(max_size) <= k);
                prop_assert!(k <= n / min_size);
                prop_assert!(k >= 1);
            }
        }
    }
}
