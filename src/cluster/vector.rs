//! Centroid arithmetic and Ward linkage.
//!
//! Ward linkage measures the increase in within-cluster variance caused by
//! merging clusters A and B:
//!
//! ```text
//! Δ(A,B) = (nₐ × nᵦ)/(nₐ + nᵦ) × ||μₐ - μᵦ||²
//! ```
//!
//! Where nₐ, nᵦ are cluster sizes and μₐ, μᵦ are centroids. Everything here
//! works in `f32`, the precision embeddings arrive in.

/// Squared Euclidean distance.
///
/// # Panics
///
/// If the slices differ in length.
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "vector dimensions differ");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// A group of items with an incrementally maintained centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Original item indices, in merge order.
    members: Vec<usize>,
    /// Size-weighted mean of the members' vectors.
    centroid: Vec<f32>,
}

impl Cluster {
    /// A cluster holding a single item.
    pub fn singleton(index: usize, vector: &[f32]) -> Self {
        Self {
            members: vec![index],
            centroid: vector.to_vec(),
        }
    }

    /// Merge two clusters.
    ///
    /// Members of `a` come first, then members of `b`. The centroid is the
    /// size-weighted mean of both centroids:
    ///
    /// ```text
    /// μ = (nₐ μₐ + nᵦ μᵦ) / (nₐ + nᵦ)
    /// ```
    ///
    /// Accumulated in `f64`, so finite centroids stay finite.
    ///
    /// # Panics
    ///
    /// If the centroids differ in dimension.
    pub fn merge(a: &Cluster, b: &Cluster) -> Cluster {
        assert_eq!(
            a.centroid.len(),
            b.centroid.len(),
            "vector dimensions differ"
        );
        let wa = a.size() as f64;
        let wb = b.size() as f64;
        let total = wa + wb;

        let centroid = a
            .centroid
            .iter()
            .zip(b.centroid.iter())
            .map(|(&x, &y)| ((wa * f64::from(x) + wb * f64::from(y)) / total) as f32)
            .collect();

        let mut members = Vec::with_capacity(a.members.len() + b.members.len());
        members.extend_from_slice(&a.members);
        members.extend_from_slice(&b.members);

        Cluster { members, centroid }
    }

    /// Ward linkage distance to another cluster.
    #[inline]
    pub fn ward_distance(&self, other: &Cluster) -> f32 {
        let na = self.size() as f32;
        let nb = other.size() as f32;
        (na * nb) / (na + nb) * squared_euclidean(&self.centroid, &other.centroid)
    }

    /// Number of items.
    #[inline]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Original item indices.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Cluster centroid.
    pub fn centroid(&self) -> &[f32] {
        &self.centroid
    }

    pub(crate) fn into_members(self) -> Vec<usize> {
        self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ward_distance_self_is_zero() {
        let a = Cluster::singleton(0, &[1.0, -2.0, 3.5]);
        assert_eq!(a.ward_distance(&a), 0.0);
    }

    #[test]
    fn test_ward_distance_scales_with_sizes() {
        // Two singletons one unit apart: 1*1/2 * 1 = 0.5
        let a = Cluster::singleton(0, &[0.0, 0.0]);
        let b = Cluster::singleton(1, &[1.0, 0.0]);
        assert!((a.ward_distance(&b) - 0.5).abs() < 1e-6);

        // Pair centred at the origin vs singleton at distance 1: 2*1/3 * 1
        let ab = Cluster::merge(&a, &Cluster::singleton(2, &[0.0, 0.0]));
        let c = Cluster::singleton(3, &[0.0, 1.0]);
        let expected = 2.0 / 3.0;
        assert!((ab.ward_distance(&c) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_merge_centroid_is_weighted_mean() {
        let v1 = [3.0, 0.0, -3.0];
        let single = Cluster::singleton(0, &v1);
        let pair = Cluster::merge(
            &Cluster::singleton(1, &[1.0, 2.0, 0.0]),
            &Cluster::singleton(2, &[1.0, 4.0, 6.0]),
        );
        let v2 = pair.centroid().to_vec();
        assert_eq!(v2, vec![1.0, 3.0, 3.0]);

        let merged = Cluster::merge(&single, &pair);
        assert_eq!(merged.size(), 3);
        for (i, c) in merged.centroid().iter().enumerate() {
            let expected = (v1[i] + 2.0 * v2[i]) / 3.0;
            assert!((c - expected).abs() < 1e-6, "dim {i}: {c} vs {expected}");
        }
    }

    #[test]
    fn test_merge_keeps_member_order() {
        let a = Cluster::merge(
            &Cluster::singleton(4, &[0.0]),
            &Cluster::singleton(1, &[0.0]),
        );
        let b = Cluster::singleton(7, &[0.0]);
        assert_eq!(Cluster::merge(&a, &b).members(), &[4, 1, 7]);
        assert_eq!(Cluster::merge(&b, &a).members(), &[7, 4, 1]);
    }

    #[test]
    #[should_panic(expected = "vector dimensions differ")]
    fn test_squared_euclidean_rejects_ragged() {
        squared_euclidean(&[3.0, 4.0], &[0.0]);
    }

    #[test]
    #[should_panic(expected = "vector dimensions differ")]
    fn test_merge_rejects_ragged() {
        Cluster::merge(
            &Cluster::singleton(0, &[0.0, 5.0]),
            &Cluster::singleton(1, &[1.0]),
        );
    }

    #[test]
    fn test_merge_of_huge_values_stays_finite() {
        let big = Cluster::singleton(0, &[f32::MAX, -f32::MAX]);
        let merged = Cluster::merge(&big, &big);
        assert_eq!(merged.centroid(), &[f32::MAX, -f32::MAX]);
    }

    proptest! {
        #[test]
        fn ward_distance_is_symmetric(
            a in proptest::collection::vec(-100.0f32..100.0, 4),
            b in proptest::collection::vec(-100.0f32..100.0, 4),
            extra in 0usize..5,
        ) {
            let mut ca = Cluster::singleton(0, &a);
            for i in 0..extra {
                ca = Cluster::merge(&ca, &Cluster::singleton(i + 1, &a));
            }
            let cb = Cluster::singleton(99, &b);
            prop_assert_eq!(ca.ward_distance(&cb), cb.ward_distance(&ca));
            prop_assert!(ca.ward_distance(&cb) >= 0.0);
        }
    }
}
