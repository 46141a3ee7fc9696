//! Pairwise Ward distances between live clusters.
//!
//! Storage is a fixed `n × n` slot matrix. Each cluster occupies one slot for
//! its lifetime; `live` maps positions (the order clusters are scanned and
//! reported in) to slots. Merging frees one slot, reuses the other for the
//! merged cluster and moves it to the last position. Rows of dead slots are
//! never read again, so nothing is shifted inside the matrix itself.
//!
//! Exclusions are kept in a boolean mask beside the distances. A distance
//! that overflows to `+inf` is still a mergeable pair; only the mask takes a
//! pair out of consideration.

use super::vector::Cluster;
use ndarray::Array2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The closest mergeable pair found by a scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPair {
    /// Lower position.
    pub left: usize,
    /// Higher position.
    pub right: usize,
    /// Ward distance between them.
    pub distance: f32,
}

/// Symmetric matrix of Ward distances over the live clusters.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    slots: Vec<Option<Cluster>>,
    live: Vec<usize>,
    dist: Array2<f32>,
    excluded: Array2<bool>,
    /// Live pairs not yet excluded.
    pending: usize,
}

#[cfg(any(not(feature = "parallel"), test))]
fn pairwise_sequential(clusters: &[Cluster]) -> Array2<f32> {
    let n = clusters.len();
    let mut dist: Array2<f32> = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = clusters[i].ward_distance(&clusters[j]);
            dist[[i, j]] = d;
            dist[[j, i]] = d;
        }
    }
    dist
}

#[cfg(feature = "parallel")]
fn pairwise_parallel(clusters: &[Cluster]) -> Array2<f32> {
    let n = clusters.len();
    let rows: Vec<Vec<f32>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        clusters[i].ward_distance(&clusters[j])
                    }
                })
                .collect()
        })
        .collect();

    let mut dist: Array2<f32> = Array2::zeros((n, n));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, d) in row.into_iter().enumerate() {
            dist[[i, j]] = d;
        }
    }
    dist
}

impl DistanceMatrix {
    /// Compute all pairwise distances between `clusters`.
    pub fn new(clusters: Vec<Cluster>) -> Self {
        let n = clusters.len();

        #[cfg(feature = "parallel")]
        let dist = pairwise_parallel(&clusters);
        #[cfg(not(feature = "parallel"))]
        let dist = pairwise_sequential(&clusters);

        Self {
            slots: clusters.into_iter().map(Some).collect(),
            live: (0..n).collect(),
            dist,
            excluded: Array2::from_elem((n, n), false),
            pending: n * n.saturating_sub(1) / 2,
        }
    }

    /// Number of live clusters.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True when no clusters are live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of live pairs not yet excluded.
    pub fn pending_pairs(&self) -> usize {
        self.pending
    }

    /// Cluster at a position.
    pub fn cluster(&self, pos: usize) -> &Cluster {
        match &self.slots[self.live[pos]] {
            Some(c) => c,
            None => unreachable!("live position {pos} points at an empty slot"),
        }
    }

    /// Distance between the clusters at two positions.
    pub fn get(&self, a: usize, b: usize) -> f32 {
        self.dist[[self.live[a], self.live[b]]]
    }

    /// Whether the pair at these positions has been excluded.
    pub fn is_excluded(&self, a: usize, b: usize) -> bool {
        self.excluded[[self.live[a], self.live[b]]]
    }

    /// Scan the upper triangle row by row for the smallest distance among
    /// pairs that are not excluded.
    ///
    /// The first minimum in scan order wins, which makes ties deterministic.
    pub fn closest_pair(&self) -> Option<ClosestPair> {
        if self.pending == 0 {
            return None;
        }

        let n = self.live.len();
        let mut best: Option<ClosestPair> = None;
        for left in 0..n {
            let sl = self.live[left];
            let row = self.dist.row(sl);
            let mask = self.excluded.row(sl);
            for right in (left + 1)..n {
                let sr = self.live[right];
                let d = row[sr];
                if mask[sr] || d.is_nan() {
                    continue;
                }
                match best {
                    Some(b) if d >= b.distance => {}
                    _ => {
                        best = Some(ClosestPair {
                            left,
                            right,
                            distance: d,
                        })
                    }
                }
            }
        }
        best
    }

    /// Permanently disqualify the pair at these positions.
    pub fn exclude(&mut self, a: usize, b: usize) {
        let (sa, sb) = (self.live[a], self.live[b]);
        if !self.excluded[[sa, sb]] {
            self.pending -= 1;
        }
        self.excluded[[sa, sb]] = true;
        self.excluded[[sb, sa]] = true;
    }

    /// Replace the clusters at positions `a` and `b` with their merge.
    ///
    /// The merged cluster goes to the last position, with fresh distances to
    /// every survivor; exclusions involving either input no longer apply.
    /// Returns a reference to the merged cluster.
    pub fn merge(&mut self, a: usize, b: usize) -> &Cluster {
        debug_assert_ne!(a, b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };

        // Higher position first so the lower one does not shift.
        let slot_hi = self.live.remove(hi);
        let slot_lo = self.live.remove(lo);

        for &s in &self.live {
            for gone in [slot_lo, slot_hi] {
                if !self.excluded[[s, gone]] {
                    self.pending -= 1;
                }
            }
        }
        if !self.excluded[[slot_lo, slot_hi]] {
            self.pending -= 1;
        }

        let (left, right) = match (self.slots[slot_lo].take(), self.slots[slot_hi].take()) {
            (Some(l), Some(r)) => (l, r),
            _ => unreachable!("merged positions must hold live clusters"),
        };
        let merged = Cluster::merge(&left, &right);

        for &s in &self.live {
            let d = match &self.slots[s] {
                Some(other) => merged.ward_distance(other),
                None => unreachable!("live slot {s} is empty"),
            };
            self.dist[[slot_lo, s]] = d;
            self.dist[[s, slot_lo]] = d;
            self.excluded[[slot_lo, s]] = false;
            self.excluded[[s, slot_lo]] = false;
            self.pending += 1;
        }
        self.dist[[slot_lo, slot_lo]] = 0.0;

        self.live.push(slot_lo);
        self.slots[slot_lo] = Some(merged);
        self.cluster(self.live.len() - 1)
    }

    /// Live clusters in position order.
    pub fn into_clusters(mut self) -> Vec<Cluster> {
        self.live
            .iter()
            .filter_map(|&s| self.slots[s].take())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singletons(points: &[[f32; 2]]) -> Vec<Cluster> {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| Cluster::singleton(i, p))
            .collect()
    }

    #[test]
    fn test_initial_matrix_symmetric() {
        let m = DistanceMatrix::new(singletons(&[[0.0, 0.0], [1.0, 0.0], [0.0, 3.0]]));
        assert_eq!(m.len(), 3);
        assert_eq!(m.pending_pairs(), 3);
        for i in 0..3 {
            assert_eq!(m.get(i, i), 0.0);
            for j in 0..3 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
        assert!((m.get(0, 1) - 0.5).abs() < 1e-6);
        assert!((m.get(0, 2) - 4.5).abs() < 1e-6);
    }

    #[test]
    fn test_closest_pair_tie_break_is_row_major() {
        // All four points identical: every distance is 0, first pair wins.
        let m = DistanceMatrix::new(singletons(&[[1.0, 1.0]; 4]));
        let p = m.closest_pair().unwrap();
        assert_eq!((p.left, p.right), (0, 1));
    }

    #[test]
    fn test_merge_appends_and_recomputes() {
        let mut m = DistanceMatrix::new(singletons(&[
            [0.0, 0.0],
            [10.0, 0.0],
            [0.1, 0.0],
            [10.5, 0.0],
        ]));
        let p = m.closest_pair().unwrap();
        assert_eq!((p.left, p.right), (0, 2));

        let merged = m.merge(p.left, p.right);
        assert_eq!(merged.members(), &[0, 2]);
        assert_eq!(m.len(), 3);
        // Survivors keep relative order, merged cluster is last.
        assert_eq!(m.cluster(0).members(), &[1]);
        assert_eq!(m.cluster(1).members(), &[3]);
        assert_eq!(m.cluster(2).members(), &[0, 2]);
        assert_eq!(m.pending_pairs(), 3);

        let expected = m.cluster(2).ward_distance(m.cluster(0));
        assert_eq!(m.get(2, 0), expected);
        assert_eq!(m.get(0, 2), expected);
    }

    #[test]
    fn test_exclusion_then_merge_clears_mask() {
        let mut m = DistanceMatrix::new(singletons(&[[0.0, 0.0], [1.0, 0.0], [5.0, 0.0]]));
        m.exclude(0, 1);
        assert!(m.is_excluded(0, 1));
        assert!(m.is_excluded(1, 0));
        assert!(!m.is_excluded(0, 2));
        assert_eq!(m.pending_pairs(), 2);

        // Excluding twice does not double count.
        m.exclude(1, 0);
        assert_eq!(m.pending_pairs(), 2);

        let p = m.closest_pair().unwrap();
        assert_eq!((p.left, p.right), (1, 2));
        m.merge(p.left, p.right);

        // Positions are now [0] and [1, 2]; the new pair is mergeable again.
        assert_eq!(m.len(), 2);
        assert!(!m.is_excluded(0, 1));
        assert_eq!(m.pending_pairs(), 1);
    }

    #[test]
    fn test_all_excluded_has_no_closest_pair() {
        let mut m = DistanceMatrix::new(singletons(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]));
        m.exclude(0, 1);
        m.exclude(0, 2);
        m.exclude(1, 2);
        assert_eq!(m.pending_pairs(), 0);
        assert!(m.closest_pair().is_none());
    }

    #[test]
    fn test_overflowing_distance_is_still_mergeable() {
        // Squared difference of 1e20 overflows f32 to +inf.
        let m = DistanceMatrix::new(singletons(&[[0.0, 0.0], [1e20, 0.0]]));
        assert_eq!(m.get(0, 1), f32::INFINITY);
        assert!(!m.is_excluded(0, 1));
        assert_eq!(m.pending_pairs(), 1);

        let p = m.closest_pair().unwrap();
        assert_eq!((p.left, p.right), (0, 1));
    }

    #[test]
    fn test_into_clusters_in_position_order() {
        let mut m = DistanceMatrix::new(singletons(&[[0.0, 0.0], [9.0, 0.0], [0.5, 0.0]]));
        m.merge(0, 2);
        let clusters = m.into_clusters();
        let members: Vec<&[usize]> = clusters.iter().map(|c| c.members()).collect();
        assert_eq!(members, vec![&[1][..], &[0, 2][..]]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_build_matches_sequential() {
        let points: Vec<[f32; 2]> = (0..40)
            .map(|i| [(i as f32 * 0.37).sin() * 10.0, (i as f32 * 1.3).cos()])
            .collect();
        let clusters = singletons(&points);
        assert_eq!(pairwise_parallel(&clusters), pairwise_sequential(&clusters));
    }
}
