//! Static 3-D k-d tree over node positions
//!
//! The tree is stored implicitly: a permutation of point indices where each
//! sub-range `[lo, hi)` has its splitting point at the middle, points with a
//! smaller coordinate on the splitting axis to the left and larger ones to
//! the right. Building is a recursive median selection, `O(N log N)`.

use nalgebra::Point3;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One query hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index into the points the tree was built from
    pub index: usize,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist2: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist2.total_cmp(&other.dist2).then(self.index.cmp(&other.index))
    }
}

#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<Point3<f64>>,
    order: Vec<usize>,
}

impl KdTree {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        let mut order: Vec<usize> = (0..points.len()).collect();
        build(&points, &mut order, 0);
        KdTree { points, order }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Point3<f64> {
        self.points[index]
    }

    /// Up to `k` nearest points within `radius` of `target`, closest first
    ///
    /// Ties in distance are broken by the smaller index so results do not
    /// depend on the tree layout.
    pub fn nearest_within(&self, target: &Point3<f64>, k: usize, radius: f64) -> Vec<Neighbor> {
        if k == 0 || self.points.is_empty() {
            return Vec::new();
        }
        let mut heap = BinaryHeap::with_capacity(k + 1);
        self.search(0, self.order.len(), 0, target, k, radius * radius, &mut heap);
        heap.into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                index: c.index,
                distance: c.dist2.sqrt(),
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        lo: usize,
        hi: usize,
        depth: usize,
        target: &Point3<f64>,
        k: usize,
        radius2: f64,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let index = self.order[mid];
        let point = &self.points[index];
        let dist2 = (point - target).norm_squared();
        if dist2 <= radius2 {
            heap.push(Candidate { dist2, index });
            if heap.len() > k {
                heap.pop();
            }
        }

        let axis = depth % 3;
        let diff = target[axis] - point[axis];
        let (near, far) = if diff <= 0.0 { ((lo, mid), (mid + 1, hi)) } else { ((mid + 1, hi), (lo, mid)) };
        self.search(near.0, near.1, depth + 1, target, k, radius2, heap);

        let bound = match heap.peek() {
            Some(worst) if heap.len() == k => worst.dist2.min(radius2),
            _ => radius2,
        };
        if diff * diff <= bound {
            self.search(far.0, far.1, depth + 1, target, k, radius2, heap);
        }
    }
}

fn build(points: &[Point3<f64>], order: &mut [usize], depth: usize) {
    if order.len() <= 1 {
        return;
    }
    let axis = depth % 3;
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| points[a][axis].total_cmp(&points[b][axis]));
    let (left, right) = order.split_at_mut(mid);
    build(points, left, depth + 1);
    build(points, &mut right[1..], depth + 1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(points: &[Point3<f64>], target: &Point3<f64>, k: usize, radius: f64) -> Vec<usize> {
        let mut hits: Vec<Candidate> = points
            .iter()
            .enumerate()
            .map(|(index, p)| Candidate {
                dist2: (p - target).norm_squared(),
                index,
            })
            .filter(|c| c.dist2 <= radius * radius)
            .collect();
        hits.sort();
        hits.truncate(k);
        hits.into_iter().map(|c| c.index).collect()
    }

    fn lattice() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for i in 0..7 {
            for j in 0..5 {
                for l in 0..4 {
                    let jitter = 0.01 * ((i * 31 + j * 17 + l * 7) % 11) as f64;
                    points.push(Point3::new(i as f64 + jitter, j as f64 * 0.5, l as f64 * 2.0 - jitter));
                }
            }
        }
        points
    }

    #[test]
    fn matches_brute_force() {
        let points = lattice();
        let tree = KdTree::new(points.clone());
        for target in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.3, 1.2, 2.9),
            Point3::new(6.1, 2.0, 6.0),
            Point3::new(-1.0, 10.0, 3.0),
        ] {
            for (k, radius) in [(1, 10.0), (5, 1.0), (12, 2.5), (200, 100.0)] {
                let hits: Vec<usize> = tree.nearest_within(&target, k, radius).iter().map(|n| n.index).collect();
                assert_eq!(hits, brute_force(&points, &target, k, radius), "target {target} k {k} r {radius}");
            }
        }
    }

    #[test]
    fn radius_limits_hits() {
        let tree = KdTree::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0005),
            Point3::new(0.0, 0.0, 10.0),
        ]);
        let hits = tree.nearest_within(&Point3::origin(), 10, 0.001);
        assert_eq!(hits.iter().map(|n| n.index).collect::<Vec<_>>(), vec![0, 1]);
        assert!((hits[1].distance - 0.0005).abs() < 1e-12);
    }

    #[test]
    fn empty_tree() {
        let tree = KdTree::new(Vec::new());
        assert!(tree.is_empty());
        assert!(tree.nearest_within(&Point3::origin(), 3, 1.0).is_empty());
    }
}
