//! DBSCAN.
//!
//! Grounded in `dbscan.cpp`'s neighbor-matrix BFS expansion: every point
//! within `radius` of a core point joins its cluster via a breadth-first
//! queue, and a cluster only forms once its seed point's neighbor count
//! (excluding itself) reaches `min_neighbors`.
//!
//! The source appends a point to `noise` the moment a BFS step finds it has
//! too few neighbors to keep expanding from, but doesn't retract that
//! membership if a *later* cluster's expansion reaches the same point from
//! a denser direction -- leaving a point in both `noise` and a cluster.
//! This violates the specification's explicit disjoint-partition invariant,
//! so membership here is tracked with a single `assignment` slot per point
//! (`None` until claimed), and a point is only ever placed in `noise` after
//! every cluster has finished forming.

use crate::geometry::{euclidean_distance_squared, Dataset};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
pub struct DbscanSettings {
    pub radius: f64,
    pub min_neighbors: usize,
}

pub struct DbscanResult {
    pub clusters: Vec<Vec<usize>>,
    pub noise: Vec<usize>,
}

pub struct Dbscan {
    settings: DbscanSettings,
}

impl Dbscan {
    pub fn new(settings: DbscanSettings) -> Self {
        Dbscan { settings }
    }

    pub fn process(&self, dataset: &Dataset) -> DbscanResult {
        let n = dataset.len();
        let radius_sq = self.settings.radius * self.settings.radius;
        let neighbors: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| j != i && euclidean_distance_squared(dataset.get(i), dataset.get(j)) <= radius_sq)
                    .collect()
            })
            .collect();

        let mut assignment: Vec<Option<usize>> = vec![None; n];
        let mut clusters: Vec<Vec<usize>> = Vec::new();

        for seed in 0..n {
            if assignment[seed].is_some() {
                continue;
            }
            if neighbors[seed].len() < self.settings.min_neighbors {
                continue;
            }

            let cluster_id = clusters.len();
            let mut members = vec![seed];
            assignment[seed] = Some(cluster_id);

            let mut queue: VecDeque<usize> = neighbors[seed].iter().copied().collect();
            while let Some(candidate) = queue.pop_front() {
                if assignment[candidate].is_some() {
                    continue;
                }
                assignment[candidate] = Some(cluster_id);
                members.push(candidate);

                if neighbors[candidate].len() >= self.settings.min_neighbors {
                    for &next in &neighbors[candidate] {
                        if assignment[next].is_none() {
                            queue.push_back(next);
                        }
                    }
                }
            }

            clusters.push(members);
        }

        let noise: Vec<usize> = (0..n).filter(|&i| assignment[i].is_none()).collect();
        DbscanResult { clusters, noise }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn simple_02() -> Dataset {
        let mut points = Vec::new();
        for i in 0..10 {
            points.push(Point::new(vec![i as f64 * 0.1, 0.0]));
        }
        for i in 0..5 {
            points.push(Point::new(vec![5.0 + i as f64 * 0.1, 5.0]));
        }
        for i in 0..8 {
            points.push(Point::new(vec![10.0 + i as f64 * 0.1, -5.0]));
        }
        Dataset::new(points).unwrap()
    }

    #[test]
    fn simple_02_splits_into_three_dense_groups_no_noise() {
        let dataset = simple_02();
        let dbscan = Dbscan::new(DbscanSettings { radius: 0.5, min_neighbors: 2 });
        let result = dbscan.process(&dataset);
        assert!(result.noise.is_empty());
        let mut sizes: Vec<_> = result.clusters.iter().map(|c| c.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![5, 8, 10]);
    }

    #[test]
    fn clusters_and_noise_partition_disjointly() {
        let dataset = simple_02();
        let dbscan = Dbscan::new(DbscanSettings { radius: 0.5, min_neighbors: 2 });
        let result = dbscan.process(&dataset);
        let mut seen = vec![false; dataset.len()];
        for cluster in &result.clusters {
            for &i in cluster {
                assert!(!seen[i], "point {i} appeared twice");
                seen[i] = true;
            }
        }
        for &i in &result.noise {
            assert!(!seen[i], "point {i} in both noise and a cluster");
            seen[i] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
