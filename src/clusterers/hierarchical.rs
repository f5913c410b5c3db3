//! Dedicated centroid-only hierarchical clusterer.
//!
//! This is a distinct algorithm from [`crate::clusterers::agglomerative`]'s
//! centroid linkage, not a duplicate of it: grounded in
//! `hierarchical.cpp`'s `hierarchical_cluster::append`, which on every
//! merge recomputes the surviving cluster's center as the plain unweighted
//! mean over *all* accumulated member points (a full recompute each time),
//! whereas agglomerative's centroid linkage is one of four interchangeable
//! distance functions driving an otherwise generic merge loop. Kept
//! separate because the specification lists them as separate purposes.

use crate::clusterers::{ClusterSequence, Clusterer};
use crate::error::{CoreError, Result};
use crate::geometry::{euclidean_distance_squared, mean, Dataset, Point};

#[derive(Debug, Clone, Copy)]
pub struct HierarchicalSettings {
    pub number_clusters: usize,
}

pub struct Hierarchical {
    settings: HierarchicalSettings,
}

impl Hierarchical {
    pub fn new(settings: HierarchicalSettings) -> Self {
        Hierarchical { settings }
    }
}

struct Cluster {
    points: Vec<usize>,
    center: Point,
}

impl Clusterer for Hierarchical {
    fn process(&mut self, dataset: &Dataset) -> Result<ClusterSequence> {
        if self.settings.number_clusters == 0 || self.settings.number_clusters > dataset.len() {
            return Err(CoreError::InvalidParameter(format!(
                "hierarchical target cluster count {} must be in 1..={}",
                self.settings.number_clusters,
                dataset.len()
            )));
        }

        let mut clusters: Vec<Cluster> = (0..dataset.len())
            .map(|i| Cluster { points: vec![i], center: dataset.get(i).clone() })
            .collect();

        while clusters.len() > self.settings.number_clusters {
            let (i, j) = closest_centroid_pair(&clusters);

            let mut merged_points = clusters[i].points.clone();
            merged_points.extend(clusters[j].points.iter().copied());
            let merged_center = mean(&merged_points.iter().map(|&k| dataset.get(k)).collect::<Vec<_>>());

            clusters[i].points = merged_points;
            clusters[i].center = merged_center;
            clusters.remove(j);
        }

        let mut result: Vec<Vec<usize>> = clusters.into_iter().map(|c| c.points).collect();
        for cluster in &mut result {
            cluster.sort_unstable();
        }
        Ok(result)
    }
}

fn closest_centroid_pair(clusters: &[Cluster]) -> (usize, usize) {
    let mut best = (0, 1, f64::INFINITY);
    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            let d = euclidean_distance_squared(&clusters[i].center, &clusters[j].center);
            if d < best.2 {
                best = (i, j, d);
            }
        }
    }
    (best.0, best.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn splits_two_blobs_evenly() {
        let points = vec![
            Point::new(vec![3.5, 4.8]),
            Point::new(vec![3.7, 5.5]),
            Point::new(vec![3.9, 4.2]),
            Point::new(vec![4.2, 5.1]),
            Point::new(vec![4.4, 4.6]),
            Point::new(vec![6.1, 7.5]),
            Point::new(vec![6.4, 7.9]),
            Point::new(vec![6.7, 7.5]),
            Point::new(vec![7.0, 7.1]),
            Point::new(vec![6.9, 8.0]),
        ];
        let dataset = Dataset::new(points).unwrap();
        let mut h = Hierarchical::new(HierarchicalSettings { number_clusters: 2 });
        let clusters = h.process(&dataset).unwrap();
        let mut sizes: Vec<_> = clusters.iter().map(|c| c.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![5, 5]);
    }

    #[test]
    fn rejects_zero_target() {
        let dataset = Dataset::new(vec![Point::new(vec![0.0])]).unwrap();
        let mut h = Hierarchical::new(HierarchicalSettings { number_clusters: 0 });
        assert!(h.process(&dataset).is_err());
    }
}
