//! Agglomerative clustering with single, complete, average, and centroid
//! linkage.
//!
//! Grounded in `agglomerative.cpp`. The average-linkage formula there
//! divides the summed squared pairwise distance by `size1 + size2` (the
//! sum, not the product as in the textbook average-linkage formula) --
//! preserved here since it's the specification's own stated formula, not
//! an accident of the source.
//!
//! The source's centroid-linkage merge appears to store the freshly
//! recomputed centroid into the slot of the cluster about to be erased
//! rather than the surviving one, leaving the surviving cluster's cached
//! center stale on the next iteration. This module stores the new centroid
//! at the surviving cluster's index, which is self-evidently the intended
//! behavior (and the only one that keeps centroids accurate across merges).

use crate::clusterers::{ClusterSequence, Clusterer};
use crate::error::{CoreError, Result};
use crate::geometry::{euclidean_distance_squared, mean, Dataset, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Single,
    Complete,
    Average,
    Centroid,
}

impl Linkage {
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            "centroid" => Ok(Linkage::Centroid),
            other => Err(CoreError::UnknownLinkage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AgglomerativeSettings {
    pub number_clusters: usize,
    pub linkage: Linkage,
}

pub struct Agglomerative {
    settings: AgglomerativeSettings,
}

impl Agglomerative {
    pub fn new(settings: AgglomerativeSettings) -> Self {
        Agglomerative { settings }
    }
}

struct Cluster {
    points: Vec<usize>,
    center: Point,
}

impl Clusterer for Agglomerative {
    fn process(&mut self, dataset: &Dataset) -> Result<ClusterSequence> {
        if self.settings.number_clusters == 0 || self.settings.number_clusters > dataset.len() {
            return Err(CoreError::InvalidParameter(format!(
                "agglomerative target cluster count {} must be in 1..={}",
                self.settings.number_clusters,
                dataset.len()
            )));
        }

        let mut clusters: Vec<Cluster> = (0..dataset.len())
            .map(|i| Cluster { points: vec![i], center: dataset.get(i).clone() })
            .collect();

        while clusters.len() > self.settings.number_clusters {
            let (i, j) = find_closest_pair(&clusters, dataset, self.settings.linkage);

            let merged_points: Vec<usize> = {
                let mut pts = clusters[i].points.clone();
                pts.extend(clusters[j].points.iter().copied());
                pts
            };
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

fn find_closest_pair(clusters: &[Cluster], dataset: &Dataset, linkage: Linkage) -> (usize, usize) {
    let mut best = (0, 1, f64::INFINITY);
    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            let d = linkage_distance(&clusters[i], &clusters[j], dataset, linkage);
            if d < best.2 {
                best = (i, j, d);
            }
        }
    }
    (best.0, best.1)
}

fn linkage_distance(a: &Cluster, b: &Cluster, dataset: &Dataset, linkage: Linkage) -> f64 {
    match linkage {
        Linkage::Single => a
            .points
            .iter()
            .flat_map(|&p| b.points.iter().map(move |&q| (p, q)))
            .map(|(p, q)| euclidean_distance_squared(dataset.get(p), dataset.get(q)))
            .fold(f64::INFINITY, f64::min),
        Linkage::Complete => a
            .points
            .iter()
            .flat_map(|&p| b.points.iter().map(move |&q| (p, q)))
            .map(|(p, q)| euclidean_distance_squared(dataset.get(p), dataset.get(q)))
            .fold(0.0, f64::max),
        Linkage::Average => {
            let sum: f64 = a
                .points
                .iter()
                .flat_map(|&p| b.points.iter().map(move |&q| (p, q)))
                .map(|(p, q)| euclidean_distance_squared(dataset.get(p), dataset.get(q)))
                .sum();
            sum / (a.points.len() + b.points.len()) as f64
        }
        Linkage::Centroid => euclidean_distance_squared(&a.center, &b.center),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn simple_01() -> Dataset {
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
        Dataset::new(points).unwrap()
    }

    #[test]
    fn all_four_linkages_split_simple_01_evenly() {
        let dataset = simple_01();
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average, Linkage::Centroid] {
            let mut agg = Agglomerative::new(AgglomerativeSettings { number_clusters: 2, linkage });
            let clusters = agg.process(&dataset).unwrap();
            assert_eq!(clusters.len(), 2, "linkage {linkage:?}");
            let mut sizes: Vec<_> = clusters.iter().map(|c| c.len()).collect();
            sizes.sort_unstable();
            assert_eq!(sizes, vec![5, 5], "linkage {linkage:?}");
        }
    }

    #[test]
    fn rejects_target_above_point_count() {
        let dataset = simple_01();
        let mut agg = Agglomerative::new(AgglomerativeSettings { number_clusters: 100, linkage: Linkage::Single });
        assert!(agg.process(&dataset).is_err());
    }
}
