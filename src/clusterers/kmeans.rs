//! K-means.
//!
//! Grounded in `kmeans.cpp`: squared-distance assignment, arithmetic-mean
//! update, and the maximum-per-cluster-movement termination metric. The
//! source never guards against an assignment pass leaving a cluster empty
//! (a following mean computation would divide by zero); this module drops
//! empty clusters instead, since the specification's Design Notes require
//! it regardless of what the literal source would do.

use crate::clusterers::{assign_to_nearest, ClusterSequence, Clusterer};
use crate::error::{CoreError, Result};
use crate::geometry::{euclidean_distance, euclidean_distance_squared, mean, Dataset, Point};

#[derive(Debug, Clone, Copy)]
pub struct KMeansSettings {
    pub tolerance: f64,
    pub max_iter: usize,
}

impl Default for KMeansSettings {
    fn default() -> Self {
        KMeansSettings { tolerance: 0.025, max_iter: 200 }
    }
}

pub struct KMeans {
    centers: Vec<Point>,
    settings: KMeansSettings,
}

impl KMeans {
    pub fn new(initial_centers: Vec<Point>, settings: KMeansSettings) -> Result<Self> {
        if initial_centers.is_empty() {
            return Err(CoreError::InvalidParameter("k-means requires at least one initial center".into()));
        }
        Ok(KMeans { centers: initial_centers, settings })
    }

    pub fn centers(&self) -> &[Point] {
        &self.centers
    }
}

impl Clusterer for KMeans {
    fn process(&mut self, dataset: &Dataset) -> Result<ClusterSequence> {
        if dataset.dim() != self.centers[0].dim() {
            return Err(CoreError::DimensionMismatch { expected: self.centers[0].dim(), actual: dataset.dim() });
        }

        // The source pre-squares `tolerance` under its `FAST_SOLUTION` path
        // so the termination check can stay in squared-distance space.
        let tolerance_sq = self.settings.tolerance * self.settings.tolerance;
        let mut current_change = f64::MAX;
        let mut clusters = Vec::new();

        for _ in 0..self.settings.max_iter {
            if current_change <= tolerance_sq {
                break;
            }
            clusters = assign_to_nearest(dataset, &self.centers, euclidean_distance_squared);

            let new_centers: Vec<Point> = clusters
                .iter()
                .map(|members| mean(&members.iter().map(|&i| dataset.get(i)).collect::<Vec<_>>()))
                .collect();

            current_change = self
                .centers
                .iter()
                .zip(&new_centers)
                .map(|(old, new)| euclidean_distance_squared(old, new))
                .fold(0.0, f64::max);

            self.centers = new_centers;
        }

        if clusters.is_empty() {
            clusters = assign_to_nearest(dataset, &self.centers, euclidean_distance);
        }

        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn simple_01_with_two_seeds_splits_evenly() {
        let dataset = simple_01();
        let seeds = vec![Point::new(vec![3.7, 5.5]), Point::new(vec![6.7, 7.5])];
        let mut kmeans = KMeans::new(seeds, KMeansSettings { tolerance: 1e-4, max_iter: 200 }).unwrap();
        let clusters = kmeans.process(&dataset).unwrap();
        assert_eq!(clusters.len(), 2);
        let mut sizes: Vec<_> = clusters.iter().map(|c| c.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![5, 5]);
    }

    #[test]
    fn rejects_empty_initial_centers() {
        assert!(KMeans::new(vec![], KMeansSettings::default()).is_err());
    }
}
