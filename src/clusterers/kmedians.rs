//! K-medians.
//!
//! Grounded in `kmedians.cpp`: squared-distance assignment, backward-erase
//! empty-cluster removal, and the stall detector (`counter_repeaters`
//! reaching 10 consecutive near-identical `changes` values ends the loop
//! early, independent of `tolerance`).
//!
//! The source's `update_medians` sorts cluster members by full point
//! comparison (not by the dimension currently being updated) and its
//! odd/even branch picks the *average of two* elements for an odd-sized
//! cluster and a *single* element for an even-sized one -- backwards from
//! the standard median convention and inconsistent with the specification's
//! own, unambiguous prose. This module implements the specification's
//! intended median instead: sort by value along the dimension being
//! updated, take the middle value (or the mean of the two middle values
//! for an even-sized cluster).

use crate::clusterers::{ClusterSequence, Clusterer};
use crate::error::{CoreError, Result};
use crate::geometry::{euclidean_distance_squared, Dataset, Point};

#[derive(Debug, Clone, Copy)]
pub struct KMediansSettings {
    pub tolerance: f64,
}

impl Default for KMediansSettings {
    fn default() -> Self {
        KMediansSettings { tolerance: 0.025 }
    }
}

pub struct KMedians {
    medians: Vec<Point>,
    settings: KMediansSettings,
}

impl KMedians {
    pub fn new(initial_medians: Vec<Point>, settings: KMediansSettings) -> Result<Self> {
        if initial_medians.is_empty() {
            return Err(CoreError::InvalidParameter("k-medians requires at least one initial median".into()));
        }
        Ok(KMedians { medians: initial_medians, settings })
    }

    pub fn medians(&self) -> &[Point] {
        &self.medians
    }
}

impl Clusterer for KMedians {
    fn process(&mut self, dataset: &Dataset) -> Result<ClusterSequence> {
        if dataset.dim() != self.medians[0].dim() {
            return Err(CoreError::DimensionMismatch { expected: self.medians[0].dim(), actual: dataset.dim() });
        }

        let stop_condition = self.settings.tolerance * self.settings.tolerance;
        let mut changes = 0.0_f64;
        let mut prev_changes;
        let mut counter_repeaters = 0;
        let mut clusters;

        loop {
            clusters = update_clusters(dataset, &self.medians);
            prev_changes = changes;
            changes = update_medians(dataset, &clusters, &mut self.medians);

            if (changes - prev_changes).abs() < 0.000_001 {
                counter_repeaters += 1;
            } else {
                counter_repeaters = 0;
            }

            if !(changes > stop_condition && counter_repeaters < 10) {
                break;
            }
        }

        Ok(clusters)
    }
}

fn update_clusters(dataset: &Dataset, medians: &[Point]) -> Vec<Vec<usize>> {
    let mut clusters = vec![Vec::new(); medians.len()];
    for (i, point) in dataset.iter().enumerate() {
        let (best, _) = medians
            .iter()
            .enumerate()
            .map(|(k, m)| (k, euclidean_distance_squared(point, m)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        clusters[best].push(i);
    }
    clusters.retain(|c| !c.is_empty());
    clusters
}

fn update_medians(dataset: &Dataset, clusters: &[Vec<usize>], medians: &mut Vec<Point>) -> f64 {
    let dim = dataset.dim();
    let prev_medians = medians.clone();
    let mut new_medians = Vec::with_capacity(clusters.len());

    for members in clusters {
        let mut coords = vec![0.0; dim];
        for d in 0..dim {
            let mut values: Vec<f64> = members.iter().map(|&i| dataset.get(i)[d]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let mid = values.len() / 2;
            coords[d] = if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            };
        }
        new_medians.push(Point::new(coords));
    }

    let maximum_change = prev_medians
        .iter()
        .zip(&new_medians)
        .map(|(old, new)| euclidean_distance_squared(old, new))
        .fold(0.0, f64::max);

    *medians = new_medians;
    maximum_change
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_even_cluster_averages_middle_two() {
        let points = vec![
            Point::new(vec![0.0]),
            Point::new(vec![1.0]),
            Point::new(vec![2.0]),
            Point::new(vec![3.0]),
        ];
        let dataset = Dataset::new(points).unwrap();
        let mut kmedians = KMedians::new(vec![Point::new(vec![0.0])], KMediansSettings::default()).unwrap();
        kmedians.process(&dataset).unwrap();
        assert!((kmedians.medians()[0][0] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let dataset = Dataset::new(vec![Point::new(vec![0.0, 0.0])]).unwrap();
        let mut kmedians = KMedians::new(vec![Point::new(vec![0.0])], KMediansSettings::default()).unwrap();
        assert!(kmedians.process(&dataset).is_err());
    }
}
