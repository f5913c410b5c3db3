//! K-medoids (PAM-style).
//!
//! Unlike k-means/k-medians, medoids are drawn from the dataset itself
//! rather than synthesized: the update step picks, for each cluster, the
//! member minimizing the summed dissimilarity to every other member.
//! Distance is pluggable (Euclidean by default), matching the
//! specification's Design Notes on metric selection.

use crate::clusterers::{ClusterSequence, Clusterer};
use crate::error::{CoreError, Result};
use crate::geometry::{euclidean_distance, Dataset, Metric};

#[derive(Debug, Clone, Copy)]
pub struct KMedoidsSettings {
    pub tolerance: f64,
    pub max_iter: usize,
    pub metric: Metric,
}

impl Default for KMedoidsSettings {
    fn default() -> Self {
        KMedoidsSettings { tolerance: 0.025, max_iter: 200, metric: euclidean_distance }
    }
}

pub struct KMedoids {
    medoid_indices: Vec<usize>,
    settings: KMedoidsSettings,
}

impl KMedoids {
    pub fn new(initial_medoid_indices: Vec<usize>, settings: KMedoidsSettings) -> Result<Self> {
        if initial_medoid_indices.is_empty() {
            return Err(CoreError::InvalidParameter("k-medoids requires at least one initial medoid".into()));
        }
        Ok(KMedoids { medoid_indices: initial_medoid_indices, settings })
    }

    pub fn medoid_indices(&self) -> &[usize] {
        &self.medoid_indices
    }
}

impl Clusterer for KMedoids {
    fn process(&mut self, dataset: &Dataset) -> Result<ClusterSequence> {
        for &idx in &self.medoid_indices {
            if idx >= dataset.len() {
                return Err(CoreError::InvalidParameter(format!("medoid index {idx} out of range")));
            }
        }

        let metric = self.settings.metric;
        let mut clusters = Vec::new();

        for _ in 0..self.settings.max_iter {
            let medoids: Vec<_> = self.medoid_indices.iter().map(|&i| dataset.get(i)).collect();

            clusters = vec![Vec::new(); medoids.len()];
            for (i, point) in dataset.iter().enumerate() {
                let (best, _) = medoids
                    .iter()
                    .enumerate()
                    .map(|(k, m)| (k, metric(point, m)))
                    .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                    .unwrap();
                clusters[best].push(i);
            }
            clusters.retain(|c| !c.is_empty());

            let new_medoid_indices: Vec<usize> = clusters
                .iter()
                .map(|members| {
                    *members
                        .iter()
                        .min_by(|&&a, &&b| {
                            let cost_a: f64 = members.iter().map(|&x| metric(dataset.get(a), dataset.get(x))).sum();
                            let cost_b: f64 = members.iter().map(|&x| metric(dataset.get(b), dataset.get(x))).sum();
                            cost_a.partial_cmp(&cost_b).unwrap()
                        })
                        .unwrap()
                })
                .collect();

            let max_change = self
                .medoid_indices
                .iter()
                .zip(&new_medoid_indices)
                .map(|(&old, &new)| metric(dataset.get(old), dataset.get(new)))
                .fold(0.0, f64::max);

            self.medoid_indices = new_medoid_indices;

            if max_change <= self.settings.tolerance {
                break;
            }
        }

        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn converges_on_two_well_separated_blobs() {
        let points = vec![
            Point::new(vec![0.0, 0.0]),
            Point::new(vec![0.1, 0.1]),
            Point::new(vec![0.2, 0.0]),
            Point::new(vec![9.0, 9.0]),
            Point::new(vec![9.1, 9.1]),
            Point::new(vec![9.2, 9.0]),
        ];
        let dataset = Dataset::new(points).unwrap();
        let mut kmedoids = KMedoids::new(vec![0, 3], KMedoidsSettings::default()).unwrap();
        let clusters = kmedoids.process(&dataset).unwrap();
        assert_eq!(clusters.len(), 2);
        for cluster in &clusters {
            assert!(cluster.iter().all(|&i| i < 3) || cluster.iter().all(|&i| i >= 3));
        }
    }

    #[test]
    fn rejects_out_of_range_medoid_index() {
        let dataset = Dataset::new(vec![Point::new(vec![0.0])]).unwrap();
        let mut kmedoids = KMedoids::new(vec![5], KMedoidsSettings::default()).unwrap();
        assert!(kmedoids.process(&dataset).is_err());
    }
}
