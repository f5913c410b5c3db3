//! Partitional and hierarchical clusterers built on the shared distance
//! primitives in [`crate::geometry`]: k-means, k-medians, k-medoids,
//! agglomerative (four linkages), the dedicated centroid-only hierarchical
//! clusterer, DBSCAN, ROCK, and x-means.

pub mod agglomerative;
pub mod dbscan;
pub mod hierarchical;
pub mod kmeans;
pub mod kmedians;
pub mod kmedoids;
pub mod rock;
pub mod xmeans;

use crate::error::Result;
use crate::geometry::Dataset;

/// An ordered sequence of point-index clusters. For every clusterer except
/// DBSCAN and ROCK, this is a partition of `0..dataset.len()`.
pub type ClusterSequence = Vec<Vec<usize>>;

/// Shared interface for clusterers that produce a straightforward partition
/// of the input (k-means, k-medians, k-medoids, agglomerative, hierarchical,
/// ROCK, x-means). DBSCAN (clusters-plus-noise) and CURE (consuming `self`
/// to emit a plain `Vec<Vec<usize>>` without a reusable `&mut self` handle)
/// deliberately don't implement this -- forcing their result shapes through
/// one trait would lose precision, so they expose their own inherent
/// `process` methods instead.
pub trait Clusterer {
    fn process(&mut self, dataset: &Dataset) -> Result<ClusterSequence>;
}

/// Assigns every point in `dataset` to the nearest of `centers` under
/// `metric`, dropping centers that end up with no members (shared by
/// k-means/k-medians/k-medoids' per-iteration assignment step).
pub(crate) fn assign_to_nearest(
    dataset: &Dataset,
    centers: &[crate::geometry::Point],
    metric: impl Fn(&crate::geometry::Point, &crate::geometry::Point) -> f64,
) -> Vec<Vec<usize>> {
    let mut clusters = vec![Vec::new(); centers.len()];
    for (i, point) in dataset.iter().enumerate() {
        let (best, _) = centers
            .iter()
            .enumerate()
            .map(|(k, c)| (k, metric(point, c)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .unwrap();
        clusters[best].push(i);
    }
    clusters.retain(|c| !c.is_empty());
    clusters
}
