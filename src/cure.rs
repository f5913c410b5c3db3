//! CURE: hierarchical clustering via representative points and shrinkage.
//!
//! Grounded in `cure.h`/`cure.cpp`. The original ties a cluster, the
//! priority queue, and the kd-tree together with raw back-pointers (a
//! cluster points at its nearest neighbor cluster, the queue holds cluster
//! pointers, the kd-tree's payload is a cluster pointer). This module
//! replaces every one of those with a stable [`CureClusterId`] handle into
//! an arena (`Vec<CureClusterEntry>`), so a merged-away cluster's slot is
//! simply never referenced by a live handle again -- no manual pointer
//! bookkeeping, per the crate's arena-over-raw-pointers convention for
//! recursive/cyclic structures (see `SPEC_FULL.md` §9).
//!
//! The post-merge relocation step (recomputing `closest` for clusters whose
//! previous nearest neighbor was just merged away) follows the published
//! CURE algorithm (Guha, Rastogi, Shim 2001), using a kd-tree radius search
//! to avoid a full rescan -- the same role `cure_queue::relocate_request`
//! plays in the source.

use crate::error::{CoreError, Result};
use crate::geometry::{euclidean_distance, mean, weighted_midpoint, Dataset, Point};
use crate::kdtree::KdTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CureClusterId(usize);

#[derive(Debug, Clone)]
struct CureClusterEntry {
    points: Vec<usize>,
    representatives: Vec<Point>,
    mean: Point,
    closest: Option<CureClusterId>,
    distance_closest: f64,
    alive: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CureSettings {
    pub number_clusters: usize,
    pub number_representatives: usize,
    pub compression: f64,
}

pub struct Cure {
    dataset: Dataset,
    clusters: Vec<CureClusterEntry>,
    queue: Vec<CureClusterId>,
    tree: KdTree<CureClusterId>,
    settings: CureSettings,
}

impl Cure {
    pub fn new(dataset: Dataset, settings: CureSettings) -> Result<Self> {
        if settings.number_clusters == 0 || settings.number_clusters > dataset.len() {
            return Err(CoreError::InvalidParameter(format!(
                "cure target cluster count {} must be in 1..={}",
                settings.number_clusters,
                dataset.len()
            )));
        }
        if !(0.0..=1.0).contains(&settings.compression) {
            return Err(CoreError::InvalidParameter("cure compression must be in [0, 1]".into()));
        }
        if settings.number_representatives == 0 {
            return Err(CoreError::InvalidParameter("cure requires at least one representative per cluster".into()));
        }

        let n = dataset.len();
        let mut clusters: Vec<CureClusterEntry> = (0..n)
            .map(|i| CureClusterEntry {
                points: vec![i],
                representatives: vec![dataset.get(i).clone()],
                mean: dataset.get(i).clone(),
                closest: None,
                distance_closest: f64::INFINITY,
                alive: true,
            })
            .collect();

        let mut tree: KdTree<CureClusterId> = KdTree::new(dataset.dim());
        for i in 0..n {
            tree.insert(dataset.get(i).clone(), CureClusterId(i))?;
        }

        // Initial closest/distance_closest by brute-force scan, matching
        // `cure_cluster`'s initial state before any merges.
        for i in 0..n {
            let mut best: Option<(usize, f64)> = None;
            for j in 0..n {
                if i == j {
                    continue;
                }
                let d = euclidean_distance(&clusters[i].representatives[0], &clusters[j].representatives[0]);
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((j, d));
                }
            }
            if let Some((j, d)) = best {
                clusters[i].closest = Some(CureClusterId(j));
                clusters[i].distance_closest = d;
            }
        }

        let mut queue: Vec<CureClusterId> = (0..n).map(CureClusterId).collect();
        queue.sort_by(|a, b| {
            clusters[a.0]
                .distance_closest
                .partial_cmp(&clusters[b.0].distance_closest)
                .unwrap()
        });

        Ok(Cure { dataset, clusters, queue, tree, settings })
    }

    fn inter_cluster_distance(&self, a: CureClusterId, b: CureClusterId) -> f64 {
        let mut best = f64::INFINITY;
        for ra in &self.clusters[a.0].representatives {
            for rb in &self.clusters[b.0].representatives {
                let d = euclidean_distance(ra, rb);
                if d < best {
                    best = d;
                }
            }
        }
        best
    }

    fn select_representatives(&self, points: &[usize]) -> Vec<Point> {
        let member_points: Vec<&Point> = points.iter().map(|&i| self.dataset.get(i)).collect();
        let cluster_mean = mean(&member_points);
        let r = self.settings.number_representatives.min(member_points.len());

        let mut chosen: Vec<&Point> = Vec::new();
        let mut remaining: Vec<&Point> = member_points.clone();

        for _ in 0..r {
            let seed: Vec<&Point> = if chosen.is_empty() {
                vec![&cluster_mean]
            } else {
                chosen.clone()
            };
            let (best_idx, _) = remaining
                .iter()
                .enumerate()
                .map(|(idx, p)| {
                    let min_dist = seed
                        .iter()
                        .map(|s| euclidean_distance(p, s))
                        .fold(f64::INFINITY, f64::min);
                    (idx, min_dist)
                })
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                .unwrap();
            let picked = remaining.remove(best_idx);
            chosen.push(picked);
        }

        let shrunk_all: Vec<Point> = chosen
            .into_iter()
            .map(|p| weighted_midpoint(p, &cluster_mean, 1.0 - self.settings.compression))
            .collect();
        let mut shrunk: Vec<Point> = Vec::with_capacity(shrunk_all.len());
        for p in shrunk_all {
            if !shrunk.contains(&p) {
                shrunk.push(p);
            }
        }
        shrunk
    }

    /// Runs the merge loop to completion, returning the final partition as
    /// point-index sets.
    pub fn process(mut self) -> Result<Vec<Vec<usize>>> {
        let mut live_count = self.dataset.len();

        while live_count > self.settings.number_clusters {
            let a_id = self.queue[0];
            let b_id = self.clusters[a_id.0]
                .closest
                .expect("every live cluster has a nearest neighbor once more than one remains");

            // Remove representatives of both merging clusters from the tree.
            for rep in self.clusters[a_id.0].representatives.clone() {
                self.tree.remove(&rep, a_id);
            }
            for rep in self.clusters[b_id.0].representatives.clone() {
                self.tree.remove(&rep, b_id);
            }

            let size_a = self.clusters[a_id.0].points.len() as f64;
            let size_b = self.clusters[b_id.0].points.len() as f64;
            let total = size_a + size_b;

            let mut merged_points = self.clusters[a_id.0].points.clone();
            merged_points.extend(self.clusters[b_id.0].points.iter().copied());

            let merged_mean = weighted_midpoint(
                &self.clusters[a_id.0].mean,
                &self.clusters[b_id.0].mean,
                size_a / total,
            );

            self.clusters[a_id.0].alive = false;
            self.clusters[b_id.0].alive = false;

            let representatives = self.select_representatives(&merged_points);
            let m_id = CureClusterId(self.clusters.len());
            self.clusters.push(CureClusterEntry {
                points: merged_points,
                representatives: representatives.clone(),
                mean: merged_mean,
                closest: None,
                distance_closest: f64::INFINITY,
                alive: true,
            });

            for rep in &representatives {
                self.tree.insert(rep.clone(), m_id)?;
            }

            self.queue.retain(|&id| id != a_id && id != b_id);

            // Determine M's nearest cluster by scanning every other live cluster.
            let mut m_closest: Option<(CureClusterId, f64)> = None;
            for &other in &self.queue {
                let d = self.inter_cluster_distance(m_id, other);
                if m_closest.map_or(true, |(_, bd)| d < bd) {
                    m_closest = Some((other, d));
                }
            }
            if let Some((closest, d)) = m_closest {
                self.clusters[m_id.0].closest = Some(closest);
                self.clusters[m_id.0].distance_closest = d;
            }

            // Relocate clusters whose previous nearest neighbor was just merged away.
            for &c_id in &self.queue {
                let dist_to_m = self.inter_cluster_distance(c_id, m_id);
                let previous_closest = self.clusters[c_id.0].closest;

                if previous_closest == Some(a_id) || previous_closest == Some(b_id) {
                    let mut best: Option<(CureClusterId, f64)> = None;
                    for rep in self.clusters[c_id.0].representatives.clone() {
                        for (node, d) in self.tree.find_nearest_within(&rep, dist_to_m) {
                            let candidate = self.tree.payload(node);
                            if candidate != c_id && best.map_or(true, |(_, bd)| d < bd) {
                                best = Some((candidate, d));
                            }
                        }
                    }
                    match best {
                        Some((cand, d)) => {
                            self.clusters[c_id.0].closest = Some(cand);
                            self.clusters[c_id.0].distance_closest = d;
                        }
                        None => {
                            self.clusters[c_id.0].closest = Some(m_id);
                            self.clusters[c_id.0].distance_closest = dist_to_m;
                        }
                    }
                } else if dist_to_m < self.clusters[c_id.0].distance_closest {
                    self.clusters[c_id.0].closest = Some(m_id);
                    self.clusters[c_id.0].distance_closest = dist_to_m;
                }
            }

            self.queue.push(m_id);
            self.queue.sort_by(|a, b| {
                self.clusters[a.0]
                    .distance_closest
                    .partial_cmp(&self.clusters[b.0].distance_closest)
                    .unwrap()
            });

            live_count -= 1;
        }

        Ok(self
            .queue
            .iter()
            .map(|&id| {
                let mut pts = self.clusters[id.0].points.clone();
                pts.sort_unstable();
                pts
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn make_points() -> Vec<Point> {
        let mut pts = Vec::new();
        for i in 0..10 {
            pts.push(Point::new(vec![i as f64 * 0.1, 0.0]));
        }
        for i in 0..10 {
            pts.push(Point::new(vec![i as f64 * 0.1, 10.0]));
        }
        for i in 0..10 {
            pts.push(Point::new(vec![i as f64 * 0.1, 20.0]));
        }
        for i in 0..30 {
            pts.push(Point::new(vec![i as f64 * 0.1, 40.0]));
        }
        pts
    }

    #[test]
    fn merges_down_to_requested_cluster_count() {
        let dataset = Dataset::new(make_points()).unwrap();
        let cure = Cure::new(
            dataset,
            CureSettings { number_clusters: 4, number_representatives: 5, compression: 0.5 },
        )
        .unwrap();
        let clusters = cure.process().unwrap();
        assert_eq!(clusters.len(), 4);
        let mut sizes: Vec<_> = clusters.iter().map(|c| c.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![10, 10, 10, 30]);
    }

    #[test]
    fn rejects_out_of_range_cluster_count() {
        let dataset = Dataset::new(vec![Point::new(vec![0.0]), Point::new(vec![1.0])]).unwrap();
        let settings = CureSettings { number_clusters: 5, number_representatives: 1, compression: 0.5 };
        assert!(Cure::new(dataset, settings).is_err());
    }
}
