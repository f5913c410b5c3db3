//! ROCK: link-based agglomerative clustering for categorical/boolean data.
//!
//! Grounded in `rock.cpp`. Two points are neighbors when within `radius` of
//! one another; two clusters' *links* sum direct adjacency across every
//! member pair (`links(c1, c2) = Σ adjacency[a][b]` for `a ∈ c1, b ∈ c2`),
//! and the goodness measure
//! `g(c1, c2) = links(c1, c2) / (n1 + n2)^f - n1^f - n2^f`, `f = 1 + 2(1 - θ)/(1 + θ)`,
//! favours merges that produce more direct adjacency than their sizes alone
//! would predict. The merge loop stops either once `number_clusters` is
//! reached or once every remaining pair has non-positive goodness, matching
//! the source's early exit rather than forcing merges down to one cluster.

use crate::clusterers::{ClusterSequence, Clusterer};
use crate::error::{CoreError, Result};
use crate::geometry::{euclidean_distance, Dataset};

#[derive(Debug, Clone, Copy)]
pub struct RockSettings {
    pub radius: f64,
    pub number_clusters: usize,
    pub threshold: f64,
}

pub struct Rock {
    settings: RockSettings,
}

impl Rock {
    pub fn new(settings: RockSettings) -> Self {
        Rock { settings }
    }

    fn degree_normalization(&self) -> f64 {
        1.0 + 2.0 * (1.0 - self.settings.threshold) / (1.0 + self.settings.threshold)
    }
}

impl Clusterer for Rock {
    fn process(&mut self, dataset: &Dataset) -> Result<ClusterSequence> {
        if self.settings.number_clusters == 0 || self.settings.number_clusters > dataset.len() {
            return Err(CoreError::InvalidParameter(format!(
                "rock target cluster count {} must be in 1..={}",
                self.settings.number_clusters,
                dataset.len()
            )));
        }

        let n = dataset.len();
        let adjacency: Vec<Vec<bool>> = (0..n)
            .map(|i| (0..n).map(|j| i != j && euclidean_distance(dataset.get(i), dataset.get(j)) <= self.settings.radius).collect())
            .collect();

        let mut links = compute_links(&adjacency);
        let mut clusters: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        let f = self.degree_normalization();

        loop {
            if clusters.len() <= self.settings.number_clusters {
                break;
            }

            let mut best: Option<(usize, usize, f64)> = None;
            for i in 0..clusters.len() {
                for j in (i + 1)..clusters.len() {
                    let link_count = links[i][j];
                    if link_count == 0.0 {
                        continue;
                    }
                    let n1 = clusters[i].len() as f64;
                    let n2 = clusters[j].len() as f64;
                    let goodness = link_count / ((n1 + n2).powf(f) - n1.powf(f) - n2.powf(f));
                    if goodness > 0.0 && best.map_or(true, |(_, _, g)| goodness > g) {
                        best = Some((i, j, goodness));
                    }
                }
            }

            let Some((i, j, _)) = best else { break };

            let mut merged = clusters[i].clone();
            merged.extend(clusters[j].iter().copied());

            let mut new_links = vec![vec![0.0; clusters.len() - 1]; clusters.len() - 1];
            let remap: Vec<usize> = (0..clusters.len()).filter(|&k| k != i && k != j).collect();
            for (a, &ra) in remap.iter().enumerate() {
                for (b, &rb) in remap.iter().enumerate().skip(a + 1) {
                    new_links[a][b] = links[ra][rb];
                    new_links[b][a] = links[ra][rb];
                }
            }
            let merged_row: Vec<f64> = remap.iter().map(|&rk| links[i][rk] + links[j][rk]).collect();
            for (a, &v) in merged_row.iter().enumerate() {
                new_links[a][remap.len()] = v;
                new_links[remap.len()][a] = v;
            }

            let mut new_clusters: Vec<Vec<usize>> = remap.iter().map(|&rk| clusters[rk].clone()).collect();
            new_clusters.push(merged);

            clusters = new_clusters;
            links = new_links;
        }

        for cluster in &mut clusters {
            cluster.sort_unstable();
        }
        Ok(clusters)
    }
}

fn compute_links(adjacency: &[Vec<bool>]) -> Vec<Vec<f64>> {
    let n = adjacency.len();
    let mut links = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let direct = if adjacency[i][j] { 1.0 } else { 0.0 };
            links[i][j] = direct;
            links[j][i] = direct;
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn splits_two_dense_neighborhoods() {
        let points = vec![
            Point::new(vec![0.0, 0.0]),
            Point::new(vec![0.1, 0.1]),
            Point::new(vec![0.2, 0.0]),
            Point::new(vec![0.0, 0.2]),
            Point::new(vec![9.0, 9.0]),
            Point::new(vec![9.1, 9.1]),
            Point::new(vec![9.2, 9.0]),
            Point::new(vec![9.0, 9.2]),
        ];
        let dataset = Dataset::new(points).unwrap();
        let mut rock = Rock::new(RockSettings { radius: 0.5, number_clusters: 2, threshold: 0.5 });
        let clusters = rock.process(&dataset).unwrap();
        assert_eq!(clusters.len(), 2);
        let mut sizes: Vec<_> = clusters.iter().map(|c| c.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![4, 4]);
    }

    #[test]
    fn rejects_target_above_point_count() {
        let dataset = Dataset::new(vec![Point::new(vec![0.0])]).unwrap();
        let mut rock = Rock::new(RockSettings { radius: 1.0, number_clusters: 5, threshold: 0.5 });
        assert!(rock.process(&dataset).is_err());
    }
}
