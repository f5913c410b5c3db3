//! HSyncNet: hierarchical SyncNet that grows connectivity radius until a
//! target cluster count is reached.
//!
//! Grounded in `hsyncnet.cpp`: starts from `number_neighbors = 3` and the
//! average distance to each point's 3 nearest neighbors, rebuilds
//! connections and resynchronizes each round, and widens either the
//! neighbor count or (once neighbor count reaches the dataset size) the
//! radius itself by 10%, until the ensemble count falls to the target.

use rand::Rng;

use crate::error::{CoreError, Result};
use crate::geometry::{euclidean_distance, Dataset};
use crate::oscillatory::sync::{InitialType, SolverType, SyncDynamic, SyncNetworkState};
use crate::oscillatory::syncnet::{SyncNet, SyncNetSettings};

/// Mean distance from every point to its `m` nearest other points,
/// matching `average_neighbor_distance` in `support.cpp`.
fn average_neighbor_distance(dataset: &Dataset, m: usize) -> f64 {
    let n = dataset.len();
    let mut total = 0.0;
    for i in 0..n {
        let mut dists: Vec<f64> = (0..n)
            .filter(|&j| j != i)
            .map(|j| euclidean_distance(dataset.get(i), dataset.get(j)))
            .collect();
        dists.sort_by(|a, b| a.partial_cmp(b).unwrap());
        total += dists.iter().take(m).sum::<f64>();
    }
    total / (m as f64 * n as f64)
}

pub struct HSyncNetResult {
    pub clusters: Vec<Vec<usize>>,
    pub dynamic: SyncDynamic,
}

/// Runs HSyncNet to convergence on `dataset`, targeting `number_clusters`.
pub fn process<R: Rng>(
    dataset: &Dataset,
    number_clusters: usize,
    solver: SolverType,
    collect: bool,
    rng: &mut R,
) -> Result<HSyncNetResult> {
    let n = dataset.len();
    if number_clusters == 0 || number_clusters > n {
        return Err(CoreError::InvalidParameter(format!(
            "hsyncnet target cluster count {number_clusters} must be in 1..={n}"
        )));
    }

    let mut number_neighbors = 3usize.min(n.saturating_sub(1)).max(1);
    let mut radius = average_neighbor_distance(dataset, number_neighbors);

    let mut accumulated = SyncDynamic::default();
    let mut current_time = 0.0;
    let mut current_clusters = n;
    let mut last_ensembles: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();

    loop {
        let settings = SyncNetSettings { radius, enable_conn_weight: false, initial: InitialType::RandomGaussian };
        let mut net = SyncNet::new(dataset, settings, rng)?;
        let round = net.process(0.998, solver, collect)?;

        if collect {
            for state in &round.states {
                accumulated.states.push(SyncNetworkState {
                    time: state.time + current_time,
                    phases: state.phases.clone(),
                });
            }
        }
        current_time += round.states.last().map_or(0.0, |s| s.time);
        accumulated.stalled |= round.stalled;

        let ensembles = net.clusters(&round, 0.05);
        current_clusters = ensembles.len();
        last_ensembles = ensembles;

        if current_clusters <= number_clusters {
            break;
        }

        if number_neighbors >= n {
            radius += radius * 0.1;
        } else {
            number_neighbors += 1;
            radius = average_neighbor_distance(dataset, number_neighbors);
        }
    }

    if !collect {
        if let Some(last) = accumulated.states.last().cloned() {
            accumulated.states = vec![last];
        }
    }

    Ok(HSyncNetResult { clusters: last_ensembles, dynamic: accumulated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use rand::SeedableRng;

    #[test]
    fn converges_to_requested_cluster_count() {
        let points = vec![
            Point::new(vec![0.0, 0.0]),
            Point::new(vec![0.2, 0.1]),
            Point::new(vec![0.1, 0.2]),
            Point::new(vec![5.0, 5.0]),
            Point::new(vec![5.2, 5.1]),
            Point::new(vec![5.1, 5.2]),
        ];
        let dataset = Dataset::new(points).unwrap();
        let mut rng = rand_pcg::Pcg64::seed_from_u64(3);
        let result = process(&dataset, 2, SolverType::Rk4, false, &mut rng).unwrap();
        assert!(result.clusters.len() <= 2);
    }
}
