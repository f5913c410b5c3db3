//! SyncNet: spatial clustering via Kuramoto synchronization.
//!
//! Grounded in `syncnet.cpp`. One oscillator per input point; oscillators
//! within `radius` of one another are linked on a `Dynamic` topology, and
//! synchronization partitions the points into clusters.
//!
//! Two points of deliberate behavior preserved from the source, both
//! because the specification's own Open Questions call for preserving the
//! observed behavior rather than "fixing" it:
//! - The per-edge weight normalization uses a `minimum_distance` that the
//!   source never actually updates away from its initial value (a
//!   copy-paste bug: the second `if` that should refine the minimum checks
//!   `maximum_distance` again). The practical effect is that the
//!   subtractor is the initial `minimum_distance` (`0.0`) and the divisor is
//!   simply the observed maximum squared distance.
//! - The phase update normalizes by the oscillator's own neighbor count,
//!   not network size, unlike the base [`super::sync::SyncNetwork`].

use rand::Rng;

use crate::error::{CoreError, Result};
use crate::geometry::{euclidean_distance_squared, Dataset};
use crate::ode::{self, DifferState};
use crate::oscillatory::sync::{
    allocate_sync_ensembles, phase_normalization, sync_local_order, InitialType, SolverType,
    SyncDynamic, SyncNetworkState,
};
use crate::topology::Topology;

#[derive(Debug, Clone, Copy)]
pub struct SyncNetSettings {
    pub radius: f64,
    pub enable_conn_weight: bool,
    pub initial: InitialType,
}

impl Default for SyncNetSettings {
    fn default() -> Self {
        SyncNetSettings {
            radius: 1.0,
            enable_conn_weight: false,
            initial: InitialType::RandomGaussian,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncNet {
    phases: Vec<f64>,
    topology: Topology,
    weights: Option<Vec<Vec<f64>>>,
}

impl SyncNet {
    pub fn new<R: Rng>(dataset: &Dataset, settings: SyncNetSettings, rng: &mut R) -> Result<Self> {
        if dataset.is_empty() {
            return Err(CoreError::InvalidParameter("syncnet requires a non-empty dataset".into()));
        }
        if settings.radius < 0.0 {
            return Err(CoreError::InvalidParameter("syncnet radius must be non-negative".into()));
        }

        let n = dataset.len();
        let phases = match settings.initial {
            InitialType::RandomGaussian => {
                (0..n).map(|_| rng.gen_range(0.0..std::f64::consts::TAU)).collect()
            }
            InitialType::Equipartition => {
                (0..n).map(|i| std::f64::consts::PI * i as f64 / n as f64).collect()
            }
        };

        let (topology, weights) = create_connections(dataset, settings.radius, settings.enable_conn_weight);

        Ok(SyncNet { phases, topology, weights })
    }

    pub fn size(&self) -> usize {
        self.phases.len()
    }

    fn edge_weight(&self, i: usize, j: usize) -> f64 {
        match &self.weights {
            Some(w) => w[i][j],
            None => 1.0,
        }
    }

    fn derivative(&self, i: usize, phases: &[f64]) -> f64 {
        let neighbors = self.topology.neighbors(i);
        if neighbors.is_empty() {
            return 0.0;
        }
        let sum: f64 = neighbors
            .iter()
            .map(|&j| self.edge_weight(i, j) * (phases[j] - phases[i]).sin())
            .sum();
        sum / neighbors.len() as f64
    }

    fn advance(&mut self, dt: f64, solver: SolverType, step_int: usize) -> Result<bool> {
        let n = self.phases.len();
        let mut next = vec![0.0; n];
        let mut stalled = false;

        for i in 0..n {
            next[i] = match solver {
                SolverType::Fast => phase_normalization(self.phases[i] + dt * self.derivative(i, &self.phases)),
                SolverType::Rk4 => {
                    let frozen = self.phases.clone();
                    let traj = ode::integrate_rk4(
                        |_t, y| DifferState(vec![self.derivative_with(i, &frozen, y.0[0])]),
                        DifferState(vec![self.phases[i]]),
                        0.0,
                        dt,
                        step_int.max(1),
                        false,
                    )?;
                    phase_normalization(traj.last().unwrap().state.0[0])
                }
                SolverType::Rkf45 => {
                    let frozen = self.phases.clone();
                    let result = ode::integrate_rkf45(
                        |_t, y| DifferState(vec![self.derivative_with(i, &frozen, y.0[0])]),
                        DifferState(vec![self.phases[i]]),
                        0.0,
                        dt,
                        1e-6,
                        false,
                    )?;
                    stalled |= result.stalled;
                    phase_normalization(result.trajectory.last().unwrap().state.0[0])
                }
            };
        }
        self.phases = next;
        Ok(stalled)
    }

    fn derivative_with(&self, i: usize, phases: &[f64], own_phase: f64) -> f64 {
        let neighbors = self.topology.neighbors(i);
        if neighbors.is_empty() {
            return 0.0;
        }
        let sum: f64 = neighbors
            .iter()
            .map(|&j| self.edge_weight(i, j) * (phases[j] - own_phase).sin())
            .sum();
        sum / neighbors.len() as f64
    }

    /// Runs `simulate_dynamic` until `order_threshold` is reached (default
    /// integration step `0.1`, matching `syncnet::process`), then returns
    /// the trajectory.
    pub fn process(&mut self, order_threshold: f64, solver: SolverType, collect: bool) -> Result<SyncDynamic> {
        let step = 0.1;
        let step_int = 10;
        let stall_threshold = 1e-6;

        let mut dynamic = SyncDynamic::default();
        let mut t = 0.0;
        if collect {
            dynamic.states.push(SyncNetworkState { time: t, phases: self.phases.clone() });
        }

        let mut previous_order = sync_local_order(&self.phases, &self.topology);
        loop {
            let order = sync_local_order(&self.phases, &self.topology);
            if order >= order_threshold {
                break;
            }

            let stalled = self.advance(step, solver, step_int)?;
            dynamic.stalled |= stalled;
            t += step;
            if collect {
                dynamic.states.push(SyncNetworkState { time: t, phases: self.phases.clone() });
            }

            let new_order = sync_local_order(&self.phases, &self.topology);
            if (new_order - previous_order).abs() < stall_threshold {
                dynamic.stalled = true;
                break;
            }
            previous_order = new_order;
        }

        if !collect {
            dynamic.states.push(SyncNetworkState { time: t, phases: self.phases.clone() });
        }
        Ok(dynamic)
    }

    /// Extracts clusters as the sync ensembles of the final recorded phase
    /// state.
    pub fn clusters(&self, dynamic: &SyncDynamic, tolerance: f64) -> Vec<Vec<usize>> {
        match dynamic.final_phases() {
            Some(phases) => allocate_sync_ensembles(phases, tolerance),
            None => allocate_sync_ensembles(&self.phases, tolerance),
        }
    }
}

fn create_connections(dataset: &Dataset, radius: f64, enable_conn_weight: bool) -> (Topology, Option<Vec<Vec<f64>>>) {
    let n = dataset.len();
    let mut topology = Topology::dynamic(n);
    let radius_sq = radius * radius;

    let mut distances_sq = vec![vec![0.0; n]; n];
    let mut maximum_distance = 0.0_f64;

    for i in 0..n {
        for j in (i + 1)..n {
            let d_sq = euclidean_distance_squared(dataset.get(i), dataset.get(j));
            distances_sq[i][j] = d_sq;
            distances_sq[j][i] = d_sq;

            if d_sq <= radius_sq {
                topology.set_connection(i, j);
            }
            if d_sq > maximum_distance {
                maximum_distance = d_sq;
            }
        }
    }

    let weights = if enable_conn_weight {
        // `minimum_distance` is preserved at its initial value (0.0): the
        // source's second comparison never refines it. See module docs.
        let minimum_distance = 0.0_f64;
        let span = (maximum_distance - minimum_distance).max(f64::EPSILON);
        let mut w = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    w[i][j] = (distances_sq[i][j] - minimum_distance) / span;
                }
            }
        }
        Some(w)
    } else {
        None
    };

    (topology, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use rand::SeedableRng;

    #[test]
    fn six_point_scenario_separates_into_two_ensembles() {
        let points = vec![
            Point::new(vec![0.1, 0.1]),
            Point::new(vec![0.2, 0.1]),
            Point::new(vec![0.0, 0.0]),
            Point::new(vec![2.2, 2.1]),
            Point::new(vec![2.3, 2.0]),
            Point::new(vec![2.1, 2.4]),
        ];
        let dataset = Dataset::new(points).unwrap();
        let mut rng = rand_pcg::Pcg64::seed_from_u64(7);
        let settings = SyncNetSettings { radius: 0.5, enable_conn_weight: false, initial: InitialType::RandomGaussian };
        let mut net = SyncNet::new(&dataset, settings, &mut rng).unwrap();
        let dynamic = net.process(0.995, SolverType::Rk4, false).unwrap();
        let ensembles = net.clusters(&dynamic, 0.1);
        assert_eq!(ensembles.len(), 2);
        let mut sizes: Vec<_> = ensembles.iter().map(|e| e.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 3]);
    }
}
