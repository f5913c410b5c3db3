//! LEGION (Local Excitatory Globally Inhibitory Oscillator Network).
//!
//! `legion_network.h` declares the class shape but the retained source
//! carries no `.cpp`, so the per-oscillator dynamics are not literally
//! grounded; this module follows the standard Terman & Wang (1995)
//! relaxation-oscillator formulation (fast excitatory variable, slow
//! inhibitory variable, one shared global inhibitor), integrated through
//! the shared [`crate::ode`] core exactly as [`super::sync::SyncNetwork`]
//! drives Kuramoto phases. Not a normative part of the specification --
//! see `SPEC_FULL.md` §4.13.

use crate::error::{CoreError, Result};
use crate::ode::{self, DifferState};
use crate::topology::Topology;

#[derive(Debug, Clone, Copy)]
pub struct LegionSettings {
    /// Coupling strength between locally connected excitatory units.
    pub coupling: f64,
    /// Amplitude of the noise term on stimulated oscillators.
    pub noise_amplitude: f64,
    /// Global inhibitor decay rate.
    pub global_inhibitor_decay: f64,
    /// Global inhibitor coupling strength onto every oscillator.
    pub global_inhibitor_coupling: f64,
}

impl Default for LegionSettings {
    fn default() -> Self {
        LegionSettings {
            coupling: 0.5,
            noise_amplitude: 0.01,
            global_inhibitor_decay: 1.0,
            global_inhibitor_coupling: 6.0,
        }
    }
}

/// State layout per oscillator: excitatory, inhibitory, potential; plus one
/// trailing shared global-inhibitor value.
#[derive(Debug, Clone)]
pub struct Legion {
    state: DifferState,
    topology: Topology,
    settings: LegionSettings,
    stimulus: Vec<f64>,
}

const VARS_PER_OSCILLATOR: usize = 3;

impl Legion {
    pub fn new(topology: Topology, settings: LegionSettings, stimulus: Vec<f64>) -> Result<Self> {
        let n = topology.len();
        if stimulus.len() != n {
            return Err(CoreError::DimensionMismatch { expected: n, actual: stimulus.len() });
        }
        if n == 0 {
            return Err(CoreError::InvalidParameter("legion network requires at least one oscillator".into()));
        }

        let mut state = vec![0.0; n * VARS_PER_OSCILLATOR + 1];
        for i in 0..n {
            state[i * VARS_PER_OSCILLATOR] = rand_like(i) * 0.1; // excitatory
        }
        Ok(Legion { state: DifferState(state), topology, settings, stimulus })
    }

    pub fn size(&self) -> usize {
        self.topology.len()
    }

    pub fn excitatory(&self) -> Vec<f64> {
        (0..self.size()).map(|i| self.state.0[i * VARS_PER_OSCILLATOR]).collect()
    }

    fn rhs(&self, state: &DifferState) -> DifferState {
        let n = self.size();
        let s = &self.settings;
        let mut out = vec![0.0; state.len()];
        let global_inhibitor = state.0[n * VARS_PER_OSCILLATOR];

        for i in 0..n {
            let x = state.0[i * VARS_PER_OSCILLATOR];
            let y = state.0[i * VARS_PER_OSCILLATOR + 1];
            let potential = state.0[i * VARS_PER_OSCILLATOR + 2];

            let coupling: f64 = self
                .topology
                .neighbors(i)
                .into_iter()
                .map(|j| s.coupling * state.0[j * VARS_PER_OSCILLATOR])
                .sum();

            // Fast excitatory variable: FitzHugh-Nagumo-like cubic nullcline.
            let dx = 3.0 * x - x.powi(3) + 2.0 - y + self.stimulus[i] + coupling
                - s.global_inhibitor_coupling * global_inhibitor;
            // Slow inhibitory variable.
            let dy = 0.02 * (1.0 + (x * 5.0).tanh() - y) / potential.max(0.1);
            // Per-oscillator potential relaxes toward 1 when stimulated, else decays.
            let dp = if self.stimulus[i] > 0.0 { 0.02 * (1.0 - potential) } else { -0.02 * potential };

            out[i * VARS_PER_OSCILLATOR] = dx;
            out[i * VARS_PER_OSCILLATOR + 1] = dy;
            out[i * VARS_PER_OSCILLATOR + 2] = dp;
        }

        let active: f64 = (0..n)
            .filter(|&i| state.0[i * VARS_PER_OSCILLATOR] > 0.0)
            .count() as f64;
        out[n * VARS_PER_OSCILLATOR] = s.global_inhibitor_decay * (active - global_inhibitor);

        DifferState(out)
    }

    /// Advances the network by one interval `[t, t + dt]` using fixed-step RK4.
    pub fn simulate_step(&mut self, dt: f64, sub_steps: usize) -> Result<()> {
        let traj = ode::integrate_rk4(
            |_t, y| self.rhs(y),
            self.state.clone(),
            0.0,
            dt,
            sub_steps.max(1),
            false,
        )?;
        self.state = traj.last().unwrap().state.clone();
        Ok(())
    }
}

/// Small deterministic jitter for initial excitatory values, avoiding a
/// perfectly symmetric (and thus degenerate) start without pulling in a
/// full RNG dependency for a single non-normative initialization.
fn rand_like(i: usize) -> f64 {
    ((i as f64 * 12.9898).sin() * 43758.5453).fract()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_stimulus_of_wrong_length() {
        let topology = Topology::all_to_all(3);
        assert!(Legion::new(topology, LegionSettings::default(), vec![1.0, 1.0]).is_err());
    }

    #[test]
    fn simulate_step_keeps_state_finite() {
        let topology = Topology::grid_four(4, 2, 2).unwrap();
        let mut legion = Legion::new(topology, LegionSettings::default(), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        legion.simulate_step(0.5, 20).unwrap();
        for v in legion.excitatory() {
            assert!(v.is_finite());
        }
    }
}
