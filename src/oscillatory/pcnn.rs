//! Pulse-Coupled Neural Network (PCNN).
//!
//! `pcnn.cpp`/`pcnn.h` in the retained source are truncated before the
//! per-step update body, so the exact recurrence cannot be grounded
//! literally; this module instead follows the textbook PCNN formulation
//! (Eckhorn 1990, as commonly parameterized in the pyclustering Python
//! layer this core backs), wired through the shared [`crate::topology`]
//! substrate the same way `sync_network` drives Kuramoto. Not a normative
//! part of the specification -- see `SPEC_FULL.md` §4.13.

use crate::error::{CoreError, Result};
use crate::topology::Topology;

#[derive(Debug, Clone, Copy)]
pub struct PcnnSettings {
    pub vf: f64,
    pub vl: f64,
    pub ve: f64,
    pub af: f64,
    pub al: f64,
    pub ae: f64,
    pub w: f64,
    pub m: f64,
    pub b: f64,
    pub fast_linking: bool,
}

impl Default for PcnnSettings {
    fn default() -> Self {
        PcnnSettings {
            vf: 1.0,
            vl: 1.0,
            ve: 20.0,
            af: 0.1,
            al: 0.1,
            ae: 0.2,
            w: 1.0,
            m: 1.0,
            b: 0.1,
            fast_linking: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Oscillator {
    feeding: f64,
    linking: f64,
    threshold: f64,
    output: f64,
}

#[derive(Debug, Clone)]
pub struct Pcnn {
    oscillators: Vec<Oscillator>,
    topology: Topology,
    settings: PcnnSettings,
}

impl Pcnn {
    pub fn new(n: usize, topology: Topology, settings: PcnnSettings) -> Result<Self> {
        if topology.len() != n {
            return Err(CoreError::InvalidTopology(format!(
                "topology has {} oscillators, network has {n}",
                topology.len()
            )));
        }
        Ok(Pcnn {
            oscillators: vec![Oscillator { threshold: 1.0, ..Default::default() }; n],
            topology,
            settings,
        })
    }

    pub fn size(&self) -> usize {
        self.oscillators.len()
    }

    pub fn outputs(&self) -> Vec<bool> {
        self.oscillators.iter().map(|o| o.output > 0.5).collect()
    }

    /// Advances one discrete step given the external stimulus `input`
    /// (one value per oscillator), returning each oscillator's spike state.
    pub fn simulate_step(&mut self, input: &[f64]) -> Result<Vec<bool>> {
        if input.len() != self.oscillators.len() {
            return Err(CoreError::DimensionMismatch { expected: self.oscillators.len(), actual: input.len() });
        }

        let n = self.oscillators.len();
        let previous_outputs: Vec<f64> = self.oscillators.iter().map(|o| o.output).collect();
        let s = &self.settings;

        let mut next = self.oscillators.clone();
        for i in 0..n {
            let link_input: f64 = self
                .topology
                .neighbors(i)
                .into_iter()
                .map(|j| s.w * previous_outputs[j])
                .sum();

            let o = &self.oscillators[i];
            let feeding = s.vf * ((-s.af) * o.feeding + input[i]);
            let linking = s.vl * ((-s.al) * o.linking + link_input);
            // `fast_linking` uses this step's linking value immediately
            // instead of waiting a step for it to settle.
            let effective_linking = if s.fast_linking { linking } else { o.linking };
            let internal = feeding * (1.0 + s.b * effective_linking);
            let output = if internal > o.threshold { 1.0 } else { 0.0 };
            let threshold = (-s.ae) * o.threshold + s.ve * output;

            next[i] = Oscillator { feeding, linking, threshold, output };
        }

        self.oscillators = next;
        Ok(self.outputs())
    }
}
