//! General-purpose ODE integration: fixed-step Runge-Kutta 4 and adaptive
//! Runge-Kutta-Fehlberg 4(5).
//!
//! Grounded directly in `differential.h`'s `runge_kutta_4` and
//! `runge_kutta_fehlberg_45`, which is the authoritative copy of the
//! Fehlberg tableau constants in the corpus (the older duplicate in
//! `support.cpp`, used only by the scalar phase-update call sites, carries
//! different `hmin`/`hmax`/iteration-cap constants and an inverted
//! termination check; this module follows `differential.h`'s values since
//! they are the ones the specification states explicitly).
//!
//! The original threads extra arguments for the right-hand side through a
//! `void*` vector (`extra_argument`). Here the right-hand side is simply an
//! `FnMut(f64, &DifferState) -> DifferState` closure, so whatever context a
//! caller needs (oscillator index, network reference) is captured directly
//! instead of marshaled through an untyped vector.

use crate::error::{CoreError, Result};

/// A fixed-length vector of state variables with the small amount of algebra
/// the integrators need. No two states participating in an operation may
/// differ in length.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferState(pub Vec<f64>);

impl DifferState {
    pub fn zeros(n: usize) -> Self {
        DifferState(vec![0.0; n])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn check(&self, other: &DifferState) -> Result<()> {
        if self.0.len() != other.0.len() {
            return Err(CoreError::DimensionMismatch {
                expected: self.0.len(),
                actual: other.0.len(),
            });
        }
        Ok(())
    }

    pub fn add_assign(&mut self, other: &DifferState) -> Result<()> {
        self.check(other)?;
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a += b;
        }
        Ok(())
    }

    pub fn sub_assign(&mut self, other: &DifferState) -> Result<()> {
        self.check(other)?;
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a -= b;
        }
        Ok(())
    }

    pub fn scale(&self, factor: f64) -> DifferState {
        DifferState(self.0.iter().map(|x| x * factor).collect())
    }

    pub fn added(&self, other: &DifferState) -> DifferState {
        DifferState(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }

    pub fn infinity_norm_diff(&self, other: &DifferState) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

/// One recorded `(time, state)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    pub time: f64,
    pub state: DifferState,
}

/// Result of an adaptive integration: the trajectory plus whether the
/// iteration cap was hit before convergence (advisory, non-fatal).
#[derive(Debug, Clone)]
pub struct IntegrationResult {
    pub trajectory: Vec<TrajectoryPoint>,
    pub stalled: bool,
}

/// Fixed-step classical RK4 over `[t_start, t_end]` in `steps` equal
/// intervals. When `collect` is false only the final state is returned.
pub fn integrate_rk4<F>(
    mut f: F,
    y0: DifferState,
    t_start: f64,
    t_end: f64,
    steps: usize,
    collect: bool,
) -> Result<Vec<TrajectoryPoint>>
where
    F: FnMut(f64, &DifferState) -> DifferState,
{
    if steps == 0 {
        return Err(CoreError::InvalidParameter("rk4 step count must be positive".into()));
    }

    let h = (t_end - t_start) / steps as f64;
    let mut t = t_start;
    let mut y = y0;
    let mut trajectory = Vec::new();
    if collect {
        trajectory.push(TrajectoryPoint { time: t, state: y.clone() });
    }

    for _ in 0..steps {
        let k1 = f(t, &y);
        let y2 = y.added(&k1.scale(h / 2.0));
        let k2 = f(t + h / 2.0, &y2);
        let y3 = y.added(&k2.scale(h / 2.0));
        let k3 = f(t + h / 2.0, &y3);
        let y4 = y.added(&k3.scale(h));
        let k4 = f(t + h, &y4);

        let sum = k1.added(&k2.scale(2.0)).added(&k3.scale(2.0)).added(&k4);
        y = y.added(&sum.scale(h / 6.0));
        t += h;

        if collect {
            trajectory.push(TrajectoryPoint { time: t, state: y.clone() });
        }
    }

    if !collect {
        trajectory.push(TrajectoryPoint { time: t, state: y });
    }

    Ok(trajectory)
}

// Fehlberg 4(5) Butcher tableau, matching `differential.h`'s `factor` namespace exactly.
mod factor {
    pub const A2: f64 = 1.0 / 4.0;
    pub const A3: f64 = 3.0 / 8.0;
    pub const A4: f64 = 12.0 / 13.0;
    pub const A5: f64 = 1.0;
    pub const A6: f64 = 1.0 / 2.0;

    pub const B2: f64 = 1.0 / 4.0;
    pub const B3: f64 = 3.0 / 32.0;
    pub const B4: f64 = 1932.0 / 2197.0;
    pub const B5: f64 = 439.0 / 216.0;
    pub const B6: f64 = -8.0 / 27.0;

    pub const C3: f64 = 9.0 / 32.0;
    pub const C4: f64 = -7200.0 / 2197.0;
    pub const C5: f64 = -8.0;
    pub const C6: f64 = 2.0;

    pub const D4: f64 = 7296.0 / 2197.0;
    pub const D5: f64 = 3680.0 / 513.0;
    pub const D6: f64 = -3544.0 / 2565.0;

    pub const E5: f64 = -845.0 / 4104.0;
    pub const E6: f64 = 1859.0 / 4104.0;

    pub const F6: f64 = -11.0 / 40.0;

    // 5th order solution weights.
    pub const N1: f64 = 16.0 / 135.0;
    pub const N3: f64 = 6656.0 / 12825.0;
    pub const N4: f64 = 28561.0 / 56430.0;
    pub const N5: f64 = -9.0 / 50.0;
    pub const N6: f64 = 2.0 / 55.0;

    // 4th order solution weights (for error estimation).
    pub const R1: f64 = 25.0 / 216.0;
    pub const R3: f64 = 1408.0 / 2565.0;
    pub const R4: f64 = 2197.0 / 4104.0;
    pub const R5: f64 = -1.0 / 5.0;
    pub const R6: f64 = 0.0;
}

const MAX_ITERATIONS: usize = 300;

/// Adaptive RKF45 over `[t_start, t_end]`. `tolerance` bounds the per-step
/// infinity-norm difference between the embedded 4th- and 5th-order
/// estimates. Initial step `h = (t_end - t_start) / 10`, `h_min = h / 1000`,
/// `h_max = 1000 * h`, matching `differential.h` (and, transitively, the
/// numeric values stated in the specification).
pub fn integrate_rkf45<F>(
    mut f: F,
    y0: DifferState,
    t_start: f64,
    t_end: f64,
    tolerance: f64,
    collect: bool,
) -> Result<IntegrationResult>
where
    F: FnMut(f64, &DifferState) -> DifferState,
{
    if tolerance <= 0.0 {
        return Err(CoreError::InvalidParameter("rkf45 tolerance must be positive".into()));
    }
    if t_end <= t_start {
        return Err(CoreError::InvalidParameter("rkf45 requires t_end > t_start".into()));
    }

    let mut h = (t_end - t_start) / 10.0;
    let h_min = h / 1000.0;
    let h_max = 1000.0 * h;

    let mut t = t_start;
    let mut y = y0;
    let mut trajectory = Vec::new();
    if collect {
        trajectory.push(TrajectoryPoint { time: t, state: y.clone() });
    }

    let mut stalled = false;
    let mut iterations = 0;

    while t < t_end {
        if iterations >= MAX_ITERATIONS {
            stalled = true;
            break;
        }

        if t + h > t_end {
            h = t_end - t;
        }

        let k1 = f(t, &y).scale(h);
        let k2 = f(t + factor::A2 * h, &y.added(&k1.scale(factor::B2))).scale(h);
        let k3 = f(
            t + factor::A3 * h,
            &y.added(&k1.scale(factor::B3)).added(&k2.scale(factor::C3)),
        )
        .scale(h);
        let k4 = f(
            t + factor::A4 * h,
            &y.added(&k1.scale(factor::B4))
                .added(&k2.scale(factor::C4))
                .added(&k3.scale(factor::D4)),
        )
        .scale(h);
        let k5 = f(
            t + factor::A5 * h,
            &y.added(&k1.scale(factor::B5))
                .added(&k2.scale(factor::C5))
                .added(&k3.scale(factor::D5))
                .added(&k4.scale(factor::E5)),
        )
        .scale(h);
        let k6 = f(
            t + factor::A6 * h,
            &y.added(&k1.scale(factor::B6))
                .added(&k2.scale(factor::C6))
                .added(&k3.scale(factor::D6))
                .added(&k4.scale(factor::E6))
                .added(&k5.scale(factor::F6)),
        )
        .scale(h);

        let y5 = y
            .added(&k1.scale(factor::N1))
            .added(&k3.scale(factor::N3))
            .added(&k4.scale(factor::N4))
            .added(&k5.scale(factor::N5))
            .added(&k6.scale(factor::N6));
        let y4 = y
            .added(&k1.scale(factor::R1))
            .added(&k3.scale(factor::R3))
            .added(&k4.scale(factor::R4))
            .added(&k5.scale(factor::R5))
            .added(&k6.scale(factor::R6));

        let err = y5.infinity_norm_diff(&y4);

        if err < tolerance || h < 2.0 * h_min {
            t += h;
            y = y5;
            iterations += 1;
            if collect {
                trajectory.push(TrajectoryPoint { time: t, state: y.clone() });
            }

            let s = 0.84 * (tolerance * h / err.max(f64::EPSILON)).powf(0.25);
            if s > 1.5 && h * 2.0 < h_max {
                h *= 2.0;
            }
        } else {
            h /= 2.0;
            continue;
        }
    }

    if !collect {
        trajectory = vec![TrajectoryPoint { time: t, state: y }];
    }

    Ok(IntegrationResult { trajectory, stalled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // y' = y, y(0) = 1 has the exact solution y(t) = e^t.
    fn rhs(_t: f64, y: &DifferState) -> DifferState {
        y.clone()
    }

    #[test]
    fn rk4_matches_exponential() {
        let traj = integrate_rk4(rhs, DifferState(vec![1.0]), 0.0, 1.0, 1000, false).unwrap();
        assert_relative_eq!(traj.last().unwrap().state.0[0], std::f64::consts::E, epsilon = 1e-4);
    }

    #[test]
    fn rkf45_matches_exponential() {
        let result = integrate_rkf45(rhs, DifferState(vec![1.0]), 0.0, 1.0, 1e-5, false).unwrap();
        assert_relative_eq!(
            result.trajectory.last().unwrap().state.0[0],
            std::f64::consts::E,
            epsilon = 1e-5
        );
        assert!(!result.stalled);
    }

    #[test]
    fn rk4_rejects_zero_steps() {
        assert!(integrate_rk4(rhs, DifferState(vec![1.0]), 0.0, 1.0, 0, false).is_err());
    }

    #[test]
    fn state_algebra_rejects_mismatched_length() {
        let mut a = DifferState(vec![1.0, 2.0]);
        let b = DifferState(vec![1.0]);
        assert!(a.add_assign(&b).is_err());
    }
}
