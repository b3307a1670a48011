//! Classical fourth-order Runge-Kutta.
//!
//! Advances `ẋ = f(t, x, u)` by one fixed step `h`:
//!
//! ```text
//! k1 = f(t,       x,            u)
//! k2 = f(t + h/2, x + h/2 · k1, u)
//! k3 = f(t + h/2, x + h/2 · k2, u)
//! k4 = f(t + h,   x + h · k3,   u)
//! x_next = x + h/6 · (k1 + 2·k2 + 2·k3 + k4)
//! ```
//!
//! The input `u` is held constant across all four stages (zero-order hold).
//! There is no error control: the step is exactly `h`.
//!
//! # Example
//!
//! ```
//! use tether_solvers::transient::rk4;
//!
//! // ẋ = -x + u
//! let f = |_t: f64, x: &f64, u: &f64| Ok::<_, std::convert::Infallible>(-x + u);
//! let next = rk4::step(f, &0.0, &1.0, 0.0, 0.1).unwrap();
//! assert!((next - (1.0 - (-0.1_f64).exp())).abs() < 1e-6);
//! ```

use std::ops::{Add, Mul};

use tether_core::{DerivativeOf, StepIntegrable};

/// Advances `x` by one RK4 step of size `h` starting at time `t`.
///
/// `f` is called exactly four times, always with the same `u`.
///
/// # Errors
///
/// Returns the first error produced by `f`, unmodified.
pub fn step<S, U, F, E>(mut f: F, x: &S, u: &U, t: f64, h: f64) -> Result<S, E>
where
    S: StepIntegrable<f64>,
    DerivativeOf<S, f64>: Clone
        + Add<Output = DerivativeOf<S, f64>>
        + Mul<f64, Output = DerivativeOf<S, f64>>,
    F: FnMut(f64, &S, &U) -> Result<DerivativeOf<S, f64>, E>,
{
    let half = h / 2.0;

    let k1 = f(t, x, u)?;
    let k2 = f(t + half, &x.step(k1.clone(), half), u)?;
    let k3 = f(t + half, &x.step(k2.clone(), half), u)?;
    let k4 = f(t + h, &x.step(k3.clone(), h), u)?;

    Ok(x.step(k1 + k2 * 2.0 + k3 * 2.0 + k4, h / 6.0))
}

/// Integrates from `x0` through one RK4 step per input.
///
/// Step `k` starts at `t0 + k·h` and holds `inputs[k]`. The returned
/// trajectory has `inputs.len() + 1` states, starting with `x0`.
///
/// # Errors
///
/// Returns the first error produced by `f`, unmodified.
pub fn propagate<S, U, F, E>(mut f: F, x0: S, inputs: &[U], t0: f64, h: f64) -> Result<Vec<S>, E>
where
    S: StepIntegrable<f64>,
    DerivativeOf<S, f64>: Clone
        + Add<Output = DerivativeOf<S, f64>>
        + Mul<f64, Output = DerivativeOf<S, f64>>,
    F: FnMut(f64, &S, &U) -> Result<DerivativeOf<S, f64>, E>,
{
    let mut trajectory = Vec::with_capacity(inputs.len() + 1);
    trajectory.push(x0);

    for (k, u) in inputs.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let t = t0 + k as f64 * h;
        let next = step(&mut f, &trajectory[k], u, t, h)?;
        trajectory.push(next);
    }

    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use ndarray::array;
    use tether_core::{Variable, VariableMatrix};
    use thiserror::Error;

    fn decay(_t: f64, x: &f64, _u: &()) -> Result<f64, Infallible> {
        Ok(-x)
    }

    #[test]
    fn matches_fourth_order_taylor_expansion() {
        let x0 = 2.5;
        for h in [0.001, 0.01, 0.1] {
            let next = step(decay, &x0, &(), 0.0, h).unwrap();
            let taylor = x0 * (1.0 - h + h.powi(2) / 2.0 - h.powi(3) / 6.0 + h.powi(4) / 24.0);
            assert_relative_eq!(next, taylor, max_relative = 1e-14);
        }
    }

    #[test]
    fn stages_sample_expected_times_and_hold_input() {
        let mut calls = Vec::new();
        let f = |t: f64, _x: &f64, u: &f64| {
            calls.push((t, *u));
            Ok::<_, Infallible>(*u)
        };

        let next = step(f, &1.0, &3.0, 2.0, 0.5).unwrap();

        assert_relative_eq!(next, 2.5);
        assert_eq!(calls, vec![(2.0, 3.0), (2.25, 3.0), (2.25, 3.0), (2.5, 3.0)]);
    }

    #[test]
    fn symbolic_step_matches_numeric_step() {
        // ẋ = -x² + u
        let numeric = |_t: f64, x: &f64, u: &f64| Ok::<_, Infallible>(-x * x + u);
        let symbolic = |_t: f64, x: &VariableMatrix, u: &VariableMatrix| {
            Ok::<_, Infallible>(x.map(|xi| -xi.powi(2)) + u)
        };

        let expected = step(numeric, &0.3, &0.7, 0.0, 0.05).unwrap();

        let x_sym = VariableMatrix::parameters(1, 1);
        let u_sym = VariableMatrix::parameters(1, 1);
        let next = step(symbolic, &x_sym, &u_sym, 0.0, 0.05).unwrap();

        x_sym.set_values(&array![[0.3]]).unwrap();
        u_sym.set_values(&array![[0.7]]).unwrap();

        assert_relative_eq!(next.value(0, 0), expected, epsilon = 1e-15);
    }

    #[test]
    fn propagate_chains_steps() {
        let f = |_t: f64, x: &f64, u: &f64| Ok::<_, Infallible>(-x + u);
        let inputs = [1.0, 1.0, 0.0];

        let trajectory = propagate(f, 0.0, &inputs, 0.0, 0.1).unwrap();

        assert_eq!(trajectory.len(), 4);
        let x1 = step(f, &0.0, &1.0, 0.0, 0.1).unwrap();
        let x2 = step(f, &x1, &1.0, 0.1, 0.1).unwrap();
        let x3 = step(f, &x2, &0.0, 0.2, 0.1).unwrap();
        assert_eq!(trajectory, vec![0.0, x1, x2, x3]);
    }

    #[derive(Debug, Error, PartialEq)]
    #[error("state left the domain at t = {0}")]
    struct OutOfDomain(f64);

    #[test]
    fn errors_propagate_unmodified() {
        let f = |t: f64, x: &f64, _u: &()| {
            if *x > 1.0 {
                Err(OutOfDomain(t))
            } else {
                Ok(10.0)
            }
        };

        // k1 is fine, x + h/2·k1 = 1.5 fails in k2.
        assert_eq!(step(f, &1.0, &(), 0.0, 0.1), Err(OutOfDomain(0.05)));
    }

    #[test]
    fn symbolic_state_depends_on_leaves() {
        let f = |_t: f64, x: &VariableMatrix, _u: &()| Ok::<_, Infallible>(-x);
        let x = VariableMatrix::from(Variable::parameter(1.0));

        let next = step(f, &x, &(), 0.0, 0.1).unwrap();
        x.get(0, 0).set_value(2.0).unwrap();

        let h: f64 = 0.1;
        let factor = 1.0 - h + h.powi(2) / 2.0 - h.powi(3) / 6.0 + h.powi(4) / 24.0;
        assert_relative_eq!(next.value(0, 0), 2.0 * factor, max_relative = 1e-14);
    }
}
