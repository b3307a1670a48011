//! End-to-end flywheel velocity control.
//!
//! Dynamics `ẋ = −x + u` (velocity driven by voltage), 5 s horizon at 5 ms
//! steps, voltage limited to ±12 V, and a cost that drives the velocity
//! toward 10.

use std::convert::Infallible;

use tether_control::{Config, DynamicsType, FixedStepOcp, TranscriptionMethod};
use tether_core::{Variable, VariableMatrix};
use tether_solvers::{
    optimization::augmented_lagrangian::{self, Status},
    transient::rk4,
};

const DT: f64 = 0.005;
const N: usize = 1000;
const TARGET: f64 = 10.0;

fn flywheel(_t: f64, x: &VariableMatrix, u: &VariableMatrix) -> Result<VariableMatrix, Infallible> {
    Ok(-x + u)
}

fn build(method: TranscriptionMethod, num_steps: usize) -> FixedStepOcp {
    let config = Config::new(1, 1, DT, num_steps).unwrap();
    let mut ocp = FixedStepOcp::new(config, flywheel, DynamicsType::ExplicitOde, method).unwrap();

    ocp.constrain_initial_state(&VariableMatrix::from_column(&[0.0]))
        .unwrap();
    ocp.constrain_input_bounds(-12.0, 12.0);

    let cost = (0..=num_steps)
        .map(|k| (TARGET - ocp.x().get(0, k)).powi(2))
        .fold(Variable::constant(0.0), |acc, term| acc + term);
    ocp.minimize(cost);

    ocp
}

fn solver() -> augmented_lagrangian::Config {
    augmented_lagrangian::Config::new(1e-6, 2_000).unwrap()
}

/// Replays the optimized inputs through RK4 from rest.
fn replay(ocp: &FixedStepOcp, steps: usize) -> Vec<f64> {
    let u = ocp.u().values();
    let inputs: Vec<f64> = (0..steps).map(|k| u[[0, k]]).collect();
    let f = |_t: f64, x: &f64, u: &f64| Ok::<_, Infallible>(-x + u);
    rk4::propagate(f, 0.0, &inputs, 0.0, DT).unwrap()
}

#[test]
fn direct_transcription_respects_boundary_and_bounds() {
    let ocp = build(TranscriptionMethod::DirectTranscription, N);

    let solution = ocp.solve(&solver()).unwrap();

    assert_eq!(solution.status, Status::Converged, "{solution:?}");
    assert!(solution.infeasibility <= 1e-6, "{solution:?}");
    assert_eq!(ocp.x().value(0, 0), 0.0);
    for k in 0..=N {
        let u = ocp.u().value(0, k);
        assert!((-12.0..=12.0).contains(&u), "u[{k}] = {u}");
    }

    // Per-step defects stay tiny, so the optimized states follow the
    // optimized inputs over the whole horizon.
    let x = ocp.x().values();
    for (k, expected) in replay(&ocp, N).into_iter().enumerate() {
        assert!((x[[0, k]] - expected).abs() < 1e-3, "node {k}");
    }

    // Full voltage from rest, then holding the target.
    assert_eq!(ocp.u().value(0, 0), 12.0);
    assert!((ocp.x().value(0, N) - TARGET).abs() < 1e-2);
}

#[test]
fn direct_collocation_matches_direct_transcription() {
    let collocation = build(TranscriptionMethod::DirectCollocation, N);
    let transcription = build(TranscriptionMethod::DirectTranscription, N);

    let solution = collocation.solve(&solver()).unwrap();
    let reference = transcription.solve(&solver()).unwrap();

    assert_eq!(solution.status, Status::Converged, "{solution:?}");
    assert!(solution.infeasibility <= 1e-6, "{solution:?}");
    assert!((collocation.x().value(0, N) - TARGET).abs() < 1e-2);

    // Both discretizations are accurate far beyond the cost's sensitivity.
    let relative = (solution.objective - reference.objective).abs() / reference.objective;
    assert!(relative < 1e-3, "{solution:?} vs {reference:?}");
}

#[test]
fn single_shooting_creates_no_state_variables() {
    let ocp = build(TranscriptionMethod::SingleShooting, N);

    assert_eq!(ocp.x().decision_count(), 0);
    assert_eq!(ocp.u().cols(), N + 1);
    assert_eq!(ocp.u().decision_count(), N + 1);
    assert_eq!(ocp.problem().decision_variable_count(), N + 1);
}

#[test]
fn short_horizon_solution_is_dynamically_consistent() {
    let steps = 40;
    let ocp = build(TranscriptionMethod::DirectTranscription, steps);
    let config = augmented_lagrangian::Config::new(1e-8, 2_000).unwrap();

    let solution = ocp.solve(&config).unwrap();
    assert_eq!(solution.status, Status::Converged, "{solution:?}");
    assert!(solution.infeasibility <= 1e-8, "{solution:?}");

    // Replaying the optimized inputs reproduces the optimized states.
    let x = ocp.x().values();
    for (k, expected) in replay(&ocp, steps).into_iter().enumerate() {
        assert!((x[[0, k]] - expected).abs() < 1e-6, "node {k}");
    }

    // Far below the target for the whole horizon, so the input saturates.
    assert_eq!(ocp.u().value(0, 0), 12.0);
}
