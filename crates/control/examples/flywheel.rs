//! Flywheel velocity control by direct transcription.
//!
//! Drives a flywheel (`ẋ = −x + u`) from rest toward 10 rad/s over 5 s with
//! the voltage limited to ±12 V, then prints the first state and input.
//!
//! Run with `cargo run --example flywheel -p tether-control`.

use std::convert::Infallible;

use tether_control::{Config, DynamicsType, FixedStepOcp, TranscriptionMethod};
use tether_core::{Variable, VariableMatrix};
use tether_solvers::optimization::augmented_lagrangian;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let total_time = 5.0_f64;
    let dt = 0.005;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_steps = (total_time / dt).round() as usize;

    let flywheel = |_t: f64, x: &VariableMatrix, u: &VariableMatrix| Ok::<_, Infallible>(-x + u);

    let config = Config::new(1, 1, dt, num_steps)?;
    let mut ocp = FixedStepOcp::new(
        config,
        flywheel,
        DynamicsType::ExplicitOde,
        TranscriptionMethod::DirectTranscription,
    )?;

    ocp.constrain_initial_state(&VariableMatrix::from_column(&[0.0]))?;
    ocp.constrain_input_bounds(-12.0, 12.0);

    let reference = 10.0;
    let cost = (0..=num_steps)
        .map(|k| (reference - ocp.x().get(0, k)).powi(2))
        .fold(Variable::constant(0.0), |acc, term| acc + term);
    ocp.minimize(cost);

    let solver = augmented_lagrangian::Config::new(1e-6, 2_000)?.with_diagnostics(true);
    let solution = ocp.solve(&solver)?;

    println!("status: {:?} after {:.2?}", solution.status, solution.elapsed);
    println!("x₀ = {}", ocp.x().value(0, 0));
    println!("u₀ = {}", ocp.u().value(0, 0));

    Ok(())
}
