//! Interactive visualizations of a flywheel velocity controller.
//!
//! Both modes build the same optimal control problem: drive a flywheel
//! (`ẋ = −x + u`) from rest toward 10 rad/s over 5 s with the voltage limited
//! to ±12 V.
//!
//! # Usage
//!
//! ```text
//! cargo run --example plot --features plot -- convergence
//! cargo run --example plot --features plot -- trajectory
//! cargo run --example plot --features plot -- trajectory shooting
//! ```
//!
//! # Modes
//!
//! - **convergence**: objective, infeasibility, and stationarity per outer
//!   iteration on a log scale.
//! - **trajectory \[method\]**: optimized velocity and voltage over time. The
//!   method is `transcription` (default), `collocation`, or `shooting`.

use std::{convert::Infallible, error::Error};

use tether_control::{Config, DynamicsType, FixedStepOcp, TranscriptionMethod};
use tether_core::{Variable, VariableMatrix};
use tether_observers::{PlotObserver, ShowConfig};
use tether_solvers::optimization::augmented_lagrangian;

const DT: f64 = 0.02;
const STEPS: usize = 250;

fn main() -> Result<(), Box<dyn Error>> {
    let mode = std::env::args().nth(1).unwrap_or_else(|| "convergence".into());
    match mode.as_str() {
        "convergence" => convergence(),
        "trajectory" => {
            let method = match std::env::args().nth(2).as_deref() {
                None | Some("transcription") => TranscriptionMethod::DirectTranscription,
                Some("collocation") => TranscriptionMethod::DirectCollocation,
                Some("shooting") => TranscriptionMethod::SingleShooting,
                Some(other) => {
                    eprintln!("Unknown method: {other}");
                    std::process::exit(1);
                }
            };
            trajectory(method)
        }
        other => {
            eprintln!("Unknown mode: {other}");
            eprintln!("Usage: plot [convergence|trajectory [transcription|collocation|shooting]]");
            std::process::exit(1);
        }
    }
}

fn flywheel(method: TranscriptionMethod) -> Result<FixedStepOcp, Box<dyn Error>> {
    let dynamics = |_t: f64, x: &VariableMatrix, u: &VariableMatrix| Ok::<_, Infallible>(-x + u);

    let config = Config::new(1, 1, DT, STEPS)?;
    let mut ocp = FixedStepOcp::new(config, dynamics, DynamicsType::ExplicitOde, method)?;

    ocp.constrain_initial_state(&VariableMatrix::from_column(&[0.0]))?;
    ocp.constrain_input_bounds(-12.0, 12.0);

    let cost = (0..=STEPS)
        .map(|k| (10.0 - ocp.x().get(0, k)).powi(2))
        .fold(Variable::constant(0.0), |acc, term| acc + term);
    ocp.minimize(cost);

    Ok(ocp)
}

fn solver() -> Result<augmented_lagrangian::Config, Box<dyn Error>> {
    Ok(augmented_lagrangian::Config::new(1e-6, 5_000)?)
}

/// Plot solver progress, one point per outer iteration.
fn convergence() -> Result<(), Box<dyn Error>> {
    let ocp = flywheel(TranscriptionMethod::DirectTranscription)?;

    let mut obs = PlotObserver::<3>::new(["Objective", "Infeasibility", "Stationarity"]);
    let solution = ocp.solve_observed(&solver()?, &mut obs)?;

    obs.show(
        ShowConfig::new()
            .title(&format!(
                "Flywheel: {:?} after {} inner iterations",
                solution.status, solution.iters
            ))
            .legend()
            .log_y(),
    )?;

    Ok(())
}

/// Plot the optimized velocity and voltage.
fn trajectory(method: TranscriptionMethod) -> Result<(), Box<dyn Error>> {
    let ocp = flywheel(method)?;
    ocp.solve(&solver()?)?;

    let mut obs = PlotObserver::<2>::new(["Velocity [rad/s]", "Voltage [V]"]);
    obs.record_trajectory(0, ocp.x(), 0, DT);
    obs.record_trajectory(1, ocp.u(), 0, DT);

    obs.show(
        ShowConfig::new()
            .title(&format!("Flywheel: {method:?}"))
            .legend(),
    )?;

    Ok(())
}
