//! Direct transcription: one defect constraint per step.
//!
//! For each step `k`, with `t = k·dt`:
//!
//! ```text
//! X[:,k+1] == RK4(f, X[:,k], U[:,k], t, dt)    (explicit ODE)
//! X[:,k+1] == f(t, X[:,k], U[:,k])             (discrete)
//! ```
//!
//! Each constraint touches two adjacent state columns and one input column.

use tether_core::{Problem, VariableMatrix};

use crate::{Config, Dynamics, DynamicsType, Error};

use super::next_state;

pub(crate) fn transcribe<D: Dynamics>(
    problem: &mut Problem,
    x: &VariableMatrix,
    u: &VariableMatrix,
    dynamics: &D,
    dynamics_type: DynamicsType,
    config: &Config,
) -> Result<(), Error> {
    for k in 0..config.num_steps() {
        let x_begin = x.column(k);
        let x_end = x.column(k + 1);
        let next = next_state(
            dynamics,
            dynamics_type,
            config.time(k),
            &x_begin,
            &u.column(k),
            config.dt(),
        )?;
        problem.subject_to(x_end.equals(next));
    }
    Ok(())
}
