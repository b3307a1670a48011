//! Direct collocation with a Hermite–Simpson midpoint defect.
//!
//! Over each step the state is interpolated by the cubic Hermite polynomial
//! through `(x_begin, f_begin)` and `(x_end, f_end)`. The true dynamics at the
//! interpolated midpoint must match the interpolant's derivative there:
//!
//! ```text
//! f_begin  = f(t_begin, x_begin, u_begin)
//! f_end    = f(t_end,   x_end,   u_begin)
//! x_c      = (x_begin + x_end)/2 + dt/8 · (f_begin − f_end)
//! xprime_c = −3/(2·dt) · (x_begin − x_end) − (f_begin + f_end)/4
//! f(t_begin + dt/2, x_c, u_begin) == xprime_c
//! ```
//!
//! The input is held at `u_begin` across the whole step, including the end
//! point, since a zero-order-hold input jumps only after `t_end`.

use tether_core::{Problem, VariableMatrix};

use crate::{Config, Dynamics, Error, dynamics::evaluate};

pub(crate) fn transcribe<D: Dynamics>(
    problem: &mut Problem,
    x: &VariableMatrix,
    u: &VariableMatrix,
    dynamics: &D,
    config: &Config,
) -> Result<(), Error> {
    let dt = config.dt();

    for k in 0..config.num_steps() {
        let x_begin = x.column(k);
        let x_end = x.column(k + 1);
        let u_begin = u.column(k);
        let t_begin = config.time(k);
        let t_end = config.time(k + 1);

        let f_begin = evaluate(dynamics, t_begin, &x_begin, &u_begin)?;
        let f_end = evaluate(dynamics, t_end, &x_end, &u_begin)?;
        let (x_c, xprime_c) = hermite_midpoint(dt, &x_begin, &x_end, &f_begin, &f_end);
        let f_c = evaluate(dynamics, t_begin + dt / 2.0, &x_c, &u_begin)?;

        problem.subject_to(f_c.equals(xprime_c));
    }
    Ok(())
}

/// Returns the midpoint state and derivative of the cubic Hermite
/// interpolant over one step of length `dt`.
///
/// # Panics
///
/// Panics if the four columns do not share a shape.
#[must_use]
pub fn hermite_midpoint(
    dt: f64,
    x_begin: &VariableMatrix,
    x_end: &VariableMatrix,
    f_begin: &VariableMatrix,
    f_end: &VariableMatrix,
) -> (VariableMatrix, VariableMatrix) {
    let x_c = (x_begin + x_end) / 2.0 + (f_begin - f_end) * (dt / 8.0);
    let xprime_c = (x_begin - x_end) * (-3.0 / (2.0 * dt)) - (f_begin + f_end) / 4.0;
    (x_c, xprime_c)
}
