//! Numerical solvers for the Tether framework.
//!
//! - [`transient`]: fixed-step integrators for explicit ODEs
//! - [`optimization`]: solvers for constrained nonlinear programs described
//!   by a [`Problem`](tether_core::Problem)

pub mod optimization;
pub mod transient;
