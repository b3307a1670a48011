//! Augmented Lagrangian method for nonlinear programs.
//!
//! # Algorithm
//!
//! **Presolve.** Constraints between a single decision variable and a
//! constant become box bounds, so they hold exactly at every iterate.
//! Constraints with no decision variable are checked once and rejected with
//! [`Error::InfeasibleConstant`] if violated.
//!
//! **Outer loop.** The remaining equalities `c(x) = 0` and inequalities
//! `g(x) <= 0` are folded into the merit function
//!
//! ```text
//! L(x) = f(x) + Σ λᵢ·cᵢ + ρ/2·Σ cᵢ² + 1/(2ρ)·Σ (max(0, μⱼ + ρ·gⱼ)² − μⱼ²)
//! ```
//!
//! After each inner solve the multipliers take a first-order step
//! (`λ += ρ·c`, `μ = max(0, μ + ρ·g)`). The penalty `ρ` grows tenfold when
//! the constraint violation fails to drop below a quarter of its previous
//! value.
//!
//! **Inner loop.** `L` is minimized over the box by Newton's method on the
//! barrier function
//!
//! ```text
//! φ(x) = L(x) − τ·Σ [ln(xᵢ − lᵢ) + ln(uᵢ − xᵢ)]
//! ```
//!
//! with a fraction-to-boundary rule and an Armijo line search. Gradients and
//! exact Hessians come from a [`Tape`](tether_core::Tape) of the objective
//! and all constraint residuals. The Newton system is factored with a sparse
//! envelope Cholesky after a bandwidth-reducing reordering, so the banded
//! systems of trajectory problems cost time linear in the horizon. The
//! barrier weight `τ` and the inner tolerance shrink tenfold per outer
//! iteration.
//!
//! # Initial Guess
//!
//! The search starts from the current values of the problem's decision
//! variables, projected onto the bounds and then moved slightly inside them.
//! On return (for any [`Status`]) the final iterate is written back into the
//! decision variables, with components within the tolerance of a bound
//! placed exactly on it.
//!
//! # Observer Events
//!
//! The solver emits one [`Event`] per outer iteration, after the inner solve
//! and before the multiplier update. Observers can return
//! [`Action::StopEarly`] to halt.

mod action;
mod cholesky;
mod config;
mod diagnostics;
mod error;
mod event;
mod merit;
mod newton;
mod presolve;
mod search;
mod solution;


pub use action::Action;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use tether_core::{Observer, Problem};

/// Solves `problem`, starting from the current decision variable values.
///
/// The observer receives an [`Event`] after every outer iteration.
///
/// # Errors
///
/// Returns an error if a constraint without decision variables is violated
/// or if bound constraints on some variable cannot both hold.
pub fn solve<Obs>(problem: &Problem, config: &Config, observer: Obs) -> Result<Solution, Error>
where
    Obs: Observer<Event, Action>,
{
    search::search(problem, config, observer)
}

/// Solves `problem` without observer support.
///
/// This is a convenience wrapper around [`solve`] that uses a no-op observer.
///
/// # Errors
///
/// Returns an error if a constraint without decision variables is violated
/// or if bound constraints on some variable cannot both hold.
pub fn solve_unobserved(problem: &Problem, config: &Config) -> Result<Solution, Error> {
    solve(problem, config, ())
}
