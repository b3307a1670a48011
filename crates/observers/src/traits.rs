//! Capability traits for cross-solver observers.
//!
//! These traits abstract over solver-specific event and action types, so an
//! observer can be written once against the capability it needs.
//!
//! # Event traits
//!
//! - [`HasResidual`]: events that carry a residual (constraint violation)
//! - [`HasObjective`]: events that carry an objective value
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use tether_core::Observer;
//! use tether_observers::traits::{CanStopEarly, HasResidual};
//!
//! /// Stops once the iterate is feasible enough, after a warm-up.
//! struct FeasibleEnough {
//!     tolerance: f64,
//!     min_events: usize,
//!     seen: usize,
//! }
//!
//! impl<E: HasResidual, A: CanStopEarly> Observer<E, A> for FeasibleEnough {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         self.seen += 1;
//!         if self.seen >= self.min_events && event.residual().abs() < self.tolerance {
//!             return Some(A::stop_early());
//!         }
//!         None
//!     }
//! }
//! ```

use tether_solvers::optimization::augmented_lagrangian;

/// An event that carries a residual value.
pub trait HasResidual {
    /// Returns the residual for this event.
    ///
    /// Returns `f64::NAN` when no residual is available.
    fn residual(&self) -> f64;
}

/// An event that carries an objective value.
pub trait HasObjective {
    /// Returns the objective for this event.
    ///
    /// Returns `f64::NAN` when no objective is available.
    fn objective(&self) -> f64;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

// --- augmented_lagrangian ---

/// The residual is the largest constraint violation.
impl HasResidual for augmented_lagrangian::Event {
    fn residual(&self) -> f64 {
        self.infeasibility
    }
}

impl HasObjective for augmented_lagrangian::Event {
    fn objective(&self) -> f64 {
        self.objective
    }
}

impl CanStopEarly for augmented_lagrangian::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tether_core::{Observer, Problem};
    use tether_solvers::optimization::augmented_lagrangian::{
        Action, Config, Event, Status, solve,
    };

    /// Stops at the first event whose residual is below `tolerance`.
    struct Feasible {
        tolerance: f64,
        residuals: Vec<f64>,
    }

    impl<E: HasResidual, A: CanStopEarly> Observer<E, A> for Feasible {
        fn observe(&mut self, event: &E) -> Option<A> {
            self.residuals.push(event.residual());
            (event.residual() < self.tolerance).then(A::stop_early)
        }
    }

    #[test]
    fn event_exposes_residual_and_objective() {
        let event = Event {
            outer_iter: 3,
            iters: 41,
            objective: 2.5,
            infeasibility: 1e-3,
            stationarity: 1e-5,
            penalty: 100.0,
        };

        assert_eq!(event.residual(), 1e-3);
        assert_eq!(HasObjective::objective(&event), 2.5);
    }

    #[test]
    fn generic_observer_stops_solver() {
        let mut problem = Problem::new();
        let a = problem.scalar_variable();
        let b = problem.scalar_variable();
        problem.minimize(a.powi(2) + b.powi(2));
        problem.subject_to((&a + &b).equals(1.0));

        let mut observer = Feasible {
            tolerance: 1e-2,
            residuals: Vec::new(),
        };
        let config = Config::new(1e-10, 5_000).unwrap();
        let solution = solve(&problem, &config, |event: &Event| {
            Observer::<Event, Action>::observe(&mut observer, event)
        })
        .unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        let last = *observer.residuals.last().unwrap();
        assert!(last < 1e-2);
        assert!(observer.residuals[..observer.residuals.len() - 1]
            .iter()
            .all(|&r| r >= 1e-2));
    }
}
