use std::time::Duration;

/// Indicates why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Feasible and stationary within the configured tolerance.
    Converged,

    /// Used up the inner iteration budget.
    MaxIters,

    /// Ran past the configured wall-clock limit.
    Timeout,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of an augmented Lagrangian solve.
///
/// The decision values themselves are written back into the problem's
/// decision variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,

    /// Objective value at the reported point, in the problem's own sense.
    pub objective: f64,

    /// Largest constraint violation at the reported point.
    pub infeasibility: f64,

    /// Total inner iterations.
    pub iters: usize,

    /// Outer iterations started.
    pub outer_iters: usize,

    /// Wall-clock time spent in the solver.
    pub elapsed: Duration,
}
