/// Progress report emitted after each outer iteration.
///
/// Values describe the iterate reached by the inner solve, before the
/// multipliers and penalty are updated for the next outer iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Outer iteration number, starting at 1.
    pub outer_iter: usize,

    /// Total inner iterations so far.
    pub iters: usize,

    /// Objective value, in the problem's own sense.
    pub objective: f64,

    /// Largest constraint violation.
    pub infeasibility: f64,

    /// Projected gradient norm of the merit function.
    pub stationarity: f64,

    /// Penalty parameter used by the inner solve.
    pub penalty: f64,
}
