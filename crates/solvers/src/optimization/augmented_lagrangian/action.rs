/// Actions an observer can take during an augmented Lagrangian solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the solver and publish the current iterate.
    StopEarly,
}
