use tether_core::AssignError;
use tether_solvers::optimization::augmented_lagrangian;

/// Errors that can occur while building or solving an optimal control problem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Direct collocation interpolates the state derivative, which a
    /// discrete model does not provide.
    #[error("direct collocation requires explicit ODE dynamics")]
    CollocationRequiresOde,

    #[error("dynamics error: {0}")]
    Dynamics(Box<dyn std::error::Error + Send + Sync>),

    #[error("dynamics returned a {}×{} matrix, expected {}×{}", found.0, found.1, expected.0, expected.1)]
    DynamicsShape {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("boundary value is {}×{}, expected {}×{}", found.0, found.1, expected.0, expected.1)]
    BoundaryShape {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Single shooting substitutes the initial state, so it must be numeric.
    #[error("single shooting requires a constant initial state")]
    NonConstantInitialState,

    #[error("cannot assign initial state: {0}")]
    Assign(#[from] AssignError),

    #[error("path constraint error: {0}")]
    PathConstraint(Box<dyn std::error::Error + Send + Sync>),

    #[error("solver error: {0}")]
    Solve(#[from] augmented_lagrangian::Error),
}
