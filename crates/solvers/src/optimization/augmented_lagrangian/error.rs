/// Errors that can occur during an augmented Lagrangian solve.
///
/// Both variants are detected during presolve, before any iteration.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    /// A constraint with no decision variables does not hold.
    #[error("constraint {index} has no decision variables and is violated by {violation}")]
    InfeasibleConstant { index: usize, violation: f64 },

    /// Bound constraints on a decision variable exclude every value.
    #[error("decision variable {index} has lower bound {lower} above upper bound {upper}")]
    CrossedBounds {
        index: usize,
        lower: f64,
        upper: f64,
    },
}
