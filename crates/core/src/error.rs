use thiserror::Error;

/// Error returned when assigning a value to a node that does not hold one.
///
/// Only parameters and decision variables carry a settable value. Constants
/// are folded into the graph and expressions derive their value from their
/// operands.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    #[error("cannot assign a value to a constant")]
    Constant,

    #[error("cannot assign a value to an expression")]
    Expression,
}
