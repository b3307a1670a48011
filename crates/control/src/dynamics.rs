use tether_core::VariableMatrix;

use crate::Error;

/// What a [`Dynamics`] model returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DynamicsType {
    /// `f(t, x, u)` is the time derivative `ẋ`.
    ExplicitOde,

    /// `f(t, x, u)` is the state one step later.
    Discrete,
}

/// A dynamics model `f(t, x, u)` over symbolic state and input columns.
///
/// `x` is `n_x × 1` and `u` is `n_u × 1`; the result must be `n_x × 1`.
/// The model is evaluated while the problem is built, once or more per step,
/// so it should compose expressions rather than read values.
///
/// Closures `Fn(f64, &VariableMatrix, &VariableMatrix) -> Result<VariableMatrix, E>`
/// implement this trait.
pub trait Dynamics {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Evaluates the model at time `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be evaluated for these arguments.
    fn evaluate(
        &self,
        t: f64,
        x: &VariableMatrix,
        u: &VariableMatrix,
    ) -> Result<VariableMatrix, Self::Error>;
}

impl<F, E> Dynamics for F
where
    F: Fn(f64, &VariableMatrix, &VariableMatrix) -> Result<VariableMatrix, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn evaluate(
        &self,
        t: f64,
        x: &VariableMatrix,
        u: &VariableMatrix,
    ) -> Result<VariableMatrix, E> {
        self(t, x, u)
    }
}

/// Evaluates `dynamics` and checks that the result is a state column.
pub(crate) fn evaluate<D: Dynamics>(
    dynamics: &D,
    t: f64,
    x: &VariableMatrix,
    u: &VariableMatrix,
) -> Result<VariableMatrix, Error> {
    let value = dynamics
        .evaluate(t, x, u)
        .map_err(|error| Error::Dynamics(Box::new(error)))?;

    let expected = (x.rows(), 1);
    if value.shape() != expected {
        return Err(Error::DynamicsShape {
            expected,
            found: value.shape(),
        });
    }

    Ok(value)
}
