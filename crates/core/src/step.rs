use crate::VariableMatrix;

/// A trait for types that can be stepped using their derivative.
///
/// Implementing this trait lets fixed-step integrators advance the type via
/// `self + derivative * delta`, where the derivative is with respect to
/// `Delta`. Usually `Delta` is time, but any independent variable works.
///
/// Integrators that blend several derivative estimates (such as RK4) also
/// need the derivative to support addition and scaling; those bounds live
/// on the integrator, not here.
pub trait StepIntegrable<Delta> {
    /// The derivative of the type with respect to `Delta`.
    type Derivative;

    /// Returns the value after stepping with a derivative and step size.
    #[must_use]
    fn step(&self, derivative: Self::Derivative, delta: Delta) -> Self;
}

/// Type alias for the derivative of a `StepIntegrable` type.
///
/// This is a convenience for accessing the [`StepIntegrable::Derivative`]
/// associated type without writing out the fully qualified syntax.
pub type DerivativeOf<T, Delta> = <T as StepIntegrable<Delta>>::Derivative;

impl StepIntegrable<f64> for f64 {
    type Derivative = f64;

    fn step(&self, derivative: f64, delta: f64) -> Self {
        self + derivative * delta
    }
}

/// Symbolic stepping: the result is an expression in the current state.
impl StepIntegrable<f64> for VariableMatrix {
    type Derivative = VariableMatrix;

    fn step(&self, derivative: VariableMatrix, delta: f64) -> Self {
        self + derivative * delta
    }
}
