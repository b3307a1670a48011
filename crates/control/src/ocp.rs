//! The fixed-step optimal control problem.

#[cfg(test)]
mod tests;

use tether_core::{Observer, Problem, Variable, VariableMatrix};
use tether_solvers::optimization::augmented_lagrangian::{self, Action, Event, Solution};

use crate::{Config, Dynamics, DynamicsType, Error, FinalInput, TranscriptionMethod};

/// An optimal control problem discretized on a fixed time grid.
///
/// Construction allocates the input trajectory `U` (`n_u × (N+1)` decision
/// variables) and the state trajectory `X` (`n_x × (N+1)`), then runs the
/// chosen [`TranscriptionMethod`] once to impose the dynamics on steps
/// `0..N`. For single shooting `X` holds expressions instead of decision
/// variables; its first column holds parameters fixed by
/// [`constrain_initial_state`](Self::constrain_initial_state).
///
/// Boundary and path constraints may then be added any number of times and
/// accumulate in the underlying [`Problem`], after the dynamics constraints.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
///
/// use tether_control::{Config, DynamicsType, FixedStepOcp, TranscriptionMethod};
/// use tether_core::VariableMatrix;
///
/// let dynamics = |_t: f64, x: &VariableMatrix, u: &VariableMatrix| Ok::<_, Infallible>(-x + u);
///
/// let config = Config::new(1, 1, 0.1, 10).unwrap();
/// let mut ocp = FixedStepOcp::new(
///     config,
///     dynamics,
///     DynamicsType::ExplicitOde,
///     TranscriptionMethod::DirectTranscription,
/// )
/// .unwrap();
///
/// ocp.constrain_initial_state(&VariableMatrix::from_column(&[0.0])).unwrap();
/// ocp.constrain_input_bounds(-1.0, 1.0);
///
/// assert_eq!(ocp.x().cols(), 11);
/// assert_eq!(ocp.u().cols(), 11);
/// ```
#[derive(Debug)]
pub struct FixedStepOcp {
    problem: Problem,
    x: VariableMatrix,
    u: VariableMatrix,
    config: Config,
    dynamics_type: DynamicsType,
    method: TranscriptionMethod,
}

impl FixedStepOcp {
    /// Builds the problem and imposes the dynamics.
    ///
    /// The dynamics are evaluated during construction and not retained.
    ///
    /// # Errors
    ///
    /// - [`Error::CollocationRequiresOde`] if direct collocation is requested
    ///   with discrete dynamics, before anything is allocated.
    /// - [`Error::Dynamics`] or [`Error::DynamicsShape`] if a dynamics
    ///   evaluation fails or does not return an `n_x × 1` column.
    pub fn new<D: Dynamics>(
        config: Config,
        dynamics: D,
        dynamics_type: DynamicsType,
        method: TranscriptionMethod,
    ) -> Result<Self, Error> {
        method.check(dynamics_type)?;

        let (n_x, n_u, columns) = (
            config.num_states(),
            config.num_inputs(),
            config.num_steps() + 1,
        );

        let mut problem = Problem::new();
        let u = problem.decision_variable(n_u, columns);
        let mut x = if method.has_state_variables() {
            problem.decision_variable(n_x, columns)
        } else {
            VariableMatrix::parameters(n_x, columns)
        };

        method.transcribe(&mut problem, &mut x, &u, &dynamics, dynamics_type, &config)?;

        if config.final_input() == FinalInput::HoldLast {
            let n = config.num_steps();
            problem.subject_to(u.column(n).equals(u.column(n - 1)));
        }

        Ok(Self {
            problem,
            x,
            u,
            config,
            dynamics_type,
            method,
        })
    }

    /// Returns the state trajectory, one column per node.
    #[must_use]
    pub fn x(&self) -> &VariableMatrix {
        &self.x
    }

    /// Returns the input trajectory, one column per node.
    #[must_use]
    pub fn u(&self) -> &VariableMatrix {
        &self.u
    }

    /// Returns the state at node 0.
    #[must_use]
    pub fn initial_state(&self) -> VariableMatrix {
        self.x.column(0)
    }

    /// Returns the state at node `N`.
    #[must_use]
    pub fn final_state(&self) -> VariableMatrix {
        self.x.column(self.config.num_steps())
    }

    /// Returns the underlying problem.
    #[must_use]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Returns the underlying problem for adding constraints or an objective.
    pub fn problem_mut(&mut self) -> &mut Problem {
        &mut self.problem
    }

    /// Returns the sizes and time step.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns whether the dynamics are a derivative or a next state.
    #[must_use]
    pub fn dynamics_type(&self) -> DynamicsType {
        self.dynamics_type
    }

    /// Returns the transcription method.
    #[must_use]
    pub fn method(&self) -> TranscriptionMethod {
        self.method
    }

    /// Sets the objective to minimize.
    pub fn minimize(&mut self, objective: impl Into<Variable>) {
        self.problem.minimize(objective);
    }

    /// Sets the objective to maximize.
    pub fn maximize(&mut self, objective: impl Into<Variable>) {
        self.problem.maximize(objective);
    }

    /// Constrains `X[:,0] == value`.
    ///
    /// For single shooting the value is also substituted into the first
    /// state column, so every later state becomes a function of the inputs
    /// only. The equality is still recorded and then holds identically.
    ///
    /// # Errors
    ///
    /// - [`Error::BoundaryShape`] if `value` is not `n_x × 1`.
    /// - [`Error::NonConstantInitialState`] for single shooting when `value`
    ///   is not constant.
    pub fn constrain_initial_state(&mut self, value: &VariableMatrix) -> Result<(), Error> {
        self.check_state_shape(value)?;

        if !self.method.has_state_variables() {
            if !value.is_constant() {
                return Err(Error::NonConstantInitialState);
            }
            self.initial_state().set_values(&value.values())?;
        }

        self.problem.subject_to(self.initial_state().equals(value));
        Ok(())
    }

    /// Constrains `X[:,N] == value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BoundaryShape`] if `value` is not `n_x × 1`.
    pub fn constrain_final_state(&mut self, value: &VariableMatrix) -> Result<(), Error> {
        self.check_state_shape(value)?;
        self.problem.subject_to(self.final_state().equals(value));
        Ok(())
    }

    /// Calls `constraint(problem, X[:,k], U[:,k])` for every node
    /// `k = 0..=N`, in order.
    ///
    /// The callback registers its own constraints on the problem.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathConstraint`] with the first callback error. Nodes
    /// after the failing one are not visited; constraints registered before
    /// it are kept.
    pub fn constrain_always<F, E>(&mut self, mut constraint: F) -> Result<(), Error>
    where
        F: FnMut(&mut Problem, &VariableMatrix, &VariableMatrix) -> Result<(), E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        for k in 0..=self.config.num_steps() {
            let x = self.x.column(k);
            let u = self.u.column(k);
            constraint(&mut self.problem, &x, &u)
                .map_err(|error| Error::PathConstraint(Box::new(error)))?;
        }
        Ok(())
    }

    /// Constrains every input at every node to `lower <= u <= upper`.
    pub fn constrain_input_bounds(&mut self, lower: f64, upper: f64) {
        self.problem.subject_to(self.u.geq(lower));
        self.problem.subject_to(self.u.leq(upper));
    }

    /// Solves the problem with the augmented Lagrangian solver.
    ///
    /// On return the decision variables hold the solution, so `x()` and
    /// `u()` evaluate to the optimized trajectories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Solve`] if presolve finds the problem infeasible.
    pub fn solve(&self, config: &augmented_lagrangian::Config) -> Result<Solution, Error> {
        self.solve_observed(config, ())
    }

    /// Like [`solve`](Self::solve), with an observer of solver events.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Solve`] if presolve finds the problem infeasible.
    pub fn solve_observed<Obs>(
        &self,
        config: &augmented_lagrangian::Config,
        observer: Obs,
    ) -> Result<Solution, Error>
    where
        Obs: Observer<Event, Action>,
    {
        Ok(augmented_lagrangian::solve(&self.problem, config, observer)?)
    }

    fn check_state_shape(&self, value: &VariableMatrix) -> Result<(), Error> {
        let expected = (self.config.num_states(), 1);
        if value.shape() == expected {
            Ok(())
        } else {
            Err(Error::BoundaryShape {
                expected,
                found: value.shape(),
            })
        }
    }
}
