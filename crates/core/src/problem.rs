//! The problem container handed to solvers.

use crate::{Constraint, Constraints, Variable, VariableMatrix};

/// Whether the objective is minimized or maximized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// A scalar objective and its sense.
#[derive(Debug, Clone)]
pub struct Objective {
    expr: Variable,
    sense: Sense,
}

impl Objective {
    #[must_use]
    pub fn expr(&self) -> &Variable {
        &self.expr
    }

    #[must_use]
    pub fn sense(&self) -> Sense {
        self.sense
    }

    /// Returns the expression a minimizer should drive down.
    #[must_use]
    pub fn minimand(&self) -> Variable {
        match self.sense {
            Sense::Minimize => self.expr.clone(),
            Sense::Maximize => -&self.expr,
        }
    }
}

/// A nonlinear program: decision variables, constraints, and an objective.
///
/// The problem only records structure. Decision variables are created here
/// and handed back as expression handles; constraints and the objective are
/// built from those handles by the caller. A solver reads the recorded
/// structure and writes its answer back into the decision variables.
///
/// Constraints accumulate monotonically. A problem without an objective is a
/// feasibility problem.
#[derive(Debug, Clone, Default)]
pub struct Problem {
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
}

impl Problem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `rows × cols` matrix of new decision variables, each with an
    /// initial value of zero.
    pub fn decision_variable(&mut self, rows: usize, cols: usize) -> VariableMatrix {
        let matrix = VariableMatrix::from_fn(rows, cols, |_, _| Variable::decision(0.0));
        // Row-major registration keeps variable order aligned with `iter()`.
        self.variables.extend(matrix.iter().cloned());
        matrix
    }

    /// Creates a single new decision variable with an initial value of zero.
    pub fn scalar_variable(&mut self) -> Variable {
        let var = Variable::decision(0.0);
        self.variables.push(var.clone());
        var
    }

    /// Records constraints that the solution must satisfy.
    pub fn subject_to(&mut self, constraints: impl Into<Constraints>) {
        self.constraints.extend(constraints.into());
    }

    /// Sets the objective to minimize, replacing any previous objective.
    pub fn minimize(&mut self, objective: impl Into<Variable>) {
        self.objective = Some(Objective {
            expr: objective.into(),
            sense: Sense::Minimize,
        });
    }

    /// Sets the objective to maximize, replacing any previous objective.
    pub fn maximize(&mut self, objective: impl Into<Variable>) {
        self.objective = Some(Objective {
            expr: objective.into(),
            sense: Sense::Maximize,
        });
    }

    /// Returns the decision variables in creation order.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Overwrites the values of all decision variables, in creation order.
    ///
    /// Solvers use this to publish their answer.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have one entry per decision variable.
    pub fn set_variable_values(&self, values: &[f64]) {
        assert_eq!(
            values.len(),
            self.variables.len(),
            "one value per decision variable"
        );
        for (var, &value) in self.variables.iter().zip(values) {
            var.0.value.set(value);
        }
    }

    #[must_use]
    pub fn decision_variable_count(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[must_use]
    pub fn equality_count(&self) -> usize {
        self.constraints.iter().filter(|c| c.is_equality()).count()
    }

    #[must_use]
    pub fn inequality_count(&self) -> usize {
        self.constraints.len() - self.equality_count()
    }

    #[must_use]
    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }
}
