//! Element-wise constraints between expressions.

use crate::{Variable, VariableMatrix};

/// How the two sides of a [`Constraint`] relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `lhs == rhs`
    Equal,

    /// `lhs <= rhs`
    LessEqual,

    /// `lhs >= rhs`
    GreaterEqual,
}

/// A scalar relation between two expressions.
#[derive(Debug, Clone)]
pub struct Constraint {
    lhs: Variable,
    rhs: Variable,
    relation: Relation,
}

impl Constraint {
    #[must_use]
    pub fn new(lhs: Variable, relation: Relation, rhs: Variable) -> Self {
        Self { lhs, rhs, relation }
    }

    #[must_use]
    pub fn lhs(&self) -> &Variable {
        &self.lhs
    }

    #[must_use]
    pub fn rhs(&self) -> &Variable {
        &self.rhs
    }

    #[must_use]
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Returns `true` for equality constraints.
    #[must_use]
    pub fn is_equality(&self) -> bool {
        self.relation == Relation::Equal
    }

    /// Returns the residual `g` in normalized form.
    ///
    /// Equalities are satisfied when `g == 0`, inequalities when `g <= 0`.
    #[must_use]
    pub fn residual(&self) -> Variable {
        match self.relation {
            Relation::Equal | Relation::LessEqual => &self.lhs - &self.rhs,
            Relation::GreaterEqual => &self.rhs - &self.lhs,
        }
    }
}

/// A list of scalar constraints, typically one per matrix element.
#[derive(Debug, Clone, Default)]
pub struct Constraints(Vec<Constraint>);

impl Constraints {
    /// Returns the number of scalar constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.0.iter()
    }

    /// Appends the constraints of `other`.
    pub fn extend(&mut self, other: Constraints) {
        self.0.extend(other.0);
    }
}

impl From<Constraint> for Constraints {
    fn from(constraint: Constraint) -> Self {
        Self(vec![constraint])
    }
}

impl From<Vec<Constraint>> for Constraints {
    fn from(constraints: Vec<Constraint>) -> Self {
        Self(constraints)
    }
}

impl IntoIterator for Constraints {
    type Item = Constraint;
    type IntoIter = std::vec::IntoIter<Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The right-hand side of a matrix constraint.
///
/// A scalar is broadcast to every element; a matrix must match the shape of
/// the left-hand side.
#[derive(Debug, Clone)]
pub enum Operand {
    Scalar(Variable),
    Matrix(VariableMatrix),
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Self::Scalar(Variable::constant(value))
    }
}

impl From<Variable> for Operand {
    fn from(value: Variable) -> Self {
        Self::Scalar(value)
    }
}

impl From<&Variable> for Operand {
    fn from(value: &Variable) -> Self {
        Self::Scalar(value.clone())
    }
}

impl From<VariableMatrix> for Operand {
    fn from(value: VariableMatrix) -> Self {
        Self::Matrix(value)
    }
}

impl From<&VariableMatrix> for Operand {
    fn from(value: &VariableMatrix) -> Self {
        Self::Matrix(value.clone())
    }
}

impl Variable {
    /// Builds `self == rhs`.
    #[must_use]
    pub fn equals(&self, rhs: impl Into<Variable>) -> Constraints {
        Constraint::new(self.clone(), Relation::Equal, rhs.into()).into()
    }

    /// Builds `self <= rhs`.
    #[must_use]
    pub fn leq(&self, rhs: impl Into<Variable>) -> Constraints {
        Constraint::new(self.clone(), Relation::LessEqual, rhs.into()).into()
    }

    /// Builds `self >= rhs`.
    #[must_use]
    pub fn geq(&self, rhs: impl Into<Variable>) -> Constraints {
        Constraint::new(self.clone(), Relation::GreaterEqual, rhs.into()).into()
    }
}

impl VariableMatrix {
    /// Builds `self == rhs` element-wise.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is a matrix of a different shape.
    #[must_use]
    pub fn equals(&self, rhs: impl Into<Operand>) -> Constraints {
        self.relate(Relation::Equal, rhs.into())
    }

    /// Builds `self <= rhs` element-wise.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is a matrix of a different shape.
    #[must_use]
    pub fn leq(&self, rhs: impl Into<Operand>) -> Constraints {
        self.relate(Relation::LessEqual, rhs.into())
    }

    /// Builds `self >= rhs` element-wise.
    ///
    /// # Panics
    ///
    /// Panics if `rhs` is a matrix of a different shape.
    #[must_use]
    pub fn geq(&self, rhs: impl Into<Operand>) -> Constraints {
        self.relate(Relation::GreaterEqual, rhs.into())
    }

    fn relate(&self, relation: Relation, rhs: Operand) -> Constraints {
        let (rows, cols) = self.shape();
        let mut constraints = Vec::with_capacity(rows * cols);
        match rhs {
            Operand::Scalar(rhs) => {
                for lhs in self.iter() {
                    constraints.push(Constraint::new(lhs.clone(), relation, rhs.clone()));
                }
            }
            Operand::Matrix(rhs) => {
                assert_eq!(self.shape(), rhs.shape(), "constraint shape mismatch");
                for (lhs, rhs) in self.iter().zip(rhs.iter()) {
                    constraints.push(Constraint::new(lhs.clone(), relation, rhs.clone()));
                }
            }
        }
        Constraints(constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn scalar_operand_broadcasts() {
        let m = VariableMatrix::parameters(2, 3);
        let constraints = m.leq(12.0);

        assert_eq!(constraints.len(), 6);
        assert!(
            constraints
                .iter()
                .all(|c| c.relation() == Relation::LessEqual && c.rhs().as_constant() == Some(12.0))
        );
    }

    #[test]
    fn matrix_operand_pairs_elements() {
        let m = VariableMatrix::parameters(2, 1);
        let target = VariableMatrix::from_column(&[1.0, 2.0]);
        let constraints: Vec<Constraint> = m.equals(&target).into_iter().collect();

        assert_eq!(constraints.len(), 2);
        assert!(constraints[0].lhs().ptr_eq(m.get(0, 0)));
        assert_eq!(constraints[1].rhs().as_constant(), Some(2.0));
        assert!(constraints.iter().all(Constraint::is_equality));
    }

    #[test]
    fn residual_is_nonpositive_when_satisfied() {
        let x = Variable::parameter(3.0);

        let ge: Vec<Constraint> = x.geq(1.0).into_iter().collect();
        let le: Vec<Constraint> = x.leq(5.0).into_iter().collect();

        assert_relative_eq!(ge[0].residual().value(), -2.0);
        assert_relative_eq!(le[0].residual().value(), -2.0);
    }

    #[test]
    #[should_panic(expected = "constraint shape mismatch")]
    fn mismatched_operand_panics() {
        let _ = VariableMatrix::zeros(2, 1).equals(VariableMatrix::zeros(3, 1));
    }
}
