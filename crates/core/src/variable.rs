//! Scalar expression nodes.
//!
//! A [`Variable`] is a reference-counted handle to an immutable node in a
//! directed acyclic graph. Cloning a variable is cheap and shares the node.
//! Arithmetic on variables builds new nodes; arithmetic on two constants is
//! folded immediately so constant subexpressions never reach a solver.

use std::{
    cell::Cell,
    collections::HashSet,
    fmt,
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    rc::Rc,
};

use crate::{AssignError, Tape};

/// The leaf category of a variable, or [`Kind::Expression`] for interior nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A fixed number.
    Constant,

    /// A number that is fixed during a solve but can be reassigned between solves.
    Parameter,

    /// An independent unknown owned by a [`Problem`](crate::Problem).
    Decision,

    /// An operation over other variables.
    Expression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Sin,
    Cos,
    Exp,
    Ln,
    Sqrt,
    Powi(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Leaf(Kind),
    Unary(UnaryOp),
    Binary(BinaryOp),
}

impl UnaryOp {
    pub(crate) fn apply(self, a: f64) -> f64 {
        match self {
            Self::Neg => -a,
            Self::Sin => a.sin(),
            Self::Cos => a.cos(),
            Self::Exp => a.exp(),
            Self::Ln => a.ln(),
            Self::Sqrt => a.sqrt(),
            Self::Powi(n) => a.powi(n),
        }
    }

    /// Derivative of the operation with respect to its operand.
    ///
    /// `value` is the already computed result of [`apply`](Self::apply).
    pub(crate) fn derivative(self, a: f64, value: f64) -> f64 {
        match self {
            Self::Neg => -1.0,
            Self::Sin => a.cos(),
            Self::Cos => -a.sin(),
            Self::Exp => value,
            Self::Ln => 1.0 / a,
            Self::Sqrt => 0.5 / value,
            Self::Powi(0) => 0.0,
            Self::Powi(n) => f64::from(n) * a.powi(n - 1),
        }
    }

    /// Second derivative of the operation with respect to its operand.
    pub(crate) fn second_derivative(self, a: f64, value: f64) -> f64 {
        match self {
            Self::Neg | Self::Powi(0 | 1) => 0.0,
            Self::Sin | Self::Cos => -value,
            Self::Exp => value,
            Self::Ln => -1.0 / (a * a),
            Self::Sqrt => -0.25 / (value * value * value),
            Self::Powi(n) => f64::from(n) * f64::from(n - 1) * a.powi(n - 2),
        }
    }
}

impl BinaryOp {
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
        }
    }

    /// Partial derivatives with respect to the left and right operands.
    pub(crate) fn derivatives(self, a: f64, b: f64) -> (f64, f64) {
        match self {
            Self::Add => (1.0, 1.0),
            Self::Sub => (1.0, -1.0),
            Self::Mul => (b, a),
            Self::Div => (1.0 / b, -a / (b * b)),
        }
    }

    /// Second partial derivatives `(∂²/∂a², ∂²/∂a∂b, ∂²/∂b²)`.
    pub(crate) fn second_derivatives(self, a: f64, b: f64) -> (f64, f64, f64) {
        match self {
            Self::Add | Self::Sub => (0.0, 0.0, 0.0),
            Self::Mul => (0.0, 1.0, 0.0),
            Self::Div => (0.0, -1.0 / (b * b), 2.0 * a / (b * b * b)),
        }
    }
}

pub(crate) struct Node {
    pub(crate) op: Op,
    pub(crate) args: Vec<Variable>,
    pub(crate) value: Cell<f64>,
}

impl Drop for Node {
    fn drop(&mut self) {
        // Unlink children iteratively so deep chains cannot overflow the stack.
        let mut pending = std::mem::take(&mut self.args);
        while let Some(child) = pending.pop() {
            if let Ok(mut node) = Rc::try_unwrap(child.0) {
                pending.append(&mut node.args);
            }
        }
    }
}

/// Identity of a node, valid while any handle to it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A scalar node in an expression graph.
#[derive(Clone)]
pub struct Variable(pub(crate) Rc<Node>);

impl Variable {
    /// Creates a constant.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::leaf(Kind::Constant, value)
    }

    /// Creates a parameter with an initial value.
    ///
    /// Parameters behave like constants during a solve, but they are never
    /// folded, so their value may be changed with [`set_value`](Self::set_value)
    /// after expressions have been built on top of them.
    #[must_use]
    pub fn parameter(value: f64) -> Self {
        Self::leaf(Kind::Parameter, value)
    }

    /// Creates a decision variable. Only [`Problem`](crate::Problem) hands these out.
    pub(crate) fn decision(value: f64) -> Self {
        Self::leaf(Kind::Decision, value)
    }

    fn leaf(kind: Kind, value: f64) -> Self {
        Self(Rc::new(Node {
            op: Op::Leaf(kind),
            args: Vec::new(),
            value: Cell::new(value),
        }))
    }

    fn node(op: Op, args: Vec<Variable>) -> Self {
        Self(Rc::new(Node {
            op,
            args,
            value: Cell::new(f64::NAN),
        }))
    }

    pub(crate) fn unary(op: UnaryOp, arg: Variable) -> Self {
        match arg.as_constant() {
            Some(a) => Self::constant(op.apply(a)),
            None => Self::node(Op::Unary(op), vec![arg]),
        }
    }

    pub(crate) fn binary(op: BinaryOp, lhs: Variable, rhs: Variable) -> Self {
        let (a, b) = (lhs.as_constant(), rhs.as_constant());
        match (op, a, b) {
            (_, Some(a), Some(b)) => Self::constant(op.apply(a, b)),
            (BinaryOp::Add, Some(z), _) if z == 0.0 => rhs,
            (BinaryOp::Add | BinaryOp::Sub, _, Some(z)) if z == 0.0 => lhs,
            (BinaryOp::Sub, Some(z), _) if z == 0.0 => Self::unary(UnaryOp::Neg, rhs),
            (BinaryOp::Mul, Some(z), _) | (BinaryOp::Mul, _, Some(z)) if z == 0.0 => {
                Self::constant(0.0)
            }
            (BinaryOp::Mul, Some(one), _) if one == 1.0 => rhs,
            (BinaryOp::Mul | BinaryOp::Div, _, Some(one)) if one == 1.0 => lhs,
            _ => Self::node(Op::Binary(op), vec![lhs, rhs]),
        }
    }

    /// Returns what kind of node this is.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self.0.op {
            Op::Leaf(kind) => kind,
            Op::Unary(_) | Op::Binary(_) => Kind::Expression,
        }
    }

    /// Returns `true` if this is a constant.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.kind() == Kind::Constant
    }

    /// Returns `true` if this is a decision variable.
    #[must_use]
    pub fn is_decision(&self) -> bool {
        self.kind() == Kind::Decision
    }

    /// Returns the value if this is a constant.
    #[must_use]
    pub fn as_constant(&self) -> Option<f64> {
        self.is_constant().then(|| self.0.value.get())
    }

    /// Evaluates the variable using the current values of all leaves.
    #[must_use]
    pub fn value(&self) -> f64 {
        match self.0.op {
            Op::Leaf(_) => self.0.value.get(),
            Op::Unary(_) | Op::Binary(_) => {
                let tape = Tape::new(std::slice::from_ref(self), &[]);
                tape.evaluate(&[])[0]
            }
        }
    }

    /// Assigns the value of a parameter or decision variable.
    ///
    /// For decision variables this is the initial guess of the next solve.
    ///
    /// # Errors
    ///
    /// Returns an [`AssignError`] if the variable is a constant or an expression.
    pub fn set_value(&self, value: f64) -> Result<(), AssignError> {
        match self.kind() {
            Kind::Parameter | Kind::Decision => {
                self.0.value.set(value);
                Ok(())
            }
            Kind::Constant => Err(AssignError::Constant),
            Kind::Expression => Err(AssignError::Expression),
        }
    }

    /// Returns `true` if both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the identity of the underlying node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.0) as usize)
    }

    pub(crate) fn key(&self) -> *const Node {
        Rc::as_ptr(&self.0)
    }

    /// Returns `true` if any decision variable appears in the expression.
    #[must_use]
    pub fn contains_decision(&self) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![self];
        while let Some(var) = stack.pop() {
            match var.0.op {
                Op::Leaf(Kind::Decision) => return true,
                Op::Leaf(_) => {}
                Op::Unary(_) | Op::Binary(_) => {
                    if seen.insert(var.key()) {
                        stack.extend(var.0.args.iter());
                    }
                }
            }
        }
        false
    }

    #[must_use]
    pub fn sin(&self) -> Self {
        Self::unary(UnaryOp::Sin, self.clone())
    }

    #[must_use]
    pub fn cos(&self) -> Self {
        Self::unary(UnaryOp::Cos, self.clone())
    }

    #[must_use]
    pub fn exp(&self) -> Self {
        Self::unary(UnaryOp::Exp, self.clone())
    }

    /// Natural logarithm.
    #[must_use]
    pub fn ln(&self) -> Self {
        Self::unary(UnaryOp::Ln, self.clone())
    }

    #[must_use]
    pub fn sqrt(&self) -> Self {
        Self::unary(UnaryOp::Sqrt, self.clone())
    }

    /// Raises the variable to an integer power.
    #[must_use]
    pub fn powi(&self, n: i32) -> Self {
        match n {
            0 => Self::constant(1.0),
            1 => self.clone(),
            _ => Self::unary(UnaryOp::Powi(n), self.clone()),
        }
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.op {
            Op::Leaf(kind) => f
                .debug_struct("Variable")
                .field("kind", &kind)
                .field("value", &self.0.value.get())
                .finish(),
            op => f.debug_struct("Variable").field("op", &op).finish(),
        }
    }
}

impl From<f64> for Variable {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl From<&Variable> for Variable {
    fn from(value: &Variable) -> Self {
        value.clone()
    }
}

impl Neg for Variable {
    type Output = Variable;

    fn neg(self) -> Variable {
        Variable::unary(UnaryOp::Neg, self)
    }
}

impl Neg for &Variable {
    type Output = Variable;

    fn neg(self) -> Variable {
        Variable::unary(UnaryOp::Neg, self.clone())
    }
}

macro_rules! binary_ops {
    ($Trait:ident, $method:ident, $AssignTrait:ident, $assign:ident, $op:expr) => {
        impl $Trait<Variable> for Variable {
            type Output = Variable;

            fn $method(self, rhs: Variable) -> Variable {
                Variable::binary($op, self, rhs)
            }
        }

        impl $Trait<&Variable> for Variable {
            type Output = Variable;

            fn $method(self, rhs: &Variable) -> Variable {
                Variable::binary($op, self, rhs.clone())
            }
        }

        impl $Trait<Variable> for &Variable {
            type Output = Variable;

            fn $method(self, rhs: Variable) -> Variable {
                Variable::binary($op, self.clone(), rhs)
            }
        }

        impl $Trait<&Variable> for &Variable {
            type Output = Variable;

            fn $method(self, rhs: &Variable) -> Variable {
                Variable::binary($op, self.clone(), rhs.clone())
            }
        }

        impl $Trait<f64> for Variable {
            type Output = Variable;

            fn $method(self, rhs: f64) -> Variable {
                Variable::binary($op, self, Variable::constant(rhs))
            }
        }

        impl $Trait<f64> for &Variable {
            type Output = Variable;

            fn $method(self, rhs: f64) -> Variable {
                Variable::binary($op, self.clone(), Variable::constant(rhs))
            }
        }

        impl $Trait<Variable> for f64 {
            type Output = Variable;

            fn $method(self, rhs: Variable) -> Variable {
                Variable::binary($op, Variable::constant(self), rhs)
            }
        }

        impl $Trait<&Variable> for f64 {
            type Output = Variable;

            fn $method(self, rhs: &Variable) -> Variable {
                Variable::binary($op, Variable::constant(self), rhs.clone())
            }
        }

        impl $AssignTrait<Variable> for Variable {
            fn $assign(&mut self, rhs: Variable) {
                *self = Variable::binary($op, self.clone(), rhs);
            }
        }

        impl $AssignTrait<&Variable> for Variable {
            fn $assign(&mut self, rhs: &Variable) {
                *self = Variable::binary($op, self.clone(), rhs.clone());
            }
        }

        impl $AssignTrait<f64> for Variable {
            fn $assign(&mut self, rhs: f64) {
                *self = Variable::binary($op, self.clone(), Variable::constant(rhs));
            }
        }
    };
}

binary_ops!(Add, add, AddAssign, add_assign, BinaryOp::Add);
binary_ops!(Sub, sub, SubAssign, sub_assign, BinaryOp::Sub);
binary_ops!(Mul, mul, MulAssign, mul_assign, BinaryOp::Mul);
binary_ops!(Div, div, DivAssign, div_assign, BinaryOp::Div);

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn constants_fold() {
        let v = Variable::constant(2.0) * 3.0 + 1.0;
        assert_eq!(v.kind(), Kind::Constant);
        assert_relative_eq!(v.value(), 7.0);
    }

    #[test]
    fn parameters_are_not_folded() {
        let p = Variable::parameter(2.0);
        let v = &p * 3.0;
        assert_eq!(v.kind(), Kind::Expression);
        assert_relative_eq!(v.value(), 6.0);

        p.set_value(5.0).unwrap();
        assert_relative_eq!(v.value(), 15.0);
    }

    #[test]
    fn identities_skip_nodes() {
        let p = Variable::parameter(4.0);
        assert!((&p + 0.0).ptr_eq(&p));
        assert!((0.0 + &p).ptr_eq(&p));
        assert!((&p * 1.0).ptr_eq(&p));
        assert!((&p / 1.0).ptr_eq(&p));
        assert!((&p * 0.0).is_constant());
        assert_relative_eq!((0.0 - &p).value(), -4.0);
    }

    #[test]
    fn elementary_functions_evaluate() {
        let p = Variable::parameter(0.5);
        assert_relative_eq!(p.sin().value(), 0.5_f64.sin());
        assert_relative_eq!(p.cos().value(), 0.5_f64.cos());
        assert_relative_eq!(p.exp().value(), 0.5_f64.exp());
        assert_relative_eq!(p.ln().value(), 0.5_f64.ln());
        assert_relative_eq!(p.sqrt().value(), 0.5_f64.sqrt());
        assert_relative_eq!(p.powi(3).value(), 0.125);
        assert_relative_eq!((-&p).value(), -0.5);
    }

    #[test]
    fn compound_assignment_builds_sums() {
        let p = Variable::parameter(2.0);
        let mut total = Variable::constant(0.0);
        for _ in 0..4 {
            total += &p;
        }
        total *= 0.5;
        assert_relative_eq!(total.value(), 4.0);
    }

    #[test]
    fn only_leaves_with_values_can_be_assigned() {
        assert_eq!(
            Variable::constant(1.0).set_value(2.0),
            Err(AssignError::Constant)
        );

        let expr = Variable::parameter(1.0) + Variable::parameter(2.0);
        assert_eq!(expr.set_value(0.0), Err(AssignError::Expression));
    }

    #[test]
    fn detects_decision_dependence() {
        let p = Variable::parameter(1.0);
        let d = Variable::decision(0.0);

        assert!(!(&p * 2.0 + p.sin()).contains_decision());
        assert!((&p * &d).contains_decision());
        assert!(d.contains_decision());
        assert_eq!(d.id(), d.clone().id());
        assert_ne!(d.id(), p.id());
    }

    #[test]
    fn deep_chains_evaluate_and_drop() {
        let p = Variable::parameter(1.0);
        let mut x = p.clone();
        for _ in 0..50_000 {
            x = &x * 1.000_001 + 0.0 * &p + &p - &p;
        }
        assert!(x.value().is_finite());
        drop(x);
    }
}
