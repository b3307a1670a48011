//! Core types for the Tether trajectory optimization framework.
//!
//! This crate defines the symbolic layer that transcription strategies and
//! solvers build on:
//!
//! - [`Variable`]: a scalar node in an expression graph (constant, parameter,
//!   decision variable, or an operation over other nodes)
//! - [`VariableMatrix`]: a dense 2-D matrix of [`Variable`]s with the matrix
//!   arithmetic trajectories need
//! - [`Constraint`] / [`Constraints`]: element-wise equality and inequality
//!   relations built from expressions
//! - [`Problem`]: owns decision variables, constraints, and the objective
//! - [`Tape`]: a flattened expression graph for fast evaluation and
//!   reverse-mode gradients
//! - [`Observer`]: receives solver events and optionally returns control actions
//! - [`StepIntegrable`]: types that can be advanced by a derivative and a step

mod constraint;
mod error;
mod matrix;
mod observer;
mod problem;
mod step;
mod tape;
mod variable;

pub use constraint::{Constraint, Constraints, Operand, Relation};
pub use error::AssignError;
pub use matrix::VariableMatrix;
pub use observer::Observer;
pub use problem::{Objective, Problem, Sense};
pub use step::{DerivativeOf, StepIntegrable};
pub use tape::Tape;
pub use variable::{Kind, NodeId, Variable};
