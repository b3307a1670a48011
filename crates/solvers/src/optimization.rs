//! Solvers for constrained nonlinear programs.
//!
//! A [`Problem`] records decision variables, equality and inequality
//! constraints, and an objective as expression graphs. Solvers in this module
//! read that structure, search for values of the decision variables, and
//! write the answer back into them.
//!
//! # Solvers
//!
//! - [`augmented_lagrangian`]: augmented Lagrangian method with a barrier
//!   Newton inner loop on exact sparse Hessians; handles simple bounds exactly
//!
//! [`Problem`]: tether_core::Problem

pub mod augmented_lagrangian;
