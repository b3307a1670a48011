//! Fixed-step integrators for explicit ODEs.
//!
//! Integrators in this module work on any state type that implements
//! [`StepIntegrable`](tether_core::StepIntegrable), so the same code advances
//! plain numbers during simulation and symbolic
//! [`VariableMatrix`](tether_core::VariableMatrix) states during transcription.
//!
//! # Integrators
//!
//! - [`rk4`]: classical four-stage Runge-Kutta with a zero-order-hold input

pub mod rk4;
