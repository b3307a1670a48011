//! Fixed-step optimal control for the Tether framework.
//!
//! A [`FixedStepOcp`] turns a continuous- or discrete-time dynamics model, a
//! time step, and a horizon into a nonlinear program over the state trajectory
//! `X` (`n_x × (N+1)`) and input trajectory `U` (`n_u × (N+1)`). The
//! [`TranscriptionMethod`] chosen at construction decides how consecutive
//! states are tied together:
//!
//! - [`DirectTranscription`](TranscriptionMethod::DirectTranscription): one
//!   RK4 (or discrete) defect constraint per step
//! - [`DirectCollocation`](TranscriptionMethod::DirectCollocation): a
//!   Hermite–Simpson midpoint defect per step
//! - [`SingleShooting`](TranscriptionMethod::SingleShooting): states are
//!   expressions of the inputs, with no state decision variables
//!
//! After construction, boundary and path constraints and an objective are
//! added, and the underlying [`Problem`](tether_core::Problem) is handed to a
//! solver.

mod config;
mod dynamics;
mod error;
mod ocp;

pub mod transcription;

pub use config::{Config, ConfigError, FinalInput};
pub use dynamics::{Dynamics, DynamicsType};
pub use error::Error;
pub use ocp::FixedStepOcp;
pub use transcription::TranscriptionMethod;
