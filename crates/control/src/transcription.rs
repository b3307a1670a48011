//! Strategies that tie consecutive states of a trajectory together.
//!
//! Each strategy walks the steps `k = 0..N` once, at construction, and either
//! emits defect constraints into the [`Problem`] or substitutes expressions
//! into the state trajectory.

pub mod direct_collocation;
pub mod direct_transcription;
pub mod single_shooting;

use tether_core::{Problem, VariableMatrix};
use tether_solvers::transient::rk4;

use crate::{Config, Dynamics, DynamicsType, Error, dynamics::evaluate};

/// How the dynamics are imposed on the state trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TranscriptionMethod {
    /// States and inputs are decision variables, linked by one equality per
    /// step between the next state and one integrator (or discrete) step.
    DirectTranscription,

    /// States and inputs are decision variables, linked by one
    /// Hermite–Simpson midpoint defect per step. Requires
    /// [`DynamicsType::ExplicitOde`].
    DirectCollocation,

    /// Only inputs are decision variables. Each state is the expression
    /// obtained by stepping the previous one.
    SingleShooting,
}

impl TranscriptionMethod {
    /// Returns `true` if states are decision variables.
    #[must_use]
    pub fn has_state_variables(self) -> bool {
        !matches!(self, Self::SingleShooting)
    }

    /// Checks that the method can be used with `dynamics_type`.
    pub(crate) fn check(self, dynamics_type: DynamicsType) -> Result<(), Error> {
        match (self, dynamics_type) {
            (Self::DirectCollocation, DynamicsType::Discrete) => Err(Error::CollocationRequiresOde),
            _ => Ok(()),
        }
    }

    /// Imposes the dynamics on steps `0..N`.
    pub(crate) fn transcribe<D: Dynamics>(
        self,
        problem: &mut Problem,
        x: &mut VariableMatrix,
        u: &VariableMatrix,
        dynamics: &D,
        dynamics_type: DynamicsType,
        config: &Config,
    ) -> Result<(), Error> {
        match self {
            Self::DirectTranscription => {
                direct_transcription::transcribe(problem, x, u, dynamics, dynamics_type, config)
            }
            Self::DirectCollocation => {
                direct_collocation::transcribe(problem, x, u, dynamics, config)
            }
            Self::SingleShooting => {
                single_shooting::transcribe(x, u, dynamics, dynamics_type, config)
            }
        }
    }
}

/// Returns the state one step after `x`: an RK4 step for explicit ODEs or a
/// direct evaluation for discrete models.
fn next_state<D: Dynamics>(
    dynamics: &D,
    dynamics_type: DynamicsType,
    t: f64,
    x: &VariableMatrix,
    u: &VariableMatrix,
    dt: f64,
) -> Result<VariableMatrix, Error> {
    match dynamics_type {
        DynamicsType::ExplicitOde => rk4::step(
            |t, x: &VariableMatrix, u: &VariableMatrix| evaluate(dynamics, t, x, u),
            x,
            u,
            t,
            dt,
        ),
        DynamicsType::Discrete => evaluate(dynamics, t, x, u),
    }
}
