use thiserror::Error;

/// How the final input column `U[:,N]` is treated.
///
/// Transcription only consumes inputs `U[:,0..N]`. The extra column exists so
/// path constraints have an input to pair with the final state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FinalInput {
    /// Left free; only path constraints and the objective act on it.
    #[default]
    Free,

    /// Constrained to equal `U[:,N-1]`.
    HoldLast,
}

/// Dimensions and time grid of a fixed-step optimal control problem.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Fields"))]
pub struct Config {
    num_states: usize,
    num_inputs: usize,
    dt: f64,
    num_steps: usize,
    final_input: FinalInput,
}

/// Errors that can occur when validating an optimal control config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("num_states must be positive")]
    NumStates,

    #[error("num_inputs must be positive")]
    NumInputs,

    #[error("dt must be finite and positive")]
    TimeStep,

    #[error("num_steps must be positive")]
    NumSteps,
}

impl Config {
    /// Creates a new config with a free final input.
    ///
    /// # Errors
    ///
    /// Returns an error if any count is zero or `dt` is not finite and positive.
    pub fn new(
        num_states: usize,
        num_inputs: usize,
        dt: f64,
        num_steps: usize,
    ) -> Result<Self, ConfigError> {
        if num_states == 0 {
            return Err(ConfigError::NumStates);
        }
        if num_inputs == 0 {
            return Err(ConfigError::NumInputs);
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::TimeStep);
        }
        if num_steps == 0 {
            return Err(ConfigError::NumSteps);
        }

        Ok(Self {
            num_states,
            num_inputs,
            dt,
            num_steps,
            final_input: FinalInput::Free,
        })
    }

    /// Sets the final input policy.
    #[must_use]
    pub fn with_final_input(self, final_input: FinalInput) -> Self {
        Self {
            final_input,
            ..self
        }
    }

    #[must_use]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Returns the step duration in seconds.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[must_use]
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    #[must_use]
    pub fn final_input(&self) -> FinalInput {
        self.final_input
    }

    /// Returns the time of node `k`, `k · dt`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time(&self, k: usize) -> f64 {
        k as f64 * self.dt
    }
}

/// Unvalidated mirror of [`Config`] for deserialization.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct Fields {
    num_states: usize,
    num_inputs: usize,
    dt: f64,
    num_steps: usize,
    #[serde(default)]
    final_input: FinalInput,
}

#[cfg(feature = "serde")]
impl TryFrom<Fields> for Config {
    type Error = ConfigError;

    fn try_from(fields: Fields) -> Result<Self, Self::Error> {
        Ok(
            Config::new(fields.num_states, fields.num_inputs, fields.dt, fields.num_steps)?
                .with_final_input(fields.final_input),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_dimensions_and_step() {
        assert_eq!(Config::new(0, 1, 0.1, 10), Err(ConfigError::NumStates));
        assert_eq!(Config::new(1, 0, 0.1, 10), Err(ConfigError::NumInputs));
        assert_eq!(Config::new(1, 1, 0.0, 10), Err(ConfigError::TimeStep));
        assert_eq!(Config::new(1, 1, -0.1, 10), Err(ConfigError::TimeStep));
        assert_eq!(Config::new(1, 1, f64::NAN, 10), Err(ConfigError::TimeStep));
        assert_eq!(Config::new(1, 1, 0.1, 0), Err(ConfigError::NumSteps));
    }

    #[test]
    fn node_times_are_multiples_of_dt() {
        let config = Config::new(2, 1, 0.25, 4).unwrap();

        assert_eq!(config.time(0), 0.0);
        assert_eq!(config.time(3), 0.75);
        assert_eq!(config.final_input(), FinalInput::Free);
    }
}
