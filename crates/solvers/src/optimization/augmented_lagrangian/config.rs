use std::time::Duration;

use thiserror::Error;

/// Configuration for the augmented Lagrangian solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    tolerance: f64,
    max_iters: usize,
    timeout: Option<Duration>,
    diagnostics: bool,
}

/// Errors that can occur when validating an augmented Lagrangian config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tolerance must be finite and positive")]
    Tolerance,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(1e-6, 500).unwrap()
    }
}

impl Config {
    /// Creates a new config with no timeout and diagnostics off.
    ///
    /// The solver reports convergence once both the constraint violation and
    /// the projected gradient norm of the merit function are within
    /// `tolerance`. `max_iters` bounds the total number of inner iterations.
    ///
    /// # Errors
    ///
    /// Returns an error if `tolerance` is not finite and positive.
    pub fn new(tolerance: f64, max_iters: usize) -> Result<Self, ConfigError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ConfigError::Tolerance);
        }

        Ok(Self {
            tolerance,
            max_iters,
            timeout: None,
            diagnostics: false,
        })
    }

    /// Limits the wall-clock time of a solve.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    /// Prints one row per outer iteration to stderr when enabled.
    #[must_use]
    pub fn with_diagnostics(self, diagnostics: bool) -> Self {
        Self {
            diagnostics,
            ..self
        }
    }

    /// Returns the convergence tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns the maximum number of inner iterations.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the wall-clock limit, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns whether the iteration table is printed.
    #[must_use]
    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();

        assert_eq!(config.tolerance(), 1e-6);
        assert_eq!(config.max_iters(), 500);
        assert_eq!(config.timeout(), None);
        assert!(!config.diagnostics());
    }

    #[test]
    fn rejects_bad_tolerance() {
        for tolerance in [0.0, -1e-3, f64::NAN, f64::INFINITY] {
            assert_eq!(Config::new(tolerance, 10), Err(ConfigError::Tolerance));
        }
    }

    #[test]
    fn builders_set_options() {
        let config = Config::default()
            .with_timeout(Duration::from_secs(2))
            .with_diagnostics(true);

        assert_eq!(config.timeout(), Some(Duration::from_secs(2)));
        assert!(config.diagnostics());
    }
}
