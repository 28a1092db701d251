use thiserror::Error;

/// Configuration for [`IterativeLightTime`](super::IterativeLightTime).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    tolerance: f64,
    max_iterations: usize,
}

/// Errors that can occur when validating a light-time config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tolerance must be finite and positive")]
    Tolerance,

    #[error("max_iterations must be at least 1")]
    MaxIterations,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(1e-12, 50).unwrap()
    }
}

impl Config {
    /// Creates a config that stops iterating once the light time changes by
    /// at most `tolerance` seconds between iterations.
    ///
    /// # Errors
    ///
    /// Returns an error if `tolerance` is not finite and positive or if
    /// `max_iterations` is zero.
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self, ConfigError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ConfigError::Tolerance);
        }
        if max_iterations == 0 {
            return Err(ConfigError::MaxIterations);
        }

        Ok(Self {
            tolerance,
            max_iterations,
        })
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_values() {
        assert_eq!(Config::new(0.0, 10), Err(ConfigError::Tolerance));
        assert_eq!(Config::new(f64::NAN, 10), Err(ConfigError::Tolerance));
        assert_eq!(Config::new(1e-9, 0), Err(ConfigError::MaxIterations));
        assert!(Config::new(1e-9, 1).is_ok());
    }
}
