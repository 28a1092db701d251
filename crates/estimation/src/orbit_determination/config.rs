use skein_solvers::transient::runge_kutta::{self, CoefficientSet, Tolerances};
use thiserror::Error;

use crate::light_time;

/// Configuration for the [`OrbitDeterminationManager`](super::OrbitDeterminationManager).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    integrator: runge_kutta::Config,
    coefficient_set: CoefficientSet,
    initial_step: f64,
    max_iterations: usize,
    convergence_tolerance: f64,
    range_sigma: f64,
    light_time: light_time::Config,
    light_time_margin: f64,
}

/// Errors that can occur when validating an orbit determination config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("initial_step must be finite and positive")]
    InitialStep,

    #[error("max_iterations must be at least 1")]
    MaxIterations,

    #[error("convergence_tolerance must be in [0, 1)")]
    ConvergenceTolerance,

    #[error("range_sigma must be finite and positive")]
    RangeSigma,

    #[error("light_time_margin must be finite and non-negative")]
    LightTimeMargin,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        let integrator = runge_kutta::Config::new(
            Tolerances::Scalar {
                absolute: 1e-9,
                relative: 1e-12,
            },
            1e-3,
            60.0,
        )
        .unwrap();
        Self::new(integrator, CoefficientSet::RungeKuttaFehlberg78, 10.0).unwrap()
    }
}

impl Config {
    /// Creates a config that propagates with the given integrator settings.
    ///
    /// Estimation stops after 10 iterations or once an iteration improves
    /// the residual RMS by less than 0.1 %. Range observations are weighted
    /// with a 1 m standard deviation. Propagation reaches 10 s before the
    /// earliest reception, which covers any link shorter than about three
    /// million kilometers. Use [`Config::with_iterations`],
    /// [`Config::with_range_sigma`] and [`Config::with_light_time_margin`] to
    /// change these.
    ///
    /// # Errors
    ///
    /// Returns an error if `initial_step` is not finite and positive.
    pub fn new(
        integrator: runge_kutta::Config,
        coefficient_set: CoefficientSet,
        initial_step: f64,
    ) -> Result<Self, ConfigError> {
        if !initial_step.is_finite() || initial_step <= 0.0 {
            return Err(ConfigError::InitialStep);
        }

        Ok(Self {
            integrator,
            coefficient_set,
            initial_step,
            max_iterations: 10,
            convergence_tolerance: 1e-3,
            range_sigma: 1.0,
            light_time: light_time::Config::default(),
            light_time_margin: 10.0,
        })
    }

    /// Returns the config with a different iteration cap and convergence
    /// tolerance (relative RMS improvement).
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iterations` is zero or the tolerance is not
    /// in `[0, 1)`.
    pub fn with_iterations(
        self,
        max_iterations: usize,
        convergence_tolerance: f64,
    ) -> Result<Self, ConfigError> {
        if max_iterations == 0 {
            return Err(ConfigError::MaxIterations);
        }
        if !(0.0..1.0).contains(&convergence_tolerance) {
            return Err(ConfigError::ConvergenceTolerance);
        }

        Ok(Self {
            max_iterations,
            convergence_tolerance,
            ..self
        })
    }

    /// Returns the config with a different range observation standard
    /// deviation in meters.
    ///
    /// # Errors
    ///
    /// Returns an error if `range_sigma` is not finite and positive.
    pub fn with_range_sigma(self, range_sigma: f64) -> Result<Self, ConfigError> {
        if !range_sigma.is_finite() || range_sigma <= 0.0 {
            return Err(ConfigError::RangeSigma);
        }
        Ok(Self { range_sigma, ..self })
    }

    /// Returns the config with a different margin in seconds by which
    /// propagation extends before the earliest reception time, to reach the
    /// transmission times of the earliest observations.
    ///
    /// # Errors
    ///
    /// Returns an error if `margin` is negative or not finite.
    pub fn with_light_time_margin(self, margin: f64) -> Result<Self, ConfigError> {
        if !margin.is_finite() || margin < 0.0 {
            return Err(ConfigError::LightTimeMargin);
        }
        Ok(Self {
            light_time_margin: margin,
            ..self
        })
    }

    #[must_use]
    pub fn with_light_time(self, light_time: light_time::Config) -> Self {
        Self { light_time, ..self }
    }

    #[must_use]
    pub fn integrator(&self) -> &runge_kutta::Config {
        &self.integrator
    }

    #[must_use]
    pub fn coefficient_set(&self) -> CoefficientSet {
        self.coefficient_set
    }

    #[must_use]
    pub fn initial_step(&self) -> f64 {
        self.initial_step
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    #[must_use]
    pub fn convergence_tolerance(&self) -> f64 {
        self.convergence_tolerance
    }

    #[must_use]
    pub fn range_sigma(&self) -> f64 {
        self.range_sigma
    }

    #[must_use]
    pub fn light_time(&self) -> light_time::Config {
        self.light_time
    }

    #[must_use]
    pub fn light_time_margin(&self) -> f64 {
        self.light_time_margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_values() {
        let integrator = runge_kutta::Config::default();
        let set = CoefficientSet::RungeKuttaFehlberg78;

        assert_eq!(
            Config::new(integrator.clone(), set, 0.0),
            Err(ConfigError::InitialStep)
        );

        let config = Config::new(integrator, set, 1.0).unwrap();
        assert_eq!(
            config.clone().with_iterations(0, 1e-3),
            Err(ConfigError::MaxIterations)
        );
        assert_eq!(
            config.clone().with_iterations(5, 1.0),
            Err(ConfigError::ConvergenceTolerance)
        );
        assert_eq!(
            config.clone().with_range_sigma(-1.0),
            Err(ConfigError::RangeSigma)
        );
        assert_eq!(
            config.with_light_time_margin(f64::NAN),
            Err(ConfigError::LightTimeMargin)
        );
    }
}
