use nalgebra::DVector;
use thiserror::Error;

/// Absolute and relative error tolerances.
///
/// A component's local error passes when
/// `|err_i| <= absolute_i + relative_i * max(|y_i|, |y_new_i|)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tolerances {
    /// The same tolerances for every state component.
    Scalar { absolute: f64, relative: f64 },

    /// One absolute and one relative tolerance per state component.
    PerComponent {
        absolute: DVector<f64>,
        relative: DVector<f64>,
    },
}

impl Tolerances {
    /// Returns the `(absolute, relative)` tolerance of component `i`.
    #[must_use]
    pub fn component(&self, i: usize) -> (f64, f64) {
        match self {
            Self::Scalar { absolute, relative } => (*absolute, *relative),
            Self::PerComponent { absolute, relative } => (absolute[i], relative[i]),
        }
    }

    /// Returns the number of components, or `None` for scalar tolerances.
    #[must_use]
    pub fn component_count(&self) -> Option<usize> {
        match self {
            Self::Scalar { .. } => None,
            Self::PerComponent { absolute, .. } => Some(absolute.len()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let valid = |abs: f64, rel: f64| {
            abs.is_finite() && rel.is_finite() && abs >= 0.0 && rel >= 0.0 && abs + rel > 0.0
        };

        match self {
            Self::Scalar { absolute, relative } => {
                if !valid(*absolute, *relative) {
                    return Err(ConfigError::Tolerance);
                }
            }
            Self::PerComponent { absolute, relative } => {
                if absolute.len() != relative.len() {
                    return Err(ConfigError::ToleranceLength {
                        absolute: absolute.len(),
                        relative: relative.len(),
                    });
                }
                if !absolute.iter().zip(relative.iter()).all(|(a, r)| valid(*a, *r)) {
                    return Err(ConfigError::Tolerance);
                }
            }
        }
        Ok(())
    }
}

/// Configuration for the variable-step Runge-Kutta solver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    tolerances: Tolerances,
    min_step: f64,
    max_step: f64,
    safety_factor: f64,
    min_factor: f64,
    max_factor: f64,
}

/// Errors that can occur when validating a Runge-Kutta solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tolerances must be finite, non-negative and not both zero")]
    Tolerance,

    #[error("absolute tolerances have {absolute} components but relative have {relative}")]
    ToleranceLength { absolute: usize, relative: usize },

    #[error("min_step must be finite and positive")]
    MinStep,

    #[error("max_step must be positive and at least min_step")]
    MaxStep,

    #[error("safety_factor must be in (0, 1]")]
    SafetyFactor,

    #[error("step factors must satisfy 0 < min_factor <= 1 <= max_factor")]
    StepFactors,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(
            Tolerances::Scalar {
                absolute: 1e-12,
                relative: 1e-12,
            },
            1e-6,
            f64::INFINITY,
        )
        .unwrap()
    }
}

impl Config {
    /// Creates a new config with validated tolerances and step bounds.
    ///
    /// Step control uses a safety factor of 0.8 and limits each change of the
    /// step size to the range `[0.1, 4.0]`. Use [`Config::with_step_control`]
    /// to change these.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is invalid or the step bounds are not
    /// `0 < min_step <= max_step`.
    pub fn new(tolerances: Tolerances, min_step: f64, max_step: f64) -> Result<Self, ConfigError> {
        tolerances.validate()?;
        if !min_step.is_finite() || min_step <= 0.0 {
            return Err(ConfigError::MinStep);
        }
        if max_step.is_nan() || max_step < min_step {
            return Err(ConfigError::MaxStep);
        }

        Ok(Self {
            tolerances,
            min_step,
            max_step,
            safety_factor: 0.8,
            min_factor: 0.1,
            max_factor: 4.0,
        })
    }

    /// Returns the config with different step-size control parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the safety factor is outside `(0, 1]` or the
    /// factors do not satisfy `0 < min_factor <= 1 <= max_factor`.
    pub fn with_step_control(
        self,
        safety_factor: f64,
        min_factor: f64,
        max_factor: f64,
    ) -> Result<Self, ConfigError> {
        if !(safety_factor > 0.0 && safety_factor <= 1.0) {
            return Err(ConfigError::SafetyFactor);
        }
        if !(min_factor > 0.0 && min_factor <= 1.0 && max_factor >= 1.0 && max_factor.is_finite())
        {
            return Err(ConfigError::StepFactors);
        }

        Ok(Self {
            safety_factor,
            min_factor,
            max_factor,
            ..self
        })
    }

    /// Returns the error tolerances.
    #[must_use]
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Returns the smallest allowed step magnitude.
    #[must_use]
    pub fn min_step(&self) -> f64 {
        self.min_step
    }

    /// Returns the largest allowed step magnitude.
    #[must_use]
    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// Returns the safety factor applied to the optimal step estimate.
    #[must_use]
    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    /// Returns the smallest factor a single step change may apply.
    #[must_use]
    pub fn min_factor(&self) -> f64 {
        self.min_factor
    }

    /// Returns the largest factor a single step change may apply.
    #[must_use]
    pub fn max_factor(&self) -> f64 {
        self.max_factor
    }

    /// Clamps a step size to `[min_step, max_step]` in magnitude, keeping its sign.
    pub(super) fn clamp_step(&self, step_size: f64) -> f64 {
        step_size.signum() * step_size.abs().clamp(self.min_step, self.max_step)
    }
}
