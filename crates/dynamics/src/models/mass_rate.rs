use std::fmt;
use std::sync::Arc;

use uom::si::mass_rate::kilogram_per_second;

use crate::{Environment, models::Engine, partials::MassRatePartial};

/// Rate of change of a body's mass.
#[derive(Clone)]
pub enum MassRateModel {
    /// Propellant consumption of the body's engines, `ṁ = −Σ F / (Isp g0)`.
    FromThrust(Vec<Arc<dyn Engine>>),

    /// A user function of time, in kilograms per second.
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl MassRateModel {
    pub fn from_thrust(engines: Vec<Arc<dyn Engine>>) -> Self {
        Self::FromThrust(engines)
    }

    pub fn custom(rate: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(rate))
    }

    /// Returns `dm/dt` in kilograms per second.
    #[must_use]
    pub fn mass_rate(&self, env: &Environment<'_>) -> f64 {
        match self {
            Self::FromThrust(engines) => -engines
                .iter()
                .map(|engine| engine.mass_rate(env).get::<kilogram_per_second>())
                .sum::<f64>(),
            Self::Custom(rate) => rate(env.time()),
        }
    }

    /// Returns the partial derivatives of the mass rate, if available.
    #[must_use]
    pub fn partial(&self) -> Option<MassRatePartial<'_>> {
        match self {
            Self::FromThrust(engines) => Some(MassRatePartial::new(engines)),
            Self::Custom(_) => None,
        }
    }
}

impl fmt::Debug for MassRateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromThrust(engines) => f
                .debug_tuple("FromThrust")
                .field(&engines.iter().map(|e| e.name()).collect::<Vec<_>>())
                .finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}
