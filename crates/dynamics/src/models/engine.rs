use skein_core::constants::STANDARD_GRAVITY;
use uom::si::{
    acceleration::meter_per_second_squared,
    f64::{Acceleration, Force, MassRate, Time},
};

use crate::Environment;

/// A propulsion device attached to a body.
///
/// Engines report thrust and specific impulse at the current environment.
/// The propellant mass rate defaults to `F / (Isp g0)`.
pub trait Engine: Send + Sync {
    /// Name used to key thrust parameters, unique per body.
    fn name(&self) -> &str;

    fn thrust(&self, env: &Environment<'_>) -> Force;

    fn specific_impulse(&self, env: &Environment<'_>) -> Time;

    /// Returns the propellant consumption as a positive mass rate.
    fn mass_rate(&self, env: &Environment<'_>) -> MassRate {
        let g0 = Acceleration::new::<meter_per_second_squared>(STANDARD_GRAVITY);
        self.thrust(env) / (self.specific_impulse(env) * g0)
    }
}

/// An engine with fixed thrust magnitude and specific impulse.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantThrustEngine {
    name: String,
    thrust: Force,
    specific_impulse: Time,
}

impl ConstantThrustEngine {
    pub fn new(name: impl Into<String>, thrust: Force, specific_impulse: Time) -> Self {
        Self {
            name: name.into(),
            thrust,
            specific_impulse,
        }
    }
}

impl Engine for ConstantThrustEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn thrust(&self, _env: &Environment<'_>) -> Force {
        self.thrust
    }

    fn specific_impulse(&self, _env: &Environment<'_>) -> Time {
        self.specific_impulse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{force::newton, mass_rate::kilogram_per_second, time::second};

    use crate::BodyRegistry;

    #[test]
    fn mass_rate_from_thrust_and_specific_impulse() {
        let registry = BodyRegistry::new();
        let env = Environment::new(&registry, 0.0);
        let engine = ConstantThrustEngine::new(
            "main",
            Force::new::<newton>(400.0),
            Time::new::<second>(320.0),
        );

        assert_eq!(engine.name(), "main");
        assert_relative_eq!(
            engine.mass_rate(&env).get::<kilogram_per_second>(),
            400.0 / (320.0 * STANDARD_GRAVITY),
            max_relative = 1e-15
        );
    }
}
