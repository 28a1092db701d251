use std::sync::Arc;

use nalgebra::{Unit, Vector3};
use uom::si::force::newton;

use crate::{BodyId, Environment, Error, models::Engine, partials::StateDerivativePartial};

/// An acceleration acting on a body, in the inertial frame.
pub trait AccelerationModel: Send + Sync {
    /// Returns the acceleration of `body` in meters per second squared.
    ///
    /// # Errors
    ///
    /// Returns an error if a required state or property is unavailable.
    fn acceleration(&self, env: &Environment<'_>, body: BodyId) -> Result<Vector3<f64>, Error>;

    /// Returns the model's partial derivatives, if it provides them.
    fn partial(&self) -> Option<&dyn StateDerivativePartial> {
        None
    }
}

/// Newtonian point-mass attraction of one body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointMassGravity {
    exerting: BodyId,
}

impl PointMassGravity {
    #[must_use]
    pub fn new(exerting: BodyId) -> Self {
        Self { exerting }
    }

    #[must_use]
    pub fn exerting(&self) -> BodyId {
        self.exerting
    }

    /// Position of `body` relative to the exerting body.
    pub(crate) fn relative_position(
        &self,
        env: &Environment<'_>,
        body: BodyId,
    ) -> Result<Vector3<f64>, Error> {
        Ok(env.position(body)? - env.position(self.exerting)?)
    }
}

impl AccelerationModel for PointMassGravity {
    fn acceleration(&self, env: &Environment<'_>, body: BodyId) -> Result<Vector3<f64>, Error> {
        let mu = env.gravitational_parameter(self.exerting)?;
        let r = self.relative_position(env, body)?;
        let distance = r.norm();
        Ok(-mu / (distance * distance * distance) * r)
    }

    fn partial(&self) -> Option<&dyn StateDerivativePartial> {
        Some(self)
    }
}

/// Thrust of a set of engines along a fixed inertial direction.
#[derive(Clone)]
pub struct ThrustAcceleration {
    engines: Vec<Arc<dyn Engine>>,
    direction: Unit<Vector3<f64>>,
}

impl ThrustAcceleration {
    pub fn new(engines: Vec<Arc<dyn Engine>>, direction: Unit<Vector3<f64>>) -> Self {
        Self { engines, direction }
    }

    #[must_use]
    pub fn engines(&self) -> &[Arc<dyn Engine>] {
        &self.engines
    }

    #[must_use]
    pub fn direction(&self) -> &Unit<Vector3<f64>> {
        &self.direction
    }

    /// Total thrust in newtons.
    pub(crate) fn total_thrust(&self, env: &Environment<'_>) -> f64 {
        self.engines
            .iter()
            .map(|engine| engine.thrust(env).get::<newton>())
            .sum()
    }
}

impl AccelerationModel for ThrustAcceleration {
    fn acceleration(&self, env: &Environment<'_>, body: BodyId) -> Result<Vector3<f64>, Error> {
        let mass = env.mass(body)?;
        Ok(self.direction.into_inner() * (self.total_thrust(env) / mass))
    }

    fn partial(&self) -> Option<&dyn StateDerivativePartial> {
        Some(self)
    }
}
