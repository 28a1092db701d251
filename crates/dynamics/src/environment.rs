use std::collections::HashMap;

use nalgebra::{Matrix3, UnitQuaternion, Vector3, Vector6};

use crate::{BodyId, BodyRegistry, Error, IntegratedStateType};

/// Body states and properties as seen by models at one evaluation time.
///
/// States being propagated are written into the environment before any
/// derivative is evaluated. Reads fall back to the body registry: translational
/// states to the body's ephemeris, masses to the body's default mass.
#[derive(Debug, Clone)]
pub struct Environment<'a> {
    registry: &'a BodyRegistry,
    time: f64,
    translational: HashMap<BodyId, Vector6<f64>>,
    rotational: HashMap<BodyId, (UnitQuaternion<f64>, Vector3<f64>)>,
    mass: HashMap<BodyId, f64>,
}

impl<'a> Environment<'a> {
    /// Creates an environment with no propagated states.
    #[must_use]
    pub fn new(registry: &'a BodyRegistry, time: f64) -> Self {
        Self {
            registry,
            time,
            translational: HashMap::new(),
            rotational: HashMap::new(),
            mass: HashMap::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &'a BodyRegistry {
        self.registry
    }

    /// Returns the evaluation time in seconds.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_translational_state(&mut self, body: BodyId, state: Vector6<f64>) {
        self.translational.insert(body, state);
    }

    /// Sets the attitude (body to inertial) and body-frame angular velocity.
    pub fn set_rotational_state(
        &mut self,
        body: BodyId,
        attitude: UnitQuaternion<f64>,
        angular_velocity: Vector3<f64>,
    ) {
        self.rotational.insert(body, (attitude, angular_velocity));
    }

    pub fn set_mass(&mut self, body: BodyId, mass: f64) {
        self.mass.insert(body, mass);
    }

    /// Returns a body's Cartesian state.
    ///
    /// # Errors
    ///
    /// Fails if the state is neither propagated nor available from an
    /// ephemeris, or if the ephemeris lookup fails.
    pub fn translational_state(&self, body: BodyId) -> Result<Vector6<f64>, Error> {
        if let Some(state) = self.translational.get(&body) {
            return Ok(*state);
        }
        match self.registry.get(body).ephemeris() {
            Some(ephemeris) => Ok(ephemeris.state_at(self.time)?),
            None => Err(self.missing_state(body, IntegratedStateType::Translational)),
        }
    }

    /// Returns a body's position.
    ///
    /// # Errors
    ///
    /// See [`Environment::translational_state`].
    pub fn position(&self, body: BodyId) -> Result<Vector3<f64>, Error> {
        Ok(self.translational_state(body)?.fixed_rows::<3>(0).into_owned())
    }

    /// Returns a body's attitude and body-frame angular velocity.
    ///
    /// # Errors
    ///
    /// Fails if the body's rotational state is not being propagated.
    pub fn rotational_state(
        &self,
        body: BodyId,
    ) -> Result<(UnitQuaternion<f64>, Vector3<f64>), Error> {
        self.rotational
            .get(&body)
            .copied()
            .ok_or_else(|| self.missing_state(body, IntegratedStateType::Rotational))
    }

    /// Returns a body's current mass.
    ///
    /// # Errors
    ///
    /// Fails if the mass is neither propagated nor set on the body.
    pub fn mass(&self, body: BodyId) -> Result<f64, Error> {
        self.mass
            .get(&body)
            .copied()
            .or_else(|| self.registry.get(body).mass())
            .ok_or_else(|| self.missing_property(body, "mass"))
    }

    /// Returns a body's gravitational parameter.
    ///
    /// # Errors
    ///
    /// Fails if the body has no gravitational parameter.
    pub fn gravitational_parameter(&self, body: BodyId) -> Result<f64, Error> {
        self.registry
            .get(body)
            .gravitational_parameter()
            .ok_or_else(|| self.missing_property(body, "gravitational parameter"))
    }

    /// Returns a body's inertia tensor.
    ///
    /// # Errors
    ///
    /// Fails if the body has no inertia tensor.
    pub fn inertia(&self, body: BodyId) -> Result<Matrix3<f64>, Error> {
        self.registry
            .get(body)
            .inertia()
            .copied()
            .ok_or_else(|| self.missing_property(body, "inertia tensor"))
    }

    fn missing_state(&self, body: BodyId, kind: IntegratedStateType) -> Error {
        Error::MissingState {
            body: self.registry.name(body).to_owned(),
            kind,
        }
    }

    fn missing_property(&self, body: BodyId, property: &'static str) -> Error {
        Error::MissingProperty {
            body: self.registry.name(body).to_owned(),
            property,
        }
    }
}
