use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use nalgebra::Matrix3;
use skein_core::Ephemeris;

use crate::Error;

/// Index of a body in a [`BodyRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(usize);

impl BodyId {
    /// Returns the registry index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Static properties of a body.
///
/// Every property is optional; models report [`Error::MissingProperty`]
/// when they need one that is not set. States of bodies that are not being
/// propagated come from the ephemeris.
#[derive(Clone)]
pub struct Body {
    name: String,
    gravitational_parameter: Option<f64>,
    mass: Option<f64>,
    inertia: Option<Matrix3<f64>>,
    ephemeris: Option<Arc<dyn Ephemeris>>,
}

impl Body {
    /// Creates a body with no properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gravitational_parameter: None,
            mass: None,
            inertia: None,
            ephemeris: None,
        }
    }

    /// Sets the gravitational parameter, in m³/s².
    #[must_use]
    pub fn with_gravitational_parameter(mut self, mu: f64) -> Self {
        self.gravitational_parameter = Some(mu);
        self
    }

    /// Sets the default mass, in kg.
    #[must_use]
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Sets the body-frame inertia tensor, in kg m².
    #[must_use]
    pub fn with_inertia(mut self, inertia: Matrix3<f64>) -> Self {
        self.inertia = Some(inertia);
        self
    }

    /// Sets the ephemeris used when the body's translational state is not propagated.
    #[must_use]
    pub fn with_ephemeris(mut self, ephemeris: impl Ephemeris + 'static) -> Self {
        self.ephemeris = Some(Arc::new(ephemeris));
        self
    }

    /// Replaces the gravitational parameter.
    pub fn set_gravitational_parameter(&mut self, mu: f64) {
        self.gravitational_parameter = Some(mu);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn gravitational_parameter(&self) -> Option<f64> {
        self.gravitational_parameter
    }

    #[must_use]
    pub fn mass(&self) -> Option<f64> {
        self.mass
    }

    #[must_use]
    pub fn inertia(&self) -> Option<&Matrix3<f64>> {
        self.inertia.as_ref()
    }

    #[must_use]
    pub fn ephemeris(&self) -> Option<&Arc<dyn Ephemeris>> {
        self.ephemeris.as_ref()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("name", &self.name)
            .field("gravitational_parameter", &self.gravitational_parameter)
            .field("mass", &self.mass)
            .field("inertia", &self.inertia)
            .field("ephemeris", &self.ephemeris.is_some())
            .finish()
    }
}

/// Registry of all bodies in a scenario, looked up by [`BodyId`] or name.
#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    bodies: Vec<Body>,
    by_name: HashMap<String, BodyId>,
}

impl BodyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a body and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBody`] if a body with the same name exists.
    pub fn add(&mut self, body: Body) -> Result<BodyId, Error> {
        if self.by_name.contains_key(body.name()) {
            return Err(Error::DuplicateBody(body.name().to_owned()));
        }
        let id = BodyId(self.bodies.len());
        self.by_name.insert(body.name().to_owned(), id);
        self.bodies.push(body);
        Ok(id)
    }

    /// Looks up a body id by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownBody`] if no body has that name.
    pub fn id(&self, name: &str) -> Result<BodyId, Error> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownBody(name.to_owned()))
    }

    /// Returns the body with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id was issued by a different registry.
    #[must_use]
    pub fn get(&self, id: BodyId) -> &Body {
        &self.bodies[id.0]
    }

    /// Returns a mutable reference to a body, for changing its properties.
    pub fn get_mut(&mut self, id: BodyId) -> &mut Body {
        &mut self.bodies[id.0]
    }

    /// Returns the name of a body.
    #[must_use]
    pub fn name(&self, id: BodyId) -> &str {
        self.get(id).name()
    }

    /// Returns the number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
