//! Shared scenarios for the end-to-end tests under `tests/`.

use std::sync::Arc;

use nalgebra::{DVector, Matrix3, Vector3, dvector};
use skein_core::ConstantEphemeris;
use skein_dynamics::{
    Body, BodyId, BodyRegistry, StateDerivativeComposer, TranslationalDynamics,
    models::{AccelerationModel, PointMassGravity},
};

pub const EARTH_GM: f64 = 3.986_004_418e14;
pub const EARTH_RADIUS: f64 = 6.378_137e6;

/// A registry with a fixed Earth and one spacecraft.
///
/// Returns the registry with the ids of Earth and the spacecraft.
#[must_use]
pub fn earth_and_spacecraft(mass: f64, inertia: Matrix3<f64>) -> (BodyRegistry, BodyId, BodyId) {
    let mut registry = BodyRegistry::new();
    let earth = registry
        .add(
            Body::new("Earth")
                .with_gravitational_parameter(EARTH_GM)
                .with_ephemeris(ConstantEphemeris::at_rest(0.0, 0.0, 0.0)),
        )
        .expect("registry starts empty");
    let spacecraft = registry
        .add(Body::new("Spacecraft").with_mass(mass).with_inertia(inertia))
        .expect("names are unique");
    (registry, earth, spacecraft)
}

/// Point-mass Earth gravity acting on the spacecraft.
#[must_use]
pub fn two_body() -> StateDerivativeComposer {
    let (registry, earth, spacecraft) = earth_and_spacecraft(500.0, Matrix3::identity());
    let accelerations: Vec<Box<dyn AccelerationModel>> = vec![Box::new(PointMassGravity::new(earth))];
    StateDerivativeComposer::new(
        Arc::new(registry),
        vec![TranslationalDynamics::new().with_body(spacecraft, accelerations).into()],
    )
}

/// Cartesian state of a circular orbit of the given radius and inclination,
/// starting on the ascending node.
#[must_use]
pub fn circular_orbit(radius: f64, inclination_degrees: f64) -> DVector<f64> {
    let speed = (EARTH_GM / radius).sqrt();
    let inclination = inclination_degrees.to_radians();
    dvector![
        radius,
        0.0,
        0.0,
        0.0,
        speed * inclination.cos(),
        speed * inclination.sin()
    ]
}

/// A ground station on the Earth's surface in the direction of `direction`.
#[must_use]
pub fn station(direction: Vector3<f64>) -> ConstantEphemeris {
    let position = direction.normalize() * EARTH_RADIUS;
    ConstantEphemeris::at_rest(position.x, position.y, position.z)
}
