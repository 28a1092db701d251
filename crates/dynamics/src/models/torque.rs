use nalgebra::Vector3;

use crate::{BodyId, Environment, Error};

/// A torque acting on a body, expressed in the body frame.
pub trait TorqueModel: Send + Sync {
    /// Returns the torque on `body` in newton meters.
    ///
    /// # Errors
    ///
    /// Returns an error if a required state or property is unavailable.
    fn torque(&self, env: &Environment<'_>, body: BodyId) -> Result<Vector3<f64>, Error>;
}

/// A torque that is fixed in the body frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantTorque(pub Vector3<f64>);

impl TorqueModel for ConstantTorque {
    fn torque(&self, _env: &Environment<'_>, _body: BodyId) -> Result<Vector3<f64>, Error> {
        Ok(self.0)
    }
}
