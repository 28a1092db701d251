use nalgebra::{DVector, Vector3, Vector6};

use crate::{
    BodyId, Environment, Error, IntegratedStateType, SingleStateDerivative,
    models::AccelerationModel,
};

/// Cowell propagation of Cartesian states.
///
/// Each body contributes `[x, y, z, vx, vy, vz]` and the derivative is
/// `[v, Σ a]` over the body's acceleration models.
#[derive(Default)]
pub struct TranslationalDynamics {
    bodies: Vec<BodyId>,
    accelerations: Vec<Vec<Box<dyn AccelerationModel>>>,
}

impl TranslationalDynamics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a propagated body with the accelerations acting on it.
    #[must_use]
    pub fn with_body(mut self, body: BodyId, accelerations: Vec<Box<dyn AccelerationModel>>) -> Self {
        self.bodies.push(body);
        self.accelerations.push(accelerations);
        self
    }

    /// Returns the acceleration models of the body at `index` in block order.
    #[must_use]
    pub fn accelerations(&self, index: usize) -> &[Box<dyn AccelerationModel>] {
        &self.accelerations[index]
    }

    /// Sums the accelerations acting on the body at `index`.
    ///
    /// # Errors
    ///
    /// Returns the first error from an acceleration model.
    pub fn total_acceleration(&self, env: &Environment<'_>, index: usize) -> Result<Vector3<f64>, Error> {
        let body = self.bodies[index];
        self.accelerations[index]
            .iter()
            .try_fold(Vector3::zeros(), |total, model| Ok(total + model.acceleration(env, body)?))
    }
}

impl SingleStateDerivative for TranslationalDynamics {
    fn state_type(&self) -> IntegratedStateType {
        IntegratedStateType::Translational
    }

    fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    fn internal_size(&self) -> usize {
        6 * self.bodies.len()
    }

    fn update_environment(&self, state: &[f64], env: &mut Environment<'_>) {
        for (body, chunk) in self.bodies.iter().zip(state.chunks_exact(6)) {
            env.set_translational_state(*body, Vector6::from_column_slice(chunk));
        }
    }

    fn derivative(&self, env: &Environment<'_>, state: &[f64]) -> Result<DVector<f64>, Error> {
        let mut derivative = DVector::zeros(state.len());
        for (index, chunk) in state.chunks_exact(6).enumerate() {
            let acceleration = self.total_acceleration(env, index)?;
            let offset = 6 * index;
            derivative.rows_mut(offset, 3).copy_from_slice(&chunk[3..]);
            derivative.rows_mut(offset + 3, 3).copy_from(&acceleration);
        }
        Ok(derivative)
    }
}
