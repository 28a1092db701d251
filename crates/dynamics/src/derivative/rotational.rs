use nalgebra::{DVector, Quaternion, UnitQuaternion, Vector3};
use tracing::debug;

use crate::{
    BodyId, Environment, Error, IntegratedStateType, SingleStateDerivative,
    attitude::{
        exponential_map_rate, exponential_map_to_quaternion, quaternion_rate,
        quaternion_to_exponential_map, shadow,
    },
    models::TorqueModel,
};

/// Euler's rotational equations, `ω̇ = I⁻¹(τ − ω × Iω)`, for a set of bodies.
///
/// The attitude representation is chosen by wrapping this in
/// [`QuaternionAttitude`] or [`ExponentialMapAttitude`].
#[derive(Default)]
pub struct RotationalDynamics {
    bodies: Vec<BodyId>,
    torques: Vec<Vec<Box<dyn TorqueModel>>>,
}

impl RotationalDynamics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a propagated body with the torques acting on it.
    #[must_use]
    pub fn with_body(mut self, body: BodyId, torques: Vec<Box<dyn TorqueModel>>) -> Self {
        self.bodies.push(body);
        self.torques.push(torques);
        self
    }

    #[must_use]
    pub fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    /// Angular acceleration of the body at `index`, in the body frame.
    ///
    /// # Errors
    ///
    /// Fails if the body has no inertia tensor, if it is singular, or if a
    /// torque model fails.
    pub fn angular_acceleration(
        &self,
        env: &Environment<'_>,
        index: usize,
        omega: &Vector3<f64>,
    ) -> Result<Vector3<f64>, Error> {
        let body = self.bodies[index];
        let inertia = env.inertia(body)?;
        let inverse = inertia
            .try_inverse()
            .ok_or_else(|| Error::SingularInertia(env.registry().name(body).to_owned()))?;

        let torque = self.torques[index]
            .iter()
            .try_fold(Vector3::zeros(), |total, model| Ok::<_, Error>(total + model.torque(env, body)?))?;

        Ok(inverse * (torque - omega.cross(&(inertia * omega))))
    }
}

/// Rotational dynamics with the attitude as a quaternion.
///
/// Each body contributes `[w, x, y, z, ωx, ωy, ωz]`. Quaternions are
/// renormalized after every accepted step.
pub struct QuaternionAttitude {
    dynamics: RotationalDynamics,
}

impl QuaternionAttitude {
    #[must_use]
    pub fn new(dynamics: RotationalDynamics) -> Self {
        Self { dynamics }
    }
}

fn quaternion(chunk: &[f64]) -> Quaternion<f64> {
    Quaternion::new(chunk[0], chunk[1], chunk[2], chunk[3])
}

impl SingleStateDerivative for QuaternionAttitude {
    fn state_type(&self) -> IntegratedStateType {
        IntegratedStateType::Rotational
    }

    fn bodies(&self) -> &[BodyId] {
        self.dynamics.bodies()
    }

    fn internal_size(&self) -> usize {
        7 * self.dynamics.bodies().len()
    }

    fn update_environment(&self, state: &[f64], env: &mut Environment<'_>) {
        for (body, chunk) in self.dynamics.bodies().iter().zip(state.chunks_exact(7)) {
            let attitude = UnitQuaternion::from_quaternion(quaternion(chunk));
            env.set_rotational_state(*body, attitude, Vector3::from_column_slice(&chunk[4..]));
        }
    }

    fn derivative(&self, env: &Environment<'_>, state: &[f64]) -> Result<DVector<f64>, Error> {
        let mut derivative = DVector::zeros(state.len());
        for (index, chunk) in state.chunks_exact(7).enumerate() {
            let omega = Vector3::from_column_slice(&chunk[4..]);
            let q_dot = quaternion_rate(&quaternion(chunk), &omega);
            let omega_dot = self.dynamics.angular_acceleration(env, index, &omega)?;

            let offset = 7 * index;
            derivative[offset] = q_dot.w;
            derivative.rows_mut(offset + 1, 3).copy_from(&q_dot.imag());
            derivative.rows_mut(offset + 4, 3).copy_from(&omega_dot);
        }
        Ok(derivative)
    }

    fn requires_post_processing(&self) -> bool {
        true
    }

    fn post_process(&self, state: &mut [f64]) {
        for chunk in state.chunks_exact_mut(7) {
            let norm = quaternion(chunk).norm();
            if norm > 0.0 {
                chunk[..4].iter_mut().for_each(|value| *value /= norm);
            }
        }
    }
}

/// Rotational dynamics with the attitude as an exponential map.
///
/// Each body integrates `[φx, φy, φz, ωx, ωy, ωz]` and converts to the
/// conventional quaternion form `[w, x, y, z, ωx, ωy, ωz]`. The map is
/// replaced by its shadow whenever its norm reaches `π`, which keeps the
/// kinematics away from the singularity at `2π`.
pub struct ExponentialMapAttitude {
    dynamics: RotationalDynamics,
}

impl ExponentialMapAttitude {
    #[must_use]
    pub fn new(dynamics: RotationalDynamics) -> Self {
        Self { dynamics }
    }
}

impl SingleStateDerivative for ExponentialMapAttitude {
    fn state_type(&self) -> IntegratedStateType {
        IntegratedStateType::Rotational
    }

    fn bodies(&self) -> &[BodyId] {
        self.dynamics.bodies()
    }

    fn internal_size(&self) -> usize {
        6 * self.dynamics.bodies().len()
    }

    fn conventional_size(&self) -> usize {
        7 * self.dynamics.bodies().len()
    }

    fn update_environment(&self, state: &[f64], env: &mut Environment<'_>) {
        for (body, chunk) in self.dynamics.bodies().iter().zip(state.chunks_exact(6)) {
            let attitude = exponential_map_to_quaternion(&Vector3::from_column_slice(&chunk[..3]));
            env.set_rotational_state(*body, attitude, Vector3::from_column_slice(&chunk[3..]));
        }
    }

    fn derivative(&self, env: &Environment<'_>, state: &[f64]) -> Result<DVector<f64>, Error> {
        let mut derivative = DVector::zeros(state.len());
        for (index, chunk) in state.chunks_exact(6).enumerate() {
            let phi = Vector3::from_column_slice(&chunk[..3]);
            let omega = Vector3::from_column_slice(&chunk[3..]);
            let omega_dot = self.dynamics.angular_acceleration(env, index, &omega)?;

            let offset = 6 * index;
            derivative.rows_mut(offset, 3).copy_from(&exponential_map_rate(&phi, &omega));
            derivative.rows_mut(offset + 3, 3).copy_from(&omega_dot);
        }
        Ok(derivative)
    }

    fn to_conventional(&self, internal: &[f64]) -> DVector<f64> {
        let mut conventional = DVector::zeros(self.conventional_size());
        for (index, chunk) in internal.chunks_exact(6).enumerate() {
            let q = exponential_map_to_quaternion(&Vector3::from_column_slice(&chunk[..3]));
            let offset = 7 * index;
            conventional[offset] = q.w;
            conventional.rows_mut(offset + 1, 3).copy_from(&q.imag());
            conventional.rows_mut(offset + 4, 3).copy_from_slice(&chunk[3..]);
        }
        conventional
    }

    fn from_conventional(&self, conventional: &[f64]) -> DVector<f64> {
        let mut internal = DVector::zeros(self.internal_size());
        for (index, chunk) in conventional.chunks_exact(7).enumerate() {
            let q = UnitQuaternion::from_quaternion(quaternion(chunk));
            let offset = 6 * index;
            internal
                .rows_mut(offset, 3)
                .copy_from(&quaternion_to_exponential_map(&q));
            internal.rows_mut(offset + 3, 3).copy_from_slice(&chunk[4..]);
        }
        internal
    }

    fn requires_post_processing(&self) -> bool {
        true
    }

    fn post_process(&self, state: &mut [f64]) {
        for chunk in state.chunks_exact_mut(6) {
            let phi = Vector3::from_column_slice(&chunk[..3]);
            if let Some(shadowed) = shadow(&phi) {
                debug!(angle = phi.norm(), "switching exponential map to its shadow");
                chunk[..3].copy_from_slice(shadowed.as_slice());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    use crate::{Body, BodyRegistry};

    fn registry() -> (BodyRegistry, BodyId) {
        let mut registry = BodyRegistry::new();
        let sat = registry
            .add(Body::new("Sat").with_inertia(Matrix3::from_diagonal(&Vector3::new(10.0, 20.0, 30.0))))
            .unwrap();
        (registry, sat)
    }

    #[test]
    fn euler_equations_without_torque() {
        let (registry, sat) = registry();
        let dynamics = RotationalDynamics::new().with_body(sat, vec![]);
        let env = Environment::new(&registry, 0.0);

        let omega = Vector3::new(1.0, 2.0, 3.0);
        let omega_dot = dynamics.angular_acceleration(&env, 0, &omega).unwrap();

        // I ω̇ = −ω × Iω
        let expected = Vector3::new(
            -(30.0 - 20.0) * 2.0 * 3.0 / 10.0,
            -(10.0 - 30.0) * 3.0 * 1.0 / 20.0,
            -(20.0 - 10.0) * 1.0 * 2.0 / 30.0,
        );
        assert_relative_eq!(omega_dot, expected, epsilon = 1e-14);
    }

    #[test]
    fn singular_inertia_is_an_error() {
        let mut registry = BodyRegistry::new();
        let sat = registry
            .add(Body::new("Flat").with_inertia(Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, 0.0))))
            .unwrap();
        let dynamics = RotationalDynamics::new().with_body(sat, vec![]);
        let env = Environment::new(&registry, 0.0);

        assert_eq!(
            dynamics.angular_acceleration(&env, 0, &Vector3::zeros()),
            Err(Error::SingularInertia("Flat".into()))
        );
    }

    #[test]
    fn conventional_conversion_round_trips() {
        let (_, sat) = registry();
        let model = ExponentialMapAttitude::new(RotationalDynamics::new().with_body(sat, vec![]));
        let internal = [0.4, -0.3, 1.1, 0.01, 0.02, -0.03];

        let conventional = model.to_conventional(&internal);
        assert_eq!(conventional.len(), 7);
        assert_relative_eq!(conventional.rows(0, 4).norm(), 1.0, epsilon = 1e-15);

        let back = model.from_conventional(conventional.as_slice());
        assert_relative_eq!(back, DVector::from_column_slice(&internal), epsilon = 1e-14);
    }

    #[test]
    fn post_processing_normalizes_and_shadows() {
        let (_, sat) = registry();

        let quaternion = QuaternionAttitude::new(RotationalDynamics::new().with_body(sat, vec![]));
        let mut state = [2.0, 0.0, 0.0, 0.0, 0.1, 0.2, 0.3];
        quaternion.post_process(&mut state);
        assert_eq!(state, [1.0, 0.0, 0.0, 0.0, 0.1, 0.2, 0.3]);

        let exponential = ExponentialMapAttitude::new(RotationalDynamics::new().with_body(sat, vec![]));
        let mut inside = [0.0, 3.0, 0.0, 0.1, 0.2, 0.3];
        exponential.post_process(&mut inside);
        assert_eq!(inside, [0.0, 3.0, 0.0, 0.1, 0.2, 0.3]);

        let mut outside = [0.0, 4.0, 0.0, 0.1, 0.2, 0.3];
        exponential.post_process(&mut outside);
        assert_relative_eq!(outside[1], 4.0 - 2.0 * std::f64::consts::PI, epsilon = 1e-15);
        assert_eq!(outside[3..], [0.1, 0.2, 0.3]);
    }
}
