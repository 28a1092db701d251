mod custom;
mod mass;
mod rotational;
mod translational;

pub use custom::CustomDynamics;
pub use mass::MassDynamics;
pub use rotational::{ExponentialMapAttitude, QuaternionAttitude, RotationalDynamics};
pub use translational::TranslationalDynamics;

use nalgebra::DVector;

use crate::{BodyId, Environment, Error, IntegratedStateType};

/// The derivative of one kind of state, for one or more bodies.
///
/// State slices passed to these methods hold the model's block of the
/// composed state in its internal representation: the bodies' states are
/// concatenated in the order of [`SingleStateDerivative::bodies`].
pub trait SingleStateDerivative {
    fn state_type(&self) -> IntegratedStateType;

    /// Bodies whose states make up the block, in block order.
    fn bodies(&self) -> &[BodyId];

    /// Number of entries in the integrated (internal) representation.
    fn internal_size(&self) -> usize;

    /// Number of entries in the conventional representation.
    fn conventional_size(&self) -> usize {
        self.internal_size()
    }

    /// Writes the block's current states into the environment.
    fn update_environment(&self, state: &[f64], env: &mut Environment<'_>);

    /// Computes the time derivative of the block.
    ///
    /// # Errors
    ///
    /// Returns an error if a model cannot be evaluated in `env`.
    fn derivative(&self, env: &Environment<'_>, state: &[f64]) -> Result<DVector<f64>, Error>;

    fn to_conventional(&self, internal: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(internal)
    }

    fn from_conventional(&self, conventional: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(conventional)
    }

    /// Whether [`SingleStateDerivative::post_process`] modifies states.
    fn requires_post_processing(&self) -> bool {
        false
    }

    /// Moves an accepted internal state back onto its canonical form.
    fn post_process(&self, _state: &mut [f64]) {}
}

/// All state derivative models a composer can hold.
pub enum StateDerivativeModel {
    Translational(TranslationalDynamics),
    RotationalQuaternion(QuaternionAttitude),
    RotationalExponentialMap(ExponentialMapAttitude),
    BodyMass(MassDynamics),
    Custom(CustomDynamics),
}

impl StateDerivativeModel {
    fn inner(&self) -> &dyn SingleStateDerivative {
        match self {
            Self::Translational(model) => model,
            Self::RotationalQuaternion(model) => model,
            Self::RotationalExponentialMap(model) => model,
            Self::BodyMass(model) => model,
            Self::Custom(model) => model,
        }
    }
}

impl SingleStateDerivative for StateDerivativeModel {
    fn state_type(&self) -> IntegratedStateType {
        self.inner().state_type()
    }

    fn bodies(&self) -> &[BodyId] {
        self.inner().bodies()
    }

    fn internal_size(&self) -> usize {
        self.inner().internal_size()
    }

    fn conventional_size(&self) -> usize {
        self.inner().conventional_size()
    }

    fn update_environment(&self, state: &[f64], env: &mut Environment<'_>) {
        self.inner().update_environment(state, env);
    }

    fn derivative(&self, env: &Environment<'_>, state: &[f64]) -> Result<DVector<f64>, Error> {
        self.inner().derivative(env, state)
    }

    fn to_conventional(&self, internal: &[f64]) -> DVector<f64> {
        self.inner().to_conventional(internal)
    }

    fn from_conventional(&self, conventional: &[f64]) -> DVector<f64> {
        self.inner().from_conventional(conventional)
    }

    fn requires_post_processing(&self) -> bool {
        self.inner().requires_post_processing()
    }

    fn post_process(&self, state: &mut [f64]) {
        self.inner().post_process(state);
    }
}

impl From<TranslationalDynamics> for StateDerivativeModel {
    fn from(model: TranslationalDynamics) -> Self {
        Self::Translational(model)
    }
}

impl From<QuaternionAttitude> for StateDerivativeModel {
    fn from(model: QuaternionAttitude) -> Self {
        Self::RotationalQuaternion(model)
    }
}

impl From<ExponentialMapAttitude> for StateDerivativeModel {
    fn from(model: ExponentialMapAttitude) -> Self {
        Self::RotationalExponentialMap(model)
    }
}

impl From<MassDynamics> for StateDerivativeModel {
    fn from(model: MassDynamics) -> Self {
        Self::BodyMass(model)
    }
}

impl From<CustomDynamics> for StateDerivativeModel {
    fn from(model: CustomDynamics) -> Self {
        Self::Custom(model)
    }
}
