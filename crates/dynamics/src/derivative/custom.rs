use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;

use crate::{BodyId, Environment, Error, IntegratedStateType, SingleStateDerivative};

type CustomFunction = dyn Fn(f64, &[f64]) -> DVector<f64> + Send + Sync;

/// A user-defined state integrated alongside the physical states.
///
/// The function receives the time in seconds and the block's state and
/// returns its derivative.
#[derive(Clone)]
pub struct CustomDynamics {
    name: String,
    size: usize,
    function: Arc<CustomFunction>,
}

impl CustomDynamics {
    pub fn new(
        name: impl Into<String>,
        size: usize,
        function: impl Fn(f64, &[f64]) -> DVector<f64> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            function: Arc::new(function),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomDynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomDynamics")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl SingleStateDerivative for CustomDynamics {
    fn state_type(&self) -> IntegratedStateType {
        IntegratedStateType::Custom
    }

    fn bodies(&self) -> &[BodyId] {
        &[]
    }

    fn internal_size(&self) -> usize {
        self.size
    }

    fn update_environment(&self, _state: &[f64], _env: &mut Environment<'_>) {}

    fn derivative(&self, env: &Environment<'_>, state: &[f64]) -> Result<DVector<f64>, Error> {
        let derivative = (self.function)(env.time(), state);
        if derivative.len() != self.size {
            return Err(Error::StateSizeMismatch {
                expected: self.size,
                actual: derivative.len(),
            });
        }
        Ok(derivative)
    }
}
