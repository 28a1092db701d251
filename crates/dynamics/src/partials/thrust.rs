use nalgebra::DMatrix;
use skein_core::ParameterId;

use crate::{
    BodyId, Environment, Error, StateReference,
    models::{AccelerationModel, ThrustAcceleration},
    partials::StateDerivativePartial,
};

impl StateDerivativePartial for ThrustAcceleration {
    fn wrt_state(
        &self,
        env: &Environment<'_>,
        body: BodyId,
        state: StateReference,
    ) -> Result<Option<DMatrix<f64>>, Error> {
        match state {
            StateReference::Mass(other) if other == body => {
                let mass = env.mass(body)?;
                let acceleration = self.acceleration(env, body)?;
                Ok(Some(DMatrix::from_column_slice(3, 1, (-acceleration / mass).as_slice())))
            }
            _ => Ok(None),
        }
    }

    fn wrt_parameter(
        &self,
        env: &Environment<'_>,
        body: BodyId,
        parameter: &ParameterId,
    ) -> Result<Option<DMatrix<f64>>, Error> {
        let ParameterId::ConstantThrustMagnitude { body: name, engine } = parameter else {
            return Ok(None);
        };
        if name != env.registry().name(body) || !self.engines().iter().any(|e| e.name() == engine) {
            return Ok(None);
        }

        let column = self.direction().into_inner() / env.mass(body)?;
        Ok(Some(DMatrix::from_column_slice(3, 1, column.as_slice())))
    }
}
