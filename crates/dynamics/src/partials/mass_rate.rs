use std::sync::Arc;

use nalgebra::DMatrix;
use skein_core::{ParameterId, constants::STANDARD_GRAVITY};
use uom::si::{force::newton, time::second};

use crate::{
    BodyId, Environment, Error, IntegratedStateType, StateReference, models::Engine,
    partials::StateDerivativePartial,
};

/// Partials of a thrust-driven mass rate, `ṁ = −Σ F / (Isp g0)`.
///
/// Parameter partials treat each engine's thrust and specific impulse as
/// constants, which holds for [`ConstantThrustEngine`](crate::models::ConstantThrustEngine).
#[derive(Clone, Copy)]
pub struct MassRatePartial<'a> {
    engines: &'a [Arc<dyn Engine>],
}

impl<'a> MassRatePartial<'a> {
    #[must_use]
    pub fn new(engines: &'a [Arc<dyn Engine>]) -> Self {
        Self { engines }
    }

    fn engine(
        &self,
        env: &Environment<'_>,
        body: BodyId,
        body_name: &str,
        engine_name: &str,
    ) -> Option<&'a dyn Engine> {
        if body_name != env.registry().name(body) {
            return None;
        }
        self.engines
            .iter()
            .find(|engine| engine.name() == engine_name)
            .map(|engine| &**engine)
    }
}

impl StateDerivativePartial for MassRatePartial<'_> {
    fn wrt_state(
        &self,
        _env: &Environment<'_>,
        _body: BodyId,
        state: StateReference,
    ) -> Result<Option<DMatrix<f64>>, Error> {
        match state {
            StateReference::Rotational(_) => Err(Error::UnsupportedStateCoupling {
                dynamics: IntegratedStateType::BodyMass,
                state: IntegratedStateType::Rotational,
            }),
            StateReference::Translational(_) | StateReference::Mass(_) => Ok(None),
        }
    }

    fn wrt_parameter(
        &self,
        env: &Environment<'_>,
        body: BodyId,
        parameter: &ParameterId,
    ) -> Result<Option<DMatrix<f64>>, Error> {
        let value = match parameter {
            ParameterId::ConstantThrustMagnitude { body: b, engine } => self
                .engine(env, body, b, engine)
                .map(|engine| {
                    let isp = engine.specific_impulse(env).get::<second>();
                    -1.0 / (isp * STANDARD_GRAVITY)
                }),
            ParameterId::SpecificImpulse { body: b, engine } => {
                self.engine(env, body, b, engine).map(|engine| {
                    let thrust = engine.thrust(env).get::<newton>();
                    let isp = engine.specific_impulse(env).get::<second>();
                    thrust / (isp * isp * STANDARD_GRAVITY)
                })
            }
            _ => None,
        };
        Ok(value.map(|v| DMatrix::from_element(1, 1, v)))
    }
}
