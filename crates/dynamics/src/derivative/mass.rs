use nalgebra::DVector;

use crate::{
    BodyId, Environment, Error, IntegratedStateType, SingleStateDerivative,
    models::MassRateModel,
};

/// Propagation of body masses, one entry per body.
#[derive(Debug, Default)]
pub struct MassDynamics {
    bodies: Vec<BodyId>,
    rates: Vec<MassRateModel>,
}

impl MassDynamics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_body(mut self, body: BodyId, rate: MassRateModel) -> Self {
        self.bodies.push(body);
        self.rates.push(rate);
        self
    }

    /// Returns the mass-rate model of the body at `index` in block order.
    #[must_use]
    pub fn rate(&self, index: usize) -> &MassRateModel {
        &self.rates[index]
    }
}

impl SingleStateDerivative for MassDynamics {
    fn state_type(&self) -> IntegratedStateType {
        IntegratedStateType::BodyMass
    }

    fn bodies(&self) -> &[BodyId] {
        &self.bodies
    }

    fn internal_size(&self) -> usize {
        self.bodies.len()
    }

    fn update_environment(&self, state: &[f64], env: &mut Environment<'_>) {
        for (body, mass) in self.bodies.iter().zip(state) {
            env.set_mass(*body, *mass);
        }
    }

    fn derivative(&self, env: &Environment<'_>, _state: &[f64]) -> Result<DVector<f64>, Error> {
        Ok(DVector::from_iterator(
            self.rates.len(),
            self.rates.iter().map(|rate| rate.mass_rate(env)),
        ))
    }
}
