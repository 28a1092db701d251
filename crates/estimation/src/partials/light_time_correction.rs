use std::sync::Arc;

use nalgebra::RowDVector;
use skein_core::ParameterId;

use crate::{Error, LinkEndGeometry, light_time::FirstOrderRelativisticCorrection};

/// Sensitivity of a light-time correction to a parameter.
pub trait LightTimeCorrectionPartial: Send + Sync {
    /// Returns `∂Δτ/∂p` (1 × p) at the given geometry, or `None` if the
    /// correction does not depend on `parameter`.
    ///
    /// # Errors
    ///
    /// Fails if the correction cannot be evaluated at the geometry.
    fn partial(
        &self,
        geometry: &LinkEndGeometry,
        parameter: &ParameterId,
    ) -> Result<Option<RowDVector<f64>>, Error>;
}

/// Partials of [`FirstOrderRelativisticCorrection`] with respect to PPN
/// gamma and the gravitational parameters of the perturbers.
///
/// The delay is proportional to both `(1 + γ)` and each `μ`, so the partials
/// are the delay divided by those factors.
#[derive(Debug, Clone)]
pub struct RelativisticCorrectionPartial {
    correction: Arc<FirstOrderRelativisticCorrection>,
}

impl RelativisticCorrectionPartial {
    #[must_use]
    pub fn new(correction: Arc<FirstOrderRelativisticCorrection>) -> Self {
        Self { correction }
    }
}

impl LightTimeCorrectionPartial for RelativisticCorrectionPartial {
    fn partial(
        &self,
        geometry: &LinkEndGeometry,
        parameter: &ParameterId,
    ) -> Result<Option<RowDVector<f64>>, Error> {
        let delays = || {
            let (transmitter, receiver) = (geometry.transmitter(), geometry.receiver());
            self.correction
                .per_perturber(&transmitter.state, &receiver.state, transmitter.time, receiver.time)
        };

        let value = match parameter {
            ParameterId::PpnGamma => {
                let total: f64 = delays()?.iter().sum();
                Some(total / (1.0 + self.correction.ppn_gamma()))
            }
            ParameterId::GravitationalParameter { body } => {
                match self
                    .correction
                    .perturbers()
                    .iter()
                    .position(|perturber| perturber.name() == body)
                {
                    Some(index) => {
                        let perturber = &self.correction.perturbers()[index];
                        Some(delays()?[index] / perturber.gravitational_parameter())
                    }
                    None => None,
                }
            }
            _ => None,
        };
        Ok(value.map(|value| RowDVector::from_element(1, value)))
    }
}
