use std::sync::Arc;

use nalgebra::{RealField, SVector, Vector1};
use skein_core::{TimeType, constants::SPEED_OF_LIGHT};

use crate::{
    Error, LinkEndGeometry, LinkEndRole, light_time::LightTime, observation::ObservationModel,
};

/// Range between a transmitter and a receiver, as light time times `c`.
///
/// Time can be fixed at either link end: with the receiver as reference the
/// given time is the reception time, with the transmitter it is the
/// transmission time.
pub struct OneWayRangeModel<S = f64, T = f64>
where
    S: RealField + Copy,
    T: TimeType,
{
    light_time: Arc<dyn LightTime<S, T>>,
    bias: S,
}

impl<S, T> OneWayRangeModel<S, T>
where
    S: RealField + Copy,
    T: TimeType,
{
    pub fn new(light_time: Arc<dyn LightTime<S, T>>) -> Self {
        Self {
            light_time,
            bias: S::zero(),
        }
    }

    /// Sets a constant range bias in meters.
    #[must_use]
    pub fn with_bias(mut self, bias: S) -> Self {
        self.bias = bias;
        self
    }

    #[must_use]
    pub fn light_time(&self) -> &Arc<dyn LightTime<S, T>> {
        &self.light_time
    }
}

impl<S, T> ObservationModel<1, S, T> for OneWayRangeModel<S, T>
where
    S: RealField + Copy,
    T: TimeType,
{
    fn compute_ideal_observation_with_link_end_data(
        &self,
        time: T,
        reference: LinkEndRole,
    ) -> Result<(SVector<S, 1>, LinkEndGeometry), Error> {
        let at_reception = match reference {
            LinkEndRole::Receiver => true,
            LinkEndRole::Transmitter => false,
            LinkEndRole::Retransmitter(_) => return Err(Error::InvalidLinkEndRole(reference)),
        };

        let solution = self.light_time.light_time_with_states(time, at_reception)?;
        let range = solution.light_time * nalgebra::convert::<f64, S>(SPEED_OF_LIGHT);

        let geometry = LinkEndGeometry::one_way(
            (
                solution.transmission_time.to_seconds(),
                solution.transmitter_state.map(nalgebra::convert_unchecked::<S, f64>),
            ),
            (
                solution.reception_time.to_seconds(),
                solution.receiver_state.map(nalgebra::convert_unchecked::<S, f64>),
            ),
            reference,
        )?;
        Ok((Vector1::new(range), geometry))
    }

    fn bias(&self) -> SVector<S, 1> {
        Vector1::new(self.bias)
    }
}
