//! Observation models.
//!
//! An observation model computes the value of an observable of size `N` at a
//! given time, with the time fixed at a chosen reference link end. Models
//! return the link end geometry alongside the value, so the partials of the
//! same observation can be evaluated without recomputing the light time.

mod one_way_range;

pub use one_way_range::OneWayRangeModel;

use nalgebra::{RealField, SVector};
use skein_core::TimeType;

use crate::{Error, LinkEndGeometry, LinkEndRole};

/// Computes observations of size `N` with scalar type `S` at times of type `T`.
pub trait ObservationModel<const N: usize, S = f64, T = f64>: Send + Sync
where
    S: RealField + Copy,
    T: TimeType,
{
    /// Computes the observation without bias, and the geometry it used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLinkEndRole`] if the model cannot fix time at
    /// `reference`, or any error from the underlying light time calculation.
    fn compute_ideal_observation_with_link_end_data(
        &self,
        time: T,
        reference: LinkEndRole,
    ) -> Result<(SVector<S, N>, LinkEndGeometry), Error>;

    /// Computes the observation without bias.
    ///
    /// # Errors
    ///
    /// See [`compute_ideal_observation_with_link_end_data`](Self::compute_ideal_observation_with_link_end_data).
    fn compute_ideal_observation(&self, time: T, reference: LinkEndRole) -> Result<SVector<S, N>, Error> {
        Ok(self
            .compute_ideal_observation_with_link_end_data(time, reference)?
            .0)
    }

    /// Constant bias added to ideal observations.
    fn bias(&self) -> SVector<S, N> {
        SVector::zeros()
    }

    /// Computes the observation including bias.
    ///
    /// # Errors
    ///
    /// See [`compute_ideal_observation_with_link_end_data`](Self::compute_ideal_observation_with_link_end_data).
    fn compute_observation(&self, time: T, reference: LinkEndRole) -> Result<SVector<S, N>, Error> {
        Ok(self.compute_ideal_observation(time, reference)? + self.bias())
    }
}
