//! Light-time calculators.
//!
//! The light time of a one-way link is the solution of the implicit equation
//!
//! ```text
//! τ = |r_R(t_R) − r_T(t_R − τ)| / c + Δτ
//! ```
//!
//! where `Δτ` is the sum of the configured [`LightTimeCorrection`]s. Either
//! the reception time `t_R` or the transmission time `t_T = t_R − τ` is fixed
//! and the other one follows from `τ`.

mod config;
mod correction;

pub use config::{Config, ConfigError};
pub use correction::{FirstOrderRelativisticCorrection, LightTimeCorrection, Perturber};

use std::sync::Arc;

use nalgebra::{RealField, Vector6};
use skein_core::{Ephemeris, TimeType, constants::SPEED_OF_LIGHT};
use tracing::{trace, warn};

use crate::Error;

/// A converged light-time solution with the link end states it used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTimeSolution<S: RealField + Copy = f64, T = f64> {
    /// Light time in seconds, corrections included.
    pub light_time: S,
    pub transmission_time: T,
    pub reception_time: T,
    pub transmitter_state: Vector6<S>,
    pub receiver_state: Vector6<S>,
}

/// Computes the signal travel time between a transmitter and a receiver.
///
/// `S` is the scalar type of the returned light time and states and `T` is
/// the time representation of the link end times.
pub trait LightTime<S = f64, T = f64>: Send + Sync
where
    S: RealField + Copy,
    T: TimeType,
{
    /// Light time for a link with `time` fixed at the receiver when
    /// `at_reception` is true and at the transmitter otherwise.
    ///
    /// # Errors
    ///
    /// Fails if an ephemeris lookup fails or the solution does not converge.
    fn light_time(&self, time: T, at_reception: bool) -> Result<S, Error> {
        Ok(self.light_time_with_states(time, at_reception)?.light_time)
    }

    /// Same as [`LightTime::light_time`], also returning link end times and
    /// states.
    ///
    /// # Errors
    ///
    /// Fails if an ephemeris lookup fails or the solution does not converge.
    fn light_time_with_states(&self, time: T, at_reception: bool)
    -> Result<LightTimeSolution<S, T>, Error>;
}

/// Solves the light-time equation by fixed-point iteration.
///
/// Each iteration re-evaluates the moving link end at the time implied by the
/// current light time estimate. The iteration converges quickly because the
/// link end velocities are small compared to the speed of light.
pub struct IterativeLightTime<S = f64, T = f64>
where
    S: RealField + Copy,
    T: TimeType,
{
    transmitter: Arc<dyn Ephemeris<S, T>>,
    receiver: Arc<dyn Ephemeris<S, T>>,
    corrections: Vec<Arc<dyn LightTimeCorrection>>,
    config: Config,
}

impl<S, T> IterativeLightTime<S, T>
where
    S: RealField + Copy,
    T: TimeType,
{
    /// Creates a calculator between two link end ephemerides.
    pub fn new(transmitter: Arc<dyn Ephemeris<S, T>>, receiver: Arc<dyn Ephemeris<S, T>>) -> Self {
        Self {
            transmitter,
            receiver,
            corrections: Vec::new(),
            config: Config::default(),
        }
    }

    /// Adds a correction to the geometric light time.
    #[must_use]
    pub fn with_correction(mut self, correction: Arc<dyn LightTimeCorrection>) -> Self {
        self.corrections.push(correction);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn corrections(&self) -> &[Arc<dyn LightTimeCorrection>] {
        &self.corrections
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Light time between two known link end states.
    ///
    /// # Errors
    ///
    /// Fails if a correction fails.
    pub fn evaluate(
        &self,
        transmitter: &Vector6<S>,
        receiver: &Vector6<S>,
        transmission_time: T,
        reception_time: T,
    ) -> Result<S, Error> {
        let distance = (receiver.fixed_rows::<3>(0) - transmitter.fixed_rows::<3>(0)).norm();
        let geometric = distance / nalgebra::convert::<f64, S>(SPEED_OF_LIGHT);
        if self.corrections.is_empty() {
            return Ok(geometric);
        }

        let transmitter = transmitter.map(nalgebra::convert_unchecked::<S, f64>);
        let receiver = receiver.map(nalgebra::convert_unchecked::<S, f64>);
        let correction = self.corrections.iter().try_fold(0.0, |total, correction| {
            Ok::<_, Error>(
                total
                    + correction.correction(
                        &transmitter,
                        &receiver,
                        transmission_time.to_seconds(),
                        reception_time.to_seconds(),
                    )?,
            )
        })?;
        Ok(geometric + nalgebra::convert::<f64, S>(correction))
    }

    fn link_end_times(time: T, light_time: f64, at_reception: bool) -> (T, T) {
        if at_reception {
            (time.add_seconds(-light_time), time)
        } else {
            (time, time.add_seconds(light_time))
        }
    }
}

impl<S, T> LightTime<S, T> for IterativeLightTime<S, T>
where
    S: RealField + Copy,
    T: TimeType,
{
    fn light_time_with_states(
        &self,
        time: T,
        at_reception: bool,
    ) -> Result<LightTimeSolution<S, T>, Error> {
        let (fixed, moving) = if at_reception {
            (&self.receiver, &self.transmitter)
        } else {
            (&self.transmitter, &self.receiver)
        };
        let fixed_state = fixed.state_at(time)?;
        let states = |moving_state: Vector6<S>| {
            if at_reception {
                (moving_state, fixed_state)
            } else {
                (fixed_state, moving_state)
            }
        };

        // Start from the instantaneous geometric distance.
        let mut moving_state = moving.state_at(time)?;
        let mut light_time = 0.0;
        let mut change = f64::INFINITY;

        for iteration in 1..=self.config.max_iterations() {
            let (transmission_time, reception_time) =
                Self::link_end_times(time, light_time, at_reception);
            let (transmitter_state, receiver_state) = states(moving_state);
            let estimate =
                self.evaluate(&transmitter_state, &receiver_state, transmission_time, reception_time)?;

            let next = nalgebra::convert_unchecked::<S, f64>(estimate);
            change = (next - light_time).abs();
            light_time = next;

            let (transmission_time, reception_time) =
                Self::link_end_times(time, light_time, at_reception);
            moving_state = moving.state_at(if at_reception {
                transmission_time
            } else {
                reception_time
            })?;

            if change <= self.config.tolerance() {
                trace!(iteration, light_time, "light time converged");
                // The returned light time is evaluated from the returned states.
                let (transmitter_state, receiver_state) = states(moving_state);
                let light_time =
                    self.evaluate(&transmitter_state, &receiver_state, transmission_time, reception_time)?;
                return Ok(LightTimeSolution {
                    light_time,
                    transmission_time,
                    reception_time,
                    transmitter_state,
                    receiver_state,
                });
            }
        }

        warn!(
            iterations = self.config.max_iterations(),
            change, "light time did not converge"
        );
        Err(Error::LightTimeNotConverged {
            iterations: self.config.max_iterations(),
            change,
        })
    }
}
