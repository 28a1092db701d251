use std::{fmt, sync::Arc};

use nalgebra::{Vector3, Vector6};
use skein_core::{Ephemeris, constants::SPEED_OF_LIGHT};

use crate::Error;

/// A correction added to the geometric light time.
///
/// Corrections are evaluated in `f64` whatever the scalar type of the light
/// time calculator, since they are many orders of magnitude smaller than the
/// light time itself.
pub trait LightTimeCorrection: Send + Sync {
    /// Returns the correction in seconds for the given link end states and
    /// times (in seconds).
    ///
    /// # Errors
    ///
    /// Fails if the correction needs an ephemeris lookup that fails.
    fn correction(
        &self,
        transmitter: &Vector6<f64>,
        receiver: &Vector6<f64>,
        transmission_time: f64,
        reception_time: f64,
    ) -> Result<f64, Error>;
}

/// A body whose gravity delays the signal.
#[derive(Clone)]
pub struct Perturber {
    name: String,
    ephemeris: Arc<dyn Ephemeris>,
    gravitational_parameter: f64,
}

impl Perturber {
    pub fn new(
        name: impl Into<String>,
        ephemeris: Arc<dyn Ephemeris>,
        gravitational_parameter: f64,
    ) -> Self {
        Self {
            name: name.into(),
            ephemeris,
            gravitational_parameter,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn gravitational_parameter(&self) -> f64 {
        self.gravitational_parameter
    }
}

impl fmt::Debug for Perturber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Perturber")
            .field("name", &self.name)
            .field("gravitational_parameter", &self.gravitational_parameter)
            .finish_non_exhaustive()
    }
}

/// First-order relativistic (Shapiro) delay from a set of point masses.
///
/// For each perturber,
///
/// ```text
/// Δτ = (1 + γ) μ / c³ · ln((r_T + r_R + r_TR) / (r_T + r_R − r_TR))
/// ```
///
/// where `r_T` and `r_R` are the distances of the transmitter and receiver
/// from the perturber and `r_TR` is the distance between the link ends. The
/// perturber is placed at its position halfway between transmission and
/// reception.
#[derive(Debug, Clone)]
pub struct FirstOrderRelativisticCorrection {
    perturbers: Vec<Perturber>,
    ppn_gamma: f64,
}

impl FirstOrderRelativisticCorrection {
    /// Creates the correction for general relativity (`γ = 1`).
    #[must_use]
    pub fn new(perturbers: Vec<Perturber>) -> Self {
        Self {
            perturbers,
            ppn_gamma: 1.0,
        }
    }

    #[must_use]
    pub fn with_ppn_gamma(mut self, ppn_gamma: f64) -> Self {
        self.ppn_gamma = ppn_gamma;
        self
    }

    #[must_use]
    pub fn perturbers(&self) -> &[Perturber] {
        &self.perturbers
    }

    #[must_use]
    pub fn ppn_gamma(&self) -> f64 {
        self.ppn_gamma
    }

    /// The delay caused by each perturber, in the order of
    /// [`perturbers`](Self::perturbers).
    ///
    /// # Errors
    ///
    /// Fails if a perturber ephemeris lookup fails.
    pub fn per_perturber(
        &self,
        transmitter: &Vector6<f64>,
        receiver: &Vector6<f64>,
        transmission_time: f64,
        reception_time: f64,
    ) -> Result<Vec<f64>, Error> {
        let midpoint = 0.5 * (transmission_time + reception_time);
        let transmitter = transmitter.fixed_rows::<3>(0).into_owned();
        let receiver = receiver.fixed_rows::<3>(0).into_owned();
        let separation = (receiver - transmitter).norm();

        self.perturbers
            .iter()
            .map(|perturber| {
                let center: Vector3<f64> =
                    perturber.ephemeris.state_at(midpoint)?.fixed_rows::<3>(0).into_owned();
                let sum = (transmitter - center).norm() + (receiver - center).norm();
                Ok(shapiro_delay(
                    perturber.gravitational_parameter,
                    self.ppn_gamma,
                    sum,
                    separation,
                ))
            })
            .collect()
    }
}

fn shapiro_delay(gravitational_parameter: f64, ppn_gamma: f64, sum: f64, separation: f64) -> f64 {
    (1.0 + ppn_gamma) * gravitational_parameter / SPEED_OF_LIGHT.powi(3)
        * ((sum + separation) / (sum - separation)).ln()
}

impl LightTimeCorrection for FirstOrderRelativisticCorrection {
    fn correction(
        &self,
        transmitter: &Vector6<f64>,
        receiver: &Vector6<f64>,
        transmission_time: f64,
        reception_time: f64,
    ) -> Result<f64, Error> {
        Ok(self
            .per_perturber(transmitter, receiver, transmission_time, reception_time)?
            .iter()
            .sum())
    }
}
