use nalgebra::{RealField, Vector6};
use thiserror::Error;

use crate::TimeType;

/// Errors returned by an [`Ephemeris`] lookup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("time {time} s is outside the ephemeris span [{start}, {end}] s")]
    OutOfRange { time: f64, start: f64, end: f64 },

    #[error("no state available: {0}")]
    Unavailable(String),
}

/// A source of Cartesian states (position and velocity) over time.
///
/// States are `[x, y, z, vx, vy, vz]` in a common inertial frame, in meters
/// and meters per second. The scalar type `S` is the precision of the
/// returned state; `T` is the time representation used for lookups.
///
/// Closures of the form `Fn(T) -> Result<Vector6<S>, EphemerisError>`
/// implement this trait.
pub trait Ephemeris<S = f64, T = f64>: Send + Sync
where
    S: RealField + Copy,
    T: TimeType,
{
    /// Returns the state at `time`.
    ///
    /// # Errors
    ///
    /// Returns an [`EphemerisError`] if no state is available at `time`.
    fn state_at(&self, time: T) -> Result<Vector6<S>, EphemerisError>;
}

impl<S, T, F> Ephemeris<S, T> for F
where
    S: RealField + Copy,
    T: TimeType,
    F: Fn(T) -> Result<Vector6<S>, EphemerisError> + Send + Sync,
{
    fn state_at(&self, time: T) -> Result<Vector6<S>, EphemerisError> {
        self(time)
    }
}

/// An ephemeris that returns the same state at every time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantEphemeris<S: RealField + Copy = f64> {
    state: Vector6<S>,
}

impl<S: RealField + Copy> ConstantEphemeris<S> {
    /// Creates an ephemeris fixed at `state`.
    pub fn new(state: Vector6<S>) -> Self {
        Self { state }
    }

    /// Creates a stationary ephemeris at the given position.
    pub fn at_rest(x: S, y: S, z: S) -> Self {
        let zero = S::zero();
        Self::new(Vector6::new(x, y, z, zero, zero, zero))
    }
}

impl<S, T> Ephemeris<S, T> for ConstantEphemeris<S>
where
    S: RealField + Copy,
    T: TimeType,
{
    fn state_at(&self, _time: T) -> Result<Vector6<S>, EphemerisError> {
        Ok(self.state)
    }
}
