//! Dense output from integrator samples.
//!
//! A [`Trajectory`] stores the accepted samples of a propagation and
//! interpolates between them with a sliding Lagrange polynomial, so states can
//! be evaluated at observation times that do not coincide with steps.

use nalgebra::DVector;
use skein_core::{Sample, TimeType};
use thiserror::Error;

/// Errors from building or evaluating a [`Trajectory`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrajectoryError {
    #[error("a trajectory needs at least {required} samples, got {actual}")]
    TooFewSamples { required: usize, actual: usize },

    #[error("sample times must be strictly monotonic (sample {index})")]
    NotMonotonic { index: usize },

    #[error("samples have inconsistent state lengths (sample {index})")]
    InconsistentState { index: usize },

    #[error("time {time} s is outside the propagated span [{start}, {end}] s")]
    OutOfRange { time: f64, start: f64, end: f64 },
}

/// Interpolated propagation history.
#[derive(Debug, Clone)]
pub struct Trajectory<T> {
    samples: Vec<Sample<T>>,
    offsets: Vec<f64>,
    points: usize,
}

impl<T: TimeType> Trajectory<T> {
    /// Default number of interpolation points.
    pub const DEFAULT_POINTS: usize = 8;

    /// Creates a trajectory from samples in propagation order.
    ///
    /// Samples from a backward propagation are reordered so times increase.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than two samples, if times are not
    /// strictly monotonic, or if state lengths differ.
    pub fn new(mut samples: Vec<Sample<T>>) -> Result<Self, TrajectoryError> {
        if samples.len() < 2 {
            return Err(TrajectoryError::TooFewSamples {
                required: 2,
                actual: samples.len(),
            });
        }
        if samples[1].time < samples[0].time {
            samples.reverse();
        }

        let size = samples[0].state.len();
        for (index, pair) in samples.windows(2).enumerate() {
            if pair[1].time.seconds_since(pair[0].time) <= 0.0 {
                return Err(TrajectoryError::NotMonotonic { index: index + 1 });
            }
            if pair[1].state.len() != size {
                return Err(TrajectoryError::InconsistentState { index: index + 1 });
            }
        }

        let start = samples[0].time;
        let offsets = samples.iter().map(|s| s.time.seconds_since(start)).collect();
        let points = Self::DEFAULT_POINTS.min(samples.len());

        Ok(Self {
            samples,
            offsets,
            points,
        })
    }

    /// Sets the number of interpolation points (at least 2).
    #[must_use]
    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points.clamp(2, self.samples.len());
        self
    }

    /// Returns the first time of the trajectory.
    #[must_use]
    pub fn start(&self) -> T {
        self.samples[0].time
    }

    /// Returns the last time of the trajectory.
    #[must_use]
    pub fn end(&self) -> T {
        self.samples[self.samples.len() - 1].time
    }

    /// Returns the stored samples in increasing time order.
    #[must_use]
    pub fn samples(&self) -> &[Sample<T>] {
        &self.samples
    }

    /// Interpolates the state at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`TrajectoryError::OutOfRange`] if `time` is outside the span
    /// of the samples.
    pub fn state_at(&self, time: T) -> Result<DVector<f64>, TrajectoryError> {
        let x = time.seconds_since(self.start());
        let span = self.offsets[self.offsets.len() - 1];
        if !(0.0..=span).contains(&x) {
            return Err(TrajectoryError::OutOfRange {
                time: time.to_seconds(),
                start: self.start().to_seconds(),
                end: self.end().to_seconds(),
            });
        }

        // Index of the first sample at or after `x`.
        let upper = self.offsets.partition_point(|offset| *offset < x);
        if self.offsets.get(upper) == Some(&x) {
            return Ok(self.samples[upper].state.clone());
        }

        // Center the window on the bracketing interval.
        let first = upper
            .saturating_sub(self.points / 2)
            .min(self.samples.len() - self.points);
        let window = first..first + self.points;

        let mut state = DVector::zeros(self.samples[0].state.len());
        for i in window.clone() {
            let weight: f64 = window
                .clone()
                .filter(|&j| j != i)
                .map(|j| (x - self.offsets[j]) / (self.offsets[i] - self.offsets[j]))
                .product();
            state.axpy(weight, &self.samples[i].state, 1.0);
        }
        Ok(state)
    }
}
