use nalgebra::DVector;

use crate::TimeType;

/// Defines an ODE (ordinary differential equation) problem to be solved.
///
/// An ODE problem maps a time and a state vector to the time derivative of
/// that state. The state length is fixed for the lifetime of one integration
/// run; solvers never resize it.
///
/// The time type `T` defaults to `f64` seconds. Problems that are propagated
/// over long horizons can be solved with [`Epoch`](crate::Epoch) instead,
/// which accumulates time without drift.
pub trait OdeProblem<T: TimeType = f64> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Computes the derivative of the state at the given time.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the derivative cannot be computed.
    fn derivative(&self, time: T, state: &DVector<f64>) -> Result<DVector<f64>, Self::Error>;

    /// Finalizes the state after a successful integration step.
    ///
    /// This is called only after a step is accepted by the solver. It provides
    /// a hook for representation fix-ups such as quaternion normalization or
    /// switching an attitude parameterization away from a singularity.
    ///
    /// The default implementation returns the state unchanged. Only implement
    /// this method if your problem requires it.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if finalization fails.
    fn finalize_step(&self, _time: T, state: DVector<f64>) -> Result<DVector<f64>, Self::Error> {
        Ok(state)
    }
}
