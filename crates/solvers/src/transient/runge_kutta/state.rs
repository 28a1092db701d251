use nalgebra::DVector;
use skein_core::{Sample, TimeType};

/// The mutable state of one variable-step integration run.
///
/// `step_size` is the step that will be attempted next. It is updated after
/// every attempt, and its sign sets the direction of integration.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegratorState<T> {
    pub time: T,
    pub state: DVector<f64>,
    pub step_size: f64,
}

impl<T: TimeType> IntegratorState<T> {
    /// Creates an integrator state.
    pub fn new(time: T, state: DVector<f64>, step_size: f64) -> Self {
        Self {
            time,
            state,
            step_size,
        }
    }

    /// Returns the current time and state as a sample.
    #[must_use]
    pub fn sample(&self) -> Sample<T> {
        Sample::new(self.time, self.state.clone())
    }
}
