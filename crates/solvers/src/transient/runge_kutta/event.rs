use nalgebra::DVector;

/// Event emitted by the Runge-Kutta solver for each step attempt.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a, T> {
    /// A step passed the error test and the state was advanced.
    Accepted {
        /// Time at the end of the step.
        time: T,
        /// The step that was taken.
        step_size: f64,
        /// Normalized local error of the step (at most 1).
        error_norm: f64,
        /// State at the end of the step, after post-processing.
        state: &'a DVector<f64>,
    },

    /// A step failed the error test and will be retried with a smaller step.
    Rejected {
        /// Time at the start of the failed step.
        time: T,
        /// The step that failed.
        step_size: f64,
        /// Normalized local error of the failed step (greater than 1).
        error_norm: f64,
        /// The step that will be attempted next.
        next_step_size: f64,
    },
}

impl<T: Copy> Event<'_, T> {
    /// Returns the normalized local error of the attempt.
    #[must_use]
    pub fn error_norm(&self) -> f64 {
        match self {
            Self::Accepted { error_norm, .. } | Self::Rejected { error_norm, .. } => *error_norm,
        }
    }

    /// Returns the step size of the attempt.
    #[must_use]
    pub fn step_size(&self) -> f64 {
        match self {
            Self::Accepted { step_size, .. } | Self::Rejected { step_size, .. } => *step_size,
        }
    }
}
