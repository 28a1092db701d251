use std::error::Error as StdError;

/// Errors that can occur during Runge-Kutta integration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The local error test failed even at the minimum step size.
    #[error(
        "minimum step size exceeded at t = {time} s: step {step_size} s has error norm {error_norm}"
    )]
    MinimumStepSizeExceeded {
        time: f64,
        step_size: f64,
        error_norm: f64,
    },

    #[error("per-component tolerances have {tolerances} entries but the state has {state}")]
    ToleranceSizeMismatch { tolerances: usize, state: usize },

    #[error("step size must be finite and non-zero, got {0}")]
    InvalidStepSize(f64),

    #[error("problem error: {0}")]
    Problem(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn problem<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Problem(Box::new(err))
    }
}
