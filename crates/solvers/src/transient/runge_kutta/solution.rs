use skein_core::Sample;

/// Indicates how the solver terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Reached the requested end time.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of a Runge-Kutta integration.
#[derive(Debug, Clone)]
pub struct Solution<T> {
    /// How the solver terminated.
    pub status: Status,

    /// Samples after each accepted step (including the initial state).
    pub history: Vec<Sample<T>>,

    /// Number of accepted steps.
    pub steps: usize,

    /// Number of rejected step attempts.
    pub rejections: usize,

    /// Step size the solver would attempt next.
    pub next_step_size: f64,
}
