use skein_core::Sample;

/// Indicates how the solver terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Completed all requested steps.
    Complete,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of an Euler integration.
#[derive(Debug, Clone)]
pub struct Solution<T> {
    /// How the solver terminated.
    pub status: Status,

    /// History of samples from each step (including the initial state).
    pub history: Vec<Sample<T>>,

    /// Number of integration steps completed.
    pub steps: usize,
}
