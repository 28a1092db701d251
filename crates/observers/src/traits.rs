//! Capability traits for cross-solver observers.
//!
//! These traits abstract over solver-specific event and action types, enabling
//! observers to work generically across different solvers.
//!
//! # Event traits
//!
//! - [`HasTime`]: events that carry the time they refer to
//! - [`HasStepOutcome`]: events that report whether a step was accepted
//!
//! # Action traits
//!
//! - [`CanStopEarly`]: actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use skein_core::Observer;
//! use skein_observers::traits::{CanStopEarly, HasTime};
//!
//! struct Deadline {
//!     end: f64,
//! }
//!
//! impl<E: HasTime, A: CanStopEarly> Observer<E, A> for Deadline {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.time() >= self.end).then(A::stop_early)
//!     }
//! }
//! ```

use skein_core::TimeType;
use skein_solvers::transient::{euler, runge_kutta};

/// An event that refers to a point in time.
pub trait HasTime {
    /// Returns the event time in seconds.
    fn time(&self) -> f64;
}

/// An event that reports the outcome of a step attempt.
pub trait HasStepOutcome {
    /// Returns `true` if the event marks an accepted step.
    fn is_accepted(&self) -> bool;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

// --- runge_kutta::Event ---

impl<T: TimeType> HasTime for runge_kutta::Event<'_, T> {
    fn time(&self) -> f64 {
        match self {
            runge_kutta::Event::Accepted { time, .. } | runge_kutta::Event::Rejected { time, .. } => {
                time.to_seconds()
            }
        }
    }
}

impl<T: TimeType> HasStepOutcome for runge_kutta::Event<'_, T> {
    fn is_accepted(&self) -> bool {
        matches!(self, runge_kutta::Event::Accepted { .. })
    }
}

// --- euler::Event ---

impl<T: TimeType> HasTime for euler::Event<T> {
    fn time(&self) -> f64 {
        self.sample.time.to_seconds()
    }
}

/// Step 0 is the initial sample, not a step.
impl<T: TimeType> HasStepOutcome for euler::Event<T> {
    fn is_accepted(&self) -> bool {
        self.step > 0
    }
}

// --- CanStopEarly impls ---

impl CanStopEarly for runge_kutta::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}

impl CanStopEarly for euler::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
