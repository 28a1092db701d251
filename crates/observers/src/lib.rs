//! Reusable observers for the Skein integrators.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work with both the Runge-Kutta and the Euler solver.
//!
//! # Modules
//!
//! - [`traits`]: Capability traits for cross-solver observers
//!   ([`HasTime`], [`HasStepOutcome`], [`CanStopEarly`])
//!
//! # Observers
//!
//! - [`StepLimit`]: stops a run after a fixed number of accepted steps
//! - [`StepTracer`]: emits every step as a `tracing` event and counts them
//!
//! [`Observer`]: skein_core::Observer
//! [`HasTime`]: traits::HasTime
//! [`HasStepOutcome`]: traits::HasStepOutcome
//! [`CanStopEarly`]: traits::CanStopEarly

pub mod traits;

mod step_limit;
mod tracer;

pub use step_limit::StepLimit;
pub use tracer::StepTracer;
