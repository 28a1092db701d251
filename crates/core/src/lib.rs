//! Core traits and types for the Skein toolkit.
//!
//! This crate defines the shared abstractions that integrators, dynamics
//! models, observation models and observers build on:
//!
//! - [`OdeProblem`]: a first-order system `dx/dt = f(t, x)` over a dynamic
//!   state vector, with a hook for post-processing accepted steps
//! - [`TimeType`]: the time representation carried by a propagation,
//!   implemented for `f64` and for the compensated [`Epoch`]
//! - [`Sample`]: a captured `(time, state)` pair from a propagation
//! - [`Observer`]: receives solver events and optionally returns control actions
//! - [`Ephemeris`]: a source of Cartesian states for a body or link end
//! - [`ParameterId`]: identifiers of estimatable parameters

pub mod constants;

mod ephemeris;
mod observer;
mod parameter;
mod problems;
mod sample;
mod time;

pub use ephemeris::{ConstantEphemeris, Ephemeris, EphemerisError};
pub use observer::Observer;
pub use parameter::ParameterId;
pub use problems::OdeProblem;
pub use sample::Sample;
pub use time::{Epoch, TimeType};
