//! Observation models, observation partials and orbit determination for Skein.
//!
//! # Modules
//!
//! - [`light_time`]: light-time calculators and light-time corrections
//! - [`observation`]: observation models built on a light-time calculator
//! - [`partials`]: observation partials: per-observable scaling of
//!   link-end position partials plus light-time correction partials
//! - [`numerical`]: finite-difference helpers for checking partials
//! - [`orbit_determination`]: batch least-squares estimation of an initial
//!   state from one-way range observations
//!
//! Every observation is tied to a set of link ends (transmitter, receiver and
//! any retransmitters in between). Evaluating an observation with link end
//! data yields a [`LinkEndGeometry`]: the times and states at which each link
//! end took part in the observation, which is the input of the partials.

pub mod light_time;
pub mod numerical;
pub mod observation;
pub mod orbit_determination;
pub mod partials;

mod error;
mod link_end;

pub use error::Error;
pub use link_end::{LinkEndGeometry, LinkEndRole, LinkEndState};
