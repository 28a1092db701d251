//! Numerical integrators for the Skein toolkit.
//!
//! # Modules
//!
//! - [`transient`]: time integrators for [`OdeProblem`]s: a variable-step
//!   embedded Runge-Kutta solver and a fixed-step forward Euler solver
//! - [`trajectory`]: dense interpolation of integrator output
//!
//! [`OdeProblem`]: skein_core::OdeProblem

pub mod trajectory;
pub mod transient;
