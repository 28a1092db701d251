//! Solvers for transient problems: integrating an [`OdeProblem`] in time.
//!
//! # Solvers
//!
//! - [`runge_kutta`]: embedded Runge-Kutta pairs with adaptive step size
//! - [`euler`]: fixed-step forward Euler
//!
//! [`OdeProblem`]: skein_core::OdeProblem

pub mod euler;
pub mod runge_kutta;
