//! State derivative models and their composition for Skein.
//!
//! A propagation integrates several kinds of dynamical state at once. Each
//! kind is handled by a [`StateDerivativeModel`] variant:
//!
//! - translational (Cartesian position and velocity)
//! - rotational, with a quaternion attitude
//! - rotational, with an exponential-map attitude
//! - body mass
//! - custom user-defined states
//!
//! The [`StateDerivativeComposer`] concatenates their states into one vector
//! ordered by [`IntegratedStateType`], dispatches each slice to its model and
//! implements [`OdeProblem`](skein_core::OdeProblem), so any integrator in
//! `skein-solvers` can propagate it.
//!
//! Models never hold references to one another or to bodies. They name bodies
//! by [`BodyId`] and read body properties and current states through an
//! [`Environment`], which overlays the states being propagated on top of the
//! static [`BodyRegistry`].
//!
//! Sensitivities of the dynamics feed estimation through
//! [`partials`] and [`VariationalEquations`].

pub mod attitude;
pub mod models;
pub mod partials;

mod body;
mod composer;
mod derivative;
mod environment;
mod error;
mod state_type;
mod variational;

pub use body::{Body, BodyId, BodyRegistry};
pub use composer::{StateBlock, StateDerivativeComposer};
pub use derivative::{
    CustomDynamics, ExponentialMapAttitude, MassDynamics, QuaternionAttitude,
    RotationalDynamics, SingleStateDerivative, StateDerivativeModel, TranslationalDynamics,
};
pub use environment::Environment;
pub use error::Error;
pub use state_type::{IntegratedStateType, StateReference};
pub use variational::VariationalEquations;
