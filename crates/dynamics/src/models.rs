//! Force, torque, engine and mass-rate models used by the state derivatives.
//!
//! Models are evaluated for one body at a time and read everything they need
//! from the [`Environment`](crate::Environment).

mod acceleration;
mod engine;
mod mass_rate;
mod torque;

pub use acceleration::{AccelerationModel, PointMassGravity, ThrustAcceleration};
pub use engine::{ConstantThrustEngine, Engine};
pub use mass_rate::MassRateModel;
pub use torque::{ConstantTorque, TorqueModel};
