//! Partial derivatives of state derivative models.
//!
//! A partial of a model contribution for one body is a block of rows (3 for
//! an acceleration, 1 for a mass rate) with one column per component of the
//! state or parameter it is taken with respect to. Blocks are accumulated by
//! [`VariationalEquations`](crate::VariationalEquations).

mod gravity;
mod mass_rate;
mod thrust;

pub use mass_rate::MassRatePartial;

use nalgebra::DMatrix;
use skein_core::ParameterId;

use crate::{BodyId, Environment, Error, StateReference};

/// Sensitivities of a model's contribution to the state derivative of `body`.
///
/// Both methods return `Ok(None)` when the contribution does not depend on
/// the requested state or parameter. A dependency that exists but is not
/// implemented is an error, never a silent zero.
pub trait StateDerivativePartial: Send + Sync {
    /// Returns the partial with respect to a body's state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedStateCoupling`] if the dependency is not
    /// implemented, or an error from the environment.
    fn wrt_state(
        &self,
        env: &Environment<'_>,
        body: BodyId,
        state: StateReference,
    ) -> Result<Option<DMatrix<f64>>, Error>;

    /// Returns the partial with respect to a parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment lacks required data.
    fn wrt_parameter(
        &self,
        env: &Environment<'_>,
        body: BodyId,
        parameter: &ParameterId,
    ) -> Result<Option<DMatrix<f64>>, Error>;
}
