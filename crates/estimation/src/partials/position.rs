use std::{ops::Range, sync::Arc};

use nalgebra::{DMatrix, Vector6};
use skein_core::ParameterId;
use skein_dynamics::{IntegratedStateType, StateReference, VariationalEquations};
use skein_solvers::trajectory::Trajectory;

use crate::{Error, partials::PositionPartial};

/// Partial of a link end position with respect to that position itself.
///
/// Used for estimated link end positions, such as ground stations.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkEndPositionPartial;

impl PositionPartial for LinkEndPositionPartial {
    fn partial(&self, _state: &Vector6<f64>, _time: f64) -> Result<DMatrix<f64>, Error> {
        Ok(DMatrix::identity(3, 3))
    }
}

/// Partial of a propagated body's position with respect to its initial state.
///
/// Reads the position rows of the sensitivity matrix from a trajectory of
/// augmented states produced by propagating [`VariationalEquations`].
#[derive(Debug, Clone)]
pub struct InitialStatePositionPartial {
    trajectory: Arc<Trajectory<f64>>,
    state_size: usize,
    sensitivity_offset: usize,
    position_row: usize,
    columns: Range<usize>,
}

impl InitialStatePositionPartial {
    /// Creates the partial for `body` from a propagated trajectory.
    ///
    /// # Errors
    ///
    /// Fails if `body` is unknown, its translational state is not propagated,
    /// or its initial state is not one of the variational parameters.
    pub fn new(
        variational: &VariationalEquations,
        trajectory: Arc<Trajectory<f64>>,
        body: &str,
    ) -> Result<Self, Error> {
        let composer = variational.composer();
        let id = composer.registry().id(body)?;
        let missing = || skein_dynamics::Error::MissingState {
            body: body.to_owned(),
            kind: IntegratedStateType::Translational,
        };

        let rows = composer
            .state_range(StateReference::Translational(id))
            .ok_or_else(missing)?;
        let columns = variational
            .parameter_columns(&ParameterId::InitialTranslationalState {
                body: body.to_owned(),
            })
            .ok_or_else(|| {
                skein_dynamics::Error::PartialUnavailable(format!("the initial state of {body}"))
            })?;

        let n = variational.state_size();
        Ok(Self {
            trajectory,
            state_size: n,
            sensitivity_offset: n + n * n,
            position_row: rows.start,
            columns,
        })
    }
}

impl PositionPartial for InitialStatePositionPartial {
    fn partial(&self, _state: &Vector6<f64>, time: f64) -> Result<DMatrix<f64>, Error> {
        let augmented = self.trajectory.state_at(time)?;
        let n = self.state_size;
        Ok(DMatrix::from_fn(3, self.columns.len(), |i, j| {
            let column = self.columns.start + j;
            augmented[self.sensitivity_offset + column * n + self.position_row + i]
        }))
    }
}
