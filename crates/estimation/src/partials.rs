//! Partial derivatives of observations.
//!
//! The partial of an observation with respect to a parameter is assembled
//! from two kinds of contribution:
//!
//! - For each link end whose position depends on the parameter, a
//!   [`PositionPartial`] gives `∂r/∂p` (3 × p) and the observable's scaling
//!   maps it into observation space. The scaling accounts for the motion of
//!   the link ends during the light time, so it depends on which link end
//!   had its time fixed.
//! - For each light-time correction that depends on the parameter, a
//!   [`LightTimeCorrectionPartial`] gives `∂Δτ/∂p`, which is scaled by `c`
//!   and by the same light-time coupling factor.
//!
//! Each contribution is returned as a [`PartialBlock`] tagged with the time
//! at which it was evaluated. Callers sum the blocks that belong to the same
//! parameter.

mod light_time_correction;
mod one_way_range;
mod position;
mod scaling;

pub use light_time_correction::{LightTimeCorrectionPartial, RelativisticCorrectionPartial};
pub use one_way_range::OneWayRangePartial;
pub use position::{InitialStatePositionPartial, LinkEndPositionPartial};
pub use scaling::OneWayRangeScaling;

use nalgebra::{DMatrix, RowDVector, Vector6};

use crate::Error;

/// One contribution to an observation partial.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialBlock {
    /// Observation-space partial, 1 × p for a scalar observable.
    pub jacobian: RowDVector<f64>,
    /// Time in seconds at which the contribution was evaluated.
    pub time: f64,
}

/// Sensitivity of a link end position to a parameter.
pub trait PositionPartial: Send + Sync {
    /// Returns `∂r/∂p` (3 × p) for a link end with the given state at `time`.
    ///
    /// # Errors
    ///
    /// Fails if the sensitivity is not available at `time`.
    fn partial(&self, state: &Vector6<f64>, time: f64) -> Result<DMatrix<f64>, Error>;
}

/// Sums the jacobians of a set of blocks.
///
/// Returns `None` if `blocks` is empty.
#[must_use]
pub fn sum_blocks(blocks: &[PartialBlock]) -> Option<RowDVector<f64>> {
    let (first, rest) = blocks.split_first()?;
    Some(rest.iter().fold(first.jacobian.clone(), |total, block| total + &block.jacobian))
}
