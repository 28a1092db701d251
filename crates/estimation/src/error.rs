use skein_core::EphemerisError;
use skein_solvers::{trajectory::TrajectoryError, transient::runge_kutta};

use crate::LinkEndRole;

/// Errors from observation models, partials and orbit determination.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The link end role cannot be used with this observable.
    #[error("link end role {0} is not valid for this observable")]
    InvalidLinkEndRole(LinkEndRole),

    /// The link end role cannot be the time-fixed reference of this observable.
    #[error("link end role {0} cannot be the reference link end")]
    InvalidReferenceLinkEnd(LinkEndRole),

    /// A scaling was used with a geometry it was not updated for.
    #[error("partial scaling is stale: update it with the current link end geometry first")]
    StaleScaling,

    #[error("light time did not converge after {iterations} iterations (last change {change:e} s)")]
    LightTimeNotConverged { iterations: usize, change: f64 },

    #[error("observation {index} refers to link {link}, but only {count} links are defined")]
    UnknownLink {
        index: usize,
        link: usize,
        count: usize,
    },

    #[error("no observations to process")]
    NoObservations,

    #[error("normal equations are singular")]
    SingularNormalEquations,

    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),

    #[error(transparent)]
    Dynamics(#[from] skein_dynamics::Error),

    #[error("propagation failed: {0}")]
    Propagation(#[from] runge_kutta::Error),

    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
}
