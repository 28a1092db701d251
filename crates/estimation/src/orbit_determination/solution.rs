use nalgebra::{DMatrix, DVector};

/// Indicates how the estimation terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// An iteration changed the residual RMS by less than the convergence
    /// tolerance.
    Converged,

    /// An iteration increased the residual RMS by more than the convergence
    /// tolerance. The returned estimate is the best iterate before it.
    Diverged,

    /// Reached the iteration cap while the residual RMS was still improving.
    MaxIterationsReached,
}

/// The result of an orbit determination run.
///
/// `state` is the iterate with the lowest residual RMS and `covariance` and
/// `residuals` belong to it.
#[derive(Debug, Clone)]
pub struct Estimate {
    /// How the estimation terminated.
    pub status: Status,

    /// Estimated initial composed state.
    pub state: DVector<f64>,

    /// Formal covariance of the estimated initial Cartesian state (6 × 6).
    pub covariance: DMatrix<f64>,

    /// Observed minus computed ranges at `state`, in meters.
    pub residuals: DVector<f64>,

    /// Residual RMS of every iteration, in meters.
    pub rms_history: Vec<f64>,

    /// Number of iterations performed.
    pub iterations: usize,
}
