use skein_core::EphemerisError;

use crate::IntegratedStateType;

/// Errors from dynamics models, the composer and dynamics partials.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum Error {
    /// A sensitivity between two kinds of dynamical state is not implemented.
    ///
    /// This is not a statement that the coupling is zero. Callers that know
    /// the coupling is negligible for their problem may treat it as zero.
    #[error("partial of {dynamics} dynamics with respect to {state} state is not supported")]
    UnsupportedStateCoupling {
        dynamics: IntegratedStateType,
        state: IntegratedStateType,
    },

    #[error("no partial derivatives available for {0}")]
    PartialUnavailable(String),

    #[error("unknown body `{0}`")]
    UnknownBody(String),

    #[error("body `{0}` is already registered")]
    DuplicateBody(String),

    #[error("no {kind} state available for body `{body}`")]
    MissingState { body: String, kind: IntegratedStateType },

    #[error("body `{body}` has no {property}")]
    MissingProperty {
        body: String,
        property: &'static str,
    },

    #[error("inertia tensor of body `{0}` is singular")]
    SingularInertia(String),

    #[error("state has {actual} entries, expected {expected}")]
    StateSizeMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
}
