use std::fmt;

/// Identifies an estimatable parameter.
///
/// Dynamics partials, light-time correction partials and position partials
/// are all keyed by a `ParameterId`, so callers can sum the contributions that
/// belong to the same parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterId {
    /// Initial Cartesian state of a propagated body.
    InitialTranslationalState { body: String },

    /// Gravitational parameter (`GM`) of a body.
    GravitationalParameter { body: String },

    /// Post-Newtonian parameter gamma.
    PpnGamma,

    /// Thrust magnitude of a constant-thrust engine.
    ConstantThrustMagnitude { body: String, engine: String },

    /// Specific impulse of an engine.
    SpecificImpulse { body: String, engine: String },

    /// Position of a fixed link end, such as a ground station.
    LinkEndPosition { link_end: String },
}

impl ParameterId {
    /// Returns the number of scalar components of the parameter.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::InitialTranslationalState { .. } => 6,
            Self::LinkEndPosition { .. } => 3,
            Self::GravitationalParameter { .. }
            | Self::PpnGamma
            | Self::ConstantThrustMagnitude { .. }
            | Self::SpecificImpulse { .. } => 1,
        }
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialTranslationalState { body } => write!(f, "initial state of {body}"),
            Self::GravitationalParameter { body } => write!(f, "gravitational parameter of {body}"),
            Self::PpnGamma => write!(f, "PPN gamma"),
            Self::ConstantThrustMagnitude { body, engine } => {
                write!(f, "thrust magnitude of {body}/{engine}")
            }
            Self::SpecificImpulse { body, engine } => {
                write!(f, "specific impulse of {body}/{engine}")
            }
            Self::LinkEndPosition { link_end } => write!(f, "position of {link_end}"),
        }
    }
}
