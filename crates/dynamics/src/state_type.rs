use std::fmt;

use crate::BodyId;

/// The kinds of dynamical state a composer can integrate.
///
/// The declaration order is the block order in the composed state vector:
/// translational blocks come first, custom blocks last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegratedStateType {
    Translational,
    Rotational,
    BodyMass,
    Custom,
}

impl fmt::Display for IntegratedStateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Translational => "translational",
            Self::Rotational => "rotational",
            Self::BodyMass => "mass",
            Self::Custom => "custom",
        })
    }
}

/// A body's state of one kind, used as the independent variable of a partial.
///
/// Translational states have 6 components, rotational states 7 (quaternion
/// and angular velocity) and mass states 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateReference {
    Translational(BodyId),
    Rotational(BodyId),
    Mass(BodyId),
}

impl StateReference {
    /// Returns the referenced body.
    #[must_use]
    pub fn body(&self) -> BodyId {
        match self {
            Self::Translational(body) | Self::Rotational(body) | Self::Mass(body) => *body,
        }
    }

    /// Returns the kind of the referenced state.
    #[must_use]
    pub fn state_type(&self) -> IntegratedStateType {
        match self {
            Self::Translational(_) => IntegratedStateType::Translational,
            Self::Rotational(_) => IntegratedStateType::Rotational,
            Self::Mass(_) => IntegratedStateType::BodyMass,
        }
    }

    /// Returns the number of state components.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Translational(_) => 6,
            Self::Rotational(_) => 7,
            Self::Mass(_) => 1,
        }
    }
}
