use std::{fmt, sync::Arc};

use skein_core::Ephemeris;

use crate::LinkEndRole;

/// A one-way range link between a station and the estimated body.
#[derive(Clone)]
pub struct Link {
    name: String,
    station: Arc<dyn Ephemeris>,
    spacecraft: LinkEndRole,
}

impl Link {
    /// A link on which the estimated body transmits and the station receives.
    pub fn downlink(name: impl Into<String>, station: Arc<dyn Ephemeris>) -> Self {
        Self {
            name: name.into(),
            station,
            spacecraft: LinkEndRole::Transmitter,
        }
    }

    /// A link on which the station transmits and the estimated body receives.
    pub fn uplink(name: impl Into<String>, station: Arc<dyn Ephemeris>) -> Self {
        Self {
            name: name.into(),
            station,
            spacecraft: LinkEndRole::Receiver,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn station(&self) -> &Arc<dyn Ephemeris> {
        &self.station
    }

    /// The role of the estimated body on this link.
    #[must_use]
    pub fn spacecraft_role(&self) -> LinkEndRole {
        self.spacecraft
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("name", &self.name)
            .field("spacecraft", &self.spacecraft)
            .finish_non_exhaustive()
    }
}

/// A one-way range measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeObservation {
    /// Index of the link in the manager's link list.
    pub link: usize,
    /// Reception time in seconds.
    pub time: f64,
    /// Measured range in meters.
    pub range: f64,
}
