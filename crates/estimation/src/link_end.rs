use std::fmt;

use nalgebra::Vector6;

use crate::Error;

/// The part a link end plays in an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkEndRole {
    Transmitter,
    /// The n-th intermediate link end of a multi-leg observation, counted
    /// from the transmitter.
    Retransmitter(usize),
    Receiver,
}

impl fmt::Display for LinkEndRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transmitter => f.write_str("transmitter"),
            Self::Retransmitter(index) => write!(f, "retransmitter {index}"),
            Self::Receiver => f.write_str("receiver"),
        }
    }
}

/// Time and Cartesian state of one link end during an observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkEndState {
    pub role: LinkEndRole,
    /// Time in seconds at which the link end sent or received the signal.
    pub time: f64,
    pub state: Vector6<f64>,
}

/// Times and states of all link ends of one observation.
///
/// Entries are ordered from the transmitter to the receiver: a one-way
/// observation has two entries and an n-way observation has `n + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEndGeometry {
    entries: Vec<LinkEndState>,
    reference: LinkEndRole,
}

impl LinkEndGeometry {
    /// Creates a geometry from entries ordered from transmitter to receiver.
    /// There are always at least two entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLinkEndRole`] if the first entry is not the
    /// transmitter, the last is not the receiver, or an intermediate entry is
    /// not the next retransmitter. Returns
    /// [`Error::InvalidReferenceLinkEnd`] if `reference` is not one of the
    /// entries.
    pub fn new(entries: Vec<LinkEndState>, reference: LinkEndRole) -> Result<Self, Error> {
        let last = entries.len().saturating_sub(1);
        for (index, entry) in entries.iter().enumerate() {
            let expected = match index {
                0 => LinkEndRole::Transmitter,
                i if i == last => LinkEndRole::Receiver,
                i => LinkEndRole::Retransmitter(i - 1),
            };
            if entry.role != expected || entries.len() < 2 {
                return Err(Error::InvalidLinkEndRole(entry.role));
            }
        }
        if !entries.iter().any(|entry| entry.role == reference) {
            return Err(Error::InvalidReferenceLinkEnd(reference));
        }
        Ok(Self { entries, reference })
    }

    /// Creates the geometry of a one-way observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReferenceLinkEnd`] unless `reference` is the
    /// transmitter or the receiver.
    pub fn one_way(
        transmitter: (f64, Vector6<f64>),
        receiver: (f64, Vector6<f64>),
        reference: LinkEndRole,
    ) -> Result<Self, Error> {
        Self::new(
            vec![
                LinkEndState {
                    role: LinkEndRole::Transmitter,
                    time: transmitter.0,
                    state: transmitter.1,
                },
                LinkEndState {
                    role: LinkEndRole::Receiver,
                    time: receiver.0,
                    state: receiver.1,
                },
            ],
            reference,
        )
    }

    #[must_use]
    pub fn entries(&self) -> &[LinkEndState] {
        &self.entries
    }

    /// The link end whose time was fixed when the observation was computed.
    #[must_use]
    pub fn reference(&self) -> LinkEndRole {
        self.reference
    }

    /// The first link end of the observation.
    #[must_use]
    pub fn transmitter(&self) -> &LinkEndState {
        &self.entries[0]
    }

    /// The last link end of the observation.
    #[must_use]
    pub fn receiver(&self) -> &LinkEndState {
        &self.entries[self.entries.len() - 1]
    }

    /// Returns the entry of the given role.
    #[must_use]
    pub fn get(&self, role: LinkEndRole) -> Option<&LinkEndState> {
        self.entries.iter().find(|entry| entry.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: LinkEndRole, time: f64) -> LinkEndState {
        LinkEndState {
            role,
            time,
            state: Vector6::zeros(),
        }
    }

    #[test]
    fn accepts_ordered_link_ends() {
        let geometry = LinkEndGeometry::new(
            vec![
                entry(LinkEndRole::Transmitter, 0.0),
                entry(LinkEndRole::Retransmitter(0), 1.0),
                entry(LinkEndRole::Receiver, 2.0),
            ],
            LinkEndRole::Receiver,
        )
        .unwrap();

        assert_eq!(geometry.entries().len(), 3);
        assert_eq!(geometry.transmitter().time, 0.0);
        assert_eq!(geometry.receiver().time, 2.0);
        assert_eq!(geometry.get(LinkEndRole::Retransmitter(0)).map(|e| e.time), Some(1.0));
    }

    #[test]
    fn rejects_misordered_link_ends() {
        assert!(matches!(
            LinkEndGeometry::new(
                vec![entry(LinkEndRole::Receiver, 0.0), entry(LinkEndRole::Transmitter, 1.0)],
                LinkEndRole::Receiver,
            ),
            Err(Error::InvalidLinkEndRole(LinkEndRole::Receiver))
        ));
        assert!(matches!(
            LinkEndGeometry::one_way(
                (0.0, Vector6::zeros()),
                (1.0, Vector6::zeros()),
                LinkEndRole::Retransmitter(0)
            ),
            Err(Error::InvalidReferenceLinkEnd(LinkEndRole::Retransmitter(0)))
        ));
    }
}
