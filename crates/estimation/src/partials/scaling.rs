use nalgebra::{RowVector3, Vector3};
use skein_core::constants::SPEED_OF_LIGHT;

use crate::{Error, LinkEndGeometry, LinkEndRole};

/// Maps link end position partials of a one-way range into range partials.
///
/// With `n̂` the unit vector from the receiver to the transmitter, moving the
/// transmitter by `δr` changes the geometric range by `n̂ · δr` and moving
/// the receiver changes it by `−n̂ · δr`. While the signal travels, the link
/// end whose time is not fixed moves too, which scales both by
///
/// ```text
/// s = 1 / (1 + n̂ · v / c)
/// ```
///
/// where `v` is the velocity of the transmitter when the receiver time is
/// fixed and of the receiver when the transmitter time is fixed. The same
/// factor scales light-time correction partials.
///
/// [`update`](Self::update) must be called with the geometry of each
/// observation before its partials are requested. The scaling remembers that
/// geometry and [`OneWayRangePartial`](super::OneWayRangePartial) refuses to
/// use it with any other one.
#[derive(Debug, Clone, Default)]
pub struct OneWayRangeScaling {
    current: Option<Scaling>,
}

#[derive(Debug, Clone)]
struct Scaling {
    geometry: LinkEndGeometry,
    direction: RowVector3<f64>,
    receiver_fixed: f64,
    transmitter_fixed: f64,
}

impl OneWayRangeScaling {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the scaling for a new observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLinkEndRole`] if the geometry is not one-way.
    pub fn update(&mut self, geometry: &LinkEndGeometry) -> Result<(), Error> {
        if geometry.entries().len() != 2 {
            return Err(Error::InvalidLinkEndRole(geometry.entries()[1].role));
        }
        let transmitter = geometry.transmitter().state;
        let receiver = geometry.receiver().state;

        let range: Vector3<f64> =
            transmitter.fixed_rows::<3>(0) - receiver.fixed_rows::<3>(0);
        let direction = range.normalize();
        let coupling = |velocity: Vector3<f64>| 1.0 / (1.0 + direction.dot(&velocity) / SPEED_OF_LIGHT);

        self.current = Some(Scaling {
            geometry: geometry.clone(),
            direction: direction.transpose(),
            receiver_fixed: coupling(transmitter.fixed_rows::<3>(3).into_owned()),
            transmitter_fixed: coupling(receiver.fixed_rows::<3>(3).into_owned()),
        });
        Ok(())
    }

    /// Whether the scaling was last updated with `geometry`.
    #[must_use]
    pub fn is_current_for(&self, geometry: &LinkEndGeometry) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| current.geometry == *geometry)
    }

    /// Range partial with respect to the position of `role` (1 × 3), with
    /// time fixed at `fixed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleScaling`] if the scaling was never updated,
    /// [`Error::InvalidReferenceLinkEnd`] if `fixed` is not the transmitter
    /// or receiver, and [`Error::InvalidLinkEndRole`] if `role` is not.
    pub fn scaling_factor(&self, role: LinkEndRole, fixed: LinkEndRole) -> Result<RowVector3<f64>, Error> {
        let coupling = self.light_time_partial_scaling_factor(fixed)?;
        let direction = self.current()?.direction;
        match role {
            LinkEndRole::Transmitter => Ok(direction * coupling),
            LinkEndRole::Receiver => Ok(-direction * coupling),
            LinkEndRole::Retransmitter(_) => Err(Error::InvalidLinkEndRole(role)),
        }
    }

    /// Light-time coupling factor `s` with time fixed at `fixed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleScaling`] if the scaling was never updated and
    /// [`Error::InvalidReferenceLinkEnd`] if `fixed` is not the transmitter
    /// or receiver.
    pub fn light_time_partial_scaling_factor(&self, fixed: LinkEndRole) -> Result<f64, Error> {
        let current = self.current()?;
        match fixed {
            LinkEndRole::Transmitter => Ok(current.transmitter_fixed),
            LinkEndRole::Receiver => Ok(current.receiver_fixed),
            LinkEndRole::Retransmitter(_) => Err(Error::InvalidReferenceLinkEnd(fixed)),
        }
    }

    fn current(&self) -> Result<&Scaling, Error> {
        self.current.as_ref().ok_or(Error::StaleScaling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use nalgebra::Vector6;

    fn geometry(reference: LinkEndRole) -> LinkEndGeometry {
        LinkEndGeometry::one_way(
            (0.0, Vector6::new(3.0e8, 4.0e8, 0.0, 0.0, 0.0, 0.0)),
            (5.0, Vector6::new(0.0, 0.0, 0.0, 3.0e4, 0.0, 0.0)),
            reference,
        )
        .unwrap()
    }

    #[test]
    fn receiver_partial_has_opposite_sign() {
        let mut scaling = OneWayRangeScaling::new();
        scaling.update(&geometry(LinkEndRole::Receiver)).unwrap();

        for fixed in [LinkEndRole::Transmitter, LinkEndRole::Receiver] {
            let transmitter = scaling.scaling_factor(LinkEndRole::Transmitter, fixed).unwrap();
            let receiver = scaling.scaling_factor(LinkEndRole::Receiver, fixed).unwrap();
            assert_eq!(receiver, -transmitter);
        }
    }

    #[test]
    fn perturbation_along_direction_changes_range_by_epsilon() {
        let mut scaling = OneWayRangeScaling::new();
        scaling.update(&geometry(LinkEndRole::Receiver)).unwrap();

        // Unit vector from the receiver to the transmitter.
        let direction = Vector3::new(0.6, 0.8, 0.0);
        let epsilon = 1.0;

        // The transmitter is at rest, so there is no coupling with the
        // receiver time fixed.
        let fixed = LinkEndRole::Receiver;
        let transmitter = scaling.scaling_factor(LinkEndRole::Transmitter, fixed).unwrap();
        let receiver = scaling.scaling_factor(LinkEndRole::Receiver, fixed).unwrap();
        assert_relative_eq!((transmitter * direction * epsilon)[0], epsilon, epsilon = 1e-15);
        assert_relative_eq!((receiver * direction * epsilon)[0], -epsilon, epsilon = 1e-15);
    }

    #[test]
    fn coupling_uses_velocity_of_moving_link_end() {
        let mut scaling = OneWayRangeScaling::new();
        scaling.update(&geometry(LinkEndRole::Transmitter)).unwrap();

        // The receiver moves at 3e4 m/s along x, n̂ · v = 0.6 * 3e4.
        let expected = 1.0 / (1.0 + 0.6 * 3.0e4 / SPEED_OF_LIGHT);
        assert_relative_eq!(
            scaling.light_time_partial_scaling_factor(LinkEndRole::Transmitter).unwrap(),
            expected,
            max_relative = 1e-15
        );
        assert_eq!(scaling.light_time_partial_scaling_factor(LinkEndRole::Receiver).unwrap(), 1.0);
    }

    #[test]
    fn rejects_unknown_roles_and_missing_update() {
        let mut scaling = OneWayRangeScaling::new();
        assert!(matches!(
            scaling.scaling_factor(LinkEndRole::Transmitter, LinkEndRole::Receiver),
            Err(Error::StaleScaling)
        ));

        let geometry = geometry(LinkEndRole::Receiver);
        scaling.update(&geometry).unwrap();
        assert!(scaling.is_current_for(&geometry));

        assert!(matches!(
            scaling.light_time_partial_scaling_factor(LinkEndRole::Retransmitter(0)),
            Err(Error::InvalidReferenceLinkEnd(LinkEndRole::Retransmitter(0)))
        ));
        assert!(matches!(
            scaling.scaling_factor(LinkEndRole::Retransmitter(0), LinkEndRole::Receiver),
            Err(Error::InvalidLinkEndRole(LinkEndRole::Retransmitter(0)))
        ));
    }
}
