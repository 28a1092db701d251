use std::sync::Arc;

use skein_core::{ParameterId, constants::SPEED_OF_LIGHT};

use crate::{
    Error, LinkEndGeometry, LinkEndRole,
    partials::{LightTimeCorrectionPartial, OneWayRangeScaling, PartialBlock, PositionPartial},
};

/// Partial of a one-way range with respect to one parameter.
pub struct OneWayRangePartial {
    parameter: ParameterId,
    position_partials: Vec<(LinkEndRole, Arc<dyn PositionPartial>)>,
    correction_partials: Vec<Arc<dyn LightTimeCorrectionPartial>>,
}

impl OneWayRangePartial {
    #[must_use]
    pub fn new(parameter: ParameterId) -> Self {
        Self {
            parameter,
            position_partials: Vec::new(),
            correction_partials: Vec::new(),
        }
    }

    /// Adds the dependence of the position of `role` on the parameter.
    #[must_use]
    pub fn with_position_partial(mut self, role: LinkEndRole, partial: Arc<dyn PositionPartial>) -> Self {
        self.position_partials.push((role, partial));
        self
    }

    /// Adds a light-time correction that may depend on the parameter.
    #[must_use]
    pub fn with_correction_partial(mut self, partial: Arc<dyn LightTimeCorrectionPartial>) -> Self {
        self.correction_partials.push(partial);
        self
    }

    #[must_use]
    pub fn parameter(&self) -> &ParameterId {
        &self.parameter
    }

    /// Evaluates all contributions to the partial for one observation.
    ///
    /// Position contributions come first, in the order they were added, each
    /// at the time of its link end. Light-time correction contributions
    /// follow at the time of the reference link end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleScaling`] unless `scaling` was last updated with
    /// `geometry`, and any error from the scaling or the partials.
    pub fn calculate_partial(
        &self,
        geometry: &LinkEndGeometry,
        scaling: &OneWayRangeScaling,
    ) -> Result<Vec<PartialBlock>, Error> {
        if !scaling.is_current_for(geometry) {
            return Err(Error::StaleScaling);
        }
        let fixed = geometry.reference();

        let mut blocks = Vec::with_capacity(self.position_partials.len() + self.correction_partials.len());
        for (role, partial) in &self.position_partials {
            let link_end = geometry.get(*role).ok_or(Error::InvalidLinkEndRole(*role))?;
            let factor = scaling.scaling_factor(*role, fixed)?;
            blocks.push(PartialBlock {
                jacobian: factor * partial.partial(&link_end.state, link_end.time)?,
                time: link_end.time,
            });
        }

        if !self.correction_partials.is_empty() {
            let scale = SPEED_OF_LIGHT * scaling.light_time_partial_scaling_factor(fixed)?;
            let time = geometry.get(fixed).map_or(geometry.receiver().time, |link_end| link_end.time);
            for partial in &self.correction_partials {
                if let Some(jacobian) = partial.partial(geometry, &self.parameter)? {
                    blocks.push(PartialBlock {
                        jacobian: jacobian * scale,
                        time,
                    });
                }
            }
        }
        Ok(blocks)
    }
}
