use std::ops::Range;
use std::sync::Arc;

use nalgebra::DVector;
use skein_core::{OdeProblem, TimeType};

use crate::{
    BodyRegistry, Environment, Error, IntegratedStateType, SingleStateDerivative,
    StateDerivativeModel, StateReference,
};

/// A model and the ranges its block occupies in the composed state.
pub struct StateBlock {
    model: StateDerivativeModel,
    internal: Range<usize>,
    conventional: Range<usize>,
}

impl StateBlock {
    #[must_use]
    pub fn model(&self) -> &StateDerivativeModel {
        &self.model
    }

    /// Range of the block in the internal (integrated) state.
    #[must_use]
    pub fn internal(&self) -> Range<usize> {
        self.internal.clone()
    }

    /// Range of the block in the conventional state.
    #[must_use]
    pub fn conventional(&self) -> Range<usize> {
        self.conventional.clone()
    }
}

/// Combines state derivative models into a single first-order system.
///
/// Blocks are ordered by [`IntegratedStateType`] and keep their insertion
/// order within a type. Before any block derivative is computed, every block
/// writes its current states into the [`Environment`], so models always see
/// the propagated states of all bodies at the same instant.
pub struct StateDerivativeComposer {
    registry: Arc<BodyRegistry>,
    blocks: Vec<StateBlock>,
    internal_size: usize,
    conventional_size: usize,
}

impl StateDerivativeComposer {
    /// Creates a composer over the given models.
    pub fn new(registry: Arc<BodyRegistry>, mut models: Vec<StateDerivativeModel>) -> Self {
        models.sort_by_key(SingleStateDerivative::state_type);

        let mut internal_size = 0;
        let mut conventional_size = 0;
        let blocks = models
            .into_iter()
            .map(|model| {
                let internal = internal_size..internal_size + model.internal_size();
                let conventional = conventional_size..conventional_size + model.conventional_size();
                internal_size = internal.end;
                conventional_size = conventional.end;
                StateBlock {
                    model,
                    internal,
                    conventional,
                }
            })
            .collect();

        Self {
            registry,
            blocks,
            internal_size,
            conventional_size,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<BodyRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn blocks(&self) -> &[StateBlock] {
        &self.blocks
    }

    #[must_use]
    pub fn internal_size(&self) -> usize {
        self.internal_size
    }

    #[must_use]
    pub fn conventional_size(&self) -> usize {
        self.conventional_size
    }

    /// Returns the range of a body's state in the internal composed state.
    #[must_use]
    pub fn state_range(&self, reference: StateReference) -> Option<Range<usize>> {
        self.blocks
            .iter()
            .filter(|block| block.model.state_type() == reference.state_type())
            .find_map(|block| {
                let bodies = block.model.bodies();
                let index = bodies.iter().position(|body| *body == reference.body())?;
                let per_body = block.internal.len() / bodies.len();
                let start = block.internal.start + index * per_body;
                Some(start..start + per_body)
            })
    }

    /// Builds the environment seen by models at `time` for a composed state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateSizeMismatch`] if `state` is not an internal
    /// composed state.
    pub fn environment(&self, time: f64, state: &DVector<f64>) -> Result<Environment<'_>, Error> {
        self.check_size(self.internal_size, state.len())?;

        let mut env = Environment::new(&self.registry, time);
        for block in &self.blocks {
            block
                .model
                .update_environment(&state.as_slice()[block.internal()], &mut env);
        }
        Ok(env)
    }

    /// Computes the derivative of the composed state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state has the wrong size or any model fails.
    pub fn compute_state_derivative(
        &self,
        time: f64,
        state: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        let env = self.environment(time, state)?;

        let mut derivative = DVector::zeros(self.internal_size);
        for block in &self.blocks {
            let range = block.internal();
            let block_derivative = block.model.derivative(&env, &state.as_slice()[range.clone()])?;
            derivative.rows_mut(range.start, range.len()).copy_from(&block_derivative);
        }
        Ok(derivative)
    }

    /// Converts an internal composed state to the conventional representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateSizeMismatch`] if `internal` has the wrong size.
    pub fn to_conventional(&self, internal: &DVector<f64>) -> Result<DVector<f64>, Error> {
        self.check_size(self.internal_size, internal.len())?;

        let mut conventional = DVector::zeros(self.conventional_size);
        for block in &self.blocks {
            let range = block.conventional();
            let converted = block.model.to_conventional(&internal.as_slice()[block.internal()]);
            conventional.rows_mut(range.start, range.len()).copy_from(&converted);
        }
        Ok(conventional)
    }

    /// Converts a conventional composed state to the internal representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateSizeMismatch`] if `conventional` has the wrong size.
    pub fn from_conventional(&self, conventional: &DVector<f64>) -> Result<DVector<f64>, Error> {
        self.check_size(self.conventional_size, conventional.len())?;

        let mut internal = DVector::zeros(self.internal_size);
        for block in &self.blocks {
            let range = block.internal();
            let converted = block
                .model
                .from_conventional(&conventional.as_slice()[block.conventional()]);
            internal.rows_mut(range.start, range.len()).copy_from(&converted);
        }
        Ok(internal)
    }

    /// Whether any block modifies accepted states.
    #[must_use]
    pub fn requires_post_processing(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| block.model.requires_post_processing())
    }

    /// Applies each block's post-processing to an internal composed state.
    pub fn post_process(&self, state: &mut DVector<f64>) {
        for block in &self.blocks {
            if block.model.requires_post_processing() {
                block
                    .model
                    .post_process(&mut state.as_mut_slice()[block.internal()]);
            }
        }
    }

    /// Returns whether the composer integrates states of the given kind.
    #[must_use]
    pub fn contains(&self, state_type: IntegratedStateType) -> bool {
        self.blocks
            .iter()
            .any(|block| block.model.state_type() == state_type)
    }

    fn check_size(&self, expected: usize, actual: usize) -> Result<(), Error> {
        if expected == actual {
            Ok(())
        } else {
            Err(Error::StateSizeMismatch { expected, actual })
        }
    }
}

impl<T: TimeType> OdeProblem<T> for StateDerivativeComposer {
    type Error = Error;

    fn derivative(&self, time: T, state: &DVector<f64>) -> Result<DVector<f64>, Self::Error> {
        self.compute_state_derivative(time.to_seconds(), state)
    }

    fn finalize_step(&self, _time: T, mut state: DVector<f64>) -> Result<DVector<f64>, Self::Error> {
        self.post_process(&mut state);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3, dvector};
    use skein_core::ConstantEphemeris;

    use crate::{
        Body, BodyId, CustomDynamics, ExponentialMapAttitude, MassDynamics, RotationalDynamics,
        TranslationalDynamics,
        models::{MassRateModel, PointMassGravity},
    };

    fn scenario() -> (Arc<BodyRegistry>, BodyId, BodyId) {
        let mut registry = BodyRegistry::new();
        let earth = registry
            .add(
                Body::new("Earth")
                    .with_gravitational_parameter(4.0e14)
                    .with_ephemeris(ConstantEphemeris::at_rest(0.0, 0.0, 0.0)),
            )
            .unwrap();
        let sat = registry
            .add(
                Body::new("Sat")
                    .with_mass(100.0)
                    .with_inertia(Matrix3::from_diagonal(&Vector3::new(1.0, 2.0, 3.0))),
            )
            .unwrap();
        (Arc::new(registry), earth, sat)
    }

    fn composer(registry: Arc<BodyRegistry>, earth: BodyId, sat: BodyId) -> StateDerivativeComposer {
        StateDerivativeComposer::new(
            registry,
            vec![
                CustomDynamics::new("clock", 1, |_, _| dvector![1.0]).into(),
                MassDynamics::new()
                    .with_body(sat, MassRateModel::custom(|_| -0.5))
                    .into(),
                ExponentialMapAttitude::new(RotationalDynamics::new().with_body(sat, vec![])).into(),
                TranslationalDynamics::new()
                    .with_body(sat, vec![Box::new(PointMassGravity::new(earth))])
                    .into(),
            ],
        )
    }

    #[test]
    fn orders_blocks_by_state_type() {
        let (registry, earth, sat) = scenario();
        let composer = composer(registry, earth, sat);

        let types: Vec<_> = composer.blocks().iter().map(|b| b.model().state_type()).collect();
        assert_eq!(
            types,
            [
                IntegratedStateType::Translational,
                IntegratedStateType::Rotational,
                IntegratedStateType::BodyMass,
                IntegratedStateType::Custom,
            ]
        );
        assert_eq!(composer.internal_size(), 6 + 6 + 1 + 1);
        assert_eq!(composer.conventional_size(), 6 + 7 + 1 + 1);
        assert_eq!(composer.blocks()[2].internal(), 12..13);
        assert_eq!(composer.blocks()[2].conventional(), 13..14);
        assert_eq!(composer.state_range(StateReference::Mass(sat)), Some(12..13));
        assert_eq!(composer.state_range(StateReference::Translational(earth)), None);
        assert!(composer.requires_post_processing());
    }

    #[test]
    fn dispatches_each_block() {
        let (registry, earth, sat) = scenario();
        let composer = composer(registry, earth, sat);

        let state = dvector![2.0e7, 0.0, 0.0, 0.0, 4.0e3, 0.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 90.0, 5.0];
        let derivative = composer.compute_state_derivative(0.0, &state).unwrap();

        assert_relative_eq!(derivative[1], 4.0e3);
        assert_relative_eq!(derivative[3], -4.0e14 / 4.0e14);
        assert!(derivative.rows(6, 6).iter().all(|rate| *rate == 0.0));
        assert_eq!(derivative[12], -0.5);
        assert_eq!(derivative[13], 1.0);

        let env = composer.environment(0.0, &state).unwrap();
        assert_eq!(env.mass(sat), Ok(90.0));
    }

    #[test]
    fn converts_between_representations() {
        let (registry, earth, sat) = scenario();
        let composer = composer(registry, earth, sat);

        let internal = DVector::from_iterator(14, (0..14).map(|i| 0.1 * f64::from(i)));
        let conventional = composer.to_conventional(&internal).unwrap();
        assert_eq!(conventional.len(), 15);
        assert_eq!(conventional[14], internal[13]);

        let back = composer.from_conventional(&conventional).unwrap();
        assert_relative_eq!(back, internal, epsilon = 1e-14);
    }

    #[test]
    fn rejects_wrong_state_sizes() {
        let (registry, earth, sat) = scenario();
        let composer = composer(registry, earth, sat);

        assert_eq!(
            composer.compute_state_derivative(0.0, &DVector::zeros(3)),
            Err(Error::StateSizeMismatch {
                expected: 14,
                actual: 3
            })
        );
    }
}
