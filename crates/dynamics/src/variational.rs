use std::ops::Range;

use nalgebra::{DMatrix, DVector};
use skein_core::{OdeProblem, ParameterId, TimeType};

use crate::{
    BodyId, Environment, Error, IntegratedStateType, SingleStateDerivative,
    StateDerivativeComposer, StateDerivativeModel, StateReference,
    partials::StateDerivativePartial,
};

/// Propagates a composed state together with its sensitivities.
///
/// The augmented state is `[x, vec(Φ), vec(S)]`, where `Φ = ∂x/∂x₀` is the
/// state transition matrix and `S = ∂x/∂p` holds the sensitivities to the
/// parameters, both stored column by column. They obey
///
/// ```text
/// Φ̇ = A Φ
/// Ṡ = A S + B
/// ```
///
/// with `A = ∂f/∂x` and `B = ∂f/∂p` assembled from the models' partials.
/// Initial-state parameters start with `S` selecting the corresponding state
/// components and have `B = 0`.
///
/// Only translational and mass blocks are supported.
pub struct VariationalEquations {
    composer: StateDerivativeComposer,
    parameters: Vec<ParameterId>,
    columns: Vec<Range<usize>>,
    references: Vec<(StateReference, Range<usize>)>,
}

impl VariationalEquations {
    /// Creates variational equations for a composer and a parameter list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedStateCoupling`] if the composer integrates
    /// rotational or custom states.
    pub fn new(composer: StateDerivativeComposer, parameters: Vec<ParameterId>) -> Result<Self, Error> {
        let mut references = Vec::new();
        for block in composer.blocks() {
            let model = block.model();
            let make_reference: fn(BodyId) -> StateReference = match model.state_type() {
                IntegratedStateType::Translational => StateReference::Translational,
                IntegratedStateType::BodyMass => StateReference::Mass,
                unsupported => {
                    return Err(Error::UnsupportedStateCoupling {
                        dynamics: unsupported,
                        state: unsupported,
                    });
                }
            };
            for body in model.bodies() {
                let reference = make_reference(*body);
                if let Some(range) = composer.state_range(reference) {
                    references.push((reference, range));
                }
            }
        }

        let mut offset = 0;
        let columns = parameters
            .iter()
            .map(|parameter| {
                let range = offset..offset + parameter.size();
                offset = range.end;
                range
            })
            .collect();

        Ok(Self {
            composer,
            parameters,
            columns,
            references,
        })
    }

    #[must_use]
    pub fn composer(&self) -> &StateDerivativeComposer {
        &self.composer
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    /// Returns the columns of `S` that belong to `parameter`.
    #[must_use]
    pub fn parameter_columns(&self, parameter: &ParameterId) -> Option<Range<usize>> {
        self.parameters
            .iter()
            .position(|p| p == parameter)
            .map(|index| self.columns[index].clone())
    }

    /// Size of the composed state.
    #[must_use]
    pub fn state_size(&self) -> usize {
        self.composer.internal_size()
    }

    /// Total number of parameter components.
    #[must_use]
    pub fn parameter_size(&self) -> usize {
        self.columns.last().map_or(0, |range| range.end)
    }

    /// Size of the augmented state.
    #[must_use]
    pub fn augmented_size(&self) -> usize {
        let n = self.state_size();
        n + n * n + n * self.parameter_size()
    }

    /// Builds the augmented initial state from a composed state.
    ///
    /// # Errors
    ///
    /// Fails if the state has the wrong size, or if an initial-state
    /// parameter names a body whose translational state is not propagated.
    pub fn initial_state(&self, state: &DVector<f64>) -> Result<DVector<f64>, Error> {
        let n = self.state_size();
        if state.len() != n {
            return Err(Error::StateSizeMismatch {
                expected: n,
                actual: state.len(),
            });
        }

        let mut sensitivity = DMatrix::zeros(n, self.parameter_size());
        for (parameter, columns) in self.parameters.iter().zip(&self.columns) {
            if let ParameterId::InitialTranslationalState { body } = parameter {
                let id = self.composer.registry().id(body)?;
                let rows = self
                    .composer
                    .state_range(StateReference::Translational(id))
                    .ok_or_else(|| Error::MissingState {
                        body: body.clone(),
                        kind: IntegratedStateType::Translational,
                    })?;
                for (row, column) in rows.zip(columns.clone()) {
                    sensitivity[(row, column)] = 1.0;
                }
            }
        }

        let mut augmented = DVector::zeros(self.augmented_size());
        augmented.rows_mut(0, n).copy_from(state);
        augmented
            .rows_mut(n, n * n)
            .copy_from_slice(DMatrix::<f64>::identity(n, n).as_slice());
        augmented
            .rows_mut(n + n * n, sensitivity.len())
            .copy_from_slice(sensitivity.as_slice());
        Ok(augmented)
    }

    /// Splits an augmented state into the state, `Φ` and `S`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateSizeMismatch`] if `augmented` has the wrong size.
    pub fn split(
        &self,
        augmented: &DVector<f64>,
    ) -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), Error> {
        if augmented.len() != self.augmented_size() {
            return Err(Error::StateSizeMismatch {
                expected: self.augmented_size(),
                actual: augmented.len(),
            });
        }

        let n = self.state_size();
        let p = self.parameter_size();
        let values = augmented.as_slice();
        Ok((
            DVector::from_column_slice(&values[..n]),
            DMatrix::from_column_slice(n, n, &values[n..n + n * n]),
            DMatrix::from_column_slice(n, p, &values[n + n * n..]),
        ))
    }

    /// Assembles `A = ∂f/∂x` at the environment's state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartialUnavailable`] if a model provides no partials,
    /// or any error from a partial.
    pub fn state_partials(&self, env: &Environment<'_>) -> Result<DMatrix<f64>, Error> {
        let n = self.state_size();
        let mut a = DMatrix::zeros(n, n);

        self.for_each_partial(env, |row, body, partial| {
            for (reference, range) in &self.references {
                if let Some(block) = partial.wrt_state(env, body, *reference)? {
                    let mut target = a.view_mut((row, range.start), block.shape());
                    target += &block;
                }
            }
            Ok(())
        })?;

        // Kinematics: the position derivative is the velocity.
        for (reference, range) in &self.references {
            if let StateReference::Translational(_) = reference {
                a.view_mut((range.start, range.start + 3), (3, 3))
                    .fill_with_identity();
            }
        }
        Ok(a)
    }

    /// Assembles `B = ∂f/∂p` at the environment's state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartialUnavailable`] if a model provides no partials,
    /// or any error from a partial.
    pub fn parameter_partials(&self, env: &Environment<'_>) -> Result<DMatrix<f64>, Error> {
        let mut b = DMatrix::zeros(self.state_size(), self.parameter_size());

        self.for_each_partial(env, |row, body, partial| {
            for (parameter, columns) in self.parameters.iter().zip(&self.columns) {
                if let Some(block) = partial.wrt_parameter(env, body, parameter)? {
                    let mut target = b.view_mut((row, columns.start), block.shape());
                    target += &block;
                }
            }
            Ok(())
        })?;
        Ok(b)
    }

    /// Visits every model partial with the first state row it contributes to.
    fn for_each_partial(
        &self,
        env: &Environment<'_>,
        mut visit: impl FnMut(usize, BodyId, &dyn StateDerivativePartial) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let registry = self.composer.registry();

        for block in self.composer.blocks() {
            let start = block.internal().start;
            match block.model() {
                StateDerivativeModel::Translational(model) => {
                    for (index, body) in model.bodies().iter().enumerate() {
                        for acceleration in model.accelerations(index) {
                            let partial = acceleration.partial().ok_or_else(|| {
                                Error::PartialUnavailable(format!(
                                    "an acceleration acting on {}",
                                    registry.name(*body)
                                ))
                            })?;
                            visit(start + 6 * index + 3, *body, partial)?;
                        }
                    }
                }
                StateDerivativeModel::BodyMass(model) => {
                    for (index, body) in model.bodies().iter().enumerate() {
                        let partial = model.rate(index).partial().ok_or_else(|| {
                            Error::PartialUnavailable(format!(
                                "the mass rate of {}",
                                registry.name(*body)
                            ))
                        })?;
                        visit(start + index, *body, &partial)?;
                    }
                }
                other => {
                    return Err(Error::UnsupportedStateCoupling {
                        dynamics: other.state_type(),
                        state: other.state_type(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<T: TimeType> OdeProblem<T> for VariationalEquations {
    type Error = Error;

    fn derivative(&self, time: T, augmented: &DVector<f64>) -> Result<DVector<f64>, Self::Error> {
        let (state, phi, sensitivity) = self.split(augmented)?;
        let time = time.to_seconds();

        let env = self.composer.environment(time, &state)?;
        let a = self.state_partials(&env)?;
        let b = self.parameter_partials(&env)?;
        let state_derivative = self.composer.compute_state_derivative(time, &state)?;

        let phi_derivative = &a * phi;
        let sensitivity_derivative = &a * sensitivity + b;

        let n = self.state_size();
        let mut derivative = DVector::zeros(augmented.len());
        derivative.rows_mut(0, n).copy_from(&state_derivative);
        derivative
            .rows_mut(n, n * n)
            .copy_from_slice(phi_derivative.as_slice());
        derivative
            .rows_mut(n + n * n, sensitivity_derivative.len())
            .copy_from_slice(sensitivity_derivative.as_slice());
        Ok(derivative)
    }

    fn finalize_step(&self, _time: T, mut augmented: DVector<f64>) -> Result<DVector<f64>, Self::Error> {
        if self.composer.requires_post_processing() {
            let n = self.state_size();
            let mut state = augmented.rows(0, n).into_owned();
            self.composer.post_process(&mut state);
            augmented.rows_mut(0, n).copy_from(&state);
        }
        Ok(augmented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Vector3, dvector};
    use skein_core::ConstantEphemeris;
    use skein_solvers::transient::runge_kutta::{
        self, CoefficientSet, Config, IntegratorState, Tolerances, coefficients,
    };
    use uom::si::{
        f64::{Force, Time},
        force::newton,
        time::second,
    };

    use crate::{
        Body, BodyRegistry, ExponentialMapAttitude, MassDynamics, RotationalDynamics,
        TranslationalDynamics,
        models::{AccelerationModel, ConstantThrustEngine, Engine, MassRateModel, PointMassGravity, ThrustAcceleration},
    };

    // --- Test fixtures ---

    const MU: f64 = 3.986_004_418e14;
    const THRUST: f64 = 1.0;
    const DURATION: f64 = 600.0;

    fn parameters() -> Vec<ParameterId> {
        vec![
            ParameterId::InitialTranslationalState { body: "Sat".into() },
            ParameterId::GravitationalParameter { body: "Earth".into() },
            ParameterId::ConstantThrustMagnitude {
                body: "Sat".into(),
                engine: "main".into(),
            },
        ]
    }

    fn composer(mu: f64, thrust: f64) -> StateDerivativeComposer {
        let mut registry = BodyRegistry::new();
        let earth = registry
            .add(
                Body::new("Earth")
                    .with_gravitational_parameter(mu)
                    .with_ephemeris(ConstantEphemeris::at_rest(0.0, 0.0, 0.0)),
            )
            .unwrap();
        let sat = registry.add(Body::new("Sat")).unwrap();

        let engine: Arc<dyn Engine> = Arc::new(ConstantThrustEngine::new(
            "main",
            Force::new::<newton>(thrust),
            Time::new::<second>(300.0),
        ));
        let direction = nalgebra::Unit::new_normalize(Vector3::new(0.2, 1.0, 0.1));
        let accelerations: Vec<Box<dyn AccelerationModel>> = vec![
            Box::new(PointMassGravity::new(earth)),
            Box::new(ThrustAcceleration::new(vec![engine.clone()], direction)),
        ];

        StateDerivativeComposer::new(
            Arc::new(registry),
            vec![
                TranslationalDynamics::new().with_body(sat, accelerations).into(),
                MassDynamics::new()
                    .with_body(sat, MassRateModel::from_thrust(vec![engine]))
                    .into(),
            ],
        )
    }

    fn initial_state() -> DVector<f64> {
        dvector![7.0e6, 1.0e5, -2.0e5, -50.0, 7.5e3, 300.0, 500.0]
    }

    fn fixed_step_config() -> Config {
        Config::new(
            Tolerances::Scalar {
                absolute: 1.0,
                relative: 1.0,
            },
            10.0,
            10.0,
        )
        .unwrap()
    }

    fn propagate<P: OdeProblem>(problem: &P, initial: DVector<f64>) -> DVector<f64> {
        let solution = runge_kutta::solve_unobserved(
            problem,
            coefficients::get(CoefficientSet::RungeKuttaFehlberg78),
            IntegratorState::new(0.0, initial, 10.0),
            DURATION,
            &fixed_step_config(),
        )
        .expect("should propagate");
        solution.history.last().expect("has samples").state.clone()
    }

    fn assert_columns_match(analytic: &DVector<f64>, numerical: &DVector<f64>) {
        for rows in [0..3, 3..6, 6..7] {
            let difference = (analytic.rows(rows.start, rows.len()) - numerical.rows(rows.start, rows.len())).norm();
            let scale = numerical.rows(rows.start, rows.len()).norm();
            assert!(
                difference <= 1e-6 * scale + 1e-12,
                "rows {rows:?}: analytic {analytic} numerical {numerical}"
            );
        }
    }

    #[test]
    fn state_transition_matrix_matches_finite_differences() {
        let variational = VariationalEquations::new(composer(MU, THRUST), parameters()).unwrap();
        let x0 = initial_state();
        let augmented = propagate(&variational, variational.initial_state(&x0).unwrap());
        let (_, phi, sensitivity) = variational.split(&augmented).unwrap();

        let nominal = composer(MU, THRUST);
        let steps = [1.0, 1.0, 1.0, 1e-3, 1e-3, 1e-3, 0.1];
        for (j, h) in steps.into_iter().enumerate() {
            let mut plus = x0.clone();
            let mut minus = x0.clone();
            plus[j] += h;
            minus[j] -= h;
            let numerical = (propagate(&nominal, plus) - propagate(&nominal, minus)) / (2.0 * h);
            assert_columns_match(&phi.column(j).into_owned(), &numerical);
        }

        // Initial-state sensitivities are the translational columns of Φ.
        let columns = variational
            .parameter_columns(&ParameterId::InitialTranslationalState { body: "Sat".into() })
            .unwrap();
        assert_eq!(columns, 0..6);
        for j in columns {
            assert_relative_eq!(
                sensitivity.column(j).into_owned(),
                phi.column(j).into_owned(),
                epsilon = 1e-12,
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn parameter_sensitivities_match_finite_differences() {
        let variational = VariationalEquations::new(composer(MU, THRUST), parameters()).unwrap();
        let x0 = initial_state();
        let augmented = propagate(&variational, variational.initial_state(&x0).unwrap());
        let (_, _, sensitivity) = variational.split(&augmented).unwrap();

        let d_mu = 1e8;
        let numerical = (propagate(&composer(MU + d_mu, THRUST), x0.clone())
            - propagate(&composer(MU - d_mu, THRUST), x0.clone()))
            / (2.0 * d_mu);
        assert_columns_match(&sensitivity.column(6).into_owned(), &numerical);

        let d_thrust = 1e-2;
        let numerical = (propagate(&composer(MU, THRUST + d_thrust), x0.clone())
            - propagate(&composer(MU, THRUST - d_thrust), x0))
            / (2.0 * d_thrust);
        assert_columns_match(&sensitivity.column(7).into_owned(), &numerical);
    }

    #[test]
    fn rejects_rotational_blocks() {
        let mut registry = BodyRegistry::new();
        let sat = registry
            .add(Body::new("Sat").with_inertia(Matrix3::identity()))
            .unwrap();
        let composer = StateDerivativeComposer::new(
            Arc::new(registry),
            vec![ExponentialMapAttitude::new(RotationalDynamics::new().with_body(sat, vec![])).into()],
        );

        assert!(matches!(
            VariationalEquations::new(composer, vec![]),
            Err(Error::UnsupportedStateCoupling {
                dynamics: IntegratedStateType::Rotational,
                ..
            })
        ));
    }

    #[test]
    fn models_without_partials_are_reported() {
        let mut registry = BodyRegistry::new();
        let sat = registry.add(Body::new("Sat")).unwrap();
        let composer = StateDerivativeComposer::new(
            Arc::new(registry),
            vec![MassDynamics::new().with_body(sat, MassRateModel::custom(|_| -1.0)).into()],
        );
        let variational = VariationalEquations::new(composer, vec![]).unwrap();
        let env = variational.composer().environment(0.0, &dvector![10.0]).unwrap();

        assert_eq!(
            variational.state_partials(&env),
            Err(Error::PartialUnavailable("the mass rate of Sat".into()))
        );
    }
}
