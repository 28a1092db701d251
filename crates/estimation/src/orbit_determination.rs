//! Batch least-squares orbit determination from one-way range.
//!
//! # Algorithm
//!
//! The estimated parameters are the initial Cartesian state of one
//! propagated body. Each iteration
//!
//! 1. propagates the state together with its variational equations over the
//!    span of the observations and interpolates the result. The span starts a
//!    configurable light-time margin before the earliest reception, and times
//!    before the initial epoch are reached by propagating backward,
//! 2. computes every range observation through a [`OneWayRangeModel`] and
//!    its partial with respect to the initial state through a
//!    [`OneWayRangePartial`],
//! 3. solves the weighted normal equations `(HᵀWH) δx = HᵀW(y − h(x))` for
//!    the state correction with a Cholesky factorization.
//!
//! The columns of `H` are normalized before forming the normal equations,
//! since position and velocity columns differ by orders of magnitude.
//!
//! Iteration stops when the residual RMS changes by less than the configured
//! relative tolerance ([`Status::Converged`]), grows by more than it
//! ([`Status::Diverged`]), or at the iteration cap. The returned estimate is
//! the iterate with the lowest residual RMS.

mod config;
mod observation;
mod solution;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigError};
pub use observation::{Link, RangeObservation};
pub use solution::{Estimate, Status};

use std::{ops::Range, sync::Arc};

use nalgebra::{DMatrix, DVector, Vector6};
use skein_core::{Ephemeris, EphemerisError, OdeProblem, ParameterId, Sample};
use skein_dynamics::{
    IntegratedStateType, StateDerivativeComposer, StateReference, VariationalEquations,
};
use skein_solvers::{
    trajectory::Trajectory,
    transient::runge_kutta::{self, IntegratorState, coefficients},
};
use tracing::{debug, info};

use crate::{
    Error, LinkEndRole,
    light_time::IterativeLightTime,
    observation::{ObservationModel, OneWayRangeModel},
    partials::{InitialStatePositionPartial, OneWayRangePartial, OneWayRangeScaling, sum_blocks},
};

/// Estimates the initial state of a body from one-way range observations.
pub struct OrbitDeterminationManager {
    variational: VariationalEquations,
    body: String,
    rows: Range<usize>,
    links: Vec<Link>,
    config: Config,
}

/// One linearization of the problem.
#[derive(Debug, Clone)]
struct Iteration {
    state: DVector<f64>,
    rms: f64,
    residuals: DVector<f64>,
    correction: DVector<f64>,
    covariance: DMatrix<f64>,
}

impl OrbitDeterminationManager {
    /// Creates a manager estimating the initial state of `body`.
    ///
    /// # Errors
    ///
    /// Fails if `body` is unknown or its translational state is not
    /// propagated by `composer`, or if the composer holds dynamics without
    /// partials.
    pub fn new(
        composer: StateDerivativeComposer,
        body: &str,
        links: Vec<Link>,
        config: Config,
    ) -> Result<Self, Error> {
        let id = composer.registry().id(body)?;
        let rows = composer
            .state_range(StateReference::Translational(id))
            .ok_or_else(|| skein_dynamics::Error::MissingState {
                body: body.to_owned(),
                kind: IntegratedStateType::Translational,
            })?;
        let variational = VariationalEquations::new(
            composer,
            vec![ParameterId::InitialTranslationalState {
                body: body.to_owned(),
            }],
        )?;

        Ok(Self {
            variational,
            body: body.to_owned(),
            rows,
            links,
            config,
        })
    }

    #[must_use]
    pub fn variational(&self) -> &VariationalEquations {
        &self.variational
    }

    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Computes ideal range observations from a known initial state.
    ///
    /// `schedule` lists `(link, reception time)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoObservations`] for an empty schedule,
    /// [`Error::UnknownLink`] for a link index out of range, and any error
    /// from propagation or the observation models.
    pub fn simulate_observations(
        &self,
        initial_state: &DVector<f64>,
        start_time: f64,
        schedule: &[(usize, f64)],
    ) -> Result<Vec<RangeObservation>, Error> {
        for (index, (link, _)) in schedule.iter().enumerate() {
            self.check_link(index, *link)?;
        }
        let span = reception_span(schedule.iter().map(|(_, time)| *time))?;

        let trajectory = self.propagate(self.variational.composer(), initial_state.clone(), start_time, span)?;
        let models = self.range_models(&trajectory);

        schedule
            .iter()
            .map(|&(link, time)| {
                let range = models[link].compute_ideal_observation(time, LinkEndRole::Receiver)?;
                Ok(RangeObservation {
                    link,
                    time,
                    range: range[0],
                })
            })
            .collect()
    }

    /// Estimates the initial state from `observations`, starting from
    /// `initial_state` at `start_time`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoObservations`] if there are no observations,
    /// [`Error::UnknownLink`] for a link index out of range,
    /// [`Error::SingularNormalEquations`] if the observations do not
    /// determine the state, and any error from propagation, the observation
    /// models or the partials.
    pub fn estimate(
        &self,
        initial_state: &DVector<f64>,
        start_time: f64,
        observations: &[RangeObservation],
    ) -> Result<Estimate, Error> {
        for (index, observation) in observations.iter().enumerate() {
            self.check_link(index, observation.link)?;
        }
        let span = reception_span(observations.iter().map(|observation| observation.time))?;

        let mut best = self.iterate(1, initial_state.clone(), start_time, span, observations)?;
        let mut rms_history = vec![best.rms];
        let mut next = self.corrected(&best);
        let mut status = Status::MaxIterationsReached;

        for iteration in 2..=self.config.max_iterations() {
            let current = self.iterate(iteration, next, start_time, span, observations)?;
            rms_history.push(current.rms);

            let stop = termination(best.rms, current.rms, self.config.convergence_tolerance());
            next = self.corrected(&current);
            if current.rms < best.rms {
                best = current;
            }
            if let Some(stop) = stop {
                status = stop;
                break;
            }
        }

        Ok(Estimate {
            status,
            state: best.state,
            covariance: best.covariance,
            residuals: best.residuals,
            iterations: rms_history.len(),
            rms_history,
        })
    }

    fn check_link(&self, index: usize, link: usize) -> Result<(), Error> {
        if link < self.links.len() {
            Ok(())
        } else {
            Err(Error::UnknownLink {
                index,
                link,
                count: self.links.len(),
            })
        }
    }

    fn corrected(&self, iteration: &Iteration) -> DVector<f64> {
        let mut state = iteration.state.clone();
        let mut rows = state.rows_mut(self.rows.start, self.rows.len());
        rows += &iteration.correction;
        state
    }

    /// Propagates from `start_time` over the reception span, extended back by
    /// the light-time margin so the earliest transmissions are covered.
    ///
    /// Times before `start_time` come from a backward leg.
    fn propagate<P: OdeProblem>(
        &self,
        problem: &P,
        initial: DVector<f64>,
        start_time: f64,
        (earliest, latest): (f64, f64),
    ) -> Result<Arc<Trajectory<f64>>, Error> {
        let begin = earliest - self.config.light_time_margin();

        let mut history = if begin < start_time {
            let mut backward = self.leg(problem, initial.clone(), start_time, begin)?;
            backward.reverse();
            backward.pop();
            backward
        } else {
            Vec::new()
        };
        if latest > start_time {
            history.extend(self.leg(problem, initial, start_time, latest)?);
        } else {
            history.push(Sample::new(start_time, initial));
        }

        Ok(Arc::new(Trajectory::new(history)?))
    }

    fn leg<P: OdeProblem>(
        &self,
        problem: &P,
        initial: DVector<f64>,
        start_time: f64,
        end_time: f64,
    ) -> Result<Vec<Sample<f64>>, Error> {
        let solution = runge_kutta::solve_unobserved(
            problem,
            coefficients::get(self.config.coefficient_set()),
            IntegratorState::new(start_time, initial, self.config.initial_step()),
            end_time,
            self.config.integrator(),
        )?;
        debug!(
            steps = solution.steps,
            rejections = solution.rejections,
            "propagated from {start_time} s to {end_time} s"
        );
        Ok(solution.history)
    }

    fn range_models(&self, trajectory: &Arc<Trajectory<f64>>) -> Vec<OneWayRangeModel> {
        let spacecraft: Arc<dyn Ephemeris> = Arc::new(TrajectoryEphemeris {
            trajectory: Arc::clone(trajectory),
            row: self.rows.start,
        });

        self.links
            .iter()
            .map(|link| {
                let (transmitter, receiver) = match link.spacecraft_role() {
                    LinkEndRole::Transmitter => (Arc::clone(&spacecraft), Arc::clone(link.station())),
                    _ => (Arc::clone(link.station()), Arc::clone(&spacecraft)),
                };
                OneWayRangeModel::new(Arc::new(
                    IterativeLightTime::new(transmitter, receiver).with_config(self.config.light_time()),
                ))
            })
            .collect()
    }

    fn iterate(
        &self,
        iteration: usize,
        state: DVector<f64>,
        start_time: f64,
        span: (f64, f64),
        observations: &[RangeObservation],
    ) -> Result<Iteration, Error> {
        let augmented = self.variational.initial_state(&state)?;
        let trajectory = self.propagate(&self.variational, augmented, start_time, span)?;
        let models = self.range_models(&trajectory);

        let position_partial = Arc::new(InitialStatePositionPartial::new(
            &self.variational,
            Arc::clone(&trajectory),
            &self.body,
        )?);
        let partials: Vec<OneWayRangePartial> = self
            .links
            .iter()
            .map(|link| {
                OneWayRangePartial::new(ParameterId::InitialTranslationalState {
                    body: self.body.clone(),
                })
                .with_position_partial(link.spacecraft_role(), position_partial.clone())
            })
            .collect();

        let size = self.rows.len();
        let mut residuals = DVector::zeros(observations.len());
        let mut design = DMatrix::zeros(observations.len(), size);
        let mut scaling = OneWayRangeScaling::new();

        for (index, observation) in observations.iter().enumerate() {
            let (computed, geometry) = models[observation.link]
                .compute_ideal_observation_with_link_end_data(observation.time, LinkEndRole::Receiver)?;
            residuals[index] = observation.range - computed[0];

            scaling.update(&geometry)?;
            let blocks = partials[observation.link].calculate_partial(&geometry, &scaling)?;
            if let Some(row) = sum_blocks(&blocks) {
                design.row_mut(index).copy_from(&row);
            }
        }

        let rms = (residuals.norm_squared() / observations.len() as f64).sqrt();
        info!(iteration, rms, observations = observations.len(), "orbit determination iteration");

        let (correction, covariance) =
            solve_normal_equations(&design, &residuals, self.config.range_sigma())?;
        Ok(Iteration {
            state,
            rms,
            residuals,
            correction,
            covariance,
        })
    }
}

/// Earliest and latest reception time.
fn reception_span(times: impl Iterator<Item = f64>) -> Result<(f64, f64), Error> {
    times
        .fold(None, |span: Option<(f64, f64)>, time| match span {
            Some((earliest, latest)) => Some((earliest.min(time), latest.max(time))),
            None => Some((time, time)),
        })
        .ok_or(Error::NoObservations)
}

/// Decides whether to stop after an iteration with residual RMS `current`,
/// given the lowest RMS `best` seen before it.
fn termination(best: f64, current: f64, tolerance: f64) -> Option<Status> {
    if current < best * (1.0 - tolerance) {
        None
    } else if current <= best * (1.0 + tolerance) {
        Some(Status::Converged)
    } else {
        Some(Status::Diverged)
    }
}

/// Solves the column-normalized weighted normal equations.
///
/// Returns the correction and its formal covariance.
fn solve_normal_equations(
    design: &DMatrix<f64>,
    residuals: &DVector<f64>,
    sigma: f64,
) -> Result<(DVector<f64>, DMatrix<f64>), Error> {
    let weight = 1.0 / (sigma * sigma);
    let scales = DVector::from_iterator(
        design.ncols(),
        design.column_iter().map(|column| match column.norm() {
            norm if norm > 0.0 => norm,
            _ => 1.0,
        }),
    );
    let normalized = DMatrix::from_fn(design.nrows(), design.ncols(), |i, j| design[(i, j)] / scales[j]);

    let normal = normalized.transpose() * &normalized * weight;
    let right_hand_side = normalized.transpose() * residuals * weight;
    let cholesky = normal.cholesky().ok_or(Error::SingularNormalEquations)?;

    let correction = cholesky.solve(&right_hand_side).component_div(&scales);
    let inverse = cholesky.inverse();
    let covariance = DMatrix::from_fn(inverse.nrows(), inverse.ncols(), |i, j| {
        inverse[(i, j)] / (scales[i] * scales[j])
    });
    Ok((correction, covariance))
}

/// Serves the estimated body's state from a propagated trajectory.
struct TrajectoryEphemeris {
    trajectory: Arc<Trajectory<f64>>,
    row: usize,
}

impl Ephemeris for TrajectoryEphemeris {
    fn state_at(&self, time: f64) -> Result<Vector6<f64>, EphemerisError> {
        let state = self
            .trajectory
            .state_at(time)
            .map_err(|error| EphemerisError::Unavailable(error.to_string()))?;
        Ok(state.fixed_rows::<6>(self.row).into_owned())
    }
}
