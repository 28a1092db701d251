use nalgebra::DVector;
use skein_core::{Observer, OdeProblem, TimeType};
use tracing::{debug, trace};

use super::{
    Action, Config, Error, Event, IntegratorState, RungeKuttaCoefficients, Tolerances,
};

/// How a call to [`step`](super::step) ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The state was advanced by `step_size` after `rejections` failed attempts.
    Accepted {
        step_size: f64,
        error_norm: f64,
        rejections: usize,
    },

    /// The observer stopped the solver.
    ///
    /// `advanced` is true if the stop was requested after the step had
    /// already been accepted and applied to the state.
    StoppedByObserver { advanced: bool, rejections: usize },
}

/// Attempts steps until one passes the error test.
///
/// When `target` is set, the caller has clipped `state.step_size` to land on
/// `target`, and an accepted first attempt sets the time to `target` exactly
/// instead of accumulating it.
pub(super) fn advance<T, P, Obs>(
    problem: &P,
    coefficients: &RungeKuttaCoefficients,
    state: &mut IntegratorState<T>,
    config: &Config,
    observer: &mut Obs,
    target: Option<T>,
) -> Result<StepOutcome, Error>
where
    T: TimeType,
    P: OdeProblem<T>,
    Obs: for<'a> Observer<Event<'a, T>, Action>,
{
    if let Some(count) = config.tolerances().component_count() {
        if count != state.state.len() {
            return Err(Error::ToleranceSizeMismatch {
                tolerances: count,
                state: state.state.len(),
            });
        }
    }
    if !state.step_size.is_finite() || state.step_size == 0.0 {
        return Err(Error::InvalidStepSize(state.step_size));
    }

    let mut step_size = match target {
        Some(_) => state.step_size,
        None => config.clamp_step(state.step_size),
    };

    // The first stage does not depend on the step size, so retries reuse it.
    let first_stage = problem
        .derivative(state.time, &state.state)
        .map_err(Error::problem)?;

    let mut rejections = 0;
    loop {
        let (candidate, local_error) = evaluate_stages(
            problem,
            coefficients,
            state.time,
            &state.state,
            &first_stage,
            step_size,
        )
        .map_err(Error::problem)?;

        let error_norm = error_norm(config.tolerances(), &state.state, &candidate, &local_error);
        let factor = step_factor(coefficients, config, error_norm);

        if error_norm <= 1.0 {
            let time = match target {
                Some(target) if rejections == 0 => target,
                _ => state.time.add_seconds(step_size),
            };
            let candidate = problem
                .finalize_step(time, candidate)
                .map_err(Error::problem)?;

            state.time = time;
            state.state = candidate;
            state.step_size = config.clamp_step(step_size * factor);

            trace!(
                time = ?time,
                step_size,
                error_norm,
                next_step_size = state.step_size,
                "accepted step"
            );

            let event = Event::Accepted {
                time,
                step_size,
                error_norm,
                state: &state.state,
            };
            if let Some(Action::StopEarly) = observer.observe(&event) {
                return Ok(StepOutcome::StoppedByObserver {
                    advanced: true,
                    rejections,
                });
            }

            return Ok(StepOutcome::Accepted {
                step_size,
                error_norm,
                rejections,
            });
        }

        if step_size.abs() <= config.min_step() {
            return Err(Error::MinimumStepSizeExceeded {
                time: state.time.to_seconds(),
                step_size,
                error_norm,
            });
        }

        let next_step_size = step_size.signum() * (step_size.abs() * factor).max(config.min_step());
        debug!(
            time = ?state.time,
            step_size,
            error_norm,
            next_step_size,
            "rejected step"
        );

        let event = Event::Rejected {
            time: state.time,
            step_size,
            error_norm,
            next_step_size,
        };
        rejections += 1;
        if let Some(Action::StopEarly) = observer.observe(&event) {
            state.step_size = next_step_size;
            return Ok(StepOutcome::StoppedByObserver {
                advanced: false,
                rejections,
            });
        }

        step_size = next_step_size;
    }
}

/// Runs the explicit stage recursion for one step.
///
/// Returns the propagated candidate (the row of `b` selected by the order to
/// integrate) and the local error estimate, which is the difference between
/// the higher- and lower-order solutions.
fn evaluate_stages<T, P>(
    problem: &P,
    coefficients: &RungeKuttaCoefficients,
    time: T,
    state: &DVector<f64>,
    first_stage: &DVector<f64>,
    step_size: f64,
) -> Result<(DVector<f64>, DVector<f64>), P::Error>
where
    T: TimeType,
    P: OdeProblem<T>,
{
    let stages = coefficients.stages();
    let mut k: Vec<DVector<f64>> = Vec::with_capacity(stages);
    k.push(first_stage.clone());

    for i in 1..stages {
        let mut intermediate = state.clone();
        for (j, kj) in k.iter().enumerate() {
            let a = coefficients.a[(i, j)];
            if a != 0.0 {
                intermediate.axpy(step_size * a, kj, 1.0);
            }
        }
        let stage_time = time.add_seconds(coefficients.c[i] * step_size);
        k.push(problem.derivative(stage_time, &intermediate)?);
    }

    let row = coefficients.integrated_row();
    let mut candidate = state.clone();
    let mut local_error = DVector::zeros(state.len());
    for (i, ki) in k.iter().enumerate() {
        let b = coefficients.b[(row, i)];
        if b != 0.0 {
            candidate.axpy(step_size * b, ki, 1.0);
        }
        let db = coefficients.b[(1, i)] - coefficients.b[(0, i)];
        if db != 0.0 {
            local_error.axpy(step_size * db, ki, 1.0);
        }
    }

    Ok((candidate, local_error))
}

/// Maximum over components of the error relative to its tolerance.
///
/// Non-finite errors count as infinitely large so they always reject.
fn error_norm(
    tolerances: &Tolerances,
    current: &DVector<f64>,
    candidate: &DVector<f64>,
    local_error: &DVector<f64>,
) -> f64 {
    local_error
        .iter()
        .enumerate()
        .map(|(i, err)| {
            if *err == 0.0 {
                return 0.0;
            }
            let (absolute, relative) = tolerances.component(i);
            let scale = absolute + relative * current[i].abs().max(candidate[i].abs());
            let ratio = err.abs() / scale;
            if ratio.is_nan() { f64::INFINITY } else { ratio }
        })
        .fold(0.0, f64::max)
}

/// Step-size change factor for a given error norm.
fn step_factor(coefficients: &RungeKuttaCoefficients, config: &Config, error_norm: f64) -> f64 {
    if error_norm == 0.0 {
        return config.max_factor();
    }
    if !error_norm.is_finite() {
        return config.min_factor();
    }
    (config.safety_factor() * error_norm.powf(-coefficients.step_exponent()))
        .clamp(config.min_factor(), config.max_factor())
}
