//! Embedded Runge-Kutta solver with adaptive step size.
//!
//! # Algorithm
//!
//! Each step evaluates the derivative at every stage of an explicit Butcher
//! tableau. Stage `i` uses only stages `0..i`, through row `i` of `a`, at time
//! `t + c_i h`. The two rows of `b` combine the stages into a lower- and a
//! higher-order solution. The one selected by the tableau's
//! [`OrderToIntegrate`] becomes the propagated state, and their difference is
//! the local error estimate.
//!
//! The error is normalized per component against absolute and relative
//! tolerances and reduced with the maximum norm. A step with norm above 1 is
//! rejected and retried with
//!
//! ```text
//! h_next = h * clamp(safety * norm^(-1 / (min_order + 1)), min_factor, max_factor)
//! ```
//!
//! bounded below by the minimum step. A step that fails at the minimum step
//! size ends the integration with [`Error::MinimumStepSizeExceeded`]. Accepted
//! steps grow (or shrink) the next step with the same formula, bounded above
//! by the maximum step.
//!
//! After a step is accepted the problem's
//! [`finalize_step`](skein_core::OdeProblem::finalize_step) hook runs on the
//! new state, which is where representation fix-ups such as attitude
//! singularity switching happen.
//!
//! # Observer Events
//!
//! The solver emits one [`Event`] per step attempt:
//!
//! - [`Event::Accepted`]: the state was advanced
//! - [`Event::Rejected`]: the step will be retried with a smaller size
//!
//! Observers can return [`Action::StopEarly`] to halt after any event.

pub mod coefficients;

mod action;
mod config;
mod error;
mod event;
mod solution;
mod state;
mod step;


pub use action::Action;
pub use coefficients::{
    CoefficientSet, OrderToIntegrate, RungeKuttaCoefficients, UnsupportedMethod,
};
pub use config::{Config, ConfigError, Tolerances};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};
pub use state::IntegratorState;
pub use step::StepOutcome;

use skein_core::{Observer, OdeProblem, TimeType};

/// Performs one adaptive step, retrying rejected attempts.
///
/// On success, `state` holds the new time and state and `state.step_size`
/// holds the step to attempt next.
///
/// # Errors
///
/// Returns [`Error::MinimumStepSizeExceeded`] if the error test fails at the
/// minimum step size, [`Error::ToleranceSizeMismatch`] if per-component
/// tolerances do not match the state length, and [`Error::Problem`] if the
/// problem fails.
pub fn step<T, P, Obs>(
    problem: &P,
    coefficients: &RungeKuttaCoefficients,
    state: &mut IntegratorState<T>,
    config: &Config,
    observer: &mut Obs,
) -> Result<StepOutcome, Error>
where
    T: TimeType,
    P: OdeProblem<T>,
    Obs: for<'a> Observer<Event<'a, T>, Action>,
{
    step::advance(problem, coefficients, state, config, observer, None)
}

/// Integrates a problem from the initial state to `end_time`.
///
/// The direction of integration follows `end_time`; the sign of the initial
/// step size is ignored. The final step is shortened to land on `end_time`
/// exactly.
///
/// # Errors
///
/// Returns an error if any step fails. See [`step`].
pub fn solve<T, P, Obs>(
    problem: &P,
    coefficients: &RungeKuttaCoefficients,
    initial: IntegratorState<T>,
    end_time: T,
    config: &Config,
    mut observer: Obs,
) -> Result<Solution<T>, Error>
where
    T: TimeType,
    P: OdeProblem<T>,
    Obs: for<'a> Observer<Event<'a, T>, Action>,
{
    let mut state = initial;
    if !state.step_size.is_finite() || state.step_size == 0.0 {
        return Err(Error::InvalidStepSize(state.step_size));
    }

    let direction = end_time.seconds_since(state.time).signum();
    state.step_size = direction * state.step_size.abs();

    let mut history = vec![state.sample()];
    let mut steps = 0;
    let mut rejections = 0;

    loop {
        let remaining = end_time.seconds_since(state.time);
        if remaining == 0.0 {
            break;
        }

        let preferred = config.clamp_step(state.step_size);
        let target = (preferred.abs() >= remaining.abs()).then_some(end_time);
        if target.is_some() {
            state.step_size = remaining;
        }

        match step::advance(problem, coefficients, &mut state, config, &mut observer, target)? {
            StepOutcome::Accepted {
                rejections: rejected,
                ..
            } => {
                steps += 1;
                rejections += rejected;
                history.push(state.sample());
                if target.is_some() && end_time.seconds_since(state.time) == 0.0 {
                    state.step_size = preferred;
                }
            }
            StepOutcome::StoppedByObserver {
                advanced,
                rejections: rejected,
            } => {
                if advanced {
                    steps += 1;
                    history.push(state.sample());
                }
                return Ok(Solution {
                    status: Status::StoppedByObserver,
                    history,
                    steps,
                    rejections: rejections + rejected,
                    next_step_size: state.step_size,
                });
            }
        }
    }

    Ok(Solution {
        status: Status::Complete,
        history,
        steps,
        rejections,
        next_step_size: state.step_size,
    })
}

/// Integrates a problem to `end_time` without observation.
///
/// This is a convenience wrapper around [`solve`] that discards events.
///
/// # Errors
///
/// Returns an error if any step fails. See [`step`].
pub fn solve_unobserved<T, P>(
    problem: &P,
    coefficients: &RungeKuttaCoefficients,
    initial: IntegratorState<T>,
    end_time: T,
    config: &Config,
) -> Result<Solution<T>, Error>
where
    T: TimeType,
    P: OdeProblem<T>,
{
    solve(problem, coefficients, initial, end_time, config, ())
}
