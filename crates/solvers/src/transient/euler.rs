//! Forward Euler solver for ODE problems.
//!
//! This module provides a minimal fixed-step integrator. It steps a problem
//! forward in time using explicit Euler:
//!
//! ```text
//! state_{n+1} = state_n + derivative(t_n, state_n) * dt
//! ```
//!
//! It is first-order accurate and mainly useful as a reference solution and
//! for problems whose derivative is cheap and smooth.
//!
//! # Example
//!
//! ```ignore
//! use skein_solvers::transient::euler;
//!
//! let solution = euler::solve_unobserved(&problem, initial, 10.0, 100)?;
//!
//! for sample in &solution.history {
//!     println!("t={:?}: {}", sample.time, sample.state);
//! }
//! ```

mod action;
mod error;
mod event;
mod solution;

pub use action::Action;
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use skein_core::{Observer, OdeProblem, Sample, TimeType};

/// Integrates an ODE problem using forward Euler.
///
/// # Algorithm
///
/// 1. Record the initial sample.
/// 2. For each step:
///    - Compute the derivative at the current time and state.
///    - Step the state forward: `state + derivative * dt`.
///    - Advance time by `dt`.
///    - Finalize the step (normalization, singularity switching, etc.).
///    - Emit an [`Event`] to the observer.
///    - If the observer returns `StopEarly`, terminate.
/// 3. Return the solution with the full history.
///
/// A negative `dt` integrates backwards in time.
///
/// # Errors
///
/// Returns [`Error::InvalidStepSize`] if `dt` is zero or not finite, and
/// [`Error::Problem`] if the problem returns an error at any point.
pub fn solve<T, P, Obs>(
    problem: &P,
    initial: Sample<T>,
    dt: f64,
    steps: usize,
    mut observer: Obs,
) -> Result<Solution<T>, Error>
where
    T: TimeType,
    P: OdeProblem<T>,
    Obs: Observer<Event<T>, Action>,
{
    if !dt.is_finite() || dt == 0.0 {
        return Err(Error::InvalidStepSize(dt));
    }

    let mut history = Vec::with_capacity(steps + 1);
    history.push(initial.clone());

    let event = Event {
        step: 0,
        sample: initial.clone(),
    };
    if let Some(Action::StopEarly) = observer.observe(&event) {
        return Ok(Solution {
            status: Status::StoppedByObserver,
            history,
            steps: 0,
        });
    }

    let mut current = initial;

    for step in 1..=steps {
        let derivative = problem
            .derivative(current.time, &current.state)
            .map_err(Error::problem)?;

        let next_time = current.time.add_seconds(dt);
        let next_state = &current.state + derivative * dt;
        let next_state = problem
            .finalize_step(next_time, next_state)
            .map_err(Error::problem)?;

        let next = Sample::new(next_time, next_state);
        history.push(next.clone());

        let event = Event {
            step,
            sample: next.clone(),
        };

        if let Some(Action::StopEarly) = observer.observe(&event) {
            return Ok(Solution {
                status: Status::StoppedByObserver,
                history,
                steps: step,
            });
        }

        current = next;
    }

    Ok(Solution {
        status: Status::Complete,
        history,
        steps,
    })
}

/// Integrates an ODE problem using forward Euler without observation.
///
/// This is a convenience wrapper around [`solve`] that discards events.
///
/// # Errors
///
/// Returns an error if the problem returns an error at any point.
pub fn solve_unobserved<T, P>(
    problem: &P,
    initial: Sample<T>,
    dt: f64,
    steps: usize,
) -> Result<Solution<T>, Error>
where
    T: TimeType,
    P: OdeProblem<T>,
{
    solve(problem, initial, dt, steps, ())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use nalgebra::{DVector, dvector};
    use skein_core::Epoch;

    // --- Test fixtures ---

    /// Constant velocity along one axis: `dx/dt = v`.
    struct ConstantVelocity {
        velocity: f64,
    }

    impl<T: TimeType> OdeProblem<T> for ConstantVelocity {
        type Error = Infallible;

        fn derivative(&self, _time: T, _state: &DVector<f64>) -> Result<DVector<f64>, Infallible> {
            Ok(dvector![self.velocity])
        }
    }

    /// Exponential decay: `dx/dt = -k x`.
    struct Decay {
        rate: f64,
    }

    impl OdeProblem for Decay {
        type Error = Infallible;

        fn derivative(&self, _time: f64, state: &DVector<f64>) -> Result<DVector<f64>, Infallible> {
            Ok(state * -self.rate)
        }
    }

    /// Clamps the state to be non-negative after every step.
    struct ClampedFall;

    impl OdeProblem for ClampedFall {
        type Error = Infallible;

        fn derivative(&self, _time: f64, _state: &DVector<f64>) -> Result<DVector<f64>, Infallible> {
            Ok(dvector![-1.0])
        }

        fn finalize_step(&self, _time: f64, state: DVector<f64>) -> Result<DVector<f64>, Infallible> {
            Ok(state.map(|x| x.max(0.0)))
        }
    }

    // --- Tests ---

    #[test]
    fn constant_velocity_motion() {
        let problem = ConstantVelocity { velocity: 2.0 };
        let initial = Sample::new(0.0, dvector![0.0]);

        let solution = solve_unobserved(&problem, initial, 0.1, 10).expect("should solve");

        assert_eq!(solution.status, Status::Complete);
        assert_eq!(solution.steps, 10);
        assert_eq!(solution.history.len(), 11); // initial + 10 steps

        // After 10 steps at v=2, dt=0.1: position = 0 + 2*0.1*10 = 2.0
        let last = solution.history.last().unwrap();
        assert_relative_eq!(last.state[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(last.time, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn works_with_epoch_time() {
        let problem = ConstantVelocity { velocity: 1.0 };
        let initial = Sample::new(Epoch::from_seconds(1.0e9), dvector![0.0]);

        let solution = solve_unobserved(&problem, initial, 0.25, 4).expect("should solve");

        let last = solution.history.last().unwrap();
        assert_relative_eq!(last.time.seconds_since(Epoch::from_seconds(1.0e9)), 1.0);
        assert_relative_eq!(last.state[0], 1.0);
    }

    #[test]
    fn converges_at_first_order() {
        let problem = Decay { rate: 1.0 };
        let exact = (-1.0_f64).exp();

        let error = |steps: usize| {
            let initial = Sample::new(0.0, dvector![1.0]);
            let dt = 1.0 / steps as f64;
            let solution = solve_unobserved(&problem, initial, dt, steps).expect("should solve");
            (solution.history.last().unwrap().state[0] - exact).abs()
        };

        // Halving the step should roughly halve the error.
        let ratio = error(1000) / error(2000);
        assert_relative_eq!(ratio, 2.0, epsilon = 0.01);
    }

    #[test]
    fn finalize_step_is_applied() {
        let initial = Sample::new(0.0, dvector![0.25]);

        let solution = solve_unobserved(&ClampedFall, initial, 0.1, 5).expect("should solve");

        assert!(solution.history.iter().all(|sample| sample.state[0] >= 0.0));
        assert_eq!(solution.history.last().unwrap().state[0], 0.0);
    }

    #[test]
    fn observer_can_stop_early() {
        let problem = ConstantVelocity { velocity: 1.0 };
        let initial = Sample::new(0.0, dvector![0.0]);

        let observer = |event: &Event<f64>| {
            if event.step >= 5 {
                Some(Action::StopEarly)
            } else {
                None
            }
        };

        let solution = solve(&problem, initial, 0.1, 100, observer).expect("should stop early");

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.steps, 5);
        assert_eq!(solution.history.len(), 6); // initial + 5 steps
    }

    #[test]
    fn zero_steps_returns_initial() {
        let problem = ConstantVelocity { velocity: 1.0 };
        let initial = Sample::new(0.0, dvector![5.0]);

        let solution =
            solve_unobserved(&problem, initial, 0.1, 0).expect("should return initial");

        assert_eq!(solution.status, Status::Complete);
        assert_eq!(solution.steps, 0);
        assert_eq!(solution.history.len(), 1);
        assert_relative_eq!(solution.history[0].state[0], 5.0);
    }

    #[test]
    fn rejects_zero_step() {
        let problem = ConstantVelocity { velocity: 1.0 };

        let result = solve_unobserved(&problem, Sample::new(0.0, dvector![0.0]), 0.0, 3);
        assert!(matches!(result, Err(Error::InvalidStepSize(dt)) if dt == 0.0));
    }

    #[test]
    fn step_numbers_start_at_zero() {
        let problem = ConstantVelocity { velocity: 1.0 };
        let initial = Sample::new(0.0, dvector![0.0]);

        let mut step_values = Vec::new();
        solve(&problem, initial, 0.25, 4, |event: &Event<f64>| {
            step_values.push(event.step);
            None
        })
        .expect("should solve");

        assert_eq!(step_values, vec![0, 1, 2, 3, 4]);
    }
}
