use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::{DVector, Matrix3, Vector3, dvector};
use skein_core::{Epoch, TimeType, constants::STANDARD_GRAVITY};
use skein_dynamics::{
    IntegratedStateType, MassDynamics, StateDerivativeComposer, StateReference,
    TranslationalDynamics,
    models::{AccelerationModel, ConstantThrustEngine, Engine, MassRateModel, ThrustAcceleration},
};
use skein_integration_tests::earth_and_spacecraft;
use skein_observers::StepLimit;
use skein_solvers::transient::runge_kutta::{
    self, CoefficientSet, Config, IntegratorState, Status, Tolerances, coefficients,
};
use uom::si::{
    f64::{Force, Time},
    force::newton,
    time::second,
};

// --- Test fixtures ---

const INITIAL_MASS: f64 = 1000.0;
const THRUST: f64 = 400.0;
const SPECIFIC_IMPULSE: f64 = 320.0;
const BURN: f64 = 600.0;

/// A spacecraft in free space firing one engine along +x.
fn burn() -> StateDerivativeComposer {
    let (registry, _, spacecraft) = earth_and_spacecraft(INITIAL_MASS, Matrix3::identity());
    let engine: Arc<dyn Engine> = Arc::new(ConstantThrustEngine::new(
        "main",
        Force::new::<newton>(THRUST),
        Time::new::<second>(SPECIFIC_IMPULSE),
    ));

    let accelerations: Vec<Box<dyn AccelerationModel>> = vec![Box::new(ThrustAcceleration::new(
        vec![Arc::clone(&engine)],
        Vector3::x_axis(),
    ))];
    StateDerivativeComposer::new(
        Arc::new(registry),
        vec![
            MassDynamics::new()
                .with_body(spacecraft, MassRateModel::from_thrust(vec![engine]))
                .into(),
            TranslationalDynamics::new().with_body(spacecraft, accelerations).into(),
        ],
    )
}

fn initial() -> DVector<f64> {
    dvector![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, INITIAL_MASS]
}

fn config() -> Config {
    Config::new(
        Tolerances::Scalar {
            absolute: 1e-10,
            relative: 1e-12,
        },
        1e-6,
        100.0,
    )
    .expect("valid config")
}

fn propagate<T: TimeType>(start: T, duration: f64) -> DVector<f64> {
    let solution = runge_kutta::solve_unobserved(
        &burn(),
        coefficients::get(CoefficientSet::RungeKutta87DormandPrince),
        IntegratorState::new(start, initial(), 10.0),
        start.add_seconds(duration),
        &config(),
    )
    .expect("propagation should succeed");

    assert_eq!(solution.status, Status::Complete);
    solution.history.last().expect("history is never empty").state.clone()
}

// --- Scenarios ---

#[test]
fn blocks_follow_state_type_order() {
    let composer = burn();
    let spacecraft = composer.registry().id("Spacecraft").expect("registered");

    assert!(composer.contains(IntegratedStateType::BodyMass));
    assert_eq!(composer.state_range(StateReference::Translational(spacecraft)), Some(0..6));
    assert_eq!(composer.state_range(StateReference::Mass(spacecraft)), Some(6..7));
}

#[test]
fn constant_thrust_follows_rocket_equation() {
    let end = propagate(0.0, BURN);

    let exhaust_velocity = SPECIFIC_IMPULSE * STANDARD_GRAVITY;
    let mass_rate = THRUST / exhaust_velocity;
    let final_mass = INITIAL_MASS - mass_rate * BURN;

    assert_relative_eq!(end[6], final_mass, max_relative = 1e-12);
    assert_relative_eq!(
        end[3],
        exhaust_velocity * (INITIAL_MASS / final_mass).ln(),
        max_relative = 1e-10
    );

    // x(t) = v_e t − v_e (m(t) / ṁ) ln(m0 / m(t))
    let distance = exhaust_velocity * BURN
        - exhaust_velocity * final_mass / mass_rate * (INITIAL_MASS / final_mass).ln();
    assert_relative_eq!(end[0], distance, max_relative = 1e-10);
    assert_eq!(end.rows(1, 2).amax(), 0.0);
}

#[test]
fn epoch_propagation_matches_seconds_far_from_the_origin() {
    let in_seconds = propagate(0.0, BURN);
    let in_epoch = propagate(Epoch::from_parts(8.0e8, 0.25), BURN);

    assert_relative_eq!(in_epoch, in_seconds, max_relative = 1e-9);
}

#[test]
fn step_limit_cuts_the_burn_short() {
    let solution = runge_kutta::solve(
        &burn(),
        coefficients::get(CoefficientSet::RungeKuttaFehlberg45),
        IntegratorState::new(0.0, initial(), 1.0),
        BURN,
        &config(),
        StepLimit::new(3),
    )
    .expect("propagation should succeed");

    assert_eq!(solution.status, Status::StoppedByObserver);
    let last = solution.history.last().expect("history is never empty");
    assert!(last.time < BURN);
    assert!(last.state[6] < INITIAL_MASS);
}
