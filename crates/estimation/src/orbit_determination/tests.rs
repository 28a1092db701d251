use super::*;

use approx::assert_relative_eq;
use nalgebra::{Vector3, dvector};
use rand::{Rng, SeedableRng, rngs::StdRng};
use skein_core::ConstantEphemeris;
use skein_dynamics::{
    Body, BodyRegistry, TranslationalDynamics,
    models::{AccelerationModel, PointMassGravity},
};

// --- Test fixtures ---

const EARTH_GM: f64 = 3.986_004_418e14;
const EARTH_RADIUS: f64 = 6.378e6;
const START: f64 = 0.0;

fn composer() -> StateDerivativeComposer {
    let mut registry = BodyRegistry::new();
    let earth = registry
        .add(
            Body::new("Earth")
                .with_gravitational_parameter(EARTH_GM)
                .with_ephemeris(ConstantEphemeris::at_rest(0.0, 0.0, 0.0)),
        )
        .expect("should add Earth");
    let sat = registry.add(Body::new("Sat")).expect("should add Sat");

    let accelerations: Vec<Box<dyn AccelerationModel>> = vec![Box::new(PointMassGravity::new(earth))];
    StateDerivativeComposer::new(
        Arc::new(registry),
        vec![TranslationalDynamics::new().with_body(sat, accelerations).into()],
    )
}

fn station(x: f64, y: f64, z: f64) -> Arc<dyn Ephemeris> {
    let position = Vector3::new(x, y, z).normalize() * EARTH_RADIUS;
    Arc::new(ConstantEphemeris::at_rest(position.x, position.y, position.z))
}

fn links() -> Vec<Link> {
    vec![
        Link::downlink("north", station(0.3, 0.2, 1.0)),
        Link::downlink("east", station(1.0, 0.4, 0.1)),
        Link::uplink("south", station(-0.5, 0.8, -0.6)),
    ]
}

fn manager() -> OrbitDeterminationManager {
    OrbitDeterminationManager::new(composer(), "Sat", links(), Config::default()).expect("should build manager")
}

/// A near-circular orbit inclined at 50 degrees.
fn truth() -> DVector<f64> {
    let radius = 7.0e6;
    let speed = (EARTH_GM / radius).sqrt();
    let inclination = 50.0_f64.to_radians();
    dvector![
        radius,
        0.0,
        0.0,
        0.0,
        speed * inclination.cos(),
        speed * inclination.sin()
    ]
}

fn schedule() -> Vec<(usize, f64)> {
    (1..=120)
        .flat_map(|k| {
            let time = START + 60.0 * f64::from(k);
            (0..3).map(move |link| (link, time))
        })
        .collect()
}

fn perturbed() -> DVector<f64> {
    truth() + dvector![1.0e3, -5.0e2, 2.0e2, 1.0, -0.5, 0.2]
}

#[test]
fn simulated_ranges_match_geometry() {
    let manager = manager();
    let observations = manager
        .simulate_observations(&truth(), START, &[(0, 0.5), (2, 0.5)])
        .expect("should simulate");

    assert_eq!(observations.len(), 2);
    for observation in &observations {
        let station = manager.links()[observation.link]
            .station()
            .state_at(observation.time)
            .unwrap();
        // Over half a second the satellite moves about 4 km, so the range
        // lies within that of the instantaneous distance.
        let distance = (truth().fixed_rows::<3>(0) - station.fixed_rows::<3>(0)).norm();
        assert!((observation.range - distance).abs() < 5.0e3);
    }
}

#[test]
fn recovers_initial_state_from_perfect_ranges() {
    let manager = manager();
    let observations = manager
        .simulate_observations(&truth(), START, &schedule())
        .expect("should simulate");
    assert_eq!(observations.len(), 360);

    let estimate = manager
        .estimate(&perturbed(), START, &observations)
        .expect("should estimate");

    assert!(estimate.rms_history[0] > 100.0);
    assert!(estimate.rms_history.iter().copied().fold(f64::INFINITY, f64::min) < 1e-2);
    assert!(estimate.iterations <= manager.config().max_iterations());

    let error = &estimate.state - truth();
    assert!(error.rows(0, 3).norm() < 1.0, "position error {error}");
    assert!(error.rows(3, 3).norm() < 1e-3, "velocity error {error}");
}

#[test]
fn noisy_ranges_converge_to_noise_level() {
    let manager = OrbitDeterminationManager::new(
        composer(),
        "Sat",
        links(),
        Config::default().with_range_sigma(0.3).expect("valid sigma"),
    )
    .expect("should build manager");

    let mut rng = StdRng::seed_from_u64(42);
    let observations: Vec<RangeObservation> = manager
        .simulate_observations(&truth(), START, &schedule())
        .expect("should simulate")
        .into_iter()
        .map(|observation| RangeObservation {
            range: observation.range + rng.gen_range(-0.5_f64..0.5),
            ..observation
        })
        .collect();

    let estimate = manager
        .estimate(&perturbed(), START, &observations)
        .expect("should estimate");

    assert_eq!(estimate.status, Status::Converged);
    let rms = estimate.rms_history.iter().copied().fold(f64::INFINITY, f64::min);
    assert!(rms > 0.2 && rms < 0.4, "rms {rms}");
    assert_relative_eq!(
        (estimate.residuals.norm_squared() / 360.0).sqrt(),
        rms,
        max_relative = 1e-12
    );

    let error = &estimate.state - truth();
    assert!(error.rows(0, 3).norm() < 20.0, "position error {error}");

    assert_eq!(estimate.covariance.shape(), (6, 6));
    assert!(estimate.covariance.diagonal().iter().all(|variance| *variance > 0.0));
}

#[test]
fn observations_at_and_before_start_time() {
    let manager = manager();
    let schedule = [(0, START), (2, START), (1, START + 1e-3), (1, START - 300.0)];
    let observations = manager
        .simulate_observations(&truth(), START, &schedule)
        .expect("should simulate");
    assert_eq!(observations.len(), 4);

    // The downlink at the start was transmitted a few milliseconds earlier,
    // so the range stays within a few hundred meters of the initial distance.
    let station = manager.links()[0].station().state_at(START).unwrap();
    let distance = (truth().fixed_rows::<3>(0) - station.fixed_rows::<3>(0)).norm();
    assert!((observations[0].range - distance).abs() < 500.0);

    let mut observations = observations;
    observations.extend(
        manager
            .simulate_observations(&truth(), START, &self::schedule())
            .expect("should simulate"),
    );
    let estimate = manager
        .estimate(&perturbed(), START, &observations)
        .expect("should estimate");

    let error = &estimate.state - truth();
    assert!(error.rows(0, 3).norm() < 1.0, "position error {error}");
}

#[test]
fn transmissions_beyond_the_margin_are_unavailable() {
    let config = Config::default().with_light_time_margin(0.0).expect("valid margin");
    let manager = OrbitDeterminationManager::new(composer(), "Sat", links(), config).expect("should build manager");

    assert!(matches!(
        manager.simulate_observations(&truth(), START, &[(0, START), (0, 60.0)]),
        Err(Error::Ephemeris(_))
    ));
}

#[test]
fn termination_distinguishes_convergence_from_divergence() {
    assert_eq!(termination(10.0, 5.0, 1e-3), None);
    assert_eq!(termination(10.0, 9.9995, 1e-3), Some(Status::Converged));
    assert_eq!(termination(10.0, 10.005, 1e-3), Some(Status::Converged));
    assert_eq!(termination(10.0, 12.0, 1e-3), Some(Status::Diverged));
}

#[test]
fn rejects_unknown_links_and_empty_input() {
    let manager = manager();

    assert!(matches!(
        manager.estimate(&truth(), START, &[]),
        Err(Error::NoObservations)
    ));
    assert!(matches!(
        manager.simulate_observations(&truth(), START, &[(0, 60.0), (7, 120.0)]),
        Err(Error::UnknownLink {
            index: 1,
            link: 7,
            count: 3
        })
    ));
}

#[test]
fn solve_normal_equations_recovers_linear_solution() {
    let design = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 1.0e-3, 1.0, 1.0e-3, 2.0, -1.0e-3]);
    let solution = dvector![3.0, -2000.0];
    let residuals = &design * &solution;

    let (correction, covariance) = solve_normal_equations(&design, &residuals, 1.0).unwrap();
    assert_relative_eq!(correction, solution, max_relative = 1e-10);

    let expected = (design.transpose() * &design).try_inverse().unwrap();
    assert_relative_eq!(covariance, expected, max_relative = 1e-8);
}
