use std::sync::Arc;

use nalgebra::{DVector, Vector3, dvector};
use rand::{Rng, SeedableRng, rngs::StdRng};
use skein_core::Ephemeris;
use skein_estimation::orbit_determination::{
    Config, Link, OrbitDeterminationManager, RangeObservation, Status,
};
use skein_integration_tests::{circular_orbit, station, two_body};

// --- Test fixtures ---

const ARC: usize = 90;
const SPACING: f64 = 60.0;

fn station_ephemeris(x: f64, y: f64, z: f64) -> Arc<dyn Ephemeris> {
    Arc::new(station(Vector3::new(x, y, z)))
}

fn downlinks() -> Vec<Link> {
    vec![
        Link::downlink("goldstone", station_ephemeris(-0.4, -0.8, 0.6)),
        Link::downlink("canberra", station_ephemeris(-0.7, 0.4, -0.6)),
    ]
}

fn manager(config: Config) -> OrbitDeterminationManager {
    OrbitDeterminationManager::new(two_body(), "Spacecraft", downlinks(), config)
        .expect("should build manager")
}

fn truth() -> DVector<f64> {
    circular_orbit(7.2e6, 28.5)
}

fn schedule(first: usize, count: usize) -> Vec<(usize, f64)> {
    (first..first + count)
        .flat_map(|k| {
            let time = SPACING * k as f64;
            [(0, time), (1, time + 5.0)]
        })
        .collect()
}

// --- Scenarios ---

#[test]
fn two_station_arc_recovers_the_orbit() {
    let manager = manager(Config::default());
    let observations = manager
        .simulate_observations(&truth(), 0.0, &schedule(1, ARC))
        .expect("should simulate");

    let guess = truth() + dvector![1.0e3, 8.0e2, -5.0e2, -0.8, 1.0, 0.3];
    let estimate = manager.estimate(&guess, 0.0, &observations).expect("should estimate");

    let error = &estimate.state - truth();
    assert!(error.rows(0, 3).norm() < 1.0, "position error {error}");
    assert!(error.rows(3, 3).norm() < 1e-3, "velocity error {error}");
    assert!(estimate.rms_history[0] > estimate.rms_history[1]);
}

#[test]
fn estimate_predicts_ranges_beyond_the_arc() {
    let config = Config::default().with_range_sigma(1.0).expect("valid sigma");
    let manager = manager(config);

    let mut rng = StdRng::seed_from_u64(7);
    let observations: Vec<RangeObservation> = manager
        .simulate_observations(&truth(), 0.0, &schedule(1, ARC))
        .expect("should simulate")
        .into_iter()
        .map(|observation| RangeObservation {
            range: observation.range + rng.gen_range(-1.0_f64..1.0),
            ..observation
        })
        .collect();

    let guess = truth() + dvector![5.0e2, -5.0e2, 5.0e2, 0.5, 0.5, -0.5];
    let estimate = manager.estimate(&guess, 0.0, &observations).expect("should estimate");
    assert_eq!(estimate.status, Status::Converged);

    let future = schedule(ARC + 1, 30);
    let predicted = manager
        .simulate_observations(&estimate.state, 0.0, &future)
        .expect("should predict");
    let actual = manager
        .simulate_observations(&truth(), 0.0, &future)
        .expect("should simulate");

    for (predicted, actual) in predicted.iter().zip(&actual) {
        assert_eq!(predicted.link, actual.link);
        assert!(
            (predicted.range - actual.range).abs() < 50.0,
            "prediction off by {} m at {} s",
            predicted.range - actual.range,
            predicted.time
        );
    }
}
