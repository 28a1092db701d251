use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::Vector6;
use skein_core::{ConstantEphemeris, Ephemeris, EphemerisError, ParameterId, constants::SPEED_OF_LIGHT};
use skein_estimation::{
    LinkEndRole,
    light_time::{FirstOrderRelativisticCorrection, IterativeLightTime, LightTime, Perturber},
    numerical::central_difference,
    observation::{ObservationModel, OneWayRangeModel},
    partials::{OneWayRangePartial, OneWayRangeScaling, RelativisticCorrectionPartial, sum_blocks},
};

// --- Test fixtures ---

const SUN_GM: f64 = 1.327_124_400_18e20;
const AU: f64 = 1.495_978_707e11;

/// An Earth-like orbit of radius 1 AU in the ecliptic.
fn earth(t: f64) -> Result<Vector6<f64>, EphemerisError> {
    let rate = 1.991e-7;
    let (sin, cos) = (rate * t).sin_cos();
    Ok(Vector6::new(
        AU * cos,
        AU * sin,
        0.0,
        -AU * rate * sin,
        AU * rate * cos,
        0.0,
    ))
}

/// A probe on the far side of the Sun, slightly above the ecliptic.
fn probe() -> ConstantEphemeris {
    ConstantEphemeris::at_rest(-1.5 * AU, 0.02 * AU, 0.01 * AU)
}

fn correction(gamma: f64) -> Arc<FirstOrderRelativisticCorrection> {
    let sun = Perturber::new("Sun", Arc::new(ConstantEphemeris::at_rest(0.0, 0.0, 0.0)), SUN_GM);
    Arc::new(FirstOrderRelativisticCorrection::new(vec![sun]).with_ppn_gamma(gamma))
}

fn model(correction: Option<Arc<FirstOrderRelativisticCorrection>>) -> OneWayRangeModel {
    let probe: Arc<dyn Ephemeris> = Arc::new(probe());
    let earth: Arc<dyn Ephemeris> = Arc::new(earth);
    let mut light_time = IterativeLightTime::<f64, f64>::new(probe, earth);
    if let Some(correction) = correction {
        light_time = light_time.with_correction(correction);
    }
    OneWayRangeModel::new(Arc::new(light_time))
}

// --- Scenarios ---

#[test]
fn shapiro_delay_lengthens_the_range() {
    let reception = 3.0e6;
    let geometric = model(None)
        .compute_ideal_observation(reception, LinkEndRole::Receiver)
        .expect("should compute");
    let relativistic = model(Some(correction(1.0)))
        .compute_ideal_observation(reception, LinkEndRole::Receiver)
        .expect("should compute");

    // Tens of microseconds of delay near conjunction: kilometers of range.
    let excess = relativistic[0] - geometric[0];
    assert!(excess > 1.0e3 && excess < 3.0e4, "excess {excess} m");

    let (_, geometry) = model(Some(correction(1.0)))
        .compute_ideal_observation_with_link_end_data(reception, LinkEndRole::Receiver)
        .expect("should compute");
    let delay = correction(1.0)
        .per_perturber(
            &geometry.transmitter().state,
            &geometry.receiver().state,
            geometry.transmitter().time,
            geometry.receiver().time,
        )
        .expect("should evaluate")[0];
    assert_relative_eq!(excess, SPEED_OF_LIGHT * delay, max_relative = 1e-6);
}

#[test]
fn gamma_partial_matches_finite_difference() {
    let reception = 3.0e6;
    let nominal = correction(1.0);
    let (_, geometry) = model(Some(Arc::clone(&nominal)))
        .compute_ideal_observation_with_link_end_data(reception, LinkEndRole::Receiver)
        .expect("should compute");

    let mut scaling = OneWayRangeScaling::new();
    scaling.update(&geometry).expect("one-way geometry");
    let partial = OneWayRangePartial::new(ParameterId::PpnGamma)
        .with_correction_partial(Arc::new(RelativisticCorrectionPartial::new(nominal)));
    let blocks = partial.calculate_partial(&geometry, &scaling).expect("should compute");
    let analytic = sum_blocks(&blocks).expect("gamma affects the range")[0];

    let numerical = central_difference(
        |gamma| {
            model(Some(correction(gamma)))
                .compute_ideal_observation(reception, LinkEndRole::Receiver)
                .map(|range| range[0])
        },
        1.0,
        1e-2,
    )
    .expect("should compute");

    assert_relative_eq!(analytic, numerical, max_relative = 1e-4);
}

#[test]
fn light_time_is_consistent_between_reference_link_ends() {
    let light_time = IterativeLightTime::<f64, f64>::new(Arc::new(probe()), Arc::new(earth))
        .with_correction(correction(1.0));

    let at_reception = light_time.light_time_with_states(3.0e6, true).expect("should converge");
    let at_transmission = light_time
        .light_time_with_states(at_reception.transmission_time, false)
        .expect("should converge");

    assert_relative_eq!(at_transmission.reception_time, 3.0e6, epsilon = 1e-6);
    assert_relative_eq!(at_transmission.light_time, at_reception.light_time, max_relative = 1e-12);
}
