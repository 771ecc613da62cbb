//! Integration test: gage precipitation override.
//!
//! A full day at one-minute steps. The gage is forced to 0 at the first
//! step, to 4.2 in/hr at step 360 and back to 0 at step 720, so the
//! subcatchment receives six hours of rain regardless of the recorded
//! series.

use swale_core::{ObjectKind, PrecipKind, SubcatchResult};
use swale_engine::{ApiError, Simulation, StaticLoader};
use swale_test_utils::fixtures;

const RATE: f64 = 4.2;
const TOL: f64 = 1e-4;

fn opened() -> Simulation {
    let mut sim = Simulation::with_reference_models(StaticLoader::new(fixtures::gage_network()));
    sim.open("gage.inp", "gage.rpt", "gage.out").unwrap();
    sim
}

#[test]
fn override_replaces_series_for_the_rest_of_the_run() {
    let mut sim = opened();
    sim.start(false).unwrap();
    let rg = sim.object_index(ObjectKind::Gage, "RG1").unwrap();
    let s1 = sim.object_index(ObjectKind::Subcatchment, "S1").unwrap();

    let mut step = 0u32;
    loop {
        if step == 0 {
            sim.set_precipitation(rg, 0.0).unwrap();
        }
        if step == 360 {
            assert!(sim.precipitation(rg, PrecipKind::Rainfall).unwrap().abs() < TOL);
            assert!(sim.subcatch_result(s1, SubcatchResult::Rainfall).unwrap().abs() < TOL);

            sim.set_precipitation(rg, RATE).unwrap();
            // The gage reports the new rate at once ...
            let total = sim.precipitation(rg, PrecipKind::Total).unwrap();
            assert!((total - RATE).abs() < TOL);
            assert_eq!(sim.precipitation(rg, PrecipKind::Snowfall).unwrap(), 0.0);
            // ... the subcatchment only once the next step has run.
            assert!(sim.subcatch_result(s1, SubcatchResult::Rainfall).unwrap().abs() < TOL);
        }
        if step == 361 {
            let rain = sim.subcatch_result(s1, SubcatchResult::Rainfall).unwrap();
            assert!((rain - RATE).abs() < TOL);
        }
        if step == 720 {
            let rain = sim.precipitation(rg, PrecipKind::Rainfall).unwrap();
            assert!((rain - RATE).abs() < TOL);
            sim.set_precipitation(rg, 0.0).unwrap();
        }

        let elapsed = sim.step().unwrap();
        step += 1;
        if elapsed == 0.0 {
            break;
        }
    }
    assert_eq!(step, 1_440);

    sim.end().unwrap();
    let stats = sim.subcatch_stats(s1).unwrap();
    assert!((stats.precip - RATE * 6.0).abs() < TOL);
    sim.close().unwrap();
}

#[test]
fn override_set_before_start_applies_from_the_first_step() {
    let mut sim = opened();
    sim.set_precipitation(0, 1.5).unwrap();
    assert_eq!(sim.precipitation(0, PrecipKind::Total), Ok(1.5));
    sim.start(false).unwrap();
    sim.step().unwrap();
    let rain = sim.subcatch_result(0, SubcatchResult::Rainfall).unwrap();
    assert!((rain - 1.5).abs() < TOL);
}

#[test]
fn recorded_series_drives_an_unforced_run() {
    let mut sim = opened();
    sim.start(false).unwrap();
    while sim.step().unwrap() != 0.0 {}
    sim.end().unwrap();

    // Storm: half, full, half of 1 in/hr over hours 1 to 4.
    let stats = sim.subcatch_stats(0).unwrap();
    assert!((stats.precip - 2.0).abs() < TOL);
    assert!(stats.runoff_volume > 0.0);
    assert!(stats.peak_runoff > 0.0);

    let totals = sim.routing_totals().unwrap();
    assert!(totals.runoff_volume > 0.0);
    assert!(totals.continuity_error().abs() < 1e-9);
}

#[test]
fn invalid_override_is_rejected_without_effect() {
    let mut sim = opened();
    assert!(matches!(
        sim.set_precipitation(7, 1.0),
        Err(ApiError::Index(_))
    ));
    assert!(matches!(
        sim.set_precipitation(0, f64::NAN),
        Err(ApiError::Parameter(_))
    ));
    assert_eq!(sim.precipitation(0, PrecipKind::Total), Ok(0.0));
}
