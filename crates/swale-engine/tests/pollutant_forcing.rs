//! Integration test: pollutant concentration overrides.
//!
//! Uses the storage network: `J1` (runoff), `J2` (direct inflow at
//! 10 mg/L), storage `ST1` fed by `C1` and `C2`, discharging through `C3`
//! to `OUT`.

use proptest::prelude::*;
use swale_core::{IndexError, ObjectKind, OverrideMode, ParameterError, PollutantProperty};
use swale_engine::{ApiError, Simulation, StaticLoader};
use swale_test_utils::fixtures;

const TSS: u32 = 0;
const J2: u32 = 1;
const ST1: u32 = 2;
const C2: u32 = 1;

fn running() -> Simulation {
    let mut sim = Simulation::with_reference_models(StaticLoader::new(fixtures::pollutant_network()));
    sim.open("tss.inp", "tss.rpt", "tss.out").unwrap();
    sim.start(false).unwrap();
    sim
}

fn node_value(sim: &Simulation, node: u32, property: PollutantProperty) -> f64 {
    sim.node_pollut(node, property).unwrap()[TSS as usize]
}

fn link_value(sim: &Simulation, link: u32, property: PollutantProperty) -> f64 {
    sim.link_pollut(link, property).unwrap()[TSS as usize]
}

// ── Node overrides ──────────────────────────────────────────────

#[test]
fn zero_forcing_every_step_keeps_node_clean() {
    let mut sim = running();
    loop {
        sim.set_node_pollut(ST1, TSS, 0.0).unwrap();
        let elapsed = sim.step().unwrap();
        assert!(node_value(&sim, ST1, PollutantProperty::Qual).abs() < 1e-4);
        if elapsed == 0.0 {
            break;
        }
    }
    assert!(node_value(&sim, ST1, PollutantProperty::TotalLoad).abs() < 1e-4);
    // Upstream transport was never forced.
    assert!(node_value(&sim, J2, PollutantProperty::TotalLoad) > 0.0);
}

#[test]
fn one_step_pulse_lasts_one_step() {
    let mut sim = running();
    for _ in 0..10 {
        sim.step().unwrap();
    }
    sim.set_node_pollut(ST1, TSS, 1.234).unwrap();
    assert_eq!(node_value(&sim, ST1, PollutantProperty::Qual), 1.234);

    sim.step().unwrap();
    assert_eq!(node_value(&sim, ST1, PollutantProperty::Qual), 1.234);
    assert_eq!(node_value(&sim, ST1, PollutantProperty::Cin), 1.234);

    sim.step().unwrap();
    let qual = node_value(&sim, ST1, PollutantProperty::Qual);
    assert!((qual - 1.234).abs() > 1e-3, "override outlived its step: {qual}");
}

#[test]
fn direct_inflow_sets_inflow_concentration() {
    let mut sim = running();
    for step in 1..=20 {
        sim.step().unwrap();
        if step > 5 {
            assert_eq!(node_value(&sim, J2, PollutantProperty::Cin), 10.0);
        }
    }
}

// ── Link overrides ──────────────────────────────────────────────

#[test]
fn persistent_link_override_drives_downstream_storage() {
    let mut sim = running();
    sim.set_link_pollut(C2, OverrideMode::Persistent, TSS, 3.0).unwrap();
    loop {
        let elapsed = sim.step().unwrap();
        assert_eq!(link_value(&sim, C2, PollutantProperty::Qual), 3.0);
        if elapsed == 0.0 {
            break;
        }
    }
    let qual = node_value(&sim, ST1, PollutantProperty::Qual);
    assert!((qual - 3.0).abs() < 0.01, "storage concentration {qual}");
}

#[test]
fn cleared_link_override_returns_to_transport() {
    let mut sim = running();
    sim.set_link_pollut(C2, OverrideMode::Persistent, TSS, 0.0).unwrap();
    for _ in 0..5 {
        sim.step().unwrap();
    }
    assert_eq!(link_value(&sim, C2, PollutantProperty::Qual), 0.0);

    sim.clear_link_pollut(C2, TSS).unwrap();
    for _ in 0..50 {
        sim.step().unwrap();
    }
    let qual = link_value(&sim, C2, PollutantProperty::Qual);
    assert!((qual - 10.0).abs() < 0.01, "link concentration {qual}");
}

// ── Rejections ──────────────────────────────────────────────────

#[test]
fn invalid_overrides_are_rejected() {
    let mut sim = running();
    match sim.set_node_pollut(ST1, 5, 1.0) {
        Err(ApiError::Index(IndexError::Object {
            kind: ObjectKind::Pollutant,
            index: 5,
        })) => {}
        other => panic!("expected pollutant index error, got {other:?}"),
    }
    match sim.set_link_pollut(9, OverrideMode::OneStep, TSS, 1.0) {
        Err(ApiError::Index(IndexError::Object {
            kind: ObjectKind::Link,
            ..
        })) => {}
        other => panic!("expected link index error, got {other:?}"),
    }
    match sim.set_node_pollut(ST1, TSS, -2.0) {
        Err(ApiError::Parameter(ParameterError::InvalidValue { .. })) => {}
        other => panic!("expected InvalidValue, got {other:?}"),
    }
    assert_eq!(node_value(&sim, ST1, PollutantProperty::Qual), 0.0);
}

// ── Loads ───────────────────────────────────────────────────────

fn all_loads(sim: &Simulation) -> Vec<f64> {
    let mut loads = sim
        .subcatch_pollut(0, swale_core::SubcatchPollutant::TotalLoad)
        .unwrap();
    for n in 0..4 {
        loads.push(node_value(sim, n, PollutantProperty::TotalLoad));
    }
    for l in 0..3 {
        loads.push(link_value(sim, l, PollutantProperty::TotalLoad));
    }
    loads
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn cumulative_loads_never_decrease(
        hourly_rain in prop::collection::vec(0.0f64..40.0, 24),
        forced in prop::option::of(0.0f64..50.0),
    ) {
        let mut sim = running();
        let mut previous = all_loads(&sim);
        let mut step = 0usize;
        loop {
            if step % 12 == 0 {
                sim.set_precipitation(0, hourly_rain[(step / 12) % 24]).unwrap();
            }
            if let Some(value) = forced {
                sim.set_node_pollut(ST1, TSS, value).unwrap();
            }
            let elapsed = sim.step().unwrap();
            step += 1;
            let loads = all_loads(&sim);
            for (before, after) in previous.iter().zip(&loads) {
                prop_assert!(after >= before, "load fell from {} to {}", before, after);
                prop_assert!(after.is_finite());
            }
            previous = loads;
            if elapsed == 0.0 {
                break;
            }
        }
    }
}
